//! Template catalog.
//!
//! Holds an immutable index of every template found across the configured
//! sources. Readers clone the current `Arc` and never wait on a rebuild.
//! [`TemplateCatalog::invalidate`] drops the index and bumps a generation
//! counter; a build that started under an older generation is handed back
//! to its caller but never published.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::error::CatalogError;
use crate::loader::TemplateLoader;
use crate::record::TemplateRecord;

/// One published catalog snapshot.
#[derive(Debug, Default)]
pub struct CatalogIndex {
    templates: BTreeMap<String, Arc<TemplateRecord>>,
}

impl CatalogIndex {
    /// Scan every source in order. The first source to define a name wins.
    fn build(loader: &TemplateLoader, sources: &[PathBuf]) -> Self {
        let mut templates: BTreeMap<String, Arc<TemplateRecord>> = BTreeMap::new();

        for source in sources {
            for record in loader.load_from_directory(source) {
                if let Some(existing) = templates.get(&record.name) {
                    warn!(
                        "Template '{}' in {} shadowed by {}",
                        record.name,
                        record.path.display(),
                        existing.path.display()
                    );
                    continue;
                }
                templates.insert(record.name.clone(), Arc::new(record));
            }
        }

        Self { templates }
    }

    pub fn get(&self, name: &str) -> Option<&TemplateRecord> {
        self.templates.get(name).map(|t| t.as_ref())
    }

    /// Templates whose label `key` has `value`, in name order.
    pub fn with_label<'a>(
        &'a self,
        key: &'a str,
        value: &'a str,
    ) -> impl Iterator<Item = &'a TemplateRecord> + 'a {
        self.iter().filter(move |t| t.has_label(key, value))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TemplateRecord> {
        self.templates.values().map(|t| t.as_ref())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Shared, read-mostly template index.
pub struct TemplateCatalog {
    sources: Vec<PathBuf>,
    loader: TemplateLoader,
    index: RwLock<Option<Arc<CatalogIndex>>>,
    generation: AtomicU64,
}

impl TemplateCatalog {
    /// Create a catalog over `sources`, scanned in the given order.
    pub fn new(sources: Vec<PathBuf>, loader: TemplateLoader) -> Self {
        Self {
            sources,
            loader,
            index: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Source directories in scan order.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Current generation. Incremented by every invalidation.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Templates whose label `key` has `value`, sorted by name.
    pub async fn load(&self, key: &str, value: &str) -> Result<Vec<TemplateRecord>, CatalogError> {
        let index = self.snapshot().await?;
        Ok(index.with_label(key, value).cloned().collect())
    }

    /// Look up a template by name.
    pub async fn get(&self, name: &str) -> Result<Option<TemplateRecord>, CatalogError> {
        let index = self.snapshot().await?;
        Ok(index.get(name).cloned())
    }

    /// Every indexed template, sorted by name.
    pub async fn all(&self) -> Result<Vec<TemplateRecord>, CatalogError> {
        let index = self.snapshot().await?;
        Ok(index.iter().cloned().collect())
    }

    /// Drop the cached index. The next read rebuilds from disk.
    pub fn invalidate(&self) {
        let mut slot = self.index.write();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *slot = None;
        info!("Template catalog invalidated (generation {})", generation);
    }

    /// The current index, building it if none is published.
    pub async fn snapshot(&self) -> Result<Arc<CatalogIndex>, CatalogError> {
        let cached = self.index.read().clone();
        if let Some(index) = cached {
            return Ok(index);
        }

        let started_at = self.generation();
        let loader = self.loader.clone();
        let sources = self.sources.clone();

        let built = tokio::task::spawn_blocking(move || CatalogIndex::build(&loader, &sources))
            .await
            .map_err(|e| CatalogError::Build(e.to_string()))?;
        let built = Arc::new(built);

        let mut slot = self.index.write();
        if self.generation() != started_at {
            debug!(
                "Discarding catalog build from generation {} (now {})",
                started_at,
                self.generation()
            );
            return Ok(built);
        }

        if let Some(existing) = slot.as_ref() {
            return Ok(Arc::clone(existing));
        }

        info!("Template catalog built: {} templates", built.len());
        *slot = Some(Arc::clone(&built));
        Ok(built)
    }
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
