//! Filesystem template loader.
//!
//! Walks a source directory looking for `.meta-cnc.yaml` files. Hidden
//! directories (including `.git` and staging clones) are never descended.

use std::path::Path;

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::record::{METADATA_FILE, TemplateRecord};

/// Filesystem template loader.
#[derive(Debug, Clone)]
pub struct TemplateLoader {
    /// Maximum directory depth for template discovery.
    max_depth: usize,
}

impl TemplateLoader {
    /// Create a new loader.
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Load all templates below a directory.
    ///
    /// Unreadable or malformed metadata is logged and skipped, as are
    /// templates using a reserved name.
    pub fn load_from_directory(&self, dir: &Path) -> Vec<TemplateRecord> {
        let mut templates = Vec::new();

        if !dir.exists() {
            debug!("Template directory does not exist: {}", dir.display());
            return templates;
        }

        debug!("Loading templates from: {}", dir.display());

        let walker = WalkDir::new(dir)
            .max_depth(self.max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden_dir(e))
            .filter_map(|e| e.ok());

        for entry in walker {
            if !entry.file_type().is_dir() {
                continue;
            }

            let meta_path = entry.path().join(METADATA_FILE);
            if !meta_path.is_file() {
                continue;
            }

            if let Some(record) = self.try_load(entry.path(), &meta_path) {
                debug!("Loaded template: {}", record.name);
                templates.push(record);
            }
        }

        debug!("Loaded {} templates from {}", templates.len(), dir.display());
        templates
    }

    fn try_load(&self, dir: &Path, meta_path: &Path) -> Option<TemplateRecord> {
        let content = match std::fs::read_to_string(meta_path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Failed to read {}: {}", meta_path.display(), e);
                return None;
            }
        };

        let record = match TemplateRecord::from_metadata(&content, dir) {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping template in {}: {}", dir.display(), e);
                return None;
            }
        };

        if record.is_reserved() {
            warn!(
                "Skipping template in {}: name '{}' is reserved",
                dir.display(),
                record.name
            );
            return None;
        }

        Some(record)
    }
}

impl Default for TemplateLoader {
    fn default() -> Self {
        Self::new(6)
    }
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
