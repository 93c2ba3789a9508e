//! Git-backed template repositories.
//!
//! Every imported collection lives in `root/<name>/` with a `.git` marker.
//! Directories without the marker are built-in collections and are never
//! reported by [`RepositoryManager::list`].
//!
//! Every path is checked to be a strict descendant of the templates root
//! before anything touches the filesystem.

mod git;
mod resolve;

pub use git::{GitBackend, GitCli};
pub use resolve::UrlResolver;

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::catalog::TemplateCatalog;
use crate::error::RepositoryError;

const GIT_MARKER: &str = ".git";
const STAGING_PREFIX: &str = ".staging-";

/// How a repository record was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryStatus {
    Cloned,
    Updated,
    Present,
}

/// A git-backed template collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryRecord {
    pub name: String,
    pub origin_url: String,
    pub clone_url: String,
    pub path: PathBuf,
    pub branch: String,
    pub status: RepositoryStatus,
}

/// Result of [`RepositoryManager::remove`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    /// The target is not inside the templates root. Nothing was touched.
    Refused(String),
    NotFound,
}

/// Imports, updates, removes and lists template repositories.
pub struct RepositoryManager {
    root: PathBuf,
    catalog: Arc<TemplateCatalog>,
    git: Arc<dyn GitBackend>,
    resolver: UrlResolver,
    max_depth: usize,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl RepositoryManager {
    pub fn new(
        root: impl Into<PathBuf>,
        catalog: Arc<TemplateCatalog>,
        git: Arc<dyn GitBackend>,
        resolver: UrlResolver,
    ) -> Self {
        Self {
            root: root.into(),
            catalog,
            git,
            resolver,
            max_depth: 3,
            locks: DashMap::new(),
        }
    }

    /// Depth below the root searched by [`list`](Self::list).
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Clone `url` into `root/name`.
    ///
    /// The clone lands in a hidden staging directory first and is renamed
    /// into place only once it succeeded.
    pub async fn import(
        &self,
        name: &str,
        url: &str,
        branch: &str,
    ) -> Result<RepositoryRecord, RepositoryError> {
        let lock = self.lock_for(name);
        let _guard = lock.lock().await;

        let dest = self.contained_path(name).await?;
        validate_import_name(name)?;
        if tokio::fs::try_exists(&dest).await? {
            return Err(RepositoryError::AlreadyExists(name.to_string()));
        }

        tokio::fs::create_dir_all(&self.root).await?;

        let clone_url = self.resolver.resolve(url).await;
        let staging = self
            .root
            .join(format!("{}{}-{}", STAGING_PREFIX, name, Uuid::new_v4()));

        info!("Cloning {} into {}", clone_url, dest.display());

        if let Err(e) = self.git.clone_repo(&clone_url, branch, &staging).await {
            discard_staging(&staging).await;
            return Err(e);
        }

        if let Err(e) = tokio::fs::rename(&staging, &dest).await {
            discard_staging(&staging).await;
            return Err(e.into());
        }

        self.catalog.invalidate();

        let branch = match self.git.current_branch(&dest).await {
            Ok(b) => b,
            Err(_) => branch.to_string(),
        };

        info!("Imported repository {} ({})", name, branch);
        Ok(RepositoryRecord {
            name: name.to_string(),
            origin_url: url.to_string(),
            clone_url,
            path: dest,
            branch,
            status: RepositoryStatus::Cloned,
        })
    }

    /// Pull the latest changes for an imported repository.
    pub async fn update(&self, name: &str) -> Result<RepositoryRecord, RepositoryError> {
        let lock = self.lock_for(name);
        let _guard = lock.lock().await;

        let path = self.contained_path(name).await?;
        let is_dir = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(RepositoryError::NotFound(name.to_string()));
        }
        if !tokio::fs::try_exists(path.join(GIT_MARKER)).await? {
            return Err(RepositoryError::NotRepository(name.to_string()));
        }

        info!("Updating repository {}", name);
        self.git.pull(&path).await?;
        self.catalog.invalidate();

        let mut record = self.describe(name, path).await;
        record.status = RepositoryStatus::Updated;
        Ok(record)
    }

    /// Delete `root/name`.
    ///
    /// Targets outside the templates root are refused before any filesystem
    /// access beyond path resolution.
    pub async fn remove(&self, name: &str) -> Result<RemoveOutcome, RepositoryError> {
        let lock = self.lock_for(name);
        let _guard = lock.lock().await;

        let path = match self.contained_path(name).await {
            Ok(p) => p,
            Err(RepositoryError::UnsafePath(reason)) => {
                warn!("Refusing to remove '{}': outside the templates root", name);
                return Ok(RemoveOutcome::Refused(reason));
            }
            Err(e) => return Err(e),
        };

        if tokio::fs::symlink_metadata(&path).await.is_err() {
            return Ok(RemoveOutcome::NotFound);
        }

        info!("Removing repository {}", path.display());
        tokio::fs::remove_dir_all(&path).await?;
        self.catalog.invalidate();

        Ok(RemoveOutcome::Removed)
    }

    /// Every git-backed directory under the root.
    pub async fn list(&self) -> Result<Vec<RepositoryRecord>, RepositoryError> {
        let mut records = Vec::new();
        for path in self.scan_git_dirs() {
            let name = path
                .strip_prefix(&self.root)
                .unwrap_or(&path)
                .to_string_lossy()
                .to_string();
            records.push(self.describe(&name, path).await);
        }
        Ok(records)
    }

    fn scan_git_dirs(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        if !self.root.is_dir() {
            return found;
        }

        let mut walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(self.max_depth)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", self.root.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            // Hidden directories include staging clones.
            if entry.file_name().to_string_lossy().starts_with('.') {
                walker.skip_current_dir();
                continue;
            }
            if entry.path().join(GIT_MARKER).exists() {
                found.push(entry.path().to_path_buf());
                walker.skip_current_dir();
            }
        }
        found
    }

    async fn describe(&self, name: &str, path: PathBuf) -> RepositoryRecord {
        let origin_url = self.git.origin_url(&path).await.unwrap_or_default();
        let branch = self.git.current_branch(&path).await.unwrap_or_default();
        RepositoryRecord {
            name: name.to_string(),
            clone_url: origin_url.clone(),
            origin_url,
            path,
            branch,
            status: RepositoryStatus::Present,
        }
    }

    fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        Arc::clone(&self.locks.entry(name.to_string()).or_default())
    }

    /// `root/name`, provided it is a strict descendant of the root both
    /// lexically and after resolving symlinks.
    pub async fn contained_path(&self, name: &str) -> Result<PathBuf, RepositoryError> {
        let root = normalize(&self.root);
        let candidate = normalize(&self.root.join(name));

        if candidate == root || !candidate.starts_with(&root) {
            return Err(RepositoryError::UnsafePath(name.to_string()));
        }

        if tokio::fs::symlink_metadata(&candidate).await.is_ok() {
            let real_root = tokio::fs::canonicalize(&self.root).await?;
            // A dangling symlink cannot be resolved; judge it by its parent.
            let real = match tokio::fs::canonicalize(&candidate).await {
                Ok(p) => p,
                Err(_) => match candidate.parent() {
                    Some(parent) => tokio::fs::canonicalize(parent).await?,
                    None => return Err(RepositoryError::UnsafePath(name.to_string())),
                },
            };
            if real == real_root || !real.starts_with(&real_root) {
                return Err(RepositoryError::UnsafePath(name.to_string()));
            }
        }

        Ok(candidate)
    }
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Imported names must be one visible path component.
fn validate_import_name(name: &str) -> Result<(), RepositoryError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(c)), None) if !c.to_string_lossy().starts_with('.') => Ok(()),
        _ => Err(RepositoryError::InvalidName(name.to_string())),
    }
}

async fn discard_staging(staging: &Path) {
    if tokio::fs::symlink_metadata(staging).await.is_ok() {
        if let Err(e) = tokio::fs::remove_dir_all(staging).await {
            warn!("Failed to clean up {}: {}", staging.display(), e);
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
