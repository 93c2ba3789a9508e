//! # Bootstrapper Catalog
//!
//! Discovery and indexing of configuration templates, plus management of the
//! git-backed template collections that feed the index.
//!
//! A template is any directory holding a `.meta-cnc.yaml` metadata file. The
//! [`TemplateCatalog`] scans every configured source directory, indexes the
//! templates by name and exposes label queries. The [`RepositoryManager`]
//! clones, updates and removes collections under the templates root and
//! invalidates the catalog after every change.

pub mod catalog;
pub mod error;
pub mod loader;
pub mod record;
pub mod render;
pub mod repository;

pub use catalog::{CatalogIndex, TemplateCatalog};
pub use error::{CatalogError, RepositoryError};
pub use loader::TemplateLoader;
pub use record::{
    METADATA_FILE, RESERVED_TEMPLATE_NAMES, TemplateFile, TemplateRecord, TemplateVariable,
};
pub use render::{JinjaRenderer, Renderer};
pub use repository::{
    GitBackend, GitCli, RemoveOutcome, RepositoryManager, RepositoryRecord, RepositoryStatus,
    UrlResolver,
};
