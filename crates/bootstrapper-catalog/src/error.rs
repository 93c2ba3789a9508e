//! Catalog and repository errors.

use thiserror::Error;

/// Errors raised while discovering, indexing or rendering templates.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Invalid template metadata in {path}: {message}")]
    InvalidMetadata { path: String, message: String },

    #[error("Template {template} has no file named {file}")]
    MissingFile { template: String, file: String },

    #[error("Template {template} file {file} is outside the template directory")]
    UnsafeFile { template: String, file: String },

    #[error("Template rendering failed: {0}")]
    Render(String),

    #[error("Catalog build failed: {0}")]
    Build(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by repository import/update/remove.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Invalid repository name: {0}")]
    InvalidName(String),

    #[error("Path escapes the templates root: {0}")]
    UnsafePath(String),

    #[error("Repository already exists: {0}")]
    AlreadyExists(String),

    #[error("Repository not found: {0}")]
    NotFound(String),

    #[error("Not a git repository: {0}")]
    NotRepository(String),

    #[error("Git command failed: {0}")]
    Git(String),

    #[error("Git command timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP client setup failed: {0}")]
    Client(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_error_display() {
        let err = CatalogError::InvalidMetadata {
            path: "/tmp/t/.meta-cnc.yaml".to_string(),
            message: "missing field `name`".to_string(),
        };
        assert!(err.to_string().contains(".meta-cnc.yaml"));
        assert!(err.to_string().contains("missing field"));

        let err = CatalogError::MissingFile {
            template: "init_cfg".to_string(),
            file: "init_cfg.txt".to_string(),
        };
        assert_eq!(err.to_string(), "Template init_cfg has no file named init_cfg.txt");

        let err = CatalogError::UnsafeFile {
            template: "evil".to_string(),
            file: "../../secret.txt".to_string(),
        };
        assert!(err.to_string().contains("outside the template directory"));
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::UnsafePath("../../etc".to_string());
        assert!(err.to_string().contains("../../etc"));

        let err = RepositoryError::Timeout(300);
        assert!(err.to_string().contains("300s"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = RepositoryError::from(io_err);
        assert!(matches!(err, RepositoryError::Io(_)));
    }
}
