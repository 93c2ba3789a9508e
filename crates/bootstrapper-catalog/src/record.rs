//! Template metadata.
//!
//! Each template directory carries a `.meta-cnc.yaml` file:
//!
//! ```yaml
//! name: iron_skillet
//! label: Iron Skillet Day One
//! description: Best practice day one configuration
//! labels:
//!   template_category: panos_full
//! variables:
//!   - name: FW_NAME
//!     description: Firewall hostname
//!     default: panos-01
//! snippets:
//!   - name: bootstrap.xml
//!     file: bootstrap.xml
//! ```

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Metadata file marking a template directory.
pub const METADATA_FILE: &str = ".meta-cnc.yaml";

/// Names reserved by the template chooser. Templates using them are never indexed.
pub const RESERVED_TEMPLATE_NAMES: [&str; 3] = ["upload", "default", "none"];

/// A variable a template expects in its render context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateVariable {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub default: String,

    /// Input hint for the wizard (`text`, `password`, `email`, ...).
    #[serde(default = "default_type_hint")]
    pub type_hint: String,
}

fn default_type_hint() -> String {
    "text".to_string()
}

/// A renderable file belonging to a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateFile {
    pub name: String,
    pub file: String,
}

/// Label values may be written as a single string or a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LabelValue {
    One(String),
    Many(Vec<String>),
}

impl LabelValue {
    fn into_vec(self) -> Vec<String> {
        match self {
            LabelValue::One(v) => vec![v],
            LabelValue::Many(v) => v,
        }
    }
}

/// On-disk shape of `.meta-cnc.yaml`.
#[derive(Debug, Clone, Deserialize)]
struct TemplateMetadata {
    name: String,

    #[serde(default)]
    label: Option<String>,

    #[serde(default)]
    description: String,

    #[serde(default)]
    labels: BTreeMap<String, LabelValue>,

    #[serde(default)]
    variables: Vec<TemplateVariable>,

    #[serde(default)]
    snippets: Vec<TemplateFile>,
}

/// A discovered template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateRecord {
    pub name: String,
    pub label: String,
    pub description: String,
    pub labels: BTreeMap<String, Vec<String>>,
    pub variables: Vec<TemplateVariable>,
    pub files: Vec<TemplateFile>,
    /// Directory the template was loaded from.
    pub path: PathBuf,
}

impl TemplateRecord {
    /// Parse metadata content found in `dir`.
    pub fn from_metadata(content: &str, dir: &Path) -> Result<Self, CatalogError> {
        let meta: TemplateMetadata =
            serde_yaml::from_str(content).map_err(|e| CatalogError::InvalidMetadata {
                path: dir.join(METADATA_FILE).display().to_string(),
                message: e.to_string(),
            })?;

        if meta.name.trim().is_empty() {
            return Err(CatalogError::InvalidMetadata {
                path: dir.join(METADATA_FILE).display().to_string(),
                message: "template name is empty".to_string(),
            });
        }

        if let Some(bad) = meta.snippets.iter().find(|f| !is_relative_inside(&f.file)) {
            return Err(CatalogError::InvalidMetadata {
                path: dir.join(METADATA_FILE).display().to_string(),
                message: format!("snippet file {} leaves the template directory", bad.file),
            });
        }

        let label = meta.label.unwrap_or_else(|| meta.name.clone());
        let labels = meta
            .labels
            .into_iter()
            .map(|(k, v)| (k, v.into_vec()))
            .collect();

        Ok(Self {
            name: meta.name,
            label,
            description: meta.description,
            labels,
            variables: meta.variables,
            files: meta.snippets,
            path: dir.to_path_buf(),
        })
    }

    /// Whether `key` carries `value` (any value of a multi-valued label).
    pub fn has_label(&self, key: &str, value: &str) -> bool {
        self.labels
            .get(key)
            .is_some_and(|values| values.iter().any(|v| v == value))
    }

    /// Whether the name collides with a chooser sentinel.
    pub fn is_reserved(&self) -> bool {
        RESERVED_TEMPLATE_NAMES.contains(&self.name.as_str())
    }

    /// Read a template file, by declared name, or the first declared file when `None`.
    pub fn read_file(&self, name: Option<&str>) -> Result<String, CatalogError> {
        let entry = match name {
            Some(n) => self.files.iter().find(|f| f.name == n || f.file == n),
            None => self.files.first(),
        };

        let entry = entry.ok_or_else(|| CatalogError::MissingFile {
            template: self.name.clone(),
            file: name.unwrap_or("<first>").to_string(),
        })?;

        let unsafe_file = || CatalogError::UnsafeFile {
            template: self.name.clone(),
            file: entry.file.clone(),
        };
        if !is_relative_inside(&entry.file) {
            return Err(unsafe_file());
        }

        // Symlinks inside the template may still point elsewhere.
        let base = self.path.canonicalize()?;
        let target = base.join(&entry.file).canonicalize()?;
        if !target.starts_with(&base) {
            return Err(unsafe_file());
        }

        Ok(std::fs::read_to_string(target)?)
    }
}

/// A non-empty relative path made only of normal components.
fn is_relative_inside(file: &str) -> bool {
    let path = Path::new(file);
    path.components().next().is_some()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const IRON_SKILLET: &str = r#"
name: iron_skillet
label: Iron Skillet Day One
labels:
  template_category: panos_full
  os: [panos-9.1, panos-10.0]
variables:
  - name: FW_NAME
    description: Firewall hostname
    default: panos-01
snippets:
  - name: bootstrap.xml
    file: bootstrap.xml
"#;

    #[test]
    fn test_parse_metadata() {
        let record = TemplateRecord::from_metadata(IRON_SKILLET, Path::new("/t/iron")).unwrap();
        assert_eq!(record.name, "iron_skillet");
        assert_eq!(record.label, "Iron Skillet Day One");
        assert_eq!(record.variables.len(), 1);
        assert_eq!(record.variables[0].type_hint, "text");
        assert_eq!(record.files[0].file, "bootstrap.xml");
        assert_eq!(record.path, PathBuf::from("/t/iron"));
    }

    #[test]
    fn test_has_label_single_and_multi_valued() {
        let record = TemplateRecord::from_metadata(IRON_SKILLET, Path::new("/t")).unwrap();
        assert!(record.has_label("template_category", "panos_full"));
        assert!(!record.has_label("template_category", "panos_partial"));
        assert!(record.has_label("os", "panos-10.0"));
        assert!(!record.has_label("os", "panos"));
        assert!(!record.has_label("missing", "panos_full"));
    }

    #[test]
    fn test_label_defaults_to_name() {
        let record = TemplateRecord::from_metadata("name: plain", Path::new("/t")).unwrap();
        assert_eq!(record.label, "plain");
        assert!(record.labels.is_empty());
    }

    #[test]
    fn test_reserved_names() {
        for name in RESERVED_TEMPLATE_NAMES {
            let record =
                TemplateRecord::from_metadata(&format!("name: {}", name), Path::new("/t")).unwrap();
            assert!(record.is_reserved());
        }
        let record = TemplateRecord::from_metadata("name: uploads", Path::new("/t")).unwrap();
        assert!(!record.is_reserved());
    }

    #[test]
    fn test_invalid_metadata() {
        let result = TemplateRecord::from_metadata("label: no name", Path::new("/t"));
        assert!(matches!(result, Err(CatalogError::InvalidMetadata { .. })));

        let result = TemplateRecord::from_metadata("name: ''", Path::new("/t"));
        assert!(matches!(result, Err(CatalogError::InvalidMetadata { .. })));
    }

    #[test]
    fn test_read_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bootstrap.xml"), "<config/>").unwrap();
        let record = TemplateRecord::from_metadata(IRON_SKILLET, dir.path()).unwrap();

        assert_eq!(record.read_file(None).unwrap(), "<config/>");
        assert_eq!(record.read_file(Some("bootstrap.xml")).unwrap(), "<config/>");
        assert!(matches!(
            record.read_file(Some("init_cfg.txt")),
            Err(CatalogError::MissingFile { .. })
        ));
    }

    fn metadata_with_file(file: &str) -> String {
        format!("name: evil\nvariables: []\nsnippets:\n  - name: main\n    file: {file}\n")
    }

    #[test]
    fn test_snippet_outside_directory_is_rejected() {
        for file in ["../../secret.txt", "/etc/shadow", "nested/../../secret.txt", ""] {
            let result = TemplateRecord::from_metadata(&metadata_with_file(file), Path::new("/t/evil"));
            assert!(
                matches!(result, Err(CatalogError::InvalidMetadata { .. })),
                "accepted {:?}",
                file
            );
        }

        let record =
            TemplateRecord::from_metadata(&metadata_with_file("./nested/main.txt"), Path::new("/t/ok"))
                .unwrap();
        assert_eq!(record.files[0].file, "./nested/main.txt");
    }

    #[test]
    fn test_read_file_stays_inside_template() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("secret.txt"), "TOP-SECRET").unwrap();
        let dir = root.path().join("repo").join("evil");
        std::fs::create_dir_all(&dir).unwrap();

        // Records built by hand bypass metadata checks.
        let mut record = TemplateRecord::from_metadata(&metadata_with_file("main.txt"), &dir).unwrap();
        record.files[0].file = "../../secret.txt".to_string();
        assert!(matches!(
            record.read_file(None),
            Err(CatalogError::UnsafeFile { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_read_file_rejects_symlink_escape() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("secret.txt"), "TOP-SECRET").unwrap();
        let dir = root.path().join("evil");
        std::fs::create_dir_all(&dir).unwrap();
        std::os::unix::fs::symlink(root.path().join("secret.txt"), dir.join("main.txt")).unwrap();

        let record = TemplateRecord::from_metadata(&metadata_with_file("main.txt"), &dir).unwrap();
        assert!(matches!(
            record.read_file(None),
            Err(CatalogError::UnsafeFile { .. })
        ));
    }
}
