use super::*;
use crate::record::METADATA_FILE;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn create_template(dir: &Path, name: &str, label: &str, category: &str) {
    let template_dir = dir.join(name);
    fs::create_dir_all(&template_dir).unwrap();
    let content = format!(
        "name: {}\nlabel: {}\nlabels:\n  template_category: {}\n",
        name, label, category
    );
    fs::write(template_dir.join(METADATA_FILE), content).unwrap();
}

fn catalog_over(dirs: &[&Path]) -> TemplateCatalog {
    TemplateCatalog::new(
        dirs.iter().map(|d| d.to_path_buf()).collect(),
        TemplateLoader::default(),
    )
}

#[tokio::test]
async fn test_load_by_label() {
    let temp_dir = TempDir::new().unwrap();
    create_template(temp_dir.path(), "iron_skillet", "Iron Skillet", "panos_full");
    create_template(temp_dir.path(), "snippet", "Partial", "panos_partial");

    let catalog = catalog_over(&[temp_dir.path()]);
    let full = catalog.load("template_category", "panos_full").await.unwrap();

    assert_eq!(full.len(), 1);
    assert_eq!(full[0].name, "iron_skillet");
    assert!(catalog.load("template_category", "panos").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_and_all() {
    let temp_dir = TempDir::new().unwrap();
    create_template(temp_dir.path(), "b", "B", "panos_full");
    create_template(temp_dir.path(), "a", "A", "panos_full");

    let catalog = catalog_over(&[temp_dir.path()]);
    assert_eq!(catalog.get("a").await.unwrap().unwrap().label, "A");
    assert!(catalog.get("missing").await.unwrap().is_none());

    let names: Vec<String> = catalog
        .all()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[tokio::test]
async fn test_index_is_cached_until_invalidated() {
    let temp_dir = TempDir::new().unwrap();
    create_template(temp_dir.path(), "first", "First", "panos_full");

    let catalog = catalog_over(&[temp_dir.path()]);
    assert_eq!(catalog.all().await.unwrap().len(), 1);

    create_template(temp_dir.path(), "second", "Second", "panos_full");
    assert_eq!(catalog.all().await.unwrap().len(), 1);

    catalog.invalidate();
    assert_eq!(catalog.generation(), 1);
    assert_eq!(catalog.all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_snapshot_is_shared_between_readers() {
    let temp_dir = TempDir::new().unwrap();
    create_template(temp_dir.path(), "t", "T", "panos_full");

    let catalog = catalog_over(&[temp_dir.path()]);
    let a = catalog.snapshot().await.unwrap();
    let b = catalog.snapshot().await.unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    catalog.invalidate();
    let c = catalog.snapshot().await.unwrap();
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(c.len(), 1);
}

#[tokio::test]
async fn test_first_source_wins() {
    let builtin = TempDir::new().unwrap();
    let imported = TempDir::new().unwrap();
    create_template(builtin.path(), "bootstrap_xml", "Builtin", "panos_full");
    create_template(imported.path(), "bootstrap_xml", "Imported", "panos_full");

    let catalog = catalog_over(&[builtin.path(), imported.path()]);
    let record = catalog.get("bootstrap_xml").await.unwrap().unwrap();
    assert_eq!(record.label, "Builtin");
    assert_eq!(catalog.all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_reserved_names_never_indexed() {
    let temp_dir = TempDir::new().unwrap();
    create_template(temp_dir.path(), "upload", "Sneaky", "panos_full");
    create_template(temp_dir.path(), "none", "Sneaky", "panos_full");

    let catalog = catalog_over(&[temp_dir.path()]);
    assert!(catalog.all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_sources() {
    let catalog = TemplateCatalog::new(Vec::new(), TemplateLoader::default());
    let index = catalog.snapshot().await.unwrap();
    assert!(index.is_empty());
}
