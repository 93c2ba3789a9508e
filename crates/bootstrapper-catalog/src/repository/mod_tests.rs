use super::*;
use crate::loader::TemplateLoader;
use crate::record::METADATA_FILE;
use async_trait::async_trait;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// Writes a checkout with one template instead of talking to a remote.
#[derive(Default)]
struct FakeGit {
    template: Option<String>,
    fail_clone: bool,
    clone_delay: Option<Duration>,
    clones: AtomicUsize,
    pulls: AtomicUsize,
}

impl FakeGit {
    fn with_template(name: &str) -> Self {
        Self {
            template: Some(name.to_string()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl GitBackend for FakeGit {
    async fn clone_repo(
        &self,
        _url: &str,
        _branch: &str,
        dest: &Path,
    ) -> Result<(), RepositoryError> {
        self.clones.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.clone_delay {
            tokio::time::sleep(delay).await;
        }
        fs::create_dir_all(dest.join(".git"))?;
        if self.fail_clone {
            return Err(RepositoryError::Git("remote hung up".to_string()));
        }
        if let Some(name) = &self.template {
            let dir = dest.join(name);
            fs::create_dir_all(&dir)?;
            fs::write(
                dir.join(METADATA_FILE),
                format!(
                    "name: {}\nlabel: {} Config\nlabels:\n  template_category: panos_full\n",
                    name, name
                ),
            )?;
        }
        Ok(())
    }

    async fn pull(&self, _repo: &Path) -> Result<(), RepositoryError> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn current_branch(&self, _repo: &Path) -> Result<String, RepositoryError> {
        Ok("main".to_string())
    }

    async fn origin_url(&self, _repo: &Path) -> Result<String, RepositoryError> {
        Ok("https://git.example.com/templates.git".to_string())
    }
}

struct Fixture {
    _base: TempDir,
    root: PathBuf,
    outside: PathBuf,
    catalog: Arc<TemplateCatalog>,
    git: Arc<FakeGit>,
    manager: RepositoryManager,
}

fn fixture(git: FakeGit) -> Fixture {
    let base = TempDir::new().unwrap();
    let root = base.path().join("templates");
    let outside = base.path().join("etc");
    fs::create_dir_all(&root).unwrap();
    fs::create_dir_all(&outside).unwrap();
    fs::write(outside.join("passwd"), "root:x:0:0").unwrap();

    let catalog = Arc::new(TemplateCatalog::new(
        vec![root.clone()],
        TemplateLoader::default(),
    ));
    let git = Arc::new(git);
    let manager = RepositoryManager::new(
        root.clone(),
        Arc::clone(&catalog),
        git.clone(),
        UrlResolver::new("http://127.0.0.1:1", Duration::from_secs(1)).unwrap(),
    );

    Fixture {
        _base: base,
        root,
        outside,
        catalog,
        git,
        manager,
    }
}

#[tokio::test]
async fn test_import_clones_and_moves_into_place() {
    let f = fixture(FakeGit::with_template("iron_skillet"));

    let record = f
        .manager
        .import("skillets", "https://git.example.com/skillets.git", "main")
        .await
        .unwrap();

    assert_eq!(record.status, RepositoryStatus::Cloned);
    assert_eq!(record.path, f.root.join("skillets"));
    assert_eq!(record.branch, "main");
    assert_eq!(record.clone_url, "https://git.example.com/skillets.git");
    assert!(f.root.join("skillets/.git").is_dir());

    let leftovers: Vec<_> = fs::read_dir(&f.root)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(STAGING_PREFIX))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_import_is_visible_in_catalog() {
    let f = fixture(FakeGit::with_template("iron_skillet"));

    assert!(f
        .catalog
        .load("template_category", "panos_full")
        .await
        .unwrap()
        .is_empty());

    f.manager
        .import("skillets", "https://git.example.com/skillets.git", "")
        .await
        .unwrap();

    let templates = f.catalog.load("template_category", "panos_full").await.unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates[0].name, "iron_skillet");
}

#[tokio::test]
async fn test_import_existing_name() {
    let f = fixture(FakeGit::default());
    fs::create_dir_all(f.root.join("taken")).unwrap();

    let result = f.manager.import("taken", "https://x/y.git", "").await;
    assert!(matches!(result, Err(RepositoryError::AlreadyExists(_))));
    assert_eq!(f.git.clones.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_import_failure_leaves_nothing_behind() {
    let f = fixture(FakeGit {
        fail_clone: true,
        ..FakeGit::default()
    });

    let result = f.manager.import("broken", "https://x/y.git", "").await;
    assert!(matches!(result, Err(RepositoryError::Git(_))));
    assert!(!f.root.join("broken").exists());
    assert_eq!(fs::read_dir(&f.root).unwrap().count(), 0);
    assert_eq!(f.catalog.generation(), 0);
}

#[tokio::test]
async fn test_import_rejects_unsafe_and_invalid_names() {
    let f = fixture(FakeGit::default());

    let result = f.manager.import("../escape", "https://x/y.git", "").await;
    assert!(matches!(result, Err(RepositoryError::UnsafePath(_))));

    let result = f.manager.import("nested/name", "https://x/y.git", "").await;
    assert!(matches!(result, Err(RepositoryError::InvalidName(_))));

    let result = f.manager.import(".hidden", "https://x/y.git", "").await;
    assert!(matches!(result, Err(RepositoryError::InvalidName(_))));

    assert_eq!(f.git.clones.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_concurrent_imports_same_name_are_serialized() {
    let f = fixture(FakeGit {
        template: Some("t".to_string()),
        clone_delay: Some(Duration::from_millis(50)),
        ..FakeGit::default()
    });

    let (a, b) = tokio::join!(
        f.manager.import("dup", "https://x/y.git", ""),
        f.manager.import("dup", "https://x/y.git", ""),
    );

    let ok = [a.is_ok(), b.is_ok()].iter().filter(|v| **v).count();
    assert_eq!(ok, 1);
    assert!(matches!(
        a.err().or(b.err()),
        Some(RepositoryError::AlreadyExists(_))
    ));
    assert_eq!(f.git.clones.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_remove_refuses_paths_outside_root() {
    let f = fixture(FakeGit::default());

    for name in ["../etc", "../../etc", "/etc", "..", "", "."] {
        let outcome = f.manager.remove(name).await.unwrap();
        assert!(
            matches!(outcome, RemoveOutcome::Refused(_)),
            "{:?} was not refused",
            name
        );
    }

    assert!(f.outside.join("passwd").is_file());
    assert!(f.root.is_dir());
    assert_eq!(f.catalog.generation(), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn test_remove_refuses_symlink_escape() {
    let f = fixture(FakeGit::default());
    std::os::unix::fs::symlink(&f.outside, f.root.join("sneaky")).unwrap();

    let outcome = f.manager.remove("sneaky").await.unwrap();
    assert!(matches!(outcome, RemoveOutcome::Refused(_)));
    assert!(f.outside.join("passwd").is_file());
}

#[cfg(unix)]
#[tokio::test]
async fn test_contained_path_resolves_symlinks() {
    let f = fixture(FakeGit::default());
    fs::create_dir_all(f.root.join("team/templates")).unwrap();
    std::os::unix::fs::symlink(f.root.join("team/templates"), f.root.join("alias")).unwrap();
    std::os::unix::fs::symlink(&f.outside, f.root.join("sneaky")).unwrap();

    assert_eq!(
        f.manager.contained_path("alias").await.unwrap(),
        normalize(&f.root.join("alias"))
    );
    assert_eq!(
        f.manager.contained_path("not-yet-cloned").await.unwrap(),
        normalize(&f.root.join("not-yet-cloned"))
    );
    assert!(matches!(
        f.manager.contained_path("sneaky").await,
        Err(RepositoryError::UnsafePath(_))
    ));
    assert!(matches!(
        f.manager.contained_path("team/../..").await,
        Err(RepositoryError::UnsafePath(_))
    ));
}

#[tokio::test]
async fn test_remove_deletes_and_invalidates() {
    let f = fixture(FakeGit::with_template("iron_skillet"));
    f.manager
        .import("skillets", "https://x/y.git", "")
        .await
        .unwrap();
    assert_eq!(f.catalog.all().await.unwrap().len(), 1);

    let outcome = f.manager.remove("skillets").await.unwrap();
    assert_eq!(outcome, RemoveOutcome::Removed);
    assert!(!f.root.join("skillets").exists());
    assert!(f.catalog.all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_remove_missing() {
    let f = fixture(FakeGit::default());
    let outcome = f.manager.remove("nothing-here").await.unwrap();
    assert_eq!(outcome, RemoveOutcome::NotFound);
}

#[tokio::test]
async fn test_update_pulls_and_invalidates() {
    let f = fixture(FakeGit::with_template("t"));
    f.manager.import("repo", "https://x/y.git", "").await.unwrap();
    let generation = f.catalog.generation();

    let record = f.manager.update("repo").await.unwrap();
    assert_eq!(record.status, RepositoryStatus::Updated);
    assert_eq!(record.origin_url, "https://git.example.com/templates.git");
    assert_eq!(f.git.pulls.load(Ordering::SeqCst), 1);
    assert_eq!(f.catalog.generation(), generation + 1);
}

#[tokio::test]
async fn test_update_requires_git_checkout() {
    let f = fixture(FakeGit::default());
    fs::create_dir_all(f.root.join("builtin")).unwrap();

    let result = f.manager.update("builtin").await;
    assert!(matches!(result, Err(RepositoryError::NotRepository(_))));

    let result = f.manager.update("missing").await;
    assert!(matches!(result, Err(RepositoryError::NotFound(_))));

    let result = f.manager.update("../etc").await;
    assert!(matches!(result, Err(RepositoryError::UnsafePath(_))));
    assert_eq!(f.git.pulls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_list_reports_only_git_directories() {
    let f = fixture(FakeGit::default());
    fs::create_dir_all(f.root.join("alpha/.git")).unwrap();
    fs::create_dir_all(f.root.join("builtin/bootstrap_xml")).unwrap();
    fs::create_dir_all(f.root.join("group/beta/.git")).unwrap();
    fs::create_dir_all(f.root.join(".staging-gamma-1/.git")).unwrap();

    let records = f.manager.list().await.unwrap();
    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "group/beta"]);
    assert!(records.iter().all(|r| r.status == RepositoryStatus::Present));
    assert!(records.iter().all(|r| r.branch == "main"));
}

#[tokio::test]
async fn test_list_missing_root() {
    let f = fixture(FakeGit::default());
    fs::remove_dir_all(&f.root).unwrap();
    assert!(f.manager.list().await.unwrap().is_empty());
}

#[test]
fn test_normalize() {
    assert_eq!(normalize(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
    assert_eq!(normalize(Path::new("/a/../../b")), PathBuf::from("/b"));
}
