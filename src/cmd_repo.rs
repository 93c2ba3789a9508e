//! Repository subcommand handlers.

use std::time::Duration;

use tracing::{debug, info};

use bootstrapper_catalog::{RemoveOutcome, RepositoryRecord, RepositoryStatus};
use bootstrapper_config::Config;

use crate::cli::RepoAction;
use crate::components::{build_catalog, build_repositories};

/// Handle repo subcommands.
pub(crate) async fn handle_repo_command(
    action: RepoAction,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let repositories = build_repositories(config, build_catalog(config))?;

    match action {
        RepoAction::List => {
            let records = repositories.list().await?;
            if records.is_empty() {
                println!("No repositories found in {}", repositories.root().display());
                return Ok(());
            }
            print_table(&records);
        }
        RepoAction::Import { url, name, branch } => {
            let name = match name {
                Some(name) => name,
                None => name_from_url(&url)
                    .ok_or_else(|| format!("Cannot derive a repository name from {}", url))?,
            };
            info!("Importing {} as {}", url, name);
            let record = repositories.import(&name, &url, &branch).await?;
            println!(
                "Imported {} ({}) into {}",
                record.name,
                record.branch,
                record.path.display()
            );
        }
        RepoAction::Update { name } => {
            let record = repositories.update(&name).await?;
            println!("Updated {} ({})", record.name, record.branch);
        }
        RepoAction::Remove { name } => match repositories.remove(&name).await? {
            RemoveOutcome::Removed => println!("Removed {}", name),
            RemoveOutcome::Refused(reason) => {
                return Err(format!("Refused to remove {}: {}", name, reason).into());
            }
            RemoveOutcome::NotFound => {
                return Err(format!("Repository not found: {}", name).into());
            }
        },
    }

    match notify_server(config).await {
        Some(templates) => println!("Running server reloaded {} templates", templates),
        None => println!("No running server reached; changes apply when it next starts"),
    }

    Ok(())
}

/// Ask a running server to rebuild its template catalog. Returns the
/// template count it reports, or `None` when no server answered.
pub(crate) async fn notify_server(config: &Config) -> Option<u64> {
    let host = match config.server.host.as_str() {
        "0.0.0.0" | "::" => "127.0.0.1",
        host => host,
    };
    let url = format!("http://{}:{}/templates/reload", host, config.server.port);

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            debug!("Cannot build HTTP client: {}", e);
            return None;
        }
    };

    let response = match client.post(&url).send().await {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            debug!("{} answered {}", url, response.status());
            return None;
        }
        Err(e) => {
            debug!("{} unreachable: {}", url, e);
            return None;
        }
    };

    let body: serde_json::Value = response.json().await.ok()?;
    body.get("templates").and_then(|v| v.as_u64())
}

fn print_table(records: &[RepositoryRecord]) {
    println!("{:<24} {:<16} {:<8} {}", "NAME", "BRANCH", "STATUS", "ORIGIN");
    println!("{}", "-".repeat(80));
    for record in records {
        let status = match record.status {
            RepositoryStatus::Cloned => "cloned",
            RepositoryStatus::Updated => "updated",
            RepositoryStatus::Present => "present",
        };
        println!(
            "{:<24} {:<16} {:<8} {}",
            record.name, record.branch, status, record.origin_url
        );
    }
}

/// Last path component of a repository URL, without a `.git` suffix.
fn name_from_url(url: &str) -> Option<String> {
    let last = url.trim_end_matches('/').rsplit(['/', ':']).next()?;
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
