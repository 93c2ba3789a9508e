//! Clone URL resolution through the hosting-service API.
//!
//! `https://github.com/owner/repo` style URLs are looked up with
//! `GET {api}/repos/{owner}/{repo}` and replaced with the reported
//! `clone_url`. Any failure falls back to the URL as given.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::RepositoryError;

#[derive(Debug, Deserialize)]
struct RepoDetails {
    clone_url: Option<String>,
}

/// Resolves repository URLs to clone URLs.
#[derive(Debug, Clone)]
pub struct UrlResolver {
    client: Client,
    api_base: String,
}

impl UrlResolver {
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Result<Self, RepositoryError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bootstrapper/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RepositoryError::Client(e.to_string()))?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    /// The clone URL for `url`, or `url` itself when it cannot be resolved.
    pub async fn resolve(&self, url: &str) -> String {
        let Some((owner, repo)) = github_slug(url) else {
            debug!("Not a hosted repository URL, using as-is: {}", url);
            return url.to_string();
        };

        match self.lookup(&owner, &repo).await {
            Some(clone_url) => {
                debug!("Resolved {} to {}", url, clone_url);
                clone_url
            }
            None => {
                warn!("Could not resolve clone URL for {}, using it as given", url);
                url.to_string()
            }
        }
    }

    async fn lookup(&self, owner: &str, repo: &str) -> Option<String> {
        let endpoint = format!("{}/repos/{}/{}", self.api_base, owner, repo);

        let response = match self
            .client
            .get(&endpoint)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                debug!("Repository lookup failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            debug!("Repository lookup returned {}", response.status());
            return None;
        }

        match response.json::<RepoDetails>().await {
            Ok(details) => details.clone_url.filter(|u| !u.is_empty()),
            Err(e) => {
                debug!("Repository lookup returned an unexpected body: {}", e);
                None
            }
        }
    }
}

/// Owner and repository name of a `github.com` URL.
fn github_slug(url: &str) -> Option<(String, String)> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    if host != "github.com" && host != "www.github.com" {
        return None;
    }

    let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());
    let owner = segments.next()?;
    let repo = segments.next()?.trim_end_matches(".git");
    if repo.is_empty() {
        return None;
    }

    Some((owner.to_string(), repo.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver(server: &MockServer) -> UrlResolver {
        UrlResolver::new(server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_github_slug() {
        assert_eq!(
            github_slug("https://github.com/PaloAltoNetworks/iron-skillet.git"),
            Some(("PaloAltoNetworks".to_string(), "iron-skillet".to_string()))
        );
        assert_eq!(
            github_slug("https://github.com/owner/repo/tree/main"),
            Some(("owner".to_string(), "repo".to_string()))
        );
        assert_eq!(github_slug("https://gitlab.com/owner/repo"), None);
        assert_eq!(github_slug("https://github.com/owner"), None);
        assert_eq!(github_slug("git@github.com:owner/repo.git"), None);
    }

    #[tokio::test]
    async fn test_resolve_uses_clone_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/owner/templates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "templates",
                "clone_url": "https://github.com/owner/templates-renamed.git"
            })))
            .mount(&server)
            .await;

        let url = resolver(&server)
            .resolve("https://github.com/owner/templates")
            .await;
        assert_eq!(url, "https://github.com/owner/templates-renamed.git");
    }

    #[tokio::test]
    async fn test_resolve_falls_back_without_clone_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/owner/templates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "templates"
            })))
            .mount(&server)
            .await;

        let url = resolver(&server)
            .resolve("https://github.com/owner/templates")
            .await;
        assert_eq!(url, "https://github.com/owner/templates");
    }

    #[tokio::test]
    async fn test_resolve_falls_back_on_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = resolver(&server)
            .resolve("https://github.com/owner/private")
            .await;
        assert_eq!(url, "https://github.com/owner/private");
    }

    #[tokio::test]
    async fn test_resolve_falls_back_when_unreachable() {
        let resolver = UrlResolver::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let url = resolver.resolve("https://github.com/owner/repo").await;
        assert_eq!(url, "https://github.com/owner/repo");
    }

    #[tokio::test]
    async fn test_resolve_gives_up_after_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(5))
                    .set_body_json(serde_json::json!({
                        "clone_url": "https://github.com/owner/slow.git"
                    })),
            )
            .mount(&server)
            .await;

        let resolver = UrlResolver::new(server.uri(), Duration::from_millis(200)).unwrap();
        let started = std::time::Instant::now();
        let url = resolver.resolve("https://github.com/owner/slow").await;
        assert_eq!(url, "https://github.com/owner/slow");
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_non_github_url_untouched() {
        let server = MockServer::start().await;
        let url = resolver(&server)
            .resolve("https://git.example.com/team/templates.git")
            .await;
        assert_eq!(url, "https://git.example.com/team/templates.git");
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
