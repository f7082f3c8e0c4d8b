use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use watch_core::UpdateChecker;

/// Latest published release of a GitHub repository.
#[derive(Debug, Clone)]
pub struct GithubReleases {
    http: reqwest::Client,
    repo: String,
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    prerelease: bool,
}

impl Release {
    fn version(self) -> Option<String> {
        if self.draft || self.prerelease {
            return None;
        }
        Some(self.tag_name)
    }
}

impl GithubReleases {
    /// `repo` is `owner/name`.
    pub fn new(repo: &str) -> Self {
        GithubReleases {
            http: reqwest::Client::default(),
            repo: repo.to_string(),
        }
    }
}

#[async_trait]
impl UpdateChecker for GithubReleases {
    async fn latest_version(&self) -> Result<Option<String>> {
        let url = format!("https://api.github.com/repos/{}/releases/latest", self.repo);
        let resp = self
            .http
            .get(&url)
            .header(reqwest::header::USER_AGENT, concat!("streamwatch/", env!("CARGO_PKG_VERSION")))
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .with_context(|| format!("Cannot reach {}", url))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            log::debug!("No release published for {}", self.repo);
            return Ok(None);
        }
        let release: Release = resp
            .error_for_status()?
            .json()
            .await
            .context("Invalid release payload")?;
        Ok(release.version())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_release_payload() {
        let raw = r#"{
            "url": "https://api.github.com/repos/octocat/Hello-World/releases/1",
            "id": 1,
            "tag_name": "v1.0.0",
            "target_commitish": "master",
            "name": "v1.0.0",
            "body": "Description of the release",
            "draft": false,
            "prerelease": false,
            "created_at": "2013-02-27T19:35:32Z",
            "published_at": "2013-02-27T19:35:32Z"
        }"#;
        let release: Release = serde_json::from_str(raw).unwrap();
        assert_eq!(release.version(), Some("v1.0.0".to_string()));
    }

    #[test]
    fn test_prerelease_is_ignored() {
        let raw = r#"{"tag_name": "v2.0.0-rc.1", "draft": false, "prerelease": true}"#;
        let release: Release = serde_json::from_str(raw).unwrap();
        assert_eq!(release.version(), None);
    }
}
