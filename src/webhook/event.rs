//! Typed pull request event parsed from a webhook payload.

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use thiserror::Error;

/// `owner/repo` slug as GitHub reports it.
static REPO_SLUG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_-]+/[a-zA-Z0-9_.-]+$").expect("repo slug pattern is valid")
});

/// Full 40-character commit SHA.
static COMMIT_SHA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-f0-9]{40}$").expect("commit sha pattern is valid"));

#[derive(Debug, Error)]
pub enum WebhookParseError {
    #[error("missing '{0}' in payload")]
    MissingField(&'static str),
    #[error("invalid payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("invalid field value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Deserialize)]
struct RawPayload {
    number: u64,
    pull_request: RawPullRequest,
    repository: RawRepository,
    installation: RawInstallation,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    title: String,
    body: Option<String>,
    user: RawUser,
    base: RawRef,
    head: RawRef,
    html_url: String,
    #[serde(default)]
    changed_files: u32,
    #[serde(default)]
    additions: u32,
    #[serde(default)]
    deletions: u32,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawRef {
    #[serde(rename = "ref")]
    ref_name: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct RawInstallation {
    id: u64,
}

/// A pull request event that passed payload validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestEvent {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub author: String,
    pub base_branch: String,
    pub head_branch: String,
    pub head_sha: String,
    /// `owner/repo` slug.
    pub repository: String,
    pub installation_id: u64,
    pub html_url: String,
    pub files_changed: u32,
    pub additions: u32,
    pub deletions: u32,
}

impl PullRequestEvent {
    /// Parse and validate a `pull_request` webhook payload.
    pub fn from_payload(payload: &serde_json::Value) -> Result<Self, WebhookParseError> {
        // Check the two top-level objects explicitly so the error names
        // what is actually missing instead of a serde path.
        if payload.get("pull_request").is_none() {
            return Err(WebhookParseError::MissingField("pull_request"));
        }
        if payload.get("installation").is_none() {
            return Err(WebhookParseError::MissingField("installation"));
        }

        let raw: RawPayload = serde_json::from_value(payload.clone())?;

        let event = Self {
            number: raw.number,
            title: raw.pull_request.title,
            body: raw.pull_request.body,
            author: raw.pull_request.user.login,
            base_branch: raw.pull_request.base.ref_name,
            head_branch: raw.pull_request.head.ref_name,
            head_sha: raw.pull_request.head.sha,
            repository: raw.repository.full_name,
            installation_id: raw.installation.id,
            html_url: raw.pull_request.html_url,
            files_changed: raw.pull_request.changed_files,
            additions: raw.pull_request.additions,
            deletions: raw.pull_request.deletions,
        };
        event.validate()?;
        Ok(event)
    }

    fn validate(&self) -> Result<(), WebhookParseError> {
        if self.number == 0 {
            return Err(WebhookParseError::InvalidValue(
                "PR number must be positive".to_string(),
            ));
        }
        if !REPO_SLUG.is_match(&self.repository) {
            return Err(WebhookParseError::InvalidValue(format!(
                "invalid repository format: {} (expected owner/repo)",
                self.repository
            )));
        }
        if !COMMIT_SHA.is_match(&self.head_sha) {
            return Err(WebhookParseError::InvalidValue(format!(
                "invalid SHA format: {} (expected 40-character hex string)",
                self.head_sha
            )));
        }
        if self.installation_id == 0 {
            return Err(WebhookParseError::InvalidValue(
                "installation ID must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn owner(&self) -> &str {
        self.repository.split('/').next().unwrap_or("")
    }

    pub fn repo_name(&self) -> &str {
        self.repository.split('/').nth(1).unwrap_or("")
    }

    /// Total lines changed (additions + deletions).
    pub fn total_changes(&self) -> u32 {
        self.additions + self.deletions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_payload() -> serde_json::Value {
        json!({
            "number": 42,
            "pull_request": {
                "title": "Add feature",
                "body": "Description here",
                "user": {"login": "octocat"},
                "base": {"ref": "main", "sha": "b".repeat(40)},
                "head": {"ref": "feature", "sha": "a".repeat(40)},
                "html_url": "https://github.com/owner/repo/pull/42",
                "changed_files": 3,
                "additions": 10,
                "deletions": 4
            },
            "repository": {"full_name": "owner/repo"},
            "installation": {"id": 12345}
        })
    }

    #[test]
    fn test_parse_valid_payload() {
        let event = PullRequestEvent::from_payload(&sample_payload()).unwrap();
        assert_eq!(event.number, 42);
        assert_eq!(event.author, "octocat");
        assert_eq!(event.repository, "owner/repo");
        assert_eq!(event.head_sha, "a".repeat(40));
        assert_eq!(event.installation_id, 12345);
        assert_eq!(event.owner(), "owner");
        assert_eq!(event.repo_name(), "repo");
        assert_eq!(event.total_changes(), 14);
    }

    #[test]
    fn test_missing_pull_request() {
        let mut payload = sample_payload();
        payload.as_object_mut().unwrap().remove("pull_request");
        assert!(matches!(
            PullRequestEvent::from_payload(&payload),
            Err(WebhookParseError::MissingField("pull_request"))
        ));
    }

    #[test]
    fn test_missing_installation() {
        let mut payload = sample_payload();
        payload.as_object_mut().unwrap().remove("installation");
        assert!(matches!(
            PullRequestEvent::from_payload(&payload),
            Err(WebhookParseError::MissingField("installation"))
        ));
    }

    #[test]
    fn test_invalid_repository_slug() {
        let mut payload = sample_payload();
        payload["repository"]["full_name"] = json!("not a slug");
        assert!(matches!(
            PullRequestEvent::from_payload(&payload),
            Err(WebhookParseError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_invalid_head_sha() {
        let mut payload = sample_payload();
        payload["pull_request"]["head"]["sha"] = json!("deadbeef");
        assert!(matches!(
            PullRequestEvent::from_payload(&payload),
            Err(WebhookParseError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_zero_pr_number() {
        let mut payload = sample_payload();
        payload["number"] = json!(0);
        assert!(matches!(
            PullRequestEvent::from_payload(&payload),
            Err(WebhookParseError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_optional_counts_default_to_zero() {
        let mut payload = sample_payload();
        let pr = payload["pull_request"].as_object_mut().unwrap();
        pr.remove("changed_files");
        pr.remove("additions");
        pr.remove("deletions");
        let event = PullRequestEvent::from_payload(&payload).unwrap();
        assert_eq!(event.files_changed, 0);
        assert_eq!(event.total_changes(), 0);
    }
}
