//! Pull request and changed-file types from the GitHub REST API.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::client::gh_api;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub head: Branch,
    pub base: Branch,
    pub user: User,
    #[serde(default)]
    pub changed_files: u32,
    #[serde(default)]
    pub additions: u32,
    #[serde(default)]
    pub deletions: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    #[serde(rename = "ref")]
    pub ref_name: String,
    pub sha: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub login: String,
}

/// File status as reported by the PR files endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Added,
    Removed,
    Modified,
    Renamed,
    Copied,
    Changed,
    Unchanged,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangedFile {
    pub filename: String,
    pub status: FileStatus,
    pub additions: u32,
    pub deletions: u32,
    #[serde(default)]
    pub sha: Option<String>,
    pub patch: Option<String>,
    #[serde(default)]
    pub previous_filename: Option<String>,
}

impl ChangedFile {
    /// Binary files carry no patch in the API response. Removed files
    /// also lack one, but they are not binary.
    pub fn is_binary(&self) -> bool {
        self.patch.is_none() && self.status != FileStatus::Removed
    }

    pub fn total_changes(&self) -> u32 {
        self.additions + self.deletions
    }

    /// Lower-cased file extension, or empty when there is none.
    pub fn extension(&self) -> String {
        self.filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default()
    }
}

pub async fn fetch_pr(repo: &str, pr_number: u64) -> Result<PullRequest> {
    let endpoint = format!("repos/{}/pulls/{}", repo, pr_number);
    let json = gh_api(&endpoint).await?;
    serde_json::from_value(json).context("Failed to parse PR response")
}

pub async fn fetch_changed_files(repo: &str, pr_number: u64) -> Result<Vec<ChangedFile>> {
    let endpoint = format!("repos/{}/pulls/{}/files?per_page=100", repo, pr_number);
    let json = gh_api(&endpoint).await?;
    serde_json::from_value(json).context("Failed to parse changed files response")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn file(status: FileStatus, patch: Option<&str>) -> ChangedFile {
        ChangedFile {
            filename: "src/lib.rs".to_string(),
            status,
            additions: 3,
            deletions: 1,
            sha: Some("abc123".to_string()),
            patch: patch.map(str::to_string),
            previous_filename: None,
        }
    }

    #[test]
    fn test_binary_detection() {
        assert!(file(FileStatus::Modified, None).is_binary());
        assert!(!file(FileStatus::Modified, Some("@@ -1 +1 @@")).is_binary());
        // A removed file has no patch but is not binary.
        assert!(!file(FileStatus::Removed, None).is_binary());
    }

    #[test]
    fn test_total_changes() {
        assert_eq!(file(FileStatus::Modified, None).total_changes(), 4);
    }

    #[test]
    fn test_extension() {
        let mut f = file(FileStatus::Modified, None);
        assert_eq!(f.extension(), "rs");
        f.filename = "Makefile".to_string();
        assert_eq!(f.extension(), "");
        f.filename = "archive.TAR.GZ".to_string();
        assert_eq!(f.extension(), "gz");
    }

    #[test]
    fn test_changed_file_deserializes_api_shape() {
        let f: ChangedFile = serde_json::from_value(json!({
            "filename": "README.md",
            "status": "renamed",
            "additions": 0,
            "deletions": 0,
            "sha": "deadbeef",
            "patch": null,
            "previous_filename": "OLD.md"
        }))
        .unwrap();
        assert_eq!(f.status, FileStatus::Renamed);
        assert_eq!(f.previous_filename.as_deref(), Some("OLD.md"));
    }
}
