//! Posting review output back to the pull request.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::client::{gh_api_post, gh_api_post_body, FieldValue};
use super::pr::User;

/// One line-anchored comment inside a review.
///
/// `side` is `RIGHT` for new-file lines and `LEFT` for old-file lines;
/// `line` is a file line number on that side, not a diff position.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InlineComment {
    pub path: String,
    pub line: u32,
    pub side: String,
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostedComment {
    pub id: u64,
    pub html_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostedReview {
    pub id: u64,
    pub state: String,
    pub html_url: String,
    #[serde(default)]
    pub user: Option<User>,
}

/// Post a single inline comment on a specific line.
pub async fn create_review_comment(
    repo: &str,
    pr_number: u64,
    commit_id: &str,
    path: &str,
    line: u32,
    side: &str,
    body: &str,
) -> Result<PostedComment> {
    let endpoint = format!("repos/{}/pulls/{}/comments", repo, pr_number);
    let line_str = line.to_string();
    let json = gh_api_post(
        &endpoint,
        &[
            ("body", FieldValue::String(body)),
            ("commit_id", FieldValue::String(commit_id)),
            ("path", FieldValue::String(path)),
            ("line", FieldValue::Raw(&line_str)),
            ("side", FieldValue::String(side)),
        ],
    )
    .await?;
    serde_json::from_value(json).context("Failed to parse created comment response")
}

/// Post a summary as an issue comment (shows in the conversation timeline).
pub async fn create_summary_comment(
    repo: &str,
    pr_number: u64,
    body: &str,
) -> Result<PostedComment> {
    let endpoint = format!("repos/{}/issues/{}/comments", repo, pr_number);
    let json = gh_api_post(&endpoint, &[("body", FieldValue::String(body))]).await?;
    serde_json::from_value(json).context("Failed to parse created summary response")
}

/// Create one review carrying all inline comments at once.
///
/// Cheaper than posting comments individually, and GitHub groups them
/// under a single review. The comments array forces a JSON body request.
pub async fn create_review(
    repo: &str,
    pr_number: u64,
    commit_id: &str,
    body: &str,
    comments: &[InlineComment],
) -> Result<PostedReview> {
    let endpoint = format!("repos/{}/pulls/{}/reviews", repo, pr_number);
    let request = serde_json::json!({
        "commit_id": commit_id,
        "body": body,
        "event": "COMMENT",
        "comments": comments,
    });
    let json = gh_api_post_body(&endpoint, &request).await?;
    serde_json::from_value(json).context("Failed to parse created review response")
}
