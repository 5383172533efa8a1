//! Review pipeline.
//!
//! Drives one review end to end: fetch the PR and its files, run the
//! agent over each file, then post the results back. GitHub calls go
//! through the retry layer; a single file failing never aborts the run.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{error, info, warn};

use super::adapter::create_adapter;
use super::comment::ReviewComment;
use super::reviewer::{ReviewAgent, ReviewResult};
use super::session::{ReviewSession, ReviewState};
use crate::config::AgentConfig;
use crate::github::{
    create_review, create_review_comment, create_summary_comment, fetch_changed_files, fetch_pr,
    InlineComment,
};
use crate::retry::{retry_with_backoff, RetryConfig};
use crate::rules;

/// Knobs for one review run.
pub struct ReviewOptions {
    /// Agent backend name ("claude").
    pub agent: String,
    /// Post results back to GitHub; a dry run otherwise.
    pub post: bool,
    /// Local checkout to read `.reviewbot.yml` and rules from.
    pub repo_root: Option<std::path::PathBuf>,
}

impl Default for ReviewOptions {
    fn default() -> Self {
        Self {
            agent: "claude".to_string(),
            post: false,
            repo_root: None,
        }
    }
}

/// What got posted, and what failed while posting.
#[derive(Debug, Default)]
pub struct PostOutcome {
    pub inline_posted: usize,
    pub summary_posted: bool,
    pub errors: Vec<String>,
}

/// Final report of one review run.
#[derive(Debug)]
pub struct ReviewOutcome {
    pub state: &'static str,
    pub summary: String,
    pub total_files: usize,
    pub files_skipped: usize,
    pub total_comments: usize,
    pub post: Option<PostOutcome>,
}

/// Review a pull request end to end.
pub async fn review_pull_request(
    repo: &str,
    pr_number: u64,
    options: &ReviewOptions,
) -> Result<ReviewOutcome> {
    info!(repository = %repo, pr_number, "starting PR review");

    let retry = RetryConfig::default();

    let pr = retry_with_backoff(|| fetch_pr(repo, pr_number), &retry)
        .await
        .context("Failed to fetch pull request")?;

    let mut session = ReviewSession::new(repo, pr);
    session.transition_to(ReviewState::Loading)?;

    let config = load_repo_config(options.repo_root.as_deref())?;
    let custom_rules = load_repo_rules(options.repo_root.as_deref(), &config);

    let files = match retry_with_backoff(|| fetch_changed_files(repo, pr_number), &retry).await {
        Ok(files) => files,
        Err(e) => {
            session.fail(e.to_string());
            return Err(anyhow::Error::new(e).context("Failed to fetch changed files"));
        }
    };
    session.files = files;

    if let Some(max) = config.max_files {
        if session.files.len() > max {
            warn!(
                total = session.files.len(),
                max, "PR exceeds max_files, reviewing the first files only"
            );
            session.files.truncate(max);
        }
    }

    session.transition_to(ReviewState::Reviewing)?;

    let adapter = create_adapter(&options.agent, &config.model_id)?;
    let agent = ReviewAgent::new(config, custom_rules.as_deref(), adapter);

    let mut results: Vec<ReviewResult> = Vec::with_capacity(session.files.len());
    for file in &session.files {
        let result = agent.review_file(&session.pull_request, file).await;
        results.push(result);
    }

    let summary = agent.create_summary(&session.pull_request, &results).await;

    for result in &mut results {
        session.comments.append(&mut result.comments);
    }

    let files_skipped = results.iter().filter(|r| r.skipped).count();
    let total_comments = session.comments.len();

    info!(
        total_files = session.files.len(),
        files_skipped, total_comments, "review finished"
    );

    session.transition_to(ReviewState::Posting)?;

    let post = if options.post {
        Some(post_results(&session, &summary).await)
    } else {
        info!("dry run, not posting results");
        None
    };

    session.transition_to(ReviewState::Completed)?;

    if let Some(secs) = session.duration_seconds() {
        info!(duration_seconds = secs, "review session completed");
    }

    Ok(ReviewOutcome {
        state: session.state.as_str(),
        summary,
        total_files: session.files_reviewed(),
        files_skipped,
        total_comments,
        post,
    })
}

fn load_repo_config(repo_root: Option<&Path>) -> Result<AgentConfig> {
    match repo_root {
        Some(root) => AgentConfig::load_from_repo(root),
        None => Ok(AgentConfig::default()),
    }
}

fn load_repo_rules(repo_root: Option<&Path>, config: &AgentConfig) -> Option<String> {
    let root = repo_root?;
    let merged = rules::load_rules_from_repo(root, &config.rules_path);
    if merged.is_empty() {
        None
    } else {
        Some(merged)
    }
}

/// Post inline comments as one batched review, then the summary on the
/// conversation timeline. Failures are collected, not fatal.
async fn post_results(session: &ReviewSession, summary: &str) -> PostOutcome {
    let mut outcome = PostOutcome::default();
    let repo = session.repo.clone();
    let pr_number = session.pull_request.number;
    let commit_id = session.pull_request.head.sha.clone();

    let inline: Vec<InlineComment> = session
        .comments
        .iter()
        .filter_map(ReviewComment::to_inline_comment)
        .collect();

    if !inline.is_empty() {
        match create_review(&repo, pr_number, &commit_id, "", &inline).await {
            Ok(review) => {
                info!(review_id = review.id, count = inline.len(), "posted inline review");
                outcome.inline_posted = inline.len();
            }
            Err(e) => {
                // A single bad anchor fails the whole batch; posting
                // individually salvages the rest.
                warn!(error = %e, "batched review failed, posting comments individually");
                for comment in &inline {
                    match create_review_comment(
                        &repo,
                        pr_number,
                        &commit_id,
                        &comment.path,
                        comment.line,
                        &comment.side,
                        &comment.body,
                    )
                    .await
                    {
                        Ok(_) => outcome.inline_posted += 1,
                        Err(e) => {
                            error!(path = %comment.path, line = comment.line, error = %e, "failed to post inline comment");
                            outcome.errors.push(format!(
                                "Failed to post comment on {}:{}: {}",
                                comment.path, comment.line, e
                            ));
                        }
                    }
                }
            }
        }
    }

    let mut summary_body = String::from("## Code Review Summary\n\n");
    summary_body.push_str(summary);
    let standalone: Vec<&ReviewComment> = session
        .comments
        .iter()
        .filter(|c| !c.is_inline())
        .collect();
    if !standalone.is_empty() {
        summary_body.push_str("\n\n### Additional Notes\n");
        for comment in standalone {
            summary_body.push_str("\n- ");
            summary_body.push_str(&comment.format_with_metadata());
        }
    }

    match create_summary_comment(&repo, pr_number, &summary_body).await {
        Ok(posted) => {
            info!(comment_id = posted.id, "posted summary comment");
            outcome.summary_posted = true;
        }
        Err(e) => {
            error!(error = %e, "failed to post summary");
            outcome.errors.push(format!("Failed to post summary: {}", e));
        }
    }

    outcome
}

/// Review entry from a webhook event, mapping the payload straight into
/// a review run against the named repository.
pub async fn review_from_event(
    event: &crate::webhook::PullRequestEvent,
    options: &ReviewOptions,
) -> Result<ReviewOutcome> {
    info!(
        repository = %event.repository,
        pr_number = event.number,
        head_sha = %event.head_sha,
        "review triggered by webhook event"
    );
    review_pull_request(&event.repository, event.number, options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{Branch, PullRequest, User};
    use crate::review::comment::{Category, LineSide, Severity};

    fn session_with_comments() -> ReviewSession {
        let pr = PullRequest {
            number: 7,
            title: "t".to_string(),
            body: None,
            state: "open".to_string(),
            head: Branch {
                ref_name: "f".to_string(),
                sha: "a".repeat(40),
            },
            base: Branch {
                ref_name: "main".to_string(),
                sha: "b".repeat(40),
            },
            user: User {
                login: "octocat".to_string(),
            },
            changed_files: 1,
            additions: 1,
            deletions: 0,
        };
        let mut session = ReviewSession::new("owner/repo", pr);
        session.comments.push(ReviewComment::inline(
            "inline note",
            Severity::Info,
            Category::Style,
            "src/lib.rs",
            3,
            LineSide::Right,
        ));
        session.comments.push(ReviewComment::summary(
            "general note",
            Severity::Info,
            Category::BestPractice,
        ));
        session
    }

    #[test]
    fn test_options_default_is_dry_run() {
        let options = ReviewOptions::default();
        assert!(!options.post);
        assert_eq!(options.agent, "claude");
        assert!(options.repo_root.is_none());
    }

    #[test]
    fn test_inline_split_from_summary_comments() {
        let session = session_with_comments();
        let inline: Vec<InlineComment> = session
            .comments
            .iter()
            .filter_map(ReviewComment::to_inline_comment)
            .collect();
        assert_eq!(inline.len(), 1);
        assert_eq!(inline[0].path, "src/lib.rs");
        let standalone = session.comments.iter().filter(|c| !c.is_inline()).count();
        assert_eq!(standalone, 1);
    }

    #[test]
    fn test_rules_loading_ignores_missing_root() {
        let config = AgentConfig::default();
        assert!(load_repo_rules(None, &config).is_none());
    }

    #[test]
    fn test_rules_loading_from_checkout() {
        let dir = tempfile::tempdir().unwrap();
        let rules_dir = dir.path().join(".claude/rules");
        std::fs::create_dir_all(&rules_dir).unwrap();
        std::fs::write(rules_dir.join("10-security.md"), "# Security\nNo secrets.").unwrap();
        let config = AgentConfig::default();
        let merged = load_repo_rules(Some(dir.path()), &config).unwrap();
        assert!(merged.contains("No secrets."));
    }
}
