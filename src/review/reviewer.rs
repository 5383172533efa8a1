//! Per-file review agent.

use anyhow::Result;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::adapter::{extract_json_object, ModelAdapter, RawFileReview};
use super::comment::{Category, CommentKind, LineSide, ReviewComment, Severity};
use super::prompts;
use crate::config::AgentConfig;
use crate::diff::{extract_changed_lines, LineChangeType};
use crate::github::{ChangedFile, PullRequest};

/// Result of reviewing a single file.
#[derive(Debug)]
pub struct ReviewResult {
    pub file_path: String,
    pub comments: Vec<ReviewComment>,
    pub skipped: bool,
    pub skip_reason: Option<String>,
    pub summary: Option<String>,
}

impl ReviewResult {
    fn skipped(file_path: &str, reason: String) -> Self {
        Self {
            file_path: file_path.to_string(),
            comments: Vec::new(),
            skipped: true,
            skip_reason: Some(reason),
            summary: None,
        }
    }
}

/// AI agent for reviewing pull request code changes.
pub struct ReviewAgent {
    config: AgentConfig,
    system_prompt: String,
    adapter: Box<dyn ModelAdapter>,
}

impl ReviewAgent {
    pub fn new(
        config: AgentConfig,
        custom_rules: Option<&str>,
        adapter: Box<dyn ModelAdapter>,
    ) -> Self {
        let system_prompt = prompts::build_system_prompt(custom_rules);
        info!(
            model_id = %config.model_id,
            adapter = adapter.name(),
            has_custom_rules = custom_rules.is_some(),
            "review agent initialized"
        );
        Self {
            config,
            system_prompt,
            adapter,
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_seconds)
    }

    /// Skip reason for a file the agent will not review, if any.
    pub fn should_skip(&self, file: &ChangedFile) -> Option<String> {
        if file.is_binary() {
            return Some("Binary file".to_string());
        }
        for pattern in &self.config.excluded_patterns {
            match glob::Pattern::new(pattern) {
                Ok(p) if p.matches(&file.filename) => {
                    return Some(format!("Matches exclusion pattern: {}", pattern));
                }
                Ok(_) => {}
                Err(e) => warn!(pattern = %pattern, error = %e, "invalid exclusion pattern"),
            }
        }
        None
    }

    /// Review a single file, returning its comments.
    ///
    /// A model failure skips the file rather than failing the review.
    pub async fn review_file(&self, pr: &PullRequest, file: &ChangedFile) -> ReviewResult {
        if let Some(reason) = self.should_skip(file) {
            info!(file_path = %file.filename, reason = %reason, "skipping file");
            return ReviewResult::skipped(&file.filename, reason);
        }

        let prompt = prompts::build_review_prompt(
            &pr.title,
            pr.body.as_deref(),
            &file.filename,
            file.patch.as_deref().unwrap_or(""),
        );

        info!(
            file_path = %file.filename,
            additions = file.additions,
            deletions = file.deletions,
            "reviewing file"
        );

        match self
            .adapter
            .complete(&self.system_prompt, &prompt, self.timeout())
            .await
        {
            Ok(response) => {
                let (comments, summary) = self.parse_review_response(&response, file);
                ReviewResult {
                    file_path: file.filename.clone(),
                    comments,
                    skipped: false,
                    skip_reason: None,
                    summary,
                }
            }
            Err(e) => {
                warn!(file_path = %file.filename, error = %e, "failed to review file");
                ReviewResult::skipped(&file.filename, format!("Review failed: {}", e))
            }
        }
    }

    /// Parse model output into comments.
    ///
    /// Structured JSON is preferred; anything else becomes one summary
    /// comment so a chatty model still produces a usable review.
    fn parse_review_response(
        &self,
        response: &str,
        file: &ChangedFile,
    ) -> (Vec<ReviewComment>, Option<String>) {
        if let Some(json) = extract_json_object(response) {
            if let Ok(raw) = serde_json::from_str::<RawFileReview>(json) {
                let comments = self.interpret_structured(raw.comments, file);
                let summary = if raw.summary.trim().is_empty() {
                    None
                } else {
                    Some(raw.summary)
                };
                return (comments, summary);
            }
        }

        if response.trim().is_empty() {
            return (Vec::new(), None);
        }

        debug!(file_path = %file.filename, "model output was not structured, keeping as summary");
        let comment = ReviewComment::summary(
            response.trim(),
            infer_severity(response),
            infer_category(response),
        );
        let summary = Some(truncate(response.trim(), 200));
        (vec![comment], summary)
    }

    fn interpret_structured(
        &self,
        raw: Vec<super::adapter::RawReviewComment>,
        file: &ChangedFile,
    ) -> Vec<ReviewComment> {
        // Inline comments may only anchor to added lines; GitHub rejects
        // anything else. Bad anchors fold into the file summary.
        let added_lines: Vec<u32> = extract_changed_lines(file.patch.as_deref())
            .into_iter()
            .filter(|l| l.change_type == LineChangeType::Added)
            .filter_map(|l| l.new_line_number)
            .collect();

        raw.into_iter()
            .map(|c| {
                let severity = Severity::parse_lenient(&c.severity);
                let category = Category::parse_lenient(&c.category);
                if added_lines.contains(&c.line) {
                    ReviewComment {
                        body: c.body,
                        severity,
                        category,
                        kind: CommentKind::Inline {
                            path: file.filename.clone(),
                            line: c.line,
                            side: LineSide::Right,
                        },
                    }
                } else {
                    warn!(
                        file_path = %file.filename,
                        line = c.line,
                        "comment anchored to a line not added in this diff, demoting to summary"
                    );
                    ReviewComment::summary(
                        format!("`{}` line {}: {}", file.filename, c.line, c.body),
                        severity,
                        category,
                    )
                }
            })
            .collect()
    }

    /// Overall review summary built from per-file outcomes.
    pub async fn create_summary(&self, pr: &PullRequest, results: &[ReviewResult]) -> String {
        let file_summaries: Vec<(String, String)> = results
            .iter()
            .map(|r| {
                let summary = if r.skipped {
                    format!("Skipped: {}", r.skip_reason.as_deref().unwrap_or("unknown"))
                } else {
                    format!("{} comment(s)", r.comments.len())
                };
                (r.file_path.clone(), summary)
            })
            .collect();

        let prompt = prompts::build_summary_prompt(&pr.title, pr.body.as_deref(), &file_summaries);

        match self
            .adapter
            .complete(&self.system_prompt, &prompt, self.timeout())
            .await
        {
            Ok(response) => response.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "failed to create summary");
                format!("Review completed for {} files.", results.len())
            }
        }
    }
}

fn infer_severity(response: &str) -> Severity {
    let lower = response.to_lowercase();
    if lower.contains("critical") || lower.contains("security") {
        Severity::Error
    } else if lower.contains("error") || lower.contains("bug") {
        Severity::Warning
    } else if lower.contains("good") || lower.contains("well done") {
        Severity::Praise
    } else {
        Severity::Info
    }
}

fn infer_category(response: &str) -> Category {
    let lower = response.to_lowercase();
    if lower.contains("security") {
        Category::Security
    } else if lower.contains("performance") {
        Category::Performance
    } else if lower.contains("bug") {
        Category::Bug
    } else if lower.contains("style") {
        Category::Style
    } else {
        Category::BestPractice
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
