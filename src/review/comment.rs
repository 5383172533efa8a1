//! Review comment model.

use crate::github::InlineComment;

/// Severity level of a review comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Must fix.
    Error,
    /// Should fix.
    Warning,
    /// Suggestion.
    Info,
    /// Positive feedback.
    Praise,
}

impl Severity {
    /// Lenient parse of model output; unknown strings become `Info`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warning" => Self::Warning,
            "praise" => Self::Praise,
            _ => Self::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Praise => "praise",
        }
    }

    fn emoji(&self) -> &'static str {
        match self {
            Self::Error => ":x:",
            Self::Warning => ":warning:",
            Self::Info => ":information_source:",
            Self::Praise => ":star:",
        }
    }
}

/// Category of issue found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Bug,
    Security,
    Performance,
    Style,
    BestPractice,
    Documentation,
    CustomRule,
}

impl Category {
    /// Lenient parse of model output; unknown strings become `BestPractice`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "bug" => Self::Bug,
            "security" => Self::Security,
            "performance" => Self::Performance,
            "style" => Self::Style,
            "documentation" => Self::Documentation,
            "custom_rule" => Self::CustomRule,
            _ => Self::BestPractice,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bug => "bug",
            Self::Security => "security",
            Self::Performance => "performance",
            Self::Style => "style",
            Self::BestPractice => "best_practice",
            Self::Documentation => "documentation",
            Self::CustomRule => "custom_rule",
        }
    }
}

/// Which coordinate space an inline comment's line number refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSide {
    /// Old file (removed lines).
    Left,
    /// New file (added lines).
    Right,
}

impl LineSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
        }
    }
}

/// Where a comment lands on the pull request.
///
/// An inline comment carries its anchor by construction, so a comment
/// with a line number but no file path cannot exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentKind {
    /// Posted on the PR conversation timeline.
    Summary,
    /// Anchored to a file line.
    Inline {
        path: String,
        line: u32,
        side: LineSide,
    },
}

/// A comment to be posted on the pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewComment {
    pub body: String,
    pub severity: Severity,
    pub category: Category,
    pub kind: CommentKind,
}

impl ReviewComment {
    pub fn summary(body: impl Into<String>, severity: Severity, category: Category) -> Self {
        Self {
            body: body.into(),
            severity,
            category,
            kind: CommentKind::Summary,
        }
    }

    pub fn inline(
        body: impl Into<String>,
        severity: Severity,
        category: Category,
        path: impl Into<String>,
        line: u32,
        side: LineSide,
    ) -> Self {
        Self {
            body: body.into(),
            severity,
            category,
            kind: CommentKind::Inline {
                path: path.into(),
                line,
                side,
            },
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self.kind, CommentKind::Inline { .. })
    }

    /// Body with a severity/category metadata prefix.
    pub fn format_with_metadata(&self) -> String {
        format!(
            "{} **{}** ({}): {}",
            self.severity.emoji(),
            self.severity.as_str().to_uppercase(),
            self.category.as_str(),
            self.body
        )
    }

    /// GitHub review-comment shape, for inline comments only.
    pub fn to_inline_comment(&self) -> Option<InlineComment> {
        match &self.kind {
            CommentKind::Inline { path, line, side } => Some(InlineComment {
                path: path.clone(),
                line: *line,
                side: side.as_str().to_string(),
                body: self.format_with_metadata(),
            }),
            CommentKind::Summary => None,
        }
    }
}
