//! Review session state machine.
//!
//! Tracks one review from webhook to posted comments. In-memory only;
//! a crashed review is simply re-triggered by the next push.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::comment::ReviewComment;
use crate::github::{ChangedFile, PullRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    Pending,
    Loading,
    Reviewing,
    Posting,
    Completed,
    Failed,
}

impl ReviewState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    fn can_transition_to(&self, next: ReviewState) -> bool {
        if next == Self::Failed {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Self::Pending, Self::Loading)
                | (Self::Loading, Self::Reviewing)
                | (Self::Reviewing, Self::Posting)
                | (Self::Posting, Self::Completed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Loading => "loading",
            Self::Reviewing => "reviewing",
            Self::Posting => "posting",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Error)]
#[error("invalid transition: {from} -> {to}")]
pub struct SessionError {
    pub from: &'static str,
    pub to: &'static str,
}

/// Tracks the state of one review.
#[derive(Debug)]
pub struct ReviewSession {
    pub repo: String,
    pub pull_request: PullRequest,
    pub state: ReviewState,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub files: Vec<ChangedFile>,
    pub comments: Vec<ReviewComment>,
    pub error: Option<String>,
}

impl ReviewSession {
    pub fn new(repo: &str, pull_request: PullRequest) -> Self {
        Self {
            repo: repo.to_string(),
            pull_request,
            state: ReviewState::Pending,
            started_at: Utc::now(),
            completed_at: None,
            files: Vec::new(),
            comments: Vec::new(),
            error: None,
        }
    }

    /// Move to a new state, rejecting transitions the lifecycle does not
    /// allow.
    pub fn transition_to(&mut self, next: ReviewState) -> Result<(), SessionError> {
        if !self.state.can_transition_to(next) {
            return Err(SessionError {
                from: self.state.as_str(),
                to: next.as_str(),
            });
        }
        self.state = next;
        if next.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Record an error and move to `Failed` from any non-terminal state.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        if !self.state.is_terminal() {
            self.state = ReviewState::Failed;
            self.completed_at = Some(Utc::now());
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn duration_seconds(&self) -> Option<f64> {
        self.completed_at.map(|done| {
            (done - self.started_at).num_milliseconds() as f64 / 1000.0
        })
    }

    pub fn files_reviewed(&self) -> usize {
        self.files.len()
    }

    pub fn comments_count(&self) -> usize {
        self.comments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::{Branch, User};

    fn sample_pr() -> PullRequest {
        PullRequest {
            number: 1,
            title: "Test".to_string(),
            body: None,
            state: "open".to_string(),
            head: Branch {
                ref_name: "feature".to_string(),
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
            additions: 2,
            deletions: 0,
        }
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut session = ReviewSession::new("owner/repo", sample_pr());
        for state in [
            ReviewState::Loading,
            ReviewState::Reviewing,
            ReviewState::Posting,
            ReviewState::Completed,
        ] {
            session.transition_to(state).unwrap();
        }
        assert!(session.is_terminal());
        assert!(session.completed_at.is_some());
        assert!(session.duration_seconds().is_some());
    }

    #[test]
    fn test_skipping_states_rejected() {
        let mut session = ReviewSession::new("owner/repo", sample_pr());
        let err = session.transition_to(ReviewState::Posting).unwrap_err();
        assert_eq!(err.from, "pending");
        assert_eq!(err.to, "posting");
        assert_eq!(session.state, ReviewState::Pending);
    }

    #[test]
    fn test_failed_reachable_from_any_active_state() {
        let mut session = ReviewSession::new("owner/repo", sample_pr());
        session.transition_to(ReviewState::Loading).unwrap();
        session.transition_to(ReviewState::Failed).unwrap();
        assert!(session.is_terminal());
    }

    #[test]
    fn test_terminal_states_have_no_transitions() {
        let mut session = ReviewSession::new("owner/repo", sample_pr());
        session.fail("boom");
        assert!(session.transition_to(ReviewState::Loading).is_err());
        assert!(session.transition_to(ReviewState::Failed).is_err());
    }

    #[test]
    fn test_fail_records_error_once() {
        let mut session = ReviewSession::new("owner/repo", sample_pr());
        session.transition_to(ReviewState::Loading).unwrap();
        session.fail("network down");
        assert_eq!(session.state, ReviewState::Failed);
        assert_eq!(session.error.as_deref(), Some("network down"));
    }

    #[test]
    fn test_counts() {
        let session = ReviewSession::new("owner/repo", sample_pr());
        assert_eq!(session.files_reviewed(), 0);
        assert_eq!(session.comments_count(), 0);
        assert!(session.duration_seconds().is_none());
    }
}
