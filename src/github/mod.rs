mod client;
mod comment;
mod pr;

// Explicit re-exports - only export what is actually used
pub use comment::{create_review, create_review_comment, create_summary_comment, InlineComment};
pub use pr::{fetch_changed_files, fetch_pr, Branch, ChangedFile, FileStatus, PullRequest, User};
