mod adapter;
mod comment;
mod orchestrator;
mod prompts;
mod reviewer;
mod session;

// Explicit re-exports - only export what is actually used
pub use orchestrator::{
    review_from_event, review_pull_request, PostOutcome, ReviewOptions, ReviewOutcome,
};
