mod event;
mod handler;
mod signature;

// Explicit re-exports - only export what is actually used
pub use event::PullRequestEvent;
pub use handler::{Dispatch, WebhookHandler};
pub use signature::verify_signature;
