//! Webhook event dispatch.
//!
//! Decides what, if anything, a delivery should trigger. Parse failures
//! surface as `Ignored` outcomes with a reason; dispatch itself never
//! fails.

use serde_json::Value;
use tracing::{info, warn};

use super::event::PullRequestEvent;

/// Pull request actions that trigger a review.
pub const REVIEW_ACTIONS: &[&str] = &["opened", "synchronize", "reopened"];

/// Outcome of dispatching one webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A reviewable pull request event.
    Review(PullRequestEvent),
    /// A `ping` delivery; carries the zen string back.
    Pong { zen: String },
    /// An `installation` lifecycle event, acknowledged only.
    InstallationAck {
        action: String,
        installation_id: Option<u64>,
    },
    /// Anything that requires no action.
    Ignored { event_type: String, reason: String },
}

/// Handles and dispatches GitHub webhook events.
#[derive(Debug, Default)]
pub struct WebhookHandler;

impl WebhookHandler {
    pub fn new() -> Self {
        Self
    }

    /// Dispatch an event by its `X-GitHub-Event` type.
    pub fn dispatch(&self, event_type: &str, payload: &Value) -> Dispatch {
        let action = payload.get("action").and_then(Value::as_str).unwrap_or("");
        info!(event_type, action, "dispatching webhook event");

        match event_type {
            "pull_request" => self.handle_pull_request(payload),
            "ping" => self.handle_ping(payload),
            "installation" => self.handle_installation(payload),
            other => {
                info!(event_type = other, "ignoring unsupported event type");
                Dispatch::Ignored {
                    event_type: other.to_string(),
                    reason: "unsupported event type".to_string(),
                }
            }
        }
    }

    fn handle_pull_request(&self, payload: &Value) -> Dispatch {
        let action = payload
            .get("action")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        if !REVIEW_ACTIONS.contains(&action.as_str()) {
            info!(action, "PR action does not require review");
            return Dispatch::Ignored {
                event_type: "pull_request".to_string(),
                reason: format!("action '{}' does not trigger review", action),
            };
        }

        match PullRequestEvent::from_payload(payload) {
            Ok(event) => {
                info!(
                    pr_number = event.number,
                    repository = %event.repository,
                    action,
                    "PR event parsed for review"
                );
                Dispatch::Review(event)
            }
            Err(e) => {
                warn!(error = %e, "failed to parse PR event");
                Dispatch::Ignored {
                    event_type: "pull_request".to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }

    fn handle_ping(&self, payload: &Value) -> Dispatch {
        match payload.get("zen").and_then(Value::as_str) {
            Some(zen) => {
                info!(zen, "ping event received");
                Dispatch::Pong {
                    zen: zen.to_string(),
                }
            }
            None => {
                warn!("ping payload missing 'zen'");
                Dispatch::Ignored {
                    event_type: "ping".to_string(),
                    reason: "missing 'zen' in ping payload".to_string(),
                }
            }
        }
    }

    fn handle_installation(&self, payload: &Value) -> Dispatch {
        let action = payload
            .get("action")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let installation_id = payload
            .get("installation")
            .and_then(|i| i.get("id"))
            .and_then(Value::as_u64);

        info!(action, installation_id, "installation event received");
        Dispatch::InstallationAck {
            action,
            installation_id,
        }
    }
}
