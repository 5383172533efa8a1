//! Model adapters.
//!
//! The review agent talks to a model through the `ModelAdapter` trait so
//! the pipeline does not care which backend produces the text. The only
//! shipped adapter drives the `claude` CLI as a subprocess, mirroring how
//! GitHub access goes through `gh`.

use anyhow::{anyhow, Context as _, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Raw per-file model output, before lenient interpretation.
#[derive(Debug, Deserialize)]
pub(crate) struct RawFileReview {
    pub summary: String,
    #[serde(default)]
    pub comments: Vec<RawReviewComment>,
}

/// Raw review comment structure.
#[derive(Debug, Deserialize)]
pub(crate) struct RawReviewComment {
    pub line: u32,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub category: String,
    pub body: String,
}

#[async_trait]
pub trait ModelAdapter: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// Run one completion, failing if the model does not answer in time.
    async fn complete(
        &self,
        system_prompt: &str,
        prompt: &str,
        timeout_duration: Duration,
    ) -> Result<String>;
}

/// Adapter that shells out to the `claude` CLI in print mode.
#[derive(Debug)]
pub struct ClaudeCli {
    model_id: String,
}

impl ClaudeCli {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
        }
    }

    async fn run_cli(&self, system_prompt: String, prompt: String) -> Result<String> {
        let model = self.model_id.clone();

        tokio::task::spawn_blocking(move || {
            let mut child = Command::new("claude")
                .args([
                    "-p",
                    "--model",
                    &model,
                    "--append-system-prompt",
                    &system_prompt,
                    "--output-format",
                    "text",
                ])
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()
                .context("Failed to execute claude CLI - is it installed?")?;

            child
                .stdin
                .take()
                .context("claude stdin unavailable")?
                .write_all(prompt.as_bytes())
                .context("Failed to write claude stdin")?;

            let output = child
                .wait_with_output()
                .context("Failed to wait for claude")?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                anyhow::bail!("claude command failed: {}", stderr);
            }

            String::from_utf8(output.stdout).context("claude output contains invalid UTF-8")
        })
        .await
        .context("spawn_blocking task panicked")?
    }
}

#[async_trait]
impl ModelAdapter for ClaudeCli {
    fn name(&self) -> &str {
        "claude"
    }

    async fn complete(
        &self,
        system_prompt: &str,
        prompt: &str,
        timeout_duration: Duration,
    ) -> Result<String> {
        debug!(model = %self.model_id, prompt_len = prompt.len(), "invoking claude CLI");

        timeout(
            timeout_duration,
            self.run_cli(system_prompt.to_string(), prompt.to_string()),
        )
        .await
        .map_err(|_| {
            anyhow!(
                "model timeout after {} seconds",
                timeout_duration.as_secs()
            )
        })?
    }
}

/// Create an adapter from agent name
pub fn create_adapter(name: &str, model_id: &str) -> Result<Box<dyn ModelAdapter>> {
    match name {
        "claude" => Ok(Box::new(ClaudeCli::new(model_id))),
        other => Err(anyhow!("Unsupported agent: {}. Supported: claude", other)),
    }
}

/// Pull the first JSON object out of model output.
///
/// Models wrap JSON in prose or fences often enough that strict parsing
/// would throw away good reviews.
pub(crate) fn extract_json_object(output: &str) -> Option<&str> {
    let start = output.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in output[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&output[start..=start + i]);
                }
            }
            _ => {}
        }
    }
    None
}
