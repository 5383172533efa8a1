//! gh CLI plumbing.
//!
//! All GitHub access goes through the `gh` CLI, which owns authentication
//! (App/installation token mechanics are deliberately not reimplemented
//! here). Subprocess calls run under `spawn_blocking` to keep the tokio
//! runtime unblocked.

use anyhow::{Context, Result};
use std::io::Write;
use std::process::{Command, Stdio};

/// Execute a gh CLI command and return stdout.
pub async fn gh_command(args: &[&str]) -> Result<String> {
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();

    tokio::task::spawn_blocking(move || {
        let output = Command::new("gh")
            .args(&args)
            .output()
            .context("Failed to execute gh CLI - is it installed?")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("gh command failed: {}", stderr);
        }

        String::from_utf8(output.stdout).context("gh output contains invalid UTF-8")
    })
    .await
    .context("spawn_blocking task panicked")?
}

/// Execute a gh CLI command feeding `input` to stdin.
async fn gh_command_with_stdin(args: &[&str], input: String) -> Result<String> {
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();

    tokio::task::spawn_blocking(move || {
        let mut child = Command::new("gh")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to execute gh CLI - is it installed?")?;

        child
            .stdin
            .take()
            .context("gh stdin unavailable")?
            .write_all(input.as_bytes())
            .context("Failed to write gh stdin")?;

        let output = child.wait_with_output().context("Failed to wait for gh")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("gh command failed: {}", stderr);
        }

        String::from_utf8(output.stdout).context("gh output contains invalid UTF-8")
    })
    .await
    .context("spawn_blocking task panicked")?
}

/// Execute gh api command with JSON output
pub async fn gh_api(endpoint: &str) -> Result<serde_json::Value> {
    let output = gh_command(&["api", endpoint]).await?;
    serde_json::from_str(&output).context("Failed to parse gh api response as JSON")
}

/// Field type for gh api command
pub enum FieldValue<'a> {
    /// String field (-f)
    String(&'a str),
    /// Raw/typed field (-F) - for integers, booleans, null
    Raw(&'a str),
}

/// Execute gh api with method and fields
pub async fn gh_api_post(
    endpoint: &str,
    fields: &[(&str, FieldValue<'_>)],
) -> Result<serde_json::Value> {
    let mut args = vec![
        "api".to_string(),
        "--method".to_string(),
        "POST".to_string(),
        endpoint.to_string(),
    ];
    for (key, value) in fields {
        match value {
            FieldValue::String(v) => {
                args.push("-f".to_string());
                args.push(format!("{}={}", key, v));
            }
            FieldValue::Raw(v) => {
                args.push("-F".to_string());
                args.push(format!("{}={}", key, v));
            }
        }
    }
    let args_refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
    let output = gh_command(&args_refs).await?;
    serde_json::from_str(&output).context("Failed to parse gh api response as JSON")
}

/// Execute gh api POST with a full JSON body over stdin.
///
/// Needed for endpoints taking nested arrays (e.g. a review with its
/// inline comments), which `-f`/`-F` fields cannot express.
pub async fn gh_api_post_body(
    endpoint: &str,
    body: &serde_json::Value,
) -> Result<serde_json::Value> {
    let input = serde_json::to_string(body).context("Failed to serialize request body")?;
    let output = gh_command_with_stdin(
        &["api", "--method", "POST", endpoint, "--input", "-"],
        input,
    )
    .await?;
    serde_json::from_str(&output).context("Failed to parse gh api response as JSON")
}
