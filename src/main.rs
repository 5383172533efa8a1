use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod diff;
mod github;
mod retry;
mod review;
mod rules;
mod webhook;

use review::ReviewOptions;
use webhook::{Dispatch, WebhookHandler};

#[derive(Parser, Debug)]
#[command(name = "reviewbot")]
#[command(about = "AI code review agent for GitHub pull requests")]
#[command(version)]
struct Args {
    /// Repository name (e.g., "owner/repo")
    #[arg(short, long)]
    repo: Option<String>,

    /// Pull request number
    #[arg(short, long)]
    pr: Option<u64>,

    /// Webhook payload file to dispatch instead of --repo/--pr
    #[arg(long, conflicts_with_all = ["repo", "pr"])]
    payload: Option<PathBuf>,

    /// Event type of the payload (X-GitHub-Event header value)
    #[arg(long, default_value = "pull_request", requires = "payload")]
    event_type: String,

    /// X-Hub-Signature-256 header value to verify the payload against
    /// REVIEWBOT_WEBHOOK_SECRET
    #[arg(long, requires = "payload")]
    signature: Option<String>,

    /// Post review results to GitHub (dry run otherwise)
    #[arg(long, default_value = "false")]
    post: bool,

    /// Local checkout to read .reviewbot.yml and custom rules from
    #[arg(long)]
    repo_root: Option<PathBuf>,

    /// Agent backend
    #[arg(long, default_value = "claude")]
    agent: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let options = ReviewOptions {
        agent: args.agent.clone(),
        post: args.post,
        repo_root: args.repo_root.clone(),
    };

    if let Some(payload_path) = &args.payload {
        return run_webhook(payload_path, &args, &options).await;
    }

    let (repo, pr) = match (&args.repo, args.pr) {
        (Some(repo), Some(pr)) => (repo.as_str(), pr),
        _ => anyhow::bail!("either --payload or both --repo and --pr are required"),
    };

    let outcome = review::review_pull_request(repo, pr, &options).await?;
    report(&outcome);
    Ok(())
}

async fn run_webhook(payload_path: &PathBuf, args: &Args, options: &ReviewOptions) -> Result<()> {
    let raw = std::fs::read(payload_path)
        .with_context(|| format!("Failed to read payload file {}", payload_path.display()))?;

    if let Some(signature) = &args.signature {
        let secret = std::env::var("REVIEWBOT_WEBHOOK_SECRET")
            .context("REVIEWBOT_WEBHOOK_SECRET must be set to verify signatures")?;
        webhook::verify_signature(&raw, signature, &secret)?;
        info!("webhook signature verified");
    }

    let payload: serde_json::Value =
        serde_json::from_slice(&raw).context("Payload is not valid JSON")?;

    match WebhookHandler::new().dispatch(&args.event_type, &payload) {
        Dispatch::Review(event) => {
            let outcome = review::review_from_event(&event, options).await?;
            report(&outcome);
        }
        Dispatch::Pong { zen } => println!("pong: {}", zen),
        Dispatch::InstallationAck {
            action,
            installation_id,
        } => println!(
            "installation {} acknowledged (id: {})",
            action,
            installation_id.map_or("unknown".to_string(), |id| id.to_string())
        ),
        Dispatch::Ignored { event_type, reason } => {
            println!("ignored {} event: {}", event_type, reason)
        }
    }
    Ok(())
}

fn report(outcome: &review::ReviewOutcome) {
    println!("review {}", outcome.state);
    println!(
        "files: {} ({} skipped), comments: {}",
        outcome.total_files, outcome.files_skipped, outcome.total_comments
    );
    if let Some(post) = &outcome.post {
        println!(
            "posted: {} inline, summary: {}",
            post.inline_posted, post.summary_posted
        );
        for error in &post.errors {
            eprintln!("post error: {}", error);
        }
    }
    println!("\n{}", outcome.summary);
}
