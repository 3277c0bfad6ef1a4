mod api_client;
mod config;
mod errors;
mod models;
mod normalize;
mod parsing;
mod reconcile;
mod service;
mod store;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api_client::HttpProfileApi;
use crate::config::Config;
use crate::errors::SyncError;
use crate::models::parse::ParseStatus;
use crate::models::profile::ProfileDocument;
use crate::parsing::poller::SessionGuard;
use crate::service::SyncService;
use crate::store::ProfileStore;

#[derive(Parser, Debug)]
#[command(name = "profile-sync", about = "Profile reconciliation and resume-parse sync")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and print the full profile document.
    Show { slug: String },
    /// Reconcile an edited profile document (JSON file) against the backend.
    Sync {
        slug: String,
        /// Path to the edited ProfileDocument JSON.
        #[arg(long)]
        file: PathBuf,
    },
    /// Trigger resume parsing, poll to completion, and print the recovered
    /// section patch.
    Parse { slug: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Argument parsing first: --help and usage errors need no environment.
    let cli = Cli::parse();

    // Configuration next (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let target = env!("CARGO_PKG_NAME").replace('-', "_");
            EnvFilter::new(format!("{target}={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("profile-sync v{}", env!("CARGO_PKG_VERSION"));
    let api = Arc::new(HttpProfileApi::new(&config.api_base_url, &config.api_token));
    let service = SyncService::new(api);

    match cli.command {
        Command::Show { slug } => {
            let doc = service.load(&slug).await?;
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        Command::Sync { slug, file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let mut doc: ProfileDocument =
                serde_json::from_str(&raw).context("parsing profile document")?;
            if doc.slug.is_empty() {
                doc.slug = slug;
            }

            let mut store = ProfileStore::new();
            store.begin_load();
            store.hydrate(doc.clone());

            let summary = match service.save(&doc).await {
                Ok(summary) => summary,
                Err(SyncError::Validation(report)) => {
                    // Per-field detail, not just the issue count.
                    println!("{}", report.issues_pretty());
                    anyhow::bail!("validation failed ({} issue(s)), nothing synced", report.issues.len());
                }
                Err(e) => return Err(e.into()),
            };
            for err in &summary.report.errors {
                warn!(
                    collection = %err.collection,
                    kind = %err.kind,
                    id = ?err.id,
                    "{}", err.message
                );
            }
            if summary.report.is_clean() {
                info!(applied = summary.report.applied.len(), "sync finished");
            } else {
                warn!(
                    applied = summary.report.applied.len(),
                    errors = summary.report.errors.len(),
                    "sync finished with errors"
                );
            }

            // Adopt the re-fetched document rather than patching the local copy.
            store.replace(summary.document);
            if let Some(doc) = store.document() {
                println!("{}", serde_json::to_string_pretty(doc)?);
            }
        }
        Command::Parse { slug } => {
            let mut store = ProfileStore::new();
            if store.begin_load() {
                let doc = service.load(&slug).await?;
                store.hydrate(doc);
            }

            let guard = SessionGuard::new();
            let session = service.parse_resume(&slug, &guard).await?;

            if session.status == ParseStatus::Parsed {
                if let Some(patch) = &session.extracted {
                    store.apply_patch(patch);
                }
                if let Some(doc) = store.document() {
                    println!("{}", serde_json::to_string_pretty(doc)?);
                }
            } else {
                println!("{}", serde_json::to_string_pretty(&session)?);
                if session.retryable() {
                    info!("parsing timed out; run this command again to retry");
                }
            }
        }
    }

    Ok(())
}
