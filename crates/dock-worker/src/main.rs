// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Dock worker binary.
//!
//! `dock-worker run` executes one job payload through the job registry.
//! `dock-worker admin ...` drives the admin job manager against the
//! configured database and job runner.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dock_jobs_core::JobParameters;
use dock_scan_job::{PollSettings, ScanJob};
use dock_server_config::{LogFormat, ServerConfig};
use dock_server_jobs::{CancellationToken, HttpCheckIn, JobRegistry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod admin;

#[derive(Parser, Debug)]
#[command(name = "dock-worker", about = "Dock job worker", version)]
struct Args {
	/// Config file (defaults to /etc/dock/server.toml)
	#[arg(long, global = true, env = "DOCK_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Run a single job payload
	Run {
		/// Registered job name, e.g. IMAGE_SCAN
		#[arg(long)]
		job: String,
		/// JSON file holding the job parameters
		#[arg(long)]
		params: PathBuf,
		/// URL check-in reports are posted to
		#[arg(long)]
		checkin_url: String,
	},
	/// Manage admin jobs
	Admin {
		#[command(subcommand)]
		command: admin::AdminCommand,
	},
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	let config = match &args.config {
		Some(path) => dock_server_config::load_config_with_file(path)?,
		None => dock_server_config::load_config()?,
	};

	init_tracing(&config);

	match args.command {
		Command::Run {
			job,
			params,
			checkin_url,
		} => run_job(&config, &job, &params, &checkin_url).await,
		Command::Admin { command } => admin::execute(&config, command).await,
	}
}

fn init_tracing(config: &ServerConfig) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| config.logging.level.clone().into());

	let registry = tracing_subscriber::registry().with(filter);
	match config.logging.format {
		LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
		LogFormat::Plain => registry.with(tracing_subscriber::fmt::layer()).init(),
	}
}

fn build_registry(config: &ServerConfig) -> JobRegistry {
	let settings = PollSettings {
		first_check: Duration::from_secs(config.jobs.scan_first_check_secs),
		timeout: Duration::from_secs(config.jobs.scan_check_timeout_secs),
	};

	let mut registry = JobRegistry::new();
	registry.register(Arc::new(
		ScanJob::default()
			.with_settings(settings)
			.with_max_fails(config.jobs.max_fails),
	));
	registry
}

fn read_params(path: &Path) -> anyhow::Result<JobParameters> {
	let content = std::fs::read_to_string(path)
		.with_context(|| format!("failed to read job parameters from {}", path.display()))?;
	serde_json::from_str(&content)
		.with_context(|| format!("job parameters in {} are not a JSON object", path.display()))
}

async fn run_job(
	config: &ServerConfig,
	job: &str,
	params_path: &Path,
	checkin_url: &str,
) -> anyhow::Result<()> {
	let registry = build_registry(config);
	let params = read_params(params_path)?;
	let checkin = Arc::new(HttpCheckIn::new(checkin_url)?);

	let token = CancellationToken::new();
	let signal_token = token.clone();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			tracing::info!("Received shutdown signal, cancelling job");
			signal_token.cancel();
		}
	});

	tracing::info!(job_name = %job, "starting job");
	let output = registry.dispatch(job, &params, checkin, token).await?;
	tracing::info!(job_name = %job, message = %output.message, "job finished");
	if let Some(metadata) = output.metadata {
		println!("{}", serde_json::to_string_pretty(&metadata)?);
	}
	Ok(())
}
