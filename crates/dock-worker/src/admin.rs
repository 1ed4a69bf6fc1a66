// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Subcommand;
use dock_jobs_core::{AdminJobId, AdminJobRequest, AdminJobView, ScheduleParam, ScheduleType};
use dock_server_adminjobs::{AdminJobManager, HttpJobRunnerClient, SqliteAdminJobStore};
use dock_server_config::ServerConfig;

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
	/// Create an admin job and hand it to the job runner
	Submit {
		#[arg(long)]
		name: String,
		#[command(flatten)]
		schedule: ScheduleArgs,
		/// JSON file passed to the runner as job parameters
		#[arg(long)]
		params: Option<PathBuf>,
	},
	/// Replace the periodic schedule of a job
	Schedule {
		#[arg(long)]
		name: String,
		#[command(flatten)]
		schedule: ScheduleArgs,
	},
	/// Show one admin job
	Get { id: AdminJobId },
	/// List the most recent admin jobs with the given name
	List {
		#[arg(long)]
		name: String,
	},
	/// Show the current schedule for a job name
	GetSchedule {
		#[arg(long)]
		name: String,
	},
	/// Print the runner log of an admin job
	Log { id: AdminJobId },
}

#[derive(clap::Args, Debug)]
pub struct ScheduleArgs {
	/// Hourly, Daily, Weekly, Custom, Manual or None
	#[arg(long = "schedule-type", default_value = "Manual")]
	schedule_type: String,
	#[arg(long, default_value = "")]
	cron: String,
}

impl ScheduleArgs {
	fn to_param(&self) -> anyhow::Result<ScheduleParam> {
		let schedule_type: ScheduleType = self.schedule_type.parse()?;
		Ok(ScheduleParam::new(schedule_type, self.cron.clone()))
	}
}

async fn build_manager(config: &ServerConfig) -> anyhow::Result<AdminJobManager> {
	let pool = dock_server_adminjobs::create_pool(&config.database.url)
		.await
		.with_context(|| format!("failed to open database {}", config.database.url))?;
	let store = SqliteAdminJobStore::new(pool);
	store.migrate().await?;

	let runner = HttpJobRunnerClient::new(&config.jobs.jobservice_url)?;
	Ok(AdminJobManager::new(
		Arc::new(store),
		Arc::new(runner),
		config.jobs.core_internal_url.clone(),
	)
	.with_list_limit(config.jobs.list_limit))
}

pub async fn execute(config: &ServerConfig, command: AdminCommand) -> anyhow::Result<()> {
	let manager = build_manager(config).await?;

	match command {
		AdminCommand::Submit {
			name,
			schedule,
			params,
		} => {
			let mut request = AdminJobRequest::new(name, schedule.to_param()?);
			if let Some(path) = params {
				let content = std::fs::read_to_string(&path)
					.with_context(|| format!("failed to read {}", path.display()))?;
				request = request.with_parameters(serde_json::from_str(&content)?);
			}
			let id = manager.submit(request).await?;
			println!("{id}");
		}
		AdminCommand::Schedule { name, schedule } => {
			let request = AdminJobRequest::new(name, schedule.to_param()?);
			match manager.update_schedule(request).await? {
				Some(id) => println!("{id}"),
				None => println!("schedule removed"),
			}
		}
		AdminCommand::Get { id } => {
			let job = manager.get(id).await?;
			print_json(&AdminJobView::try_from(&job)?)?;
		}
		AdminCommand::List { name } => {
			let views = manager
				.list_recent(&name)
				.await?
				.iter()
				.map(AdminJobView::try_from)
				.collect::<Result<Vec<_>, _>>()?;
			print_json(&views)?;
		}
		AdminCommand::GetSchedule { name } => {
			print_json(&manager.get_schedule(&name).await?)?;
		}
		AdminCommand::Log { id } => {
			let log = manager.get_log(id).await?;
			std::io::stdout().write_all(&log)?;
		}
	}
	Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
	println!("{}", serde_json::to_string_pretty(value)?);
	Ok(())
}
