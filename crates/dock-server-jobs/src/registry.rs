// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::context::{CancellationToken, CheckIn, JobContext};
use crate::error::{JobError, Result};
use crate::job::{JobHandler, JobOutput};
use dock_jobs_core::JobParameters;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

const BASE_RETRY_DELAY_SECS: u64 = 1;
const MAX_RETRY_DELAY_SECS: u64 = 60;
const RETRY_FACTOR: f64 = 2.0;

/// Registration table mapping job-kind names to handlers. Populated once at
/// process start, looked up at dispatch time.
#[derive(Default)]
pub struct JobRegistry {
	handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl JobRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
		let name = handler.name().to_string();
		info!(job_name = %name, "Registered job handler");
		self.handlers.insert(name, handler);
	}

	pub fn get(&self, name: &str) -> Option<Arc<dyn JobHandler>> {
		self.handlers.get(name).cloned()
	}

	pub fn job_names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.handlers.keys().cloned().collect();
		names.sort();
		names
	}

	#[instrument(skip(self, params))]
	pub fn validate(&self, name: &str, params: &JobParameters) -> Result<()> {
		self.handler(name)?.validate(params)
	}

	/// Validate and run the named job, retrying failed attempts as the handler
	/// allows.
	#[instrument(skip(self, params, checkin, cancellation_token))]
	pub async fn dispatch(
		&self,
		name: &str,
		params: &JobParameters,
		checkin: Arc<dyn CheckIn>,
		cancellation_token: CancellationToken,
	) -> Result<JobOutput> {
		let handler = self.handler(name)?;
		handler.validate(params)?;

		let ctx = JobContext::new(name, checkin, cancellation_token);
		run_job_with_retry(&handler, ctx, params).await
	}

	fn handler(&self, name: &str) -> Result<Arc<dyn JobHandler>> {
		self.get(name)
			.ok_or_else(|| JobError::NotFound(name.to_string()))
	}
}

async fn run_job_with_retry(
	handler: &Arc<dyn JobHandler>,
	mut ctx: JobContext,
	params: &JobParameters,
) -> Result<JobOutput> {
	let max_attempts = if handler.should_retry() {
		handler.max_fails().max(1)
	} else {
		1
	};

	loop {
		match handler.run(&ctx, params).await {
			Ok(output) => {
				info!(job_name = %ctx.job_name, run_id = %ctx.run_id, attempt = ctx.attempt, "Job completed successfully");
				return Ok(output);
			}
			Err(JobError::Cancelled) => {
				info!(job_name = %ctx.job_name, run_id = %ctx.run_id, "Job cancelled");
				return Err(JobError::Cancelled);
			}
			Err(e) if e.is_retryable() && ctx.attempt < max_attempts => {
				let delay_secs = calculate_backoff_delay(ctx.attempt);
				warn!(
					job_name = %ctx.job_name,
					run_id = %ctx.run_id,
					attempt = ctx.attempt,
					max_attempts,
					delay_secs,
					error = %e,
					"Job failed, retrying"
				);
				tokio::select! {
					_ = tokio::time::sleep(Duration::from_secs(delay_secs)) => {}
					_ = ctx.cancellation_token.cancelled() => {
						info!(job_name = %ctx.job_name, run_id = %ctx.run_id, "Job cancelled while waiting to retry");
						return Err(JobError::Cancelled);
					}
				}
				ctx.attempt += 1;
			}
			Err(e) => {
				warn!(job_name = %ctx.job_name, run_id = %ctx.run_id, attempt = ctx.attempt, error = %e, "Job failed");
				return Err(e);
			}
		}
	}
}

pub(crate) fn calculate_backoff_delay(retry_count: u32) -> u64 {
	let delay = BASE_RETRY_DELAY_SECS as f64 * RETRY_FACTOR.powi(retry_count as i32 - 1);
	(delay as u64).min(MAX_RETRY_DELAY_SECS)
}
