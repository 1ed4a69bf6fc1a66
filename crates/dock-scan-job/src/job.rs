// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use dock_jobs_core::{JobParameters, ReportSchemas, ScanJobParams};
use dock_server_jobs::{JobContext, JobError, JobHandler, JobOutput};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::error::{PollerError, PollerFailure, ScanJobError};
use crate::poller::{PollSettings, ReportPoller};
use crate::scanner::{HttpScannerClientFactory, ScannerClientFactory};

/// Job-kind name the runner dispatches scan jobs on.
pub const SCAN_JOB_NAME: &str = "IMAGE_SCAN";

const DEFAULT_MAX_FAILS: u32 = 3;

/// Submits an artifact to a scanner adapter and checks in one report per
/// requested mime type.
pub struct ScanJob {
	scanners: Arc<dyn ScannerClientFactory>,
	schemas: ReportSchemas,
	settings: PollSettings,
	max_fails: u32,
}

impl Default for ScanJob {
	fn default() -> Self {
		Self::new(Arc::new(HttpScannerClientFactory))
	}
}

impl ScanJob {
	pub fn new(scanners: Arc<dyn ScannerClientFactory>) -> Self {
		Self {
			scanners,
			schemas: ReportSchemas::default(),
			settings: PollSettings::default(),
			max_fails: DEFAULT_MAX_FAILS,
		}
	}

	pub fn with_settings(mut self, settings: PollSettings) -> Self {
		self.settings = settings;
		self
	}

	pub fn with_schemas(mut self, schemas: ReportSchemas) -> Self {
		self.schemas = schemas;
		self
	}

	pub fn with_max_fails(mut self, max_fails: u32) -> Self {
		self.max_fails = max_fails;
		self
	}

	async fn execute(&self, ctx: &JobContext, params: ScanJobParams) -> Result<JobOutput, ScanJobError> {
		log_params(&params);

		let client = self
			.scanners
			.client_for(&params.registration)
			.map_err(ScanJobError::Client)?;
		let handle = client
			.submit_scan(&params.request)
			.await
			.map_err(ScanJobError::Submit)?;
		info!(scan_id = %handle, mime_types = params.mime_types.len(), "Scan submitted");

		let poller = Arc::new(ReportPoller {
			client,
			schemas: self.schemas.clone(),
			settings: self.settings,
			ctx: ctx.clone(),
			handle: handle.clone(),
			digest: params.request.artifact.digest.clone(),
			registration_uuid: params.registration.uuid.clone(),
		});

		let workers = params.mime_types.iter().cloned().map(|mime_type| {
			let poller = Arc::clone(&poller);
			tokio::spawn(async move { poller.poll(&mime_type).await })
		});

		// Slot i belongs to worker i; read only after every worker has finished.
		let slots = join_all(workers).await;

		let failures: Vec<PollerFailure> = slots
			.into_iter()
			.zip(params.mime_types.iter())
			.enumerate()
			.filter_map(|(index, (slot, mime_type))| {
				let error = match slot {
					Ok(Ok(())) => return None,
					Ok(Err(e)) => e,
					Err(join_err) => PollerError::Aborted(join_err.to_string()),
				};
				error!(index, mime_type = %mime_type, error = %error, "Report poller failed");
				Some(PollerFailure {
					index,
					mime_type: mime_type.clone(),
					error,
				})
			})
			.collect();

		if !failures.is_empty() {
			return Err(ScanJobError::Aggregate(failures));
		}

		Ok(JobOutput {
			message: format!("scan {handle} finished"),
			metadata: Some(serde_json::json!({
				"scan_id": handle.id,
				"mime_types": params.mime_types,
			})),
		})
	}
}

fn log_params(params: &ScanJobParams) {
	match serde_json::to_string_pretty(&params.registration.redacted()) {
		Ok(json) => info!("Scanner registration:\n{json}"),
		Err(e) => warn!(error = %e, "Failed to encode scanner registration for logging"),
	}
	match serde_json::to_string_pretty(&params.request.redacted()) {
		Ok(json) => info!("Scan request:\n{json}"),
		Err(e) => warn!(error = %e, "Failed to encode scan request for logging"),
	}
	info!(mime_types = ?params.mime_types, "Report mime types");
}

#[async_trait]
impl JobHandler for ScanJob {
	fn name(&self) -> &str {
		SCAN_JOB_NAME
	}

	fn max_fails(&self) -> u32 {
		self.max_fails
	}

	fn should_retry(&self) -> bool {
		true
	}

	fn validate(&self, params: &JobParameters) -> Result<(), JobError> {
		ScanJobParams::from_parameters(params)?;
		Ok(())
	}

	#[instrument(skip(self, ctx, params), fields(run_id = %ctx.run_id, attempt = ctx.attempt))]
	async fn run(&self, ctx: &JobContext, params: &JobParameters) -> Result<JobOutput, JobError> {
		let params = ScanJobParams::from_parameters(params)?;
		match self.execute(ctx, params).await {
			Err(e) if ctx.is_cancelled() => {
				warn!(error = %e, "Scan job failed before cancellation, reporting it as cancelled");
				Err(JobError::Cancelled)
			}
			result => result.map_err(Into::into),
		}
	}
}
