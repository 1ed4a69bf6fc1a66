// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::context::JobContext;
use crate::error::JobError;
use async_trait::async_trait;
use dock_jobs_core::JobParameters;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOutput {
	pub message: String,
	pub metadata: Option<serde_json::Value>,
}

/// Platform logic the job runner can invoke by name.
#[async_trait]
pub trait JobHandler: Send + Sync {
	/// Job-kind name the runner dispatches on.
	fn name(&self) -> &str;

	/// Total attempts allowed before the run is reported as failed.
	fn max_fails(&self) -> u32 {
		1
	}

	fn should_retry(&self) -> bool {
		false
	}

	/// Check the parameters without doing any network work.
	fn validate(&self, params: &JobParameters) -> Result<(), JobError>;

	async fn run(&self, ctx: &JobContext, params: &JobParameters) -> Result<JobOutput, JobError>;
}
