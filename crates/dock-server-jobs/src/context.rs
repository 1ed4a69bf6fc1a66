// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use dock_jobs_core::ClientError;
use std::sync::Arc;

pub use tokio_util::sync::CancellationToken;

/// Sink for units of work completed before the job terminates.
#[async_trait]
pub trait CheckIn: Send + Sync {
	async fn checkin(&self, payload: &str) -> Result<(), ClientError>;
}

/// Execution context of a single job run.
#[derive(Clone)]
pub struct JobContext {
	pub run_id: String,
	pub job_name: String,
	/// 1-based attempt number within the run.
	pub attempt: u32,
	/// System-level shutdown signal shared by everything in the run.
	pub cancellation_token: CancellationToken,
	checkin: Arc<dyn CheckIn>,
}

impl JobContext {
	pub fn new(
		job_name: impl Into<String>,
		checkin: Arc<dyn CheckIn>,
		cancellation_token: CancellationToken,
	) -> Self {
		Self {
			run_id: uuid::Uuid::new_v4().to_string(),
			job_name: job_name.into(),
			attempt: 1,
			cancellation_token,
			checkin,
		}
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancellation_token.is_cancelled()
	}

	pub async fn checkin(&self, payload: &str) -> Result<(), ClientError> {
		self.checkin.checkin(payload).await
	}
}
