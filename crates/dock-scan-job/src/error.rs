// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use dock_jobs_core::{ClientError, CoreError};
use dock_server_jobs::JobError;
use std::time::Duration;
use thiserror::Error;

/// Why a single report poller gave up.
#[derive(Debug, Error)]
pub enum PollerError {
	#[error("get report: {0}")]
	Scanner(ClientError),

	#[error("{0}")]
	Report(CoreError),

	#[error("check in report: {0}")]
	CheckIn(ClientError),

	#[error("check scan report timeout after {}s", .0.as_secs())]
	Timeout(Duration),

	#[error("poller aborted: {0}")]
	Aborted(String),
}

/// A poller failure tagged with the worker it came from.
#[derive(Debug, Error)]
#[error("mime type {mime_type}: {error}")]
pub struct PollerFailure {
	pub index: usize,
	pub mime_type: String,
	#[source]
	pub error: PollerError,
}

#[derive(Debug, Error)]
pub enum ScanJobError {
	#[error("invalid scan job parameters: {0}")]
	InvalidParameters(#[from] CoreError),

	#[error("scanner client: {0}")]
	Client(ClientError),

	#[error("submit scan: {0}")]
	Submit(ClientError),

	/// Failures of one or more pollers, in worker index order.
	#[error("{}", join_failures(.0))]
	Aggregate(Vec<PollerFailure>),
}

fn join_failures(failures: &[PollerFailure]) -> String {
	failures
		.iter()
		.map(ToString::to_string)
		.collect::<Vec<_>>()
		.join("; ")
}

impl From<ScanJobError> for JobError {
	fn from(err: ScanJobError) -> Self {
		match err {
			ScanJobError::InvalidParameters(e) => JobError::InvalidParameters(e),
			other => JobError::Failed {
				message: other.to_string(),
				retryable: true,
			},
		}
	}
}
