// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use dock_jobs_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
	#[error("Job failed: {message}")]
	Failed { message: String, retryable: bool },

	#[error("Job cancelled")]
	Cancelled,

	#[error("Invalid job parameters: {0}")]
	InvalidParameters(#[from] CoreError),

	#[error("Job not found: {0}")]
	NotFound(String),
}

impl JobError {
	pub fn is_retryable(&self) -> bool {
		matches!(self, JobError::Failed { retryable: true, .. })
	}
}

pub type Result<T> = std::result::Result<T, JobError>;
