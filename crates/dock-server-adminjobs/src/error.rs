// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for admin job operations.

use dock_jobs_core::{ClientError, CoreError};
use thiserror::Error;

use crate::store::StoreError;

/// Result type for admin job operations.
pub type Result<T> = std::result::Result<T, AdminJobError>;

#[derive(Debug, Error)]
pub enum AdminJobError {
	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error("not found: {0}")]
	NotFound(String),

	#[error("precondition failed: {0}")]
	PreconditionFailed(String),

	#[error("conflict: {0}")]
	Conflict(String),

	#[error("internal error: {0}")]
	Internal(String),

	#[error("job runner error: {0}")]
	Runner(ClientError),

	#[error("store error: {0}")]
	Store(StoreError),
}

impl AdminJobError {
	/// HTTP-style status code for the API layer.
	pub fn status_code(&self) -> u16 {
		match self {
			Self::InvalidInput(_) => 400,
			Self::NotFound(_) => 404,
			Self::Conflict(_) => 409,
			Self::PreconditionFailed(_) => 412,
			Self::Internal(_) | Self::Runner(_) | Self::Store(_) => 500,
		}
	}
}

impl From<CoreError> for AdminJobError {
	fn from(err: CoreError) -> Self {
		match err {
			CoreError::Serialization(e) => Self::Internal(e.to_string()),
			other => Self::InvalidInput(other.to_string()),
		}
	}
}

impl From<StoreError> for AdminJobError {
	fn from(err: StoreError) -> Self {
		match err {
			StoreError::NotFound(message) => Self::NotFound(message),
			other => Self::Store(other),
		}
	}
}
