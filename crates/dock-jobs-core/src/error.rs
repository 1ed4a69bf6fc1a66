// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for core job entities.

use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while decoding or validating job entities.
#[derive(Debug, Error)]
pub enum CoreError {
	#[error("missing job parameter '{0}'")]
	MissingParameter(String),

	#[error("malformed job parameter '{key}', expecting {expected} but got {found}")]
	MalformedParameter {
		key: String,
		expected: &'static str,
		found: &'static str,
	},

	#[error("invalid job parameter '{key}': {message}")]
	InvalidParameter { key: String, message: String },

	#[error("invalid schedule type: {0}")]
	InvalidScheduleType(String),

	#[error("invalid schedule trigger parameter cron: {0}")]
	InvalidCronExpression(String),

	#[error("invalid scan request: {0}")]
	InvalidScanRequest(String),

	#[error("invalid scanner registration: {0}")]
	InvalidRegistration(String),

	#[error("unsupported report mime type: {0}")]
	UnsupportedMimeType(String),

	#[error("report does not match schema of {mime_type}: {message}")]
	ReportSchemaMismatch { mime_type: String, message: String },

	#[error("empty JSON data")]
	EmptyJson,

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}
