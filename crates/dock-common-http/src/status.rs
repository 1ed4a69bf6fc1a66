// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Mapping of HTTP failures onto [`ClientErrorKind`].

use dock_jobs_core::{ClientError, ClientErrorKind};
use reqwest::header::HeaderMap;
use reqwest::{Response, StatusCode};
use tracing::debug;

/// Classify a non-success status code.
pub fn classify_status(status: StatusCode, message: impl Into<String>) -> ClientError {
	let kind = match status {
		StatusCode::NOT_FOUND => ClientErrorKind::NotFound,
		StatusCode::CONFLICT => ClientErrorKind::Conflict,
		StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => ClientErrorKind::Transient,
		s if s.is_server_error() => ClientErrorKind::Transient,
		_ => ClientErrorKind::Fatal,
	};
	ClientError::new(kind, format!("{}: {}", status.as_u16(), message.into()))
}

/// Classify a transport-level failure.
pub fn classify_error(err: &reqwest::Error) -> ClientError {
	if err.is_timeout() || err.is_connect() {
		return ClientError::transient(err.to_string());
	}
	match err.status() {
		Some(status) => classify_status(status, err.to_string()),
		None => ClientError::fatal(err.to_string()),
	}
}

/// Turn an unsuccessful response into a [`ClientError`], keeping the body as
/// the message.
pub async fn error_for_response(response: Response) -> ClientError {
	let status = response.status();
	let body = response.text().await.unwrap_or_default();
	debug!(status = status.as_u16(), body = %body, "request failed");
	classify_status(status, body)
}

/// Parse a header holding a number of seconds, e.g. `Refresh-After: 5`.
pub fn header_secs(headers: &HeaderMap, name: &str) -> Option<u64> {
	headers
		.get(name)
		.and_then(|v| v.to_str().ok())
		.and_then(|s| s.trim().parse().ok())
}
