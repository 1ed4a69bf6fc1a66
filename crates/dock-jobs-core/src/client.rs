// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Errors returned by the external collaborators (job runner, scanner adapter,
//! check-in sink).
//!
//! Callers pattern-match on [`ClientErrorKind`] instead of inspecting status codes.

use std::fmt;
use std::time::Duration;

/// The closed set of outcomes a client call can fail with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
	/// The remote resource does not exist (HTTP 404).
	NotFound,
	/// The remote side refused because of a conflicting state (HTTP 409).
	Conflict,
	/// The requested artifact is not available yet; retry after the hint.
	NotReady { retry_after_secs: u64 },
	/// Network or server-side failure that may succeed later.
	Transient,
	/// Anything else.
	Fatal,
}

impl fmt::Display for ClientErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NotFound => write!(f, "not found"),
			Self::Conflict => write!(f, "conflict"),
			Self::NotReady { retry_after_secs } => {
				write!(f, "not ready, retry after {retry_after_secs}s")
			}
			Self::Transient => write!(f, "transient failure"),
			Self::Fatal => write!(f, "fatal failure"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ClientError {
	pub kind: ClientErrorKind,
	pub message: String,
}

impl ClientError {
	pub fn new(kind: ClientErrorKind, message: impl Into<String>) -> Self {
		Self {
			kind,
			message: message.into(),
		}
	}

	pub fn not_found(message: impl Into<String>) -> Self {
		Self::new(ClientErrorKind::NotFound, message)
	}

	pub fn conflict(message: impl Into<String>) -> Self {
		Self::new(ClientErrorKind::Conflict, message)
	}

	pub fn not_ready(retry_after_secs: u64) -> Self {
		Self::new(
			ClientErrorKind::NotReady { retry_after_secs },
			"report is not ready yet",
		)
	}

	pub fn transient(message: impl Into<String>) -> Self {
		Self::new(ClientErrorKind::Transient, message)
	}

	pub fn fatal(message: impl Into<String>) -> Self {
		Self::new(ClientErrorKind::Fatal, message)
	}

	pub fn is_not_found(&self) -> bool {
		self.kind == ClientErrorKind::NotFound
	}

	pub fn is_conflict(&self) -> bool {
		self.kind == ClientErrorKind::Conflict
	}

	/// The server-provided retry hint, if this is a not-ready signal.
	pub fn retry_after(&self) -> Option<Duration> {
		match self.kind {
			ClientErrorKind::NotReady { retry_after_secs } => {
				Some(Duration::from_secs(retry_after_secs))
			}
			_ => None,
		}
	}
}
