// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client with consistent User-Agent header.

use dock_jobs_core::ClientError;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Creates a new HTTP client builder with the standard dock User-Agent header.
///
/// Use this when you need to customize the client (e.g., accept self-signed
/// certificates for an in-cluster scanner).
pub fn builder() -> ClientBuilder {
	Client::builder()
		.user_agent(user_agent())
		.timeout(DEFAULT_TIMEOUT)
}

/// Creates a new HTTP client with the standard User-Agent.
pub fn new_client(skip_cert_verify: bool) -> Result<Client, ClientError> {
	builder()
		.danger_accept_invalid_certs(skip_cert_verify)
		.build()
		.map_err(|e| ClientError::fatal(format!("failed to build HTTP client: {e}")))
}

/// Returns the standard dock User-Agent string.
///
/// Format: `dock/{version}`
pub fn user_agent() -> String {
	format!("dock/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_agent_has_correct_format() {
		let ua = user_agent();
		let parts: Vec<&str> = ua.split('/').collect();
		assert_eq!(parts.len(), 2);
		assert_eq!(parts[0], "dock");
	}

	#[test]
	fn client_builds_with_and_without_cert_checks() {
		assert!(new_client(false).is_ok());
		assert!(new_client(true).is_ok());
	}
}
