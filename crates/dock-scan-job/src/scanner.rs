// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client for the scanner adapter API.
//!
//! A scan is submitted once and its reports are fetched per mime type. While a
//! report is still being produced the adapter answers `302 Found` (some answer
//! `202 Accepted`) with a `Refresh-After` or `Retry-After` header, which
//! surfaces as a
//! [`ClientErrorKind::NotReady`](dock_jobs_core::ClientErrorKind::NotReady)
//! carrying the hint.

use async_trait::async_trait;
use dock_jobs_core::{ClientError, Registration, ScanRequest};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{redirect, Client, StatusCode};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

pub const MIME_TYPE_SCAN_REQUEST: &str =
	"application/vnd.scanner.adapter.scan.request+json; version=1.0";
pub const MIME_TYPE_SCAN_RESPONSE: &str =
	"application/vnd.scanner.adapter.scan.response+json; version=1.0";

const REFRESH_AFTER_HEADER: &str = "Refresh-After";
const RETRY_AFTER_HEADER: &str = "Retry-After";
const DEFAULT_REFRESH_AFTER_SECS: u64 = 5;

/// Identifier assigned by the adapter to a submitted scan.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScanHandle {
	pub id: String,
}

impl ScanHandle {
	pub fn new(id: impl Into<String>) -> Self {
		Self { id: id.into() }
	}
}

impl fmt::Display for ScanHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.id)
	}
}

#[async_trait]
pub trait ScannerClient: Send + Sync {
	async fn submit_scan(&self, request: &ScanRequest) -> Result<ScanHandle, ClientError>;

	/// Fetch the raw report for `mime_type`. Returns a `NotReady` error while
	/// the adapter is still working.
	async fn get_report(&self, handle: &ScanHandle, mime_type: &str) -> Result<String, ClientError>;
}

/// Builds a [`ScannerClient`] for a registration.
pub trait ScannerClientFactory: Send + Sync {
	fn client_for(&self, registration: &Registration) -> Result<Arc<dyn ScannerClient>, ClientError>;
}

/// Factory producing [`HttpScannerClient`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpScannerClientFactory;

impl ScannerClientFactory for HttpScannerClientFactory {
	fn client_for(&self, registration: &Registration) -> Result<Arc<dyn ScannerClient>, ClientError> {
		Ok(Arc::new(HttpScannerClient::new(registration)?))
	}
}

pub struct HttpScannerClient {
	base_url: String,
	authorization: Option<String>,
	http_client: Client,
}

impl HttpScannerClient {
	pub fn new(registration: &Registration) -> Result<Self, ClientError> {
		let http_client = dock_common_http::builder()
			.redirect(redirect::Policy::none())
			.danger_accept_invalid_certs(registration.skip_cert_verify)
			.build()
			.map_err(|e| ClientError::fatal(format!("failed to build HTTP client: {e}")))?;

		Ok(Self {
			base_url: registration.url.trim_end_matches('/').to_string(),
			authorization: registration.authorization_header(),
			http_client,
		})
	}

	fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
		match &self.authorization {
			Some(value) => request.header(AUTHORIZATION, value),
			None => request,
		}
	}
}

#[async_trait]
impl ScannerClient for HttpScannerClient {
	#[instrument(skip(self, request), fields(base_url = %self.base_url))]
	async fn submit_scan(&self, request: &ScanRequest) -> Result<ScanHandle, ClientError> {
		let url = format!("{}/api/v1/scan", self.base_url);
		let body = request
			.to_json()
			.map_err(|e| ClientError::fatal(format!("encode scan request: {e}")))?;

		let response = self
			.authorize(self.http_client.post(&url))
			.header(CONTENT_TYPE, MIME_TYPE_SCAN_REQUEST)
			.header(ACCEPT, MIME_TYPE_SCAN_RESPONSE)
			.body(body)
			.send()
			.await
			.map_err(|e| dock_common_http::classify_error(&e))?;

		if !response.status().is_success() {
			return Err(dock_common_http::error_for_response(response).await);
		}

		let handle: ScanHandle = response
			.json()
			.await
			.map_err(|e| ClientError::fatal(format!("decode scan response: {e}")))?;
		debug!(scan_id = %handle, "Scan submitted");
		Ok(handle)
	}

	#[instrument(skip(self), fields(base_url = %self.base_url, scan_id = %handle))]
	async fn get_report(&self, handle: &ScanHandle, mime_type: &str) -> Result<String, ClientError> {
		let url = format!("{}/api/v1/scan/{}/report", self.base_url, handle.id);

		let response = self
			.authorize(self.http_client.get(&url))
			.header(ACCEPT, mime_type)
			.send()
			.await
			.map_err(|e| dock_common_http::classify_error(&e))?;

		match response.status() {
			StatusCode::OK => response
				.text()
				.await
				.map_err(|e| dock_common_http::classify_error(&e)),
			StatusCode::FOUND | StatusCode::ACCEPTED => {
				let headers = response.headers();
				let secs = dock_common_http::header_secs(headers, REFRESH_AFTER_HEADER)
					.or_else(|| dock_common_http::header_secs(headers, RETRY_AFTER_HEADER))
					.unwrap_or(DEFAULT_REFRESH_AFTER_SECS);
				Err(ClientError::not_ready(secs))
			}
			_ => Err(dock_common_http::error_for_response(response).await),
		}
	}
}
