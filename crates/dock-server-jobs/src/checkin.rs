// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Check-in sink that posts payloads back to the platform over HTTP.

use async_trait::async_trait;
use dock_jobs_core::ClientError;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

use crate::context::CheckIn;

pub struct HttpCheckIn {
	url: String,
	http_client: Client,
}

impl HttpCheckIn {
	pub fn new(url: impl Into<String>) -> Result<Self, ClientError> {
		Ok(Self {
			url: url.into(),
			http_client: dock_common_http::new_client(false)?,
		})
	}
}

#[async_trait]
impl CheckIn for HttpCheckIn {
	async fn checkin(&self, payload: &str) -> Result<(), ClientError> {
		debug!(url = %self.url, bytes = payload.len(), "Posting check-in");

		let response = self
			.http_client
			.post(&self.url)
			.header(CONTENT_TYPE, "application/json")
			.body(payload.to_string())
			.send()
			.await
			.map_err(|e| dock_common_http::classify_error(&e))?;

		if !response.status().is_success() {
			return Err(dock_common_http::error_for_response(response).await);
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use dock_jobs_core::ClientErrorKind;
	use wiremock::matchers::{body_string, header, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	#[tokio::test]
	async fn posts_payload_verbatim() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/checkin"))
			.and(header("content-type", "application/json"))
			.and(body_string(r#"{"digest":"sha256:abc"}"#))
			.respond_with(ResponseTemplate::new(200))
			.expect(1)
			.mount(&server)
			.await;

		let sink = HttpCheckIn::new(format!("{}/checkin", server.uri())).unwrap();
		sink.checkin(r#"{"digest":"sha256:abc"}"#).await.unwrap();
	}

	#[tokio::test]
	async fn server_error_is_transient() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(503))
			.mount(&server)
			.await;

		let sink = HttpCheckIn::new(server.uri()).unwrap();
		let err = sink.checkin("{}").await.unwrap_err();
		assert_eq!(err.kind, ClientErrorKind::Transient);
	}
}
