// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client for the job runner service.

use async_trait::async_trait;
use dock_jobs_core::{ClientError, RunnerJobSpec};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

#[async_trait]
pub trait JobRunnerClient: Send + Sync {
	/// Enqueue a job and return the runner-assigned UUID.
	async fn submit(&self, spec: &RunnerJobSpec) -> Result<String, ClientError>;
	async fn stop(&self, uuid: &str) -> Result<(), ClientError>;
	async fn get_log(&self, uuid: &str) -> Result<Vec<u8>, ClientError>;
}

#[derive(Serialize)]
struct SubmitRequest<'a> {
	job: &'a RunnerJobSpec,
}

#[derive(Deserialize)]
struct SubmitResponse {
	job: SubmittedJob,
}

#[derive(Deserialize)]
struct SubmittedJob {
	#[serde(alias = "id")]
	uuid: String,
}

#[derive(Serialize)]
struct ActionRequest<'a> {
	action: &'a str,
}

pub struct HttpJobRunnerClient {
	base_url: String,
	http_client: Client,
}

impl HttpJobRunnerClient {
	pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
		Ok(Self {
			base_url: base_url.into().trim_end_matches('/').to_string(),
			http_client: dock_common_http::new_client(false)?,
		})
	}
}

#[async_trait]
impl JobRunnerClient for HttpJobRunnerClient {
	#[instrument(skip(self, spec), fields(job_name = %spec.name))]
	async fn submit(&self, spec: &RunnerJobSpec) -> Result<String, ClientError> {
		let url = format!("{}/api/v1/jobs", self.base_url);
		let response = self
			.http_client
			.post(&url)
			.json(&SubmitRequest { job: spec })
			.send()
			.await
			.map_err(|e| dock_common_http::classify_error(&e))?;

		if !response.status().is_success() {
			return Err(dock_common_http::error_for_response(response).await);
		}

		let body: SubmitResponse = response
			.json()
			.await
			.map_err(|e| ClientError::fatal(format!("decode submit response: {e}")))?;
		debug!(uuid = %body.job.uuid, "Job submitted to runner");
		Ok(body.job.uuid)
	}

	#[instrument(skip(self))]
	async fn stop(&self, uuid: &str) -> Result<(), ClientError> {
		let url = format!("{}/api/v1/jobs/{}", self.base_url, uuid);
		let response = self
			.http_client
			.post(&url)
			.json(&ActionRequest { action: "stop" })
			.send()
			.await
			.map_err(|e| dock_common_http::classify_error(&e))?;

		if !response.status().is_success() {
			return Err(dock_common_http::error_for_response(response).await);
		}
		Ok(())
	}

	#[instrument(skip(self))]
	async fn get_log(&self, uuid: &str) -> Result<Vec<u8>, ClientError> {
		let url = format!("{}/api/v1/jobs/{}/log", self.base_url, uuid);
		let response = self
			.http_client
			.get(&url)
			.send()
			.await
			.map_err(|e| dock_common_http::classify_error(&e))?;

		if !response.status().is_success() {
			return Err(dock_common_http::error_for_response(response).await);
		}

		let bytes = response
			.bytes()
			.await
			.map_err(|e| dock_common_http::classify_error(&e))?;
		Ok(bytes.to_vec())
	}
}
