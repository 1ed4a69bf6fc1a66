// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The scan job parameter contract.
//!
//! Job parameters cross the process boundary to the job runner as a loosely
//! typed, string-keyed JSON object. Scan jobs require exactly three entries:
//!
//! | Key | Stored as |
//! |-----|-----------|
//! | `registration` | JSON string holding a [`Registration`] |
//! | `scanRequest` | JSON string holding a [`ScanRequest`] |
//! | `mimeTypes` | array of strings |
//!
//! [`ScanJobParams`] is the typed view; nothing past [`ScanJobParams::from_parameters`]
//! looks at raw JSON values.

use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::scan::{Registration, ScanRequest};

pub const JOB_PARAM_REGISTRATION: &str = "registration";
pub const JOB_PARAM_SCAN_REQUEST: &str = "scanRequest";
pub const JOB_PARAM_MIME_TYPES: &str = "mimeTypes";

/// Untyped job parameters as exchanged with the job runner.
pub type JobParameters = serde_json::Map<String, Value>;

/// Validated parameters of a scan job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanJobParams {
	pub registration: Registration,
	pub request: ScanRequest,
	pub mime_types: Vec<String>,
}

impl ScanJobParams {
	/// Decode and validate all three entries. Fails on the first entry that is
	/// missing, stored with the wrong type, or semantically invalid.
	pub fn from_parameters(params: &JobParameters) -> Result<Self> {
		Ok(Self {
			registration: extract_registration(params)?,
			request: extract_scan_request(params)?,
			mime_types: extract_mime_types(params)?,
		})
	}

	pub fn to_parameters(&self) -> Result<JobParameters> {
		let mut params = JobParameters::new();
		params.insert(
			JOB_PARAM_REGISTRATION.to_string(),
			Value::String(self.registration.to_json()?),
		);
		params.insert(
			JOB_PARAM_SCAN_REQUEST.to_string(),
			Value::String(self.request.to_json()?),
		);
		params.insert(
			JOB_PARAM_MIME_TYPES.to_string(),
			Value::Array(
				self.mime_types
					.iter()
					.cloned()
					.map(Value::String)
					.collect(),
			),
		);
		Ok(params)
	}
}

pub fn extract_registration(params: &JobParameters) -> Result<Registration> {
	let json = string_param(params, JOB_PARAM_REGISTRATION)?;
	let registration = Registration::from_json(json).map_err(|e| invalid(JOB_PARAM_REGISTRATION, e))?;
	registration.validate()?;
	Ok(registration)
}

pub fn extract_scan_request(params: &JobParameters) -> Result<ScanRequest> {
	let json = string_param(params, JOB_PARAM_SCAN_REQUEST)?;
	let request = ScanRequest::from_json(json).map_err(|e| invalid(JOB_PARAM_SCAN_REQUEST, e))?;
	request.validate()?;
	Ok(request)
}

pub fn extract_mime_types(params: &JobParameters) -> Result<Vec<String>> {
	let value = params
		.get(JOB_PARAM_MIME_TYPES)
		.ok_or_else(|| CoreError::MissingParameter(JOB_PARAM_MIME_TYPES.to_string()))?;

	let items = value
		.as_array()
		.ok_or_else(|| CoreError::MalformedParameter {
			key: JOB_PARAM_MIME_TYPES.to_string(),
			expected: "array",
			found: value_kind(value),
		})?;

	items
		.iter()
		.map(|item| {
			item.as_str()
				.map(str::to_string)
				.ok_or_else(|| CoreError::MalformedParameter {
					key: JOB_PARAM_MIME_TYPES.to_string(),
					expected: "string element",
					found: value_kind(item),
				})
		})
		.collect()
}

fn string_param<'a>(params: &'a JobParameters, key: &str) -> Result<&'a str> {
	let value = params
		.get(key)
		.ok_or_else(|| CoreError::MissingParameter(key.to_string()))?;
	value.as_str().ok_or_else(|| CoreError::MalformedParameter {
		key: key.to_string(),
		expected: "string",
		found: value_kind(value),
	})
}

fn invalid(key: &str, err: CoreError) -> CoreError {
	CoreError::InvalidParameter {
		key: key.to_string(),
		message: err.to_string(),
	}
}

fn value_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "bool",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::scan::{Artifact, Authorization, Registry};
	use serde_json::json;

	fn params() -> ScanJobParams {
		ScanJobParams {
			registration: Registration {
				uuid: "reg-1".to_string(),
				name: "trivy".to_string(),
				url: "http://trivy-adapter:8080".to_string(),
				..Default::default()
			},
			request: ScanRequest {
				registry: Registry {
					url: "https://core".to_string(),
					authorization: Authorization::new("Bearer t"),
				},
				artifact: Artifact {
					repository: "library/alpine".to_string(),
					digest: "sha256:abc".to_string(),
					tag: None,
				},
			},
			mime_types: vec![
				"application/vnd.report.v1".to_string(),
				"application/vnd.report.v2".to_string(),
			],
		}
	}

	#[test]
	fn test_parameters_decode_back_to_typed_params() {
		let raw = params().to_parameters().unwrap();
		assert!(raw[JOB_PARAM_REGISTRATION].is_string());
		assert!(raw[JOB_PARAM_SCAN_REQUEST].is_string());
		assert!(raw[JOB_PARAM_MIME_TYPES].is_array());
		assert_eq!(ScanJobParams::from_parameters(&raw).unwrap(), params());
	}

	#[test]
	fn test_each_missing_key_is_reported() {
		for key in [
			JOB_PARAM_REGISTRATION,
			JOB_PARAM_SCAN_REQUEST,
			JOB_PARAM_MIME_TYPES,
		] {
			let mut raw = params().to_parameters().unwrap();
			raw.remove(key);
			match ScanJobParams::from_parameters(&raw) {
				Err(CoreError::MissingParameter(missing)) => assert_eq!(missing, key),
				other => panic!("expected missing {key}, got {other:?}"),
			}
		}
	}

	#[test]
	fn test_non_string_mime_type_is_rejected() {
		let mut raw = params().to_parameters().unwrap();
		raw.insert(
			JOB_PARAM_MIME_TYPES.to_string(),
			json!(["application/vnd.report.v1", 42]),
		);
		let err = ScanJobParams::from_parameters(&raw).unwrap_err();
		assert!(matches!(
			err,
			CoreError::MalformedParameter {
				found: "number",
				..
			}
		));
	}

	#[test]
	fn test_mime_types_must_be_an_array() {
		let mut raw = params().to_parameters().unwrap();
		raw.insert(JOB_PARAM_MIME_TYPES.to_string(), json!("application/vnd.report.v1"));
		let err = extract_mime_types(&raw).unwrap_err();
		assert!(err.to_string().contains("expecting array but got string"));
	}

	#[test]
	fn test_registration_stored_as_object_is_malformed() {
		let mut raw = params().to_parameters().unwrap();
		raw.insert(JOB_PARAM_REGISTRATION.to_string(), json!({"uuid": "reg-1"}));
		let err = extract_registration(&raw).unwrap_err();
		assert!(err.to_string().contains("expecting string but got object"));
	}

	#[test]
	fn test_unparseable_scan_request() {
		let mut raw = params().to_parameters().unwrap();
		raw.insert(JOB_PARAM_SCAN_REQUEST.to_string(), json!("{oops"));
		assert!(matches!(
			extract_scan_request(&raw),
			Err(CoreError::InvalidParameter { .. })
		));
	}

	#[test]
	fn test_scan_request_missing_digest_fails_semantic_validation() {
		let mut typed = params();
		typed.request.artifact.digest.clear();
		let raw = typed.to_parameters().unwrap();
		assert!(matches!(
			ScanJobParams::from_parameters(&raw),
			Err(CoreError::InvalidScanRequest(_))
		));
	}
}
