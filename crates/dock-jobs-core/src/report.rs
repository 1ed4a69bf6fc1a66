// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Report schema resolution.
//!
//! Every raw report fetched from a scanner is checked against the schema of the
//! mime type it was requested as before it is checked in.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{CoreError, Result};

/// Native vulnerability report format of the scanner adapter API.
pub const MIME_TYPE_VULN_REPORT: &str =
	"application/vnd.scanner.adapter.vuln.report.harbor+json; version=1.0";
/// Adapter-specific report passed through as an opaque JSON object.
pub const MIME_TYPE_RAW_REPORT: &str = "application/vnd.scanner.adapter.report.raw";

/// Validates a raw report body.
pub trait ReportSchema: Send + Sync {
	fn check(&self, raw: &str) -> std::result::Result<(), String>;
}

/// Accepts any body that decodes into `T`.
pub struct TypedReport<T>(PhantomData<fn() -> T>);

impl<T> TypedReport<T> {
	pub fn new() -> Self {
		Self(PhantomData)
	}
}

impl<T> Default for TypedReport<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: DeserializeOwned> ReportSchema for TypedReport<T> {
	fn check(&self, raw: &str) -> std::result::Result<(), String> {
		serde_json::from_str::<T>(raw)
			.map(|_| ())
			.map_err(|e| e.to_string())
	}
}

/// Accepts any JSON object.
pub struct JsonObjectSchema;

impl ReportSchema for JsonObjectSchema {
	fn check(&self, raw: &str) -> std::result::Result<(), String> {
		match serde_json::from_str::<serde_json::Value>(raw) {
			Ok(serde_json::Value::Object(_)) => Ok(()),
			Ok(_) => Err("expected a JSON object".to_string()),
			Err(e) => Err(e.to_string()),
		}
	}
}

/// Table of known report mime types.
#[derive(Clone)]
pub struct ReportSchemas {
	schemas: HashMap<String, Arc<dyn ReportSchema>>,
}

impl ReportSchemas {
	/// An empty table; every mime type is unsupported.
	pub fn empty() -> Self {
		Self {
			schemas: HashMap::new(),
		}
	}

	pub fn register(mut self, mime_type: impl Into<String>, schema: impl ReportSchema + 'static) -> Self {
		self.schemas.insert(mime_type.into(), Arc::new(schema));
		self
	}

	pub fn supports(&self, mime_type: &str) -> bool {
		self.schemas.contains_key(mime_type)
	}

	/// Check `raw` against the schema registered for `mime_type`.
	pub fn resolve(&self, mime_type: &str, raw: &str) -> Result<()> {
		let schema = self
			.schemas
			.get(mime_type)
			.ok_or_else(|| CoreError::UnsupportedMimeType(mime_type.to_string()))?;
		schema
			.check(raw)
			.map_err(|message| CoreError::ReportSchemaMismatch {
				mime_type: mime_type.to_string(),
				message,
			})
	}
}

impl Default for ReportSchemas {
	fn default() -> Self {
		Self::empty()
			.register(MIME_TYPE_VULN_REPORT, TypedReport::<VulnerabilityReport>::new())
			.register(MIME_TYPE_RAW_REPORT, JsonObjectSchema)
	}
}

/// Vulnerability report returned for [`MIME_TYPE_VULN_REPORT`].
///
/// Adapters omit or null out fields they have nothing for, a clean image
/// typically reports `"vulnerabilities": null`. Missing and null fields decode
/// as their defaults; only values of the wrong type are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerabilityReport {
	#[serde(default, deserialize_with = "null_as_default")]
	pub generated_at: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub artifact: ReportArtifact,
	#[serde(default, deserialize_with = "null_as_default")]
	pub scanner: ReportScanner,
	#[serde(default, deserialize_with = "null_as_default")]
	pub severity: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub vulnerabilities: Vec<VulnerabilityItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportArtifact {
	#[serde(default, deserialize_with = "null_as_default")]
	pub repository: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub digest: String,
	#[serde(default)]
	pub tag: Option<String>,
	#[serde(default)]
	pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportScanner {
	#[serde(default, deserialize_with = "null_as_default")]
	pub name: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub vendor: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerabilityItem {
	#[serde(default, deserialize_with = "null_as_default")]
	pub id: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub package: String,
	#[serde(default, deserialize_with = "null_as_default")]
	pub version: String,
	#[serde(default)]
	pub fix_version: Option<String>,
	#[serde(default, deserialize_with = "null_as_default")]
	pub severity: String,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default, deserialize_with = "null_as_default")]
	pub links: Vec<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de> + Default,
{
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
