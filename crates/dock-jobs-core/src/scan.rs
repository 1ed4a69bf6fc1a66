// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Scan request and scanner registration entities.
//!
//! The registry [`Authorization`] travels verbatim across the job boundary but
//! prints as [`HIDDEN`] through `Debug`/`Display`, and [`ScanRequest::redacted`]
//! yields a copy that is safe to log as JSON.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::error::{CoreError, Result};

/// Placeholder printed instead of credentials.
pub const HIDDEN: &str = "[HIDDEN]";

/// A registry or scanner credential, e.g. `Bearer <token>`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Authorization(String);

impl Authorization {
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	pub fn hidden() -> Self {
		Self(HIDDEN.to_string())
	}

	/// Access the credential for use in a request header.
	pub fn expose(&self) -> &str {
		&self.0
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl fmt::Debug for Authorization {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Authorization").field(&HIDDEN).finish()
	}
}

impl fmt::Display for Authorization {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(HIDDEN)
	}
}

/// The artifact to scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
	pub repository: String,
	pub digest: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tag: Option<String>,
}

/// Where the scanner pulls the artifact from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
	pub url: String,
	#[serde(default)]
	pub authorization: Authorization,
}

/// A request handed to the scanner adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
	pub registry: Registry,
	pub artifact: Artifact,
}

impl ScanRequest {
	pub fn from_json(json: &str) -> Result<Self> {
		if json.is_empty() {
			return Err(CoreError::EmptyJson);
		}
		Ok(serde_json::from_str(json)?)
	}

	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string(self)?)
	}

	pub fn validate(&self) -> Result<()> {
		if self.registry.url.is_empty() {
			return Err(CoreError::InvalidScanRequest("missing registry url".into()));
		}
		if self.artifact.repository.is_empty() {
			return Err(CoreError::InvalidScanRequest(
				"missing artifact repository".into(),
			));
		}
		if self.artifact.digest.is_empty() {
			return Err(CoreError::InvalidScanRequest("missing artifact digest".into()));
		}
		Ok(())
	}

	/// A copy with the registry credential replaced by [`HIDDEN`].
	pub fn redacted(&self) -> Self {
		Self {
			registry: Registry {
				url: self.registry.url.clone(),
				authorization: Authorization::hidden(),
			},
			artifact: self.artifact.clone(),
		}
	}
}

/// Configuration identifying and authenticating to a scanner adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
	pub uuid: String,
	pub name: String,
	#[serde(default)]
	pub description: String,
	/// Base endpoint of the adapter API.
	pub url: String,
	/// Authorization scheme, e.g. `Bearer` or `Basic`. Empty for none.
	#[serde(default)]
	pub auth: String,
	#[serde(default)]
	pub access_credential: Authorization,
	#[serde(default)]
	pub skip_cert_verify: bool,
	#[serde(default)]
	pub use_internal_addr: bool,
}

impl Registration {
	pub fn from_json(json: &str) -> Result<Self> {
		if json.is_empty() {
			return Err(CoreError::EmptyJson);
		}
		Ok(serde_json::from_str(json)?)
	}

	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string(self)?)
	}

	pub fn validate(&self) -> Result<()> {
		if self.uuid.is_empty() {
			return Err(CoreError::InvalidRegistration("missing uuid".into()));
		}
		if self.name.is_empty() {
			return Err(CoreError::InvalidRegistration("missing name".into()));
		}
		let url = Url::parse(&self.url)
			.map_err(|e| CoreError::InvalidRegistration(format!("url {}: {e}", self.url)))?;
		if !matches!(url.scheme(), "http" | "https") {
			return Err(CoreError::InvalidRegistration(format!(
				"unsupported url scheme: {}",
				url.scheme()
			)));
		}
		Ok(())
	}

	/// A copy with the access credential replaced by [`HIDDEN`].
	pub fn redacted(&self) -> Self {
		Self {
			access_credential: if self.access_credential.is_empty() {
				Authorization::default()
			} else {
				Authorization::hidden()
			},
			..self.clone()
		}
	}

	/// The `Authorization` header value for adapter calls, if credentials are set.
	pub fn authorization_header(&self) -> Option<String> {
		if self.access_credential.is_empty() {
			return None;
		}
		if self.auth.is_empty() {
			Some(self.access_credential.expose().to_string())
		} else {
			Some(format!("{} {}", self.auth, self.access_credential.expose()))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn request() -> ScanRequest {
		ScanRequest {
			registry: Registry {
				url: "https://registry.example.com".to_string(),
				authorization: Authorization::new("Bearer s3cr3t"),
			},
			artifact: Artifact {
				repository: "library/alpine".to_string(),
				digest: "sha256:abc".to_string(),
				tag: Some("3.19".to_string()),
			},
		}
	}

	fn registration() -> Registration {
		Registration {
			uuid: "reg-1".to_string(),
			name: "trivy".to_string(),
			url: "http://trivy-adapter:8080".to_string(),
			..Default::default()
		}
	}

	#[test]
	fn authorization_never_prints() {
		let req = request();
		assert!(!format!("{:?}", req).contains("s3cr3t"));
		assert_eq!(req.registry.authorization.to_string(), HIDDEN);
	}

	#[test]
	fn wire_format_keeps_credential() {
		let json = request().to_json().unwrap();
		assert!(json.contains("Bearer s3cr3t"));
		assert_eq!(ScanRequest::from_json(&json).unwrap(), request());
	}

	#[test]
	fn redacted_copy_hides_credential() {
		let json = request().redacted().to_json().unwrap();
		assert!(!json.contains("s3cr3t"));
		assert!(json.contains(HIDDEN));
		assert!(json.contains("sha256:abc"));
	}

	#[test]
	fn scan_request_requires_digest() {
		let mut req = request();
		req.artifact.digest.clear();
		let err = req.validate().unwrap_err();
		assert!(err.to_string().contains("missing artifact digest"));
	}

	#[test]
	fn scan_request_requires_registry_url() {
		let mut req = request();
		req.registry.url.clear();
		assert!(req.validate().is_err());
	}

	#[test]
	fn empty_json_is_rejected() {
		assert!(matches!(ScanRequest::from_json(""), Err(CoreError::EmptyJson)));
		assert!(matches!(Registration::from_json(""), Err(CoreError::EmptyJson)));
	}

	#[test]
	fn registration_validation() {
		assert!(registration().validate().is_ok());

		let mut missing_uuid = registration();
		missing_uuid.uuid.clear();
		assert!(missing_uuid.validate().is_err());

		let mut bad_url = registration();
		bad_url.url = "not a url".to_string();
		assert!(bad_url.validate().is_err());

		let mut bad_scheme = registration();
		bad_scheme.url = "ftp://scanner".to_string();
		assert!(bad_scheme.validate().is_err());
	}

	#[test]
	fn redacted_registration_hides_credential() {
		let mut reg = registration();
		reg.access_credential = Authorization::new("adapter-token");
		let json = reg.redacted().to_json().unwrap();
		assert!(!json.contains("adapter-token"));
		assert_eq!(reg.redacted().uuid, "reg-1");
	}

	#[test]
	fn authorization_header_combines_scheme() {
		let mut reg = registration();
		assert_eq!(reg.authorization_header(), None);

		reg.access_credential = Authorization::new("token");
		assert_eq!(reg.authorization_header().as_deref(), Some("token"));

		reg.auth = "Bearer".to_string();
		assert_eq!(reg.authorization_header().as_deref(), Some("Bearer token"));
	}
}
