// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Check-in reports produced by scan jobs.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// A scan report for one mime type, reported back to the platform before the
/// scan job itself terminates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInReport {
	pub digest: String,
	pub registration_uuid: String,
	pub mime_type: String,
	pub raw_report: String,
}

impl CheckInReport {
	pub fn from_json(json: &str) -> Result<Self> {
		if json.is_empty() {
			return Err(CoreError::EmptyJson);
		}
		Ok(serde_json::from_str(json)?)
	}

	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string(self)?)
	}
}
