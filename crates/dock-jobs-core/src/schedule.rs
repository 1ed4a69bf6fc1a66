// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Schedule descriptors for admin jobs.

use cron::Schedule;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::admin_job::JobKind;
use crate::error::{CoreError, Result};

/// How an admin job is triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ScheduleType {
	Hourly,
	Daily,
	Weekly,
	Custom,
	/// Run once, right now.
	Manual,
	/// Cancel any existing schedule and create nothing.
	None,
}

impl ScheduleType {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Hourly => "Hourly",
			Self::Daily => "Daily",
			Self::Weekly => "Weekly",
			Self::Custom => "Custom",
			Self::Manual => "Manual",
			Self::None => "None",
		}
	}

	/// Whether this type is driven by a cron expression.
	pub fn is_cron_driven(&self) -> bool {
		matches!(self, Self::Hourly | Self::Daily | Self::Weekly | Self::Custom)
	}
}

impl fmt::Display for ScheduleType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ScheduleType {
	type Err = CoreError;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"Hourly" => Ok(Self::Hourly),
			"Daily" => Ok(Self::Daily),
			"Weekly" => Ok(Self::Weekly),
			"Custom" => Ok(Self::Custom),
			"Manual" => Ok(Self::Manual),
			"None" => Ok(Self::None),
			other => Err(CoreError::InvalidScheduleType(other.to_string())),
		}
	}
}

impl TryFrom<String> for ScheduleType {
	type Error = CoreError;

	fn try_from(value: String) -> Result<Self> {
		value.parse()
	}
}

impl From<ScheduleType> for String {
	fn from(value: ScheduleType) -> Self {
		value.as_str().to_string()
	}
}

/// The schedule trigger of an admin job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleParam {
	#[serde(rename = "type")]
	pub schedule_type: ScheduleType,
	/// Cron expression; ignored for `Manual` and `None`.
	#[serde(default)]
	pub cron: String,
}

impl ScheduleParam {
	pub fn new(schedule_type: ScheduleType, cron: impl Into<String>) -> Self {
		Self {
			schedule_type,
			cron: cron.into(),
		}
	}

	pub fn manual() -> Self {
		Self::new(ScheduleType::Manual, "")
	}

	pub fn none() -> Self {
		Self::new(ScheduleType::None, "")
	}

	/// The runner job kind this schedule produces. `None` produces nothing.
	pub fn job_kind(&self) -> Option<JobKind> {
		match self.schedule_type {
			ScheduleType::Hourly
			| ScheduleType::Daily
			| ScheduleType::Weekly
			| ScheduleType::Custom => Some(JobKind::Periodic),
			ScheduleType::Manual => Some(JobKind::Generic),
			ScheduleType::None => None,
		}
	}

	pub fn is_periodic(&self) -> bool {
		self.job_kind() == Some(JobKind::Periodic)
	}

	pub fn validate(&self) -> Result<()> {
		if self.schedule_type.is_cron_driven() {
			validate_cron_expression(&self.cron)?;
		}
		Ok(())
	}

	/// Serialized descriptor stored on the admin job record.
	pub fn to_descriptor(&self) -> Result<String> {
		Ok(serde_json::to_string(self)?)
	}

	/// Decode a stored descriptor; an empty descriptor means "no schedule".
	pub fn from_descriptor(descriptor: &str) -> Result<Option<Self>> {
		if descriptor.is_empty() {
			return Ok(None);
		}
		Ok(Some(serde_json::from_str(descriptor)?))
	}
}

/// Convert a standard 5-field Unix cron expression to the 7-field format
/// expected by the `cron` crate. 6- and 7-field expressions already carry a
/// seconds field and are passed through.
fn convert_to_cron_crate_format(expression: &str) -> String {
	if expression.split_whitespace().count() == 5 {
		format!("0 {} *", expression)
	} else {
		expression.to_string()
	}
}

/// Validate a cron expression.
pub fn validate_cron_expression(expression: &str) -> Result<()> {
	let cron_expr = convert_to_cron_crate_format(expression.trim());
	Schedule::from_str(&cron_expr)
		.map_err(|e| CoreError::InvalidCronExpression(format!("{expression} ({e})")))?;
	Ok(())
}
