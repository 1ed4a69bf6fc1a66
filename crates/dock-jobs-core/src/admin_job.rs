// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Admin job records, requests and the payload submitted to the job runner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Result;
use crate::params::JobParameters;
use crate::schedule::ScheduleParam;

pub type AdminJobId = i64;

/// Kind of a job as understood by the job runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
	/// Single execution.
	Generic,
	/// Cron-driven recurring execution.
	Periodic,
}

impl JobKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			JobKind::Generic => "generic",
			JobKind::Periodic => "periodic",
		}
	}
}

impl fmt::Display for JobKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for JobKind {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"generic" => Ok(JobKind::Generic),
			"periodic" => Ok(JobKind::Periodic),
			_ => Err(format!("unknown job kind: {s}")),
		}
	}
}

/// A persisted admin job record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminJob {
	pub id: AdminJobId,
	/// Runner-assigned identifier, set once the job has been submitted.
	pub uuid: Option<String>,
	/// Logical job type, e.g. `scan-all`.
	pub name: String,
	pub kind: JobKind,
	/// Serialized [`ScheduleParam`]; empty for generic jobs submitted without one.
	pub cron: String,
	/// Free-form status reported by the runner.
	pub status: String,
	pub creation_time: DateTime<Utc>,
	pub update_time: DateTime<Utc>,
}

impl AdminJob {
	pub fn schedule(&self) -> Result<Option<ScheduleParam>> {
		ScheduleParam::from_descriptor(&self.cron)
	}
}

/// Fields required to create an admin job record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAdminJob {
	pub name: String,
	pub kind: JobKind,
	pub cron: String,
}

/// Filter for admin job lookups. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminJobQuery {
	pub id: Option<AdminJobId>,
	pub name: Option<String>,
	pub kind: Option<JobKind>,
}

impl AdminJobQuery {
	pub fn by_id(id: AdminJobId) -> Self {
		Self {
			id: Some(id),
			..Default::default()
		}
	}

	pub fn periodic(name: impl Into<String>) -> Self {
		Self {
			name: Some(name.into()),
			kind: Some(JobKind::Periodic),
			..Default::default()
		}
	}

	pub fn matches(&self, job: &AdminJob) -> bool {
		self.id.map_or(true, |id| id == job.id)
			&& self.name.as_deref().map_or(true, |name| name == job.name)
			&& self.kind.map_or(true, |kind| kind == job.kind)
	}
}

/// A request to run or schedule an admin job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminJobRequest {
	#[serde(default)]
	pub schedule: Option<ScheduleParam>,
	pub name: String,
	#[serde(default)]
	pub status: String,
	/// Assigned once the record has been persisted.
	#[serde(default)]
	pub id: AdminJobId,
	/// Passed through to the runner untouched.
	#[serde(default)]
	pub parameters: JobParameters,
}

impl AdminJobRequest {
	pub fn new(name: impl Into<String>, schedule: ScheduleParam) -> Self {
		Self {
			schedule: Some(schedule),
			name: name.into(),
			..Default::default()
		}
	}

	pub fn with_parameters(mut self, parameters: JobParameters) -> Self {
		self.parameters = parameters;
		self
	}

	/// The effective schedule; a request without one runs manually.
	pub fn schedule(&self) -> ScheduleParam {
		self.schedule.clone().unwrap_or_else(ScheduleParam::manual)
	}

	pub fn job_kind(&self) -> Option<JobKind> {
		self.schedule().job_kind()
	}

	pub fn is_periodic(&self) -> bool {
		self.schedule().is_periodic()
	}

	pub fn validate(&self) -> Result<()> {
		self.schedule().validate()
	}

	/// The schedule descriptor persisted on the record.
	pub fn cron_string(&self) -> Result<String> {
		self.schedule().to_descriptor()
	}

	/// Build the runner payload. `core_internal_url` is the base the runner
	/// reports status changes to.
	pub fn to_runner_spec(&self, core_internal_url: &str) -> RunnerJobSpec {
		let schedule = self.schedule();
		RunnerJobSpec {
			name: self.name.clone(),
			parameters: self.parameters.clone(),
			metadata: RunnerJobMetadata {
				kind: schedule.job_kind().unwrap_or(JobKind::Generic),
				cron: schedule.cron,
				unique: true,
			},
			status_hook: format!(
				"{}/service/notifications/jobs/adminjob/{}",
				core_internal_url.trim_end_matches('/'),
				self.id
			),
		}
	}
}

/// Job payload understood by the job runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerJobSpec {
	pub name: String,
	pub parameters: JobParameters,
	pub metadata: RunnerJobMetadata,
	pub status_hook: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerJobMetadata {
	pub kind: JobKind,
	pub cron: String,
	/// Admin jobs must never run concurrently with themselves.
	pub unique: bool,
}

/// Schedule of an admin job as returned to API callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminJobSchedule {
	pub schedule: Option<ScheduleParam>,
}

/// Admin job as returned to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminJobView {
	pub id: AdminJobId,
	pub job_name: String,
	pub job_kind: JobKind,
	pub job_status: String,
	pub deleted: bool,
	pub schedule: Option<ScheduleParam>,
	pub creation_time: DateTime<Utc>,
	pub update_time: DateTime<Utc>,
}

impl TryFrom<&AdminJob> for AdminJobView {
	type Error = crate::error::CoreError;

	fn try_from(job: &AdminJob) -> Result<Self> {
		Ok(Self {
			id: job.id,
			job_name: job.name.clone(),
			job_kind: job.kind,
			job_status: job.status.clone(),
			deleted: false,
			schedule: job.schedule()?,
			creation_time: job.creation_time,
			update_time: job.update_time,
		})
	}
}
