// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Job execution and admin job configuration.

use serde::Deserialize;

const DEFAULT_CORE_INTERNAL_URL: &str = "http://core:8080";
const DEFAULT_JOBSERVICE_URL: &str = "http://jobservice:8080";
const DEFAULT_SCAN_CHECK_TIMEOUT_SECS: u64 = 30 * 60;
const DEFAULT_SCAN_FIRST_CHECK_SECS: u64 = 2;
const DEFAULT_MAX_FAILS: u32 = 3;
const DEFAULT_LIST_LIMIT: u32 = 10;

/// Jobs configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobsConfig {
	/// Base URL of the core service; status hooks are built from it.
	pub core_internal_url: String,
	/// Base URL of the job runner.
	pub jobservice_url: String,
	/// Upper bound for waiting on one scan report.
	pub scan_check_timeout_secs: u64,
	/// Delay before the first report check.
	pub scan_first_check_secs: u64,
	pub max_fails: u32,
	/// Number of records returned by the recent jobs listing.
	pub list_limit: u32,
}

impl Default for JobsConfig {
	fn default() -> Self {
		JobsConfigLayer::default().finalize()
	}
}

/// Jobs configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobsConfigLayer {
	#[serde(default)]
	pub core_internal_url: Option<String>,
	#[serde(default)]
	pub jobservice_url: Option<String>,
	#[serde(default)]
	pub scan_check_timeout_secs: Option<u64>,
	#[serde(default)]
	pub scan_first_check_secs: Option<u64>,
	#[serde(default)]
	pub max_fails: Option<u32>,
	#[serde(default)]
	pub list_limit: Option<u32>,
}

impl JobsConfigLayer {
	pub fn merge(&mut self, other: JobsConfigLayer) {
		if other.core_internal_url.is_some() {
			self.core_internal_url = other.core_internal_url;
		}
		if other.jobservice_url.is_some() {
			self.jobservice_url = other.jobservice_url;
		}
		if other.scan_check_timeout_secs.is_some() {
			self.scan_check_timeout_secs = other.scan_check_timeout_secs;
		}
		if other.scan_first_check_secs.is_some() {
			self.scan_first_check_secs = other.scan_first_check_secs;
		}
		if other.max_fails.is_some() {
			self.max_fails = other.max_fails;
		}
		if other.list_limit.is_some() {
			self.list_limit = other.list_limit;
		}
	}

	pub fn finalize(self) -> JobsConfig {
		JobsConfig {
			core_internal_url: self
				.core_internal_url
				.unwrap_or_else(|| DEFAULT_CORE_INTERNAL_URL.to_string()),
			jobservice_url: self
				.jobservice_url
				.unwrap_or_else(|| DEFAULT_JOBSERVICE_URL.to_string()),
			scan_check_timeout_secs: self
				.scan_check_timeout_secs
				.unwrap_or(DEFAULT_SCAN_CHECK_TIMEOUT_SECS),
			scan_first_check_secs: self
				.scan_first_check_secs
				.unwrap_or(DEFAULT_SCAN_FIRST_CHECK_SECS),
			max_fails: self.max_fails.unwrap_or(DEFAULT_MAX_FAILS),
			list_limit: self.list_limit.unwrap_or(DEFAULT_LIST_LIMIT),
		}
	}
}
