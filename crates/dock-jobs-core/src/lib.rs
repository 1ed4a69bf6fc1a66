// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types shared by the dock admin job manager and the scan job executor.
//!
//! This crate provides:
//! - Admin job records, schedule descriptors and the runner payload they produce
//! - The scan request / scanner registration entities and their JSON codecs
//! - The strongly-typed scan job parameter contract
//! - Check-in reports and report schema resolution
//! - The closed error-kind enumeration returned by external clients

pub mod admin_job;
pub mod checkin;
pub mod client;
pub mod error;
pub mod params;
pub mod report;
pub mod scan;
pub mod schedule;

pub use admin_job::{
	AdminJob, AdminJobId, AdminJobQuery, AdminJobRequest, AdminJobSchedule, AdminJobView, JobKind,
	NewAdminJob, RunnerJobMetadata, RunnerJobSpec,
};
pub use checkin::CheckInReport;
pub use client::{ClientError, ClientErrorKind};
pub use error::{CoreError, Result};
pub use params::{
	JobParameters, ScanJobParams, JOB_PARAM_MIME_TYPES, JOB_PARAM_REGISTRATION,
	JOB_PARAM_SCAN_REQUEST,
};
pub use report::{
	JsonObjectSchema, ReportSchema, ReportSchemas, TypedReport, VulnerabilityReport,
	MIME_TYPE_RAW_REPORT, MIME_TYPE_VULN_REPORT,
};
pub use scan::{Artifact, Authorization, Registration, Registry, ScanRequest, HIDDEN};
pub use schedule::{validate_cron_expression, ScheduleParam, ScheduleType};
