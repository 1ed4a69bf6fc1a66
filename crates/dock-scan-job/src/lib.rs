// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The vulnerability scan job.
//!
//! A scan job submits one artifact to a scanner adapter, then runs one
//! concurrent poller per requested report mime type. Every poller checks its
//! report in as soon as it is available. Poller failures do not stop the
//! siblings; they are collected per worker and reported together, in worker
//! order, once all pollers have finished.

pub mod error;
pub mod job;
pub mod poller;
pub mod scanner;

pub use error::{PollerError, PollerFailure, ScanJobError};
pub use job::{ScanJob, SCAN_JOB_NAME};
pub use poller::{PollSettings, DEFAULT_CHECK_TIMEOUT, DEFAULT_FIRST_CHECK, MIN_RETRY_WAIT};
pub use scanner::{
	HttpScannerClient, HttpScannerClientFactory, ScanHandle, ScannerClient, ScannerClientFactory,
	MIME_TYPE_SCAN_REQUEST, MIME_TYPE_SCAN_RESPONSE,
};
