// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Job execution core for dock workers.
//!
//! The job runner invokes platform logic by job-kind name. This crate provides
//! the handler contract, a registration table populated at process start, the
//! per-run execution context, and the runner-level retry loop.

pub mod checkin;
pub mod context;
pub mod error;
pub mod job;
pub mod registry;

pub use checkin::HttpCheckIn;
pub use context::{CancellationToken, CheckIn, JobContext};
pub use error::{JobError, Result};
pub use job::{JobHandler, JobOutput};
pub use registry::JobRegistry;
