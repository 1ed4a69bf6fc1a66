// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Administrative background jobs for dock.
//!
//! [`AdminJobManager`] owns the admin job records and keeps them in step with
//! the job runner: it submits one-off and periodic jobs, replaces schedules,
//! and proxies status and log queries.

pub mod error;
pub mod manager;
pub mod runner;
pub mod store;

pub use error::{AdminJobError, Result};
pub use manager::{AdminJobManager, DEFAULT_LIST_LIMIT};
pub use runner::{HttpJobRunnerClient, JobRunnerClient};
pub use store::{create_pool, AdminJobStore, SqliteAdminJobStore, StoreError, INITIAL_STATUS};
