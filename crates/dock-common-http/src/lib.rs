// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for dock.
//!
//! This crate provides:
//! - A pre-configured HTTP client with consistent User-Agent header
//! - Classification of HTTP failures into [`dock_jobs_core::ClientErrorKind`]

mod client;
mod status;

pub use client::{builder, new_client, user_agent};
pub use status::{classify_error, classify_status, error_for_response, header_secs};
