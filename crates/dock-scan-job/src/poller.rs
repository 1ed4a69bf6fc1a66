// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-mime-type report polling.
//!
//! Each poller waits `first_check` before its first fetch, then follows the
//! adapter's `NotReady` hint until the report is available, checks it against
//! the registered schema and checks it in. The deadline is fixed when the
//! poller starts and is not extended by retries.

use dock_jobs_core::{CheckInReport, ReportSchemas};
use dock_server_jobs::JobContext;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, info, instrument};

use crate::error::PollerError;
use crate::scanner::{ScanHandle, ScannerClient};

pub const DEFAULT_FIRST_CHECK: Duration = Duration::from_secs(2);
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(30 * 60);
/// Floor applied to not-ready hints so a zero hint cannot spin.
pub const MIN_RETRY_WAIT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
	/// Delay before the first report fetch.
	pub first_check: Duration,
	/// Upper bound on a single poller's lifetime.
	pub timeout: Duration,
}

impl Default for PollSettings {
	fn default() -> Self {
		Self {
			first_check: DEFAULT_FIRST_CHECK,
			timeout: DEFAULT_CHECK_TIMEOUT,
		}
	}
}

/// State shared read-only by all pollers of one scan.
pub(crate) struct ReportPoller {
	pub client: Arc<dyn ScannerClient>,
	pub schemas: ReportSchemas,
	pub settings: PollSettings,
	pub ctx: JobContext,
	pub handle: ScanHandle,
	pub digest: String,
	pub registration_uuid: String,
}

impl ReportPoller {
	/// Poll until the report for `mime_type` is checked in. Cancellation ends
	/// the poller with `Ok`.
	#[instrument(skip(self), fields(scan_id = %self.handle))]
	pub async fn poll(&self, mime_type: &str) -> Result<(), PollerError> {
		let deadline = Instant::now() + self.settings.timeout;
		let mut wait = self.settings.first_check;

		loop {
			let tick = async move {
				sleep(wait).await;
				self.check(mime_type).await
			};

			tokio::select! {
				biased;
				_ = self.ctx.cancellation_token.cancelled() => {
					info!("Report poller terminated");
					return Ok(());
				}
				_ = sleep_until(deadline) => {
					return Err(PollerError::Timeout(self.settings.timeout));
				}
				outcome = tick => match outcome? {
					Some(retry_after) => {
						debug!(retry_after_secs = retry_after.as_secs(), "Report not ready");
						wait = retry_after.max(MIN_RETRY_WAIT);
					}
					None => return Ok(()),
				},
			}
		}
	}

	/// One fetch. `Ok(Some(d))` means the report is not ready and the next
	/// fetch should happen after `d`.
	async fn check(&self, mime_type: &str) -> Result<Option<Duration>, PollerError> {
		let raw = match self.client.get_report(&self.handle, mime_type).await {
			Ok(raw) => raw,
			Err(e) => {
				return match e.retry_after() {
					Some(retry_after) => Ok(Some(retry_after)),
					None => Err(PollerError::Scanner(e)),
				};
			}
		};

		self.schemas
			.resolve(mime_type, &raw)
			.map_err(PollerError::Report)?;

		let report = CheckInReport {
			digest: self.digest.clone(),
			registration_uuid: self.registration_uuid.clone(),
			mime_type: mime_type.to_string(),
			raw_report: raw,
		};
		let payload = report.to_json().map_err(PollerError::Report)?;
		self.ctx
			.checkin(&payload)
			.await
			.map_err(PollerError::CheckIn)?;

		info!(digest = %self.digest, "Report checked in");
		Ok(None)
	}
}
