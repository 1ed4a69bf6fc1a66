// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Admin job lifecycle.
//!
//! The job runner has no update-in-place primitive, so a schedule change is
//! always stop, delete, then (unless the new type is `None`) submit again. At
//! most one periodic record may exist per job name.

use dock_jobs_core::{
	AdminJob, AdminJobId, AdminJobQuery, AdminJobRequest, AdminJobSchedule, JobKind, NewAdminJob,
	ScheduleType,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::{AdminJobError, Result};
use crate::runner::JobRunnerClient;
use crate::store::{AdminJobStore, StoreError};

pub const DEFAULT_LIST_LIMIT: u32 = 10;

pub struct AdminJobManager {
	store: Arc<dyn AdminJobStore>,
	runner: Arc<dyn JobRunnerClient>,
	core_internal_url: String,
	list_limit: u32,
}

impl AdminJobManager {
	pub fn new(
		store: Arc<dyn AdminJobStore>,
		runner: Arc<dyn JobRunnerClient>,
		core_internal_url: impl Into<String>,
	) -> Self {
		Self {
			store,
			runner,
			core_internal_url: core_internal_url.into(),
			list_limit: DEFAULT_LIST_LIMIT,
		}
	}

	pub fn with_list_limit(mut self, list_limit: u32) -> Self {
		self.list_limit = list_limit;
		self
	}

	/// Create a record and hand the job to the runner.
	#[instrument(skip(self, request), fields(job_name = %request.name))]
	pub async fn submit(&self, mut request: AdminJobRequest) -> Result<AdminJobId> {
		request.validate()?;
		let kind = request.job_kind().ok_or_else(|| {
			AdminJobError::InvalidInput("schedule type None does not create a job".to_string())
		})?;

		if kind == JobKind::Periodic {
			let existing = self
				.store
				.list(&AdminJobQuery::periodic(&request.name))
				.await?;
			if !existing.is_empty() {
				return Err(duplicate_schedule(&request.name));
			}
		}

		let cron = match kind {
			JobKind::Periodic => request.cron_string()?,
			JobKind::Generic => String::new(),
		};
		let new_job = NewAdminJob {
			name: request.name.clone(),
			kind,
			cron,
		};
		let id = match self.store.create(&new_job).await {
			Ok(id) => id,
			Err(StoreError::Conflict(_)) => return Err(duplicate_schedule(&request.name)),
			Err(e) => return Err(e.into()),
		};
		request.id = id;

		let spec = request.to_runner_spec(&self.core_internal_url);
		let uuid = match self.runner.submit(&spec).await {
			Ok(uuid) => uuid,
			Err(e) => {
				if let Err(del) = self.store.delete(id).await {
					warn!(admin_job_id = id, error = %del, "Failed to delete admin job after submit failure");
				}
				if e.is_conflict() {
					return Err(AdminJobError::Conflict(format!(
						"job {} is already running, try again later",
						request.name
					)));
				}
				return Err(AdminJobError::Runner(e));
			}
		};

		self.store.set_uuid(id, &uuid).await?;
		info!(admin_job_id = id, uuid = %uuid, kind = %kind, "Admin job submitted");
		Ok(id)
	}

	/// Replace the periodic schedule of `request.name`. Returns the id of the
	/// new record, or `None` when the schedule was only cancelled.
	#[instrument(skip(self, request), fields(job_name = %request.name))]
	pub async fn update_schedule(&self, request: AdminJobRequest) -> Result<Option<AdminJobId>> {
		let schedule = request.schedule();
		if schedule.schedule_type == ScheduleType::Manual {
			return Err(AdminJobError::InvalidInput(format!(
				"job {} cannot be rescheduled as Manual",
				request.name
			)));
		}
		request.validate()?;

		let existing = self.single_periodic(&request.name).await?.ok_or_else(|| {
			AdminJobError::Internal(format!("no periodic job named {} to update", request.name))
		})?;

		if let Some(uuid) = existing.uuid.as_deref() {
			match self.runner.stop(uuid).await {
				Ok(()) => {}
				Err(e) if e.is_not_found() => {
					warn!(admin_job_id = existing.id, uuid, "Runner job already gone");
				}
				Err(e) => return Err(AdminJobError::Runner(e)),
			}
		}
		self.store.delete(existing.id).await?;
		info!(admin_job_id = existing.id, "Periodic admin job removed");

		if schedule.schedule_type == ScheduleType::None {
			return Ok(None);
		}
		let id = self
			.submit(AdminJobRequest { id: 0, ..request })
			.await?;
		Ok(Some(id))
	}

	#[instrument(skip(self))]
	pub async fn get(&self, id: AdminJobId) -> Result<AdminJob> {
		self.store
			.get(id)
			.await?
			.ok_or_else(|| AdminJobError::NotFound(format!("admin job {id}")))
	}

	/// The newest executions of `name`, bounded by the list limit.
	#[instrument(skip(self))]
	pub async fn list_recent(&self, name: &str) -> Result<Vec<AdminJob>> {
		Ok(self.store.list_recent(name, self.list_limit).await?)
	}

	/// The schedule of the periodic job `name`, empty if there is none.
	#[instrument(skip(self))]
	pub async fn get_schedule(&self, name: &str) -> Result<AdminJobSchedule> {
		match self.single_periodic(name).await? {
			Some(job) => Ok(AdminJobSchedule {
				schedule: job.schedule()?,
			}),
			None => Ok(AdminJobSchedule::default()),
		}
	}

	#[instrument(skip(self))]
	pub async fn get_log(&self, id: AdminJobId) -> Result<Vec<u8>> {
		let job = self.get(id).await?;
		let uuid = job.uuid.ok_or_else(|| {
			AdminJobError::NotFound(format!("admin job {id} was never accepted by the runner"))
		})?;
		self.runner.get_log(&uuid).await.map_err(|e| {
			if e.is_not_found() {
				AdminJobError::NotFound(format!("log of admin job {id}: {}", e.message))
			} else {
				AdminJobError::Runner(e)
			}
		})
	}

	/// Record a status reported through the status hook.
	#[instrument(skip(self))]
	pub async fn update_status(&self, id: AdminJobId, status: &str) -> Result<()> {
		self.store.set_status(id, status).await?;
		Ok(())
	}

	async fn single_periodic(&self, name: &str) -> Result<Option<AdminJob>> {
		let mut jobs = self.store.list(&AdminJobQuery::periodic(name)).await?;
		match jobs.len() {
			0 => Ok(None),
			1 => Ok(jobs.pop()),
			n => Err(AdminJobError::Internal(format!(
				"found {n} periodic jobs named {name}, expected at most one"
			))),
		}
	}
}

fn duplicate_schedule(name: &str) -> AdminJobError {
	AdminJobError::PreconditionFailed(format!(
		"periodic job {name} already exists, delete existing schedule first"
	))
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use chrono::Utc;
	use dock_jobs_core::{ClientError, RunnerJobSpec, ScheduleParam};
	use proptest::prelude::*;
	use std::collections::HashMap;
	use std::sync::atomic::{AtomicU32, Ordering};
	use std::sync::Mutex;

	use crate::store::{self, SqliteAdminJobStore};

	/// Store without any uniqueness enforcement.
	#[derive(Default)]
	struct MemoryStore {
		jobs: Mutex<Vec<AdminJob>>,
		next_id: Mutex<AdminJobId>,
		deletes: AtomicU32,
	}

	impl MemoryStore {
		fn periodic_count(&self, name: &str) -> usize {
			let query = AdminJobQuery::periodic(name);
			self.jobs
				.lock()
				.unwrap()
				.iter()
				.filter(|j| query.matches(j))
				.count()
		}

		fn insert(&self, job: AdminJob) {
			self.jobs.lock().unwrap().push(job);
		}
	}

	#[async_trait]
	impl AdminJobStore for MemoryStore {
		async fn create(&self, job: &NewAdminJob) -> store::Result<AdminJobId> {
			let mut next_id = self.next_id.lock().unwrap();
			*next_id += 1;
			let now = Utc::now();
			self.jobs.lock().unwrap().push(AdminJob {
				id: *next_id,
				uuid: None,
				name: job.name.clone(),
				kind: job.kind,
				cron: job.cron.clone(),
				status: store::INITIAL_STATUS.to_string(),
				creation_time: now,
				update_time: now,
			});
			Ok(*next_id)
		}

		async fn get(&self, id: AdminJobId) -> store::Result<Option<AdminJob>> {
			Ok(self.jobs.lock().unwrap().iter().find(|j| j.id == id).cloned())
		}

		async fn list(&self, query: &AdminJobQuery) -> store::Result<Vec<AdminJob>> {
			let mut jobs: Vec<AdminJob> = self
				.jobs
				.lock()
				.unwrap()
				.iter()
				.filter(|j| query.matches(j))
				.cloned()
				.collect();
			jobs.sort_by(|a, b| b.id.cmp(&a.id));
			Ok(jobs)
		}

		async fn list_recent(&self, name: &str, limit: u32) -> store::Result<Vec<AdminJob>> {
			let query = AdminJobQuery {
				name: Some(name.to_string()),
				..Default::default()
			};
			let mut jobs = self.list(&query).await?;
			jobs.truncate(limit as usize);
			Ok(jobs)
		}

		async fn delete(&self, id: AdminJobId) -> store::Result<bool> {
			self.deletes.fetch_add(1, Ordering::SeqCst);
			let mut jobs = self.jobs.lock().unwrap();
			let before = jobs.len();
			jobs.retain(|j| j.id != id);
			Ok(jobs.len() < before)
		}

		async fn set_uuid(&self, id: AdminJobId, uuid: &str) -> store::Result<()> {
			let mut jobs = self.jobs.lock().unwrap();
			let job = jobs
				.iter_mut()
				.find(|j| j.id == id)
				.ok_or_else(|| StoreError::NotFound(format!("admin job {id}")))?;
			job.uuid = Some(uuid.to_string());
			Ok(())
		}

		async fn set_status(&self, id: AdminJobId, status: &str) -> store::Result<()> {
			let mut jobs = self.jobs.lock().unwrap();
			let job = jobs
				.iter_mut()
				.find(|j| j.id == id)
				.ok_or_else(|| StoreError::NotFound(format!("admin job {id}")))?;
			job.status = status.to_string();
			job.update_time = Utc::now();
			Ok(())
		}
	}

	#[derive(Default)]
	struct MockRunner {
		issued: AtomicU32,
		submitted: Mutex<Vec<RunnerJobSpec>>,
		stopped: Mutex<Vec<String>>,
		submit_error: Mutex<Option<ClientError>>,
		stop_error: Mutex<Option<ClientError>>,
		logs: Mutex<HashMap<String, Vec<u8>>>,
	}

	#[async_trait]
	impl JobRunnerClient for MockRunner {
		async fn submit(&self, spec: &RunnerJobSpec) -> std::result::Result<String, ClientError> {
			if let Some(err) = self.submit_error.lock().unwrap().clone() {
				return Err(err);
			}
			self.submitted.lock().unwrap().push(spec.clone());
			let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
			Ok(format!("uuid-{n}"))
		}

		async fn stop(&self, uuid: &str) -> std::result::Result<(), ClientError> {
			self.stopped.lock().unwrap().push(uuid.to_string());
			match self.stop_error.lock().unwrap().clone() {
				Some(err) => Err(err),
				None => Ok(()),
			}
		}

		async fn get_log(&self, uuid: &str) -> std::result::Result<Vec<u8>, ClientError> {
			self.logs
				.lock()
				.unwrap()
				.get(uuid)
				.cloned()
				.ok_or_else(|| ClientError::not_found(format!("job {uuid}")))
		}
	}

	struct Fixture {
		store: Arc<MemoryStore>,
		runner: Arc<MockRunner>,
		manager: AdminJobManager,
	}

	fn fixture() -> Fixture {
		let store = Arc::new(MemoryStore::default());
		let runner = Arc::new(MockRunner::default());
		let manager = AdminJobManager::new(store.clone(), runner.clone(), "http://core:8080");
		Fixture {
			store,
			runner,
			manager,
		}
	}

	fn daily(name: &str) -> AdminJobRequest {
		AdminJobRequest::new(name, ScheduleParam::new(ScheduleType::Daily, "0 0 2 * * *"))
	}

	fn cancel(name: &str) -> AdminJobRequest {
		AdminJobRequest::new(name, ScheduleParam::none())
	}

	#[tokio::test]
	async fn submit_persists_uuid_and_status_hook() {
		let f = fixture();
		let id = f.manager.submit(daily("scan-all")).await.unwrap();

		let job = f.manager.get(id).await.unwrap();
		assert_eq!(job.kind, JobKind::Periodic);
		assert_eq!(job.uuid.as_deref(), Some("uuid-1"));
		assert!(!job.cron.is_empty());

		let submitted = f.runner.submitted.lock().unwrap();
		assert_eq!(
			submitted[0].status_hook,
			format!("http://core:8080/service/notifications/jobs/adminjob/{id}")
		);
		assert!(submitted[0].metadata.unique);
	}

	#[tokio::test]
	async fn manual_submit_creates_generic_job_without_cron() {
		let f = fixture();
		let id = f
			.manager
			.submit(AdminJobRequest::new("gc", ScheduleParam::manual()))
			.await
			.unwrap();

		let job = f.manager.get(id).await.unwrap();
		assert_eq!(job.kind, JobKind::Generic);
		assert!(job.cron.is_empty());
	}

	#[tokio::test]
	async fn scan_all_scenario() {
		let f = fixture();
		f.manager.submit(daily("scan-all")).await.unwrap();

		let err = f.manager.submit(daily("scan-all")).await.unwrap_err();
		assert!(matches!(err, AdminJobError::PreconditionFailed(_)));
		assert_eq!(err.status_code(), 412);
		assert!(err.to_string().contains("delete existing schedule first"));

		let result = f.manager.update_schedule(cancel("scan-all")).await.unwrap();
		assert_eq!(result, None);
		assert_eq!(f.store.periodic_count("scan-all"), 0);
		assert_eq!(f.runner.stopped.lock().unwrap().as_slice(), ["uuid-1".to_string()]);
	}

	#[tokio::test]
	async fn replacing_schedule_yields_fresh_uuid() {
		let f = fixture();
		let old_id = f.manager.submit(daily("scan-all")).await.unwrap();

		let weekly = AdminJobRequest::new(
			"scan-all",
			ScheduleParam::new(ScheduleType::Weekly, "0 0 0 * * SUN"),
		);
		let new_id = f.manager.update_schedule(weekly).await.unwrap().unwrap();

		assert_ne!(old_id, new_id);
		assert_eq!(f.store.periodic_count("scan-all"), 1);
		let job = f.manager.get(new_id).await.unwrap();
		assert_eq!(job.uuid.as_deref(), Some("uuid-2"));
		assert!(matches!(
			f.manager.get(old_id).await,
			Err(AdminJobError::NotFound(_))
		));

		let schedule = f.manager.get_schedule("scan-all").await.unwrap();
		assert_eq!(
			schedule.schedule,
			Some(ScheduleParam::new(ScheduleType::Weekly, "0 0 0 * * SUN"))
		);
	}

	#[tokio::test]
	async fn stop_not_found_is_tolerated() {
		let f = fixture();
		f.manager.submit(daily("scan-all")).await.unwrap();
		*f.runner.stop_error.lock().unwrap() = Some(ClientError::not_found("job gone"));

		let result = f.manager.update_schedule(daily("scan-all")).await.unwrap();
		assert!(result.is_some());
		assert_eq!(f.store.periodic_count("scan-all"), 1);
	}

	#[tokio::test]
	async fn other_stop_errors_abort_the_update() {
		let f = fixture();
		f.manager.submit(daily("scan-all")).await.unwrap();
		*f.runner.stop_error.lock().unwrap() = Some(ClientError::transient("runner down"));

		let err = f.manager.update_schedule(cancel("scan-all")).await.unwrap_err();
		assert_eq!(err.status_code(), 500);
		assert_eq!(f.store.periodic_count("scan-all"), 1);
	}

	#[tokio::test]
	async fn update_rejects_manual() {
		let f = fixture();
		f.manager.submit(daily("scan-all")).await.unwrap();

		let err = f
			.manager
			.update_schedule(AdminJobRequest::new("scan-all", ScheduleParam::manual()))
			.await
			.unwrap_err();
		assert!(matches!(err, AdminJobError::InvalidInput(_)));
		assert!(f.runner.stopped.lock().unwrap().is_empty());
	}

	#[tokio::test]
	async fn update_without_existing_schedule_is_internal_error() {
		let f = fixture();
		let err = f.manager.update_schedule(daily("scan-all")).await.unwrap_err();
		assert!(matches!(err, AdminJobError::Internal(_)));
	}

	#[tokio::test]
	async fn duplicate_periodic_records_are_internal_error() {
		let f = fixture();
		for id in [100, 101] {
			f.store.insert(AdminJob {
				id,
				uuid: None,
				name: "scan-all".to_string(),
				kind: JobKind::Periodic,
				cron: String::new(),
				status: "pending".to_string(),
				creation_time: Utc::now(),
				update_time: Utc::now(),
			});
		}

		assert!(matches!(
			f.manager.get_schedule("scan-all").await,
			Err(AdminJobError::Internal(_))
		));
		assert!(matches!(
			f.manager.update_schedule(cancel("scan-all")).await,
			Err(AdminJobError::Internal(_))
		));
	}

	#[tokio::test]
	async fn invalid_cron_is_rejected_before_anything_is_stored() {
		let f = fixture();
		let request =
			AdminJobRequest::new("scan-all", ScheduleParam::new(ScheduleType::Custom, "every day"));
		let err = f.manager.submit(request).await.unwrap_err();
		assert_eq!(err.status_code(), 400);
		assert!(f.store.jobs.lock().unwrap().is_empty());
	}

	#[tokio::test]
	async fn runner_conflict_maps_to_try_again_later() {
		let f = fixture();
		*f.runner.submit_error.lock().unwrap() = Some(ClientError::conflict("duplicated job"));

		let err = f.manager.submit(daily("scan-all")).await.unwrap_err();
		assert!(matches!(err, AdminJobError::Conflict(_)));
		assert!(err.to_string().contains("try again later"));
		assert_eq!(f.store.deletes.load(Ordering::SeqCst), 1);
		assert!(f.store.jobs.lock().unwrap().is_empty());
	}

	#[tokio::test]
	async fn runner_failure_removes_record() {
		let f = fixture();
		*f.runner.submit_error.lock().unwrap() = Some(ClientError::transient("connection reset"));

		let err = f.manager.submit(daily("scan-all")).await.unwrap_err();
		assert!(matches!(err, AdminJobError::Runner(_)));
		assert_eq!(f.store.periodic_count("scan-all"), 0);
	}

	#[tokio::test]
	async fn get_schedule_is_empty_without_periodic_job() {
		let f = fixture();
		let schedule = f.manager.get_schedule("scan-all").await.unwrap();
		assert_eq!(schedule, AdminJobSchedule::default());
	}

	#[tokio::test]
	async fn list_recent_is_bounded() {
		let f = fixture();
		for _ in 0..12 {
			f.manager
				.submit(AdminJobRequest::new("gc", ScheduleParam::manual()))
				.await
				.unwrap();
		}

		let recent = f.manager.list_recent("gc").await.unwrap();
		assert_eq!(recent.len(), DEFAULT_LIST_LIMIT as usize);
		assert!(recent.windows(2).all(|w| w[0].id > w[1].id));
	}

	#[tokio::test]
	async fn get_log_proxies_to_runner() {
		let f = fixture();
		let id = f.manager.submit(daily("scan-all")).await.unwrap();
		f.runner
			.logs
			.lock()
			.unwrap()
			.insert("uuid-1".to_string(), b"started\n".to_vec());

		assert_eq!(f.manager.get_log(id).await.unwrap(), b"started\n".to_vec());

		f.runner.logs.lock().unwrap().clear();
		let err = f.manager.get_log(id).await.unwrap_err();
		assert_eq!(err.status_code(), 404);

		assert_eq!(f.manager.get_log(id + 1).await.unwrap_err().status_code(), 404);
	}

	#[tokio::test]
	async fn update_status_bumps_record() {
		let f = fixture();
		let id = f.manager.submit(daily("scan-all")).await.unwrap();

		f.manager.update_status(id, "Running").await.unwrap();
		assert_eq!(f.manager.get(id).await.unwrap().status, "Running");
		assert!(matches!(
			f.manager.update_status(id + 1, "Error").await,
			Err(AdminJobError::NotFound(_))
		));
	}

	/// Hides existing rows from `list` so the manager's pre-check always passes,
	/// as it would for two racing submissions.
	struct RacingStore(SqliteAdminJobStore);

	#[async_trait]
	impl AdminJobStore for RacingStore {
		async fn create(&self, job: &NewAdminJob) -> store::Result<AdminJobId> {
			self.0.create(job).await
		}

		async fn get(&self, id: AdminJobId) -> store::Result<Option<AdminJob>> {
			self.0.get(id).await
		}

		async fn list(&self, _query: &AdminJobQuery) -> store::Result<Vec<AdminJob>> {
			Ok(Vec::new())
		}

		async fn list_recent(&self, name: &str, limit: u32) -> store::Result<Vec<AdminJob>> {
			self.0.list_recent(name, limit).await
		}

		async fn delete(&self, id: AdminJobId) -> store::Result<bool> {
			self.0.delete(id).await
		}

		async fn set_uuid(&self, id: AdminJobId, uuid: &str) -> store::Result<()> {
			self.0.set_uuid(id, uuid).await
		}

		async fn set_status(&self, id: AdminJobId, status: &str) -> store::Result<()> {
			self.0.set_status(id, status).await
		}
	}

	#[tokio::test]
	async fn sqlite_store_closes_the_uniqueness_race() {
		let pool = sqlx::sqlite::SqlitePoolOptions::new()
			.max_connections(1)
			.connect("sqlite::memory:")
			.await
			.unwrap();
		let sqlite = SqliteAdminJobStore::new(pool);
		sqlite.migrate().await.unwrap();

		let runner = Arc::new(MockRunner::default());
		let manager = AdminJobManager::new(Arc::new(RacingStore(sqlite.clone())), runner.clone(), "http://core");
		manager.submit(daily("scan-all")).await.unwrap();

		let err = manager.submit(daily("scan-all")).await.unwrap_err();
		assert!(matches!(err, AdminJobError::PreconditionFailed(_)));
		assert_eq!(runner.submitted.lock().unwrap().len(), 1);
		assert_eq!(sqlite.list(&AdminJobQuery::periodic("scan-all")).await.unwrap().len(), 1);
	}

	#[derive(Debug, Clone)]
	enum Op {
		SubmitDaily,
		SubmitManual,
		Reschedule,
		Cancel,
	}

	fn op() -> impl Strategy<Value = Op> {
		prop_oneof![
			Just(Op::SubmitDaily),
			Just(Op::SubmitManual),
			Just(Op::Reschedule),
			Just(Op::Cancel),
		]
	}

	proptest! {
		#[test]
		fn at_most_one_periodic_job_per_name(ops in prop::collection::vec(op(), 1..20)) {
			let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
			rt.block_on(async {
				let f = fixture();
				for op in ops {
					let had_schedule = f.store.periodic_count("scan-all") == 1;
					match op {
						Op::SubmitDaily => {
							let result = f.manager.submit(daily("scan-all")).await;
							if had_schedule {
								assert!(matches!(result, Err(AdminJobError::PreconditionFailed(_))));
							} else {
								assert!(result.is_ok());
							}
						}
						Op::SubmitManual => {
							f.manager
								.submit(AdminJobRequest::new("scan-all", ScheduleParam::manual()))
								.await
								.unwrap();
						}
						Op::Reschedule => {
							let result = f.manager.update_schedule(daily("scan-all")).await;
							assert_eq!(result.is_ok(), had_schedule);
						}
						Op::Cancel => {
							let result = f.manager.update_schedule(cancel("scan-all")).await;
							assert_eq!(result.is_ok(), had_schedule);
							if had_schedule {
								assert_eq!(f.store.periodic_count("scan-all"), 0);
							}
						}
					}
					assert!(f.store.periodic_count("scan-all") <= 1);
				}
			});
		}
	}
}
