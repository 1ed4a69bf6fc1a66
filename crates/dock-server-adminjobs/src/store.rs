// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Persistence for admin job records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dock_jobs_core::{AdminJob, AdminJobId, AdminJobQuery, JobKind, NewAdminJob};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};
use sqlx::FromRow;
use std::str::FromStr;
use tracing::instrument;

/// Status assigned to a record before the runner reports anything.
pub const INITIAL_STATUS: &str = "pending";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("Database error: {0}")]
	Database(#[from] sqlx::Error),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Conflict: {0}")]
	Conflict(String),

	#[error("Internal: {0}")]
	Internal(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait AdminJobStore: Send + Sync {
	async fn create(&self, job: &NewAdminJob) -> Result<AdminJobId>;
	async fn get(&self, id: AdminJobId) -> Result<Option<AdminJob>>;
	/// Records matching `query`, newest first.
	async fn list(&self, query: &AdminJobQuery) -> Result<Vec<AdminJob>>;
	/// The `limit` newest records named `name`.
	async fn list_recent(&self, name: &str, limit: u32) -> Result<Vec<AdminJob>>;
	/// Returns whether a record was removed.
	async fn delete(&self, id: AdminJobId) -> Result<bool>;
	async fn set_uuid(&self, id: AdminJobId, uuid: &str) -> Result<()>;
	async fn set_status(&self, id: AdminJobId, status: &str) -> Result<()>;
}

const SCHEMA: &[&str] = &[
	r#"
	CREATE TABLE IF NOT EXISTS admin_jobs (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		uuid TEXT,
		name TEXT NOT NULL,
		kind TEXT NOT NULL,
		cron TEXT NOT NULL DEFAULT '',
		status TEXT NOT NULL,
		creation_time TEXT NOT NULL,
		update_time TEXT NOT NULL
	)
	"#,
	r#"
	CREATE UNIQUE INDEX IF NOT EXISTS idx_admin_jobs_periodic_name
	ON admin_jobs (name) WHERE kind = 'periodic'
	"#,
	r#"
	CREATE INDEX IF NOT EXISTS idx_admin_jobs_name ON admin_jobs (name, id)
	"#,
];

/// Create a SqlitePool with WAL mode.
#[instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| StoreError::Internal(format!("Invalid database URL: {e}")))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.create_if_missing(true);

	let pool = SqlitePool::connect_with(options).await?;
	tracing::debug!("database pool created");
	Ok(pool)
}

/// SQLite implementation of the admin job store.
///
/// A partial unique index on `name` for periodic rows closes the race between
/// the manager's existence check and its insert.
#[derive(Clone)]
pub struct SqliteAdminJobStore {
	pool: SqlitePool,
}

impl SqliteAdminJobStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[instrument(skip(self))]
	pub async fn migrate(&self) -> Result<()> {
		for statement in SCHEMA {
			sqlx::query(statement).execute(&self.pool).await?;
		}
		Ok(())
	}
}

#[async_trait]
impl AdminJobStore for SqliteAdminJobStore {
	#[instrument(skip(self, job), fields(job_name = %job.name, kind = %job.kind))]
	async fn create(&self, job: &NewAdminJob) -> Result<AdminJobId> {
		let now = Utc::now().to_rfc3339();
		let result = sqlx::query(
			r#"
			INSERT INTO admin_jobs (name, kind, cron, status, creation_time, update_time)
			VALUES (?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(&job.name)
		.bind(job.kind.as_str())
		.bind(&job.cron)
		.bind(INITIAL_STATUS)
		.bind(&now)
		.bind(&now)
		.execute(&self.pool)
		.await;

		match result {
			Ok(done) => Ok(done.last_insert_rowid()),
			Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(StoreError::Conflict(
				format!("periodic job {} already exists", job.name),
			)),
			Err(e) => Err(e.into()),
		}
	}

	#[instrument(skip(self), fields(admin_job_id = id))]
	async fn get(&self, id: AdminJobId) -> Result<Option<AdminJob>> {
		let row = sqlx::query_as::<_, AdminJobRow>(
			r#"
			SELECT id, uuid, name, kind, cron, status, creation_time, update_time
			FROM admin_jobs
			WHERE id = ?
			"#,
		)
		.bind(id)
		.fetch_optional(&self.pool)
		.await?;

		row.map(TryInto::try_into).transpose()
	}

	#[instrument(skip(self))]
	async fn list(&self, query: &AdminJobQuery) -> Result<Vec<AdminJob>> {
		let rows = sqlx::query_as::<_, AdminJobRow>(
			r#"
			SELECT id, uuid, name, kind, cron, status, creation_time, update_time
			FROM admin_jobs
			WHERE (?1 IS NULL OR id = ?1)
			  AND (?2 IS NULL OR name = ?2)
			  AND (?3 IS NULL OR kind = ?3)
			ORDER BY id DESC
			"#,
		)
		.bind(query.id)
		.bind(query.name.as_deref())
		.bind(query.kind.map(|k| k.as_str()))
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[instrument(skip(self))]
	async fn list_recent(&self, name: &str, limit: u32) -> Result<Vec<AdminJob>> {
		let rows = sqlx::query_as::<_, AdminJobRow>(
			r#"
			SELECT id, uuid, name, kind, cron, status, creation_time, update_time
			FROM admin_jobs
			WHERE name = ?
			ORDER BY id DESC
			LIMIT ?
			"#,
		)
		.bind(name)
		.bind(limit as i64)
		.fetch_all(&self.pool)
		.await?;

		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[instrument(skip(self), fields(admin_job_id = id))]
	async fn delete(&self, id: AdminJobId) -> Result<bool> {
		let result = sqlx::query("DELETE FROM admin_jobs WHERE id = ?")
			.bind(id)
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected() > 0)
	}

	#[instrument(skip(self), fields(admin_job_id = id))]
	async fn set_uuid(&self, id: AdminJobId, uuid: &str) -> Result<()> {
		let result = sqlx::query("UPDATE admin_jobs SET uuid = ?, update_time = ? WHERE id = ?")
			.bind(uuid)
			.bind(Utc::now().to_rfc3339())
			.bind(id)
			.execute(&self.pool)
			.await?;
		if result.rows_affected() == 0 {
			return Err(StoreError::NotFound(format!("admin job {id}")));
		}
		Ok(())
	}

	#[instrument(skip(self), fields(admin_job_id = id))]
	async fn set_status(&self, id: AdminJobId, status: &str) -> Result<()> {
		let result = sqlx::query("UPDATE admin_jobs SET status = ?, update_time = ? WHERE id = ?")
			.bind(status)
			.bind(Utc::now().to_rfc3339())
			.bind(id)
			.execute(&self.pool)
			.await?;
		if result.rows_affected() == 0 {
			return Err(StoreError::NotFound(format!("admin job {id}")));
		}
		Ok(())
	}
}

#[derive(FromRow)]
struct AdminJobRow {
	id: i64,
	uuid: Option<String>,
	name: String,
	kind: String,
	cron: String,
	status: String,
	creation_time: String,
	update_time: String,
}

impl TryFrom<AdminJobRow> for AdminJob {
	type Error = StoreError;

	fn try_from(row: AdminJobRow) -> Result<Self> {
		Ok(AdminJob {
			id: row.id,
			uuid: row.uuid,
			kind: JobKind::from_str(&row.kind).map_err(StoreError::Internal)?,
			name: row.name,
			cron: row.cron,
			status: row.status,
			creation_time: parse_time(&row.creation_time)?,
			update_time: parse_time(&row.update_time)?,
		})
	}
}

fn parse_time(value: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| StoreError::Internal(format!("Invalid timestamp {value}: {e}")))
}

#[cfg(test)]
mod tests {
	use super::*;

	async fn store() -> SqliteAdminJobStore {
		let pool = sqlx::sqlite::SqlitePoolOptions::new()
			.max_connections(1)
			.connect("sqlite::memory:")
			.await
			.unwrap();
		let store = SqliteAdminJobStore::new(pool);
		store.migrate().await.unwrap();
		store
	}

	fn periodic(name: &str) -> NewAdminJob {
		NewAdminJob {
			name: name.to_string(),
			kind: JobKind::Periodic,
			cron: r#"{"type":"Daily","cron":"0 0 2 * * *"}"#.to_string(),
		}
	}

	fn generic(name: &str) -> NewAdminJob {
		NewAdminJob {
			name: name.to_string(),
			kind: JobKind::Generic,
			cron: String::new(),
		}
	}

	#[tokio::test]
	async fn create_and_get_round_trip() {
		let store = store().await;
		let id = store.create(&periodic("scan-all")).await.unwrap();

		let job = store.get(id).await.unwrap().unwrap();
		assert_eq!(job.name, "scan-all");
		assert_eq!(job.kind, JobKind::Periodic);
		assert_eq!(job.status, INITIAL_STATUS);
		assert_eq!(job.uuid, None);
		assert!(store.get(id + 1).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn second_periodic_job_with_same_name_conflicts() {
		let store = store().await;
		store.create(&periodic("scan-all")).await.unwrap();

		let err = store.create(&periodic("scan-all")).await.unwrap_err();
		assert!(matches!(err, StoreError::Conflict(_)));

		store.create(&periodic("gc")).await.unwrap();
		store.create(&generic("scan-all")).await.unwrap();
		store.create(&generic("scan-all")).await.unwrap();
	}

	#[tokio::test]
	async fn periodic_name_is_free_again_after_delete() {
		let store = store().await;
		let id = store.create(&periodic("scan-all")).await.unwrap();
		assert!(store.delete(id).await.unwrap());
		assert!(!store.delete(id).await.unwrap());
		store.create(&periodic("scan-all")).await.unwrap();
	}

	#[tokio::test]
	async fn list_filters_by_name_and_kind() {
		let store = store().await;
		store.create(&periodic("scan-all")).await.unwrap();
		store.create(&generic("scan-all")).await.unwrap();
		store.create(&generic("gc")).await.unwrap();

		let periodic_jobs = store.list(&AdminJobQuery::periodic("scan-all")).await.unwrap();
		assert_eq!(periodic_jobs.len(), 1);
		assert_eq!(periodic_jobs[0].kind, JobKind::Periodic);

		let all = store.list(&AdminJobQuery::default()).await.unwrap();
		assert_eq!(all.len(), 3);
		assert!(all[0].id > all[1].id);
	}

	#[tokio::test]
	async fn list_recent_is_bounded_and_newest_first() {
		let store = store().await;
		for _ in 0..12 {
			store.create(&generic("gc")).await.unwrap();
		}
		store.create(&generic("other")).await.unwrap();

		let recent = store.list_recent("gc", 10).await.unwrap();
		assert_eq!(recent.len(), 10);
		assert!(recent.windows(2).all(|w| w[0].id > w[1].id));
		assert!(recent.iter().all(|j| j.name == "gc"));
	}

	#[tokio::test]
	async fn set_uuid_and_status() {
		let store = store().await;
		let id = store.create(&generic("gc")).await.unwrap();

		store.set_uuid(id, "runner-1").await.unwrap();
		store.set_status(id, "Running").await.unwrap();

		let job = store.get(id).await.unwrap().unwrap();
		assert_eq!(job.uuid.as_deref(), Some("runner-1"));
		assert_eq!(job.status, "Running");
		assert!(job.update_time >= job.creation_time);

		assert!(matches!(
			store.set_status(id + 100, "Error").await,
			Err(StoreError::NotFound(_))
		));
	}
}
