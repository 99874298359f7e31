//! Org-chart sync run log model.
//!
//! Append-only audit record of each sync run. A row is created when the
//! run starts and finalized exactly once with counts and status; it is
//! never mutated afterward.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Lifecycle state of a sync run.
///
/// `pending -> in_progress -> {success | failed}`. A run that crashes
/// mid-transaction stays `in_progress`; callers must treat stale
/// `in_progress` rows beyond a timeout threshold as failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "sync_run_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SyncRunStatus {
    Pending,
    InProgress,
    Success,
    Failed,
}

/// Counters finalized into a sync log row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCounts {
    pub departments_added: i32,
    pub departments_updated: i32,
    pub departments_deactivated: i32,
    pub assignments_added: i32,
    pub assignments_updated: i32,
    pub assignments_ended: i32,
}

impl SyncCounts {
    /// Whether the run changed nothing (the idempotent re-run case).
    #[must_use]
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

/// An org-chart sync run record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrgChartSyncLog {
    /// Unique run identifier.
    pub id: Uuid,

    /// The organization this run synchronized.
    pub organization_id: Uuid,

    /// Lifecycle state.
    pub status: SyncRunStatus,

    /// Departments created by this run.
    pub departments_added: i32,

    /// Departments whose attributes changed.
    pub departments_updated: i32,

    /// Departments soft-deactivated (absent from a full payload).
    pub departments_deactivated: i32,

    /// Assignments created.
    pub assignments_added: i32,

    /// Assignments whose attributes changed.
    pub assignments_updated: i32,

    /// Assignments ended (absent from a full payload).
    pub assignments_ended: i32,

    /// Human-readable failure summary (for failed runs).
    pub error_message: Option<String>,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run finished.
    pub completed_at: Option<DateTime<Utc>>,

    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl OrgChartSyncLog {
    /// Create a new `in_progress` run row.
    ///
    /// Written outside the sync transaction so a crashed run still leaves
    /// an inspectable record behind.
    pub async fn start(pool: &PgPool, organization_id: Uuid) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            INSERT INTO org_chart_sync_logs (organization_id, status)
            VALUES ($1, 'in_progress')
            RETURNING *
            ",
        )
        .bind(organization_id)
        .fetch_one(pool)
        .await
    }

    /// Finalize a run as successful with its counters.
    pub async fn finish_success(
        pool: &PgPool,
        organization_id: Uuid,
        id: Uuid,
        counts: SyncCounts,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            UPDATE org_chart_sync_logs SET
                status = 'success',
                departments_added = $3,
                departments_updated = $4,
                departments_deactivated = $5,
                assignments_added = $6,
                assignments_updated = $7,
                assignments_ended = $8,
                completed_at = now()
            WHERE organization_id = $1 AND id = $2
            RETURNING *
            ",
        )
        .bind(organization_id)
        .bind(id)
        .bind(counts.departments_added)
        .bind(counts.departments_updated)
        .bind(counts.departments_deactivated)
        .bind(counts.assignments_added)
        .bind(counts.assignments_updated)
        .bind(counts.assignments_ended)
        .fetch_one(pool)
        .await
    }

    /// Finalize a run as failed with a human-readable error summary.
    pub async fn finish_failed(
        pool: &PgPool,
        organization_id: Uuid,
        id: Uuid,
        error_message: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            UPDATE org_chart_sync_logs SET
                status = 'failed',
                error_message = $3,
                completed_at = now()
            WHERE organization_id = $1 AND id = $2
            RETURNING *
            ",
        )
        .bind(organization_id)
        .bind(id)
        .bind(error_message)
        .fetch_one(pool)
        .await
    }

    /// Find a run by ID within an organization.
    pub async fn find_by_id(
        pool: &PgPool,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM org_chart_sync_logs
            WHERE organization_id = $1 AND id = $2
            ",
        )
        .bind(organization_id)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// The most recent run for an organization, if any.
    pub async fn find_latest(
        pool: &PgPool,
        organization_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM org_chart_sync_logs
            WHERE organization_id = $1
            ORDER BY started_at DESC
            LIMIT 1
            ",
        )
        .bind(organization_id)
        .fetch_optional(pool)
        .await
    }

    /// List runs by status, most recent first.
    pub async fn list_by_status(
        pool: &PgPool,
        organization_id: Uuid,
        status: SyncRunStatus,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM org_chart_sync_logs
            WHERE organization_id = $1 AND status = $2
            ORDER BY started_at DESC
            LIMIT $3
            ",
        )
        .bind(organization_id)
        .bind(status)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Find `in_progress` runs older than the given threshold.
    ///
    /// A crashed sync leaves its log row `in_progress`; operators treat
    /// rows beyond the threshold as failed.
    pub async fn find_stale_in_progress(
        pool: &PgPool,
        organization_id: Uuid,
        older_than: Duration,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let cutoff = Utc::now() - older_than;
        sqlx::query_as(
            r"
            SELECT * FROM org_chart_sync_logs
            WHERE organization_id = $1
              AND status = 'in_progress'
              AND started_at < $2
            ORDER BY started_at
            ",
        )
        .bind(organization_id)
        .bind(cutoff)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_noop() {
        assert!(SyncCounts::default().is_noop());
        let counts = SyncCounts {
            departments_added: 1,
            ..SyncCounts::default()
        };
        assert!(!counts.is_noop());
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&SyncRunStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let back: SyncRunStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(back, SyncRunStatus::Failed);
    }
}
