//! User-department assignment model.
//!
//! Join entity between users and departments. A user may hold several
//! concurrent assignments; `ended_at IS NULL` marks an active one.
//! Assignments are ended, never hard-deleted, to keep an audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// A user-department assignment record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserDepartment {
    /// Unique identifier.
    pub id: Uuid,

    /// The organization this assignment belongs to.
    pub organization_id: Uuid,

    /// The assigned user.
    pub user_id: Uuid,

    /// The department the user is assigned to.
    pub department_id: Uuid,

    /// The role held in this department, if resolved.
    pub role_id: Option<Uuid>,

    /// Whether this is the user's primary assignment.
    pub is_primary: bool,

    /// Free-text role description within the department.
    pub role_in_dept: Option<String>,

    /// When the assignment became effective.
    pub started_at: DateTime<Utc>,

    /// When the assignment ended; NULL while active.
    pub ended_at: Option<DateTime<Utc>>,

    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl UserDepartment {
    /// Whether the assignment is currently active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.ended_at.is_none()
    }

    /// List a user's active assignments.
    pub async fn active_for_user(
        pool: &PgPool,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM user_departments
            WHERE organization_id = $1 AND user_id = $2 AND ended_at IS NULL
            ORDER BY is_primary DESC, started_at
            ",
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// List the department IDs of a user's active assignments.
    pub async fn active_department_ids(
        pool: &PgPool,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r"
            SELECT department_id FROM user_departments
            WHERE organization_id = $1 AND user_id = $2 AND ended_at IS NULL
            ",
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// The maximum role level across a user's active assignments, if any
    /// assignment carries a resolvable role.
    pub async fn max_role_level(
        pool: &PgPool,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<i16>, sqlx::Error> {
        let (level,): (Option<i16>,) = sqlx::query_as(
            r"
            SELECT MAX(r.level)
            FROM user_departments ud
            JOIN roles r
              ON r.id = ud.role_id
             AND r.organization_id = ud.organization_id
            WHERE ud.organization_id = $1
              AND ud.user_id = $2
              AND ud.ended_at IS NULL
            ",
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(level)
    }

    /// List active assignments for a department.
    pub async fn active_for_department(
        pool: &PgPool,
        organization_id: Uuid,
        department_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM user_departments
            WHERE organization_id = $1 AND department_id = $2 AND ended_at IS NULL
            ORDER BY started_at
            ",
        )
        .bind(organization_id)
        .bind(department_id)
        .fetch_all(pool)
        .await
    }
}
