//! Department entity model.
//!
//! Departments form a tree scoped to one organization. The parent pointer
//! is the source of truth for the tree shape; `level` and `path` are
//! maintained by the sync process and must stay consistent with the
//! parent chain. Departments removed from an upstream org chart are
//! soft-deactivated, never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use soulkun_core::{DepartmentId, OrganizationId, OrganizationScoped};

/// A department record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Department {
    /// Unique identifier.
    pub id: Uuid,

    /// The organization this department belongs to.
    pub organization_id: Uuid,

    /// Display name.
    pub name: String,

    /// Stable code, unique per organization. The upsert key for syncs.
    pub code: String,

    /// Parent department, NULL for roots.
    pub parent_department_id: Option<Uuid>,

    /// Depth in the tree; roots are level 1.
    pub level: i32,

    /// Materialized path of slash-joined codes, e.g. `/sales/sales-east`.
    pub path: String,

    /// Ordering hint for display.
    pub display_order: i32,

    /// Whether the department is active. Inactive departments are
    /// excluded from visibility computations but kept for history.
    pub is_active: bool,

    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl OrganizationScoped for Department {
    fn organization_id(&self) -> OrganizationId {
        OrganizationId::from_uuid(self.organization_id)
    }
}

impl Department {
    /// Get the department ID as a typed `DepartmentId`.
    #[must_use]
    pub fn department_id(&self) -> DepartmentId {
        DepartmentId::from_uuid(self.id)
    }

    /// Find a department by ID within an organization.
    pub async fn find_by_id(
        pool: &PgPool,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM departments
            WHERE organization_id = $1 AND id = $2
            ",
        )
        .bind(organization_id)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Find a department by its stable code within an organization.
    pub async fn find_by_code(
        pool: &PgPool,
        organization_id: Uuid,
        code: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM departments
            WHERE organization_id = $1 AND code = $2
            ",
        )
        .bind(organization_id)
        .bind(code)
        .fetch_optional(pool)
        .await
    }

    /// List all departments in an organization, active or not.
    pub async fn list_all(
        pool: &PgPool,
        organization_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM departments
            WHERE organization_id = $1
            ORDER BY path, display_order
            ",
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await
    }

    /// List active departments in an organization.
    pub async fn list_active(
        pool: &PgPool,
        organization_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM departments
            WHERE organization_id = $1 AND is_active
            ORDER BY path, display_order
            ",
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await
    }

    /// List the IDs of all active departments in an organization.
    ///
    /// This is the short-circuit source for level >= 5 visibility.
    pub async fn list_active_ids(
        pool: &PgPool,
        organization_id: Uuid,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r"
            SELECT id FROM departments
            WHERE organization_id = $1 AND is_active
            ",
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// List active departments whose materialized path starts with the
    /// given prefix (subtree query without touching the closure table).
    pub async fn list_by_path_prefix(
        pool: &PgPool,
        organization_id: Uuid,
        prefix: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM departments
            WHERE organization_id = $1 AND is_active AND path LIKE $2 || '%'
            ORDER BY path
            ",
        )
        .bind(organization_id)
        .bind(prefix)
        .fetch_all(pool)
        .await
    }
}
