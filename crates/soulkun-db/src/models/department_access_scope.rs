//! Department access scope model.
//!
//! One-to-one with a department: fine-grained exceptions to the default
//! role-level visibility rules. The role-level algorithm is authoritative;
//! these overrides are an additive extension layer consulted by future
//! policy work, not by the default accessible-set computation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Per-department visibility overrides.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DepartmentAccessScope {
    /// The department this scope belongs to (1:1).
    pub department_id: Uuid,

    /// The organization this scope belongs to.
    pub organization_id: Uuid,

    /// Whether members may view child departments.
    pub can_view_child_departments: bool,

    /// Whether members may view sibling departments.
    pub can_view_sibling_departments: bool,

    /// Whether members may view parent departments.
    pub can_view_parent_departments: bool,

    /// Maximum descendant depth visible, if limited.
    pub max_depth: Option<i32>,

    /// Override for confidential-classified resources.
    pub override_confidential_access: bool,

    /// Override for restricted-classified resources.
    pub override_restricted_access: bool,

    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl DepartmentAccessScope {
    /// Find the scope row for a department.
    pub async fn find_by_department(
        pool: &PgPool,
        organization_id: Uuid,
        department_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM department_access_scopes
            WHERE organization_id = $1 AND department_id = $2
            ",
        )
        .bind(organization_id)
        .bind(department_id)
        .fetch_optional(pool)
        .await
    }

    /// List all scope rows for an organization.
    pub async fn list_all(
        pool: &PgPool,
        organization_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM department_access_scopes
            WHERE organization_id = $1
            ",
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await
    }

    /// Upsert a scope row, keeping defaults for unspecified fields on insert.
    pub async fn upsert(
        pool: &PgPool,
        organization_id: Uuid,
        department_id: Uuid,
        can_view_child_departments: bool,
        can_view_sibling_departments: bool,
        can_view_parent_departments: bool,
        max_depth: Option<i32>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            INSERT INTO department_access_scopes (
                department_id, organization_id,
                can_view_child_departments, can_view_sibling_departments,
                can_view_parent_departments, max_depth
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (department_id) DO UPDATE SET
                can_view_child_departments = EXCLUDED.can_view_child_departments,
                can_view_sibling_departments = EXCLUDED.can_view_sibling_departments,
                can_view_parent_departments = EXCLUDED.can_view_parent_departments,
                max_depth = EXCLUDED.max_depth,
                updated_at = now()
            RETURNING *
            ",
        )
        .bind(department_id)
        .bind(organization_id)
        .bind(can_view_child_departments)
        .bind(can_view_sibling_departments)
        .bind(can_view_parent_departments)
        .bind(max_depth)
        .fetch_one(pool)
        .await
    }
}
