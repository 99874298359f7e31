//! Organization entity model.
//!
//! The organization is the tenant root: it owns all departments, roles,
//! and assignments, and deleting it cascades.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use soulkun_core::OrganizationId;

/// An organization (tenant) record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Organization {
    /// Unique identifier.
    pub id: Uuid,

    /// Display name.
    pub name: String,

    /// Unique short code, if assigned.
    pub code: Option<String>,

    /// Subscription plan identifier.
    pub plan: String,

    /// Whether the organization is active.
    pub is_active: bool,

    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganization {
    pub name: String,
    pub code: Option<String>,
    pub plan: Option<String>,
}

impl Organization {
    /// Get the organization ID as a typed `OrganizationId`.
    #[must_use]
    pub fn organization_id(&self) -> OrganizationId {
        OrganizationId::from_uuid(self.id)
    }

    /// Create a new organization.
    pub async fn create(pool: &PgPool, data: CreateOrganization) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            INSERT INTO organizations (name, code, plan)
            VALUES ($1, $2, COALESCE($3, 'standard'))
            RETURNING *
            ",
        )
        .bind(&data.name)
        .bind(&data.code)
        .bind(&data.plan)
        .fetch_one(pool)
        .await
    }

    /// Find an organization by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM organizations WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Find an organization by its unique code.
    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM organizations WHERE code = $1
            ",
        )
        .bind(code)
        .fetch_optional(pool)
        .await
    }

    /// Deactivate an organization. Returns whether a row was updated.
    pub async fn deactivate(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r"
            UPDATE organizations SET is_active = FALSE, updated_at = now() WHERE id = $1
            ",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
