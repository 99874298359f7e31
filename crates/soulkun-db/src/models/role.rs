//! Role entity model.
//!
//! Per-organization named roles with an integer level in [1, 6]. The
//! level semantics are fixed by convention; see
//! `soulkun_core::RoleLevel`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use soulkun_core::RoleLevel;

/// A role record.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Role {
    /// Unique identifier.
    pub id: Uuid,

    /// The organization this role belongs to.
    pub organization_id: Uuid,

    /// Role name, unique per organization. The upsert key for syncs.
    pub name: String,

    /// Visibility level in [1, 6].
    pub level: i16,

    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// The level as a typed `RoleLevel`.
    #[must_use]
    pub fn role_level(&self) -> RoleLevel {
        RoleLevel::new(self.level)
    }

    /// Find a role by name within an organization.
    pub async fn find_by_name(
        pool: &PgPool,
        organization_id: Uuid,
        name: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM roles
            WHERE organization_id = $1 AND name = $2
            ",
        )
        .bind(organization_id)
        .bind(name)
        .fetch_optional(pool)
        .await
    }

    /// List all roles in an organization, highest level first.
    pub async fn list_all(
        pool: &PgPool,
        organization_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM roles
            WHERE organization_id = $1
            ORDER BY level DESC, name
            ",
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_level_conversion() {
        let role = Role {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            name: "manager".to_string(),
            level: 4,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(role.role_level(), RoleLevel::MANAGER);
    }
}
