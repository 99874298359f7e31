//! Department hierarchy (closure table) model.
//!
//! One row per (ancestor, descendant) pair reachable through the parent
//! chain, including self pairs at depth 0. This table exists purely to
//! make "all descendants of D" and "all ancestors of D" single-scan
//! queries instead of recursive walks. It is a derived cache owned by the
//! sync process; the department parent pointers remain the source of
//! truth.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// A closure-table row.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct DepartmentHierarchyRow {
    /// The organization this row belongs to.
    pub organization_id: Uuid,

    /// The ancestor department.
    pub ancestor_department_id: Uuid,

    /// The descendant department.
    pub descendant_department_id: Uuid,

    /// Parent-chain distance; 0 for self pairs.
    pub depth: i32,
}

impl DepartmentHierarchyRow {
    /// List the IDs of all active descendants of a department (depth >= 1).
    ///
    /// This backs the level-4 "all descendants" visibility tier.
    pub async fn descendant_ids(
        pool: &PgPool,
        organization_id: Uuid,
        department_id: Uuid,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r"
            SELECT h.descendant_department_id
            FROM department_hierarchy h
            JOIN departments d
              ON d.id = h.descendant_department_id
             AND d.organization_id = h.organization_id
            WHERE h.organization_id = $1
              AND h.ancestor_department_id = $2
              AND h.depth >= 1
              AND d.is_active
            ",
        )
        .bind(organization_id)
        .bind(department_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// List the IDs of active direct children of a department (depth = 1).
    ///
    /// This backs the level-3 "direct children" visibility tier.
    pub async fn child_ids(
        pool: &PgPool,
        organization_id: Uuid,
        department_id: Uuid,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r"
            SELECT h.descendant_department_id
            FROM department_hierarchy h
            JOIN departments d
              ON d.id = h.descendant_department_id
             AND d.organization_id = h.organization_id
            WHERE h.organization_id = $1
              AND h.ancestor_department_id = $2
              AND h.depth = 1
              AND d.is_active
            ",
        )
        .bind(organization_id)
        .bind(department_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// List all ancestors of a department as (ancestor ID, depth) pairs,
    /// nearest first, excluding the self pair.
    pub async fn ancestors_of(
        pool: &PgPool,
        organization_id: Uuid,
        department_id: Uuid,
    ) -> Result<Vec<(Uuid, i32)>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT ancestor_department_id, depth
            FROM department_hierarchy
            WHERE organization_id = $1
              AND descendant_department_id = $2
              AND depth >= 1
            ORDER BY depth
            ",
        )
        .bind(organization_id)
        .bind(department_id)
        .fetch_all(pool)
        .await
    }

    /// List all closure rows for an organization.
    pub async fn list_all(
        pool: &PgPool,
        organization_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            SELECT * FROM department_hierarchy
            WHERE organization_id = $1
            ORDER BY ancestor_department_id, depth, descendant_department_id
            ",
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await
    }

    /// Count closure rows for an organization.
    pub async fn count(pool: &PgPool, organization_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r"
            SELECT COUNT(*) FROM department_hierarchy WHERE organization_id = $1
            ",
        )
        .bind(organization_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }
}
