//! Hierarchy readers backing the access control service.
//!
//! The service depends on the narrow [`HierarchyReader`] trait rather
//! than on a connection type, so the core algorithm is testable without
//! a live database. Two implementations are provided: a PostgreSQL
//! reader delegating to the soulkun-db models, and an in-memory fake
//! for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::RwLock;

use soulkun_core::{DepartmentId, OrganizationId, RoleLevel, UserId};
use soulkun_db::models::{Department, DepartmentHierarchyRow, UserDepartment};

use crate::error::AccessError;

/// Read-only view of the organizational hierarchy.
///
/// Every method is scoped to one organization; implementations must bind
/// the organization on every underlying query.
#[async_trait::async_trait]
pub trait HierarchyReader: Send + Sync {
    /// The maximum role level across the user's active assignments, if
    /// any assignment carries a resolvable role.
    async fn max_role_level(
        &self,
        organization_id: OrganizationId,
        user_id: UserId,
    ) -> Result<Option<RoleLevel>, AccessError>;

    /// Department IDs of the user's active assignments.
    async fn member_department_ids(
        &self,
        organization_id: OrganizationId,
        user_id: UserId,
    ) -> Result<Vec<DepartmentId>, AccessError>;

    /// IDs of every active department in the organization.
    async fn all_active_department_ids(
        &self,
        organization_id: OrganizationId,
    ) -> Result<HashSet<DepartmentId>, AccessError>;

    /// IDs of all active descendants of a department (closure depth >= 1).
    async fn descendant_ids(
        &self,
        organization_id: OrganizationId,
        department_id: DepartmentId,
    ) -> Result<Vec<DepartmentId>, AccessError>;

    /// IDs of active direct children of a department (closure depth 1).
    async fn child_ids(
        &self,
        organization_id: OrganizationId,
        department_id: DepartmentId,
    ) -> Result<Vec<DepartmentId>, AccessError>;
}

/// PostgreSQL-backed hierarchy reader.
#[derive(Debug, Clone)]
pub struct PgHierarchyReader {
    pool: PgPool,
}

impl PgHierarchyReader {
    /// Create a reader over the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl HierarchyReader for PgHierarchyReader {
    async fn max_role_level(
        &self,
        organization_id: OrganizationId,
        user_id: UserId,
    ) -> Result<Option<RoleLevel>, AccessError> {
        let level = UserDepartment::max_role_level(
            &self.pool,
            organization_id.into_uuid(),
            user_id.into_uuid(),
        )
        .await?;
        Ok(level.map(RoleLevel::new))
    }

    async fn member_department_ids(
        &self,
        organization_id: OrganizationId,
        user_id: UserId,
    ) -> Result<Vec<DepartmentId>, AccessError> {
        let ids = UserDepartment::active_department_ids(
            &self.pool,
            organization_id.into_uuid(),
            user_id.into_uuid(),
        )
        .await?;
        Ok(ids.into_iter().map(DepartmentId::from_uuid).collect())
    }

    async fn all_active_department_ids(
        &self,
        organization_id: OrganizationId,
    ) -> Result<HashSet<DepartmentId>, AccessError> {
        let ids = Department::list_active_ids(&self.pool, organization_id.into_uuid()).await?;
        Ok(ids.into_iter().map(DepartmentId::from_uuid).collect())
    }

    async fn descendant_ids(
        &self,
        organization_id: OrganizationId,
        department_id: DepartmentId,
    ) -> Result<Vec<DepartmentId>, AccessError> {
        let ids = DepartmentHierarchyRow::descendant_ids(
            &self.pool,
            organization_id.into_uuid(),
            department_id.into_uuid(),
        )
        .await?;
        Ok(ids.into_iter().map(DepartmentId::from_uuid).collect())
    }

    async fn child_ids(
        &self,
        organization_id: OrganizationId,
        department_id: DepartmentId,
    ) -> Result<Vec<DepartmentId>, AccessError> {
        let ids = DepartmentHierarchyRow::child_ids(
            &self.pool,
            organization_id.into_uuid(),
            department_id.into_uuid(),
        )
        .await?;
        Ok(ids.into_iter().map(DepartmentId::from_uuid).collect())
    }
}

#[derive(Debug, Clone)]
struct FakeDepartment {
    parent: Option<DepartmentId>,
    active: bool,
}

#[derive(Debug, Default)]
struct FakeOrg {
    departments: HashMap<DepartmentId, FakeDepartment>,
    // user -> (department, role level carried by that assignment)
    memberships: HashMap<UserId, Vec<(DepartmentId, Option<RoleLevel>)>>,
    // levels granted outside any department assignment
    unattached_levels: HashMap<UserId, RoleLevel>,
}

/// In-memory hierarchy for tests.
///
/// Holds plain parent pointers and derives descendant/child queries by
/// walking them, so tests exercise the service algorithm without a
/// database or a materialized closure table.
#[derive(Debug, Default, Clone)]
pub struct InMemoryHierarchy {
    orgs: Arc<RwLock<HashMap<OrganizationId, FakeOrg>>>,
}

impl InMemoryHierarchy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a department to an organization.
    pub async fn add_department(
        &self,
        organization_id: OrganizationId,
        department_id: DepartmentId,
        parent: Option<DepartmentId>,
        active: bool,
    ) {
        let mut orgs = self.orgs.write().await;
        orgs.entry(organization_id).or_default().departments.insert(
            department_id,
            FakeDepartment { parent, active },
        );
    }

    /// Assign a user to a department, optionally with a role level.
    pub async fn assign(
        &self,
        organization_id: OrganizationId,
        user_id: UserId,
        department_id: DepartmentId,
        level: Option<RoleLevel>,
    ) {
        let mut orgs = self.orgs.write().await;
        orgs.entry(organization_id)
            .or_default()
            .memberships
            .entry(user_id)
            .or_default()
            .push((department_id, level));
    }

    /// Give a user a role level without any department membership
    /// (models roles resolved through non-department means, e.g. an
    /// executive with no assignment of their own).
    pub async fn assign_unattached_level(
        &self,
        organization_id: OrganizationId,
        user_id: UserId,
        level: RoleLevel,
    ) {
        let mut orgs = self.orgs.write().await;
        orgs.entry(organization_id)
            .or_default()
            .unattached_levels
            .insert(user_id, level);
    }
}

#[async_trait::async_trait]
impl HierarchyReader for InMemoryHierarchy {
    async fn max_role_level(
        &self,
        organization_id: OrganizationId,
        user_id: UserId,
    ) -> Result<Option<RoleLevel>, AccessError> {
        let orgs = self.orgs.read().await;
        Ok(orgs.get(&organization_id).and_then(|org| {
            let attached = org
                .memberships
                .get(&user_id)
                .and_then(|assignments| assignments.iter().filter_map(|(_, l)| *l).max());
            let unattached = org.unattached_levels.get(&user_id).copied();
            attached.max(unattached)
        }))
    }

    async fn member_department_ids(
        &self,
        organization_id: OrganizationId,
        user_id: UserId,
    ) -> Result<Vec<DepartmentId>, AccessError> {
        let orgs = self.orgs.read().await;
        Ok(orgs
            .get(&organization_id)
            .and_then(|org| org.memberships.get(&user_id))
            .map(|assignments| assignments.iter().map(|(d, _)| *d).collect())
            .unwrap_or_default())
    }

    async fn all_active_department_ids(
        &self,
        organization_id: OrganizationId,
    ) -> Result<HashSet<DepartmentId>, AccessError> {
        let orgs = self.orgs.read().await;
        Ok(orgs
            .get(&organization_id)
            .map(|org| {
                org.departments
                    .iter()
                    .filter(|(_, d)| d.active)
                    .map(|(id, _)| *id)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn descendant_ids(
        &self,
        organization_id: OrganizationId,
        department_id: DepartmentId,
    ) -> Result<Vec<DepartmentId>, AccessError> {
        let orgs = self.orgs.read().await;
        let Some(org) = orgs.get(&organization_id) else {
            return Ok(Vec::new());
        };
        let mut result = Vec::new();
        for (&id, dept) in &org.departments {
            if !dept.active || id == department_id {
                continue;
            }
            // Walk the parent chain up looking for the ancestor.
            let mut cursor = dept.parent;
            let mut hops = 0usize;
            while let Some(parent) = cursor {
                if parent == department_id {
                    result.push(id);
                    break;
                }
                hops += 1;
                if hops > org.departments.len() {
                    break;
                }
                cursor = org.departments.get(&parent).and_then(|d| d.parent);
            }
        }
        Ok(result)
    }

    async fn child_ids(
        &self,
        organization_id: OrganizationId,
        department_id: DepartmentId,
    ) -> Result<Vec<DepartmentId>, AccessError> {
        let orgs = self.orgs.read().await;
        Ok(orgs
            .get(&organization_id)
            .map(|org| {
                org.departments
                    .iter()
                    .filter(|(_, d)| d.active && d.parent == Some(department_id))
                    .map(|(id, _)| *id)
                    .collect()
            })
            .unwrap_or_default())
    }
}
