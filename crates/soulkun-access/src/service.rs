//! The access control service.
//!
//! Computes the set of department IDs a user may view, and answers point
//! queries against that set. Read-only; missing data degrades to
//! fail-closed defaults, store failures propagate.

use std::collections::HashSet;

use soulkun_core::{DepartmentId, OrganizationId, RoleLevel, UserId};

use crate::error::AccessError;
use crate::reader::HierarchyReader;

/// Answers "what can this user see" and "can this user see that".
///
/// Visibility is a pure function of `(user_id, organization_id)` plus the
/// persisted hierarchy:
///
/// - level >= 5 sees every active department in the organization;
/// - level 4 sees its own departments plus all descendants;
/// - level 3 sees its own departments plus direct children;
/// - level <= 2 sees only its own departments;
/// - a user with no active membership below level 5 sees nothing.
#[derive(Debug, Clone)]
pub struct AccessControlService<R> {
    reader: R,
}

impl<R: HierarchyReader> AccessControlService<R> {
    /// Create a service over the given hierarchy reader.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Resolve the user's effective role level.
    ///
    /// Returns the maximum level across the user's active department
    /// assignments. Never fails for "user not found"; degrades to the
    /// general-staff default when nothing resolves.
    pub async fn get_user_role_level(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
    ) -> Result<RoleLevel, AccessError> {
        let level = self
            .reader
            .max_role_level(organization_id, user_id)
            .await?
            .unwrap_or_default();
        Ok(level)
    }

    /// Compute the set of department IDs the user may view.
    ///
    /// No guaranteed ordering; callers must not depend on iteration order.
    pub async fn compute_accessible_departments(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
    ) -> Result<HashSet<DepartmentId>, AccessError> {
        let level = self.get_user_role_level(user_id, organization_id).await?;

        // Full-visibility tier short-circuits membership resolution.
        if level.is_organization_wide() {
            return self.reader.all_active_department_ids(organization_id).await;
        }

        let owned = self
            .reader
            .member_department_ids(organization_id, user_id)
            .await?;

        // Fail-closed: an authenticated member with no department
        // assignment sees nothing.
        if owned.is_empty() {
            tracing::debug!(
                user_id = %user_id,
                organization_id = %organization_id,
                "User has no active department membership; returning empty set"
            );
            return Ok(HashSet::new());
        }

        let mut accessible: HashSet<DepartmentId> = HashSet::new();
        for department_id in owned {
            accessible.insert(department_id);
            match level.as_i16() {
                4 => {
                    let descendants = self
                        .reader
                        .descendant_ids(organization_id, department_id)
                        .await?;
                    accessible.extend(descendants);
                }
                3 => {
                    let children = self
                        .reader
                        .child_ids(organization_id, department_id)
                        .await?;
                    accessible.extend(children);
                }
                _ => {}
            }
        }

        Ok(accessible)
    }

    /// Check whether the user may view a single department.
    ///
    /// Callers checking many resources should call
    /// [`Self::compute_accessible_departments`] once and test membership
    /// against the returned set instead.
    pub async fn can_access_department(
        &self,
        user_id: UserId,
        department_id: DepartmentId,
        organization_id: OrganizationId,
    ) -> Result<bool, AccessError> {
        let accessible = self
            .compute_accessible_departments(user_id, organization_id)
            .await?;
        Ok(accessible.contains(&department_id))
    }

    /// Check whether the user may view a task.
    ///
    /// Tasks with no department classification are visible to everyone in
    /// the tenant (backward-compatibility policy for legacy records).
    pub async fn can_access_task(
        &self,
        user_id: UserId,
        task_department_id: Option<DepartmentId>,
        organization_id: OrganizationId,
    ) -> Result<bool, AccessError> {
        match task_department_id {
            None => Ok(true),
            Some(department_id) => {
                self.can_access_department(user_id, department_id, organization_id)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::InMemoryHierarchy;

    struct Tree {
        org: OrganizationId,
        hierarchy: InMemoryHierarchy,
        sales: DepartmentId,
        sales_east: DepartmentId,
        sales_east_north: DepartmentId,
        engineering: DepartmentId,
    }

    /// Sales -> SalesEast -> SalesEastNorth, plus a sibling root Engineering.
    async fn build_tree() -> Tree {
        let org = OrganizationId::new();
        let hierarchy = InMemoryHierarchy::new();
        let sales = DepartmentId::new();
        let sales_east = DepartmentId::new();
        let sales_east_north = DepartmentId::new();
        let engineering = DepartmentId::new();

        hierarchy.add_department(org, sales, None, true).await;
        hierarchy
            .add_department(org, sales_east, Some(sales), true)
            .await;
        hierarchy
            .add_department(org, sales_east_north, Some(sales_east), true)
            .await;
        hierarchy.add_department(org, engineering, None, true).await;

        Tree {
            org,
            hierarchy,
            sales,
            sales_east,
            sales_east_north,
            engineering,
        }
    }

    #[tokio::test]
    async fn level_3_sees_direct_children_only() {
        let t = build_tree().await;
        let user = UserId::new();
        t.hierarchy
            .assign(t.org, user, t.sales, Some(RoleLevel::TEAM_LEAD))
            .await;

        let service = AccessControlService::new(t.hierarchy.clone());
        let visible = service
            .compute_accessible_departments(user, t.org)
            .await
            .unwrap();

        let expected: HashSet<_> = [t.sales, t.sales_east].into_iter().collect();
        assert_eq!(visible, expected, "one level deep, grandchild excluded");
    }

    #[tokio::test]
    async fn level_4_sees_all_descendants() {
        let t = build_tree().await;
        let user = UserId::new();
        t.hierarchy
            .assign(t.org, user, t.sales, Some(RoleLevel::MANAGER))
            .await;

        let service = AccessControlService::new(t.hierarchy.clone());
        let visible = service
            .compute_accessible_departments(user, t.org)
            .await
            .unwrap();

        let expected: HashSet<_> = [t.sales, t.sales_east, t.sales_east_north]
            .into_iter()
            .collect();
        assert_eq!(visible, expected);
        assert!(!visible.contains(&t.engineering));
    }

    #[tokio::test]
    async fn level_2_sees_own_department_only() {
        let t = build_tree().await;
        let user = UserId::new();
        t.hierarchy
            .assign(t.org, user, t.sales, Some(RoleLevel::GENERAL_STAFF))
            .await;

        let service = AccessControlService::new(t.hierarchy.clone());
        let visible = service
            .compute_accessible_departments(user, t.org)
            .await
            .unwrap();

        let expected: HashSet<_> = [t.sales].into_iter().collect();
        assert_eq!(visible, expected);
    }

    #[tokio::test]
    async fn level_6_sees_everything_without_membership() {
        let t = build_tree().await;
        let user = UserId::new();
        t.hierarchy
            .assign_unattached_level(t.org, user, RoleLevel::EXECUTIVE)
            .await;

        let service = AccessControlService::new(t.hierarchy.clone());
        let visible = service
            .compute_accessible_departments(user, t.org)
            .await
            .unwrap();

        let expected: HashSet<_> = [t.sales, t.sales_east, t.sales_east_north, t.engineering]
            .into_iter()
            .collect();
        assert_eq!(visible, expected);
    }

    #[tokio::test]
    async fn level_5_sees_everything_regardless_of_own_memberships() {
        let t = build_tree().await;
        let user = UserId::new();
        t.hierarchy
            .assign(t.org, user, t.engineering, Some(RoleLevel::ADMIN))
            .await;

        let service = AccessControlService::new(t.hierarchy.clone());
        let visible = service
            .compute_accessible_departments(user, t.org)
            .await
            .unwrap();

        assert!(visible.contains(&t.sales_east_north));
        assert_eq!(visible.len(), 4);
    }

    #[tokio::test]
    async fn memberless_user_below_level_5_sees_nothing() {
        let t = build_tree().await;
        let user = UserId::new();
        // Role level 4, but no department membership: fail-closed.
        t.hierarchy
            .assign_unattached_level(t.org, user, RoleLevel::MANAGER)
            .await;

        let service = AccessControlService::new(t.hierarchy.clone());
        let visible = service
            .compute_accessible_departments(user, t.org)
            .await
            .unwrap();

        assert!(visible.is_empty());
    }

    #[tokio::test]
    async fn unknown_user_defaults_to_general_staff_and_empty_set() {
        let t = build_tree().await;
        let user = UserId::new();

        let service = AccessControlService::new(t.hierarchy.clone());
        let level = service.get_user_role_level(user, t.org).await.unwrap();
        assert_eq!(level, RoleLevel::GENERAL_STAFF);

        let visible = service
            .compute_accessible_departments(user, t.org)
            .await
            .unwrap();
        assert!(visible.is_empty());
    }

    #[tokio::test]
    async fn role_level_is_max_across_concurrent_assignments() {
        let t = build_tree().await;
        let user = UserId::new();
        t.hierarchy
            .assign(t.org, user, t.sales, Some(RoleLevel::GENERAL_STAFF))
            .await;
        t.hierarchy
            .assign(t.org, user, t.engineering, Some(RoleLevel::MANAGER))
            .await;

        let service = AccessControlService::new(t.hierarchy.clone());
        let level = service.get_user_role_level(user, t.org).await.unwrap();
        assert_eq!(level, RoleLevel::MANAGER);

        // Level 4 applies to all owned departments in the union.
        let visible = service
            .compute_accessible_departments(user, t.org)
            .await
            .unwrap();
        assert!(visible.contains(&t.sales));
        assert!(visible.contains(&t.sales_east_north));
        assert!(visible.contains(&t.engineering));
    }

    #[tokio::test]
    async fn inactive_departments_are_excluded() {
        let t = build_tree().await;
        t.hierarchy
            .add_department(t.org, t.sales_east_north, Some(t.sales_east), false)
            .await;

        let user = UserId::new();
        t.hierarchy
            .assign(t.org, user, t.sales, Some(RoleLevel::MANAGER))
            .await;

        let service = AccessControlService::new(t.hierarchy.clone());
        let visible = service
            .compute_accessible_departments(user, t.org)
            .await
            .unwrap();
        assert!(!visible.contains(&t.sales_east_north));
        assert!(visible.contains(&t.sales_east));
    }

    #[tokio::test]
    async fn can_access_department_membership_test() {
        let t = build_tree().await;
        let user = UserId::new();
        t.hierarchy
            .assign(t.org, user, t.sales, Some(RoleLevel::TEAM_LEAD))
            .await;

        let service = AccessControlService::new(t.hierarchy.clone());
        assert!(service
            .can_access_department(user, t.sales_east, t.org)
            .await
            .unwrap());
        assert!(!service
            .can_access_department(user, t.engineering, t.org)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn unclassified_task_is_visible_to_anyone() {
        let t = build_tree().await;
        let user = UserId::new();

        let service = AccessControlService::new(t.hierarchy.clone());
        // No membership at all, still granted.
        assert!(service.can_access_task(user, None, t.org).await.unwrap());
    }

    #[tokio::test]
    async fn classified_task_delegates_to_department_check() {
        let t = build_tree().await;
        let user = UserId::new();
        t.hierarchy
            .assign(t.org, user, t.sales, Some(RoleLevel::GENERAL_STAFF))
            .await;

        let service = AccessControlService::new(t.hierarchy.clone());
        assert!(service
            .can_access_task(user, Some(t.sales), t.org)
            .await
            .unwrap());
        assert!(!service
            .can_access_task(user, Some(t.sales_east), t.org)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn organizations_are_isolated() {
        let t = build_tree().await;
        let other_org = OrganizationId::new();
        let user = UserId::new();
        t.hierarchy
            .assign(t.org, user, t.sales, Some(RoleLevel::EXECUTIVE))
            .await;

        let service = AccessControlService::new(t.hierarchy.clone());
        let visible = service
            .compute_accessible_departments(user, other_org)
            .await
            .unwrap();
        assert!(
            visible.is_empty(),
            "an executive in one organization sees nothing in another"
        );
    }
}
