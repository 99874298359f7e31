//! Org-chart sync payload types and options.
//!
//! The payload is the validated shape of whatever the upstream org-chart
//! provider sends; transport and format are out of scope. Department
//! codes are the stable upsert keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use soulkun_core::RoleLevel;

use crate::error::SyncError;

/// A department record in the incoming org chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentRecord {
    /// Stable code, unique per organization.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Parent department code; None for roots.
    #[serde(default)]
    pub parent_code: Option<String>,
    /// Ordering hint.
    #[serde(default)]
    pub display_order: i32,
}

/// A role record in the incoming org chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleRecord {
    /// Role name, unique per organization.
    pub name: String,
    /// Visibility level; must be within [1, 6].
    pub level: i16,
}

/// An employee/department assignment record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentRecord {
    /// The assigned user.
    pub user_id: Uuid,
    /// The department the user belongs to, by code.
    pub department_code: String,
    /// The role held, by name; None if unresolved upstream.
    #[serde(default)]
    pub role_name: Option<String>,
    /// Whether this is the user's primary assignment.
    #[serde(default)]
    pub is_primary: bool,
    /// When the assignment became effective; defaults to now.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

/// A full or incremental org-chart payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrgChartPayload {
    #[serde(default)]
    pub departments: Vec<DepartmentRecord>,
    #[serde(default)]
    pub roles: Vec<RoleRecord>,
    #[serde(default)]
    pub assignments: Vec<AssignmentRecord>,
}

/// How a sync run reconciles persisted state against the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// The payload is the complete org chart: departments absent from it
    /// are soft-deactivated and assignments absent from it are ended.
    #[default]
    Full,
    /// The payload only contains changes: absent records are left alone.
    Incremental,
}

/// What to do with a department whose parent reference resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanPolicy {
    /// Abort the run with a validation error.
    #[default]
    Reject,
    /// Re-parent the orphan to the root (it becomes a root department).
    ReparentToRoot,
}

/// Options controlling a sync run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SyncOptions {
    #[serde(default)]
    pub mode: SyncMode,
    #[serde(default)]
    pub orphan_policy: OrphanPolicy,
}

impl OrgChartPayload {
    /// Surface-level validation of the payload records, before any graph
    /// analysis or write: codes non-empty and unique, role levels within
    /// band, assignment `(user, department)` pairs unique, assignments
    /// referencing department codes that exist either in this payload or
    /// in the `known_department_codes` of persisted state.
    pub fn validate(
        &self,
        known_department_codes: &std::collections::HashSet<String>,
        known_role_names: &std::collections::HashSet<String>,
    ) -> Result<(), SyncError> {
        let mut seen_codes = std::collections::HashSet::new();
        for dept in &self.departments {
            if dept.code.trim().is_empty() {
                return Err(SyncError::Validation(format!(
                    "department '{}' has an empty code",
                    dept.name
                )));
            }
            if dept.code.contains('/') {
                return Err(SyncError::Validation(format!(
                    "department code '{}' must not contain '/'",
                    dept.code
                )));
            }
            if !seen_codes.insert(dept.code.as_str()) {
                return Err(SyncError::Validation(format!(
                    "duplicate department code '{}'",
                    dept.code
                )));
            }
        }

        let mut seen_roles = std::collections::HashSet::new();
        for role in &self.roles {
            if role.name.trim().is_empty() {
                return Err(SyncError::Validation("role with an empty name".to_string()));
            }
            RoleLevel::try_new(role.level)
                .map_err(|err| SyncError::Validation(format!("role '{}': {err}", role.name)))?;
            if !seen_roles.insert(role.name.as_str()) {
                return Err(SyncError::Validation(format!(
                    "duplicate role name '{}'",
                    role.name
                )));
            }
        }

        let mut seen_assignment_keys = std::collections::HashSet::new();
        for assignment in &self.assignments {
            if !seen_assignment_keys
                .insert((assignment.user_id, assignment.department_code.as_str()))
            {
                return Err(SyncError::Validation(format!(
                    "duplicate assignment for user {} in department '{}'",
                    assignment.user_id, assignment.department_code
                )));
            }
            let dept_known = seen_codes.contains(assignment.department_code.as_str())
                || known_department_codes.contains(&assignment.department_code);
            if !dept_known {
                return Err(SyncError::Validation(format!(
                    "assignment for user {} references unknown department '{}'",
                    assignment.user_id, assignment.department_code
                )));
            }
            if let Some(role_name) = &assignment.role_name {
                let role_known =
                    seen_roles.contains(role_name.as_str()) || known_role_names.contains(role_name);
                if !role_known {
                    return Err(SyncError::Validation(format!(
                        "assignment for user {} references unknown role '{}'",
                        assignment.user_id, role_name
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn dept(code: &str, parent: Option<&str>) -> DepartmentRecord {
        DepartmentRecord {
            code: code.to_string(),
            name: code.to_string(),
            parent_code: parent.map(str::to_string),
            display_order: 0,
        }
    }

    #[test]
    fn test_valid_payload() {
        let payload = OrgChartPayload {
            departments: vec![dept("sales", None), dept("sales-east", Some("sales"))],
            roles: vec![RoleRecord {
                name: "manager".into(),
                level: 4,
            }],
            assignments: vec![AssignmentRecord {
                user_id: Uuid::new_v4(),
                department_code: "sales".into(),
                role_name: Some("manager".into()),
                is_primary: true,
                started_at: None,
            }],
        };
        assert!(payload.validate(&HashSet::new(), &HashSet::new()).is_ok());
    }

    #[test]
    fn test_duplicate_department_code_rejected() {
        let payload = OrgChartPayload {
            departments: vec![dept("sales", None), dept("sales", None)],
            ..OrgChartPayload::default()
        };
        let err = payload
            .validate(&HashSet::new(), &HashSet::new())
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("duplicate department code"));
    }

    #[test]
    fn test_role_level_out_of_band_rejected() {
        let payload = OrgChartPayload {
            roles: vec![RoleRecord {
                name: "superuser".into(),
                level: 7,
            }],
            ..OrgChartPayload::default()
        };
        let err = payload
            .validate(&HashSet::new(), &HashSet::new())
            .unwrap_err();
        assert!(err.to_string().contains("outside [1, 6]"));
    }

    #[test]
    fn test_assignment_referencing_persisted_department_is_ok() {
        let payload = OrgChartPayload {
            assignments: vec![AssignmentRecord {
                user_id: Uuid::new_v4(),
                department_code: "legacy".into(),
                role_name: None,
                is_primary: false,
                started_at: None,
            }],
            ..OrgChartPayload::default()
        };
        let known: HashSet<String> = ["legacy".to_string()].into_iter().collect();
        assert!(payload.validate(&known, &HashSet::new()).is_ok());
    }

    #[test]
    fn test_assignment_unknown_department_rejected() {
        let payload = OrgChartPayload {
            assignments: vec![AssignmentRecord {
                user_id: Uuid::new_v4(),
                department_code: "nowhere".into(),
                role_name: None,
                is_primary: false,
                started_at: None,
            }],
            ..OrgChartPayload::default()
        };
        let err = payload
            .validate(&HashSet::new(), &HashSet::new())
            .unwrap_err();
        assert!(err.to_string().contains("unknown department"));
    }

    #[test]
    fn test_duplicate_assignment_pair_rejected() {
        let user_id = Uuid::new_v4();
        let assignment = AssignmentRecord {
            user_id,
            department_code: "sales".into(),
            role_name: None,
            is_primary: false,
            started_at: None,
        };
        let payload = OrgChartPayload {
            departments: vec![dept("sales", None)],
            assignments: vec![assignment.clone(), assignment],
            ..OrgChartPayload::default()
        };
        let err = payload
            .validate(&HashSet::new(), &HashSet::new())
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("duplicate assignment"));
    }

    #[test]
    fn test_same_user_in_two_departments_is_ok() {
        let user_id = Uuid::new_v4();
        let assignment = |code: &str| AssignmentRecord {
            user_id,
            department_code: code.into(),
            role_name: None,
            is_primary: false,
            started_at: None,
        };
        let payload = OrgChartPayload {
            departments: vec![dept("sales", None), dept("engineering", None)],
            assignments: vec![assignment("sales"), assignment("engineering")],
            ..OrgChartPayload::default()
        };
        assert!(payload.validate(&HashSet::new(), &HashSet::new()).is_ok());
    }

    #[test]
    fn test_code_with_slash_rejected() {
        let payload = OrgChartPayload {
            departments: vec![dept("sales/east", None)],
            ..OrgChartPayload::default()
        };
        let err = payload
            .validate(&HashSet::new(), &HashSet::new())
            .unwrap_err();
        assert!(err.to_string().contains("must not contain"));
    }

    #[test]
    fn test_options_defaults() {
        let options: SyncOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.mode, SyncMode::Full);
        assert_eq!(options.orphan_policy, OrphanPolicy::Reject);
    }
}
