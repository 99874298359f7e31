//! Role Levels
//!
//! The `RoleLevel` domain type: an integer in `[1, 6]` whose semantics are
//! fixed by convention, not configurable per organization.
//!
//! | level | label | scope |
//! |---|---|---|
//! | 1 | contractor | own department only, restricted |
//! | 2 | general staff | own department only |
//! | 3 | team lead | own department + direct children |
//! | 4 | manager/director | own department + all descendants |
//! | 5 | admin/back-office | entire organization except top-secret |
//! | 6 | executive/CFO | entire organization, unrestricted |

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::error::{Result, SoulkunError};

/// A role level in `[1, 6]` controlling breadth of department visibility.
///
/// Construction clamps out-of-range values into the valid band, so a
/// `RoleLevel` is always well formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleLevel(i16);

impl RoleLevel {
    /// Level 1: own department only, restricted access.
    pub const CONTRACTOR: RoleLevel = RoleLevel(1);
    /// Level 2: own department only. The default when no role resolves.
    pub const GENERAL_STAFF: RoleLevel = RoleLevel(2);
    /// Level 3: own department plus direct children.
    pub const TEAM_LEAD: RoleLevel = RoleLevel(3);
    /// Level 4: own department plus all descendants.
    pub const MANAGER: RoleLevel = RoleLevel(4);
    /// Level 5: entire organization except top-secret.
    pub const ADMIN: RoleLevel = RoleLevel(5);
    /// Level 6: entire organization, unrestricted.
    pub const EXECUTIVE: RoleLevel = RoleLevel(6);

    /// Minimum valid level.
    pub const MIN: i16 = 1;
    /// Maximum valid level.
    pub const MAX: i16 = 6;

    /// Create a level from a raw integer, clamping into `[1, 6]`.
    #[must_use]
    pub fn new(raw: i16) -> Self {
        Self(raw.clamp(Self::MIN, Self::MAX))
    }

    /// Create a level from a raw integer, rejecting out-of-range values.
    ///
    /// Use this at trust boundaries where an out-of-range level is bad
    /// input to report, not a value to silently repair.
    pub fn try_new(raw: i16) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&raw) {
            return Err(SoulkunError::Validation {
                field: "level".to_string(),
                message: format!("{raw} outside [{}, {}]", Self::MIN, Self::MAX),
            });
        }
        Ok(Self(raw))
    }

    /// The raw integer value.
    #[must_use]
    pub fn as_i16(self) -> i16 {
        self.0
    }

    /// The visibility breadth this level grants over the department tree.
    #[must_use]
    pub fn breadth(self) -> AccessBreadth {
        match self.0 {
            1 | 2 => AccessBreadth::OwnDepartments,
            3 => AccessBreadth::DirectChildren,
            4 => AccessBreadth::AllDescendants,
            _ => AccessBreadth::Organization,
        }
    }

    /// Whether this level sees every active department in the organization
    /// regardless of its own memberships (levels 5 and 6).
    #[must_use]
    pub fn is_organization_wide(self) -> bool {
        self.0 >= 5
    }
}

impl Default for RoleLevel {
    /// Users with no resolvable role default to general staff.
    fn default() -> Self {
        Self::GENERAL_STAFF
    }
}

impl Display for RoleLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i16> for RoleLevel {
    fn from(raw: i16) -> Self {
        Self::new(raw)
    }
}

/// How far out from a user's own departments their visibility reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessBreadth {
    /// Own departments only (levels 1-2).
    OwnDepartments,
    /// Own departments plus direct children (level 3).
    DirectChildren,
    /// Own departments plus all descendants (level 4).
    AllDescendants,
    /// Every active department in the organization (levels 5-6).
    Organization,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps_out_of_range() {
        assert_eq!(RoleLevel::new(0), RoleLevel::CONTRACTOR);
        assert_eq!(RoleLevel::new(-3), RoleLevel::CONTRACTOR);
        assert_eq!(RoleLevel::new(7), RoleLevel::EXECUTIVE);
        assert_eq!(RoleLevel::new(100), RoleLevel::EXECUTIVE);
    }

    #[test]
    fn test_try_new_rejects_out_of_range() {
        assert_eq!(RoleLevel::try_new(4).unwrap(), RoleLevel::MANAGER);
        let err = RoleLevel::try_new(7).unwrap_err();
        assert!(err.to_string().contains("outside [1, 6]"));
        assert!(RoleLevel::try_new(0).is_err());
    }

    #[test]
    fn test_default_is_general_staff() {
        assert_eq!(RoleLevel::default(), RoleLevel::GENERAL_STAFF);
    }

    #[test]
    fn test_breadth_per_level() {
        assert_eq!(RoleLevel::CONTRACTOR.breadth(), AccessBreadth::OwnDepartments);
        assert_eq!(RoleLevel::GENERAL_STAFF.breadth(), AccessBreadth::OwnDepartments);
        assert_eq!(RoleLevel::TEAM_LEAD.breadth(), AccessBreadth::DirectChildren);
        assert_eq!(RoleLevel::MANAGER.breadth(), AccessBreadth::AllDescendants);
        assert_eq!(RoleLevel::ADMIN.breadth(), AccessBreadth::Organization);
        assert_eq!(RoleLevel::EXECUTIVE.breadth(), AccessBreadth::Organization);
    }

    #[test]
    fn test_organization_wide_threshold() {
        assert!(!RoleLevel::MANAGER.is_organization_wide());
        assert!(RoleLevel::ADMIN.is_organization_wide());
        assert!(RoleLevel::EXECUTIVE.is_organization_wide());
    }

    #[test]
    fn test_ordering() {
        assert!(RoleLevel::CONTRACTOR < RoleLevel::EXECUTIVE);
        assert!(RoleLevel::TEAM_LEAD >= RoleLevel::TEAM_LEAD);
    }
}
