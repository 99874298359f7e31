//! Soul-kun Core Library
//!
//! Shared types and traits for the Soul-kun access control core.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed identifiers (`OrganizationId`, `UserId`, `DepartmentId`)
//! - [`levels`] - The `RoleLevel` domain type (1-6) and its visibility semantics
//! - [`traits`] - Multi-tenant traits (`OrganizationScoped`)
//! - [`error`] - Standardized error types (`SoulkunError`)
//!
//! # Example
//!
//! ```
//! use soulkun_core::{OrganizationId, UserId, RoleLevel};
//!
//! let org_id = OrganizationId::new();
//! let user_id = UserId::new();
//! let level = RoleLevel::try_new(4).unwrap();
//! assert!(level < RoleLevel::ADMIN);
//! ```

pub mod error;
pub mod ids;
pub mod levels;
pub mod traits;

pub use error::{Result, SoulkunError};
pub use ids::{DepartmentId, OrganizationId, SyncRunId, UserId};
pub use levels::{AccessBreadth, RoleLevel};
pub use traits::OrganizationScoped;
