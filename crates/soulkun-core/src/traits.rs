//! Multi-Tenant Traits
//!
//! This module provides traits for organization-scoped entities.
//!
//! # Example
//!
//! ```
//! use soulkun_core::{OrganizationId, OrganizationScoped};
//!
//! struct Department {
//!     id: uuid::Uuid,
//!     organization_id: OrganizationId,
//!     name: String,
//! }
//!
//! impl OrganizationScoped for Department {
//!     fn organization_id(&self) -> OrganizationId {
//!         self.organization_id
//!     }
//! }
//!
//! // Generic function that works with any OrganizationScoped entity
//! fn verify_org<T: OrganizationScoped>(entity: &T, expected: OrganizationId) -> bool {
//!     entity.organization_id() == expected
//! }
//! ```

use crate::ids::OrganizationId;

/// Trait for entities that belong to a specific organization.
///
/// Implementing this trait marks an entity as tenant-scoped, enabling
/// compile-time verification that tenant isolation is properly implemented.
/// No query in the system may span organizations; entities carrying this
/// trait make the expected scope explicit at the type level.
///
/// # Object Safety
///
/// This trait is object-safe: it can be used with trait objects such as
/// `Box<dyn OrganizationScoped>` or `&dyn OrganizationScoped`.
pub trait OrganizationScoped {
    /// The organization this entity belongs to.
    fn organization_id(&self) -> OrganizationId;

    /// Check whether this entity belongs to the given organization.
    fn belongs_to(&self, organization_id: OrganizationId) -> bool {
        self.organization_id() == organization_id
    }
}
