//! # soulkun-access
//!
//! Access control service for the Soul-kun core: answers "what can this
//! user see" and "can this user see that" as a pure function of
//! `(user_id, organization_id)` plus the persisted hierarchy. Fully
//! read-only; the department tables are mutated only by the sync service.
//!
//! The visibility algorithm is re-run on every resource listing request,
//! so the descendant lookups go through the closure table (one indexed
//! query per owned department) rather than recursive walks.
//!
//! # Example
//!
//! ```rust,ignore
//! use soulkun_access::{AccessControlService, PgHierarchyReader};
//!
//! let service = AccessControlService::new(PgHierarchyReader::new(pool));
//! let visible = service.compute_accessible_departments(user_id, org_id).await?;
//! ```

pub mod error;
pub mod reader;
pub mod service;

pub use error::AccessError;
pub use reader::{HierarchyReader, InMemoryHierarchy, PgHierarchyReader};
pub use service::AccessControlService;
