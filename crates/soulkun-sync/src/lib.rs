//! # soulkun-sync
//!
//! Organization sync service for the Soul-kun core: transactional
//! reconciliation of an externally-sourced org chart (departments, roles,
//! user assignments) against persisted state, with closure-table
//! maintenance.
//!
//! A run validates the full payload before any write (parent reference
//! resolution, cycle detection, orphan policy), applies changes in
//! topological order inside one transaction, rebuilds and verifies the
//! closure table, and finalizes an append-only audit log row. These
//! tables are mutated only here; the access-control read path stays
//! lock-free.
//!
//! # Example
//!
//! ```rust,ignore
//! use soulkun_sync::{OrganizationSyncService, OrgChartPayload, SyncOptions};
//!
//! let service = OrganizationSyncService::new(pool);
//! let report = service.run(org_id, &payload, &SyncOptions::default()).await?;
//! assert!(report.counts.departments_added >= 0);
//! ```

pub mod closure;
pub mod error;
pub mod graph;
pub mod payload;
pub mod service;

pub use closure::{build_closure, verify_closure, ClosureRow};
pub use error::SyncError;
pub use graph::{derive_placements, merge_parent_graph, topological_order, ParentGraph};
pub use payload::{
    AssignmentRecord, DepartmentRecord, OrgChartPayload, OrphanPolicy, RoleRecord, SyncMode,
    SyncOptions,
};
pub use service::{OrganizationSyncService, SyncReport};
