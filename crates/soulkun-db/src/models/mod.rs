//! Database entity models for soulkun-db.
//!
//! These models represent the database tables and provide
//! type-safe interactions with PostgreSQL. Every tenant-scoped query
//! binds `organization_id` first.

pub mod department;
pub mod department_access_scope;
pub mod department_hierarchy;
pub mod org_chart_sync_log;
pub mod organization;
pub mod role;
pub mod user_department;

pub use department::Department;
pub use department_access_scope::DepartmentAccessScope;
pub use department_hierarchy::DepartmentHierarchyRow;
pub use org_chart_sync_log::{OrgChartSyncLog, SyncRunStatus};
pub use organization::Organization;
pub use role::Role;
pub use user_department::UserDepartment;
