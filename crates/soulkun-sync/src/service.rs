//! The organization sync service.
//!
//! Ingests an externally-sourced org chart and atomically reconciles it
//! with persisted state. Validation (reference resolution, cycle
//! detection, orphan policy) runs before any write; the apply phase
//! executes inside one transaction guarded by a per-organization
//! advisory lock, ending with a closure-table rebuild and consistency
//! check. Any failure rolls the whole run back and leaves prior state
//! untouched.

use std::collections::{HashMap, HashSet};

use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use soulkun_core::{OrganizationId, SyncRunId};
use soulkun_db::models::org_chart_sync_log::{OrgChartSyncLog, SyncCounts};

use crate::closure::{build_closure, verify_closure};
use crate::error::SyncError;
use crate::graph::{derive_placements, merge_parent_graph, topological_order, ParentGraph};
use crate::payload::{OrgChartPayload, SyncMode, SyncOptions};

/// Outcome of a successful sync run, mirroring the persisted log row.
#[derive(Debug, Clone, Copy)]
pub struct SyncReport {
    /// The `OrgChartSyncLog` row for this run.
    pub run_id: SyncRunId,
    /// Change counters. All zero on an idempotent re-run.
    pub counts: SyncCounts,
}

#[derive(Debug, Clone, FromRow)]
struct ExistingDepartment {
    id: Uuid,
    code: String,
    name: String,
    parent_department_id: Option<Uuid>,
    level: i32,
    path: String,
    display_order: i32,
    is_active: bool,
}

#[derive(Debug, Clone, FromRow)]
struct ExistingAssignment {
    id: Uuid,
    user_id: Uuid,
    department_id: Uuid,
    role_id: Option<Uuid>,
    is_primary: bool,
}

/// Batch reconciliation of an organization's chart. Not a request-path
/// operation; the department/role/assignment tables are mutated only
/// here, which is what keeps the read path lock-free.
#[derive(Debug, Clone)]
pub struct OrganizationSyncService {
    pool: PgPool,
}

impl OrganizationSyncService {
    /// Create a service over the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Validate a payload against persisted state without writing
    /// anything (dry run). Runs the same checks as [`Self::run`]:
    /// surface validation, parent resolution under the orphan policy,
    /// and cycle detection.
    pub async fn validate_payload(
        &self,
        organization_id: OrganizationId,
        payload: &OrgChartPayload,
        options: &SyncOptions,
    ) -> Result<(), SyncError> {
        let org = organization_id.into_uuid();
        let existing = load_departments(&self.pool, org).await?;
        let existing_graph = parent_graph_of(&existing);
        let known_codes: HashSet<String> = existing.iter().map(|d| d.code.clone()).collect();
        let known_roles = load_role_names(&self.pool, org).await?;

        payload.validate(&known_codes, &known_roles)?;
        let merged = merge_parent_graph(&payload.departments, &existing_graph, options.orphan_policy)?;
        topological_order(&merged)?;
        Ok(())
    }

    /// Run a sync: create the audit log row, apply the payload inside
    /// one transaction, and finalize the log with counts or the failure
    /// message.
    pub async fn run(
        &self,
        organization_id: OrganizationId,
        payload: &OrgChartPayload,
        options: &SyncOptions,
    ) -> Result<SyncReport, SyncError> {
        let org = organization_id.into_uuid();
        let log = OrgChartSyncLog::start(&self.pool, org).await?;

        tracing::info!(
            organization_id = %organization_id,
            run_id = %log.id,
            departments = payload.departments.len(),
            roles = payload.roles.len(),
            assignments = payload.assignments.len(),
            "Org-chart sync started"
        );

        match self.apply(org, payload, options).await {
            Ok(counts) => {
                OrgChartSyncLog::finish_success(&self.pool, org, log.id, counts).await?;
                tracing::info!(
                    organization_id = %organization_id,
                    run_id = %log.id,
                    departments_added = counts.departments_added,
                    departments_updated = counts.departments_updated,
                    departments_deactivated = counts.departments_deactivated,
                    assignments_added = counts.assignments_added,
                    assignments_updated = counts.assignments_updated,
                    assignments_ended = counts.assignments_ended,
                    "Org-chart sync succeeded"
                );
                Ok(SyncReport {
                    run_id: SyncRunId::from_uuid(log.id),
                    counts,
                })
            }
            Err(err) => {
                tracing::error!(
                    organization_id = %organization_id,
                    run_id = %log.id,
                    error = %err,
                    "Org-chart sync failed; transaction rolled back"
                );
                // Operator-facing summary, not a stack trace.
                if let Err(log_err) =
                    OrgChartSyncLog::finish_failed(&self.pool, org, log.id, &err.to_string()).await
                {
                    tracing::error!(
                        run_id = %log.id,
                        error = %log_err,
                        "Failed to finalize sync log; run stays in_progress"
                    );
                }
                Err(err)
            }
        }
    }

    /// The transactional apply phase.
    async fn apply(
        &self,
        org: Uuid,
        payload: &OrgChartPayload,
        options: &SyncOptions,
    ) -> Result<SyncCounts, SyncError> {
        let mut tx = self.pool.begin().await?;

        // Single-flight guard: two concurrent syncs for the same
        // organization would race on the closure rebuild. The advisory
        // lock releases on commit or rollback.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(org.to_string())
            .execute(&mut *tx)
            .await?;

        let existing = load_departments_tx(&mut tx, org).await?;
        let existing_graph = parent_graph_of(&existing);
        let existing_by_code: HashMap<String, ExistingDepartment> = existing
            .iter()
            .map(|d| (d.code.clone(), d.clone()))
            .collect();
        let known_codes: HashSet<String> = existing_by_code.keys().cloned().collect();

        let mut role_id_by_name = load_roles_tx(&mut tx, org).await?;
        let known_roles: HashSet<String> = role_id_by_name.keys().cloned().collect();

        // Validation: all of it happens before the first write.
        payload.validate(&known_codes, &known_roles)?;
        let merged = merge_parent_graph(&payload.departments, &existing_graph, options.orphan_policy)?;
        let order = topological_order(&merged)?;
        let placements = derive_placements(&merged, &order);

        let mut counts = SyncCounts::default();

        // Roles first: assignments reference them.
        for role in &payload.roles {
            let (id,): (Uuid,) = sqlx::query_as(
                r"
                INSERT INTO roles (organization_id, name, level)
                VALUES ($1, $2, $3)
                ON CONFLICT (organization_id, name) DO UPDATE SET
                    level = EXCLUDED.level,
                    updated_at = CASE
                        WHEN roles.level IS DISTINCT FROM EXCLUDED.level THEN now()
                        ELSE roles.updated_at
                    END
                RETURNING id
                ",
            )
            .bind(org)
            .bind(&role.name)
            .bind(role.level)
            .fetch_one(&mut *tx)
            .await?;
            role_id_by_name.insert(role.name.clone(), id);
        }

        // Departments in topological order so every parent_department_id
        // is valid at insert time.
        let incoming_by_code: HashMap<&str, &crate::payload::DepartmentRecord> = payload
            .departments
            .iter()
            .map(|d| (d.code.as_str(), d))
            .collect();
        let mut id_by_code: HashMap<String, Uuid> = existing_by_code
            .iter()
            .map(|(code, d)| (code.clone(), d.id))
            .collect();

        // In full mode, active departments the payload omits get
        // deactivated below; skip the placement refresh for them so each
        // counts once in the audit counters. Their level/path are
        // recomputed whenever a later payload reactivates them.
        let deactivating: HashSet<&str> = if options.mode == SyncMode::Full {
            existing_by_code
                .values()
                .filter(|d| d.is_active && !incoming_by_code.contains_key(d.code.as_str()))
                .map(|d| d.code.as_str())
                .collect()
        } else {
            HashSet::new()
        };

        for code in &order {
            let placement = &placements[code];
            let parent_id = merged[code].as_ref().map(|p| id_by_code[p]);

            if let Some(record) = incoming_by_code.get(code.as_str()) {
                match existing_by_code.get(code) {
                    None => {
                        let (id,): (Uuid,) = sqlx::query_as(
                            r"
                            INSERT INTO departments (
                                organization_id, name, code, parent_department_id,
                                level, path, display_order, is_active
                            )
                            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE)
                            RETURNING id
                            ",
                        )
                        .bind(org)
                        .bind(&record.name)
                        .bind(code)
                        .bind(parent_id)
                        .bind(placement.level)
                        .bind(&placement.path)
                        .bind(record.display_order)
                        .fetch_one(&mut *tx)
                        .await?;
                        id_by_code.insert(code.clone(), id);
                        counts.departments_added += 1;

                        // Default override row; the role-level algorithm
                        // stays authoritative until policies set these.
                        sqlx::query(
                            r"
                            INSERT INTO department_access_scopes (department_id, organization_id)
                            VALUES ($1, $2)
                            ON CONFLICT (department_id) DO NOTHING
                            ",
                        )
                        .bind(id)
                        .bind(org)
                        .execute(&mut *tx)
                        .await?;
                    }
                    Some(current) => {
                        let changed = current.name != record.name
                            || current.parent_department_id != parent_id
                            || current.level != placement.level
                            || current.path != placement.path
                            || current.display_order != record.display_order
                            || !current.is_active;
                        if changed {
                            sqlx::query(
                                r"
                                UPDATE departments SET
                                    name = $3,
                                    parent_department_id = $4,
                                    level = $5,
                                    path = $6,
                                    display_order = $7,
                                    is_active = TRUE,
                                    updated_at = now()
                                WHERE organization_id = $1 AND id = $2
                                ",
                            )
                            .bind(org)
                            .bind(current.id)
                            .bind(&record.name)
                            .bind(parent_id)
                            .bind(placement.level)
                            .bind(&placement.path)
                            .bind(record.display_order)
                            .execute(&mut *tx)
                            .await?;
                            counts.departments_updated += 1;
                        }
                    }
                }
            } else if let Some(current) = existing_by_code.get(code) {
                if deactivating.contains(code.as_str()) {
                    continue;
                }
                // Not in the payload, but an ancestor may have moved:
                // refresh stale placements so path/level stay consistent
                // with the parent chain.
                if current.level != placement.level
                    || current.path != placement.path
                    || current.parent_department_id != parent_id
                {
                    sqlx::query(
                        r"
                        UPDATE departments SET
                            parent_department_id = $3,
                            level = $4,
                            path = $5,
                            updated_at = now()
                        WHERE organization_id = $1 AND id = $2
                        ",
                    )
                    .bind(org)
                    .bind(current.id)
                    .bind(parent_id)
                    .bind(placement.level)
                    .bind(&placement.path)
                    .execute(&mut *tx)
                    .await?;
                    counts.departments_updated += 1;
                }
            }
        }

        // Full payloads are authoritative: departments they omit are
        // soft-deactivated, never deleted.
        if options.mode == SyncMode::Full {
            for (code, current) in &existing_by_code {
                if deactivating.contains(code.as_str()) {
                    sqlx::query(
                        r"
                        UPDATE departments SET is_active = FALSE, updated_at = now()
                        WHERE organization_id = $1 AND id = $2
                        ",
                    )
                    .bind(org)
                    .bind(current.id)
                    .execute(&mut *tx)
                    .await?;
                    counts.departments_deactivated += 1;
                }
            }
        }

        // Assignments: upsert present ones, end absent ones (full mode).
        let active_assignments = load_assignments_tx(&mut tx, org).await?;
        let existing_by_key: HashMap<(Uuid, Uuid), &ExistingAssignment> = active_assignments
            .iter()
            .map(|a| ((a.user_id, a.department_id), a))
            .collect();
        let mut seen_keys: HashSet<(Uuid, Uuid)> = HashSet::new();

        for assignment in &payload.assignments {
            let department_id = id_by_code[&assignment.department_code];
            let role_id = assignment
                .role_name
                .as_ref()
                .map(|name| role_id_by_name[name]);
            let key = (assignment.user_id, department_id);
            seen_keys.insert(key);

            match existing_by_key.get(&key) {
                None => {
                    sqlx::query(
                        r"
                        INSERT INTO user_departments (
                            organization_id, user_id, department_id, role_id,
                            is_primary, started_at
                        )
                        VALUES ($1, $2, $3, $4, $5, COALESCE($6, now()))
                        ",
                    )
                    .bind(org)
                    .bind(assignment.user_id)
                    .bind(department_id)
                    .bind(role_id)
                    .bind(assignment.is_primary)
                    .bind(assignment.started_at)
                    .execute(&mut *tx)
                    .await?;
                    counts.assignments_added += 1;
                }
                Some(current) => {
                    if current.role_id != role_id || current.is_primary != assignment.is_primary {
                        sqlx::query(
                            r"
                            UPDATE user_departments SET
                                role_id = $3,
                                is_primary = $4,
                                updated_at = now()
                            WHERE organization_id = $1 AND id = $2
                            ",
                        )
                        .bind(org)
                        .bind(current.id)
                        .bind(role_id)
                        .bind(assignment.is_primary)
                        .execute(&mut *tx)
                        .await?;
                        counts.assignments_updated += 1;
                    }
                }
            }
        }

        if options.mode == SyncMode::Full {
            for (key, current) in &existing_by_key {
                if !seen_keys.contains(key) {
                    sqlx::query(
                        r"
                        UPDATE user_departments SET ended_at = now(), updated_at = now()
                        WHERE organization_id = $1 AND id = $2
                        ",
                    )
                    .bind(org)
                    .bind(current.id)
                    .execute(&mut *tx)
                    .await?;
                    counts.assignments_ended += 1;
                }
            }
        }

        // Closure rebuild over the whole organization, inactive
        // departments included; the read path filters on is_active.
        let mut parents: HashMap<Uuid, Option<Uuid>> = HashMap::with_capacity(merged.len());
        for (code, parent_code) in &merged {
            let id = id_by_code[code];
            let parent_id = parent_code.as_ref().map(|p| id_by_code[p]);
            parents.insert(id, parent_id);
        }
        let rows = build_closure(&parents)?;

        // Verify against what the transaction actually persisted, not the
        // in-memory graph the rows were derived from: re-read the parent
        // pointers and require the chain walk over them to yield exactly
        // the row set about to be inserted. Catches a missed or extra
        // department write before the closure table is touched.
        let persisted: Vec<(Uuid, Option<Uuid>)> = sqlx::query_as(
            "SELECT id, parent_department_id FROM departments WHERE organization_id = $1",
        )
        .bind(org)
        .fetch_all(&mut *tx)
        .await?;
        let persisted_parents: HashMap<Uuid, Option<Uuid>> = persisted.into_iter().collect();
        verify_closure(&persisted_parents, &rows)?;

        sqlx::query("DELETE FROM department_hierarchy WHERE organization_id = $1")
            .bind(org)
            .execute(&mut *tx)
            .await?;

        let ancestors: Vec<Uuid> = rows.iter().map(|r| r.ancestor).collect();
        let descendants: Vec<Uuid> = rows.iter().map(|r| r.descendant).collect();
        let depths: Vec<i32> = rows.iter().map(|r| r.depth).collect();
        sqlx::query(
            r"
            INSERT INTO department_hierarchy (
                organization_id, ancestor_department_id, descendant_department_id, depth
            )
            SELECT $1, a, d, dep
            FROM UNNEST($2::uuid[], $3::uuid[], $4::int4[]) AS t(a, d, dep)
            ",
        )
        .bind(org)
        .bind(&ancestors)
        .bind(&descendants)
        .bind(&depths)
        .execute(&mut *tx)
        .await?;

        let (inserted,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM department_hierarchy WHERE organization_id = $1")
                .bind(org)
                .fetch_one(&mut *tx)
                .await?;
        if inserted != rows.len() as i64 {
            return Err(SyncError::Consistency(format!(
                "closure rebuild wrote {inserted} rows, expected {}",
                rows.len()
            )));
        }

        tx.commit().await?;
        Ok(counts)
    }
}

async fn load_departments(pool: &PgPool, org: Uuid) -> Result<Vec<ExistingDepartment>, SyncError> {
    let rows = sqlx::query_as(
        r"
        SELECT id, code, name, parent_department_id, level, path, display_order, is_active
        FROM departments
        WHERE organization_id = $1
        ",
    )
    .bind(org)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

async fn load_departments_tx(
    tx: &mut Transaction<'_, Postgres>,
    org: Uuid,
) -> Result<Vec<ExistingDepartment>, SyncError> {
    let rows = sqlx::query_as(
        r"
        SELECT id, code, name, parent_department_id, level, path, display_order, is_active
        FROM departments
        WHERE organization_id = $1
        ",
    )
    .bind(org)
    .fetch_all(&mut **tx)
    .await?;
    Ok(rows)
}

async fn load_roles_tx(
    tx: &mut Transaction<'_, Postgres>,
    org: Uuid,
) -> Result<HashMap<String, Uuid>, SyncError> {
    let rows: Vec<(String, Uuid)> =
        sqlx::query_as("SELECT name, id FROM roles WHERE organization_id = $1")
            .bind(org)
            .fetch_all(&mut **tx)
            .await?;
    Ok(rows.into_iter().collect())
}

async fn load_role_names(pool: &PgPool, org: Uuid) -> Result<HashSet<String>, SyncError> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM roles WHERE organization_id = $1")
        .bind(org)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}

async fn load_assignments_tx(
    tx: &mut Transaction<'_, Postgres>,
    org: Uuid,
) -> Result<Vec<ExistingAssignment>, SyncError> {
    let rows = sqlx::query_as(
        r"
        SELECT id, user_id, department_id, role_id, is_primary
        FROM user_departments
        WHERE organization_id = $1 AND ended_at IS NULL
        ",
    )
    .bind(org)
    .fetch_all(&mut **tx)
    .await?;
    Ok(rows)
}

fn parent_graph_of(departments: &[ExistingDepartment]) -> ParentGraph {
    let code_by_id: HashMap<Uuid, &str> = departments
        .iter()
        .map(|d| (d.id, d.code.as_str()))
        .collect();
    departments
        .iter()
        .map(|d| {
            let parent = d
                .parent_department_id
                .and_then(|pid| code_by_id.get(&pid))
                .map(|&code| code.to_string());
            (d.code.clone(), parent)
        })
        .collect()
}
