//! Closure-table computation and verification.
//!
//! Pure functions deriving the (ancestor, descendant, depth) row set from
//! the parent pointers, and verifying an existing row set against them.
//! The parent pointers are the source of truth; the closure table is a
//! derived cache rebuilt inside the sync transaction.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::error::SyncError;

/// One computed closure row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClosureRow {
    pub ancestor: Uuid,
    pub descendant: Uuid,
    pub depth: i32,
}

/// Compute the full closure row set from parent pointers.
///
/// For every department: a self row at depth 0, plus one row per ancestor
/// at increasing depth, derived by walking the parent chain. The chain
/// walk is bounded by the map size; exceeding it means a cycle survived
/// validation, which is a consistency violation, not a validation error.
pub fn build_closure(parents: &HashMap<Uuid, Option<Uuid>>) -> Result<Vec<ClosureRow>, SyncError> {
    let mut rows = Vec::with_capacity(parents.len() * 2);

    for (&id, &parent) in parents {
        rows.push(ClosureRow {
            ancestor: id,
            descendant: id,
            depth: 0,
        });

        let mut cursor = parent;
        let mut depth = 1;
        while let Some(ancestor) = cursor {
            if depth as usize > parents.len() {
                return Err(SyncError::Consistency(format!(
                    "parent chain of department {id} exceeds tree size; cycle survived validation"
                )));
            }
            rows.push(ClosureRow {
                ancestor,
                descendant: id,
                depth,
            });
            cursor = parents.get(&ancestor).copied().flatten();
            depth += 1;
        }
    }

    Ok(rows)
}

/// Verify a closure row set against the parent pointers.
///
/// Checks, for every department, that the rows reachable from it exactly
/// match its parent chain: a self row exists, every (ancestor, depth)
/// pair matches the chain walk, and no extra rows are present. A mismatch
/// is fatal; it indicates a bug in the rebuild, not bad upstream data.
pub fn verify_closure(
    parents: &HashMap<Uuid, Option<Uuid>>,
    rows: &[ClosureRow],
) -> Result<(), SyncError> {
    let expected = build_closure(parents)?;
    let expected_set: HashSet<ClosureRow> = expected.iter().copied().collect();
    let actual_set: HashSet<ClosureRow> = rows.iter().copied().collect();

    if expected_set.len() != expected.len() || actual_set.len() != rows.len() {
        return Err(SyncError::Consistency(
            "duplicate closure rows detected".to_string(),
        ));
    }

    if let Some(missing) = expected_set.difference(&actual_set).next() {
        return Err(SyncError::Consistency(format!(
            "missing closure row ({} -> {} depth {})",
            missing.ancestor, missing.descendant, missing.depth
        )));
    }
    if let Some(extra) = actual_set.difference(&expected_set).next() {
        return Err(SyncError::Consistency(format!(
            "unexpected closure row ({} -> {} depth {})",
            extra.ancestor, extra.descendant, extra.depth
        )));
    }

    Ok(())
}
