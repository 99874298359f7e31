//! Department graph validation and ordering.
//!
//! Pure functions over the proposed parent graph (existing departments
//! merged with the incoming payload): orphan resolution, cycle detection
//! via Kahn's algorithm, topological ordering, and level/path derivation.
//! All of these run before any write.

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::error::SyncError;
use crate::payload::{DepartmentRecord, OrphanPolicy};

/// The validated parent graph: department code -> parent code.
///
/// `BTreeMap` keeps iteration deterministic, which keeps topological
/// order and apply order stable across runs.
pub type ParentGraph = BTreeMap<String, Option<String>>;

/// Merge incoming department records over the existing parent graph and
/// resolve parent references under the given orphan policy.
///
/// Incoming records override existing parents; existing departments not
/// mentioned in the payload keep their current parent. A parent reference
/// that resolves to nothing in the merged node set is an orphan: the
/// policy either rejects the run or re-parents the department to the
/// root.
pub fn merge_parent_graph(
    incoming: &[DepartmentRecord],
    existing: &ParentGraph,
    orphan_policy: OrphanPolicy,
) -> Result<ParentGraph, SyncError> {
    let mut merged: ParentGraph = existing.clone();
    for record in incoming {
        merged.insert(record.code.clone(), record.parent_code.clone());
    }

    // Resolve orphans against the merged node set.
    let codes: Vec<String> = merged.keys().cloned().collect();
    for code in codes {
        let parent = merged
            .get(&code)
            .and_then(Clone::clone);
        if let Some(parent_code) = parent {
            if !merged.contains_key(&parent_code) {
                match orphan_policy {
                    OrphanPolicy::Reject => {
                        return Err(SyncError::UnresolvedParent {
                            code,
                            parent_code,
                        });
                    }
                    OrphanPolicy::ReparentToRoot => {
                        merged.insert(code, None);
                    }
                }
            }
        }
    }

    Ok(merged)
}

/// Compute a topological order (parent before child) over the graph.
///
/// Kahn's algorithm: roots first, then each department once its parent
/// has been emitted. If any department is never emitted the graph has a
/// cycle and the run must abort before any write.
pub fn topological_order(graph: &ParentGraph) -> Result<Vec<String>, SyncError> {
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut queue: VecDeque<&str> = VecDeque::new();

    for (code, parent) in graph {
        match parent {
            Some(parent_code) => children
                .entry(parent_code.as_str())
                .or_default()
                .push(code.as_str()),
            None => queue.push_back(code.as_str()),
        }
    }

    let mut order = Vec::with_capacity(graph.len());
    while let Some(code) = queue.pop_front() {
        order.push(code.to_string());
        if let Some(kids) = children.get(code) {
            for child in kids {
                queue.push_back(child);
            }
        }
    }

    if order.len() < graph.len() {
        // Every unemitted department is on (or below) a cycle; report the
        // first by code order for a deterministic message.
        let on_cycle = graph
            .keys()
            .find(|code| !order.contains(code))
            .cloned()
            .unwrap_or_default();
        return Err(SyncError::CycleDetected { code: on_cycle });
    }

    Ok(order)
}

/// Derived placement of a department in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Depth in the tree; roots are level 1.
    pub level: i32,
    /// Materialized path of slash-joined codes, e.g. `/sales/sales-east`.
    pub path: String,
}

/// Derive level and materialized path for every department.
///
/// `order` must be a topological order of `graph`, so each parent's
/// placement is available before its children are visited.
pub fn derive_placements(graph: &ParentGraph, order: &[String]) -> HashMap<String, Placement> {
    let mut placements: HashMap<String, Placement> = HashMap::with_capacity(order.len());
    for code in order {
        let placement = match graph.get(code).and_then(Clone::clone) {
            Some(parent_code) => {
                let parent = &placements[&parent_code];
                Placement {
                    level: parent.level + 1,
                    path: format!("{}/{}", parent.path, code),
                }
            }
            None => Placement {
                level: 1,
                path: format!("/{code}"),
            },
        };
        placements.insert(code.clone(), placement);
    }
    placements
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, parent: Option<&str>) -> DepartmentRecord {
        DepartmentRecord {
            code: code.to_string(),
            name: code.to_string(),
            parent_code: parent.map(str::to_string),
            display_order: 0,
        }
    }

    fn graph(pairs: &[(&str, Option<&str>)]) -> ParentGraph {
        pairs
            .iter()
            .map(|(c, p)| (c.to_string(), p.map(str::to_string)))
            .collect()
    }

    #[test]
    fn test_merge_overrides_existing_parent() {
        let existing = graph(&[("a", None), ("b", Some("a")), ("c", None)]);
        let incoming = vec![record("b", Some("c"))];
        let merged = merge_parent_graph(&incoming, &existing, OrphanPolicy::Reject).unwrap();
        assert_eq!(merged["b"], Some("c".to_string()));
        assert_eq!(merged["a"], None);
    }

    #[test]
    fn test_orphan_rejected_by_default_policy() {
        let incoming = vec![record("b", Some("missing"))];
        let err =
            merge_parent_graph(&incoming, &ParentGraph::new(), OrphanPolicy::Reject).unwrap_err();
        match err {
            SyncError::UnresolvedParent { code, parent_code } => {
                assert_eq!(code, "b");
                assert_eq!(parent_code, "missing");
            }
            other => panic!("expected UnresolvedParent, got {other}"),
        }
    }

    #[test]
    fn test_orphan_reparented_to_root() {
        let incoming = vec![record("b", Some("missing"))];
        let merged =
            merge_parent_graph(&incoming, &ParentGraph::new(), OrphanPolicy::ReparentToRoot)
                .unwrap();
        assert_eq!(merged["b"], None);
    }

    #[test]
    fn test_parent_resolved_against_persisted_state() {
        let existing = graph(&[("sales", None)]);
        let incoming = vec![record("sales-east", Some("sales"))];
        let merged = merge_parent_graph(&incoming, &existing, OrphanPolicy::Reject).unwrap();
        assert_eq!(merged["sales-east"], Some("sales".to_string()));
    }

    #[test]
    fn test_topological_order_parent_first() {
        let g = graph(&[
            ("sales-east-north", Some("sales-east")),
            ("sales", None),
            ("sales-east", Some("sales")),
        ]);
        let order = topological_order(&g).unwrap();
        let pos = |c: &str| order.iter().position(|x| x == c).unwrap();
        assert!(pos("sales") < pos("sales-east"));
        assert!(pos("sales-east") < pos("sales-east-north"));
    }

    #[test]
    fn test_direct_cycle_detected() {
        let g = graph(&[("a", Some("b")), ("b", Some("a"))]);
        let err = topological_order(&g).unwrap_err();
        assert!(matches!(err, SyncError::CycleDetected { .. }));
        assert!(err.is_validation());
    }

    #[test]
    fn test_longer_cycle_detected() {
        let g = graph(&[
            ("a", Some("c")),
            ("b", Some("a")),
            ("c", Some("b")),
            ("root", None),
        ]);
        let err = topological_order(&g).unwrap_err();
        assert!(matches!(err, SyncError::CycleDetected { .. }));
    }

    #[test]
    fn test_self_parent_detected() {
        let g = graph(&[("a", Some("a"))]);
        let err = topological_order(&g).unwrap_err();
        assert!(matches!(err, SyncError::CycleDetected { code } if code == "a"));
    }

    #[test]
    fn test_empty_graph() {
        let order = topological_order(&ParentGraph::new()).unwrap();
        assert!(order.is_empty());
    }

    #[test]
    fn test_derive_placements() {
        let g = graph(&[
            ("sales", None),
            ("sales-east", Some("sales")),
            ("sales-east-north", Some("sales-east")),
        ]);
        let order = topological_order(&g).unwrap();
        let placements = derive_placements(&g, &order);

        assert_eq!(placements["sales"].level, 1);
        assert_eq!(placements["sales"].path, "/sales");
        assert_eq!(placements["sales-east"].level, 2);
        assert_eq!(placements["sales-east"].path, "/sales/sales-east");
        assert_eq!(placements["sales-east-north"].level, 3);
        assert_eq!(
            placements["sales-east-north"].path,
            "/sales/sales-east/sales-east-north"
        );
    }
}
