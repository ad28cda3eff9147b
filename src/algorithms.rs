use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::models::{EmployeeId, HierarchyEdge, HierarchyNode};

/// Build the full-hierarchy forest for one owner's edge set.
///
/// Every id is entered into the node map the first time it is seen as
/// either senior or junior, juniors attach under their seniors in edge
/// order, and the roots are the ids that never appear as a junior. A
/// tenant may have several independent roots. Ids without a display
/// name fall back to their id string.
///
/// Materialization depth is bounded by the edge count, so corrupted
/// (cyclic) edge data produces a truncated forest instead of looping.
pub fn build_forest(
    edges: &[HierarchyEdge],
    names: &HashMap<EmployeeId, String>,
) -> Vec<HierarchyNode> {
    let mut children: IndexMap<EmployeeId, Vec<EmployeeId>> = IndexMap::new();
    let mut juniors: HashSet<EmployeeId> = HashSet::with_capacity(edges.len());
    for edge in edges {
        children
            .entry(edge.senior)
            .or_insert_with(Vec::new)
            .push(edge.junior);
        children.entry(edge.junior).or_insert_with(Vec::new);
        juniors.insert(edge.junior);
    }

    let depth_limit = edges.len() + 1;
    children
        .keys()
        .filter(|id| !juniors.contains(*id))
        .map(|id| materialize(*id, &children, names, depth_limit))
        .collect()
}

fn materialize(
    id: EmployeeId,
    children: &IndexMap<EmployeeId, Vec<EmployeeId>>,
    names: &HashMap<EmployeeId, String>,
    depth_left: usize,
) -> HierarchyNode {
    let name = names
        .get(&id)
        .cloned()
        .unwrap_or_else(|| id.to_string());
    let child_nodes = if depth_left == 0 {
        Vec::new()
    } else {
        children
            .get(&id)
            .map(|ids| {
                ids.iter()
                    .map(|child| materialize(*child, children, names, depth_left - 1))
                    .collect()
            })
            .unwrap_or_default()
    };

    HierarchyNode {
        id,
        name,
        children: child_nodes,
    }
}
