use std::collections::{HashSet, VecDeque};

use crate::error::Result;
use crate::models::{EmployeeId, HierarchyEdge, OwnerId};
use crate::store::EdgeStore;

/// Upward walk over "who is this node's senior" edges.
///
/// Yields edges nearest-ancestor-first by advancing a breadth-first
/// frontier one hop per step. A walk over a DAG is finite; the step
/// bound of one more than the owner's edge count keeps a corrupted
/// (cyclic) store from looping forever. Restart by constructing a new
/// walker.
pub struct AncestorWalker<'a, S: ?Sized> {
    store: &'a S,
    owner: OwnerId,
    frontier: Vec<EmployeeId>,
    pending: VecDeque<HierarchyEdge>,
    steps_left: Option<usize>,
}

impl<'a, S: EdgeStore + ?Sized> AncestorWalker<'a, S> {
    pub fn new(store: &'a S, owner: OwnerId, start: EmployeeId) -> Self {
        Self {
            store,
            owner,
            frontier: vec![start],
            pending: VecDeque::new(),
            steps_left: None,
        }
    }

    pub async fn next_edge(&mut self) -> Result<Option<HierarchyEdge>> {
        loop {
            if let Some(edge) = self.pending.pop_front() {
                return Ok(Some(edge));
            }
            if self.frontier.is_empty() {
                return Ok(None);
            }

            let steps = match self.steps_left {
                Some(steps) => steps,
                None => {
                    let bound = self.store.count_for_owner(self.owner).await? + 1;
                    self.steps_left = Some(bound);
                    bound
                }
            };
            if steps == 0 {
                tracing::warn!(
                    owner = %self.owner,
                    "ancestor walk hit its step bound; stored edges form a cycle"
                );
                self.frontier.clear();
                return Ok(None);
            }
            self.steps_left = Some(steps - 1);

            let mut next = Vec::new();
            let mut seen = HashSet::new();
            for node in std::mem::take(&mut self.frontier) {
                for edge in self.store.find_by_junior(self.owner, node).await? {
                    if seen.insert(edge.senior) {
                        next.push(edge.senior);
                    }
                    self.pending.push_back(edge);
                }
            }
            self.frontier = next;
        }
    }

    pub async fn collect_chain(mut self) -> Result<Vec<HierarchyEdge>> {
        let mut chain = Vec::new();
        while let Some(edge) = self.next_edge().await? {
            chain.push(edge);
        }
        Ok(chain)
    }
}

/// Full upward chain for a node, nearest ancestor first.
pub async fn ancestors_of<S: EdgeStore + ?Sized>(
    store: &S,
    owner: OwnerId,
    node: EmployeeId,
) -> Result<Vec<HierarchyEdge>> {
    AncestorWalker::new(store, owner, node).collect_chain().await
}
