use std::sync::RwLock;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::{LibError, Result};
use crate::models::{EdgeId, EmployeeId, HierarchyEdge, LinkViolation, NewEdge, OwnerId};

/// Durable collection of senior→junior edges, partitioned by owner.
///
/// Implementations must enforce the `(owner, senior, junior)`
/// uniqueness constraint at write time even though the validator also
/// checks it; the constraint closes the race between check and write.
#[async_trait]
pub trait EdgeStore: Send + Sync {
    async fn exists(&self, owner: OwnerId, senior: EmployeeId, junior: EmployeeId)
        -> Result<bool>;

    /// Persist a derived edge, assigning its id and timestamps.
    async fn insert(&self, edge: NewEdge) -> Result<HierarchyEdge>;

    async fn find_by_senior(&self, owner: OwnerId, senior: EmployeeId)
        -> Result<Vec<HierarchyEdge>>;

    async fn find_by_junior(&self, owner: OwnerId, junior: EmployeeId)
        -> Result<Vec<HierarchyEdge>>;

    /// The most recently created edge whose junior is the given id,
    /// i.e. who this employee reports to.
    async fn edge_above(&self, owner: OwnerId, junior: EmployeeId)
        -> Result<Option<HierarchyEdge>>;

    async fn all_for_owner(&self, owner: OwnerId) -> Result<Vec<HierarchyEdge>>;

    async fn count_for_owner(&self, owner: OwnerId) -> Result<usize>;
}

/// In-process store used by tests, benches, and the demo server.
///
/// Keeps edges in insertion order, so "most recent" reads mean "last
/// inserted".
#[derive(Debug, Default)]
pub struct MemoryEdgeStore {
    edges: RwLock<Vec<HierarchyEdge>>,
}

impl MemoryEdgeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EdgeStore for MemoryEdgeStore {
    async fn exists(
        &self,
        owner: OwnerId,
        senior: EmployeeId,
        junior: EmployeeId,
    ) -> Result<bool> {
        let edges = self.edges.read().expect("edge store lock poisoned");
        Ok(edges
            .iter()
            .any(|edge| edge.owner == owner && edge.senior == senior && edge.junior == junior))
    }

    async fn insert(&self, edge: NewEdge) -> Result<HierarchyEdge> {
        let mut edges = self.edges.write().expect("edge store lock poisoned");
        let duplicate = edges.iter().any(|existing| {
            existing.owner == edge.owner
                && existing.senior == edge.senior
                && existing.junior == edge.junior
        });
        if duplicate {
            return Err(LibError::invalid_with_code(
                LinkViolation::DuplicateEdge.error_code(),
                LinkViolation::DuplicateEdge.public_message(),
                anyhow!(
                    "edge {} -> {} already stored for owner {}",
                    edge.senior,
                    edge.junior,
                    edge.owner
                ),
            ));
        }

        let now = Utc::now().naive_utc();
        let stored = HierarchyEdge {
            id: EdgeId(Uuid::new_v4()),
            owner: edge.owner,
            senior: edge.senior,
            junior: edge.junior,
            relation: edge.relation,
            hierarchy_level: edge.ancestry.hierarchy_level,
            path: edge.ancestry.path,
            root_manager: edge.ancestry.root_manager,
            created_at: now,
            updated_at: now,
        };
        edges.push(stored.clone());
        Ok(stored)
    }

    async fn find_by_senior(
        &self,
        owner: OwnerId,
        senior: EmployeeId,
    ) -> Result<Vec<HierarchyEdge>> {
        let edges = self.edges.read().expect("edge store lock poisoned");
        Ok(edges
            .iter()
            .filter(|edge| edge.owner == owner && edge.senior == senior)
            .cloned()
            .collect())
    }

    async fn find_by_junior(
        &self,
        owner: OwnerId,
        junior: EmployeeId,
    ) -> Result<Vec<HierarchyEdge>> {
        let edges = self.edges.read().expect("edge store lock poisoned");
        Ok(edges
            .iter()
            .filter(|edge| edge.owner == owner && edge.junior == junior)
            .cloned()
            .collect())
    }

    async fn edge_above(
        &self,
        owner: OwnerId,
        junior: EmployeeId,
    ) -> Result<Option<HierarchyEdge>> {
        let edges = self.edges.read().expect("edge store lock poisoned");
        Ok(edges
            .iter()
            .rev()
            .find(|edge| edge.owner == owner && edge.junior == junior)
            .cloned())
    }

    async fn all_for_owner(&self, owner: OwnerId) -> Result<Vec<HierarchyEdge>> {
        let edges = self.edges.read().expect("edge store lock poisoned");
        Ok(edges
            .iter()
            .filter(|edge| edge.owner == owner)
            .cloned()
            .collect())
    }

    async fn count_for_owner(&self, owner: OwnerId) -> Result<usize> {
        let edges = self.edges.read().expect("edge store lock poisoned");
        Ok(edges.iter().filter(|edge| edge.owner == owner).count())
    }
}
