use std::collections::HashSet;
use std::sync::Arc;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::algorithms;
use crate::ancestry;
use crate::employees::EmployeeDirectory;
use crate::error::{ErrorDetails, InvalidLink, LibError, Result};
use crate::models::{
    BulkCreatePayload, CreateRelationshipPayload, EdgeId, EmployeeId, HierarchyEdge,
    HierarchyNode, NewEdge, OwnerId,
};
use crate::store::EdgeStore;
use crate::validate;
use crate::walker;

/// High-level hierarchy actions.
///
/// Callers must provide a trusted `owner` sourced from validated
/// auth/session state, not from request payloads.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum HierarchyOperation {
    Create {
        payload: CreateRelationshipPayload,
    },
    BulkCreate {
        payload: BulkCreatePayload,
    },
    FullHierarchy,
    DirectReports {
        employee_id: EmployeeId,
    },
    ManagementChain {
        employee_id: EmployeeId,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum HierarchyOperationResult {
    Edge {
        edge: HierarchyEdge,
    },
    Created {
        edges: Vec<HierarchyEdge>,
        count: usize,
    },
    Forest {
        roots: Vec<HierarchyNode>,
    },
    Edges {
        edges: Vec<HierarchyEdge>,
    },
}

pub struct HierarchyOperations<S, D> {
    store: Arc<S>,
    directory: Arc<D>,
}

impl<S, D> Clone for HierarchyOperations<S, D> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            directory: Arc::clone(&self.directory),
        }
    }
}

impl<S, D> HierarchyOperations<S, D>
where
    S: EdgeStore,
    D: EmployeeDirectory,
{
    pub fn new(store: Arc<S>, directory: Arc<D>) -> Self {
        Self { store, directory }
    }

    pub fn store(&self) -> Arc<S> {
        Arc::clone(&self.store)
    }

    pub fn directory(&self) -> Arc<D> {
        Arc::clone(&self.directory)
    }

    pub async fn execute(
        &self,
        owner: OwnerId,
        operation: HierarchyOperation,
    ) -> Result<HierarchyOperationResult> {
        match operation {
            HierarchyOperation::Create { payload } => {
                let edge = self.create_relationship(owner, payload).await?;
                Ok(HierarchyOperationResult::Edge { edge })
            }
            HierarchyOperation::BulkCreate { payload } => {
                let edges = self.bulk_create(owner, payload).await?;
                let count = edges.len();
                Ok(HierarchyOperationResult::Created { edges, count })
            }
            HierarchyOperation::FullHierarchy => {
                let roots = self.full_hierarchy(owner).await?;
                Ok(HierarchyOperationResult::Forest { roots })
            }
            HierarchyOperation::DirectReports { employee_id } => {
                let edges = self.direct_reports(owner, employee_id).await?;
                Ok(HierarchyOperationResult::Edges { edges })
            }
            HierarchyOperation::ManagementChain { employee_id } => {
                let edges = self.management_chain(owner, employee_id).await?;
                Ok(HierarchyOperationResult::Edges { edges })
            }
        }
    }

    pub async fn create_relationship(
        &self,
        owner: OwnerId,
        payload: CreateRelationshipPayload,
    ) -> Result<HierarchyEdge> {
        let candidate = payload.normalize(owner)?;
        validate::ensure_valid_link(
            self.store.as_ref(),
            self.directory.as_ref(),
            owner,
            candidate,
        )
        .await?;

        let ancestry = ancestry::derive(self.store.as_ref(), owner, candidate.senior).await?;
        self.store
            .insert(NewEdge {
                owner,
                senior: candidate.senior,
                junior: candidate.junior,
                relation: candidate.relation,
                ancestry,
            })
            .await
    }

    /// All-or-nothing batch create. Every candidate is validated
    /// against the store state as it existed before the batch; a batch
    /// whose members are only jointly cyclic passes this pass. Any
    /// rejected candidate rejects the whole batch with nothing written.
    /// Writes are sequential, so later candidates derive their ancestry
    /// from edges written earlier in the same batch; a write failure
    /// mid-batch reports the edges already committed.
    pub async fn bulk_create(
        &self,
        owner: OwnerId,
        payload: BulkCreatePayload,
    ) -> Result<Vec<HierarchyEdge>> {
        let mut invalid = Vec::new();
        let mut accepted = Vec::new();
        for (index, link) in payload.links.iter().enumerate() {
            let candidate = match link.candidate() {
                Ok(candidate) => candidate,
                Err(violation) => {
                    invalid.push(InvalidLink {
                        index,
                        senior_id: link.senior_id,
                        junior_id: link.junior_id,
                        reason: violation.public_message().to_string(),
                    });
                    continue;
                }
            };

            match validate::link_violation(
                self.store.as_ref(),
                self.directory.as_ref(),
                owner,
                candidate,
            )
            .await?
            {
                Some(violation) => invalid.push(InvalidLink {
                    index,
                    senior_id: Some(candidate.senior),
                    junior_id: Some(candidate.junior),
                    reason: violation.public_message().to_string(),
                }),
                None => accepted.push(candidate),
            }
        }

        if !invalid.is_empty() {
            tracing::warn!(
                owner = %owner,
                rejected = invalid.len(),
                total = payload.links.len(),
                "bulk relationship create rejected"
            );
            return Err(LibError::invalid_links(
                invalid,
                anyhow!("bulk create for owner {} had invalid candidates", owner),
            ));
        }

        let mut created: Vec<HierarchyEdge> = Vec::with_capacity(accepted.len());
        for candidate in accepted {
            let outcome = match ancestry::derive(self.store.as_ref(), owner, candidate.senior)
                .await
            {
                Ok(ancestry) => {
                    self.store
                        .insert(NewEdge {
                            owner,
                            senior: candidate.senior,
                            junior: candidate.junior,
                            relation: candidate.relation,
                            ancestry,
                        })
                        .await
                }
                Err(err) => Err(err),
            };

            match outcome {
                Ok(edge) => created.push(edge),
                Err(err) => {
                    let committed: Vec<EdgeId> = created.iter().map(|edge| edge.id).collect();
                    tracing::warn!(
                        owner = %owner,
                        committed = committed.len(),
                        "bulk relationship create failed mid-batch"
                    );
                    return Err(LibError::database_with_details(
                        "Bulk create failed after writing part of the batch",
                        ErrorDetails::PartialBulkWrite { committed },
                        err.source,
                    ));
                }
            }
        }

        Ok(created)
    }

    pub async fn full_hierarchy(&self, owner: OwnerId) -> Result<Vec<HierarchyNode>> {
        let edges = self.store.all_for_owner(owner).await?;

        let mut seen = HashSet::with_capacity(edges.len() * 2);
        let mut ids = Vec::with_capacity(edges.len() * 2);
        for edge in &edges {
            if seen.insert(edge.senior) {
                ids.push(edge.senior);
            }
            if seen.insert(edge.junior) {
                ids.push(edge.junior);
            }
        }
        let names = self.directory.display_names(owner, &ids).await?;

        Ok(algorithms::build_forest(&edges, &names))
    }

    pub async fn direct_reports(
        &self,
        owner: OwnerId,
        employee_id: EmployeeId,
    ) -> Result<Vec<HierarchyEdge>> {
        self.store.find_by_senior(owner, employee_id).await
    }

    pub async fn management_chain(
        &self,
        owner: OwnerId,
        employee_id: EmployeeId,
    ) -> Result<Vec<HierarchyEdge>> {
        walker::ancestors_of(self.store.as_ref(), owner, employee_id).await
    }
}
