use crate::error::Result;
use crate::models::{AncestryMetadata, EmployeeId, HierarchyEdge, OwnerId};
use crate::store::EdgeStore;

/// Ancestry values for a new edge whose senior is `senior`, given the
/// edge the senior itself reports through (if any).
///
/// The rule trusts the parent edge's stored metadata instead of
/// recomputing the whole chain: one hop up, then extend. Metadata is
/// therefore a snapshot of the chain at creation time.
pub fn metadata_from_parent(
    senior: EmployeeId,
    parent: Option<&HierarchyEdge>,
) -> AncestryMetadata {
    match parent {
        Some(edge) => AncestryMetadata {
            hierarchy_level: edge.hierarchy_level + 1,
            path: if edge.path.is_empty() {
                senior.to_string()
            } else {
                format!("{}.{}", edge.path, senior)
            },
            root_manager: edge.root_manager,
        },
        None => AncestryMetadata {
            hierarchy_level: 1,
            path: senior.to_string(),
            root_manager: senior,
        },
    }
}

/// Look up who `senior` reports to and derive the metadata for an edge
/// acting as `senior`.
pub async fn derive<S: EdgeStore + ?Sized>(
    store: &S,
    owner: OwnerId,
    senior: EmployeeId,
) -> Result<AncestryMetadata> {
    let parent = store.edge_above(owner, senior).await?;
    Ok(metadata_from_parent(senior, parent.as_ref()))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;
    use crate::models::{EdgeId, RelationKind};

    fn stored_edge(
        owner: OwnerId,
        senior: EmployeeId,
        junior: EmployeeId,
        level: i32,
        path: &str,
        root: EmployeeId,
    ) -> HierarchyEdge {
        let at = NaiveDate::from_ymd_opt(2026, 1, 1)
            .expect("valid date")
            .and_hms_opt(0, 0, 0)
            .expect("valid datetime");
        HierarchyEdge {
            id: EdgeId(Uuid::new_v4()),
            owner,
            senior,
            junior,
            relation: RelationKind::Manager,
            hierarchy_level: level,
            path: path.to_string(),
            root_manager: root,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn senior_without_parent_is_its_own_root() {
        let senior = EmployeeId(Uuid::new_v4());
        let metadata = metadata_from_parent(senior, None);
        assert_eq!(metadata.hierarchy_level, 1);
        assert_eq!(metadata.path, senior.to_string());
        assert_eq!(metadata.root_manager, senior);
    }

    #[test]
    fn parent_edge_extends_level_path_and_root() {
        let owner = OwnerId(Uuid::new_v4());
        let root = EmployeeId(Uuid::new_v4());
        let senior = EmployeeId(Uuid::new_v4());
        let parent = stored_edge(owner, root, senior, 1, &root.to_string(), root);

        let metadata = metadata_from_parent(senior, Some(&parent));
        assert_eq!(metadata.hierarchy_level, 2);
        assert_eq!(metadata.path, format!("{}.{}", root, senior));
        assert_eq!(metadata.root_manager, root);
    }

    #[test]
    fn empty_parent_path_falls_back_to_senior_alone() {
        let owner = OwnerId(Uuid::new_v4());
        let root = EmployeeId(Uuid::new_v4());
        let senior = EmployeeId(Uuid::new_v4());
        let parent = stored_edge(owner, root, senior, 3, "", root);

        let metadata = metadata_from_parent(senior, Some(&parent));
        assert_eq!(metadata.hierarchy_level, 4);
        assert_eq!(metadata.path, senior.to_string());
    }

    #[tokio::test]
    async fn derive_reads_the_one_hop_parent() {
        use crate::models::NewEdge;
        use crate::store::MemoryEdgeStore;

        let store = MemoryEdgeStore::new();
        let owner = OwnerId(Uuid::new_v4());
        let root = EmployeeId(Uuid::new_v4());
        let middle = EmployeeId(Uuid::new_v4());
        store
            .insert(NewEdge {
                owner,
                senior: root,
                junior: middle,
                relation: RelationKind::Manager,
                ancestry: AncestryMetadata {
                    hierarchy_level: 1,
                    path: root.to_string(),
                    root_manager: root,
                },
            })
            .await
            .expect("insert");

        let metadata = derive(&store, owner, middle).await.expect("derive");
        assert_eq!(metadata.hierarchy_level, 2);
        assert_eq!(metadata.path, format!("{}.{}", root, middle));
        assert_eq!(metadata.root_manager, root);
    }
}
