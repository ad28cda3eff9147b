use crate::employees::EmployeeDirectory;
use crate::error::Result;
use crate::models::{LinkViolation, NewRelationship, OwnerId};
use crate::store::EdgeStore;
use crate::walker::AncestorWalker;

/// Structural checks for a candidate edge, in order, short-circuiting
/// on the first failure: both employees exist, endpoints distinct, no
/// duplicate pair, no cycle. Read-only against the store.
///
/// The cycle check walks the senior's ancestor chain and rejects when
/// the junior already appears as an ancestor senior, i.e. the junior
/// already manages the senior transitively.
pub async fn link_violation<S, D>(
    store: &S,
    directory: &D,
    owner: OwnerId,
    candidate: NewRelationship,
) -> Result<Option<LinkViolation>>
where
    S: EdgeStore + ?Sized,
    D: EmployeeDirectory + ?Sized,
{
    if !directory.exists(owner, candidate.senior).await?
        || !directory.exists(owner, candidate.junior).await?
    {
        return Ok(Some(LinkViolation::EmployeeNotFound));
    }

    if candidate.senior == candidate.junior {
        return Ok(Some(LinkViolation::SelfLink));
    }

    if store
        .exists(owner, candidate.senior, candidate.junior)
        .await?
    {
        return Ok(Some(LinkViolation::DuplicateEdge));
    }

    let mut walker = AncestorWalker::new(store, owner, candidate.senior);
    while let Some(edge) = walker.next_edge().await? {
        if edge.senior == candidate.junior {
            return Ok(Some(LinkViolation::Cycle));
        }
    }

    Ok(None)
}

pub async fn ensure_valid_link<S, D>(
    store: &S,
    directory: &D,
    owner: OwnerId,
    candidate: NewRelationship,
) -> Result<()>
where
    S: EdgeStore + ?Sized,
    D: EmployeeDirectory + ?Sized,
{
    match link_violation(store, directory, owner, candidate).await? {
        Some(violation) => Err(violation.into_error(
            owner,
            Some(candidate.senior),
            Some(candidate.junior),
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::ancestry;
    use crate::employees::MemoryEmployeeDirectory;
    use crate::models::{EmployeeId, NewEdge, RelationKind};
    use crate::store::MemoryEdgeStore;

    struct Fixture {
        store: MemoryEdgeStore,
        directory: MemoryEmployeeDirectory,
        owner: OwnerId,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: MemoryEdgeStore::new(),
                directory: MemoryEmployeeDirectory::new(),
                owner: OwnerId(Uuid::new_v4()),
            }
        }

        fn employee(&self, name: &str) -> EmployeeId {
            let id = EmployeeId(Uuid::new_v4());
            self.directory.insert(self.owner, id, name);
            id
        }

        async fn link(&self, senior: EmployeeId, junior: EmployeeId) {
            let ancestry = ancestry::derive(&self.store, self.owner, senior)
                .await
                .expect("derive");
            self.store
                .insert(NewEdge {
                    owner: self.owner,
                    senior,
                    junior,
                    relation: RelationKind::Manager,
                    ancestry,
                })
                .await
                .expect("insert");
        }

        async fn check(&self, senior: EmployeeId, junior: EmployeeId) -> Option<LinkViolation> {
            link_violation(
                &self.store,
                &self.directory,
                self.owner,
                NewRelationship {
                    senior,
                    junior,
                    relation: RelationKind::Manager,
                },
            )
            .await
            .expect("validation should not fail")
        }
    }

    #[tokio::test]
    async fn accepts_a_fresh_pair() {
        let fixture = Fixture::new();
        let senior = fixture.employee("Ada");
        let junior = fixture.employee("Grace");
        assert_eq!(fixture.check(senior, junior).await, None);
    }

    #[tokio::test]
    async fn rejects_unknown_employees() {
        let fixture = Fixture::new();
        let known = fixture.employee("Ada");
        let unknown = EmployeeId(Uuid::new_v4());
        assert_eq!(
            fixture.check(known, unknown).await,
            Some(LinkViolation::EmployeeNotFound)
        );
        assert_eq!(
            fixture.check(unknown, known).await,
            Some(LinkViolation::EmployeeNotFound)
        );
    }

    #[tokio::test]
    async fn rejects_self_supervision() {
        let fixture = Fixture::new();
        let employee = fixture.employee("Ada");
        assert_eq!(
            fixture.check(employee, employee).await,
            Some(LinkViolation::SelfLink)
        );
    }

    #[tokio::test]
    async fn rejects_duplicate_pair() {
        let fixture = Fixture::new();
        let senior = fixture.employee("Ada");
        let junior = fixture.employee("Grace");
        fixture.link(senior, junior).await;
        assert_eq!(
            fixture.check(senior, junior).await,
            Some(LinkViolation::DuplicateEdge)
        );
    }

    #[tokio::test]
    async fn rejects_direct_reverse_edge() {
        let fixture = Fixture::new();
        let a = fixture.employee("A");
        let b = fixture.employee("B");
        fixture.link(a, b).await;
        assert_eq!(fixture.check(b, a).await, Some(LinkViolation::Cycle));
    }

    #[tokio::test]
    async fn rejects_cycle_through_chain_root() {
        // a manages b manages s; s -> a would close a loop even though
        // a only appears at the very top of s's chain.
        let fixture = Fixture::new();
        let a = fixture.employee("A");
        let b = fixture.employee("B");
        let s = fixture.employee("S");
        fixture.link(a, b).await;
        fixture.link(b, s).await;
        assert_eq!(fixture.check(s, a).await, Some(LinkViolation::Cycle));
    }

    #[tokio::test]
    async fn allows_second_senior_for_one_junior() {
        let fixture = Fixture::new();
        let a = fixture.employee("A");
        let b = fixture.employee("B");
        let shared = fixture.employee("Shared");
        fixture.link(a, shared).await;
        assert_eq!(fixture.check(b, shared).await, None);
    }

    #[tokio::test]
    async fn ensure_valid_link_maps_violation_to_error() {
        let fixture = Fixture::new();
        let employee = fixture.employee("Ada");
        let err = ensure_valid_link(
            &fixture.store,
            &fixture.directory,
            fixture.owner,
            NewRelationship {
                senior: employee,
                junior: employee,
                relation: RelationKind::Manager,
            },
        )
        .await
        .expect_err("self link should fail");
        assert_eq!(err.code, "self_link");
    }
}
