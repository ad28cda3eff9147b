use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LibError, Result};

/// Tenant identifier. Every graph operation is scoped to one owner;
/// edges from different owners never mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct OwnerId(pub Uuid);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OwnerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self)
    }
}

impl From<Uuid> for OwnerId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct EmployeeId(pub Uuid);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EmployeeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self)
    }
}

impl From<Uuid> for EmployeeId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct EdgeId(pub Uuid);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EdgeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self)
    }
}

impl From<Uuid> for EdgeId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// Display label for a reporting relationship. Carries no structural
/// meaning; the graph treats every kind identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RelationKind {
    #[default]
    Manager,
    #[serde(rename = "Team Lead")]
    TeamLead,
    Mentor,
    Other,
}

impl RelationKind {
    pub const fn as_db_value(self) -> &'static str {
        match self {
            RelationKind::Manager => "Manager",
            RelationKind::TeamLead => "Team Lead",
            RelationKind::Mentor => "Mentor",
            RelationKind::Other => "Other",
        }
    }

    pub fn from_db_value(value: &str) -> Option<Self> {
        match value {
            "Manager" => Some(RelationKind::Manager),
            "Team Lead" => Some(RelationKind::TeamLead),
            "Mentor" => Some(RelationKind::Mentor),
            "Other" => Some(RelationKind::Other),
            _ => None,
        }
    }
}

/// A stored senior→junior reporting edge with its derived ancestry
/// metadata.
///
/// `hierarchy_level`, `path`, and `root_manager` reflect the senior's
/// ancestor chain as it existed when the edge was created; they are not
/// recomputed when the graph above the senior changes later.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyEdge {
    pub id: EdgeId,
    pub owner: OwnerId,
    pub senior: EmployeeId,
    pub junior: EmployeeId,
    pub relation: RelationKind,
    pub hierarchy_level: i32,
    pub path: String,
    pub root_manager: EmployeeId,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Derived ancestry values for a new edge's senior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AncestryMetadata {
    pub hierarchy_level: i32,
    pub path: String,
    pub root_manager: EmployeeId,
}

/// A validated, derived edge ready to persist. The store assigns the
/// id and timestamps.
#[derive(Debug, Clone)]
pub struct NewEdge {
    pub owner: OwnerId,
    pub senior: EmployeeId,
    pub junior: EmployeeId,
    pub relation: RelationKind,
    pub ancestry: AncestryMetadata,
}

/// Why a candidate relationship was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkViolation {
    MissingFields,
    EmployeeNotFound,
    SelfLink,
    DuplicateEdge,
    Cycle,
}

impl LinkViolation {
    pub const fn error_code(self) -> &'static str {
        match self {
            LinkViolation::MissingFields => "missing_fields",
            LinkViolation::EmployeeNotFound => "not_found",
            LinkViolation::SelfLink => "self_link",
            LinkViolation::DuplicateEdge => "duplicate_relationship",
            LinkViolation::Cycle => "cycle_detected",
        }
    }

    pub const fn public_message(self) -> &'static str {
        match self {
            LinkViolation::MissingFields => "Both seniorId and juniorId are required",
            LinkViolation::EmployeeNotFound => "One or both employees not found",
            LinkViolation::SelfLink => "Cannot create a relationship with self",
            LinkViolation::DuplicateEdge => "Relationship already exists",
            LinkViolation::Cycle => "This relationship would create a circular reference",
        }
    }

    pub fn into_error(
        self,
        owner: OwnerId,
        senior: Option<EmployeeId>,
        junior: Option<EmployeeId>,
    ) -> LibError {
        let source = anyhow!(
            "relationship {:?} -> {:?} rejected for owner {}: {:?}",
            senior,
            junior,
            owner,
            self
        );
        match self {
            LinkViolation::EmployeeNotFound => {
                LibError::not_found(self.public_message(), source)
            }
            _ => LibError::invalid_with_code(self.error_code(), self.public_message(), source),
        }
    }
}

/// Client payload for a single relationship create.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRelationshipPayload {
    pub senior_id: Option<EmployeeId>,
    pub junior_id: Option<EmployeeId>,
    pub relation: Option<RelationKind>,
}

/// A candidate with both endpoints present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewRelationship {
    pub senior: EmployeeId,
    pub junior: EmployeeId,
    pub relation: RelationKind,
}

impl CreateRelationshipPayload {
    /// Endpoint presence check shared by the single and bulk paths.
    /// The nil UUID counts as missing.
    pub fn candidate(&self) -> std::result::Result<NewRelationship, LinkViolation> {
        let senior = self.senior_id.filter(|id| !id.0.is_nil());
        let junior = self.junior_id.filter(|id| !id.0.is_nil());
        match (senior, junior) {
            (Some(senior), Some(junior)) => Ok(NewRelationship {
                senior,
                junior,
                relation: self.relation.unwrap_or_default(),
            }),
            _ => Err(LinkViolation::MissingFields),
        }
    }

    pub fn normalize(&self, owner: OwnerId) -> Result<NewRelationship> {
        self.candidate()
            .map_err(|violation| violation.into_error(owner, self.senior_id, self.junior_id))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreatePayload {
    pub links: Vec<CreateRelationshipPayload>,
}

/// One tree of the full-hierarchy forest.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyNode {
    pub id: EmployeeId,
    pub name: String,
    pub children: Vec<HierarchyNode>,
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{
        CreateRelationshipPayload, EmployeeId, LinkViolation, OwnerId, RelationKind,
    };
    use crate::error::ErrorKind;

    #[test]
    fn relation_labels_round_trip() {
        for kind in [
            RelationKind::Manager,
            RelationKind::TeamLead,
            RelationKind::Mentor,
            RelationKind::Other,
        ] {
            assert_eq!(RelationKind::from_db_value(kind.as_db_value()), Some(kind));
        }
        assert_eq!(RelationKind::from_db_value("Supervisor"), None);
    }

    #[test]
    fn relation_serde_uses_display_labels() {
        let json = serde_json::to_string(&RelationKind::TeamLead).expect("serialize");
        assert_eq!(json, "\"Team Lead\"");
        let parsed: RelationKind = serde_json::from_str("\"Manager\"").expect("deserialize");
        assert_eq!(parsed, RelationKind::Manager);
    }

    #[test]
    fn candidate_defaults_relation_to_manager() {
        let payload = CreateRelationshipPayload {
            senior_id: Some(EmployeeId(Uuid::new_v4())),
            junior_id: Some(EmployeeId(Uuid::new_v4())),
            relation: None,
        };
        let candidate = payload.candidate().expect("both endpoints present");
        assert_eq!(candidate.relation, RelationKind::Manager);
    }

    #[test]
    fn candidate_rejects_missing_junior() {
        let payload = CreateRelationshipPayload {
            senior_id: Some(EmployeeId(Uuid::new_v4())),
            junior_id: None,
            relation: None,
        };
        assert_eq!(payload.candidate(), Err(LinkViolation::MissingFields));
    }

    #[test]
    fn candidate_treats_nil_uuid_as_missing() {
        let payload = CreateRelationshipPayload {
            senior_id: Some(EmployeeId(Uuid::nil())),
            junior_id: Some(EmployeeId(Uuid::new_v4())),
            relation: None,
        };
        assert_eq!(payload.candidate(), Err(LinkViolation::MissingFields));
    }

    #[test]
    fn normalize_reports_missing_fields_code() {
        let payload = CreateRelationshipPayload {
            senior_id: None,
            junior_id: None,
            relation: None,
        };
        let err = payload
            .normalize(OwnerId(Uuid::new_v4()))
            .expect_err("missing endpoints should fail");
        assert_eq!(err.code, "missing_fields");
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[test]
    fn not_found_violation_maps_to_not_found_kind() {
        let err = LinkViolation::EmployeeNotFound.into_error(
            OwnerId(Uuid::new_v4()),
            Some(EmployeeId(Uuid::new_v4())),
            Some(EmployeeId(Uuid::new_v4())),
        );
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
