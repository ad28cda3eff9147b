pub mod algorithms;
pub mod ancestry;
#[cfg(feature = "api")]
pub mod api;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod employees;
pub mod error;
pub mod models;
pub mod operations;
pub mod store;
pub mod validate;
pub mod walker;

pub mod prelude {
    pub use crate::algorithms::build_forest;
    pub use crate::ancestry::metadata_from_parent;
    #[cfg(feature = "api")]
    pub use crate::api::{AppError, HierarchyApp};
    #[cfg(feature = "sqlx")]
    pub use crate::db::{PgEdgeStore, PgEmployeeDirectory, create_hierarchy_tables};
    pub use crate::employees::{EmployeeDirectory, MemoryEmployeeDirectory};
    pub use crate::error::{ErrorDetails, ErrorKind, InvalidLink, LibError, Result};
    pub use crate::models::{
        AncestryMetadata, BulkCreatePayload, CreateRelationshipPayload, EdgeId, EmployeeId,
        HierarchyEdge, HierarchyNode, LinkViolation, NewEdge, NewRelationship, OwnerId,
        RelationKind,
    };
    pub use crate::operations::{
        HierarchyOperation, HierarchyOperationResult, HierarchyOperations,
    };
    pub use crate::store::{EdgeStore, MemoryEdgeStore};
    pub use crate::validate::{ensure_valid_link, link_violation};
    pub use crate::walker::{AncestorWalker, ancestors_of};
}
