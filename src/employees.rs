use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{EmployeeId, OwnerId};

/// Read-only view of the employee collaborator. The graph engine never
/// mutates employee records; a missing id means "node does not exist".
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn exists(&self, owner: OwnerId, id: EmployeeId) -> Result<bool>;

    /// Display names for forest labeling. Ids without a known name are
    /// simply absent from the returned map.
    async fn display_names(
        &self,
        owner: OwnerId,
        ids: &[EmployeeId],
    ) -> Result<HashMap<EmployeeId, String>>;
}

/// In-process directory used by tests and the demo server.
#[derive(Debug, Default)]
pub struct MemoryEmployeeDirectory {
    names: RwLock<HashMap<(OwnerId, EmployeeId), String>>,
}

impl MemoryEmployeeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, owner: OwnerId, id: EmployeeId, name: impl Into<String>) {
        self.names
            .write()
            .expect("employee directory lock poisoned")
            .insert((owner, id), name.into());
    }
}

#[async_trait]
impl EmployeeDirectory for MemoryEmployeeDirectory {
    async fn exists(&self, owner: OwnerId, id: EmployeeId) -> Result<bool> {
        let names = self.names.read().expect("employee directory lock poisoned");
        Ok(names.contains_key(&(owner, id)))
    }

    async fn display_names(
        &self,
        owner: OwnerId,
        ids: &[EmployeeId],
    ) -> Result<HashMap<EmployeeId, String>> {
        let names = self.names.read().expect("employee directory lock poisoned");
        Ok(ids
            .iter()
            .filter_map(|id| names.get(&(owner, *id)).map(|name| (*id, name.clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[tokio::test]
    async fn directory_is_owner_scoped() {
        let directory = MemoryEmployeeDirectory::new();
        let tenant_a = OwnerId(Uuid::new_v4());
        let tenant_b = OwnerId(Uuid::new_v4());
        let employee = EmployeeId(Uuid::new_v4());
        directory.insert(tenant_a, employee, "Ada");

        assert!(directory.exists(tenant_a, employee).await.expect("lookup"));
        assert!(!directory.exists(tenant_b, employee).await.expect("lookup"));

        let names = directory
            .display_names(tenant_a, &[employee])
            .await
            .expect("names");
        assert_eq!(names.get(&employee).map(String::as_str), Some("Ada"));
    }
}
