use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::employees::EmployeeDirectory;
use crate::error::{LibError, Result};
use crate::models::{
    EdgeId, EmployeeId, HierarchyEdge, LinkViolation, NewEdge, OwnerId, RelationKind,
};
use crate::store::EdgeStore;

pub static MIGRATOR: Lazy<Migrator> = Lazy::new(|| {
    let mut migrator = sqlx::migrate!("./migrations");
    migrator.set_ignore_missing(true);
    migrator
});

pub async fn create_hierarchy_tables(pool: &PgPool) -> std::result::Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

#[derive(Debug, Clone, FromRow)]
struct EdgeRow {
    id: Uuid,
    owner: Uuid,
    senior: Uuid,
    junior: Uuid,
    relation: String,
    hierarchy_level: i32,
    path: String,
    root_manager: Uuid,
    created_at: chrono::NaiveDateTime,
    updated_at: chrono::NaiveDateTime,
}

impl TryFrom<EdgeRow> for HierarchyEdge {
    type Error = LibError;

    fn try_from(row: EdgeRow) -> Result<Self> {
        let relation = RelationKind::from_db_value(&row.relation).ok_or_else(|| {
            LibError::database(
                "Stored relation label is not recognized",
                anyhow!("relation '{}' on edge {}", row.relation, row.id),
            )
        })?;
        Ok(Self {
            id: EdgeId(row.id),
            owner: OwnerId(row.owner),
            senior: EmployeeId(row.senior),
            junior: EmployeeId(row.junior),
            relation,
            hierarchy_level: row.hierarchy_level,
            path: row.path,
            root_manager: EmployeeId(row.root_manager),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn db_err(public: &'static str, err: sqlx::Error) -> LibError {
    LibError::database(public, anyhow!(err))
}

fn hydrate_edges(rows: Vec<EdgeRow>) -> Result<Vec<HierarchyEdge>> {
    rows.into_iter().map(HierarchyEdge::try_from).collect()
}

/// Postgres-backed edge store over `hierarchy.edges`.
#[derive(Clone)]
pub struct PgEdgeStore {
    pool: Arc<PgPool>,
}

impl PgEdgeStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub fn from_pool(pool: &PgPool) -> Self {
        Self {
            pool: Arc::new(pool.clone()),
        }
    }

    pub fn pool(&self) -> Arc<PgPool> {
        Arc::clone(&self.pool)
    }
}

#[async_trait]
impl EdgeStore for PgEdgeStore {
    async fn exists(
        &self,
        owner: OwnerId,
        senior: EmployeeId,
        junior: EmployeeId,
    ) -> Result<bool> {
        let exists: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1
                FROM hierarchy.edges
                WHERE owner = $1
                  AND senior = $2
                  AND junior = $3
            )
            "#,
        )
        .bind(owner.0)
        .bind(senior.0)
        .bind(junior.0)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|err| db_err("Failed to query relationship", err))?;

        Ok(exists.0)
    }

    async fn insert(&self, edge: NewEdge) -> Result<HierarchyEdge> {
        let id = Uuid::new_v4();
        let row = sqlx::query_as::<_, EdgeRow>(
            r#"
            INSERT INTO hierarchy.edges (
                id,
                owner,
                senior,
                junior,
                relation,
                hierarchy_level,
                path,
                root_manager
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING
                id,
                owner,
                senior,
                junior,
                relation,
                hierarchy_level,
                path,
                root_manager,
                created_at,
                updated_at
            "#,
        )
        .bind(id)
        .bind(edge.owner.0)
        .bind(edge.senior.0)
        .bind(edge.junior.0)
        .bind(edge.relation.as_db_value())
        .bind(edge.ancestry.hierarchy_level)
        .bind(&edge.ancestry.path)
        .bind(edge.ancestry.root_manager.0)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                LibError::invalid_with_code(
                    LinkViolation::DuplicateEdge.error_code(),
                    LinkViolation::DuplicateEdge.public_message(),
                    anyhow!(
                        "edge {} -> {} already stored for owner {}",
                        edge.senior,
                        edge.junior,
                        edge.owner
                    ),
                )
            }
            _ => db_err("Failed to create relationship", err),
        })?;

        row.try_into()
    }

    async fn find_by_senior(
        &self,
        owner: OwnerId,
        senior: EmployeeId,
    ) -> Result<Vec<HierarchyEdge>> {
        let rows = sqlx::query_as::<_, EdgeRow>(
            r#"
            SELECT
                id,
                owner,
                senior,
                junior,
                relation,
                hierarchy_level,
                path,
                root_manager,
                created_at,
                updated_at
            FROM hierarchy.edges
            WHERE owner = $1
              AND senior = $2
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(owner.0)
        .bind(senior.0)
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(|err| db_err("Failed to query direct reports", err))?;

        hydrate_edges(rows)
    }

    async fn find_by_junior(
        &self,
        owner: OwnerId,
        junior: EmployeeId,
    ) -> Result<Vec<HierarchyEdge>> {
        let rows = sqlx::query_as::<_, EdgeRow>(
            r#"
            SELECT
                id,
                owner,
                senior,
                junior,
                relation,
                hierarchy_level,
                path,
                root_manager,
                created_at,
                updated_at
            FROM hierarchy.edges
            WHERE owner = $1
              AND junior = $2
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(owner.0)
        .bind(junior.0)
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(|err| db_err("Failed to query seniors", err))?;

        hydrate_edges(rows)
    }

    async fn edge_above(
        &self,
        owner: OwnerId,
        junior: EmployeeId,
    ) -> Result<Option<HierarchyEdge>> {
        let row = sqlx::query_as::<_, EdgeRow>(
            r#"
            SELECT
                id,
                owner,
                senior,
                junior,
                relation,
                hierarchy_level,
                path,
                root_manager,
                created_at,
                updated_at
            FROM hierarchy.edges
            WHERE owner = $1
              AND junior = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(owner.0)
        .bind(junior.0)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|err| db_err("Failed to query reporting edge", err))?;

        row.map(HierarchyEdge::try_from).transpose()
    }

    async fn all_for_owner(&self, owner: OwnerId) -> Result<Vec<HierarchyEdge>> {
        let rows = sqlx::query_as::<_, EdgeRow>(
            r#"
            SELECT
                id,
                owner,
                senior,
                junior,
                relation,
                hierarchy_level,
                path,
                root_manager,
                created_at,
                updated_at
            FROM hierarchy.edges
            WHERE owner = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(owner.0)
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(|err| db_err("Failed to query hierarchy", err))?;

        hydrate_edges(rows)
    }

    async fn count_for_owner(&self, owner: OwnerId) -> Result<usize> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)::bigint
            FROM hierarchy.edges
            WHERE owner = $1
            "#,
        )
        .bind(owner.0)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|err| db_err("Failed to count hierarchy edges", err))?;

        Ok(count.0 as usize)
    }
}

/// Directory over the employee collaborator's `hr.employees` table
/// (`id UUID, owner UUID, name TEXT`). This crate only ever reads it.
#[derive(Clone)]
pub struct PgEmployeeDirectory {
    pool: Arc<PgPool>,
}

impl PgEmployeeDirectory {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub fn from_pool(pool: &PgPool) -> Self {
        Self {
            pool: Arc::new(pool.clone()),
        }
    }
}

#[async_trait]
impl EmployeeDirectory for PgEmployeeDirectory {
    async fn exists(&self, owner: OwnerId, id: EmployeeId) -> Result<bool> {
        let exists: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1
                FROM hr.employees
                WHERE owner = $1
                  AND id = $2
            )
            "#,
        )
        .bind(owner.0)
        .bind(id.0)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|err| db_err("Failed to query employee", err))?;

        Ok(exists.0)
    }

    async fn display_names(
        &self,
        owner: OwnerId,
        ids: &[EmployeeId],
    ) -> Result<HashMap<EmployeeId, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let raw_ids: Vec<Uuid> = ids.iter().map(|id| id.0).collect();
        let rows: Vec<(Uuid, String)> = sqlx::query_as(
            r#"
            SELECT id, name
            FROM hr.employees
            WHERE owner = $1
              AND id = ANY($2)
            "#,
        )
        .bind(owner.0)
        .bind(&raw_ids)
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(|err| db_err("Failed to query employee names", err))?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| (EmployeeId(id), name))
            .collect())
    }
}
