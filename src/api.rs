use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::employees::EmployeeDirectory;
use crate::error::{ErrorKind, LibError};
use crate::models::{
    BulkCreatePayload, CreateRelationshipPayload, EmployeeId, HierarchyEdge, OwnerId,
};
use crate::operations::HierarchyOperations;
use crate::store::EdgeStore;

#[derive(Debug)]
pub struct AppError(pub LibError);

impl From<LibError> for AppError {
    fn from(value: LibError) -> Self {
        Self(value)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0.kind {
            ErrorKind::Database => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        };

        tracing::error!(kind = ?self.0.kind, error = %self.0.source, "hierarchy api request failed");

        let mut error = json!({
            "code": self.0.code,
            "message": self.0.public
        });
        if let Some(details) = &self.0.details {
            error["details"] = serde_json::to_value(details).unwrap_or(Value::Null);
        }
        (status, Json(json!({ "error": error }))).into_response()
    }
}

/// Host applications expose the hierarchy service through this trait.
///
/// The `OwnerId` request extension consumed by every handler must be
/// installed by the host's auth middleware from validated session
/// state.
pub trait HierarchyApp: Send + Sync {
    type Store: EdgeStore + 'static;
    type Directory: EmployeeDirectory + 'static;

    fn hierarchy(&self) -> HierarchyOperations<Self::Store, Self::Directory>;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct BulkCreateResponse {
    created: Vec<HierarchyEdge>,
    count: usize,
}

async fn create_relationship_handler<S>(
    State(app): State<S>,
    Extension(owner): Extension<OwnerId>,
    Json(payload): Json<CreateRelationshipPayload>,
) -> Result<impl IntoResponse, AppError>
where
    S: HierarchyApp + Clone + Send + Sync + 'static,
{
    let edge = app.hierarchy().create_relationship(owner, payload).await?;
    Ok((StatusCode::CREATED, Json(edge)))
}

async fn bulk_create_handler<S>(
    State(app): State<S>,
    Extension(owner): Extension<OwnerId>,
    Json(payload): Json<BulkCreatePayload>,
) -> Result<impl IntoResponse, AppError>
where
    S: HierarchyApp + Clone + Send + Sync + 'static,
{
    let created = app.hierarchy().bulk_create(owner, payload).await?;
    let count = created.len();
    Ok((
        StatusCode::CREATED,
        Json(BulkCreateResponse { created, count }),
    ))
}

async fn full_hierarchy_handler<S>(
    State(app): State<S>,
    Extension(owner): Extension<OwnerId>,
) -> Result<impl IntoResponse, AppError>
where
    S: HierarchyApp + Clone + Send + Sync + 'static,
{
    let roots = app.hierarchy().full_hierarchy(owner).await?;
    Ok(Json(roots))
}

async fn direct_reports_handler<S>(
    State(app): State<S>,
    Extension(owner): Extension<OwnerId>,
    Path(employee_id): Path<EmployeeId>,
) -> Result<impl IntoResponse, AppError>
where
    S: HierarchyApp + Clone + Send + Sync + 'static,
{
    let edges = app.hierarchy().direct_reports(owner, employee_id).await?;
    Ok(Json(edges))
}

async fn management_chain_handler<S>(
    State(app): State<S>,
    Extension(owner): Extension<OwnerId>,
    Path(employee_id): Path<EmployeeId>,
) -> Result<impl IntoResponse, AppError>
where
    S: HierarchyApp + Clone + Send + Sync + 'static,
{
    let edges = app.hierarchy().management_chain(owner, employee_id).await?;
    Ok(Json(edges))
}

pub fn routes<S>() -> Router<S>
where
    S: HierarchyApp + Clone + Send + Sync + 'static,
{
    tracing::info!("Registering route /hierarchy [GET,POST]");
    tracing::info!("Registering route /hierarchy/bulk [POST]");
    tracing::info!("Registering route /hierarchy/{{employee_id}}/reports [GET]");
    tracing::info!("Registering route /hierarchy/{{employee_id}}/chain [GET]");

    Router::new()
        .route(
            "/hierarchy",
            get(full_hierarchy_handler::<S>).post(create_relationship_handler::<S>),
        )
        .route("/hierarchy/bulk", post(bulk_create_handler::<S>))
        .route(
            "/hierarchy/{employee_id}/reports",
            get(direct_reports_handler::<S>),
        )
        .route(
            "/hierarchy/{employee_id}/chain",
            get(management_chain_handler::<S>),
        )
}
