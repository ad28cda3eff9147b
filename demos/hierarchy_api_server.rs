use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use uuid::Uuid;

use org_hierarchy::prelude::*;

#[derive(Clone)]
struct DemoApp {
    store: Arc<MemoryEdgeStore>,
    directory: Arc<MemoryEmployeeDirectory>,
    default_owner: OwnerId,
    require_owner_header: bool,
}

impl HierarchyApp for DemoApp {
    type Store = MemoryEdgeStore;
    type Directory = MemoryEmployeeDirectory;

    fn hierarchy(&self) -> HierarchyOperations<MemoryEdgeStore, MemoryEmployeeDirectory> {
        HierarchyOperations::new(Arc::clone(&self.store), Arc::clone(&self.directory))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let bind = env::var("HIERARCHY_DEMO_BIND").unwrap_or_else(|_| "127.0.0.1:4020".to_string());
    let bind_addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid HIERARCHY_DEMO_BIND '{}'", bind))?;

    let default_owner = env::var("HIERARCHY_DEMO_DEFAULT_OWNER_ID")
        .unwrap_or_else(|_| "00000000-0000-0000-0000-000000000001".to_string());
    let default_owner = Uuid::parse_str(&default_owner)
        .map(OwnerId)
        .with_context(|| {
            format!("invalid HIERARCHY_DEMO_DEFAULT_OWNER_ID '{}'", default_owner)
        })?;

    let app_state = DemoApp {
        store: Arc::new(MemoryEdgeStore::new()),
        directory: Arc::new(MemoryEmployeeDirectory::new()),
        default_owner,
        require_owner_header: env_flag("HIERARCHY_DEMO_REQUIRE_OWNER_HEADER"),
    };

    seed_demo_org(&app_state).await?;

    let api_v1 = Router::new()
        .route("/healthz", get(health_handler))
        .merge(org_hierarchy::api::routes::<DemoApp>());

    let app = Router::new()
        .nest("/api/v1", api_v1)
        .layer(from_fn_with_state(app_state.clone(), owner_header_middleware))
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind listener on {}", bind_addr))?;

    println!(
        "org_hierarchy demo server listening on http://{}",
        bind_addr
    );
    println!("api base path: /api/v1");
    println!("tenant shim header: x-owner-id");
    println!("set HIERARCHY_DEMO_REQUIRE_OWNER_HEADER=true to require x-owner-id");

    axum::serve(listener, app)
        .await
        .context("demo server failed")
}

async fn seed_demo_org(app: &DemoApp) -> anyhow::Result<()> {
    let owner = app.default_owner;
    let people = [
        ("Avery Chen", "head of engineering"),
        ("Sam Okafor", "platform lead"),
        ("Riley Das", "platform engineer"),
        ("Jordan Silva", "product lead"),
    ];

    let mut ids = Vec::new();
    for (name, role) in people {
        let id = EmployeeId(Uuid::new_v4());
        app.directory.insert(owner, id, name);
        println!("seeded employee {} ({}): {}", name, role, id);
        ids.push(id);
    }

    let ops = app.hierarchy();
    for (senior, junior) in [(ids[0], ids[1]), (ids[1], ids[2]), (ids[0], ids[3])] {
        ops.create_relationship(
            owner,
            CreateRelationshipPayload {
                senior_id: Some(senior),
                junior_id: Some(junior),
                relation: None,
            },
        )
        .await
        .map_err(|err| anyhow::anyhow!("failed to seed relationship: {}", err.source))?;
    }

    Ok(())
}

fn env_flag(name: &str) -> bool {
    match env::var(name) {
        Ok(value) => {
            let normalized = value.trim().to_ascii_lowercase();
            normalized == "1" || normalized == "true" || normalized == "yes"
        }
        Err(_) => false,
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "ok": true
    }))
}

async fn owner_header_middleware(
    State(app): State<DemoApp>,
    mut req: Request,
    next: Next,
) -> Response {
    let owner = match parse_owner_id(req.headers(), &app) {
        Ok(owner) => owner,
        Err(response) => return response,
    };

    req.extensions_mut().insert(owner);
    next.run(req).await
}

fn parse_owner_id(headers: &HeaderMap, app: &DemoApp) -> Result<OwnerId, Response> {
    let Some(raw_owner_id) = header_value(headers, "x-owner-id") else {
        if app.require_owner_header {
            return Err(json_error(
                StatusCode::UNAUTHORIZED,
                "missing_owner_id",
                "x-owner-id header is required",
            ));
        }
        return Ok(app.default_owner);
    };

    Uuid::parse_str(raw_owner_id).map(OwnerId).map_err(|_| {
        json_error(
            StatusCode::BAD_REQUEST,
            "invalid_owner_id",
            "invalid UUID",
        )
    })
}

fn header_value<'a>(headers: &'a HeaderMap, key: &str) -> Option<&'a str> {
    headers.get(key).and_then(|value| value.to_str().ok())
}

fn json_error(status: StatusCode, code: &'static str, message: &str) -> Response {
    (
        status,
        Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        })),
    )
        .into_response()
}
