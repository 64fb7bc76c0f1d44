//! Route wiring: one router per endpoint over `/{app}/{model}` plus common
//! health/version routes. The same models mounted under different endpoints
//! ("client", "manage", ...) resolve independent override surfaces.

use crate::handlers::action::{
    batch, cloudfunc, create, destroy, list, list_enhance, list_mine, partial_update,
    patch_enhance, retrieve, retrieve_enhance, retrieve_mine, update,
};
use crate::handlers::EndpointState;
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;

/// The full action surface for one endpoint. Nest it under the endpoint's
/// path prefix, e.g. `.nest("/client", endpoint_routes(state, "client"))`.
pub fn endpoint_routes(state: AppState, endpoint: &str) -> Router {
    let state = EndpointState::new(state, endpoint);
    Router::new()
        .route("/:app/:model", get(list).post(create))
        .route("/:app/:model/list", post(list_enhance))
        .route("/:app/:model/list/mine", post(list_mine))
        .route("/:app/:model/cloudfunc", post(cloudfunc))
        .route("/:app/:model/batch", post(batch))
        .route(
            "/:app/:model/:id",
            get(retrieve).put(update).patch(partial_update).delete(destroy),
        )
        .route("/:app/:model/:id/retrieve", post(retrieve_enhance))
        .route("/:app/:model/:id/retrieve/mine", post(retrieve_mine))
        .route("/:app/:model/:id/patch", put(patch_enhance))
        .with_state(state)
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Common routes (no state): GET /health, GET /version.
pub fn common_routes() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
}
