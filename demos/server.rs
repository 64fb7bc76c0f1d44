//! Example server: a small school space over in-memory storage, mounted on
//! two endpoints ("client" and "manage") with a sample override.

use axum::Router;
use prism_sdk::meta::FieldType;
use prism_sdk::{
    common_routes, endpoint_routes, ActionHandler, AppError, AppState, DispatchContext,
    MemoryStorage, OverrideModule, OverrideRegistry, Scope, SpaceBuilder, SpaceConfig,
    StatementDecl, ViewSet,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tracing_subscriber::EnvFilter;

struct EnrollmentSummary;

#[async_trait::async_trait]
impl ActionHandler for EnrollmentSummary {
    async fn call(&self, ctx: &mut DispatchContext) -> Result<Value, AppError> {
        let students = ctx.storage().fetch_all(ctx.model(), &[]).await?;
        Ok(json!({"total": students.len()}))
    }
}

fn space_config() -> SpaceConfig {
    serde_json::from_value(json!({
        "identity_model": "auth.user",
        "apps": [
            {
                "label": "auth",
                "models": [
                    {"name": "User", "fields": [{"name": "username", "type": "string"}]}
                ]
            },
            {
                "label": "school",
                "models": [
                    {"name": "School", "fields": [
                        {"name": "name", "type": "string"},
                        {"name": "established_year", "type": "int"}
                    ]},
                    {"name": "Teacher",
                     "fields": [
                        {"name": "name", "type": "string"},
                        {"name": "subject", "type": "string"}
                     ],
                     "relations": [
                        {"name": "school", "kind": "many_to_one", "to": "school", "related_name": "teachers"}
                     ]},
                    {"name": "Student",
                     "fields": [
                        {"name": "name", "type": "string"},
                        {"name": "enrollment_date", "type": "date"}
                     ],
                     "validation": {"name": {"required": true, "max_length": 100}},
                     "relations": [
                        {"name": "school", "kind": "many_to_one", "to": "school"},
                        {"name": "teachers", "kind": "many_to_many", "to": "teacher"},
                        {"name": "owner", "kind": "many_to_one", "to": "auth.user"}
                     ]}
                ]
            }
        ]
    }))
    .expect("demo space config")
}

fn seed(storage: &MemoryStorage, registry: &prism_sdk::Registry) {
    let school = registry.model("school", "school").unwrap();
    let teacher = registry.model("school", "teacher").unwrap();
    let student = registry.model("school", "student").unwrap();
    let user = registry.model("auth", "user").unwrap();

    storage.seed(user, vec![json!({"id": 1, "username": "allen"})]);
    storage.seed(
        school,
        vec![json!({"id": 1, "name": "No.1 High", "established_year": 1950})],
    );
    storage.seed(
        teacher,
        vec![
            json!({"id": 1, "name": "Ms. Li", "subject": "math", "school_id": 1}),
            json!({"id": 2, "name": "Mr. Wang", "subject": "physics", "school_id": 1}),
        ],
    );
    storage.seed(
        student,
        vec![
            json!({"id": 1, "name": "allen", "enrollment_date": "2024-09-01",
                   "school_id": 1, "teachers_ids": [1, 2], "owner_id": 1}),
            json!({"id": 2, "name": "joe", "enrollment_date": "2024-09-01",
                   "school_id": 1, "teachers_ids": [1], "owner_id": null}),
        ],
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("prism_sdk=debug".parse()?))
        .init();

    let registry = Arc::new(
        SpaceBuilder::new(space_config())
            .computed("school.student", "display_name", "Display name", FieldType::String, |row| {
                let name = row.get("name").and_then(Value::as_str).unwrap_or("?");
                json!(format!("student:{name}"))
            })
            .build()?,
    );

    let overrides = OverrideRegistry::new().module(
        Scope::App,
        "school",
        OverrideModule::new()
            .viewset(
                "Student",
                "manage",
                ViewSet::new().action("cloudfunc_enrollment_summary", Arc::new(EnrollmentSummary)),
            )
            .statements(
                "Student",
                "client",
                StatementDecl::new().block(
                    "user_fill_config",
                    json!({"field": "owner_id", "action_enabled": {"create": true}}),
                ),
            ),
    );

    let storage = Arc::new(MemoryStorage::new());
    seed(&storage, &registry);

    let state = AppState::new(registry, Arc::new(overrides), storage);

    let app = Router::new()
        .merge(common_routes())
        .nest("/client", endpoint_routes(state.clone(), "client"))
        .nest("/manage", endpoint_routes(state, "manage"))
        .layer(RequestBodyLimitLayer::new(1024 * 1024));

    let listener = TcpListener::bind("0.0.0.0:3000").await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
