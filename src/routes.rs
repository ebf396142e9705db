// routes.rs
use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        auth::auth_handler,
        clients::clients_handler,
        interventions::interventions_handler,
        lookup::lookup_handler,
        technicians::technicians_handler,
        tickets::{intervention_requests_handler, tickets_handler},
    },
    middleware::auth,
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .nest("/auth", auth_handler())
        .nest("/lookup", lookup_handler().layer(middleware::from_fn(auth)))
        .nest(
            "/technicians",
            technicians_handler().layer(middleware::from_fn(auth)),
        )
        .nest("/clients", clients_handler().layer(middleware::from_fn(auth)))
        .nest("/tickets", tickets_handler().layer(middleware::from_fn(auth)))
        .nest(
            "/intervention-requests",
            intervention_requests_handler().layer(middleware::from_fn(auth)),
        )
        .nest(
            "/interventions",
            interventions_handler().layer(middleware::from_fn(auth)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
}
