use std::sync::Arc;

use axum::{response::IntoResponse, routing::get, Extension, Json, Router};
use serde::Serialize;

use crate::{dtos::commondtos::ApiResponse, error::HttpError, AppState};

pub fn lookup_handler() -> Router {
    Router::new()
        .route("/priorities", get(get_priorities))
        .route("/ticket-states", get(get_ticket_states))
        .route("/intervention-states", get(get_intervention_states))
        .route("/intervention-types", get(get_intervention_types))
        .route("/activity-categories", get(get_activity_categories))
        .route("/intervention-origins", get(get_intervention_origins))
        .route("/channels", get(get_channels))
        .route("/user-roles", get(get_user_roles))
}

// Served from the registry loaded at startup; only active rows are listed.
fn active<T: Serialize + Clone>(rows: &[T], attivo: impl Fn(&T) -> bool) -> Json<ApiResponse<Vec<T>>> {
    Json(ApiResponse::success(
        rows.iter().filter(|row| attivo(row)).cloned().collect(),
    ))
}

pub async fn get_priorities(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(active(&app_state.lookups.tables().priorita, |p| p.attivo))
}

pub async fn get_ticket_states(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(active(&app_state.lookups.tables().stati_ticket, |s| s.attivo))
}

pub async fn get_intervention_states(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(active(&app_state.lookups.tables().stati_intervento, |s| s.attivo))
}

pub async fn get_intervention_types(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(active(&app_state.lookups.tables().tipi_intervento, |t| t.attivo))
}

pub async fn get_activity_categories(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(active(&app_state.lookups.tables().categorie_attivita, |c| c.attivo))
}

pub async fn get_intervention_origins(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(active(&app_state.lookups.tables().origini_intervento, |o| o.attivo))
}

pub async fn get_channels(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(active(&app_state.lookups.tables().canali_richiesta, |c| c.attivo))
}

pub async fn get_user_roles(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(active(&app_state.lookups.tables().ruoli, |r| r.attivo))
}
