use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    dtos::{
        commondtos::{ApiResponse, PageQuery, Paginated},
        interventiondtos::*,
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn interventions_handler() -> Router {
    Router::new()
        .route("/", get(get_interventions).post(create_intervention))
        .route(
            "/:id",
            get(get_intervention)
                .patch(update_intervention)
                .delete(delete_intervention),
        )
        .route("/:id/start", post(start_intervention))
        .route("/:id/complete", post(complete_intervention))
        .route("/:id/attivita", post(add_activity))
        .route("/:id/rows", get(get_rows))
        .route("/:id/rows/:row_id", patch(update_row).delete(delete_row))
        .route("/:id/sessions", get(get_sessions).post(add_session))
        .route(
            "/:id/sessions/:session_id",
            patch(update_session).delete(delete_session),
        )
}

pub async fn get_interventions(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(page): Query<PageQuery>,
    Query(query): Query<InterventionQuery>,
) -> Result<impl IntoResponse, HttpError> {
    page.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let service = &app_state.intervention_service;
    let (interventi, total) = service.list(query.into(), &page).await?;
    let items = service.responses(interventi).await?;

    Ok(Json(ApiResponse::success(Paginated::new(items, total, &page))))
}

/// Full detail: rows, sessions and computed totals.
pub async fn get_intervention(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let detail = app_state.intervention_service.detail(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

pub async fn create_intervention(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateInterventionDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let service = &app_state.intervention_service;
    let intervento = service.create(&auth.tecnico, body).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(service.response(intervento).await?)),
    ))
}

pub async fn update_intervention(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateInterventionDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let service = &app_state.intervention_service;
    let intervento = service.update(&auth.tecnico, id, body).await?;
    Ok(Json(ApiResponse::success(service.response(intervento).await?)))
}

pub async fn delete_intervention(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .intervention_service
        .delete(&auth.tecnico, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn start_intervention(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(id): Path<i32>,
    body: Option<Json<StartInterventionDto>>,
) -> Result<impl IntoResponse, HttpError> {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let service = &app_state.intervention_service;
    let intervento = service.start(&auth.tecnico, id, body).await?;
    Ok(Json(ApiResponse::success(service.response(intervento).await?)))
}

pub async fn complete_intervention(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(id): Path<i32>,
    Json(body): Json<CompleteInterventionDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let service = &app_state.intervention_service;
    let intervento = service.complete(&auth.tecnico, id, body).await?;
    Ok(Json(ApiResponse::success(service.response(intervento).await?)))
}

pub async fn add_activity(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(id): Path<i32>,
    Json(body): Json<AddActivityDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let riga = app_state
        .intervention_service
        .add_attivita(&auth.tecnico, id, body)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(RowResponseDto::from(riga))),
    ))
}

pub async fn get_rows(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let righe: Vec<RowResponseDto> = app_state
        .intervention_service
        .righe(id)
        .await?
        .into_iter()
        .map(RowResponseDto::from)
        .collect();
    Ok(Json(ApiResponse::success(righe)))
}

pub async fn update_row(
    Extension(app_state): Extension<Arc<AppState>>,
    Path((id, row_id)): Path<(i32, i32)>,
    Json(body): Json<UpdateRowDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let riga = app_state
        .intervention_service
        .update_riga(id, row_id, body)
        .await?;
    Ok(Json(ApiResponse::success(RowResponseDto::from(riga))))
}

pub async fn delete_row(
    Extension(app_state): Extension<Arc<AppState>>,
    Path((id, row_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .intervention_service
        .delete_riga(id, row_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_sessions(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let sessioni = app_state.intervention_service.sessioni(id).await?;
    Ok(Json(ApiResponse::success(sessioni)))
}

pub async fn add_session(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(id): Path<i32>,
    Json(body): Json<CreateSessionDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let sessione = app_state
        .intervention_service
        .add_sessione(&auth.tecnico, id, body)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(sessione))))
}

pub async fn update_session(
    Extension(app_state): Extension<Arc<AppState>>,
    Path((id, session_id)): Path<(i32, i32)>,
    Json(body): Json<UpdateSessionDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let sessione = app_state
        .intervention_service
        .update_sessione(id, session_id, body)
        .await?;
    Ok(Json(ApiResponse::success(sessione)))
}

pub async fn delete_session(
    Extension(app_state): Extension<Arc<AppState>>,
    Path((id, session_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .intervention_service
        .delete_sessione(id, session_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
