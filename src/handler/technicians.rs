use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    dtos::{
        commondtos::{ApiResponse, PageQuery, Paginated},
        userdtos::{CreateTecnicoDto, TechnicianQuery, UpdateTecnicoDto},
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn technicians_handler() -> Router {
    Router::new()
        .route("/", get(get_technicians).post(create_technician))
        .route(
            "/:id",
            get(get_technician)
                .put(update_technician)
                .delete(delete_technician),
        )
}

pub async fn get_technicians(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(page): Query<PageQuery>,
    Query(query): Query<TechnicianQuery>,
) -> Result<impl IntoResponse, HttpError> {
    page.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let (items, total) = app_state
        .technician_service
        .list(search, query.ruolo_id, &page)
        .await?;

    Ok(Json(ApiResponse::success(Paginated::new(items, total, &page))))
}

pub async fn get_technician(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let tecnico = app_state.technician_service.get(id).await?;
    Ok(Json(ApiResponse::success(tecnico)))
}

pub async fn create_technician(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateTecnicoDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let tecnico = app_state
        .technician_service
        .create(&auth.tecnico, body)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(tecnico))))
}

pub async fn update_technician(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateTecnicoDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let tecnico = app_state
        .technician_service
        .update(&auth.tecnico, id, body)
        .await?;

    Ok(Json(ApiResponse::success(tecnico)))
}

pub async fn delete_technician(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .technician_service
        .delete(&auth.tecnico, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
