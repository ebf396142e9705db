use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    dtos::{
        commondtos::{ApiResponse, PageQuery, Paginated},
        userdtos::ClientQuery,
    },
    error::HttpError,
    models::clientmodel::Cliente,
    service::error::ServiceError,
    AppState,
};

pub fn clients_handler() -> Router {
    Router::new()
        .route("/", get(get_clients))
        .route("/:id", get(get_client))
        .route("/:id/contracts", get(get_client_contracts))
        .route("/:id/sites", get(get_client_sites))
        .route("/:id/contacts", get(get_client_contacts))
        .route("/:id/stats", get(get_client_stats))
}

async fn find_cliente(app_state: &AppState, id: i32) -> Result<Cliente, ServiceError> {
    app_state
        .store
        .get_cliente(id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Cliente", id))
}

pub async fn get_clients(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(page): Query<PageQuery>,
    Query(query): Query<ClientQuery>,
) -> Result<impl IntoResponse, HttpError> {
    page.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let (items, total) = app_state
        .store
        .get_clienti(search, page.limit() as i64, page.offset())
        .await
        .map_err(ServiceError::from)?;

    Ok(Json(ApiResponse::success(Paginated::new(items, total, &page))))
}

pub async fn get_client(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let cliente = find_cliente(&app_state, id).await?;
    Ok(Json(ApiResponse::success(cliente)))
}

pub async fn get_client_contracts(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let cliente = find_cliente(&app_state, id).await?;
    let contratti = app_state
        .store
        .get_contratti(cliente.id)
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(ApiResponse::success(contratti)))
}

pub async fn get_client_sites(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let cliente = find_cliente(&app_state, id).await?;
    let sedi = app_state
        .store
        .get_sedi(cliente.id)
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(ApiResponse::success(sedi)))
}

pub async fn get_client_contacts(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let cliente = find_cliente(&app_state, id).await?;
    let referenti = app_state
        .store
        .get_referenti(cliente.id)
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(ApiResponse::success(referenti)))
}

pub async fn get_client_stats(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let cliente = find_cliente(&app_state, id).await?;
    let stats = app_state
        .store
        .get_cliente_stats(cliente.id)
        .await
        .map_err(ServiceError::from)?;
    Ok(Json(ApiResponse::success(stats)))
}
