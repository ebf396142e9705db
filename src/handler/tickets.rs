use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    dtos::{
        commondtos::{ApiResponse, PageQuery, Paginated},
        ticketdtos::*,
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn tickets_handler() -> Router {
    Router::new()
        .route("/", get(get_tickets).post(create_ticket))
        .route(
            "/:id",
            get(get_ticket).patch(update_ticket).delete(delete_ticket),
        )
        .route("/:id/assign", post(assign_ticket))
        .route("/:id/take", post(take_ticket))
        .route("/:id/close", post(close_ticket))
        .route("/:id/create-intervention", post(create_intervention))
        .route("/:id/schedule-intervention", post(schedule_intervention))
        .route("/:id/notes", get(get_notes).post(add_note))
        .route("/:id/messages", get(get_messages).post(add_message))
        .route("/:id/history", get(get_history))
}

pub fn intervention_requests_handler() -> Router {
    Router::new().route("/", get(get_intervention_requests))
}

pub async fn get_tickets(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(page): Query<PageQuery>,
    Query(query): Query<TicketQuery>,
) -> Result<impl IntoResponse, HttpError> {
    page.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let service = &app_state.ticket_service;
    let (tickets, total) = service.list(query.into(), &page).await?;
    let items = service.responses(tickets).await?;

    Ok(Json(ApiResponse::success(Paginated::new(items, total, &page))))
}

pub async fn get_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let service = &app_state.ticket_service;
    let ticket = service.get(id).await?;
    Ok(Json(ApiResponse::success(service.response(ticket).await?)))
}

pub async fn create_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateTicketDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let service = &app_state.ticket_service;
    let ticket = service.create(&auth.tecnico, body).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(service.response(ticket).await?)),
    ))
}

pub async fn update_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateTicketDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let service = &app_state.ticket_service;
    let ticket = service.update(&auth.tecnico, id, body).await?;
    Ok(Json(ApiResponse::success(service.response(ticket).await?)))
}

pub async fn delete_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    app_state.ticket_service.delete(&auth.tecnico, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn assign_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(id): Path<i32>,
    Json(body): Json<AssignTicketDto>,
) -> Result<impl IntoResponse, HttpError> {
    let service = &app_state.ticket_service;
    let ticket = service.assign(&auth.tecnico, id, body.tecnico_id).await?;
    Ok(Json(ApiResponse::success(service.response(ticket).await?)))
}

pub async fn take_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let service = &app_state.ticket_service;
    let ticket = service.take(&auth.tecnico, id).await?;
    Ok(Json(ApiResponse::success(service.response(ticket).await?)))
}

pub async fn close_ticket(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(id): Path<i32>,
    Json(body): Json<CloseTicketDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let service = &app_state.ticket_service;
    let ticket = service.close(&auth.tecnico, id, body).await?;
    Ok(Json(ApiResponse::success(service.response(ticket).await?)))
}

pub async fn create_intervention(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let service = &app_state.ticket_service;
    let (ticket, intervento) = service.create_intervention(&auth.tecnico, id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(TicketInterventionResponseDto {
            ticket: service.response(ticket).await?,
            intervento: app_state.intervention_service.response(intervento).await?,
        })),
    ))
}

pub async fn schedule_intervention(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(id): Path<i32>,
    Json(body): Json<ScheduleInterventionDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let service = &app_state.ticket_service;
    let (ticket, richiesta) = service
        .schedule_intervention(&auth.tecnico, id, body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(TicketScheduleResponseDto {
            ticket: service.response(ticket).await?,
            richiesta,
        })),
    ))
}

pub async fn get_notes(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let note = app_state.ticket_service.notes(id).await?;
    Ok(Json(ApiResponse::success(note)))
}

pub async fn add_note(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(id): Path<i32>,
    Json(body): Json<TicketNoteDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let nota = app_state.ticket_service.add_note(&auth.tecnico, id, body).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(nota))))
}

pub async fn get_messages(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let messaggi = app_state.ticket_service.messages(id).await?;
    Ok(Json(ApiResponse::success(messaggi)))
}

pub async fn add_message(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(id): Path<i32>,
    Json(body): Json<TicketMessageDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let messaggio = app_state
        .ticket_service
        .add_message(&auth.tecnico, id, body)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(messaggio))))
}

pub async fn get_history(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, HttpError> {
    let storico = app_state.ticket_service.history(id).await?;
    Ok(Json(ApiResponse::success(storico)))
}

pub async fn get_intervention_requests(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(page): Query<PageQuery>,
    Query(query): Query<RichiestaQuery>,
) -> Result<impl IntoResponse, HttpError> {
    page.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (richieste, total) = app_state
        .ticket_service
        .list_richieste(query.stato, &page)
        .await?;

    Ok(Json(ApiResponse::success(Paginated::new(richieste, total, &page))))
}
