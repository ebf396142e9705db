use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::Cookie;
use validator::Validate;

use crate::{
    dtos::{
        commondtos::ApiResponse,
        userdtos::{LoginTecnicoDto, RefreshTokenDto, TecnicoLoginResponseDto},
    },
    error::{ErrorMessage, HttpError},
    middleware::{auth, JWTAuthMiddeware},
    models::usermodel::TecnicoSimple,
    utils::{password, token},
    AppState,
};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/me", get(get_me).route_layer(middleware::from_fn(auth)))
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<LoginTecnicoDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let tecnico = app_state
        .store
        .get_tecnico_by_username(&body.username)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string()))?;

    let password_matched = password::compare(&body.password, &tecnico.hashed_password)
        .map_err(|_| HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string()))?;

    if !password_matched {
        tracing::warn!(username = %body.username, "login refused");
        return Err(HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string()));
    }

    tracing::info!(tecnico_id = tecnico.id, "technician logged in");

    issue_tokens(&app_state, tecnico.id)
}

/// Trades a refresh token for a new access and refresh pair.
pub async fn refresh(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RefreshTokenDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let tecnico_id = token::decode_refresh_token(
        body.refresh_token,
        app_state.env.jwt_secret.as_bytes(),
    )?
    .parse::<i32>()
    .map_err(|_| HttpError::unauthorized(ErrorMessage::InvalidToken.to_string()))?;

    let tecnico = app_state
        .store
        .get_tecnico(tecnico_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNoLongerExist.to_string()))?;

    issue_tokens(&app_state, tecnico.id)
}

fn issue_tokens(app_state: &AppState, tecnico_id: i32) -> Result<Response, HttpError> {
    let secret = app_state.env.jwt_secret.as_bytes();
    let subject = tecnico_id.to_string();

    let token = token::create_token(&subject, secret, app_state.env.jwt_maxage)
        .map_err(|e| HttpError::server_error(e.to_string()))?;
    let refresh_token =
        token::create_refresh_token(&subject, secret, app_state.env.jwt_refresh_maxage)
            .map_err(|e| HttpError::server_error(e.to_string()))?;

    let cookie = Cookie::build(("token", token.clone()))
        .path("/")
        .max_age(time::Duration::minutes(app_state.env.jwt_maxage))
        .http_only(true)
        .build();

    let cookie_value = cookie
        .to_string()
        .parse::<HeaderValue>()
        .map_err(|_| HttpError::server_error(ErrorMessage::ServerError.to_string()))?;

    let mut response = Json(TecnicoLoginResponseDto {
        status: "success".to_string(),
        token,
        refresh_token,
    })
    .into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie_value);

    Ok(response)
}

pub async fn get_me(
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(Json(ApiResponse::success(TecnicoSimple::from(&auth.tecnico))))
}
