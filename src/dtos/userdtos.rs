use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginTecnicoDto {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefreshTokenDto {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TecnicoLoginResponseDto {
    pub status: String,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTecnicoDto {
    #[validate(length(min = 3, max = 100, message = "Username must be between 3 and 100 characters"))]
    pub username: String,

    #[validate(email(message = "Email is invalid"))]
    pub email: String,

    #[validate(length(min = 8, max = 64, message = "Password must be between 8 and 64 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "Nome is required"))]
    pub nome: String,

    #[validate(length(min = 1, max = 100, message = "Cognome is required"))]
    pub cognome: String,

    #[validate(length(max = 50, message = "Telefono is too long"))]
    pub telefono: Option<String>,

    pub ruolo_id: i32,
}

/// Partial update; absent fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTecnicoDto {
    #[validate(email(message = "Email is invalid"))]
    pub email: Option<String>,

    #[validate(length(min = 8, max = 64, message = "Password must be between 8 and 64 characters"))]
    pub password: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Nome cannot be empty"))]
    pub nome: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Cognome cannot be empty"))]
    pub cognome: Option<String>,

    #[validate(length(max = 50, message = "Telefono is too long"))]
    pub telefono: Option<String>,

    pub ruolo_id: Option<i32>,

    pub attivo: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechnicianQuery {
    pub search: Option<String>,
    pub ruolo_id: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientQuery {
    pub search: Option<String>,
}
