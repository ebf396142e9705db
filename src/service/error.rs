use serde_json::json;
use thiserror::Error;

use crate::error::HttpError;

const PG_UNIQUE_VIOLATION: &str = "23505";
const PG_FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A required reference row is missing: operator misconfiguration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        ServiceError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some(PG_UNIQUE_VIOLATION) => {
                    return ServiceError::Conflict(format!(
                        "Duplicate value violates {}",
                        db_err.constraint().unwrap_or("a unique constraint")
                    ));
                }
                Some(PG_FOREIGN_KEY_VIOLATION) => {
                    return ServiceError::Validation(format!(
                        "Referenced record does not exist ({})",
                        db_err.constraint().unwrap_or("foreign key")
                    ));
                }
                _ => {}
            }
        }
        ServiceError::Database(err)
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::NotFound { entity, ref id } => {
                let detail = json!({ "entity": entity, "id": id });
                HttpError::not_found(error.to_string()).with_detail(detail)
            }
            ServiceError::Conflict(_) => HttpError::conflict(error.to_string()),
            ServiceError::Forbidden(_) => HttpError::forbidden(error.to_string()),
            ServiceError::Validation(_) => HttpError::bad_request(error.to_string()),
            ServiceError::Configuration(_) | ServiceError::Database(_) => {
                HttpError::server_error(error.to_string())
            }
        }
    }
}
