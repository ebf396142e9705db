// src/models/usermodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const RUOLO_ADMIN: &str = "ADMIN";

/// A technician, joined with the code of its role.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tecnico {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub nome: String,
    pub cognome: String,
    pub telefono: Option<String>,
    pub ruolo_id: i32,
    pub ruolo_codice: String,
    pub attivo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tecnico {
    pub fn nome_completo(&self) -> String {
        format!("{} {}", self.nome, self.cognome)
    }

    pub fn is_admin(&self) -> bool {
        self.ruolo_codice == RUOLO_ADMIN
    }
}

/// Insert shape; the password arrives already hashed.
#[derive(Debug, Clone)]
pub struct NewTecnico {
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub nome: String,
    pub cognome: String,
    pub telefono: Option<String>,
    pub ruolo_id: i32,
}

/// Public projection embedded in other responses.
#[derive(Debug, Clone, Serialize)]
pub struct TecnicoSimple {
    pub id: i32,
    pub username: String,
    pub nome_completo: String,
    pub email: String,
}

impl From<&Tecnico> for TecnicoSimple {
    fn from(tecnico: &Tecnico) -> Self {
        TecnicoSimple {
            id: tecnico.id,
            username: tecnico.username.clone(),
            nome_completo: tecnico.nome_completo(),
            email: tecnico.email.clone(),
        }
    }
}
