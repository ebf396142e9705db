// src/service/technician_service.rs
use std::sync::Arc;

use crate::{
    db::db::HelpdeskStore,
    dtos::{
        commondtos::PageQuery,
        userdtos::{CreateTecnicoDto, UpdateTecnicoDto},
    },
    models::usermodel::{NewTecnico, Tecnico},
    service::{error::ServiceError, lookup_registry::LookupRegistry},
    utils::password,
};

const TECNICO: &str = "Tecnico";

/// Technician directory and account administration.
#[derive(Clone)]
pub struct TechnicianService {
    store: Arc<dyn HelpdeskStore>,
    lookups: Arc<LookupRegistry>,
}

impl TechnicianService {
    pub fn new(store: Arc<dyn HelpdeskStore>, lookups: Arc<LookupRegistry>) -> Self {
        Self { store, lookups }
    }

    pub async fn list(
        &self,
        search: Option<&str>,
        ruolo_id: Option<i32>,
        page: &PageQuery,
    ) -> Result<(Vec<Tecnico>, i64), ServiceError> {
        Ok(self
            .store
            .get_tecnici(search, ruolo_id, page.limit() as i64, page.offset())
            .await?)
    }

    pub async fn get(&self, tecnico_id: i32) -> Result<Tecnico, ServiceError> {
        self.store
            .get_tecnico(tecnico_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(TECNICO, tecnico_id))
    }

    pub async fn create(&self, actor: &Tecnico, dto: CreateTecnicoDto) -> Result<Tecnico, ServiceError> {
        require_admin(actor, "create technicians")?;
        self.lookups
            .active_ruolo(dto.ruolo_id)
            .map_err(|_| ServiceError::Validation(format!("Ruolo {} does not exist", dto.ruolo_id)))?;

        if self.store.tecnico_taken(&dto.username, &dto.email, None).await? {
            return Err(ServiceError::Conflict(
                "Username or email already registered".to_string(),
            ));
        }

        let tecnico = self
            .store
            .create_tecnico(NewTecnico {
                username: dto.username,
                email: dto.email,
                hashed_password: hash(dto.password)?,
                nome: dto.nome,
                cognome: dto.cognome,
                telefono: dto.telefono,
                ruolo_id: dto.ruolo_id,
            })
            .await?;

        tracing::info!(tecnico_id = tecnico.id, created_by = actor.id, "technician created");
        Ok(tecnico)
    }

    /// Also reaches deactivated accounts, so `attivo` can restore them.
    pub async fn update(
        &self,
        actor: &Tecnico,
        tecnico_id: i32,
        dto: UpdateTecnicoDto,
    ) -> Result<Tecnico, ServiceError> {
        require_admin(actor, "update technicians")?;
        let mut tecnico = self
            .store
            .find_tecnico(tecnico_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(TECNICO, tecnico_id))?;

        if let Some(email) = dto.email {
            if email != tecnico.email
                && self
                    .store
                    .tecnico_taken(&tecnico.username, &email, Some(tecnico.id))
                    .await?
            {
                return Err(ServiceError::Conflict("Email already registered".to_string()));
            }
            tecnico.email = email;
        }
        if let Some(ruolo_id) = dto.ruolo_id {
            self.lookups
                .active_ruolo(ruolo_id)
                .map_err(|_| ServiceError::Validation(format!("Ruolo {} does not exist", ruolo_id)))?;
            tecnico.ruolo_id = ruolo_id;
        }
        if let Some(password) = dto.password {
            tecnico.hashed_password = hash(password)?;
        }
        if let Some(nome) = dto.nome {
            tecnico.nome = nome;
        }
        if let Some(cognome) = dto.cognome {
            tecnico.cognome = cognome;
        }
        if dto.telefono.is_some() {
            tecnico.telefono = dto.telefono;
        }
        if let Some(attivo) = dto.attivo {
            if !attivo && tecnico.id == actor.id {
                return Err(ServiceError::Validation("Cannot deactivate yourself".to_string()));
            }
            tecnico.attivo = attivo;
        }

        let saved = self
            .store
            .save_tecnico(&tecnico)
            .await?
            .ok_or_else(|| ServiceError::not_found(TECNICO, tecnico_id))?;

        tracing::info!(tecnico_id = saved.id, updated_by = actor.id, "technician updated");
        Ok(saved)
    }

    /// Soft delete: the account is deactivated, its history kept.
    pub async fn delete(&self, actor: &Tecnico, tecnico_id: i32) -> Result<(), ServiceError> {
        require_admin(actor, "delete technicians")?;
        if tecnico_id == actor.id {
            return Err(ServiceError::Validation("Cannot delete yourself".to_string()));
        }

        let mut tecnico = self.get(tecnico_id).await?;
        tecnico.attivo = false;
        self.store
            .save_tecnico(&tecnico)
            .await?
            .ok_or_else(|| ServiceError::not_found(TECNICO, tecnico_id))?;

        tracing::info!(tecnico_id, deleted_by = actor.id, "technician deactivated");
        Ok(())
    }
}

fn require_admin(actor: &Tecnico, action: &str) -> Result<(), ServiceError> {
    if actor.is_admin() {
        Ok(())
    } else {
        tracing::warn!(tecnico_id = actor.id, action, "non-admin technician management refused");
        Err(ServiceError::Forbidden(format!("Only administrators can {}", action)))
    }
}

fn hash(password: String) -> Result<String, ServiceError> {
    password::hash(password).map_err(|e| ServiceError::Validation(e.to_string()))
}
