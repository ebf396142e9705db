// src/service/labels.rs
use std::collections::HashMap;

use crate::{
    db::db::HelpdeskStore,
    models::{
        clientmodel::{ClienteSimple, ReferenteSimple},
        usermodel::TecnicoSimple,
    },
    service::error::ServiceError,
};

/// Client, contact and technician labels for one batch of responses.
/// Each id is read from the store at most once per batch.
pub struct Labels<'a> {
    store: &'a dyn HelpdeskStore,
    clienti: HashMap<i32, Option<ClienteSimple>>,
    referenti: HashMap<i32, Option<ReferenteSimple>>,
    tecnici: HashMap<i32, Option<TecnicoSimple>>,
}

impl<'a> Labels<'a> {
    pub fn new(store: &'a dyn HelpdeskStore) -> Self {
        Labels {
            store,
            clienti: HashMap::new(),
            referenti: HashMap::new(),
            tecnici: HashMap::new(),
        }
    }

    pub async fn cliente(&mut self, cliente_id: i32) -> Result<Option<ClienteSimple>, ServiceError> {
        if let Some(cached) = self.clienti.get(&cliente_id) {
            return Ok(cached.clone());
        }
        let found = self
            .store
            .get_cliente(cliente_id)
            .await?
            .as_ref()
            .map(ClienteSimple::from);
        self.clienti.insert(cliente_id, found.clone());
        Ok(found)
    }

    pub async fn referente(
        &mut self,
        referente_id: Option<i32>,
    ) -> Result<Option<ReferenteSimple>, ServiceError> {
        let Some(referente_id) = referente_id else {
            return Ok(None);
        };
        if let Some(cached) = self.referenti.get(&referente_id) {
            return Ok(cached.clone());
        }
        let found = self
            .store
            .get_referente(referente_id)
            .await?
            .as_ref()
            .map(ReferenteSimple::from);
        self.referenti.insert(referente_id, found.clone());
        Ok(found)
    }

    /// Deactivated technicians still resolve, so past assignments keep a name.
    pub async fn tecnico(
        &mut self,
        tecnico_id: Option<i32>,
    ) -> Result<Option<TecnicoSimple>, ServiceError> {
        let Some(tecnico_id) = tecnico_id else {
            return Ok(None);
        };
        if let Some(cached) = self.tecnici.get(&tecnico_id) {
            return Ok(cached.clone());
        }
        let found = self
            .store
            .find_tecnico(tecnico_id)
            .await?
            .as_ref()
            .map(TecnicoSimple::from);
        self.tecnici.insert(tecnico_id, found.clone());
        Ok(found)
    }
}
