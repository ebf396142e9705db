// src/service/intervention_service.rs
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{Datelike, Utc};

use crate::{
    db::db::HelpdeskStore,
    dtos::{commondtos::PageQuery, interventiondtos::*},
    models::{
        interventionmodel::*,
        lookupmodel::InterventionStatusCode,
        usermodel::Tecnico,
    },
    service::{
        audit_service::AuditService,
        error::ServiceError,
        labels::Labels,
        lookup_registry::LookupRegistry,
        state_machine::{
            intervention_transition, legal_intervention_events, InterventionEvent,
            InterventionState, Transition,
        },
    },
    utils::decimal::{self, BigDecimalHelpers},
};

const INTERVENTO: &str = "Intervento";

#[derive(Clone)]
pub struct InterventionService {
    store: Arc<dyn HelpdeskStore>,
    lookups: Arc<LookupRegistry>,
    audit: AuditService,
}

impl InterventionService {
    pub fn new(store: Arc<dyn HelpdeskStore>, lookups: Arc<LookupRegistry>) -> Self {
        Self {
            store,
            lookups,
            audit: AuditService::new(),
        }
    }

    pub async fn list(
        &self,
        filter: InterventoFilter,
        page: &PageQuery,
    ) -> Result<(Vec<Intervento>, i64), ServiceError> {
        Ok(self
            .store
            .get_interventi(&filter, page.limit() as i64, page.offset())
            .await?)
    }

    pub async fn get(&self, intervento_id: i32) -> Result<Intervento, ServiceError> {
        self.store
            .get_intervento(intervento_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(INTERVENTO, intervento_id))
    }

    pub async fn detail(&self, intervento_id: i32) -> Result<InterventionDetailResponseDto, ServiceError> {
        let intervento = self.get(intervento_id).await?;
        let righe = self.store.get_righe(intervento.id).await?;
        let sessioni = self.store.get_sessioni(intervento.id).await?;
        let totali = InterventoTotali::calcola(&righe, &sessioni);

        Ok(InterventionDetailResponseDto {
            intervento: self.response(intervento).await?,
            righe: righe.into_iter().map(RowResponseDto::from).collect(),
            sessioni,
            totali,
        })
    }

    pub async fn response(&self, intervento: Intervento) -> Result<InterventionResponseDto, ServiceError> {
        let mut labels = Labels::new(self.store.as_ref());
        self.describe(&mut labels, intervento).await
    }

    pub async fn responses(
        &self,
        interventi: Vec<Intervento>,
    ) -> Result<Vec<InterventionResponseDto>, ServiceError> {
        let mut labels = Labels::new(self.store.as_ref());
        let mut items = Vec::with_capacity(interventi.len());
        for intervento in interventi {
            items.push(self.describe(&mut labels, intervento).await?);
        }
        Ok(items)
    }

    async fn describe(
        &self,
        labels: &mut Labels<'_>,
        intervento: Intervento,
    ) -> Result<InterventionResponseDto, ServiceError> {
        Ok(InterventionResponseDto {
            cliente: labels.cliente(intervento.cliente_id).await?,
            tecnico: labels.tecnico(Some(intervento.tecnico_id)).await?,
            stato: self.lookups.stato_intervento(intervento.stato_id).cloned(),
            tipo_intervento: self.lookups.tipo_intervento(intervento.tipo_intervento_id).cloned(),
            origine: self.lookups.origine(intervento.origine_id).cloned(),
            azioni_disponibili: self.available_events(&intervento),
            intervento,
        })
    }

    pub fn state_of(&self, intervento: &Intervento) -> InterventionState {
        let stato = self.lookups.stato_intervento(intervento.stato_id);
        InterventionState {
            code: stato.and_then(|s| InterventionStatusCode::from_code(&s.codice)),
            finale: stato.map(|s| s.finale).unwrap_or(false),
            started: intervento.data_inizio.is_some(),
            completed: intervento.data_fine.is_some(),
        }
    }

    pub fn available_events(&self, intervento: &Intervento) -> Vec<InterventionEvent> {
        legal_intervention_events(self.state_of(intervento))
    }

    pub async fn create(
        &self,
        actor: &Tecnico,
        dto: CreateInterventionDto,
    ) -> Result<Intervento, ServiceError> {
        let cliente = self
            .store
            .get_cliente(dto.cliente_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Cliente", dto.cliente_id))?;

        if let Some(contratto_id) = dto.contratto_id {
            let contratto = self
                .store
                .get_contratto(contratto_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("Contratto", contratto_id))?;
            if contratto.cliente_id != cliente.id {
                return Err(ServiceError::Validation(format!(
                    "Contratto {} does not belong to cliente {}",
                    contratto_id, cliente.id
                )));
            }
        }

        self.store
            .get_tecnico(dto.tecnico_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tecnico", dto.tecnico_id))?;

        if let Some(ticket_id) = dto.ticket_id {
            self.store
                .get_ticket(ticket_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("Ticket", ticket_id))?;
        }

        self.lookups.active_tipo_intervento(dto.tipo_intervento_id)?;
        self.lookups.active_origine(dto.origine_id)?;
        let stato = self.lookups.active_stato_intervento(dto.stato_id)?;
        if stato.finale {
            return Err(ServiceError::Conflict(format!(
                "Cannot create an intervention in final status {}",
                stato.codice
            )));
        }
        let in_corso = InterventionStatusCode::from_code(&stato.codice)
            == Some(InterventionStatusCode::InCorso);

        let now = Utc::now();
        let new_intervento = NewIntervento {
            origine_id: dto.origine_id,
            cliente_id: cliente.id,
            ticket_id: dto.ticket_id,
            richiesta_id: None,
            contratto_id: dto.contratto_id,
            tipo_intervento_id: dto.tipo_intervento_id,
            stato_id: dto.stato_id,
            tecnico_id: dto.tecnico_id,
            oggetto: dto.oggetto,
            descrizione_lavoro: dto.descrizione_lavoro,
            note_interne: dto.note_interne,
            data_inizio: in_corso.then_some(now),
        };

        let intervento = self.store.create_intervento(new_intervento, now.year()).await?;
        self.audit.record_intervention(actor, &intervento, "created");

        tracing::info!(
            intervento = %intervento.numero,
            tecnico_id = intervento.tecnico_id,
            "intervention created"
        );
        Ok(intervento)
    }

    pub async fn update(
        &self,
        actor: &Tecnico,
        intervento_id: i32,
        dto: UpdateInterventionDto,
    ) -> Result<Intervento, ServiceError> {
        let mut intervento = self.get(intervento_id).await?;
        self.check(&intervento, InterventionEvent::Update)?;

        if let Some(tipo_id) = dto.tipo_intervento_id {
            self.lookups.active_tipo_intervento(tipo_id)?;
            intervento.tipo_intervento_id = tipo_id;
        }

        if let Some(stato_id) = dto.stato_id {
            let stato = self.lookups.active_stato_intervento(stato_id)?;
            if stato.finale {
                return Err(ServiceError::Conflict(format!(
                    "Status {} is final and can only be reached by completing the intervention",
                    stato.codice
                )));
            }
            intervento.stato_id = stato_id;
        }

        if let Some(oggetto) = dto.oggetto {
            intervento.oggetto = oggetto;
        }
        if let Some(descrizione) = dto.descrizione_lavoro {
            intervento.descrizione_lavoro = Some(descrizione);
        }
        if let Some(note) = dto.note_interne {
            intervento.note_interne = Some(note);
        }

        let intervento = self.save(&intervento).await?;
        self.audit.record_intervention(actor, &intervento, "updated");
        Ok(intervento)
    }

    pub async fn start(
        &self,
        actor: &Tecnico,
        intervento_id: i32,
        dto: StartInterventionDto,
    ) -> Result<Intervento, ServiceError> {
        let mut intervento = self.get(intervento_id).await?;
        let transition = self.check(&intervento, InterventionEvent::Start)?;
        self.ensure_assignee(actor, &intervento)?;

        intervento.data_inizio = Some(Utc::now());
        self.apply(&mut intervento, transition)?;

        if let Some(nota) = dto.note_avvio.filter(|n| !n.trim().is_empty()) {
            let voce = format!("[AVVIO] {}", nota.trim());
            intervento.note_interne = Some(match intervento.note_interne.take() {
                Some(precedenti) if !precedenti.is_empty() => format!("{}\n\n{}", precedenti, voce),
                _ => voce,
            });
        }

        let intervento = self.save(&intervento).await?;
        self.audit.record_intervention(actor, &intervento, "started");

        tracing::info!(intervento = %intervento.numero, tecnico_id = actor.id, "intervention started");
        Ok(intervento)
    }

    pub async fn complete(
        &self,
        actor: &Tecnico,
        intervento_id: i32,
        dto: CompleteInterventionDto,
    ) -> Result<Intervento, ServiceError> {
        let mut intervento = self.get(intervento_id).await?;
        let transition = self.check(&intervento, InterventionEvent::Complete)?;
        self.ensure_assignee(actor, &intervento)?;

        let descrizione = dto.descrizione_lavoro.trim();
        if descrizione.is_empty() {
            return Err(ServiceError::Validation(
                "descrizione_lavoro is required to complete an intervention".to_string(),
            ));
        }

        let firma = dto.firma_cliente.filter(|f| !f.trim().is_empty());
        if let Some(firma) = &firma {
            validate_signature(firma)?;
        }

        let now = Utc::now();
        intervento.descrizione_lavoro = Some(descrizione.to_string());
        intervento.data_fine = Some(now);
        if firma.is_some() {
            intervento.firma_data = Some(now);
        }
        intervento.firma_cliente = firma;
        intervento.firma_nome = dto.firma_nome;
        intervento.firma_ruolo = dto.firma_ruolo;
        self.apply(&mut intervento, transition)?;

        let intervento = self.save(&intervento).await?;
        self.audit.record_intervention(actor, &intervento, "completed");

        tracing::info!(intervento = %intervento.numero, tecnico_id = actor.id, "intervention completed");
        Ok(intervento)
    }

    /// Books worked time as an hourly row priced from the category.
    pub async fn add_attivita(
        &self,
        actor: &Tecnico,
        intervento_id: i32,
        dto: AddActivityDto,
    ) -> Result<InterventoRiga, ServiceError> {
        let intervento = self.get(intervento_id).await?;
        self.check(&intervento, InterventionEvent::EditRows)?;

        let categoria = self.lookups.active_categoria(dto.categoria_id)?;
        let prezzo_unitario = match dto.prezzo_unitario {
            Some(prezzo) => decimal::from_f64(prezzo, 2, "prezzo_unitario")?,
            None => categoria.prezzo_unitario_default.to_decimal_or_zero(),
        };

        let riga = self
            .store
            .add_riga(NewRiga {
                intervento_id: intervento.id,
                sessione_id: None,
                categoria_id: categoria.id,
                descrizione: dto.descrizione,
                quantita: ore_da_minuti(dto.durata_minuti),
                unita_misura: UNITA_ORE.to_string(),
                prezzo_unitario,
                sconto_percentuale: 0.into(),
                fatturabile: true,
                in_garanzia: false,
                incluso_contratto: false,
            })
            .await?;

        tracing::info!(
            intervento = %intervento.numero,
            riga = riga.numero_riga,
            tecnico_id = actor.id,
            "activity row added"
        );
        Ok(riga)
    }

    pub async fn righe(&self, intervento_id: i32) -> Result<Vec<InterventoRiga>, ServiceError> {
        let intervento = self.get(intervento_id).await?;
        Ok(self.store.get_righe(intervento.id).await?)
    }

    pub async fn update_riga(
        &self,
        intervento_id: i32,
        riga_id: i32,
        dto: UpdateRowDto,
    ) -> Result<InterventoRiga, ServiceError> {
        let intervento = self.get(intervento_id).await?;
        self.check(&intervento, InterventionEvent::EditRows)?;
        let mut riga = self.riga(intervento.id, riga_id).await?;

        if let Some(categoria_id) = dto.categoria_id {
            self.lookups.active_categoria(categoria_id)?;
            riga.categoria_id = categoria_id;
        }
        if let Some(descrizione) = dto.descrizione {
            riga.descrizione = descrizione;
        }
        if let Some(quantita) = dto.quantita {
            riga.quantita = decimal::from_f64(quantita, 2, "quantita")?;
        }
        if let Some(prezzo) = dto.prezzo_unitario {
            riga.prezzo_unitario = decimal::from_f64(prezzo, 2, "prezzo_unitario")?;
        }
        if let Some(sconto) = dto.sconto_percentuale {
            riga.sconto_percentuale = decimal::from_f64(sconto, 2, "sconto_percentuale")?;
        }
        if let Some(fatturabile) = dto.fatturabile {
            riga.fatturabile = fatturabile;
        }
        if let Some(in_garanzia) = dto.in_garanzia {
            riga.in_garanzia = in_garanzia;
        }
        if let Some(incluso) = dto.incluso_contratto {
            riga.incluso_contratto = incluso;
        }

        self.store
            .save_riga(&riga)
            .await?
            .ok_or_else(|| stale("InterventoRiga", riga.id))
    }

    pub async fn delete_riga(&self, intervento_id: i32, riga_id: i32) -> Result<(), ServiceError> {
        let intervento = self.get(intervento_id).await?;
        self.check(&intervento, InterventionEvent::EditRows)?;
        let mut riga = self.riga(intervento.id, riga_id).await?;

        riga.attivo = false;
        self.store
            .save_riga(&riga)
            .await?
            .ok_or_else(|| stale("InterventoRiga", riga.id))?;

        tracing::info!(intervento = %intervento.numero, riga = riga.numero_riga, "activity row deleted");
        Ok(())
    }

    pub async fn sessioni(&self, intervento_id: i32) -> Result<Vec<InterventoSessione>, ServiceError> {
        let intervento = self.get(intervento_id).await?;
        Ok(self.store.get_sessioni(intervento.id).await?)
    }

    pub async fn add_sessione(
        &self,
        actor: &Tecnico,
        intervento_id: i32,
        dto: CreateSessionDto,
    ) -> Result<InterventoSessione, ServiceError> {
        let intervento = self.get(intervento_id).await?;
        self.check(&intervento, InterventionEvent::EditSessions)?;
        self.lookups.active_tipo_intervento(dto.tipo_intervento_id)?;

        let km_percorsi = dto
            .km_percorsi
            .map(|km| decimal::from_f64(km, 2, "km_percorsi"))
            .transpose()?;

        let sessione = self
            .store
            .add_sessione(NewSessione {
                intervento_id: intervento.id,
                tecnico_id: actor.id,
                tipo_intervento_id: dto.tipo_intervento_id,
                data: dto.data,
                ora_inizio: dto.ora_inizio,
                ora_fine: dto.ora_fine,
                durata_minuti: dto.ora_fine.map(|fine| durata_minuti(dto.ora_inizio, fine)),
                km_percorsi,
                tempo_viaggio_minuti: dto.tempo_viaggio_minuti,
                latitudine_inizio: dto.latitudine_inizio,
                longitudine_inizio: dto.longitudine_inizio,
                latitudine_fine: dto.latitudine_fine,
                longitudine_fine: dto.longitudine_fine,
                note: dto.note,
            })
            .await?;

        tracing::info!(
            intervento = %intervento.numero,
            sessione_id = sessione.id,
            durata = ?sessione.durata_minuti,
            "work session added"
        );
        Ok(sessione)
    }

    pub async fn update_sessione(
        &self,
        intervento_id: i32,
        sessione_id: i32,
        dto: UpdateSessionDto,
    ) -> Result<InterventoSessione, ServiceError> {
        let intervento = self.get(intervento_id).await?;
        self.check(&intervento, InterventionEvent::EditSessions)?;
        let mut sessione = self.sessione(intervento.id, sessione_id).await?;

        if let Some(data) = dto.data {
            sessione.data = data;
        }
        if let Some(tipo_id) = dto.tipo_intervento_id {
            self.lookups.active_tipo_intervento(tipo_id)?;
            sessione.tipo_intervento_id = tipo_id;
        }
        if let Some(km) = dto.km_percorsi {
            sessione.km_percorsi = Some(decimal::from_f64(km, 2, "km_percorsi")?);
        }
        if let Some(minuti) = dto.tempo_viaggio_minuti {
            sessione.tempo_viaggio_minuti = Some(minuti);
        }
        if let Some(lat) = dto.latitudine_fine {
            sessione.latitudine_fine = Some(lat);
        }
        if let Some(lon) = dto.longitudine_fine {
            sessione.longitudine_fine = Some(lon);
        }
        if let Some(note) = dto.note {
            sessione.note = Some(note);
        }

        if dto.ora_inizio.is_some() || dto.ora_fine.is_some() {
            if let Some(inizio) = dto.ora_inizio {
                sessione.ora_inizio = inizio;
            }
            if let Some(fine) = dto.ora_fine {
                sessione.ora_fine = Some(fine);
            }
            sessione.ricalcola_durata();
        }

        self.store
            .save_sessione(&sessione)
            .await?
            .ok_or_else(|| stale("InterventoSessione", sessione.id))
    }

    pub async fn delete_sessione(
        &self,
        intervento_id: i32,
        sessione_id: i32,
    ) -> Result<(), ServiceError> {
        let intervento = self.get(intervento_id).await?;
        self.check(&intervento, InterventionEvent::EditSessions)?;
        let mut sessione = self.sessione(intervento.id, sessione_id).await?;

        sessione.attivo = false;
        self.store
            .save_sessione(&sessione)
            .await?
            .ok_or_else(|| stale("InterventoSessione", sessione.id))?;
        Ok(())
    }

    pub async fn delete(&self, actor: &Tecnico, intervento_id: i32) -> Result<(), ServiceError> {
        let mut intervento = self.get(intervento_id).await?;
        self.check(&intervento, InterventionEvent::Delete)?;

        intervento.attivo = false;
        let intervento = self.save(&intervento).await?;
        self.audit.record_intervention(actor, &intervento, "deleted");

        tracing::info!(intervento = %intervento.numero, "intervention deleted");
        Ok(())
    }

    fn check(
        &self,
        intervento: &Intervento,
        event: InterventionEvent,
    ) -> Result<Transition<InterventionStatusCode>, ServiceError> {
        intervention_transition(self.state_of(intervento), event).map_err(|err| {
            tracing::warn!(
                intervento = %intervento.numero,
                ?event,
                error = %err,
                "intervention transition rejected"
            );
            err
        })
    }

    fn apply(
        &self,
        intervento: &mut Intervento,
        transition: Transition<InterventionStatusCode>,
    ) -> Result<(), ServiceError> {
        if let Transition::MoveTo(code) = transition {
            intervento.stato_id = self.lookups.intervention_status_id(code)?;
        }
        Ok(())
    }

    fn ensure_assignee(&self, actor: &Tecnico, intervento: &Intervento) -> Result<(), ServiceError> {
        if intervento.tecnico_id != actor.id {
            tracing::warn!(
                intervento = %intervento.numero,
                tecnico_id = actor.id,
                assegnato = intervento.tecnico_id,
                "intervention action by non-assignee refused"
            );
            return Err(ServiceError::Forbidden(
                "Only the assigned technician can perform this action".to_string(),
            ));
        }
        Ok(())
    }

    async fn riga(&self, intervento_id: i32, riga_id: i32) -> Result<InterventoRiga, ServiceError> {
        self.store
            .get_riga(intervento_id, riga_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("InterventoRiga", riga_id))
    }

    async fn sessione(
        &self,
        intervento_id: i32,
        sessione_id: i32,
    ) -> Result<InterventoSessione, ServiceError> {
        self.store
            .get_sessione(intervento_id, sessione_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("InterventoSessione", sessione_id))
    }

    async fn save(&self, intervento: &Intervento) -> Result<Intervento, ServiceError> {
        self.store
            .save_intervento(intervento)
            .await?
            .ok_or_else(|| stale(INTERVENTO, &intervento.numero))
    }
}

fn stale(entity: &str, id: impl std::fmt::Display) -> ServiceError {
    tracing::warn!(entity, id = %id, "stale write rejected");
    ServiceError::Conflict(format!(
        "{} {} was modified concurrently, reload and retry",
        entity, id
    ))
}

/// Accepts raw base64 or a `data:<mime>;base64,` URL.
fn validate_signature(firma: &str) -> Result<(), ServiceError> {
    let payload = match firma.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => firma,
    };

    STANDARD
        .decode(payload.trim())
        .map(|_| ())
        .map_err(|_| ServiceError::Validation("firma_cliente is not valid base64".to_string()))
}
