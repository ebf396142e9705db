// src/service/ticket_service.rs
use std::sync::Arc;

use chrono::{Datelike, Utc};

use crate::{
    db::db::HelpdeskStore,
    dtos::{commondtos::PageQuery, ticketdtos::*},
    models::{
        interventionmodel::{Intervento, NewIntervento},
        lookupmodel::{PriorityCode, TicketStatusCode},
        ticketmodel::*,
        usermodel::Tecnico,
    },
    service::{
        audit_service::AuditService,
        error::ServiceError,
        labels::Labels,
        lookup_registry::LookupRegistry,
        sla::{self, SlaDeadlines},
        state_machine::{
            legal_ticket_events, ticket_transition, TicketEvent, TicketState, Transition,
        },
    },
};

const TICKET: &str = "Ticket";

#[derive(Clone)]
pub struct TicketService {
    store: Arc<dyn HelpdeskStore>,
    lookups: Arc<LookupRegistry>,
    audit: AuditService,
}

impl TicketService {
    pub fn new(store: Arc<dyn HelpdeskStore>, lookups: Arc<LookupRegistry>) -> Self {
        Self {
            store,
            lookups,
            audit: AuditService::new(),
        }
    }

    pub async fn list(
        &self,
        filter: TicketFilter,
        page: &PageQuery,
    ) -> Result<(Vec<Ticket>, i64), ServiceError> {
        Ok(self
            .store
            .get_tickets(&filter, page.limit() as i64, page.offset())
            .await?)
    }

    pub async fn get(&self, ticket_id: i32) -> Result<Ticket, ServiceError> {
        self.store
            .get_ticket(ticket_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(TICKET, ticket_id))
    }

    pub fn state_of(&self, ticket: &Ticket) -> TicketState {
        let stato = self.lookups.stato_ticket(ticket.stato_id);
        TicketState {
            code: stato.and_then(|s| TicketStatusCode::from_code(&s.codice)),
            finale: stato.map(|s| s.finale).unwrap_or(false),
        }
    }

    pub fn available_events(&self, ticket: &Ticket) -> Vec<TicketEvent> {
        legal_ticket_events(self.state_of(ticket))
    }

    pub async fn response(&self, ticket: Ticket) -> Result<TicketResponseDto, ServiceError> {
        let mut labels = Labels::new(self.store.as_ref());
        self.describe(&mut labels, ticket).await
    }

    pub async fn responses(&self, tickets: Vec<Ticket>) -> Result<Vec<TicketResponseDto>, ServiceError> {
        let mut labels = Labels::new(self.store.as_ref());
        let mut items = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            items.push(self.describe(&mut labels, ticket).await?);
        }
        Ok(items)
    }

    async fn describe(
        &self,
        labels: &mut Labels<'_>,
        ticket: Ticket,
    ) -> Result<TicketResponseDto, ServiceError> {
        Ok(TicketResponseDto {
            cliente: labels.cliente(ticket.cliente_id).await?,
            referente: labels.referente(ticket.referente_id).await?,
            canale: self.lookups.canale(ticket.canale_id).cloned(),
            priorita: self.lookups.priorita(ticket.priorita_id).cloned(),
            stato: self.lookups.stato_ticket(ticket.stato_id).cloned(),
            tecnico_assegnato: labels.tecnico(ticket.tecnico_assegnato_id).await?,
            azioni_disponibili: self.available_events(&ticket),
            ticket,
        })
    }

    pub async fn create(&self, actor: &Tecnico, dto: CreateTicketDto) -> Result<Ticket, ServiceError> {
        let cliente = self
            .store
            .get_cliente(dto.cliente_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Cliente", dto.cliente_id))?;

        let mut referente_nome = dto.referente_nome;
        if let Some(referente_id) = dto.referente_id {
            let referente = self
                .store
                .get_referente(referente_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("Referente", referente_id))?;
            if referente.cliente_id != cliente.id {
                return Err(ServiceError::Validation(format!(
                    "Referente {} does not belong to cliente {}",
                    referente_id, cliente.id
                )));
            }
            referente_nome.get_or_insert_with(|| referente.nome_completo());
        }

        let contratto = match dto.contratto_id {
            Some(contratto_id) => {
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
                Some(contratto)
            }
            None => None,
        };

        self.lookups.active_canale(dto.canale_id)?;
        let priority_code = PriorityCode::from_code(&self.lookups.active_priorita(dto.priorita_id)?.codice);

        let now = Utc::now();
        let mut deadlines = SlaDeadlines::default();
        if let Some(sla_id) = contratto.as_ref().and_then(|c| c.sla_id) {
            if let Some(definizione) = self.store.get_sla_definizione(sla_id).await? {
                deadlines = sla::deadlines_for(&definizione, priority_code, now);
            }
        }

        let new_ticket = NewTicket {
            oggetto: dto.oggetto,
            descrizione: dto.descrizione,
            cliente_id: cliente.id,
            referente_id: dto.referente_id,
            referente_nome,
            canale_id: dto.canale_id,
            priorita_id: dto.priorita_id,
            stato_id: self.lookups.ids().ticket_nuovo,
            contratto_id: dto.contratto_id,
            asset_id: dto.asset_id,
            sla_scadenza_risposta: deadlines.risposta,
            sla_scadenza_risoluzione: deadlines.risoluzione,
        };

        let storico = self.audit.ticket_created(actor);
        let ticket = self
            .store
            .create_ticket(new_ticket, now.year(), storico.clone())
            .await?;
        self.audit.record_ticket(&ticket, &storico);

        tracing::info!(ticket = %ticket.numero, cliente_id = ticket.cliente_id, "ticket created");
        Ok(ticket)
    }

    pub async fn update(
        &self,
        actor: &Tecnico,
        ticket_id: i32,
        dto: UpdateTicketDto,
    ) -> Result<Ticket, ServiceError> {
        let mut ticket = self.get(ticket_id).await?;
        self.check(&ticket, TicketEvent::Update)?;

        let now = Utc::now();
        let mut campi = Vec::new();

        if let Some(oggetto) = dto.oggetto {
            if oggetto != ticket.oggetto {
                ticket.oggetto = oggetto;
                campi.push("oggetto");
            }
        }

        if let Some(descrizione) = dto.descrizione {
            if ticket.descrizione.as_ref() != Some(&descrizione) {
                ticket.descrizione = Some(descrizione);
                campi.push("descrizione");
            }
        }

        if let Some(priorita_id) = dto.priorita_id {
            if priorita_id != ticket.priorita_id {
                self.lookups.active_priorita(priorita_id)?;
                ticket.priorita_id = priorita_id;
                campi.push("priorita_id");
            }
        }

        if let Some(tecnico_id) = dto.tecnico_assegnato_id {
            if ticket.tecnico_assegnato_id != Some(tecnico_id) {
                self.active_tecnico(tecnico_id).await?;
                ticket.tecnico_assegnato_id = Some(tecnico_id);
                sla::stamp_first_response(&mut ticket, now);
                campi.push("tecnico_assegnato_id");
            }
        }

        if let Some(stato_id) = dto.stato_id {
            if stato_id != ticket.stato_id {
                let stato = self.lookups.active_stato_ticket(stato_id)?;
                if stato.finale {
                    return Err(ServiceError::Conflict(format!(
                        "Status {} is final and can only be reached by closing the ticket",
                        stato.codice
                    )));
                }

                let in_attesa = |id: i32| {
                    self.lookups.ticket_status_code(id) == Some(TicketStatusCode::AttesaCliente)
                };
                match (in_attesa(ticket.stato_id), in_attesa(stato_id)) {
                    (false, true) => sla::pause(&mut ticket, now),
                    (true, false) => sla::resume(&mut ticket, now),
                    _ => {}
                }

                ticket.stato_id = stato_id;
                campi.push("stato_id");
            }
        }

        if campi.is_empty() {
            return Ok(ticket);
        }

        let storico = self.audit.ticket_updated(actor, &campi);
        let ticket = self.save(&ticket, storico).await?;

        tracing::info!(ticket = %ticket.numero, campi = ?campi, "ticket updated");
        Ok(ticket)
    }

    pub async fn assign(
        &self,
        actor: &Tecnico,
        ticket_id: i32,
        tecnico_id: i32,
    ) -> Result<Ticket, ServiceError> {
        let mut ticket = self.get(ticket_id).await?;
        let transition = self.check(&ticket, TicketEvent::Assign)?;
        let assegnato = self.active_tecnico(tecnico_id).await?;

        let precedente = ticket.tecnico_assegnato_id;
        ticket.tecnico_assegnato_id = Some(assegnato.id);
        sla::stamp_first_response(&mut ticket, Utc::now());
        self.apply(&mut ticket, transition)?;

        let storico = self.audit.ticket_assigned(actor, precedente, &assegnato);
        let ticket = self.save(&ticket, storico).await?;

        tracing::info!(ticket = %ticket.numero, tecnico_id, "ticket assigned");
        Ok(ticket)
    }

    pub async fn take(&self, actor: &Tecnico, ticket_id: i32) -> Result<Ticket, ServiceError> {
        let mut ticket = self.get(ticket_id).await?;
        let transition = self.check(&ticket, TicketEvent::Take)?;

        ticket.tecnico_assegnato_id = Some(actor.id);
        sla::stamp_first_response(&mut ticket, Utc::now());
        self.apply(&mut ticket, transition)?;

        let storico = self.audit.ticket_taken(actor);
        let ticket = self.save(&ticket, storico).await?;

        tracing::info!(ticket = %ticket.numero, tecnico_id = actor.id, "ticket taken in charge");
        Ok(ticket)
    }

    pub async fn close(
        &self,
        actor: &Tecnico,
        ticket_id: i32,
        dto: CloseTicketDto,
    ) -> Result<Ticket, ServiceError> {
        let mut ticket = self.get(ticket_id).await?;
        let transition = self.check(&ticket, TicketEvent::Close)?;

        let now = Utc::now();
        sla::resume(&mut ticket, now);
        self.apply(&mut ticket, transition)?;
        ticket.tipo_chiusura = Some(dto.tipo_chiusura);
        ticket.note_chiusura = dto.note_chiusura;
        ticket.chiuso_da_id = Some(actor.id);
        if ticket.data_chiusura.is_none() {
            ticket.data_chiusura = Some(now);
        }

        let storico = self.audit.ticket_closed(actor, dto.tipo_chiusura);
        let ticket = self.save(&ticket, storico).await?;

        tracing::info!(ticket = %ticket.numero, tipo = dto.tipo_chiusura.to_str(), "ticket closed");
        Ok(ticket)
    }

    /// Opens an in-progress on-site intervention for the acting technician.
    pub async fn create_intervention(
        &self,
        actor: &Tecnico,
        ticket_id: i32,
    ) -> Result<(Ticket, Intervento), ServiceError> {
        let mut ticket = self.get(ticket_id).await?;
        let transition = self.check(&ticket, TicketEvent::CreateIntervention)?;

        let ids = *self.lookups.ids();
        let now = Utc::now();
        let intervento = NewIntervento {
            origine_id: ids.origine_da_ticket,
            cliente_id: ticket.cliente_id,
            ticket_id: Some(ticket.id),
            richiesta_id: None,
            contratto_id: ticket.contratto_id,
            tipo_intervento_id: ids.tipo_presso_cliente,
            stato_id: ids.intervento_in_corso,
            tecnico_id: actor.id,
            oggetto: ticket.oggetto.clone(),
            descrizione_lavoro: Some(descrizione_da_ticket("Intervento", &ticket)),
            note_interne: None,
            data_inizio: Some(now),
        };
        self.apply(&mut ticket, transition)?;

        let storico = self.audit.intervention_spawned(actor);
        let (saved, intervento) = self
            .store
            .create_intervention_from_ticket(&ticket, intervento, now.year(), storico.clone())
            .await?
            .ok_or_else(|| stale(&ticket))?;
        self.audit.record_ticket(&saved, &storico);

        tracing::info!(
            ticket = %saved.numero,
            intervento = %intervento.numero,
            "intervention created from ticket"
        );
        Ok((saved, intervento))
    }

    pub async fn schedule_intervention(
        &self,
        actor: &Tecnico,
        ticket_id: i32,
        dto: ScheduleInterventionDto,
    ) -> Result<(Ticket, RichiestaIntervento), ServiceError> {
        let mut ticket = self.get(ticket_id).await?;
        let transition = self.check(&ticket, TicketEvent::ScheduleIntervention)?;

        if let Some(tipo_id) = dto.tipo_intervento_id {
            self.lookups.active_tipo_intervento(tipo_id)?;
        }

        let priorita_id = match self.lookups.active_priorita(ticket.priorita_id) {
            Ok(priorita) => priorita.id,
            Err(_) => self.lookups.ids().priorita_default,
        };

        let richiesta = NewRichiesta {
            ticket_id: ticket.id,
            cliente_id: ticket.cliente_id,
            contratto_id: ticket.contratto_id,
            descrizione: descrizione_da_ticket("Richiesta", &ticket),
            priorita_id,
            tipo_intervento_id: dto.tipo_intervento_id,
            tecnico_richiesto_id: actor.id,
            data_preferita: dto.data_preferita,
            note: dto.note,
        };
        self.apply(&mut ticket, transition)?;

        let storico = self.audit.intervention_requested(actor);
        let (saved, richiesta) = self
            .store
            .create_richiesta_from_ticket(&ticket, richiesta, storico.clone())
            .await?
            .ok_or_else(|| stale(&ticket))?;
        self.audit.record_ticket(&saved, &storico);
        self.audit.record_richiesta(actor, &saved, &richiesta);

        tracing::info!(ticket = %saved.numero, richiesta_id = richiesta.id, "intervention scheduled");
        Ok((saved, richiesta))
    }

    pub async fn add_note(
        &self,
        actor: &Tecnico,
        ticket_id: i32,
        dto: TicketNoteDto,
    ) -> Result<TicketNota, ServiceError> {
        let ticket = self.get(ticket_id).await?;
        self.check(&ticket, TicketEvent::AddNote)?;
        Ok(self.store.add_ticket_nota(ticket.id, actor.id, dto.nota).await?)
    }

    pub async fn notes(&self, ticket_id: i32) -> Result<Vec<TicketNota>, ServiceError> {
        let ticket = self.get(ticket_id).await?;
        Ok(self.store.get_ticket_note(ticket.id).await?)
    }

    /// Messages are shown to the client, so markup is sanitized before storing.
    pub async fn add_message(
        &self,
        actor: &Tecnico,
        ticket_id: i32,
        dto: TicketMessageDto,
    ) -> Result<TicketMessaggio, ServiceError> {
        let ticket = self.get(ticket_id).await?;
        self.check(&ticket, TicketEvent::AddMessage)?;

        let messaggio = ammonia::clean(&dto.messaggio).trim().to_string();
        if messaggio.is_empty() {
            return Err(ServiceError::Validation(
                "messaggio is empty after sanitizing".to_string(),
            ));
        }

        Ok(self
            .store
            .add_ticket_messaggio(ticket.id, actor.id, messaggio)
            .await?)
    }

    pub async fn messages(&self, ticket_id: i32) -> Result<Vec<TicketMessaggio>, ServiceError> {
        let ticket = self.get(ticket_id).await?;
        Ok(self.store.get_ticket_messaggi(ticket.id).await?)
    }

    pub async fn history(&self, ticket_id: i32) -> Result<Vec<TicketStorico>, ServiceError> {
        let ticket = self.get(ticket_id).await?;
        Ok(self.store.get_ticket_storico(ticket.id).await?)
    }

    pub async fn delete(&self, actor: &Tecnico, ticket_id: i32) -> Result<(), ServiceError> {
        let mut ticket = self.get(ticket_id).await?;
        if !actor.is_admin() {
            tracing::warn!(ticket = %ticket.numero, tecnico_id = actor.id, "non-admin ticket delete refused");
            return Err(ServiceError::Forbidden(
                "Only administrators can delete tickets".to_string(),
            ));
        }
        self.check(&ticket, TicketEvent::Delete)?;

        ticket.attivo = false;
        let storico = self.audit.ticket_deleted(actor);
        let ticket = self.save(&ticket, storico).await?;

        tracing::info!(ticket = %ticket.numero, "ticket deleted");
        Ok(())
    }

    pub async fn list_richieste(
        &self,
        stato: Option<StatoRichiesta>,
        page: &PageQuery,
    ) -> Result<(Vec<RichiestaIntervento>, i64), ServiceError> {
        Ok(self
            .store
            .get_richieste(stato, page.limit() as i64, page.offset())
            .await?)
    }

    fn check(
        &self,
        ticket: &Ticket,
        event: TicketEvent,
    ) -> Result<Transition<TicketStatusCode>, ServiceError> {
        ticket_transition(self.state_of(ticket), event).map_err(|err| {
            tracing::warn!(ticket = %ticket.numero, ?event, error = %err, "ticket transition rejected");
            err
        })
    }

    fn apply(
        &self,
        ticket: &mut Ticket,
        transition: Transition<TicketStatusCode>,
    ) -> Result<(), ServiceError> {
        if let Transition::MoveTo(code) = transition {
            ticket.stato_id = self.lookups.ticket_status_id(code)?;
        }
        Ok(())
    }

    async fn active_tecnico(&self, tecnico_id: i32) -> Result<Tecnico, ServiceError> {
        self.store
            .get_tecnico(tecnico_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tecnico", tecnico_id))
    }

    async fn save(&self, ticket: &Ticket, storico: NewStorico) -> Result<Ticket, ServiceError> {
        let saved = self
            .store
            .save_ticket(ticket, storico.clone())
            .await?
            .ok_or_else(|| stale(ticket))?;
        self.audit.record_ticket(&saved, &storico);
        Ok(saved)
    }
}

fn stale(ticket: &Ticket) -> ServiceError {
    tracing::warn!(ticket = %ticket.numero, "stale ticket write rejected");
    ServiceError::Conflict(format!(
        "Ticket {} was modified concurrently, reload and retry",
        ticket.numero
    ))
}

fn descrizione_da_ticket(prefisso: &str, ticket: &Ticket) -> String {
    match ticket.descrizione.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(descrizione) => format!("{} da ticket #{}\n\n{}", prefisso, ticket.numero, descrizione),
        None => format!("{} da ticket #{}", prefisso, ticket.numero),
    }
}
