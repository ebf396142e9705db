// src/db/memory.rs
//! In-process store used by the service and router tests. Mirrors the SQL
//! semantics the services depend on: active-only reads, optimistic saves,
//! per-year counters and gap-free row numbering.
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::Error;

use super::{
    clientdb::ClientExt, interventiondb::InterventionExt, lookupdb::LookupExt,
    ticketdb::TicketExt, userdb::TecnicoExt,
};
use crate::models::{
    clientmodel::*, interventionmodel::*, lookupmodel::LookupTables, ticketmodel::*,
    usermodel::{NewTecnico, Tecnico},
};
use crate::service::lookup_registry::fixtures::seeded_tables;
use crate::service::numbering::{format_number, parse_sequence, SequenceKind};

#[derive(Default)]
struct MemoryState {
    lookups: LookupTables,
    tecnici: Vec<Tecnico>,
    clienti: Vec<Cliente>,
    contratti: Vec<Contratto>,
    sedi: Vec<Sede>,
    referenti: Vec<Referente>,
    sla: Vec<SlaDefinizione>,
    tickets: Vec<Ticket>,
    note: Vec<TicketNota>,
    messaggi: Vec<TicketMessaggio>,
    storico: Vec<TicketStorico>,
    richieste: Vec<RichiestaIntervento>,
    interventi: Vec<Intervento>,
    righe: Vec<InterventoRiga>,
    sessioni: Vec<InterventoSessione>,
    counters: HashMap<(SequenceKind, i32), i32>,
    next_id: i32,
}

impl MemoryState {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn allocate(&mut self, kind: SequenceKind, year: i32) -> String {
        let existing: Vec<String> = match kind {
            SequenceKind::Ticket => self.tickets.iter().map(|t| t.numero.clone()).collect(),
            SequenceKind::Intervento => self.interventi.iter().map(|i| i.numero.clone()).collect(),
        };
        let counter = self.counters.entry((kind, year)).or_insert_with(|| {
            existing
                .iter()
                .filter_map(|n| parse_sequence(kind, year, n))
                .max()
                .unwrap_or(0)
        });
        *counter += 1;
        format_number(kind, year, *counter)
    }

    fn push_storico(&mut self, ticket_id: i32, storico: &NewStorico) {
        let id = self.next_id();
        self.storico.push(TicketStorico {
            id,
            ticket_id,
            tecnico_id: storico.tecnico_id,
            azione: storico.azione.to_str().to_string(),
            campo_modificato: storico.campo_modificato.clone(),
            valore_precedente: storico.valore_precedente.clone(),
            valore_nuovo: storico.valore_nuovo.clone(),
            descrizione: Some(storico.descrizione.clone()),
            created_at: Utc::now(),
        });
    }

    fn update_ticket(&mut self, ticket: &Ticket) -> Option<Ticket> {
        let slot = self
            .tickets
            .iter_mut()
            .find(|t| t.id == ticket.id && t.updated_at == ticket.updated_at)?;
        let mut saved = ticket.clone();
        saved.updated_at = touch(slot.updated_at);
        *slot = saved.clone();
        Some(saved)
    }

    fn insert_intervento(&mut self, new: &NewIntervento, year: i32) -> Intervento {
        let numero = self.allocate(SequenceKind::Intervento, year);
        let now = Utc::now();
        let intervento = Intervento {
            id: self.next_id(),
            numero,
            origine_id: new.origine_id,
            cliente_id: new.cliente_id,
            ticket_id: new.ticket_id,
            richiesta_id: new.richiesta_id,
            evento_calendario_id: None,
            contratto_id: new.contratto_id,
            tipo_intervento_id: new.tipo_intervento_id,
            stato_id: new.stato_id,
            tecnico_id: new.tecnico_id,
            oggetto: new.oggetto.clone(),
            descrizione_lavoro: new.descrizione_lavoro.clone(),
            note_interne: new.note_interne.clone(),
            data_inizio: new.data_inizio,
            data_fine: None,
            firma_cliente: None,
            firma_nome: None,
            firma_ruolo: None,
            firma_data: None,
            sincronizzato_gestionale: false,
            codice_gestionale: None,
            data_sincronizzazione: None,
            errore_sincronizzazione: None,
            attivo: true,
            created_at: now,
            updated_at: now,
        };
        self.interventi.push(intervento.clone());
        intervento
    }
}

/// A fresh `updated_at` strictly after the previous one.
fn touch(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

fn page<T: Clone>(rows: Vec<T>, limit: i64, offset: i64) -> (Vec<T>, i64) {
    let total = rows.len() as i64;
    let items = rows
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect();
    (items, total)
}

fn contains(haystack: Option<&str>, needle: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(&needle.to_lowercase()))
        .unwrap_or(false)
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seed lookups; technicians 1 (ADMIN), 3, 5 and 7; client 1 with
    /// contract 1 (standard SLA) and contact 1; client 2 with contract 2.
    pub fn seeded() -> Self {
        let store = MemoryStore::default();
        {
            let mut state = store.state();
            let now = Utc::now();
            state.lookups = seeded_tables();
            state.next_id = 100;

            for (id, username, ruolo_id, ruolo) in [
                (1, "admin", 1, "ADMIN"),
                (3, "mrossi", 4, "TECNICO"),
                (5, "lbianchi", 4, "TECNICO"),
                (7, "gverdi", 3, "TECNICO_SENIOR"),
            ] {
                state.tecnici.push(Tecnico {
                    id,
                    username: username.to_string(),
                    email: format!("{}@example.com", username),
                    hashed_password: String::new(),
                    nome: username.to_string(),
                    cognome: "Test".to_string(),
                    telefono: None,
                    ruolo_id,
                    ruolo_codice: ruolo.to_string(),
                    attivo: true,
                    created_at: now,
                    updated_at: now,
                });
            }

            for (id, ragione_sociale) in [(1, "Acme S.r.l."), (2, "Beta S.p.A.")] {
                state.clienti.push(Cliente {
                    id,
                    codice_gestionale: format!("C{:04}", id),
                    ragione_sociale: ragione_sociale.to_string(),
                    partita_iva: None,
                    codice_fiscale: None,
                    indirizzo: None,
                    cap: None,
                    citta: Some("Milano".to_string()),
                    provincia: Some("MI".to_string()),
                    telefono: None,
                    email: None,
                    note: None,
                    attivo: true,
                    created_at: now,
                    updated_at: now,
                });
                state.contratti.push(Contratto {
                    id,
                    codice_gestionale: format!("K{:04}", id),
                    cliente_id: id,
                    descrizione: "Assistenza".to_string(),
                    tipo_contratto: Some("Assistenza".to_string()),
                    data_inizio: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    data_fine: None,
                    ore_incluse: Some(BigDecimal::from(40)),
                    ore_utilizzate: BigDecimal::from(0),
                    sla_id: (id == 1).then_some(1),
                    attivo: true,
                    created_at: now,
                    updated_at: now,
                });
            }

            state.sedi.push(Sede {
                id: 1,
                cliente_id: 1,
                nome_sede: "Sede Milano".to_string(),
                codice_sede: None,
                indirizzo: "Via Roma 1".to_string(),
                cap: Some("20100".to_string()),
                citta: "Milano".to_string(),
                provincia: Some("MI".to_string()),
                telefono: None,
                email: None,
                note: None,
                attivo: true,
                created_at: now,
                updated_at: now,
            });

            state.referenti.push(Referente {
                id: 1,
                cliente_id: 1,
                sede_id: Some(1),
                nome: "Anna".to_string(),
                cognome: "Neri".to_string(),
                ruolo: Some("IT Manager".to_string()),
                telefono: None,
                cellulare: None,
                email: Some("anna.neri@example.com".to_string()),
                contatto_principale: true,
                attivo: true,
                created_at: now,
                updated_at: now,
            });

            state.sla.push(SlaDefinizione {
                id: 1,
                nome: "Standard".to_string(),
                tempo_risposta_critica: 60,
                tempo_risposta_urgente: 120,
                tempo_risposta_alta: 240,
                tempo_risposta_normale: 480,
                tempo_risposta_bassa: 1440,
                tempo_risoluzione_critica: 240,
                tempo_risoluzione_urgente: 480,
                tempo_risoluzione_alta: 960,
                tempo_risoluzione_normale: 1440,
                tempo_risoluzione_bassa: 4320,
                attivo: true,
            });
        }
        store
    }

    /// Every storico row, including those of soft-deleted tickets.
    pub fn all_storico(&self, ticket_id: i32) -> Vec<TicketStorico> {
        self.state()
            .storico
            .iter()
            .filter(|s| s.ticket_id == ticket_id)
            .cloned()
            .collect()
    }

    pub fn raw_ticket(&self, ticket_id: i32) -> Option<Ticket> {
        self.state().tickets.iter().find(|t| t.id == ticket_id).cloned()
    }

    /// Rewrites a stored number, as rows imported from an earlier system carry.
    pub fn set_ticket_numero(&self, ticket_id: i32, numero: &str) {
        if let Some(ticket) = self.state().tickets.iter_mut().find(|t| t.id == ticket_id) {
            ticket.numero = numero.to_string();
        }
    }

    /// Drops the per-year counters so the next allocation reseeds from stored numbers.
    pub fn clear_counters(&self) {
        self.state().counters.clear();
    }

    pub fn set_password_hash(&self, tecnico_id: i32, hashed_password: String) {
        if let Some(tecnico) = self
            .state()
            .tecnici
            .iter_mut()
            .find(|t| t.id == tecnico_id)
        {
            tecnico.hashed_password = hashed_password;
        }
    }
}

#[async_trait]
impl LookupExt for MemoryStore {
    async fn get_lookup_tables(&self) -> Result<LookupTables, Error> {
        Ok(self.state().lookups.clone())
    }
}

#[async_trait]
impl TecnicoExt for MemoryStore {
    async fn get_tecnico(&self, tecnico_id: i32) -> Result<Option<Tecnico>, Error> {
        Ok(self
            .state()
            .tecnici
            .iter()
            .find(|t| t.id == tecnico_id && t.attivo)
            .cloned())
    }

    async fn get_tecnico_by_username(&self, username: &str) -> Result<Option<Tecnico>, Error> {
        Ok(self
            .state()
            .tecnici
            .iter()
            .find(|t| t.username == username && t.attivo)
            .cloned())
    }

    async fn get_tecnici(
        &self,
        search: Option<&str>,
        ruolo_id: Option<i32>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Tecnico>, i64), Error> {
        let mut rows: Vec<Tecnico> = self
            .state()
            .tecnici
            .iter()
            .filter(|t| t.attivo)
            .filter(|t| ruolo_id.map_or(true, |r| t.ruolo_id == r))
            .filter(|t| {
                search.map_or(true, |s| {
                    contains(Some(&t.nome), s)
                        || contains(Some(&t.cognome), s)
                        || contains(Some(&t.email), s)
                        || contains(Some(&t.username), s)
                })
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            (&a.cognome, &a.nome, a.id).cmp(&(&b.cognome, &b.nome, b.id))
        });
        Ok(page(rows, limit, offset))
    }

    async fn find_tecnico(&self, tecnico_id: i32) -> Result<Option<Tecnico>, Error> {
        Ok(self.state().tecnici.iter().find(|t| t.id == tecnico_id).cloned())
    }

    async fn tecnico_taken(
        &self,
        username: &str,
        email: &str,
        except_id: Option<i32>,
    ) -> Result<bool, Error> {
        Ok(self.state().tecnici.iter().any(|t| {
            Some(t.id) != except_id && (t.username == username || t.email == email)
        }))
    }

    async fn create_tecnico(&self, new: NewTecnico) -> Result<Tecnico, Error> {
        let mut state = self.state();
        let ruolo_codice = state
            .lookups
            .ruoli
            .iter()
            .find(|r| r.id == new.ruolo_id)
            .map(|r| r.codice.clone())
            .ok_or(Error::RowNotFound)?;
        let now = Utc::now();
        let tecnico = Tecnico {
            id: state.next_id(),
            username: new.username,
            email: new.email,
            hashed_password: new.hashed_password,
            nome: new.nome,
            cognome: new.cognome,
            telefono: new.telefono,
            ruolo_id: new.ruolo_id,
            ruolo_codice,
            attivo: true,
            created_at: now,
            updated_at: now,
        };
        state.tecnici.push(tecnico.clone());
        Ok(tecnico)
    }

    async fn save_tecnico(&self, tecnico: &Tecnico) -> Result<Option<Tecnico>, Error> {
        let mut state = self.state();
        let ruolo_codice = state
            .lookups
            .ruoli
            .iter()
            .find(|r| r.id == tecnico.ruolo_id)
            .map(|r| r.codice.clone())
            .ok_or(Error::RowNotFound)?;
        let Some(slot) = state.tecnici.iter_mut().find(|t| t.id == tecnico.id) else {
            return Ok(None);
        };
        let mut saved = tecnico.clone();
        saved.ruolo_codice = ruolo_codice;
        saved.updated_at = touch(slot.updated_at);
        *slot = saved.clone();
        Ok(Some(saved))
    }
}

#[async_trait]
impl ClientExt for MemoryStore {
    async fn get_clienti(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Cliente>, i64), Error> {
        let rows = self
            .state()
            .clienti
            .iter()
            .filter(|c| c.attivo)
            .filter(|c| search.map_or(true, |s| contains(Some(&c.ragione_sociale), s)))
            .cloned()
            .collect();
        Ok(page(rows, limit, offset))
    }

    async fn get_cliente(&self, cliente_id: i32) -> Result<Option<Cliente>, Error> {
        Ok(self
            .state()
            .clienti
            .iter()
            .find(|c| c.id == cliente_id && c.attivo)
            .cloned())
    }

    async fn get_contratti(&self, cliente_id: i32) -> Result<Vec<Contratto>, Error> {
        Ok(self
            .state()
            .contratti
            .iter()
            .filter(|c| c.cliente_id == cliente_id && c.attivo)
            .cloned()
            .collect())
    }

    async fn get_contratto(&self, contratto_id: i32) -> Result<Option<Contratto>, Error> {
        Ok(self
            .state()
            .contratti
            .iter()
            .find(|c| c.id == contratto_id && c.attivo)
            .cloned())
    }

    async fn get_sedi(&self, cliente_id: i32) -> Result<Vec<Sede>, Error> {
        Ok(self
            .state()
            .sedi
            .iter()
            .filter(|s| s.cliente_id == cliente_id && s.attivo)
            .cloned()
            .collect())
    }

    async fn get_referenti(&self, cliente_id: i32) -> Result<Vec<Referente>, Error> {
        Ok(self
            .state()
            .referenti
            .iter()
            .filter(|r| r.cliente_id == cliente_id && r.attivo)
            .cloned()
            .collect())
    }

    async fn get_referente(&self, referente_id: i32) -> Result<Option<Referente>, Error> {
        Ok(self
            .state()
            .referenti
            .iter()
            .find(|r| r.id == referente_id && r.attivo)
            .cloned())
    }

    async fn get_sla_definizione(&self, sla_id: i32) -> Result<Option<SlaDefinizione>, Error> {
        Ok(self
            .state()
            .sla
            .iter()
            .find(|s| s.id == sla_id && s.attivo)
            .cloned())
    }

    async fn get_cliente_stats(&self, cliente_id: i32) -> Result<ClienteStats, Error> {
        let state = self.state();
        let finale = |stato_id: i32| {
            state
                .lookups
                .stati_ticket
                .iter()
                .any(|s| s.id == stato_id && s.finale)
        };
        let tickets: Vec<&Ticket> = state
            .tickets
            .iter()
            .filter(|t| t.attivo && t.cliente_id == cliente_id)
            .collect();
        Ok(ClienteStats {
            total_tickets: tickets.len() as i64,
            open_tickets: tickets.iter().filter(|t| !finale(t.stato_id)).count() as i64,
            total_interventi: state
                .interventi
                .iter()
                .filter(|i| i.attivo && i.cliente_id == cliente_id)
                .count() as i64,
        })
    }
}

#[async_trait]
impl TicketExt for MemoryStore {
    async fn get_tickets(
        &self,
        filter: &TicketFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Ticket>, i64), Error> {
        let mut rows: Vec<Ticket> = self
            .state()
            .tickets
            .iter()
            .filter(|t| t.attivo)
            .filter(|t| filter.stato_id.map_or(true, |v| t.stato_id == v))
            .filter(|t| filter.priorita_id.map_or(true, |v| t.priorita_id == v))
            .filter(|t| filter.tecnico_id.map_or(true, |v| t.tecnico_assegnato_id == Some(v)))
            .filter(|t| filter.cliente_id.map_or(true, |v| t.cliente_id == v))
            .filter(|t| {
                filter.search.as_deref().map_or(true, |s| {
                    contains(Some(&t.numero), s)
                        || contains(Some(&t.oggetto), s)
                        || contains(t.descrizione.as_deref(), s)
                })
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(page(rows, limit, offset))
    }

    async fn get_ticket(&self, ticket_id: i32) -> Result<Option<Ticket>, Error> {
        Ok(self
            .state()
            .tickets
            .iter()
            .find(|t| t.id == ticket_id && t.attivo)
            .cloned())
    }

    async fn create_ticket(
        &self,
        new: NewTicket,
        year: i32,
        storico: NewStorico,
    ) -> Result<Ticket, Error> {
        let mut state = self.state();
        let numero = state.allocate(SequenceKind::Ticket, year);
        let now = Utc::now();
        let ticket = Ticket {
            id: state.next_id(),
            numero,
            oggetto: new.oggetto,
            descrizione: new.descrizione,
            cliente_id: new.cliente_id,
            referente_id: new.referente_id,
            referente_nome: new.referente_nome,
            canale_id: new.canale_id,
            priorita_id: new.priorita_id,
            stato_id: new.stato_id,
            tecnico_assegnato_id: None,
            contratto_id: new.contratto_id,
            asset_id: new.asset_id,
            sla_scadenza_risposta: new.sla_scadenza_risposta,
            sla_scadenza_risoluzione: new.sla_scadenza_risoluzione,
            sla_prima_risposta_at: None,
            sla_paused_at: None,
            sla_paused_total_minutes: 0,
            data_chiusura: None,
            tipo_chiusura: None,
            note_chiusura: None,
            chiuso_da_id: None,
            attivo: true,
            created_at: now,
            updated_at: now,
        };
        state.tickets.push(ticket.clone());
        state.push_storico(ticket.id, &storico);
        Ok(ticket)
    }

    async fn save_ticket(
        &self,
        ticket: &Ticket,
        storico: NewStorico,
    ) -> Result<Option<Ticket>, Error> {
        let mut state = self.state();
        let Some(saved) = state.update_ticket(ticket) else {
            return Ok(None);
        };
        state.push_storico(saved.id, &storico);
        Ok(Some(saved))
    }

    async fn create_intervention_from_ticket(
        &self,
        ticket: &Ticket,
        intervento: NewIntervento,
        year: i32,
        mut storico: NewStorico,
    ) -> Result<Option<(Ticket, Intervento)>, Error> {
        let mut state = self.state();
        let Some(saved) = state.update_ticket(ticket) else {
            return Ok(None);
        };
        let created = state.insert_intervento(&intervento, year);
        storico.valore_nuovo = Some(created.numero.clone());
        state.push_storico(saved.id, &storico);
        Ok(Some((saved, created)))
    }

    async fn create_richiesta_from_ticket(
        &self,
        ticket: &Ticket,
        new: NewRichiesta,
        storico: NewStorico,
    ) -> Result<Option<(Ticket, RichiestaIntervento)>, Error> {
        let mut state = self.state();
        let Some(saved) = state.update_ticket(ticket) else {
            return Ok(None);
        };
        let now = Utc::now();
        let richiesta = RichiestaIntervento {
            id: state.next_id(),
            ticket_id: Some(new.ticket_id),
            cliente_id: new.cliente_id,
            contratto_id: new.contratto_id,
            descrizione: new.descrizione,
            priorita_id: new.priorita_id,
            tipo_intervento_id: new.tipo_intervento_id,
            tecnico_richiesto_id: Some(new.tecnico_richiesto_id),
            data_richiesta: now,
            data_preferita: new.data_preferita,
            stato: StatoRichiesta::Pendente,
            note: new.note,
            attivo: true,
            created_at: now,
            updated_at: now,
        };
        state.richieste.push(richiesta.clone());
        state.push_storico(saved.id, &storico);
        Ok(Some((saved, richiesta)))
    }

    async fn add_ticket_nota(
        &self,
        ticket_id: i32,
        tecnico_id: i32,
        nota: String,
    ) -> Result<TicketNota, Error> {
        let mut state = self.state();
        let nota = TicketNota {
            id: state.next_id(),
            ticket_id,
            tecnico_id,
            nota,
            created_at: Utc::now(),
        };
        state.note.push(nota.clone());
        Ok(nota)
    }

    async fn get_ticket_note(&self, ticket_id: i32) -> Result<Vec<TicketNota>, Error> {
        Ok(self
            .state()
            .note
            .iter()
            .filter(|n| n.ticket_id == ticket_id)
            .cloned()
            .collect())
    }

    async fn add_ticket_messaggio(
        &self,
        ticket_id: i32,
        tecnico_id: i32,
        messaggio: String,
    ) -> Result<TicketMessaggio, Error> {
        let mut state = self.state();
        let messaggio = TicketMessaggio {
            id: state.next_id(),
            ticket_id,
            mittente_tipo: MittenteTipo::Tecnico,
            mittente_tecnico_id: Some(tecnico_id),
            messaggio,
            letto: false,
            created_at: Utc::now(),
        };
        state.messaggi.push(messaggio.clone());
        Ok(messaggio)
    }

    async fn get_ticket_messaggi(&self, ticket_id: i32) -> Result<Vec<TicketMessaggio>, Error> {
        Ok(self
            .state()
            .messaggi
            .iter()
            .filter(|m| m.ticket_id == ticket_id)
            .cloned()
            .collect())
    }

    async fn get_ticket_storico(&self, ticket_id: i32) -> Result<Vec<TicketStorico>, Error> {
        Ok(self.all_storico(ticket_id))
    }

    async fn get_richieste(
        &self,
        stato: Option<StatoRichiesta>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<RichiestaIntervento>, i64), Error> {
        let mut rows: Vec<RichiestaIntervento> = self
            .state()
            .richieste
            .iter()
            .filter(|r| r.attivo && stato.map_or(true, |s| r.stato == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.data_richiesta.cmp(&a.data_richiesta).then(b.id.cmp(&a.id)));
        Ok(page(rows, limit, offset))
    }
}

#[async_trait]
impl InterventionExt for MemoryStore {
    async fn get_interventi(
        &self,
        filter: &InterventoFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Intervento>, i64), Error> {
        let mut rows: Vec<Intervento> = self
            .state()
            .interventi
            .iter()
            .filter(|i| i.attivo)
            .filter(|i| filter.stato_id.map_or(true, |v| i.stato_id == v))
            .filter(|i| filter.tecnico_id.map_or(true, |v| i.tecnico_id == v))
            .filter(|i| filter.cliente_id.map_or(true, |v| i.cliente_id == v))
            .filter(|i| filter.ticket_id.map_or(true, |v| i.ticket_id == Some(v)))
            .filter(|i| {
                filter.search.as_deref().map_or(true, |s| {
                    contains(Some(&i.numero), s)
                        || contains(Some(&i.oggetto), s)
                        || contains(i.descrizione_lavoro.as_deref(), s)
                })
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.data_inizio.cmp(&a.data_inizio).then(b.id.cmp(&a.id)));
        Ok(page(rows, limit, offset))
    }

    async fn get_intervento(&self, intervento_id: i32) -> Result<Option<Intervento>, Error> {
        Ok(self
            .state()
            .interventi
            .iter()
            .find(|i| i.id == intervento_id && i.attivo)
            .cloned())
    }

    async fn create_intervento(
        &self,
        intervento: NewIntervento,
        year: i32,
    ) -> Result<Intervento, Error> {
        Ok(self.state().insert_intervento(&intervento, year))
    }

    async fn save_intervento(&self, intervento: &Intervento) -> Result<Option<Intervento>, Error> {
        let mut state = self.state();
        let Some(slot) = state
            .interventi
            .iter_mut()
            .find(|i| i.id == intervento.id && i.updated_at == intervento.updated_at)
        else {
            return Ok(None);
        };
        let mut saved = intervento.clone();
        saved.updated_at = touch(slot.updated_at);
        *slot = saved.clone();
        Ok(Some(saved))
    }

    async fn get_righe(&self, intervento_id: i32) -> Result<Vec<InterventoRiga>, Error> {
        let mut rows: Vec<InterventoRiga> = self
            .state()
            .righe
            .iter()
            .filter(|r| r.intervento_id == intervento_id && r.attivo)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.numero_riga);
        Ok(rows)
    }

    async fn get_riga(
        &self,
        intervento_id: i32,
        riga_id: i32,
    ) -> Result<Option<InterventoRiga>, Error> {
        Ok(self
            .state()
            .righe
            .iter()
            .find(|r| r.id == riga_id && r.intervento_id == intervento_id && r.attivo)
            .cloned())
    }

    async fn add_riga(&self, new: NewRiga) -> Result<InterventoRiga, Error> {
        let mut state = self.state();
        let numero_riga = state
            .righe
            .iter()
            .filter(|r| r.intervento_id == new.intervento_id)
            .map(|r| r.numero_riga)
            .max()
            .unwrap_or(0)
            + 1;
        let now = Utc::now();
        let riga = InterventoRiga {
            id: state.next_id(),
            intervento_id: new.intervento_id,
            sessione_id: new.sessione_id,
            numero_riga,
            categoria_id: new.categoria_id,
            descrizione: new.descrizione,
            quantita: new.quantita,
            unita_misura: new.unita_misura,
            prezzo_unitario: new.prezzo_unitario,
            sconto_percentuale: new.sconto_percentuale,
            fatturabile: new.fatturabile,
            in_garanzia: new.in_garanzia,
            incluso_contratto: new.incluso_contratto,
            attivo: true,
            created_at: now,
            updated_at: now,
        };
        state.righe.push(riga.clone());
        Ok(riga)
    }

    async fn save_riga(&self, riga: &InterventoRiga) -> Result<Option<InterventoRiga>, Error> {
        let mut state = self.state();
        let Some(slot) = state
            .righe
            .iter_mut()
            .find(|r| r.id == riga.id && r.updated_at == riga.updated_at)
        else {
            return Ok(None);
        };
        let mut saved = riga.clone();
        saved.updated_at = touch(slot.updated_at);
        *slot = saved.clone();
        Ok(Some(saved))
    }

    async fn get_sessioni(&self, intervento_id: i32) -> Result<Vec<InterventoSessione>, Error> {
        let mut rows: Vec<InterventoSessione> = self
            .state()
            .sessioni
            .iter()
            .filter(|s| s.intervento_id == intervento_id && s.attivo)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.data.cmp(&b.data).then(a.ora_inizio.cmp(&b.ora_inizio)));
        Ok(rows)
    }

    async fn get_sessione(
        &self,
        intervento_id: i32,
        sessione_id: i32,
    ) -> Result<Option<InterventoSessione>, Error> {
        Ok(self
            .state()
            .sessioni
            .iter()
            .find(|s| s.id == sessione_id && s.intervento_id == intervento_id && s.attivo)
            .cloned())
    }

    async fn add_sessione(&self, new: NewSessione) -> Result<InterventoSessione, Error> {
        let mut state = self.state();
        let now = Utc::now();
        let sessione = InterventoSessione {
            id: state.next_id(),
            intervento_id: new.intervento_id,
            tecnico_id: new.tecnico_id,
            tipo_intervento_id: new.tipo_intervento_id,
            data: new.data,
            ora_inizio: new.ora_inizio,
            ora_fine: new.ora_fine,
            durata_minuti: new.durata_minuti,
            km_percorsi: new.km_percorsi,
            tempo_viaggio_minuti: new.tempo_viaggio_minuti,
            latitudine_inizio: new.latitudine_inizio,
            longitudine_inizio: new.longitudine_inizio,
            latitudine_fine: new.latitudine_fine,
            longitudine_fine: new.longitudine_fine,
            note: new.note,
            attivo: true,
            created_at: now,
            updated_at: now,
        };
        state.sessioni.push(sessione.clone());
        Ok(sessione)
    }

    async fn save_sessione(
        &self,
        sessione: &InterventoSessione,
    ) -> Result<Option<InterventoSessione>, Error> {
        let mut state = self.state();
        let Some(slot) = state
            .sessioni
            .iter_mut()
            .find(|s| s.id == sessione.id && s.updated_at == sessione.updated_at)
        else {
            return Ok(None);
        };
        let mut saved = sessione.clone();
        saved.updated_at = touch(slot.updated_at);
        *slot = saved.clone();
        Ok(Some(saved))
    }
}
