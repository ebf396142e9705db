// src/service/lookup_registry.rs
use crate::{
    models::lookupmodel::*,
    service::error::ServiceError,
};

const LIVELLO_PRIORITA_DEFAULT: i32 = 3;

/// Origin stamped on interventions spawned from a ticket.
const ORIGINE_DA_TICKET: &str = "DA_TICKET";
/// Type given to interventions spawned from a ticket.
const TIPO_PRESSO_CLIENTE: &str = "PRESSO_CLIENTE";

/// Ids of the rows new records are created with.
#[derive(Debug, Clone, Copy)]
pub struct WellKnownIds {
    pub ticket_nuovo: i32,
    pub intervento_in_corso: i32,
    pub origine_da_ticket: i32,
    pub tipo_presso_cliente: i32,
    pub priorita_default: i32,
}

/// Reference data held in memory for the life of the process.
#[derive(Debug, Clone)]
pub struct LookupRegistry {
    tables: LookupTables,
    ids: WellKnownIds,
}

impl LookupRegistry {
    /// Fails when a code the engines depend on is absent or inactive.
    pub fn from_tables(tables: LookupTables) -> Result<Self, ServiceError> {
        let ticket = |code: TicketStatusCode| {
            find_active(&tables.stati_ticket, code.to_str(), |s| (&s.codice, s.attivo, s.id))
                .ok_or_else(|| missing("stati_ticket", code.to_str()))
        };
        let intervento = |code: InterventionStatusCode| {
            find_active(&tables.stati_intervento, code.to_str(), |s| (&s.codice, s.attivo, s.id))
                .ok_or_else(|| missing("stati_intervento", code.to_str()))
        };

        // Codes the transitions look up by name.
        for code in [
            TicketStatusCode::PresoCarico,
            TicketStatusCode::Schedulato,
            TicketStatusCode::Chiuso,
        ] {
            ticket(code)?;
        }
        intervento(InterventionStatusCode::Completato)?;

        let ids = WellKnownIds {
            ticket_nuovo: ticket(TicketStatusCode::Nuovo)?,
            intervento_in_corso: intervento(InterventionStatusCode::InCorso)?,
            origine_da_ticket: find_active(&tables.origini_intervento, ORIGINE_DA_TICKET, |o| {
                (&o.codice, o.attivo, o.id)
            })
            .ok_or_else(|| missing("origini_intervento", ORIGINE_DA_TICKET))?,
            tipo_presso_cliente: find_active(&tables.tipi_intervento, TIPO_PRESSO_CLIENTE, |t| {
                (&t.codice, t.attivo, t.id)
            })
            .ok_or_else(|| missing("tipi_intervento", TIPO_PRESSO_CLIENTE))?,
            priorita_default: tables
                .priorita
                .iter()
                .find(|p| p.attivo && p.livello == LIVELLO_PRIORITA_DEFAULT)
                .map(|p| p.id)
                .ok_or_else(|| missing("priorita", "livello 3"))?,
        };

        tracing::info!(
            priorita = tables.priorita.len(),
            stati_ticket = tables.stati_ticket.len(),
            stati_intervento = tables.stati_intervento.len(),
            "lookup registry loaded"
        );

        Ok(LookupRegistry { tables, ids })
    }

    pub fn ids(&self) -> &WellKnownIds {
        &self.ids
    }

    pub fn tables(&self) -> &LookupTables {
        &self.tables
    }

    pub fn stato_ticket(&self, id: i32) -> Option<&StatoTicket> {
        self.tables.stati_ticket.iter().find(|s| s.id == id)
    }

    pub fn ticket_status_code(&self, id: i32) -> Option<TicketStatusCode> {
        self.stato_ticket(id).and_then(|s| TicketStatusCode::from_code(&s.codice))
    }

    pub fn stato_intervento(&self, id: i32) -> Option<&StatoIntervento> {
        self.tables.stati_intervento.iter().find(|s| s.id == id)
    }

    /// Row id a ticket transition moves to.
    pub fn ticket_status_id(&self, code: TicketStatusCode) -> Result<i32, ServiceError> {
        find_active(&self.tables.stati_ticket, code.to_str(), |s| (&s.codice, s.attivo, s.id))
            .ok_or_else(|| missing("stati_ticket", code.to_str()))
    }

    pub fn intervention_status_id(&self, code: InterventionStatusCode) -> Result<i32, ServiceError> {
        find_active(&self.tables.stati_intervento, code.to_str(), |s| (&s.codice, s.attivo, s.id))
            .ok_or_else(|| missing("stati_intervento", code.to_str()))
    }

    pub fn priorita(&self, id: i32) -> Option<&Priorita> {
        self.tables.priorita.iter().find(|p| p.id == id)
    }

    pub fn tipo_intervento(&self, id: i32) -> Option<&TipoIntervento> {
        self.tables.tipi_intervento.iter().find(|t| t.id == id)
    }

    pub fn categoria(&self, id: i32) -> Option<&CategoriaAttivita> {
        self.tables.categorie_attivita.iter().find(|c| c.id == id)
    }

    pub fn origine(&self, id: i32) -> Option<&LookupVoce> {
        self.tables.origini_intervento.iter().find(|o| o.id == id)
    }

    pub fn canale(&self, id: i32) -> Option<&LookupVoce> {
        self.tables.canali_richiesta.iter().find(|c| c.id == id)
    }

    pub fn ruolo(&self, id: i32) -> Option<&LookupVoce> {
        self.tables.ruoli.iter().find(|r| r.id == id)
    }

    // Active-only resolvers for ids arriving from callers.

    pub fn active_stato_ticket(&self, id: i32) -> Result<&StatoTicket, ServiceError> {
        self.stato_ticket(id)
            .filter(|s| s.attivo)
            .ok_or_else(|| ServiceError::not_found("StatoTicket", id))
    }

    pub fn active_stato_intervento(&self, id: i32) -> Result<&StatoIntervento, ServiceError> {
        self.stato_intervento(id)
            .filter(|s| s.attivo)
            .ok_or_else(|| ServiceError::not_found("StatoIntervento", id))
    }

    pub fn active_priorita(&self, id: i32) -> Result<&Priorita, ServiceError> {
        self.priorita(id)
            .filter(|p| p.attivo)
            .ok_or_else(|| ServiceError::not_found("Priorita", id))
    }

    pub fn active_tipo_intervento(&self, id: i32) -> Result<&TipoIntervento, ServiceError> {
        self.tipo_intervento(id)
            .filter(|t| t.attivo)
            .ok_or_else(|| ServiceError::not_found("TipoIntervento", id))
    }

    pub fn active_categoria(&self, id: i32) -> Result<&CategoriaAttivita, ServiceError> {
        self.categoria(id)
            .filter(|c| c.attivo)
            .ok_or_else(|| ServiceError::not_found("CategoriaAttivita", id))
    }

    pub fn active_origine(&self, id: i32) -> Result<&LookupVoce, ServiceError> {
        self.origine(id)
            .filter(|o| o.attivo)
            .ok_or_else(|| ServiceError::not_found("OrigineIntervento", id))
    }

    pub fn active_canale(&self, id: i32) -> Result<&LookupVoce, ServiceError> {
        self.canale(id)
            .filter(|c| c.attivo)
            .ok_or_else(|| ServiceError::not_found("CanaleRichiesta", id))
    }

    pub fn active_ruolo(&self, id: i32) -> Result<&LookupVoce, ServiceError> {
        self.ruolo(id)
            .filter(|r| r.attivo)
            .ok_or_else(|| ServiceError::not_found("Ruolo", id))
    }
}

fn find_active<T>(rows: &[T], code: &str, key: impl Fn(&T) -> (&String, bool, i32)) -> Option<i32> {
    rows.iter().find_map(|row| {
        let (codice, attivo, id) = key(row);
        (attivo && codice == code).then_some(id)
    })
}

fn missing(table: &str, code: &str) -> ServiceError {
    ServiceError::Configuration(format!("required lookup row {} missing from {}", code, table))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use bigdecimal::BigDecimal;

    fn voce(id: i32, codice: &str) -> LookupVoce {
        LookupVoce {
            id,
            codice: codice.to_string(),
            descrizione: codice.to_string(),
            ordine: id,
            attivo: true,
        }
    }

    /// Same codes as the seed migration, with ids in declaration order.
    pub fn seeded_tables() -> LookupTables {
        let priorita = [("CRITICA", 5), ("URGENTE", 4), ("ALTA", 3), ("NORMALE", 2), ("BASSA", 1)]
            .iter()
            .enumerate()
            .map(|(i, (codice, livello))| Priorita {
                id: i as i32 + 1,
                codice: codice.to_string(),
                descrizione: codice.to_string(),
                livello: *livello,
                colore: None,
                ordine: i as i32 + 1,
                attivo: true,
            })
            .collect();

        let stati_ticket = [
            ("NUOVO", false),
            ("PRESO_CARICO", false),
            ("IN_LAVORAZIONE", false),
            ("ATTESA_CLIENTE", false),
            ("SCHEDULATO", false),
            ("CHIUSO", true),
            ("ANNULLATO", true),
        ]
        .iter()
        .enumerate()
        .map(|(i, (codice, finale))| StatoTicket {
            id: i as i32 + 1,
            codice: codice.to_string(),
            descrizione: codice.to_string(),
            colore: None,
            finale: *finale,
            ordine: i as i32 + 1,
            attivo: true,
        })
        .collect();

        let stati_intervento = [
            ("PIANIFICATO", false),
            ("IN_CORSO", false),
            ("SOSPESO", false),
            ("COMPLETATO", true),
            ("ANNULLATO", true),
        ]
        .iter()
        .enumerate()
        .map(|(i, (codice, finale))| StatoIntervento {
            id: i as i32 + 1,
            codice: codice.to_string(),
            descrizione: codice.to_string(),
            colore: None,
            finale: *finale,
            ordine: i as i32 + 1,
            attivo: true,
        })
        .collect();

        let tipi_intervento = ["PRESSO_CLIENTE", "REMOTO", "TELEFONICO"]
            .iter()
            .enumerate()
            .map(|(i, codice)| TipoIntervento {
                id: i as i32 + 1,
                codice: codice.to_string(),
                descrizione: codice.to_string(),
                colore: None,
                richiede_viaggio: i == 0,
                ordine: i as i32 + 1,
                attivo: true,
            })
            .collect();

        let categorie_attivita = vec![
            CategoriaAttivita {
                id: 1,
                codice: "SUPPORTO".to_string(),
                descrizione: "Supporto tecnico".to_string(),
                prezzo_unitario_default: Some(BigDecimal::from(50)),
                ordine: 1,
                attivo: true,
            },
            CategoriaAttivita {
                id: 2,
                codice: "MATERIALE".to_string(),
                descrizione: "Materiale".to_string(),
                prezzo_unitario_default: None,
                ordine: 2,
                attivo: true,
            },
        ];

        LookupTables {
            priorita,
            stati_ticket,
            stati_intervento,
            tipi_intervento,
            categorie_attivita,
            origini_intervento: vec![voce(1, "DA_TICKET"), voce(2, "DA_PIANIFICAZIONE")],
            canali_richiesta: vec![voce(1, "EMAIL"), voce(2, "TELEFONO")],
            ruoli: vec![
                voce(1, "ADMIN"),
                voce(2, "MANAGER"),
                voce(3, "TECNICO_SENIOR"),
                voce(4, "TECNICO"),
                voce(5, "USER"),
            ],
        }
    }
}
