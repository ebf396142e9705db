// src/models/lookupmodel.rs
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Priorita {
    pub id: i32,
    pub codice: String,
    pub descrizione: String,
    pub livello: i32,
    pub colore: Option<String>,
    pub ordine: i32,
    pub attivo: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StatoTicket {
    pub id: i32,
    pub codice: String,
    pub descrizione: String,
    pub colore: Option<String>,
    pub finale: bool,
    pub ordine: i32,
    pub attivo: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StatoIntervento {
    pub id: i32,
    pub codice: String,
    pub descrizione: String,
    pub colore: Option<String>,
    pub finale: bool,
    pub ordine: i32,
    pub attivo: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TipoIntervento {
    pub id: i32,
    pub codice: String,
    pub descrizione: String,
    pub colore: Option<String>,
    pub richiede_viaggio: bool,
    pub ordine: i32,
    pub attivo: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CategoriaAttivita {
    pub id: i32,
    pub codice: String,
    pub descrizione: String,
    pub prezzo_unitario_default: Option<BigDecimal>,
    pub ordine: i32,
    pub attivo: bool,
}

/// Shared shape of the plain code/description tables (origins, channels).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LookupVoce {
    pub id: i32,
    pub codice: String,
    pub descrizione: String,
    pub ordine: i32,
    pub attivo: bool,
}

/// Every reference table, as loaded at startup.
#[derive(Debug, Clone, Default)]
pub struct LookupTables {
    pub priorita: Vec<Priorita>,
    pub stati_ticket: Vec<StatoTicket>,
    pub stati_intervento: Vec<StatoIntervento>,
    pub tipi_intervento: Vec<TipoIntervento>,
    pub categorie_attivita: Vec<CategoriaAttivita>,
    pub origini_intervento: Vec<LookupVoce>,
    pub canali_richiesta: Vec<LookupVoce>,
    pub ruoli: Vec<LookupVoce>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketStatusCode {
    Nuovo,
    PresoCarico,
    InLavorazione,
    AttesaCliente,
    Schedulato,
    Chiuso,
    Annullato,
}

impl TicketStatusCode {
    pub fn to_str(&self) -> &'static str {
        match self {
            TicketStatusCode::Nuovo => "NUOVO",
            TicketStatusCode::PresoCarico => "PRESO_CARICO",
            TicketStatusCode::InLavorazione => "IN_LAVORAZIONE",
            TicketStatusCode::AttesaCliente => "ATTESA_CLIENTE",
            TicketStatusCode::Schedulato => "SCHEDULATO",
            TicketStatusCode::Chiuso => "CHIUSO",
            TicketStatusCode::Annullato => "ANNULLATO",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "NUOVO" => Some(TicketStatusCode::Nuovo),
            "PRESO_CARICO" => Some(TicketStatusCode::PresoCarico),
            "IN_LAVORAZIONE" => Some(TicketStatusCode::InLavorazione),
            "ATTESA_CLIENTE" => Some(TicketStatusCode::AttesaCliente),
            "SCHEDULATO" => Some(TicketStatusCode::Schedulato),
            "CHIUSO" => Some(TicketStatusCode::Chiuso),
            "ANNULLATO" => Some(TicketStatusCode::Annullato),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterventionStatusCode {
    Pianificato,
    InCorso,
    Sospeso,
    Completato,
    Annullato,
}

impl InterventionStatusCode {
    pub fn to_str(&self) -> &'static str {
        match self {
            InterventionStatusCode::Pianificato => "PIANIFICATO",
            InterventionStatusCode::InCorso => "IN_CORSO",
            InterventionStatusCode::Sospeso => "SOSPESO",
            InterventionStatusCode::Completato => "COMPLETATO",
            InterventionStatusCode::Annullato => "ANNULLATO",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "PIANIFICATO" => Some(InterventionStatusCode::Pianificato),
            "IN_CORSO" => Some(InterventionStatusCode::InCorso),
            "SOSPESO" => Some(InterventionStatusCode::Sospeso),
            "COMPLETATO" => Some(InterventionStatusCode::Completato),
            "ANNULLATO" => Some(InterventionStatusCode::Annullato),
            _ => None,
        }
    }
}

/// Priority bands an SLA definition carries minutes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityCode {
    Critica,
    Urgente,
    Alta,
    Normale,
    Bassa,
}

impl PriorityCode {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "CRITICA" => Some(PriorityCode::Critica),
            "URGENTE" => Some(PriorityCode::Urgente),
            "ALTA" => Some(PriorityCode::Alta),
            "NORMALE" => Some(PriorityCode::Normale),
            "BASSA" => Some(PriorityCode::Bassa),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip_through_their_labels() {
        for code in [
            TicketStatusCode::Nuovo,
            TicketStatusCode::PresoCarico,
            TicketStatusCode::AttesaCliente,
            TicketStatusCode::Chiuso,
        ] {
            assert_eq!(TicketStatusCode::from_code(code.to_str()), Some(code));
        }
        assert_eq!(InterventionStatusCode::from_code("IN_CORSO"), Some(InterventionStatusCode::InCorso));
        assert_eq!(TicketStatusCode::from_code("BOZZA"), None);
    }
}
