// src/models/clientmodel.rs
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::lookupmodel::PriorityCode;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Cliente {
    pub id: i32,
    pub codice_gestionale: String,
    pub ragione_sociale: String,
    pub partita_iva: Option<String>,
    pub codice_fiscale: Option<String>,
    pub indirizzo: Option<String>,
    pub cap: Option<String>,
    pub citta: Option<String>,
    pub provincia: Option<String>,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub note: Option<String>,
    pub attivo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contratto {
    pub id: i32,
    pub codice_gestionale: String,
    pub cliente_id: i32,
    pub descrizione: String,
    pub tipo_contratto: Option<String>,
    pub data_inizio: NaiveDate,
    pub data_fine: Option<NaiveDate>,
    pub ore_incluse: Option<BigDecimal>,
    pub ore_utilizzate: BigDecimal,
    pub sla_id: Option<i32>,
    pub attivo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Sede {
    pub id: i32,
    pub cliente_id: i32,
    pub nome_sede: String,
    pub codice_sede: Option<String>,
    pub indirizzo: String,
    pub cap: Option<String>,
    pub citta: String,
    pub provincia: Option<String>,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub note: Option<String>,
    pub attivo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Referente {
    pub id: i32,
    pub cliente_id: i32,
    pub sede_id: Option<i32>,
    pub nome: String,
    pub cognome: String,
    pub ruolo: Option<String>,
    pub telefono: Option<String>,
    pub cellulare: Option<String>,
    pub email: Option<String>,
    pub contatto_principale: bool,
    pub attivo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Referente {
    pub fn nome_completo(&self) -> String {
        format!("{} {}", self.nome, self.cognome)
    }
}

/// Client label embedded in ticket and intervention responses.
#[derive(Debug, Clone, Serialize)]
pub struct ClienteSimple {
    pub id: i32,
    pub codice_gestionale: String,
    pub ragione_sociale: String,
}

impl From<&Cliente> for ClienteSimple {
    fn from(cliente: &Cliente) -> Self {
        ClienteSimple {
            id: cliente.id,
            codice_gestionale: cliente.codice_gestionale.clone(),
            ragione_sociale: cliente.ragione_sociale.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferenteSimple {
    pub id: i32,
    pub nome: String,
    pub cognome: String,
    pub email: Option<String>,
}

impl From<&Referente> for ReferenteSimple {
    fn from(referente: &Referente) -> Self {
        ReferenteSimple {
            id: referente.id,
            nome: referente.nome.clone(),
            cognome: referente.cognome.clone(),
            email: referente.email.clone(),
        }
    }
}

/// Counters over a client's active tickets and interventions.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ClienteStats {
    pub total_tickets: i64,
    pub open_tickets: i64,
    pub total_interventi: i64,
}

/// Response and resolution targets in minutes, one per priority band.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SlaDefinizione {
    pub id: i32,
    pub nome: String,
    pub tempo_risposta_critica: i32,
    pub tempo_risposta_urgente: i32,
    pub tempo_risposta_alta: i32,
    pub tempo_risposta_normale: i32,
    pub tempo_risposta_bassa: i32,
    pub tempo_risoluzione_critica: i32,
    pub tempo_risoluzione_urgente: i32,
    pub tempo_risoluzione_alta: i32,
    pub tempo_risoluzione_normale: i32,
    pub tempo_risoluzione_bassa: i32,
    pub attivo: bool,
}

impl SlaDefinizione {
    pub fn minuti_risposta(&self, priorita: PriorityCode) -> i32 {
        match priorita {
            PriorityCode::Critica => self.tempo_risposta_critica,
            PriorityCode::Urgente => self.tempo_risposta_urgente,
            PriorityCode::Alta => self.tempo_risposta_alta,
            PriorityCode::Normale => self.tempo_risposta_normale,
            PriorityCode::Bassa => self.tempo_risposta_bassa,
        }
    }

    pub fn minuti_risoluzione(&self, priorita: PriorityCode) -> i32 {
        match priorita {
            PriorityCode::Critica => self.tempo_risoluzione_critica,
            PriorityCode::Urgente => self.tempo_risoluzione_urgente,
            PriorityCode::Alta => self.tempo_risoluzione_alta,
            PriorityCode::Normale => self.tempo_risoluzione_normale,
            PriorityCode::Bassa => self.tempo_risoluzione_bassa,
        }
    }
}
