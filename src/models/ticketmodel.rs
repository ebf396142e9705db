// src/models/ticketmodel.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "tipo_chiusura", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoChiusura {
    Diretta,
    InterventoImmediato,
    RichiestaIntervento,
}

impl TipoChiusura {
    pub fn to_str(&self) -> &str {
        match self {
            TipoChiusura::Diretta => "DIRETTA",
            TipoChiusura::InterventoImmediato => "INTERVENTO_IMMEDIATO",
            TipoChiusura::RichiestaIntervento => "RICHIESTA_INTERVENTO",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "stato_richiesta", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatoRichiesta {
    Pendente,
    Pianificata,
    Completata,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "mittente_tipo", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MittenteTipo {
    Tecnico,
    Cliente,
}

/// Labels written to `ticket_storico.azione`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AzioneStorico {
    Creato,
    Modificato,
    Assegnato,
    PresoCarico,
    Chiuso,
    Eliminato,
    InterventoCreato,
    RichiestaIntervento,
}

impl AzioneStorico {
    pub fn to_str(&self) -> &'static str {
        match self {
            AzioneStorico::Creato => "CREATO",
            AzioneStorico::Modificato => "MODIFICATO",
            AzioneStorico::Assegnato => "ASSEGNATO",
            AzioneStorico::PresoCarico => "PRESO_CARICO",
            AzioneStorico::Chiuso => "CHIUSO",
            AzioneStorico::Eliminato => "ELIMINATO",
            AzioneStorico::InterventoCreato => "INTERVENTO_CREATO",
            AzioneStorico::RichiestaIntervento => "RICHIESTA_INTERVENTO",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ticket {
    pub id: i32,
    pub numero: String,
    pub oggetto: String,
    pub descrizione: Option<String>,
    pub cliente_id: i32,
    pub referente_id: Option<i32>,
    pub referente_nome: Option<String>,
    pub canale_id: i32,
    pub priorita_id: i32,
    pub stato_id: i32,
    pub tecnico_assegnato_id: Option<i32>,
    pub contratto_id: Option<i32>,
    pub asset_id: Option<i32>,
    pub sla_scadenza_risposta: Option<DateTime<Utc>>,
    pub sla_scadenza_risoluzione: Option<DateTime<Utc>>,
    pub sla_prima_risposta_at: Option<DateTime<Utc>>,
    pub sla_paused_at: Option<DateTime<Utc>>,
    pub sla_paused_total_minutes: i32,
    pub data_chiusura: Option<DateTime<Utc>>,
    pub tipo_chiusura: Option<TipoChiusura>,
    pub note_chiusura: Option<String>,
    pub chiuso_da_id: Option<i32>,
    pub attivo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload; `numero` is allocated inside the insert transaction.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub oggetto: String,
    pub descrizione: Option<String>,
    pub cliente_id: i32,
    pub referente_id: Option<i32>,
    pub referente_nome: Option<String>,
    pub canale_id: i32,
    pub priorita_id: i32,
    pub stato_id: i32,
    pub contratto_id: Option<i32>,
    pub asset_id: Option<i32>,
    pub sla_scadenza_risposta: Option<DateTime<Utc>>,
    pub sla_scadenza_risoluzione: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketNota {
    pub id: i32,
    pub ticket_id: i32,
    pub tecnico_id: i32,
    pub nota: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketMessaggio {
    pub id: i32,
    pub ticket_id: i32,
    pub mittente_tipo: MittenteTipo,
    pub mittente_tecnico_id: Option<i32>,
    pub messaggio: String,
    pub letto: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TicketStorico {
    pub id: i32,
    pub ticket_id: i32,
    pub tecnico_id: Option<i32>,
    pub azione: String,
    pub campo_modificato: Option<String>,
    pub valore_precedente: Option<String>,
    pub valore_nuovo: Option<String>,
    pub descrizione: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Audit entry written in the same transaction as the mutation it describes.
#[derive(Debug, Clone)]
pub struct NewStorico {
    pub tecnico_id: Option<i32>,
    pub azione: AzioneStorico,
    pub campo_modificato: Option<String>,
    pub valore_precedente: Option<String>,
    pub valore_nuovo: Option<String>,
    pub descrizione: String,
}

impl NewStorico {
    pub fn new(tecnico_id: i32, azione: AzioneStorico, descrizione: impl Into<String>) -> Self {
        NewStorico {
            tecnico_id: Some(tecnico_id),
            azione,
            campo_modificato: None,
            valore_precedente: None,
            valore_nuovo: None,
            descrizione: descrizione.into(),
        }
    }

    pub fn campo(
        mut self,
        campo: impl Into<String>,
        precedente: Option<String>,
        nuovo: Option<String>,
    ) -> Self {
        self.campo_modificato = Some(campo.into());
        self.valore_precedente = precedente;
        self.valore_nuovo = nuovo;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RichiestaIntervento {
    pub id: i32,
    pub ticket_id: Option<i32>,
    pub cliente_id: i32,
    pub contratto_id: Option<i32>,
    pub descrizione: String,
    pub priorita_id: i32,
    pub tipo_intervento_id: Option<i32>,
    pub tecnico_richiesto_id: Option<i32>,
    pub data_richiesta: DateTime<Utc>,
    pub data_preferita: Option<NaiveDate>,
    pub stato: StatoRichiesta,
    pub note: Option<String>,
    pub attivo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRichiesta {
    pub ticket_id: i32,
    pub cliente_id: i32,
    pub contratto_id: Option<i32>,
    pub descrizione: String,
    pub priorita_id: i32,
    pub tipo_intervento_id: Option<i32>,
    pub tecnico_richiesto_id: i32,
    pub data_preferita: Option<NaiveDate>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub stato_id: Option<i32>,
    pub priorita_id: Option<i32>,
    pub tecnico_id: Option<i32>,
    pub cliente_id: Option<i32>,
    pub search: Option<String>,
}
