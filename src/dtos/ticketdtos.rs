use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    dtos::interventiondtos::InterventionResponseDto,
    models::{
        clientmodel::{ClienteSimple, ReferenteSimple},
        lookupmodel::{LookupVoce, Priorita, StatoTicket},
        ticketmodel::{RichiestaIntervento, StatoRichiesta, Ticket, TicketFilter, TipoChiusura},
        usermodel::TecnicoSimple,
    },
    service::state_machine::TicketEvent,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTicketDto {
    #[validate(length(min = 1, max = 200, message = "oggetto must be between 1 and 200 characters"))]
    pub oggetto: String,

    pub descrizione: Option<String>,

    pub cliente_id: i32,

    pub referente_id: Option<i32>,

    #[validate(length(max = 200, message = "referente_nome must be at most 200 characters"))]
    pub referente_nome: Option<String>,

    pub canale_id: i32,

    pub priorita_id: i32,

    pub contratto_id: Option<i32>,

    pub asset_id: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTicketDto {
    #[validate(length(min = 1, max = 200, message = "oggetto must be between 1 and 200 characters"))]
    pub oggetto: Option<String>,

    pub descrizione: Option<String>,

    pub priorita_id: Option<i32>,

    pub tecnico_assegnato_id: Option<i32>,

    pub stato_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignTicketDto {
    pub tecnico_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CloseTicketDto {
    pub tipo_chiusura: TipoChiusura,

    #[validate(length(max = 5000, message = "note_chiusura must be at most 5000 characters"))]
    pub note_chiusura: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ScheduleInterventionDto {
    pub data_preferita: Option<NaiveDate>,

    pub tipo_intervento_id: Option<i32>,

    #[validate(length(max = 5000, message = "note must be at most 5000 characters"))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TicketNoteDto {
    #[validate(length(min = 1, max = 10000, message = "nota must be between 1 and 10000 characters"))]
    pub nota: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TicketMessageDto {
    #[validate(length(min = 1, max = 10000, message = "messaggio must be between 1 and 10000 characters"))]
    pub messaggio: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketQuery {
    pub stato_id: Option<i32>,
    pub priorita_id: Option<i32>,
    pub tecnico_id: Option<i32>,
    pub cliente_id: Option<i32>,
    pub search: Option<String>,
}

impl From<TicketQuery> for TicketFilter {
    fn from(query: TicketQuery) -> Self {
        TicketFilter {
            stato_id: query.stato_id,
            priorita_id: query.priorita_id,
            tecnico_id: query.tecnico_id,
            cliente_id: query.cliente_id,
            search: query.search.filter(|s| !s.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RichiestaQuery {
    pub stato: Option<StatoRichiesta>,
}

#[derive(Debug, Serialize)]
pub struct TicketResponseDto {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub cliente: Option<ClienteSimple>,
    pub referente: Option<ReferenteSimple>,
    pub canale: Option<LookupVoce>,
    pub priorita: Option<Priorita>,
    pub stato: Option<StatoTicket>,
    pub tecnico_assegnato: Option<TecnicoSimple>,
    pub azioni_disponibili: Vec<TicketEvent>,
}

#[derive(Debug, Serialize)]
pub struct TicketInterventionResponseDto {
    pub ticket: TicketResponseDto,
    pub intervento: InterventionResponseDto,
}

#[derive(Debug, Serialize)]
pub struct TicketScheduleResponseDto {
    pub ticket: TicketResponseDto,
    pub richiesta: RichiestaIntervento,
}
