use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    models::{
        clientmodel::ClienteSimple,
        interventionmodel::{Intervento, InterventoFilter, InterventoRiga, InterventoSessione, InterventoTotali},
        lookupmodel::{LookupVoce, StatoIntervento, TipoIntervento},
        usermodel::TecnicoSimple,
    },
    service::state_machine::InterventionEvent,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateInterventionDto {
    pub cliente_id: i32,

    pub contratto_id: Option<i32>,

    pub ticket_id: Option<i32>,

    pub tipo_intervento_id: i32,

    pub stato_id: i32,

    pub origine_id: i32,

    pub tecnico_id: i32,

    #[validate(length(min = 1, max = 200, message = "oggetto must be between 1 and 200 characters"))]
    pub oggetto: String,

    pub descrizione_lavoro: Option<String>,

    pub note_interne: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateInterventionDto {
    pub tipo_intervento_id: Option<i32>,

    pub stato_id: Option<i32>,

    #[validate(length(min = 1, max = 200, message = "oggetto must be between 1 and 200 characters"))]
    pub oggetto: Option<String>,

    pub descrizione_lavoro: Option<String>,

    pub note_interne: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct StartInterventionDto {
    #[validate(length(max = 5000, message = "note_avvio must be at most 5000 characters"))]
    pub note_avvio: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CompleteInterventionDto {
    #[validate(length(min = 1, message = "descrizione_lavoro is required"))]
    pub descrizione_lavoro: String,

    /// Base64 image, optionally as a `data:` URL.
    pub firma_cliente: Option<String>,

    #[validate(length(max = 200, message = "firma_nome must be at most 200 characters"))]
    pub firma_nome: Option<String>,

    #[validate(length(max = 100, message = "firma_ruolo must be at most 100 characters"))]
    pub firma_ruolo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddActivityDto {
    pub categoria_id: i32,

    #[validate(length(min = 1, message = "descrizione is required"))]
    pub descrizione: String,

    #[serde(alias = "durata")]
    #[validate(range(min = 1, max = 10080, message = "durata_minuti must be between 1 and 10080"))]
    pub durata_minuti: i32,

    #[validate(range(min = 0.0, message = "prezzo_unitario must not be negative"))]
    pub prezzo_unitario: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateRowDto {
    pub categoria_id: Option<i32>,

    #[validate(length(min = 1, message = "descrizione must not be empty"))]
    pub descrizione: Option<String>,

    #[validate(range(min = 0.01, message = "quantita must be positive"))]
    pub quantita: Option<f64>,

    #[validate(range(min = 0.0, message = "prezzo_unitario must not be negative"))]
    pub prezzo_unitario: Option<f64>,

    #[validate(range(min = 0.0, max = 100.0, message = "sconto_percentuale must be between 0 and 100"))]
    pub sconto_percentuale: Option<f64>,

    pub fatturabile: Option<bool>,

    pub in_garanzia: Option<bool>,

    pub incluso_contratto: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSessionDto {
    pub data: NaiveDate,

    pub ora_inizio: NaiveTime,

    pub ora_fine: Option<NaiveTime>,

    pub tipo_intervento_id: i32,

    #[validate(range(min = 0.0, message = "km_percorsi must not be negative"))]
    pub km_percorsi: Option<f64>,

    #[validate(range(min = 0, message = "tempo_viaggio_minuti must not be negative"))]
    pub tempo_viaggio_minuti: Option<i32>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitudine_inizio: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitudine_inizio: Option<f64>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitudine_fine: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitudine_fine: Option<f64>,

    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateSessionDto {
    pub data: Option<NaiveDate>,

    pub ora_inizio: Option<NaiveTime>,

    pub ora_fine: Option<NaiveTime>,

    pub tipo_intervento_id: Option<i32>,

    #[validate(range(min = 0.0, message = "km_percorsi must not be negative"))]
    pub km_percorsi: Option<f64>,

    #[validate(range(min = 0, message = "tempo_viaggio_minuti must not be negative"))]
    pub tempo_viaggio_minuti: Option<i32>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitudine_fine: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitudine_fine: Option<f64>,

    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterventionQuery {
    pub stato_id: Option<i32>,
    pub tecnico_id: Option<i32>,
    pub cliente_id: Option<i32>,
    pub ticket_id: Option<i32>,
    pub search: Option<String>,
}

impl From<InterventionQuery> for InterventoFilter {
    fn from(query: InterventionQuery) -> Self {
        InterventoFilter {
            stato_id: query.stato_id,
            tecnico_id: query.tecnico_id,
            cliente_id: query.cliente_id,
            ticket_id: query.ticket_id,
            search: query.search.filter(|s| !s.trim().is_empty()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InterventionResponseDto {
    #[serde(flatten)]
    pub intervento: Intervento,
    pub cliente: Option<ClienteSimple>,
    pub tecnico: Option<TecnicoSimple>,
    pub stato: Option<StatoIntervento>,
    pub tipo_intervento: Option<TipoIntervento>,
    pub origine: Option<LookupVoce>,
    pub azioni_disponibili: Vec<InterventionEvent>,
}

/// Intervention with its rows, sessions and computed totals.
#[derive(Debug, Serialize)]
pub struct InterventionDetailResponseDto {
    #[serde(flatten)]
    pub intervento: InterventionResponseDto,
    pub righe: Vec<RowResponseDto>,
    pub sessioni: Vec<InterventoSessione>,
    pub totali: InterventoTotali,
}

/// Row with its computed amount.
#[derive(Debug, Serialize)]
pub struct RowResponseDto {
    #[serde(flatten)]
    pub riga: InterventoRiga,
    pub importo: BigDecimal,
}

impl From<InterventoRiga> for RowResponseDto {
    fn from(riga: InterventoRiga) -> Self {
        let importo = riga.importo();
        RowResponseDto { riga, importo }
    }
}
