// src/models/interventionmodel.rs
use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

pub const UNITA_ORE: &str = "ore";

const MINUTI_GIORNO: i32 = 24 * 60;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Intervento {
    pub id: i32,
    pub numero: String,
    pub origine_id: i32,
    pub cliente_id: i32,
    pub ticket_id: Option<i32>,
    pub richiesta_id: Option<i32>,
    pub evento_calendario_id: Option<i32>,
    pub contratto_id: Option<i32>,
    pub tipo_intervento_id: i32,
    pub stato_id: i32,
    pub tecnico_id: i32,
    pub oggetto: String,
    pub descrizione_lavoro: Option<String>,
    pub note_interne: Option<String>,
    pub data_inizio: Option<DateTime<Utc>>,
    pub data_fine: Option<DateTime<Utc>>,
    pub firma_cliente: Option<String>,
    pub firma_nome: Option<String>,
    pub firma_ruolo: Option<String>,
    pub firma_data: Option<DateTime<Utc>>,
    pub sincronizzato_gestionale: bool,
    pub codice_gestionale: Option<String>,
    pub data_sincronizzazione: Option<DateTime<Utc>>,
    pub errore_sincronizzazione: Option<String>,
    pub attivo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewIntervento {
    pub origine_id: i32,
    pub cliente_id: i32,
    pub ticket_id: Option<i32>,
    pub richiesta_id: Option<i32>,
    pub contratto_id: Option<i32>,
    pub tipo_intervento_id: i32,
    pub stato_id: i32,
    pub tecnico_id: i32,
    pub oggetto: String,
    pub descrizione_lavoro: Option<String>,
    pub note_interne: Option<String>,
    pub data_inizio: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InterventoRiga {
    pub id: i32,
    pub intervento_id: i32,
    pub sessione_id: Option<i32>,
    pub numero_riga: i32,
    pub categoria_id: i32,
    pub descrizione: String,
    pub quantita: BigDecimal,
    pub unita_misura: String,
    pub prezzo_unitario: BigDecimal,
    pub sconto_percentuale: BigDecimal,
    pub fatturabile: bool,
    pub in_garanzia: bool,
    pub incluso_contratto: bool,
    pub attivo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InterventoRiga {
    /// quantita × prezzo × (1 − sconto/100), rounded to cents.
    pub fn importo(&self) -> BigDecimal {
        calcola_importo(&self.quantita, &self.prezzo_unitario, &self.sconto_percentuale)
    }
}

pub fn calcola_importo(quantita: &BigDecimal, prezzo: &BigDecimal, sconto: &BigDecimal) -> BigDecimal {
    let cento = BigDecimal::from(100);
    let lordo = quantita * prezzo;
    let netto = lordo * (&cento - sconto) / cento;
    netto.with_scale_round(2, RoundingMode::HalfUp)
}

/// Hours billed for a duration in minutes, rounded to two decimals.
pub fn ore_da_minuti(minuti: i32) -> BigDecimal {
    (BigDecimal::from(minuti) / BigDecimal::from(60)).with_scale_round(2, RoundingMode::HalfUp)
}

/// `numero_riga` is allocated by the store.
#[derive(Debug, Clone)]
pub struct NewRiga {
    pub intervento_id: i32,
    pub sessione_id: Option<i32>,
    pub categoria_id: i32,
    pub descrizione: String,
    pub quantita: BigDecimal,
    pub unita_misura: String,
    pub prezzo_unitario: BigDecimal,
    pub sconto_percentuale: BigDecimal,
    pub fatturabile: bool,
    pub in_garanzia: bool,
    pub incluso_contratto: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InterventoSessione {
    pub id: i32,
    pub intervento_id: i32,
    pub tecnico_id: i32,
    pub tipo_intervento_id: i32,
    pub data: NaiveDate,
    pub ora_inizio: NaiveTime,
    pub ora_fine: Option<NaiveTime>,
    pub durata_minuti: Option<i32>,
    pub km_percorsi: Option<BigDecimal>,
    pub tempo_viaggio_minuti: Option<i32>,
    pub latitudine_inizio: Option<f64>,
    pub longitudine_inizio: Option<f64>,
    pub latitudine_fine: Option<f64>,
    pub longitudine_fine: Option<f64>,
    pub note: Option<String>,
    pub attivo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InterventoSessione {
    pub fn ricalcola_durata(&mut self) {
        self.durata_minuti = self.ora_fine.map(|fine| durata_minuti(self.ora_inizio, fine));
    }
}

/// Minutes between two wall-clock times; an end before the start wraps past midnight.
pub fn durata_minuti(inizio: NaiveTime, fine: NaiveTime) -> i32 {
    let inizio = (inizio.hour() * 60 + inizio.minute()) as i32;
    let fine = (fine.hour() * 60 + fine.minute()) as i32;
    (fine - inizio).rem_euclid(MINUTI_GIORNO)
}

#[derive(Debug, Clone)]
pub struct NewSessione {
    pub intervento_id: i32,
    pub tecnico_id: i32,
    pub tipo_intervento_id: i32,
    pub data: NaiveDate,
    pub ora_inizio: NaiveTime,
    pub ora_fine: Option<NaiveTime>,
    pub durata_minuti: Option<i32>,
    pub km_percorsi: Option<BigDecimal>,
    pub tempo_viaggio_minuti: Option<i32>,
    pub latitudine_inizio: Option<f64>,
    pub longitudine_inizio: Option<f64>,
    pub latitudine_fine: Option<f64>,
    pub longitudine_fine: Option<f64>,
    pub note: Option<String>,
}

/// Hours from active sessions, amounts from active rows.
#[derive(Debug, Clone, Serialize)]
pub struct InterventoTotali {
    pub ore_totali: BigDecimal,
    pub importo_totale: BigDecimal,
    pub importo_fatturabile: BigDecimal,
}

impl InterventoTotali {
    pub fn calcola(righe: &[InterventoRiga], sessioni: &[InterventoSessione]) -> Self {
        let minuti: i32 = sessioni
            .iter()
            .filter(|s| s.attivo)
            .filter_map(|s| s.durata_minuti)
            .sum();

        let attive = || righe.iter().filter(|r| r.attivo);
        let importo_totale = somma(attive().map(InterventoRiga::importo));
        let importo_fatturabile = somma(
            attive()
                .filter(|r| r.fatturabile && !r.in_garanzia && !r.incluso_contratto)
                .map(InterventoRiga::importo),
        );

        InterventoTotali {
            ore_totali: ore_da_minuti(minuti),
            importo_totale,
            importo_fatturabile,
        }
    }
}

fn somma(valori: impl Iterator<Item = BigDecimal>) -> BigDecimal {
    valori.fold(BigDecimal::from(0), |acc, v| acc + v)
}

#[derive(Debug, Clone, Default)]
pub struct InterventoFilter {
    pub stato_id: Option<i32>,
    pub tecnico_id: Option<i32>,
    pub cliente_id: Option<i32>,
    pub ticket_id: Option<i32>,
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn session_duration_same_day() {
        assert_eq!(durata_minuti(hm(9, 0), hm(17, 30)), 510);
    }

    #[test]
    fn session_duration_wraps_past_midnight() {
        assert_eq!(durata_minuti(hm(23, 0), hm(1, 0)), 120);
    }

    #[test]
    fn importo_applies_discount() {
        let importo = calcola_importo(
            &BigDecimal::from_str("2.0").unwrap(),
            &BigDecimal::from_str("50.00").unwrap(),
            &BigDecimal::from(10),
        );
        assert_eq!(importo, BigDecimal::from_str("90.00").unwrap());
    }

    fn riga(prezzo: i32, fatturabile: bool, in_garanzia: bool, attivo: bool) -> InterventoRiga {
        let now = Utc::now();
        InterventoRiga {
            id: 1,
            intervento_id: 1,
            sessione_id: None,
            numero_riga: 1,
            categoria_id: 1,
            descrizione: "Supporto".to_string(),
            quantita: BigDecimal::from(1),
            unita_misura: UNITA_ORE.to_string(),
            prezzo_unitario: BigDecimal::from(prezzo),
            sconto_percentuale: BigDecimal::from(0),
            fatturabile,
            in_garanzia,
            incluso_contratto: false,
            attivo,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn totals_skip_deleted_and_warranty_rows() {
        let righe = vec![
            riga(50, true, false, true),
            riga(30, true, true, true),
            riga(999, true, false, false),
        ];
        let totali = InterventoTotali::calcola(&righe, &[]);
        assert_eq!(totali.importo_totale, BigDecimal::from_str("80.00").unwrap());
        assert_eq!(totali.importo_fatturabile, BigDecimal::from_str("50.00").unwrap());
        assert_eq!(totali.ore_totali, BigDecimal::from(0));
    }

    #[test]
    fn minutes_convert_to_hours() {
        assert_eq!(ore_da_minuti(90), BigDecimal::from_str("1.5").unwrap());
        assert_eq!(ore_da_minuti(20), BigDecimal::from_str("0.33").unwrap());
    }
}
