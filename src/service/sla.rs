// src/service/sla.rs
use chrono::{DateTime, Duration, Utc};

use crate::models::{
    clientmodel::SlaDefinizione,
    lookupmodel::PriorityCode,
    ticketmodel::Ticket,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlaDeadlines {
    pub risposta: Option<DateTime<Utc>>,
    pub risoluzione: Option<DateTime<Utc>>,
}

/// Wall-clock deadlines from `opened_at`. Priorities outside the SLA bands get none.
pub fn deadlines_for(
    definizione: &SlaDefinizione,
    priorita: Option<PriorityCode>,
    opened_at: DateTime<Utc>,
) -> SlaDeadlines {
    match priorita {
        Some(p) => SlaDeadlines {
            risposta: Some(opened_at + Duration::minutes(definizione.minuti_risposta(p) as i64)),
            risoluzione: Some(
                opened_at + Duration::minutes(definizione.minuti_risoluzione(p) as i64),
            ),
        },
        None => SlaDeadlines::default(),
    }
}

pub fn stamp_first_response(ticket: &mut Ticket, now: DateTime<Utc>) {
    if ticket.sla_prima_risposta_at.is_none() {
        ticket.sla_prima_risposta_at = Some(now);
    }
}

pub fn pause(ticket: &mut Ticket, now: DateTime<Utc>) {
    if ticket.sla_paused_at.is_none() {
        ticket.sla_paused_at = Some(now);
    }
}

/// Ends a pause: accumulates paused minutes and pushes pending deadlines out.
pub fn resume(ticket: &mut Ticket, now: DateTime<Utc>) {
    let Some(paused_at) = ticket.sla_paused_at.take() else {
        return;
    };

    let paused = (now - paused_at).max(Duration::zero());
    let minutes = paused.num_minutes() as i32;
    ticket.sla_paused_total_minutes += minutes;

    if ticket.sla_prima_risposta_at.is_none() {
        ticket.sla_scadenza_risposta = ticket.sla_scadenza_risposta.map(|d| d + paused);
    }
    ticket.sla_scadenza_risoluzione = ticket.sla_scadenza_risoluzione.map(|d| d + paused);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn standard_sla() -> SlaDefinizione {
        SlaDefinizione {
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
        }
    }

    fn blank_ticket(now: DateTime<Utc>) -> Ticket {
        Ticket {
            id: 1,
            numero: "TK-2025-00001".to_string(),
            oggetto: "Stampante".to_string(),
            descrizione: None,
            cliente_id: 1,
            referente_id: None,
            referente_nome: None,
            canale_id: 1,
            priorita_id: 3,
            stato_id: 1,
            tecnico_assegnato_id: None,
            contratto_id: None,
            asset_id: None,
            sla_scadenza_risposta: None,
            sla_scadenza_risoluzione: None,
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
        }
    }

    #[test]
    fn deadlines_follow_priority_band() {
        let opened = Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap();
        let deadlines = deadlines_for(&standard_sla(), Some(PriorityCode::Alta), opened);
        assert_eq!(deadlines.risposta, Some(opened + Duration::hours(4)));
        assert_eq!(deadlines.risoluzione, Some(opened + Duration::hours(16)));
        assert_eq!(deadlines_for(&standard_sla(), None, opened), SlaDeadlines::default());
    }

    #[test]
    fn pause_then_resume_shifts_deadlines() {
        let opened = Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap();
        let mut ticket = blank_ticket(opened);
        let deadlines = deadlines_for(&standard_sla(), Some(PriorityCode::Normale), opened);
        ticket.sla_scadenza_risposta = deadlines.risposta;
        ticket.sla_scadenza_risoluzione = deadlines.risoluzione;

        pause(&mut ticket, opened + Duration::minutes(30));
        pause(&mut ticket, opened + Duration::minutes(45));
        resume(&mut ticket, opened + Duration::minutes(120));

        assert_eq!(ticket.sla_paused_at, None);
        assert_eq!(ticket.sla_paused_total_minutes, 90);
        assert_eq!(ticket.sla_scadenza_risposta, Some(opened + Duration::minutes(480 + 90)));
        assert_eq!(
            ticket.sla_scadenza_risoluzione,
            Some(opened + Duration::minutes(1440 + 90))
        );
    }

    #[test]
    fn first_response_is_stamped_once() {
        let now = Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap();
        let mut ticket = blank_ticket(now);
        stamp_first_response(&mut ticket, now);
        stamp_first_response(&mut ticket, now + Duration::hours(1));
        assert_eq!(ticket.sla_prima_risposta_at, Some(now));
    }
}
