// src/service/audit_service.rs
use crate::models::{
    interventionmodel::Intervento,
    ticketmodel::{AzioneStorico, NewStorico, RichiestaIntervento, Ticket, TipoChiusura},
    usermodel::Tecnico,
};

/// Builds the `ticket_storico` rows written alongside each ticket mutation
/// and mirrors committed ones to the `audit` tracing target.
#[derive(Debug, Clone, Default)]
pub struct AuditService;

impl AuditService {
    pub fn new() -> Self {
        Self
    }

    pub fn ticket_created(&self, actor: &Tecnico) -> NewStorico {
        NewStorico::new(
            actor.id,
            AzioneStorico::Creato,
            format!("Ticket creato da {}", actor.nome_completo()),
        )
    }

    /// One row for the whole update; `campo_modificato` lists the changed fields.
    pub fn ticket_updated(&self, actor: &Tecnico, campi: &[&str]) -> NewStorico {
        NewStorico::new(
            actor.id,
            AzioneStorico::Modificato,
            format!("Ticket modificato da {}", actor.nome_completo()),
        )
        .campo(campi.join(","), None, None)
    }

    pub fn ticket_assigned(
        &self,
        actor: &Tecnico,
        precedente: Option<i32>,
        assegnato: &Tecnico,
    ) -> NewStorico {
        NewStorico::new(
            actor.id,
            AzioneStorico::Assegnato,
            format!("Ticket assegnato a {}", assegnato.nome_completo()),
        )
        .campo(
            "tecnico_assegnato_id",
            precedente.map(|id| id.to_string()),
            Some(assegnato.id.to_string()),
        )
    }

    pub fn ticket_taken(&self, actor: &Tecnico) -> NewStorico {
        NewStorico::new(
            actor.id,
            AzioneStorico::PresoCarico,
            format!("Ticket preso in carico da {}", actor.nome_completo()),
        )
    }

    pub fn ticket_closed(&self, actor: &Tecnico, tipo: TipoChiusura) -> NewStorico {
        NewStorico::new(
            actor.id,
            AzioneStorico::Chiuso,
            format!("Ticket chiuso da {} - {}", actor.nome_completo(), tipo.to_str()),
        )
    }

    pub fn ticket_deleted(&self, actor: &Tecnico) -> NewStorico {
        NewStorico::new(
            actor.id,
            AzioneStorico::Eliminato,
            format!("Ticket eliminato da {}", actor.nome_completo()),
        )
    }

    /// The store fills `valore_nuovo` with the allocated intervention number.
    pub fn intervention_spawned(&self, actor: &Tecnico) -> NewStorico {
        NewStorico::new(
            actor.id,
            AzioneStorico::InterventoCreato,
            format!("Intervento creato da {}", actor.nome_completo()),
        )
        .campo("intervento", None, None)
    }

    pub fn intervention_requested(&self, actor: &Tecnico) -> NewStorico {
        NewStorico::new(
            actor.id,
            AzioneStorico::RichiestaIntervento,
            format!("Richiesta intervento creata da {}", actor.nome_completo()),
        )
    }

    pub fn record_ticket(&self, ticket: &Ticket, entry: &NewStorico) {
        tracing::info!(
            target: "audit",
            ticket = %ticket.numero,
            tecnico_id = ?entry.tecnico_id,
            azione = entry.azione.to_str(),
            campo = ?entry.campo_modificato,
            "{}",
            entry.descrizione
        );
    }

    pub fn record_intervention(&self, actor: &Tecnico, intervento: &Intervento, azione: &str) {
        tracing::info!(
            target: "audit",
            intervento = %intervento.numero,
            tecnico_id = actor.id,
            azione,
            "intervention {}",
            azione
        );
    }

    pub fn record_richiesta(&self, actor: &Tecnico, ticket: &Ticket, richiesta: &RichiestaIntervento) {
        tracing::info!(
            target: "audit",
            ticket = %ticket.numero,
            richiesta_id = richiesta.id,
            tecnico_id = actor.id,
            "scheduling request created"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn tecnico(id: i32) -> Tecnico {
        let now = Utc::now();
        Tecnico {
            id,
            username: "gverdi".to_string(),
            email: "gverdi@example.com".to_string(),
            hashed_password: String::new(),
            nome: "Giulia".to_string(),
            cognome: "Verdi".to_string(),
            telefono: None,
            ruolo_id: 2,
            ruolo_codice: "TECNICO".to_string(),
            attivo: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn assignment_records_previous_and_new_assignee() {
        let audit = AuditService::new();
        let entry = audit.ticket_assigned(&tecnico(1), Some(3), &tecnico(7));
        assert_eq!(entry.azione, AzioneStorico::Assegnato);
        assert_eq!(entry.campo_modificato.as_deref(), Some("tecnico_assegnato_id"));
        assert_eq!(entry.valore_precedente.as_deref(), Some("3"));
        assert_eq!(entry.valore_nuovo.as_deref(), Some("7"));
        assert_eq!(entry.descrizione, "Ticket assegnato a Giulia Verdi");
    }

    #[test]
    fn closure_mentions_closure_type() {
        let entry = AuditService::new().ticket_closed(&tecnico(7), TipoChiusura::Diretta);
        assert_eq!(entry.descrizione, "Ticket chiuso da Giulia Verdi - DIRETTA");
        assert_eq!(entry.tecnico_id, Some(7));
    }
}
