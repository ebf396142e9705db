//! Transition tables for the ticket and intervention lifecycles.
//!
//! Statuses are data-driven rows; only the well-known codes carry
//! behaviour here. Every other status is treated by its `finale` flag.

use serde::Serialize;

use crate::{
    models::lookupmodel::{InterventionStatusCode, TicketStatusCode},
    service::error::ServiceError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition<C> {
    Stay,
    MoveTo(C),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketState {
    pub code: Option<TicketStatusCode>,
    pub finale: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketEvent {
    Update,
    Assign,
    Take,
    Close,
    CreateIntervention,
    ScheduleIntervention,
    AddNote,
    AddMessage,
    Delete,
}

impl TicketEvent {
    pub const ALL: [TicketEvent; 9] = [
        TicketEvent::Update,
        TicketEvent::Assign,
        TicketEvent::Take,
        TicketEvent::Close,
        TicketEvent::CreateIntervention,
        TicketEvent::ScheduleIntervention,
        TicketEvent::AddNote,
        TicketEvent::AddMessage,
        TicketEvent::Delete,
    ];

    fn label(&self) -> &'static str {
        match self {
            TicketEvent::Update => "update",
            TicketEvent::Assign => "assign",
            TicketEvent::Take => "take",
            TicketEvent::Close => "close",
            TicketEvent::CreateIntervention => "create an intervention from",
            TicketEvent::ScheduleIntervention => "schedule an intervention from",
            TicketEvent::AddNote => "annotate",
            TicketEvent::AddMessage => "message",
            TicketEvent::Delete => "delete",
        }
    }
}

pub fn ticket_transition(
    state: TicketState,
    event: TicketEvent,
) -> Result<Transition<TicketStatusCode>, ServiceError> {
    match event {
        // Soft delete (admin-gated by the caller) and the append-only
        // children are allowed in every status.
        TicketEvent::Delete | TicketEvent::AddNote | TicketEvent::AddMessage => {
            return Ok(Transition::Stay)
        }
        _ if state.finale => {
            return Err(ServiceError::Conflict(format!(
                "Cannot {} a ticket in final status {}",
                event.label(),
                state.code.map(|c| c.to_str()).unwrap_or("(final)")
            )))
        }
        _ => {}
    }

    Ok(match event {
        TicketEvent::Take if state.code == Some(TicketStatusCode::Nuovo) => {
            Transition::MoveTo(TicketStatusCode::PresoCarico)
        }
        TicketEvent::Close => Transition::MoveTo(TicketStatusCode::Chiuso),
        TicketEvent::CreateIntervention | TicketEvent::ScheduleIntervention => {
            Transition::MoveTo(TicketStatusCode::Schedulato)
        }
        _ => Transition::Stay,
    })
}

pub fn legal_ticket_events(state: TicketState) -> Vec<TicketEvent> {
    TicketEvent::ALL
        .into_iter()
        .filter(|event| ticket_transition(state, *event).is_ok())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterventionState {
    pub code: Option<InterventionStatusCode>,
    pub finale: bool,
    pub started: bool,
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionEvent {
    Update,
    Start,
    Complete,
    EditRows,
    EditSessions,
    Delete,
}

impl InterventionEvent {
    pub const ALL: [InterventionEvent; 6] = [
        InterventionEvent::Update,
        InterventionEvent::Start,
        InterventionEvent::Complete,
        InterventionEvent::EditRows,
        InterventionEvent::EditSessions,
        InterventionEvent::Delete,
    ];
}

pub fn intervention_transition(
    state: InterventionState,
    event: InterventionEvent,
) -> Result<Transition<InterventionStatusCode>, ServiceError> {
    if state.finale {
        return Err(ServiceError::Conflict(format!(
            "Intervention is in final status {} and cannot be modified",
            state.code.map(|c| c.to_str()).unwrap_or("(final)")
        )));
    }

    match event {
        InterventionEvent::Start if state.started => Err(ServiceError::Conflict(
            "Intervention has already been started".to_string(),
        )),
        InterventionEvent::Start => Ok(Transition::MoveTo(InterventionStatusCode::InCorso)),
        InterventionEvent::Complete if state.completed => Err(ServiceError::Conflict(
            "Intervention has already been completed".to_string(),
        )),
        InterventionEvent::Complete if !state.started => Err(ServiceError::Conflict(
            "Intervention must be started before it can be completed".to_string(),
        )),
        InterventionEvent::Complete => Ok(Transition::MoveTo(InterventionStatusCode::Completato)),
        InterventionEvent::Update
        | InterventionEvent::EditRows
        | InterventionEvent::EditSessions
        | InterventionEvent::Delete => Ok(Transition::Stay),
    }
}

pub fn legal_intervention_events(state: InterventionState) -> Vec<InterventionEvent> {
    InterventionEvent::ALL
        .into_iter()
        .filter(|event| intervention_transition(state, *event).is_ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(code: TicketStatusCode, finale: bool) -> TicketState {
        TicketState { code: Some(code), finale }
    }

    #[test]
    fn take_advances_only_from_nuovo() {
        assert_eq!(
            ticket_transition(ticket(TicketStatusCode::Nuovo, false), TicketEvent::Take).unwrap(),
            Transition::MoveTo(TicketStatusCode::PresoCarico)
        );
        assert_eq!(
            ticket_transition(ticket(TicketStatusCode::InLavorazione, false), TicketEvent::Take)
                .unwrap(),
            Transition::Stay
        );
    }

    #[test]
    fn final_ticket_rejects_mutations_but_not_delete() {
        let closed = ticket(TicketStatusCode::Chiuso, true);
        assert!(matches!(
            ticket_transition(closed, TicketEvent::Close),
            Err(ServiceError::Conflict(_))
        ));
        assert!(ticket_transition(closed, TicketEvent::Delete).is_ok());
        assert_eq!(
            legal_ticket_events(closed),
            vec![TicketEvent::AddNote, TicketEvent::AddMessage, TicketEvent::Delete]
        );
    }

    #[test]
    fn custom_final_status_is_frozen_too() {
        let custom = TicketState { code: None, finale: true };
        assert!(ticket_transition(custom, TicketEvent::Assign).is_err());
    }

    #[test]
    fn intervention_start_and_complete_guards() {
        let fresh = InterventionState {
            code: Some(InterventionStatusCode::Pianificato),
            finale: false,
            started: false,
            completed: false,
        };
        assert!(matches!(
            intervention_transition(fresh, InterventionEvent::Complete),
            Err(ServiceError::Conflict(_))
        ));
        assert_eq!(
            intervention_transition(fresh, InterventionEvent::Start).unwrap(),
            Transition::MoveTo(InterventionStatusCode::InCorso)
        );

        let started = InterventionState { started: true, ..fresh };
        assert!(intervention_transition(started, InterventionEvent::Start).is_err());
        assert_eq!(
            intervention_transition(started, InterventionEvent::Complete).unwrap(),
            Transition::MoveTo(InterventionStatusCode::Completato)
        );
    }

    #[test]
    fn completed_intervention_has_no_legal_events() {
        let done = InterventionState {
            code: Some(InterventionStatusCode::Completato),
            finale: true,
            started: true,
            completed: true,
        };
        assert!(legal_intervention_events(done).is_empty());
    }
}
