pub mod audit_service;
pub mod error;
pub mod intervention_service;
pub mod labels;
pub mod lookup_registry;
pub mod numbering;
pub mod sla;
pub mod state_machine;
pub mod technician_service;
pub mod ticket_service;
