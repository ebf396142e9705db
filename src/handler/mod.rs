pub mod auth;
pub mod clients;
pub mod interventions;
pub mod lookup;
pub mod technicians;
pub mod tickets;
