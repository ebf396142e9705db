pub mod clientmodel;
pub mod interventionmodel;
pub mod lookupmodel;
pub mod ticketmodel;
pub mod usermodel;
