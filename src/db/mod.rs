pub mod clientdb;
pub mod db;
pub mod interventiondb;
pub mod lookupdb;
#[cfg(test)]
pub mod memory;
pub mod ticketdb;
pub mod userdb;
