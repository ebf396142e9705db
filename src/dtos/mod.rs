pub mod commondtos;
pub mod interventiondtos;
pub mod ticketdtos;
pub mod userdtos;
