pub mod auth;
pub mod functions;
pub mod invoices;
pub mod leads;
pub mod profiles;
pub mod public;
