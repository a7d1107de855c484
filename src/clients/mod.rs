//! Outbound HTTP integrations. Each is optional and built from config.

pub mod email;
pub mod openai;
pub mod stripe;
