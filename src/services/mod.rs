pub mod access_token;
pub mod ai_email_service;
pub mod ai_invoice_service;
pub mod checkout_service;
pub mod invoice_number;
pub mod invoice_service;
pub mod lead_service;
pub mod profile_service;
pub mod public_invoice_service;
pub mod send_invoice_service;
pub mod support_chat_service;
pub mod webhook_service;
