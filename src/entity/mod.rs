pub mod ai_email_logs;
pub mod ai_support_messages;
pub mod ai_support_sessions;
pub mod audit_logs;
pub mod invoice_counters;
pub mod invoice_items;
pub mod invoices;
pub mod leads;
pub mod payments;
pub mod profiles;

pub use ai_email_logs::Entity as AiEmailLogs;
pub use ai_support_messages::Entity as AiSupportMessages;
pub use ai_support_sessions::Entity as AiSupportSessions;
pub use audit_logs::Entity as AuditLogs;
pub use invoice_counters::Entity as InvoiceCounters;
pub use invoice_items::Entity as InvoiceItems;
pub use invoices::Entity as Invoices;
pub use leads::Entity as Leads;
pub use payments::Entity as Payments;
pub use profiles::Entity as Profiles;
