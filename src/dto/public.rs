use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Invoice, InvoiceItem, InvoiceStatus};

/// What the pay page may see: no owner, no token, no payment history.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PublicInvoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub client_name: String,
    pub client_email: String,
    pub client_address: Option<String>,
    pub status: InvoiceStatus,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub subtotal: i64,
    pub tax: i64,
    pub total: i64,
    pub notes: Option<String>,
    pub items: Vec<PublicInvoiceItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PublicInvoiceItem {
    pub description: String,
    pub quantity: f64,
    pub unit_price: i64,
    pub amount: i64,
}

impl PublicInvoice {
    pub fn new(invoice: Invoice, items: Vec<InvoiceItem>) -> Self {
        Self {
            id: invoice.id,
            invoice_number: invoice.invoice_number,
            client_name: invoice.client_name,
            client_email: invoice.client_email,
            client_address: invoice.client_address,
            status: invoice.status,
            issue_date: invoice.issue_date,
            due_date: invoice.due_date,
            subtotal: invoice.subtotal,
            tax: invoice.tax,
            total: invoice.total,
            notes: invoice.notes,
            items: items
                .into_iter()
                .map(|item| PublicInvoiceItem {
                    description: item.description,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    amount: item.amount,
                })
                .collect(),
        }
    }
}
