use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::{Invoice, InvoiceItem, InvoiceStatus, Payment};

/// Amounts are in cents; `total` is stored as given, never derived.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateInvoiceRequest {
    pub client_name: String,
    pub client_email: String,
    #[serde(default)]
    pub client_address: Option<String>,
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub subtotal: i64,
    #[serde(default)]
    pub tax: i64,
    pub total: i64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Vec<CreateInvoiceItem>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateInvoiceItem {
    pub description: String,
    pub quantity: f64,
    pub unit_price: i64,
    pub amount: i64,
}

/// Absent fields are left untouched. `client_address` and `notes` are
/// cleared by an explicit `null`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateInvoiceRequest {
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub client_address: Option<Option<String>>,
    pub status: Option<InvoiceStatus>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub subtotal: Option<i64>,
    pub tax: Option<i64>,
    pub total: Option<i64>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
}

// Distinguishes a field sent as `null` from one left out.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InvoiceListQuery {
    pub status: Option<InvoiceStatus>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InvoiceWithItems {
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceList {
    pub items: Vec<Invoice>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentList {
    pub items: Vec<Payment>,
}

#[derive(Debug, Default, PartialEq, Serialize, ToSchema)]
pub struct InvoiceSummary {
    pub total: usize,
    pub paid: usize,
    pub pending: usize,
    pub overdue: usize,
    /// Sum of paid invoice totals, in cents.
    pub total_revenue: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceDeleted {
    pub id: uuid::Uuid,
    /// `false` when there was nothing to delete.
    pub deleted: bool,
}
