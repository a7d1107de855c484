use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::{
    dto::public::PublicInvoice,
    entity::invoices::{Column as InvoiceCol, Entity as Invoices},
    error::{AppError, AppResult},
    models::Invoice,
    services::invoice_service::list_items,
};

/// Longest token accepted before touching the store.
const MAX_TOKEN_LEN: usize = 256;

/// Resolve a public access token to the pay-page view of its invoice.
///
/// No caller identity is involved; only an exact token match resolves.
pub async fn resolve_by_token(db: &DatabaseConnection, token: &str) -> AppResult<PublicInvoice> {
    if token.is_empty() || token.len() > MAX_TOKEN_LEN {
        return Err(AppError::NotFound);
    }

    let invoice = Invoices::find()
        .filter(InvoiceCol::AccessToken.eq(token))
        .one(db)
        .await?
        .ok_or(AppError::NotFound)?;
    let invoice = Invoice::try_from(invoice)?;
    let items = list_items(db, invoice.id).await?;

    Ok(PublicInvoice::new(invoice, items))
}

/// Link handed to clients: `{site_url}/invoice/{token}`.
pub fn public_invoice_url(site_url: &str, token: &str) -> String {
    format!("{}/invoice/{}", site_url.trim_end_matches('/'), token)
}
