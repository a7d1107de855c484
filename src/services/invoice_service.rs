use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::invoices::{
        CreateInvoiceItem, CreateInvoiceRequest, InvoiceSummary, InvoiceWithItems,
        UpdateInvoiceRequest,
    },
    entity::{
        invoice_items::{ActiveModel as ItemActive, Column as ItemCol, Entity as InvoiceItems},
        invoices::{ActiveModel as InvoiceActive, Column as InvoiceCol, Entity as Invoices},
        payments::{Column as PaymentCol, Entity as Payments},
    },
    error::{AppError, AppResult},
    models::{Invoice, InvoiceItem, InvoiceStatus, Payment},
    services::{access_token::generate_access_token, invoice_number::next_invoice_number},
};

/// Insert an invoice owned by `owner` together with its line items.
///
/// Invoice and items are written in one transaction, so a failing item
/// leaves nothing behind. The stored `total` is exactly the one supplied.
pub async fn create_invoice(
    db: &DatabaseConnection,
    owner: Uuid,
    payload: CreateInvoiceRequest,
) -> AppResult<InvoiceWithItems> {
    validate_new_invoice(&payload)?;

    let invoice_number = next_invoice_number(db, owner).await;
    let access_token = generate_access_token();
    let now = Utc::now();

    let txn = db.begin().await?;

    let invoice = InvoiceActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(owner),
        invoice_number: Set(invoice_number),
        client_name: Set(payload.client_name.trim().to_string()),
        client_email: Set(payload.client_email.trim().to_string()),
        client_address: Set(payload.client_address),
        status: Set(payload
            .status
            .unwrap_or(InvoiceStatus::Draft)
            .as_str()
            .to_string()),
        issue_date: Set(payload.issue_date),
        due_date: Set(payload.due_date),
        subtotal: Set(payload.subtotal),
        tax: Set(payload.tax),
        total: Set(payload.total),
        notes: Set(payload.notes),
        access_token: Set(access_token),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(payload.items.len());
    for (position, item) in payload.items.into_iter().enumerate() {
        let item = ItemActive {
            id: Set(Uuid::new_v4()),
            invoice_id: Set(invoice.id),
            description: Set(item.description),
            quantity: Set(item.quantity),
            unit_price: Set(item.unit_price),
            amount: Set(item.amount),
            position: Set(position as i32),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;
        items.push(InvoiceItem::from(item));
    }

    txn.commit().await?;

    let invoice = Invoice::try_from(invoice)?;
    audit::record(
        db,
        Some(owner),
        "invoice_create",
        "invoices",
        serde_json::json!({ "invoice_id": invoice.id, "invoice_number": invoice.invoice_number }),
    )
    .await;

    Ok(InvoiceWithItems { invoice, items })
}

/// Every invoice of `owner`, newest first.
pub async fn list_invoices(
    db: &DatabaseConnection,
    owner: Uuid,
    status: Option<InvoiceStatus>,
) -> AppResult<Vec<Invoice>> {
    let mut condition = Condition::all().add(InvoiceCol::UserId.eq(owner));
    if let Some(status) = status {
        condition = condition.add(InvoiceCol::Status.eq(status.as_str()));
    }

    let invoices = Invoices::find()
        .filter(condition)
        .order_by_desc(InvoiceCol::CreatedAt)
        .order_by_desc(InvoiceCol::Id)
        .all(db)
        .await?
        .into_iter()
        .map(Invoice::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(invoices)
}

/// One invoice with its items. Someone else's invoice is indistinguishable
/// from a missing one.
pub async fn get_invoice(
    db: &DatabaseConnection,
    owner: Uuid,
    id: Uuid,
) -> AppResult<InvoiceWithItems> {
    let invoice = find_owned(db, owner, id).await?.ok_or(AppError::NotFound)?;
    let items = list_items(db, invoice.id).await?;
    Ok(InvoiceWithItems { invoice, items })
}

/// Patch the provided fields and refresh `updated_at`.
///
/// Returns `None` when no invoice with `id` belongs to `owner`; nothing is
/// written in that case. Concurrent patches resolve last-write-wins.
pub async fn update_invoice(
    db: &DatabaseConnection,
    owner: Uuid,
    id: Uuid,
    patch: UpdateInvoiceRequest,
) -> AppResult<Option<Invoice>> {
    let existing = Invoices::find()
        .filter(
            Condition::all()
                .add(InvoiceCol::UserId.eq(owner))
                .add(InvoiceCol::Id.eq(id)),
        )
        .one(db)
        .await?;
    let Some(existing) = existing else {
        return Ok(None);
    };

    let issue_date = patch.issue_date.unwrap_or(existing.issue_date);
    let due_date = patch.due_date.unwrap_or(existing.due_date);
    if due_date < issue_date {
        return Err(AppError::BadRequest(
            "due_date must not be before issue_date".into(),
        ));
    }
    for (field, value) in [
        ("subtotal", patch.subtotal),
        ("tax", patch.tax),
        ("total", patch.total),
    ] {
        if value.is_some_and(|amount| amount < 0) {
            return Err(AppError::BadRequest(format!("{field} must not be negative")));
        }
    }
    if patch.client_name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(AppError::BadRequest("client_name must not be empty".into()));
    }
    if let Some(email) = patch.client_email.as_deref() {
        validate_email(email, "client_email")?;
    }

    let previous_status = existing.status.clone();
    let mut active: InvoiceActive = existing.into();
    if let Some(name) = patch.client_name {
        active.client_name = Set(name.trim().to_string());
    }
    if let Some(email) = patch.client_email {
        active.client_email = Set(email.trim().to_string());
    }
    if let Some(address) = patch.client_address {
        active.client_address = Set(address.filter(|address| !address.trim().is_empty()));
    }
    if let Some(status) = patch.status {
        // Any status may follow any other.
        tracing::debug!(invoice_id = %id, from = %previous_status, to = %status, "invoice status change");
        active.status = Set(status.as_str().to_string());
    }
    if patch.issue_date.is_some() {
        active.issue_date = Set(issue_date);
    }
    if patch.due_date.is_some() {
        active.due_date = Set(due_date);
    }
    if let Some(subtotal) = patch.subtotal {
        active.subtotal = Set(subtotal);
    }
    if let Some(tax) = patch.tax {
        active.tax = Set(tax);
    }
    if let Some(total) = patch.total {
        active.total = Set(total);
    }
    if let Some(notes) = patch.notes {
        active.notes = Set(notes.filter(|notes| !notes.trim().is_empty()));
    }
    active.updated_at = Set(Utc::now().into());

    let updated = Invoice::try_from(active.update(db).await?)?;

    audit::record(
        db,
        Some(owner),
        "invoice_update",
        "invoices",
        serde_json::json!({ "invoice_id": updated.id, "status": updated.status }),
    )
    .await;

    Ok(Some(updated))
}

/// Set only the status; same ownership rules as [`update_invoice`].
pub async fn set_status(
    db: &DatabaseConnection,
    owner: Uuid,
    id: Uuid,
    status: InvoiceStatus,
) -> AppResult<Option<Invoice>> {
    update_invoice(
        db,
        owner,
        id,
        UpdateInvoiceRequest {
            status: Some(status),
            ..Default::default()
        },
    )
    .await
}

/// Hard delete of the invoice, its items and its payments.
///
/// Deleting a missing or foreign invoice succeeds and returns `false`.
pub async fn delete_invoice(db: &DatabaseConnection, owner: Uuid, id: Uuid) -> AppResult<bool> {
    let txn = db.begin().await?;

    let owned = Invoices::find()
        .filter(
            Condition::all()
                .add(InvoiceCol::UserId.eq(owner))
                .add(InvoiceCol::Id.eq(id)),
        )
        .one(&txn)
        .await?;
    let Some(invoice) = owned else {
        txn.commit().await?;
        return Ok(false);
    };

    InvoiceItems::delete_many()
        .filter(ItemCol::InvoiceId.eq(invoice.id))
        .exec(&txn)
        .await?;
    Payments::delete_many()
        .filter(PaymentCol::InvoiceId.eq(invoice.id))
        .exec(&txn)
        .await?;
    Invoices::delete_many()
        .filter(InvoiceCol::Id.eq(invoice.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    audit::record(
        db,
        Some(owner),
        "invoice_delete",
        "invoices",
        serde_json::json!({ "invoice_id": id, "invoice_number": invoice.invoice_number }),
    )
    .await;

    Ok(true)
}

/// Payments recorded against an invoice, newest first.
pub async fn list_payments(db: &DatabaseConnection, invoice_id: Uuid) -> AppResult<Vec<Payment>> {
    let payments = Payments::find()
        .filter(PaymentCol::InvoiceId.eq(invoice_id))
        .order_by_desc(PaymentCol::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(Payment::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(payments)
}

/// Dashboard counters. `pending` counts invoices that were sent but not paid.
pub fn summarize(invoices: &[Invoice]) -> InvoiceSummary {
    invoices
        .iter()
        .fold(InvoiceSummary::default(), |mut summary, invoice| {
            summary.total += 1;
            match invoice.status {
                InvoiceStatus::Paid => {
                    summary.paid += 1;
                    summary.total_revenue += invoice.total;
                }
                InvoiceStatus::Sent => summary.pending += 1,
                InvoiceStatus::Overdue => summary.overdue += 1,
                InvoiceStatus::Draft | InvoiceStatus::Cancelled => {}
            }
            summary
        })
}

pub(crate) async fn find_owned(
    db: &DatabaseConnection,
    owner: Uuid,
    id: Uuid,
) -> AppResult<Option<Invoice>> {
    Invoices::find()
        .filter(
            Condition::all()
                .add(InvoiceCol::UserId.eq(owner))
                .add(InvoiceCol::Id.eq(id)),
        )
        .one(db)
        .await?
        .map(Invoice::try_from)
        .transpose()
        .map_err(AppError::from)
}

pub(crate) async fn list_items(
    db: &DatabaseConnection,
    invoice_id: Uuid,
) -> AppResult<Vec<InvoiceItem>> {
    let items = InvoiceItems::find()
        .filter(ItemCol::InvoiceId.eq(invoice_id))
        .order_by_asc(ItemCol::CreatedAt)
        .order_by_asc(ItemCol::Position)
        .all(db)
        .await?
        .into_iter()
        .map(InvoiceItem::from)
        .collect();
    Ok(items)
}

fn validate_new_invoice(payload: &CreateInvoiceRequest) -> AppResult<()> {
    if payload.client_name.trim().is_empty() {
        return Err(AppError::BadRequest("client_name is required".into()));
    }
    validate_email(&payload.client_email, "client_email")?;
    for (field, value) in [
        ("subtotal", payload.subtotal),
        ("tax", payload.tax),
        ("total", payload.total),
    ] {
        if value < 0 {
            return Err(AppError::BadRequest(format!("{field} must not be negative")));
        }
    }
    if payload.due_date < payload.issue_date {
        return Err(AppError::BadRequest(
            "due_date must not be before issue_date".into(),
        ));
    }
    payload.items.iter().try_for_each(validate_item)
}

fn validate_item(item: &CreateInvoiceItem) -> AppResult<()> {
    if item.description.trim().is_empty() {
        return Err(AppError::BadRequest("item description is required".into()));
    }
    if !item.quantity.is_finite() || item.quantity <= 0.0 {
        return Err(AppError::BadRequest(
            "item quantity must be greater than 0".into(),
        ));
    }
    if item.unit_price < 0 {
        return Err(AppError::BadRequest(
            "item unit_price must not be negative".into(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_email(email: &str, field: &str) -> AppResult<()> {
    let email = email.trim();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("{field} must be a valid email")))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn invoice(status: InvoiceStatus, total: i64) -> Invoice {
        let now = Utc::now();
        Invoice {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            invoice_number: "INV-202501-0001".into(),
            client_name: "Acme".into(),
            client_email: "billing@acme.test".into(),
            client_address: None,
            status,
            issue_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            subtotal: total,
            tax: 0,
            total,
            notes: None,
            access_token: "token".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn summary_counts_sent_as_pending_and_sums_paid_revenue() {
        let invoices = vec![
            invoice(InvoiceStatus::Paid, 10_800),
            invoice(InvoiceStatus::Paid, 200),
            invoice(InvoiceStatus::Sent, 5_000),
            invoice(InvoiceStatus::Overdue, 7_000),
            invoice(InvoiceStatus::Draft, 1_000),
        ];

        assert_eq!(
            summarize(&invoices),
            InvoiceSummary {
                total: 5,
                paid: 2,
                pending: 1,
                overdue: 1,
                total_revenue: 11_000,
            }
        );
    }

    #[test]
    fn email_needs_both_sides_of_the_at_sign() {
        assert!(validate_email("a@b.co", "email").is_ok());
        assert!(validate_email("ab.co", "email").is_err());
        assert!(validate_email("@b.co", "email").is_err());
        assert!(validate_email("a@", "email").is_err());
    }
}
