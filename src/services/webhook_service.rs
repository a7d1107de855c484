use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    clients::stripe::{CheckoutSession, StripeEvent, verify_webhook_signature},
    dto::functions::WebhookAck,
    entity::{
        invoices::{ActiveModel as InvoiceActive, Entity as Invoices},
        payments::{ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments},
    },
    error::{AppError, AppResult},
    models::{InvoiceStatus, Payment, PaymentStatus},
    state::AppState,
};

/// Acknowledge a Stripe webhook.
///
/// Without a webhook secret the event is acknowledged unverified and left
/// unprocessed. With one, the signature is checked and completed checkouts
/// are recorded as payments.
pub async fn handle_stripe_webhook(
    state: &AppState,
    signature: Option<&str>,
    payload: &[u8],
) -> AppResult<WebhookAck> {
    let signature = signature
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing stripe-signature header".into()))?;

    let Some(secret) = state.config.stripe.webhook_secret.as_deref() else {
        tracing::warn!("STRIPE_WEBHOOK_SECRET not set, acknowledging webhook without verification");
        return Ok(WebhookAck { received: true });
    };

    verify_webhook_signature(payload, signature, secret, Utc::now().timestamp())
        .map_err(|err| AppError::BadRequest(format!("Webhook verification failed: {err}")))?;

    let event: StripeEvent = serde_json::from_slice(payload)
        .map_err(|err| AppError::BadRequest(format!("Invalid webhook payload: {err}")))?;

    match event.kind.as_str() {
        "checkout.session.completed" => {
            let session: CheckoutSession = serde_json::from_value(event.data.object)
                .map_err(|err| AppError::BadRequest(format!("Invalid checkout session: {err}")))?;
            record_checkout_completed(&state.orm, &session).await?;
        }
        other => {
            tracing::debug!(event_id = ?event.id, event_type = other, "ignoring webhook event");
        }
    }

    Ok(WebhookAck { received: true })
}

/// Record a completed checkout as a payment and mark its invoice paid.
///
/// Replays of the same processor reference are ignored and return `None`.
pub async fn record_checkout_completed(
    db: &DatabaseConnection,
    session: &CheckoutSession,
) -> AppResult<Option<Payment>> {
    let Some(invoice_id) = session.invoice_id() else {
        tracing::warn!(session_id = %session.id, "checkout session without invoice_id metadata");
        return Ok(None);
    };
    let reference = session.payment_reference();

    let txn = db.begin().await?;

    let already_recorded = Payments::find()
        .filter(PaymentCol::StripePaymentId.eq(reference))
        .one(&txn)
        .await?
        .is_some();
    if already_recorded {
        txn.commit().await?;
        tracing::debug!(reference, "payment already recorded");
        return Ok(None);
    }

    let Some(invoice) = Invoices::find_by_id(invoice_id).one(&txn).await? else {
        txn.commit().await?;
        tracing::warn!(invoice_id = %invoice_id, "completed checkout for unknown invoice");
        return Ok(None);
    };

    let now = Utc::now();
    let payment = PaymentActive {
        id: Set(Uuid::new_v4()),
        invoice_id: Set(invoice.id),
        amount: Set(session.amount_total.unwrap_or(invoice.total)),
        payment_method: Set(Some(
            session
                .payment_method_types
                .first()
                .cloned()
                .unwrap_or_else(|| "card".to_string()),
        )),
        stripe_payment_id: Set(Some(reference.to_string())),
        status: Set(PaymentStatus::Completed.as_str().to_string()),
        paid_at: Set(Some(now.into())),
        created_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let mut active: InvoiceActive = invoice.into();
    active.status = Set(InvoiceStatus::Paid.as_str().to_string());
    active.updated_at = Set(now.into());
    active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(invoice_id = %invoice_id, reference, "payment recorded");
    Ok(Some(Payment::try_from(payment)?))
}
