use sea_orm::EntityTrait;

use crate::{
    clients::stripe::{CheckoutSessionParams, StripeClient},
    dto::functions::{CheckoutRequest, CheckoutResponse},
    entity::invoices::Entity as Invoices,
    error::{AppError, AppResult},
    money::to_cents,
    services::public_invoice_service::public_invoice_url,
    state::AppState,
};

pub const PLACEHOLDER_CHECKOUT_URL: &str = "https://checkout.stripe.com/pay/test_session_example";
pub const STRIPE_NOT_CONFIGURED: &str = "STRIPE_NOT_CONFIGURED";

/// Start a hosted checkout for an invoice.
///
/// Without a Stripe secret key this returns the placeholder url flagged with
/// `STRIPE_NOT_CONFIGURED`. With a key, the session is priced from the stored
/// invoice total rather than the amount in the request.
pub async fn create_checkout(
    state: &AppState,
    payload: CheckoutRequest,
) -> AppResult<CheckoutResponse> {
    let CheckoutRequest {
        invoice_id: Some(invoice_id),
        amount: Some(amount),
        invoice_number: Some(invoice_number),
        client_email,
    } = payload
    else {
        return Err(AppError::BadRequest("Missing required fields".into()));
    };
    if invoice_number.trim().is_empty() || !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::BadRequest("Missing required fields".into()));
    }
    let amount_cents = to_cents(amount);

    let Some(secret_key) = state.config.stripe.secret_key.as_deref() else {
        tracing::warn!(
            invoice_id = %invoice_id,
            invoice_number = %invoice_number,
            amount_cents,
            "STRIPE_SECRET_KEY not set, returning placeholder checkout url"
        );
        return Ok(CheckoutResponse {
            url: Some(PLACEHOLDER_CHECKOUT_URL.to_string()),
            error: Some(STRIPE_NOT_CONFIGURED.to_string()),
            message: Some(
                "Stripe integration stub - Add your Stripe secret key to complete this integration"
                    .to_string(),
            ),
        });
    };

    let invoice = Invoices::find_by_id(invoice_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if invoice.total != amount_cents {
        tracing::warn!(
            invoice_id = %invoice_id,
            requested = amount_cents,
            stored = invoice.total,
            "checkout amount differs from invoice total, charging stored total"
        );
    }

    let invoice_url = public_invoice_url(&state.config.site_url, &invoice.access_token);
    let url = StripeClient::new(state.http.clone(), secret_key)
        .create_checkout_session(CheckoutSessionParams {
            invoice_id,
            invoice_number: &invoice.invoice_number,
            amount_cents: invoice.total,
            customer_email: client_email
                .as_deref()
                .filter(|email| !email.trim().is_empty())
                .or(Some(invoice.client_email.as_str())),
            success_url: format!("{invoice_url}?payment=success"),
            cancel_url: format!("{invoice_url}?payment=cancelled"),
        })
        .await?;

    tracing::info!(invoice_id = %invoice_id, "checkout session created");
    Ok(CheckoutResponse {
        url: Some(url),
        error: None,
        message: None,
    })
}
