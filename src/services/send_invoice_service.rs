use uuid::Uuid;

use crate::{
    clients::email::{Mailer, OutgoingEmail},
    dto::functions::{SendInvoiceRequest, SendInvoiceResponse},
    error::{AppError, AppResult},
    models::{Invoice, InvoiceStatus},
    money::{format_cents, to_cents},
    services::{
        invoice_service::{find_owned, set_status, validate_email},
        public_invoice_service::public_invoice_url,
    },
    state::AppState,
};

/// Email the public pay link of one of `owner`'s invoices and mark it `sent`.
///
/// Without an email provider key the message is only logged; the status
/// update happens on both paths.
pub async fn send_invoice(
    state: &AppState,
    owner: Uuid,
    payload: SendInvoiceRequest,
) -> AppResult<SendInvoiceResponse> {
    let (Some(invoice_id), Some(recipient_email)) =
        (payload.invoice_id, payload.recipient_email.as_deref())
    else {
        return Err(AppError::BadRequest("Missing required fields".into()));
    };
    validate_email(recipient_email, "recipientEmail")?;
    let recipient_email = recipient_email.trim().to_string();

    let invoice = find_owned(&state.orm, owner, invoice_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let invoice_url = public_invoice_url(&state.config.site_url, &invoice.access_token);

    let message = match state.config.email.clone() {
        Some(config) => {
            let email = compose_invoice_email(&invoice, &payload, &recipient_email, &invoice_url);
            Mailer::new(state.http.clone(), config).send(&email).await?;
            tracing::info!(invoice_id = %invoice.id, recipient = %recipient_email, "invoice email sent");
            "Invoice sent successfully".to_string()
        }
        None => {
            tracing::info!(
                invoice_id = %invoice.id,
                recipient = %recipient_email,
                invoice_url = %invoice_url,
                "EMAIL_API_KEY not set, invoice email logged only"
            );
            "Email integration stub - Add your email provider API key to complete this integration"
                .to_string()
        }
    };

    set_status(&state.orm, owner, invoice.id, InvoiceStatus::Sent).await?;

    Ok(SendInvoiceResponse {
        success: true,
        invoice_url,
        message,
    })
}

/// Build the invoice notification. Request fields win over stored values so
/// the dashboard can show exactly what it sent.
pub fn compose_invoice_email(
    invoice: &Invoice,
    payload: &SendInvoiceRequest,
    recipient_email: &str,
    invoice_url: &str,
) -> OutgoingEmail {
    let number = payload
        .invoice_number
        .as_deref()
        .filter(|number| !number.trim().is_empty())
        .unwrap_or(&invoice.invoice_number);
    let amount = format_cents(
        payload
            .amount
            .filter(|amount| amount.is_finite())
            .map(to_cents)
            .unwrap_or(invoice.total),
    );
    let due_date = payload
        .due_date
        .clone()
        .unwrap_or_else(|| invoice.due_date.to_string());
    let greeting = payload
        .recipient_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(&invoice.client_name);

    let text = format!(
        "Hi {greeting},\n\n\
         Invoice {number} for ${amount} is ready. Payment is due by {due_date}.\n\n\
         View and pay your invoice: {invoice_url}\n\n\
         Thank you for your business."
    );
    let html = format!(
        "<div style=\"font-family: Arial, sans-serif; line-height: 1.6; color: #333;\">\
         <p>Hi {greeting},</p>\
         <p>Invoice <strong>{number}</strong> for <strong>${amount}</strong> is ready. \
         Payment is due by {due_date}.</p>\
         <p><a href=\"{invoice_url}\">View and pay your invoice</a></p>\
         <p>Thank you for your business.</p></div>",
        greeting = escape_html(greeting),
        number = escape_html(number),
        due_date = escape_html(&due_date),
    );

    OutgoingEmail {
        to: vec![recipient_email.to_string()],
        subject: format!("Invoice {number} from Whitmore Payments"),
        html,
        text,
    }
}

pub(crate) fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;

    fn invoice() -> Invoice {
        let now = Utc::now();
        Invoice {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            invoice_number: "INV-202501-0007".into(),
            client_name: "Acme <Ltd>".into(),
            client_email: "billing@acme.test".into(),
            client_address: None,
            status: InvoiceStatus::Draft,
            issue_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            subtotal: 10_000,
            tax: 800,
            total: 10_800,
            notes: None,
            access_token: "tok".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn falls_back_to_stored_invoice_fields() {
        let email = compose_invoice_email(
            &invoice(),
            &SendInvoiceRequest::default(),
            "client@acme.test",
            "http://localhost:5173/invoice/tok",
        );

        assert_eq!(email.to, vec!["client@acme.test".to_string()]);
        assert_eq!(email.subject, "Invoice INV-202501-0007 from Whitmore Payments");
        assert!(email.text.contains("$108.00"));
        assert!(email.text.contains("2025-01-31"));
        assert!(email.html.contains("Acme &lt;Ltd&gt;"));
        assert!(email.html.contains("http://localhost:5173/invoice/tok"));
    }

    #[test]
    fn request_fields_override_stored_ones() {
        let payload = SendInvoiceRequest {
            recipient_name: Some("Jane".into()),
            amount: Some(42.5),
            due_date: Some("2025-02-15".into()),
            ..Default::default()
        };
        let email = compose_invoice_email(&invoice(), &payload, "jane@acme.test", "u");
        assert!(email.text.starts_with("Hi Jane,"));
        assert!(email.text.contains("$42.50"));
        assert!(email.text.contains("2025-02-15"));
    }
}
