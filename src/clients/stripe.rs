use std::collections::HashMap;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

const CHECKOUT_SESSIONS_URL: &str = "https://api.stripe.com/v1/checkout/sessions";

/// Maximum age of a signed webhook, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: u64 = 300;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("malformed stripe-signature header")]
    Malformed,
    #[error("webhook timestamp outside tolerance")]
    Expired,
    #[error("webhook signature mismatch")]
    Mismatch,
}

/// Check a `stripe-signature` header (`t=<unix>,v1=<hex>[,v1=...]`) against
/// the raw request body.
pub fn verify_webhook_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
) -> Result<(), SignatureError> {
    let mut timestamp = None;
    let mut candidates = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if candidates.is_empty() {
        return Err(SignatureError::Malformed);
    }
    let age = now
        .checked_sub(timestamp)
        .map(i64::unsigned_abs)
        .ok_or(SignatureError::Expired)?;
    if age > SIGNATURE_TOLERANCE_SECS {
        return Err(SignatureError::Expired);
    }

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Malformed)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    let matched = candidates
        .iter()
        .filter_map(|candidate| hex::decode(candidate).ok())
        .any(|expected| mac.clone().verify_slice(&expected).is_ok());

    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: StripeEventData,
}

#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub payment_method_types: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    pub fn invoice_id(&self) -> Option<Uuid> {
        self.metadata
            .get("invoice_id")
            .and_then(|id| Uuid::parse_str(id).ok())
    }

    /// Processor id recorded on the payment row.
    pub fn payment_reference(&self) -> &str {
        self.payment_intent.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug)]
pub struct CheckoutSessionParams<'a> {
    pub invoice_id: Uuid,
    pub invoice_number: &'a str,
    pub amount_cents: i64,
    pub customer_email: Option<&'a str>,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Deserialize)]
struct CreatedSession {
    url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
}

impl StripeClient {
    pub fn new(http: reqwest::Client, secret_key: impl Into<String>) -> Self {
        Self {
            http,
            secret_key: secret_key.into(),
        }
    }

    /// Create a hosted Checkout Session for one invoice and return its URL.
    pub async fn create_checkout_session(
        &self,
        params: CheckoutSessionParams<'_>,
    ) -> AppResult<String> {
        let mut form = vec![
            ("mode", "payment".to_string()),
            ("success_url", params.success_url),
            ("cancel_url", params.cancel_url),
            ("line_items[0][quantity]", "1".to_string()),
            ("line_items[0][price_data][currency]", "usd".to_string()),
            (
                "line_items[0][price_data][unit_amount]",
                params.amount_cents.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                format!("Invoice {}", params.invoice_number),
            ),
            ("metadata[invoice_id]", params.invoice_id.to_string()),
            ("metadata[invoice_number]", params.invoice_number.to_string()),
        ];
        if let Some(email) = params.customer_email {
            form.push(("customer_email", email.to_string()));
        }

        let response = self
            .http
            .post(CHECKOUT_SESSIONS_URL)
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Stripe returned {status}: {detail}"
            )));
        }

        let session: CreatedSession = response.json().await?;
        session
            .url
            .ok_or_else(|| AppError::Upstream("Stripe session has no checkout url".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test123secret456";

    fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.").as_bytes());
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_valid_signature() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let now = 1_700_000_000;
        let header = format!("t={now},v1={}", sign(payload, SECRET, now));
        assert_eq!(verify_webhook_signature(payload, &header, SECRET, now + 10), Ok(()));
    }

    #[test]
    fn accepts_any_matching_v1_entry() {
        let payload = b"{}";
        let now = 1_700_000_000;
        let header = format!("t={now},v1=deadbeef,v1={}", sign(payload, SECRET, now));
        assert_eq!(verify_webhook_signature(payload, &header, SECRET, now), Ok(()));
    }

    #[test]
    fn rejects_wrong_secret_and_modified_payload() {
        let payload = br#"{"amount":100}"#;
        let now = 1_700_000_000;
        let header = format!("t={now},v1={}", sign(payload, "wrong_secret", now));
        assert_eq!(
            verify_webhook_signature(payload, &header, SECRET, now),
            Err(SignatureError::Mismatch)
        );

        let header = format!("t={now},v1={}", sign(payload, SECRET, now));
        assert_eq!(
            verify_webhook_signature(br#"{"amount":999}"#, &header, SECRET, now),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_stale_timestamp() {
        let payload = b"{}";
        let signed_at = 1_700_000_000;
        let header = format!("t={signed_at},v1={}", sign(payload, SECRET, signed_at));
        assert_eq!(
            verify_webhook_signature(payload, &header, SECRET, signed_at + 600),
            Err(SignatureError::Expired)
        );
    }

    #[test]
    fn extreme_timestamps_are_expired() {
        let now = 1_700_000_000;
        for t in [i64::MIN, i64::MAX] {
            let header = format!("t={t},v1=00");
            assert_eq!(
                verify_webhook_signature(b"{}", &header, SECRET, now),
                Err(SignatureError::Expired)
            );
        }
    }

    #[test]
    fn rejects_header_without_timestamp_or_signature() {
        assert_eq!(
            verify_webhook_signature(b"{}", "v1=abcd", SECRET, 0),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            verify_webhook_signature(b"{}", "t=0", SECRET, 0),
            Err(SignatureError::Malformed)
        );
    }

    #[test]
    fn checkout_session_prefers_payment_intent_reference() {
        let session: CheckoutSession = serde_json::from_value(serde_json::json!({
            "id": "cs_test_1",
            "payment_intent": "pi_123",
            "amount_total": 10800,
            "metadata": { "invoice_id": "6f1c1a44-4f6e-4a53-9a43-0d6d1a0b7e01" }
        }))
        .unwrap();
        assert_eq!(session.payment_reference(), "pi_123");
        assert!(session.invoice_id().is_some());
    }
}
