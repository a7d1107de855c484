#![allow(dead_code)]

use chrono::{Duration, NaiveDate, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;
use whitmore_payments::{
    config::AppConfig,
    db,
    dto::{
        auth::Claims,
        invoices::{CreateInvoiceItem, CreateInvoiceRequest, InvoiceWithItems},
    },
    services::invoice_service,
    state::AppState,
};

pub const JWT_SECRET: &str = "test-secret";

pub fn test_config() -> AppConfig {
    AppConfig::minimal("sqlite::memory:", JWT_SECRET)
}

pub async fn setup_state() -> anyhow::Result<AppState> {
    setup_state_with(test_config()).await
}

pub async fn setup_state_with(config: AppConfig) -> anyhow::Result<AppState> {
    let orm = db::connect(&config.database_url).await?;
    Ok(AppState::new(orm, config))
}

pub fn bearer_token(user_id: Uuid, email: &str) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        email: Some(email.to_string()),
        role: Some("authenticated".into()),
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("sign test token")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// $100.00 of consulting plus $8.00 tax.
pub fn sample_invoice() -> CreateInvoiceRequest {
    CreateInvoiceRequest {
        client_name: "Acme Corp".into(),
        client_email: "ap@acme.test".into(),
        client_address: Some("1 Main St".into()),
        status: None,
        issue_date: date(2025, 1, 1),
        due_date: date(2025, 1, 31),
        subtotal: 10_000,
        tax: 800,
        total: 10_800,
        notes: Some("Net 30".into()),
        items: vec![
            CreateInvoiceItem {
                description: "Consulting".into(),
                quantity: 2.0,
                unit_price: 4_000,
                amount: 8_000,
            },
            CreateInvoiceItem {
                description: "Travel".into(),
                quantity: 1.0,
                unit_price: 2_000,
                amount: 2_000,
            },
        ],
    }
}

pub async fn create_sample(state: &AppState, owner: Uuid) -> InvoiceWithItems {
    invoice_service::create_invoice(&state.orm, owner, sample_invoice())
        .await
        .expect("create sample invoice")
}
