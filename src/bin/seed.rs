use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use uuid::Uuid;
use whitmore_payments::{
    config::AppConfig,
    db,
    dto::invoices::{CreateInvoiceItem, CreateInvoiceRequest},
    entity::profiles::{ActiveModel as ProfileActive, Entity as Profiles},
    models::InvoiceStatus,
    services::{invoice_service, public_invoice_service::public_invoice_url},
};

// Fixed so a locally minted JWT with this `sub` sees the seeded data.
const DEMO_OWNER: Uuid = Uuid::from_u128(0x5eed_0000_0000_4000_8000_0000_0000_0001);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let orm = db::connect(&config.database_url).await?;

    if Profiles::find_by_id(DEMO_OWNER).one(&orm).await?.is_none() {
        let now = Utc::now();
        ProfileActive {
            id: Set(DEMO_OWNER),
            email: Set("owner@example.com".into()),
            full_name: Set(Some("Demo Owner".into())),
            company_name: Set(Some("Whitmore Demo Studio".into())),
            company_address: Set(None),
            company_phone: Set(None),
            company_logo_url: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&orm)
        .await?;
        println!("Seeded profile {DEMO_OWNER}");
    }

    let today = Utc::now().date_naive();
    let invoices = [
        ("Acme Corp", "ap@acme.example", InvoiceStatus::Sent, 10_000, 800),
        ("Globex", "billing@globex.example", InvoiceStatus::Paid, 25_000, 0),
        ("Initech", "finance@initech.example", InvoiceStatus::Draft, 4_500, 360),
    ];

    for (client_name, client_email, status, subtotal, tax) in invoices {
        let created = invoice_service::create_invoice(
            &orm,
            DEMO_OWNER,
            CreateInvoiceRequest {
                client_name: client_name.into(),
                client_email: client_email.into(),
                client_address: None,
                status: Some(status),
                issue_date: today,
                due_date: today + Duration::days(30),
                subtotal,
                tax,
                total: subtotal + tax,
                notes: Some("Thank you for your business.".into()),
                items: vec![CreateInvoiceItem {
                    description: "Consulting".into(),
                    quantity: 1.0,
                    unit_price: subtotal,
                    amount: subtotal,
                }],
            },
        )
        .await?;

        println!(
            "Seeded {} -> {}",
            created.invoice.invoice_number,
            public_invoice_url(&config.site_url, &created.invoice.access_token)
        );
    }

    Ok(())
}
