mod common;

use std::collections::HashSet;

use sea_orm::{ConnectionTrait, EntityTrait};
use uuid::Uuid;
use whitmore_payments::{
    dto::invoices::{CreateInvoiceItem, UpdateInvoiceRequest},
    entity::invoice_counters::Entity as InvoiceCounters,
    error::AppError,
    models::InvoiceStatus,
    services::invoice_service,
};

use common::{create_sample, date, sample_invoice, setup_state};

#[tokio::test]
async fn create_stores_invoice_items_and_given_total() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let owner = Uuid::new_v4();

    let created = create_sample(&state, owner).await;

    assert_eq!(created.invoice.user_id, owner);
    assert_eq!(created.invoice.status, InvoiceStatus::Draft);
    assert_eq!(created.invoice.subtotal, 10_000);
    assert_eq!(created.invoice.tax, 800);
    assert_eq!(created.invoice.total, 10_800);
    assert_eq!(created.invoice.access_token.len(), 43);
    assert_eq!(created.items.len(), 2);

    let fetched = invoice_service::get_invoice(&state.orm, owner, created.invoice.id).await?;
    assert_eq!(fetched.invoice.id, created.invoice.id);
    assert_eq!(fetched.invoice.invoice_number, created.invoice.invoice_number);
    assert_eq!(fetched.invoice.access_token, created.invoice.access_token);
    assert_eq!(fetched.invoice.total, 10_800);
    let descriptions: Vec<_> = fetched.items.iter().map(|i| i.description.as_str()).collect();
    assert_eq!(descriptions, ["Consulting", "Travel"]);
    Ok(())
}

#[tokio::test]
async fn total_is_not_recomputed_from_parts() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let owner = Uuid::new_v4();
    let mut payload = sample_invoice();
    payload.total = 12_345;

    let created = invoice_service::create_invoice(&state.orm, owner, payload).await?;
    assert_eq!(created.invoice.total, 12_345);
    Ok(())
}

#[tokio::test]
async fn invoice_numbers_are_unique_per_owner() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let owner = Uuid::new_v4();
    let other = Uuid::new_v4();

    let mut numbers = HashSet::new();
    for _ in 0..5 {
        let created = create_sample(&state, owner).await;
        assert!(created.invoice.invoice_number.starts_with("INV-"));
        assert!(numbers.insert(created.invoice.invoice_number));
    }
    assert!(numbers.iter().any(|n| n.ends_with("-0001")));
    assert!(numbers.iter().any(|n| n.ends_with("-0005")));

    // Each owner has an independent sequence.
    let first_of_other = create_sample(&state, other).await;
    assert!(first_of_other.invoice.invoice_number.ends_with("-0001"));
    Ok(())
}

#[tokio::test]
async fn counter_row_advances_in_place() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let owner = Uuid::new_v4();

    let numbers: Vec<String> = [
        create_sample(&state, owner).await,
        create_sample(&state, owner).await,
        create_sample(&state, owner).await,
    ]
    .into_iter()
    .map(|created| created.invoice.invoice_number)
    .collect();
    assert!(numbers[0].ends_with("-0001"));
    assert!(numbers[1].ends_with("-0002"));
    assert!(numbers[2].ends_with("-0003"));

    let counters = InvoiceCounters::find().all(&state.orm).await?;
    assert_eq!(counters.len(), 1);
    assert_eq!(counters[0].user_id, owner);
    assert_eq!(counters[0].last_value, 3);
    Ok(())
}

#[tokio::test]
async fn unavailable_counter_falls_back_to_time_based_number() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let owner = Uuid::new_v4();
    state
        .orm
        .execute_unprepared("DROP TABLE invoice_counters")
        .await?;

    let created = create_sample(&state, owner).await;
    let number = &created.invoice.invoice_number;
    let digits = number.strip_prefix("INV-").expect("INV- prefix");
    assert_eq!(digits.len(), 5, "unexpected number {number}");
    assert!(digits.chars().all(|c| c.is_ascii_digit()));

    let fetched = invoice_service::get_invoice(&state.orm, owner, created.invoice.id).await?;
    assert_eq!(&fetched.invoice.invoice_number, number);
    Ok(())
}

#[tokio::test]
async fn access_tokens_are_distinct() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let owner = Uuid::new_v4();

    let a = create_sample(&state, owner).await;
    let b = create_sample(&state, owner).await;
    assert_ne!(a.invoice.access_token, b.invoice.access_token);
    assert!(!a.invoice.access_token.contains(&a.invoice.id.to_string()));
    Ok(())
}

#[tokio::test]
async fn other_owners_cannot_see_or_change_invoice() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let owner = Uuid::new_v4();
    let intruder = Uuid::new_v4();
    let created = create_sample(&state, owner).await;
    let id = created.invoice.id;

    let err = invoice_service::get_invoice(&state.orm, intruder, id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    assert!(invoice_service::list_invoices(&state.orm, intruder, None).await?.is_empty());

    let patched = invoice_service::set_status(&state.orm, intruder, id, InvoiceStatus::Paid).await?;
    assert!(patched.is_none());

    assert!(!invoice_service::delete_invoice(&state.orm, intruder, id).await?);

    let still_there = invoice_service::get_invoice(&state.orm, owner, id).await?;
    assert_eq!(still_there.invoice.status, InvoiceStatus::Draft);
    Ok(())
}

#[tokio::test]
async fn listing_is_newest_first_and_repeatable() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let owner = Uuid::new_v4();
    for _ in 0..3 {
        create_sample(&state, owner).await;
    }

    let first = invoice_service::list_invoices(&state.orm, owner, None).await?;
    let second = invoice_service::list_invoices(&state.orm, owner, None).await?;
    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
    assert!(first.windows(2).all(|pair| pair[0].created_at >= pair[1].created_at));
    Ok(())
}

#[tokio::test]
async fn list_filters_by_status() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let owner = Uuid::new_v4();
    let sent = create_sample(&state, owner).await;
    create_sample(&state, owner).await;
    invoice_service::set_status(&state.orm, owner, sent.invoice.id, InvoiceStatus::Sent).await?;

    let only_sent =
        invoice_service::list_invoices(&state.orm, owner, Some(InvoiceStatus::Sent)).await?;
    assert_eq!(only_sent.len(), 1);
    assert_eq!(only_sent[0].id, sent.invoice.id);
    Ok(())
}

#[tokio::test]
async fn update_patches_fields_and_refreshes_updated_at() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let owner = Uuid::new_v4();
    let created = create_sample(&state, owner).await;

    let updated = invoice_service::update_invoice(
        &state.orm,
        owner,
        created.invoice.id,
        UpdateInvoiceRequest {
            client_name: Some("Acme Holdings".into()),
            status: Some(InvoiceStatus::Overdue),
            due_date: Some(date(2025, 2, 28)),
            ..Default::default()
        },
    )
    .await?
    .expect("owned invoice");

    assert_eq!(updated.client_name, "Acme Holdings");
    assert_eq!(updated.status, InvoiceStatus::Overdue);
    assert_eq!(updated.due_date, date(2025, 2, 28));
    assert_eq!(updated.client_email, created.invoice.client_email);
    assert_eq!(updated.total, created.invoice.total);
    assert!(updated.updated_at >= created.invoice.updated_at);
    Ok(())
}

#[tokio::test]
async fn any_status_may_follow_any_other() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let owner = Uuid::new_v4();
    let id = create_sample(&state, owner).await.invoice.id;

    for status in [
        InvoiceStatus::Paid,
        InvoiceStatus::Draft,
        InvoiceStatus::Cancelled,
        InvoiceStatus::Sent,
    ] {
        let updated = invoice_service::set_status(&state.orm, owner, id, status)
            .await?
            .expect("owned invoice");
        assert_eq!(updated.status, status);
    }
    Ok(())
}

#[tokio::test]
async fn invalid_payloads_are_rejected_without_writes() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let owner = Uuid::new_v4();

    let mut bad_item = sample_invoice();
    bad_item.items.push(CreateInvoiceItem {
        description: "Broken".into(),
        quantity: 0.0,
        unit_price: 100,
        amount: 0,
    });
    let err = invoice_service::create_invoice(&state.orm, owner, bad_item)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let mut bad_dates = sample_invoice();
    bad_dates.due_date = date(2024, 12, 1);
    assert!(matches!(
        invoice_service::create_invoice(&state.orm, owner, bad_dates).await,
        Err(AppError::BadRequest(_))
    ));

    let mut bad_email = sample_invoice();
    bad_email.client_email = "not-an-email".into();
    assert!(matches!(
        invoice_service::create_invoice(&state.orm, owner, bad_email).await,
        Err(AppError::BadRequest(_))
    ));

    assert!(invoice_service::list_invoices(&state.orm, owner, None).await?.is_empty());

    // A rejected create does not consume a number.
    let created = create_sample(&state, owner).await;
    assert!(created.invoice.invoice_number.ends_with("-0001"));
    Ok(())
}

#[tokio::test]
async fn delete_removes_invoice_and_is_repeatable() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let owner = Uuid::new_v4();
    let created = create_sample(&state, owner).await;
    let id = created.invoice.id;

    assert!(invoice_service::delete_invoice(&state.orm, owner, id).await?);
    assert!(!invoice_service::delete_invoice(&state.orm, owner, id).await?);

    assert!(matches!(
        invoice_service::get_invoice(&state.orm, owner, id).await,
        Err(AppError::NotFound)
    ));
    assert!(invoice_service::list_payments(&state.orm, id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn summary_reflects_statuses() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let owner = Uuid::new_v4();
    let paid = create_sample(&state, owner).await.invoice.id;
    let sent = create_sample(&state, owner).await.invoice.id;
    create_sample(&state, owner).await;
    invoice_service::set_status(&state.orm, owner, paid, InvoiceStatus::Paid).await?;
    invoice_service::set_status(&state.orm, owner, sent, InvoiceStatus::Sent).await?;

    let invoices = invoice_service::list_invoices(&state.orm, owner, None).await?;
    let summary = invoice_service::summarize(&invoices);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.paid, 1);
    assert_eq!(summary.pending, 1);
    assert_eq!(summary.overdue, 0);
    assert_eq!(summary.total_revenue, 10_800);
    Ok(())
}
