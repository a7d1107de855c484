mod common;

use uuid::Uuid;
use whitmore_payments::{
    error::AppError, models::InvoiceStatus, services::public_invoice_service::resolve_by_token,
};

use common::{create_sample, setup_state};

#[tokio::test]
async fn token_resolves_to_its_invoice_without_owner_details() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let owner = Uuid::new_v4();
    let created = create_sample(&state, owner).await;
    create_sample(&state, owner).await;

    let public = resolve_by_token(&state.orm, &created.invoice.access_token).await?;
    assert_eq!(public.id, created.invoice.id);
    assert_eq!(public.invoice_number, created.invoice.invoice_number);
    assert_eq!(public.status, InvoiceStatus::Draft);
    assert_eq!(public.total, 10_800);
    assert_eq!(public.items.len(), 2);

    let json = serde_json::to_value(&public)?;
    assert!(json.get("user_id").is_none());
    assert!(json.get("access_token").is_none());
    assert!(!json.to_string().contains(&owner.to_string()));
    Ok(())
}

#[tokio::test]
async fn only_exact_tokens_resolve() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let created = create_sample(&state, Uuid::new_v4()).await;
    let token = created.invoice.access_token;

    for candidate in [
        String::new(),
        token[..10].to_string(),
        format!("{token}x"),
        token.to_uppercase(),
        created.invoice.id.to_string(),
        created.invoice.invoice_number.clone(),
        "a".repeat(300),
    ] {
        if candidate == token {
            continue;
        }
        let result = resolve_by_token(&state.orm, &candidate).await;
        assert!(matches!(result, Err(AppError::NotFound)), "{candidate} resolved");
    }
    Ok(())
}

#[tokio::test]
async fn deleted_invoice_token_stops_resolving() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let owner = Uuid::new_v4();
    let created = create_sample(&state, owner).await;

    whitmore_payments::services::invoice_service::delete_invoice(
        &state.orm,
        owner,
        created.invoice.id,
    )
    .await?;

    assert!(matches!(
        resolve_by_token(&state.orm, &created.invoice.access_token).await,
        Err(AppError::NotFound)
    ));
    Ok(())
}
