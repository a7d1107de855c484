mod common;

use uuid::Uuid;
use whitmore_payments::{
    dto::{leads::CreateLeadRequest, profiles::UpdateProfileRequest},
    error::AppError,
    middleware::auth::AuthUser,
    services::{lead_service, profile_service},
};

use common::setup_state;

#[tokio::test]
async fn lead_gets_defaults_and_normalized_email() -> anyhow::Result<()> {
    let state = setup_state().await?;

    let lead = lead_service::create_lead(
        &state.orm,
        CreateLeadRequest {
            email: Some("  Owner@Example.COM ".into()),
            name: Some("Jo".into()),
            plan_interest: Some("professional".into()),
            ..Default::default()
        },
    )
    .await?;

    assert_eq!(lead.email, "owner@example.com");
    assert_eq!(lead.source, "website");
    assert_eq!(lead.status, "new");
    assert_eq!(lead.plan_interest.as_deref(), Some("professional"));
    Ok(())
}

#[tokio::test]
async fn duplicate_lead_email_is_rejected() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let request = |email: &str| CreateLeadRequest {
        email: Some(email.into()),
        ..Default::default()
    };

    lead_service::create_lead(&state.orm, request("trial@example.com")).await?;
    let err = lead_service::create_lead(&state.orm, request("TRIAL@example.com"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, AppError::BadRequest(msg) if msg == "This email is already registered for a trial.")
    );
    Ok(())
}

#[tokio::test]
async fn lead_requires_valid_email() -> anyhow::Result<()> {
    let state = setup_state().await?;
    for email in [None, Some(""), Some("nope")] {
        let err = lead_service::create_lead(
            &state.orm,
            CreateLeadRequest {
                email: email.map(str::to_string),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
    Ok(())
}

#[tokio::test]
async fn profile_is_created_on_first_access_and_patched() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = AuthUser {
        user_id: Uuid::new_v4(),
        email: Some("owner@example.com".into()),
    };

    let profile = profile_service::get_or_create_profile(&state.orm, &user).await?;
    assert_eq!(profile.id, user.user_id);
    assert_eq!(profile.email, "owner@example.com");
    assert_eq!(profile.sender_name(), None);

    let again = profile_service::get_or_create_profile(&state.orm, &user).await?;
    assert_eq!(again.created_at, profile.created_at);

    let updated = profile_service::update_profile(
        &state.orm,
        &user,
        UpdateProfileRequest {
            full_name: Some("Jo Owner".into()),
            company_name: Some("Owner Studio".into()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(updated.full_name.as_deref(), Some("Jo Owner"));
    assert_eq!(updated.sender_name(), Some("Owner Studio"));
    Ok(())
}
