use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, Set, SqlErr};
use uuid::Uuid;

use crate::{
    dto::leads::CreateLeadRequest,
    entity::leads::ActiveModel as LeadActive,
    error::{AppError, AppResult},
    models::Lead,
    services::invoice_service::validate_email,
};

pub const DEFAULT_SOURCE: &str = "website";
pub const DEFAULT_STATUS: &str = "new";

/// Store a trial sign-up. Emails are unique case-insensitively.
pub async fn create_lead(db: &DatabaseConnection, payload: CreateLeadRequest) -> AppResult<Lead> {
    let email = payload
        .email
        .as_deref()
        .map(|email| email.trim().to_lowercase())
        .filter(|email| !email.is_empty())
        .ok_or_else(|| AppError::BadRequest("email is required".into()))?;
    validate_email(&email, "email")?;

    let lead = LeadActive {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        name: Set(non_empty(payload.name)),
        phone: Set(non_empty(payload.phone)),
        business_type: Set(non_empty(payload.business_type)),
        source: Set(non_empty(payload.source).unwrap_or_else(|| DEFAULT_SOURCE.to_string())),
        plan_interest: Set(non_empty(payload.plan_interest)),
        status: Set(DEFAULT_STATUS.to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await
    .map_err(duplicate_as_bad_request)?;

    tracing::info!(lead_id = %lead.id, source = %lead.source, "lead captured");
    Ok(Lead::from(lead))
}

fn duplicate_as_bad_request(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::BadRequest("This email is already registered for a trial.".into())
        }
        _ => AppError::OrmError(err),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
