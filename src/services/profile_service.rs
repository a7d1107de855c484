use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use crate::{
    dto::profiles::UpdateProfileRequest,
    entity::profiles::{ActiveModel as ProfileActive, Entity as Profiles},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Profile,
};

pub async fn find_profile(db: &DatabaseConnection, user_id: Uuid) -> AppResult<Option<Profile>> {
    Ok(Profiles::find_by_id(user_id)
        .one(db)
        .await?
        .map(Profile::from))
}

/// The caller's profile, created from the token's email on first access.
pub async fn get_or_create_profile(db: &DatabaseConnection, user: &AuthUser) -> AppResult<Profile> {
    if let Some(profile) = find_profile(db, user.user_id).await? {
        return Ok(profile);
    }

    let now = Utc::now();
    let profile = ProfileActive {
        id: Set(user.user_id),
        email: Set(user.email.clone().unwrap_or_default()),
        full_name: Set(None),
        company_name: Set(None),
        company_address: Set(None),
        company_phone: Set(None),
        company_logo_url: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await?;

    tracing::debug!(user_id = %user.user_id, "profile created");
    Ok(Profile::from(profile))
}

pub async fn update_profile(
    db: &DatabaseConnection,
    user: &AuthUser,
    patch: UpdateProfileRequest,
) -> AppResult<Profile> {
    get_or_create_profile(db, user).await?;
    let existing = Profiles::find_by_id(user.user_id)
        .one(db)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ProfileActive = existing.into();
    if let Some(full_name) = patch.full_name {
        active.full_name = Set(Some(full_name));
    }
    if let Some(company_name) = patch.company_name {
        active.company_name = Set(Some(company_name));
    }
    if let Some(company_address) = patch.company_address {
        active.company_address = Set(Some(company_address));
    }
    if let Some(company_phone) = patch.company_phone {
        active.company_phone = Set(Some(company_phone));
    }
    if let Some(company_logo_url) = patch.company_logo_url {
        active.company_logo_url = Set(Some(company_logo_url));
    }
    active.updated_at = Set(Utc::now().into());

    Ok(Profile::from(active.update(db).await?))
}
