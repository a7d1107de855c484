use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::profiles::UpdateProfileRequest,
    error::AppResult,
    extract::ApiJson,
    middleware::auth::AuthUser,
    models::Profile,
    response::{ApiResponse, Meta},
    services::profile_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_profile).put(update_profile))
}

#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Profile of the caller", body = ApiResponse<Profile>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let profile = profile_service::get_or_create_profile(&state.orm, &user).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

#[utoipa::path(
    put,
    path = "/api/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = ApiResponse<Profile>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let profile = profile_service::update_profile(&state.orm, &user, payload).await?;
    Ok(Json(ApiResponse::success(
        "Profile updated",
        profile,
        Some(Meta::empty()),
    )))
}
