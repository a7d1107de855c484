use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::leads::CreateLeadRequest,
    error::AppResult,
    extract::ApiJson,
    models::Lead,
    response::{ApiResponse, Meta},
    services::lead_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_lead))
}

#[utoipa::path(
    post,
    path = "/api/leads",
    request_body = CreateLeadRequest,
    responses(
        (status = 200, description = "Lead captured", body = ApiResponse<Lead>),
        (status = 400, description = "Invalid or already registered email"),
    ),
    security(()),
    tag = "Leads"
)]
pub async fn create_lead(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateLeadRequest>,
) -> AppResult<Json<ApiResponse<Lead>>> {
    let lead = lead_service::create_lead(&state.orm, payload).await?;
    Ok(Json(ApiResponse::success(
        "Lead created",
        lead,
        Some(Meta::empty()),
    )))
}
