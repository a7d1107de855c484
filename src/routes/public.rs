use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::public::PublicInvoice,
    error::AppResult,
    extract::ApiPath,
    response::ApiResponse,
    services::public_invoice_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/invoices/{token}", get(get_public_invoice))
}

/// Pay-page lookup. Anyone holding the link may read the invoice.
#[utoipa::path(
    get,
    path = "/api/public/invoices/{token}",
    params(("token" = String, Path, description = "Public access token from the invoice link")),
    responses(
        (status = 200, description = "Invoice as shown on the pay page", body = ApiResponse<PublicInvoice>),
        (status = 404, description = "Unknown token"),
    ),
    security(()),
    tag = "Public"
)]
pub async fn get_public_invoice(
    State(state): State<AppState>,
    ApiPath(token): ApiPath<String>,
) -> AppResult<Json<ApiResponse<PublicInvoice>>> {
    let invoice = public_invoice_service::resolve_by_token(&state.orm, &token).await?;
    Ok(Json(ApiResponse::ok(invoice)))
}
