use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
};

use crate::{
    dto::functions::{
        CheckoutRequest, CheckoutResponse, GenerateEmailRequest, GeneratedEmail,
        SendInvoiceRequest, SendInvoiceResponse, SupportChatRequest, SupportChatResponse,
        WebhookAck,
    },
    error::AppResult,
    extract::ApiJson,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::{
        ai_email_service, checkout_service, send_invoice_service, support_chat_service,
        webhook_service,
    },
    state::AppState,
};

const STRIPE_SIGNATURE_HEADER: &str = "stripe-signature";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-checkout", post(create_checkout))
        .route("/stripe-webhook", post(stripe_webhook))
        .route("/send-invoice", post(send_invoice))
        .route("/ai-generate-email", post(ai_generate_email))
        .route("/ai-support-chat", post(ai_support_chat))
}

#[utoipa::path(
    post,
    path = "/api/functions/create-checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Hosted checkout url, or the placeholder when payments are not configured", body = ApiResponse<CheckoutResponse>),
        (status = 400, description = "Missing required fields"),
        (status = 502, description = "Payment processor error"),
    ),
    security(()),
    tag = "Functions"
)]
pub async fn create_checkout(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<CheckoutResponse>>> {
    let checkout = checkout_service::create_checkout(&state, payload).await?;
    Ok(Json(ApiResponse::ok(checkout)))
}

/// Raw body is kept as bytes; the signature covers it byte for byte.
#[utoipa::path(
    post,
    path = "/api/functions/stripe-webhook",
    request_body(content = String, content_type = "application/json"),
    params(("stripe-signature" = String, Header, description = "Processor signature header")),
    responses(
        (status = 200, description = "Event acknowledged", body = ApiResponse<WebhookAck>),
        (status = 400, description = "Missing or invalid signature"),
    ),
    security(()),
    tag = "Functions"
)]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<ApiResponse<WebhookAck>>> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    let ack = webhook_service::handle_stripe_webhook(&state, signature, &body).await?;
    Ok(Json(ApiResponse::ok(ack)))
}

#[utoipa::path(
    post,
    path = "/api/functions/send-invoice",
    request_body = SendInvoiceRequest,
    responses(
        (status = 200, description = "Invoice link sent (or logged) and status set to sent", body = ApiResponse<SendInvoiceResponse>),
        (status = 400, description = "Missing required fields"),
        (status = 404, description = "Invoice not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Functions"
)]
pub async fn send_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<SendInvoiceRequest>,
) -> AppResult<Json<ApiResponse<SendInvoiceResponse>>> {
    let sent = send_invoice_service::send_invoice(&state, user.user_id, payload).await?;
    Ok(Json(ApiResponse::ok(sent)))
}

#[utoipa::path(
    post,
    path = "/api/functions/ai-generate-email",
    request_body = GenerateEmailRequest,
    responses(
        (status = 200, description = "Generated subject and body", body = ApiResponse<GeneratedEmail>),
        (status = 400, description = "Missing required fields"),
        (status = 503, description = "Completion API not configured"),
    ),
    security(()),
    tag = "Functions"
)]
pub async fn ai_generate_email(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<GenerateEmailRequest>,
) -> AppResult<Json<ApiResponse<GeneratedEmail>>> {
    let email = ai_email_service::generate_email(&state, payload).await?;
    Ok(Json(ApiResponse::ok(email)))
}

#[utoipa::path(
    post,
    path = "/api/functions/ai-support-chat",
    request_body = SupportChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ApiResponse<SupportChatResponse>),
        (status = 400, description = "Messages array is required"),
        (status = 503, description = "Completion API not configured"),
    ),
    security(()),
    tag = "Functions"
)]
pub async fn ai_support_chat(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SupportChatRequest>,
) -> AppResult<Json<ApiResponse<SupportChatResponse>>> {
    let reply = support_chat_service::chat(&state, payload).await?;
    Ok(Json(ApiResponse::ok(reply)))
}
