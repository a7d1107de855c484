use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        functions::{GenerateInvoiceRequest, GenerateInvoiceResponse},
        invoices::{
            CreateInvoiceRequest, InvoiceDeleted, InvoiceList, InvoiceListQuery, InvoiceSummary,
            InvoiceWithItems, PaymentList, UpdateInvoiceRequest,
        },
    },
    error::{AppError, AppResult},
    extract::{ApiJson, ApiPath},
    middleware::auth::AuthUser,
    models::Invoice,
    response::{ApiResponse, Meta},
    services::{ai_invoice_service, invoice_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_invoices).post(create_invoice))
        .route("/summary", get(invoice_summary))
        .route("/generate", post(generate_invoice))
        .route(
            "/{id}",
            get(get_invoice).patch(update_invoice).delete(delete_invoice),
        )
        .route("/{id}/payments", get(list_payments))
}

#[utoipa::path(
    get,
    path = "/api/invoices",
    params(InvoiceListQuery),
    responses(
        (status = 200, description = "Invoices of the caller, newest first", body = ApiResponse<InvoiceList>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Invoices"
)]
pub async fn list_invoices(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<InvoiceListQuery>,
) -> AppResult<Json<ApiResponse<InvoiceList>>> {
    let items = invoice_service::list_invoices(&state.orm, user.user_id, query.status).await?;
    let meta = Meta::total(items.len());
    Ok(Json(ApiResponse::success(
        "OK",
        InvoiceList { items },
        Some(meta),
    )))
}

#[utoipa::path(
    post,
    path = "/api/invoices",
    request_body = CreateInvoiceRequest,
    responses(
        (status = 200, description = "Invoice created with its items", body = ApiResponse<InvoiceWithItems>),
        (status = 400, description = "Invalid invoice"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Invoices"
)]
pub async fn create_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateInvoiceRequest>,
) -> AppResult<Json<ApiResponse<InvoiceWithItems>>> {
    let created = invoice_service::create_invoice(&state.orm, user.user_id, payload).await?;
    Ok(Json(ApiResponse::success(
        "Invoice created",
        created,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/api/invoices/summary",
    responses(
        (status = 200, description = "Dashboard counters", body = ApiResponse<InvoiceSummary>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Invoices"
)]
pub async fn invoice_summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<InvoiceSummary>>> {
    let invoices = invoice_service::list_invoices(&state.orm, user.user_id, None).await?;
    Ok(Json(ApiResponse::ok(invoice_service::summarize(&invoices))))
}

#[utoipa::path(
    get,
    path = "/api/invoices/{id}",
    params(("id" = Uuid, Path, description = "Invoice id")),
    responses(
        (status = 200, description = "Invoice with items", body = ApiResponse<InvoiceWithItems>),
        (status = 404, description = "Not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Invoices"
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<InvoiceWithItems>>> {
    let invoice = invoice_service::get_invoice(&state.orm, user.user_id, id).await?;
    Ok(Json(ApiResponse::ok(invoice)))
}

#[utoipa::path(
    patch,
    path = "/api/invoices/{id}",
    params(("id" = Uuid, Path, description = "Invoice id")),
    request_body = UpdateInvoiceRequest,
    responses(
        (status = 200, description = "Updated invoice", body = ApiResponse<Invoice>),
        (status = 400, description = "Invalid patch"),
        (status = 404, description = "Not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Invoices"
)]
pub async fn update_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateInvoiceRequest>,
) -> AppResult<Json<ApiResponse<Invoice>>> {
    let updated = invoice_service::update_invoice(&state.orm, user.user_id, id, payload)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(ApiResponse::success(
        "Invoice updated",
        updated,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/invoices/{id}",
    params(("id" = Uuid, Path, description = "Invoice id")),
    responses(
        (status = 200, description = "Invoice removed, or nothing to remove", body = ApiResponse<InvoiceDeleted>),
    ),
    security(("bearer_auth" = [])),
    tag = "Invoices"
)]
pub async fn delete_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<InvoiceDeleted>>> {
    let deleted = invoice_service::delete_invoice(&state.orm, user.user_id, id).await?;
    Ok(Json(ApiResponse::success(
        "Invoice deleted",
        InvoiceDeleted { id, deleted },
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/api/invoices/{id}/payments",
    params(("id" = Uuid, Path, description = "Invoice id")),
    responses(
        (status = 200, description = "Payments recorded for the invoice", body = ApiResponse<PaymentList>),
        (status = 404, description = "Not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Invoices"
)]
pub async fn list_payments(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<PaymentList>>> {
    let invoice = invoice_service::find_owned(&state.orm, user.user_id, id)
        .await?
        .ok_or(AppError::NotFound)?;
    let items = invoice_service::list_payments(&state.orm, invoice.id).await?;
    let meta = Meta::total(items.len());
    Ok(Json(ApiResponse::success(
        "OK",
        PaymentList { items },
        Some(meta),
    )))
}

#[utoipa::path(
    post,
    path = "/api/invoices/generate",
    request_body = GenerateInvoiceRequest,
    responses(
        (status = 200, description = "Draft extracted from the prompt", body = ApiResponse<GenerateInvoiceResponse>),
        (status = 502, description = "Completion API failed or returned an incomplete draft"),
        (status = 503, description = "Completion API not configured"),
    ),
    security(("bearer_auth" = [])),
    tag = "Invoices"
)]
pub async fn generate_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<GenerateInvoiceRequest>,
) -> AppResult<Json<ApiResponse<GenerateInvoiceResponse>>> {
    let generated = ai_invoice_service::generate_invoice(&state, user.user_id, payload).await?;
    Ok(Json(ApiResponse::ok(generated)))
}
