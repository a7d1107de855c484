use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    clients::openai::{ChatClient, CompletionOptions},
    dto::{
        functions::{ChatMessage, ChatRole, GenerateInvoiceRequest, GenerateInvoiceResponse, InvoiceDraft},
        invoices::{CreateInvoiceItem, CreateInvoiceRequest},
    },
    error::{AppError, AppResult},
    models::InvoiceStatus,
    money::to_cents,
    services::invoice_service::create_invoice,
    state::AppState,
};

const DEFAULT_TERM_DAYS: i64 = 30;

const SYSTEM_PROMPT: &str = r#"You are an invoice generation assistant. Given a natural language description of an invoice, extract and structure the invoice details in JSON format.

Rules:
1. Extract client/customer name
2. Parse the service/product description
3. Calculate amounts (if quantities and rates provided)
4. Extract or generate line items
5. Set a reasonable due date (default 30 days from today)
6. Use USD as default currency unless specified
7. Generate clear, professional descriptions

Return ONLY valid JSON in this exact format:
{
  "clientName": "string",
  "clientEmail": "string or empty",
  "description": "brief summary",
  "amount": number (total),
  "currency": "USD",
  "dueDate": "YYYY-MM-DD",
  "lineItems": [
    {
      "description": "string",
      "quantity": number,
      "rate": number,
      "amount": number
    }
  ],
  "notes": "any additional notes"
}"#;

/// Turn a free-text description into an invoice draft, optionally saving it
/// for `owner` as a `draft` invoice.
pub async fn generate_invoice(
    state: &AppState,
    owner: Uuid,
    payload: GenerateInvoiceRequest,
) -> AppResult<GenerateInvoiceResponse> {
    let prompt = payload
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|prompt| !prompt.is_empty())
        .ok_or_else(|| AppError::BadRequest("prompt is required".into()))?;
    let client = ChatClient::from_state(state)?;
    let today = Utc::now().date_naive();

    let messages = [
        ChatMessage::new(
            ChatRole::System,
            format!("{SYSTEM_PROMPT}\n\nToday's date is {today}."),
        ),
        ChatMessage::new(ChatRole::User, prompt),
    ];
    let content = client
        .complete(
            &messages,
            CompletionOptions {
                temperature: 0.3,
                max_tokens: None,
                json_response: true,
            },
        )
        .await?
        .ok_or_else(|| AppError::Upstream("No response from OpenAI".into()))?;

    let draft = parse_invoice_draft(&content)?;

    let invoice = if payload.save {
        let request = draft_to_request(&draft, today)?;
        Some(create_invoice(&state.orm, owner, request).await?)
    } else {
        None
    };

    Ok(GenerateInvoiceResponse { draft, invoice })
}

/// Parse and check the model's JSON answer.
pub fn parse_invoice_draft(content: &str) -> AppResult<InvoiceDraft> {
    let draft: InvoiceDraft = serde_json::from_str(content)
        .map_err(|err| AppError::Upstream(format!("Failed to generate invoice: {err}")))?;

    let complete = !draft.client_name.trim().is_empty()
        && !draft.description.trim().is_empty()
        && draft.amount.is_finite()
        && draft.amount > 0.0;
    if !complete {
        return Err(AppError::Upstream(
            "Invalid invoice data generated. Missing required fields.".into(),
        ));
    }
    Ok(draft)
}

/// Repository payload for a draft. A due date in the past or unparseable
/// becomes `today + 30 days`; without line items the description becomes a
/// single item for the whole amount.
pub fn draft_to_request(draft: &InvoiceDraft, today: NaiveDate) -> AppResult<CreateInvoiceRequest> {
    let client_email = draft
        .client_email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .ok_or_else(|| {
            AppError::BadRequest("Generated invoice has no client email; add one before saving".into())
        })?;

    let due_date = draft
        .due_date
        .as_deref()
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
        .filter(|date| *date >= today)
        .unwrap_or(today + Duration::days(DEFAULT_TERM_DAYS));

    let total = to_cents(draft.amount);
    let mut items: Vec<CreateInvoiceItem> = draft
        .line_items
        .iter()
        .filter(|item| !item.description.trim().is_empty())
        .map(|item| CreateInvoiceItem {
            description: item.description.trim().to_string(),
            quantity: if item.quantity > 0.0 { item.quantity } else { 1.0 },
            unit_price: to_cents(item.rate).max(0),
            amount: to_cents(item.amount).max(0),
        })
        .collect();
    if items.is_empty() {
        items.push(CreateInvoiceItem {
            description: draft.description.trim().to_string(),
            quantity: 1.0,
            unit_price: total,
            amount: total,
        });
    }

    Ok(CreateInvoiceRequest {
        client_name: draft.client_name.trim().to_string(),
        client_email: client_email.to_string(),
        client_address: None,
        status: Some(InvoiceStatus::Draft),
        issue_date: today,
        due_date,
        subtotal: total,
        tax: 0,
        total,
        notes: draft
            .notes
            .clone()
            .filter(|notes| !notes.trim().is_empty()),
        items,
    })
}
