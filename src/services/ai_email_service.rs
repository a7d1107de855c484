use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use crate::{
    clients::openai::{ChatClient, CompletionOptions},
    dto::functions::{ChatMessage, ChatRole, GenerateEmailRequest, GeneratedEmail},
    entity::{ai_email_logs::ActiveModel as EmailLogActive, profiles::Entity as Profiles},
    error::{AppError, AppResult},
    models::{Invoice, Profile},
    money::format_cents,
    services::{invoice_service::find_owned, send_invoice_service::escape_html},
    state::AppState,
};

const SYSTEM_PROMPT: &str = "You are a professional email writing assistant for Whitmore Payments, \
an invoicing and payment management platform. Generate clear, professional, and friendly emails.";

pub const DEFAULT_SUBJECT: &str = "Your Invoice from Whitmore Payments";

/// Draft a client email with the chat-completion API and log it.
pub async fn generate_email(
    state: &AppState,
    payload: GenerateEmailRequest,
) -> AppResult<GeneratedEmail> {
    let (Some(email_type), Some(user_id)) = (
        payload.email_type.as_deref().filter(|kind| !kind.trim().is_empty()),
        payload.user_id,
    ) else {
        return Err(AppError::BadRequest(
            "Missing required fields: type, userId".into(),
        ));
    };
    let client = ChatClient::from_state(state)?;

    let (invoice, profile) = match payload.invoice_id {
        Some(invoice_id) => {
            let invoice = find_owned(&state.orm, user_id, invoice_id)
                .await?
                .ok_or(AppError::NotFound)?;
            let profile = Profiles::find_by_id(user_id)
                .one(&state.orm)
                .await?
                .map(Profile::from);
            (Some(invoice), profile)
        }
        None => (None, None),
    };

    let prompt = build_email_prompt(
        email_type,
        invoice.as_ref(),
        profile.as_ref(),
        payload.extra_notes.as_deref(),
    );
    let messages = [
        ChatMessage::new(ChatRole::System, SYSTEM_PROMPT),
        ChatMessage::new(ChatRole::User, prompt),
    ];
    let content = client
        .complete(
            &messages,
            CompletionOptions {
                temperature: 0.7,
                max_tokens: Some(1000),
                json_response: false,
            },
        )
        .await?
        .unwrap_or_default();

    let email = parse_email_content(&content);
    log_generated_email(
        &state.orm,
        user_id,
        payload.invoice_id,
        email_type,
        &email,
        payload.extra_notes.as_deref(),
    )
    .await;

    Ok(email)
}

/// Instruction line for each known email type.
pub fn type_instructions(email_type: &str) -> &'static str {
    match email_type {
        "invoice_created" => {
            "Write an email informing the client that a new invoice has been created and is ready \
             for payment. Include the invoice details and a call-to-action to view and pay."
        }
        "payment_reminder" => {
            "Write a friendly reminder email about the upcoming invoice due date. Be professional \
             but not pushy."
        }
        "overdue_notice" => {
            "Write a polite but firm email about an overdue invoice. Express understanding while \
             emphasizing the need for payment."
        }
        "welcome_onboarding" => {
            "Write a welcoming onboarding email introducing the client to Whitmore Payments and \
             explaining how to get started."
        }
        "plan_upgrade" => {
            "Write an email about upgrading to a better plan, highlighting the benefits and value."
        }
        _ => "Write a professional business email.",
    }
}

pub fn build_email_prompt(
    email_type: &str,
    invoice: Option<&Invoice>,
    profile: Option<&Profile>,
    extra_notes: Option<&str>,
) -> String {
    let mut prompt = String::from("Generate a professional email for the following scenario:\n\n");
    prompt.push_str(
        "Context: Whitmore Payments is an invoicing and payment management platform.\n",
    );
    prompt.push_str(&format!("Email Type: {email_type}\n\n"));

    if let Some(invoice) = invoice {
        prompt.push_str("Invoice Details:\n");
        prompt.push_str(&format!("- Invoice Number: {}\n", invoice.invoice_number));
        prompt.push_str(&format!("- Amount: ${}\n", format_cents(invoice.total)));
        prompt.push_str(&format!("- Due Date: {}\n", invoice.due_date));
        prompt.push_str(&format!("- Status: {}\n", invoice.status));
        prompt.push_str(&format!("- Client Name: {}\n", invoice.client_name));
        prompt.push_str(&format!("- Client Email: {}\n\n", invoice.client_email));
    }

    if let Some(profile) = profile {
        prompt.push_str(&format!(
            "From: {}\n\n",
            profile.sender_name().unwrap_or("Whitmore Payments")
        ));
    }

    if let Some(notes) = extra_notes.filter(|notes| !notes.trim().is_empty()) {
        prompt.push_str(&format!("Additional Notes: {notes}\n\n"));
    }

    prompt.push_str(type_instructions(email_type));
    prompt.push_str("\n\nFormat your response exactly like this:\n");
    prompt.push_str("SUBJECT: [subject line here]\n\n");
    prompt.push_str("BODY:\n[email body here with paragraphs]\n\n");
    prompt.push_str(
        "Make the email warm, professional, and actionable. Use proper formatting with paragraphs.",
    );
    prompt
}

/// Split a `SUBJECT:` / `BODY:` completion into an email. Markers are
/// matched case-insensitively; without them the subject falls back to
/// [`DEFAULT_SUBJECT`] and the whole completion becomes the body.
pub fn parse_email_content(content: &str) -> GeneratedEmail {
    let subject = find_marker(content, "subject:")
        .and_then(|rest| rest.trim_start().lines().next())
        .map(str::trim)
        .filter(|subject| !subject.is_empty())
        .unwrap_or(DEFAULT_SUBJECT)
        .to_string();

    let body_text = find_marker(content, "body:")
        .map(str::trim)
        .filter(|body| !body.is_empty())
        .unwrap_or(content)
        .to_string();

    let paragraphs = body_text
        .split("\n\n")
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .map(|paragraph| format!("<p>{}</p>", escape_html(paragraph)))
        .collect::<Vec<_>>()
        .join("\n");

    GeneratedEmail {
        subject,
        body_html: format!(
            "<div style=\"font-family: Arial, sans-serif; line-height: 1.6; color: #333;\">{paragraphs}</div>"
        ),
        body_text,
    }
}

// ASCII lowercasing keeps byte offsets aligned with `content`.
fn find_marker<'a>(content: &'a str, marker: &str) -> Option<&'a str> {
    content
        .to_ascii_lowercase()
        .find(marker)
        .map(|start| &content[start + marker.len()..])
}

async fn log_generated_email(
    db: &DatabaseConnection,
    user_id: Uuid,
    invoice_id: Option<Uuid>,
    email_type: &str,
    email: &GeneratedEmail,
    extra_notes: Option<&str>,
) {
    let result = EmailLogActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        invoice_id: Set(invoice_id),
        email_type: Set(email_type.to_string()),
        subject: Set(email.subject.clone()),
        body_text: Set(email.body_text.clone()),
        body_html: Set(email.body_html.clone()),
        extra_notes: Set(extra_notes.map(str::to_string)),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await;

    if let Err(err) = result {
        tracing::warn!(error = %err, "failed to log generated email");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subject_and_body_markers() {
        let email = parse_email_content(
            "SUBJECT: Invoice INV-1 is ready\n\nBODY:\nHello there,\n\nPlease pay & enjoy.",
        );
        assert_eq!(email.subject, "Invoice INV-1 is ready");
        assert_eq!(email.body_text, "Hello there,\n\nPlease pay & enjoy.");
        assert_eq!(
            email.body_html,
            "<div style=\"font-family: Arial, sans-serif; line-height: 1.6; color: #333;\">\
             <p>Hello there,</p>\n<p>Please pay &amp; enjoy.</p></div>"
        );
    }

    #[test]
    fn markers_are_case_insensitive() {
        let email = parse_email_content("subject: Hi\nbody: Short note");
        assert_eq!(email.subject, "Hi");
        assert_eq!(email.body_text, "Short note");
    }

    #[test]
    fn missing_markers_fall_back_to_defaults() {
        let email = parse_email_content("Just a plain reply.");
        assert_eq!(email.subject, DEFAULT_SUBJECT);
        assert_eq!(email.body_text, "Just a plain reply.");
    }

    #[test]
    fn prompt_includes_type_instruction_and_notes() {
        let prompt = build_email_prompt("payment_reminder", None, None, Some("Be brief"));
        assert!(prompt.contains("Email Type: payment_reminder"));
        assert!(prompt.contains("friendly reminder email"));
        assert!(prompt.contains("Additional Notes: Be brief"));
        assert!(!prompt.contains("Invoice Details"));

        let prompt = build_email_prompt("something_else", None, None, None);
        assert!(prompt.contains("Write a professional business email."));
    }
}
