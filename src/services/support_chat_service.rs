use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use uuid::Uuid;

use crate::{
    clients::openai::{ChatClient, CompletionOptions},
    dto::functions::{ChatMessage, ChatRole, SupportChatRequest, SupportChatResponse},
    entity::{
        ai_support_messages::ActiveModel as MessageActive,
        ai_support_sessions::{ActiveModel as SessionActive, Entity as Sessions},
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub const MAX_MESSAGE_LENGTH: usize = 2000;
pub const MAX_HISTORY_MESSAGES: usize = 10;
pub const FALLBACK_REPLY: &str =
    "I apologize, but I was unable to generate a response. Please try again.";

const SYSTEM_PROMPT: &str = r#"You are Whitmore AI, a helpful customer support assistant for Whitmore Payments, a professional invoicing and payment management platform.

About Whitmore Payments:
- A modern SaaS platform for creating, sending, and managing invoices
- Features include invoice generation, payment tracking, client management, and automated reminders
- Secure payment processing with Stripe integration
- Professional invoice templates and customization options

Available Plans:
1. STARTER ($9/month)
   - Up to 10 invoices per month
   - Basic invoice templates
   - Email support
   - Payment tracking
   - Perfect for freelancers and small businesses

2. PROFESSIONAL ($29/month)
   - Unlimited invoices
   - Advanced templates and customization
   - Priority support
   - Automated payment reminders
   - Recurring invoices
   - Multi-currency support
   - Ideal for growing businesses

3. ENTERPRISE (Custom pricing)
   - Everything in Professional
   - Dedicated account manager
   - Custom integrations
   - Advanced reporting and analytics
   - API access
   - White-label options
   - For large organizations

Your Role:
- Answer questions about Whitmore Payments features, plans, and pricing
- Help potential customers choose the right plan
- Explain how invoicing works on the platform
- Address common questions about payments, security, and integrations
- Be friendly, professional, and concise
- If you don't know something, recommend contacting human support at support@whitmorepayments.com

Important Rules:
- Only provide information based on the plans and features listed above
- Do not make up features or pricing
- Do not provide technical support for implementation issues
- For complex questions or account-specific issues, direct users to human support
- Keep responses clear and concise (2-3 paragraphs maximum)
- Use a warm, professional tone"#;

/// Answer a support-widget conversation.
///
/// Session bookkeeping is best effort: a failed write is logged and the
/// reply is still returned.
pub async fn chat(state: &AppState, payload: SupportChatRequest) -> AppResult<SupportChatResponse> {
    let history = prepare_history(payload.messages.unwrap_or_default());
    if history.is_empty() {
        return Err(AppError::BadRequest("Messages array is required".into()));
    }
    let client = ChatClient::from_state(state)?;

    let session_id = match payload.session_id {
        Some(id) => Some(id),
        None => open_session(&state.orm, payload.user_id).await,
    };

    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::new(
        ChatRole::System,
        build_system_prompt(payload.plan_context.as_deref()),
    ));
    messages.extend(history.iter().cloned());

    let reply = client
        .complete(
            &messages,
            CompletionOptions {
                temperature: 0.7,
                max_tokens: Some(500),
                json_response: false,
            },
        )
        .await?
        .unwrap_or_else(|| FALLBACK_REPLY.to_string());

    if let Some(session_id) = session_id {
        if let Err(err) = record_exchange(&state.orm, session_id, &history, &reply).await {
            tracing::warn!(error = %err, session_id = %session_id, "failed to log chat messages");
        }
    }

    Ok(SupportChatResponse {
        message: reply,
        session_id,
    })
}

/// Drop client-supplied system turns, keep the most recent messages and cap
/// each one's length.
pub fn prepare_history(messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
    let messages: Vec<ChatMessage> = messages
        .into_iter()
        .filter(|message| message.role != ChatRole::System)
        .collect();
    let skip = messages.len().saturating_sub(MAX_HISTORY_MESSAGES);

    messages
        .into_iter()
        .skip(skip)
        .map(|mut message| {
            if let Some((cut, _)) = message.content.char_indices().nth(MAX_MESSAGE_LENGTH) {
                message.content.truncate(cut);
            }
            message
        })
        .collect()
}

pub fn build_system_prompt(plan_context: Option<&str>) -> String {
    match plan_context.filter(|plan| !plan.trim().is_empty()) {
        Some(plan) => format!("{SYSTEM_PROMPT}\n\nUser's Current Plan: {plan}"),
        None => SYSTEM_PROMPT.to_string(),
    }
}

async fn open_session(db: &DatabaseConnection, user_id: Option<Uuid>) -> Option<Uuid> {
    let now = Utc::now();
    let result = SessionActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        message_count: Set(0),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await;

    match result {
        Ok(session) => Some(session.id),
        Err(err) => {
            tracing::warn!(error = %err, "failed to create support session");
            None
        }
    }
}

/// Store the latest user turn and the reply, then refresh the session count.
async fn record_exchange(
    db: &DatabaseConnection,
    session_id: Uuid,
    history: &[ChatMessage],
    reply: &str,
) -> AppResult<()> {
    let Some(session) = Sessions::find_by_id(session_id).one(db).await? else {
        tracing::debug!(session_id = %session_id, "unknown support session, skipping log");
        return Ok(());
    };
    let now = Utc::now();
    let txn = db.begin().await?;

    let turns = history
        .last()
        .map(|last| (last.role, last.content.as_str()))
        .into_iter()
        .chain(std::iter::once((ChatRole::Assistant, reply)));
    for (role, content) in turns {
        MessageActive {
            id: Set(Uuid::new_v4()),
            session_id: Set(session_id),
            role: Set(role.as_str().to_string()),
            content: Set(content.to_string()),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;
    }

    let mut active: SessionActive = session.into();
    active.message_count = Set(history.len() as i32 + 1);
    active.updated_at = Set(now.into());
    active.update(&txn).await?;

    txn.commit().await?;
    Ok(())
}
