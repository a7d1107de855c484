use serde::Serialize;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
};

#[derive(Debug, Clone)]
pub struct Mailer {
    http: reqwest::Client,
    config: EmailConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutgoingEmail {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Serialize)]
struct SendBody<'a> {
    from: &'a str,
    #[serde(flatten)]
    email: &'a OutgoingEmail,
}

impl Mailer {
    pub fn new(http: reqwest::Client, config: EmailConfig) -> Self {
        Self { http, config }
    }

    /// Deliver through the provider's HTTP API (Resend-compatible body).
    pub async fn send(&self, email: &OutgoingEmail) -> AppResult<()> {
        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&SendBody {
                from: &self.config.from,
                email,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "email provider returned {status}: {detail}"
            )));
        }
        Ok(())
    }
}
