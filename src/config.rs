use std::env;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_EMAIL_API_URL: &str = "https://api.resend.com/emails";
pub const DEFAULT_EMAIL_FROM: &str = "Whitmore Payments <invoices@whitmorepayments.com>";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub site_url: String,
    pub auth: AuthConfig,
    pub openai: Option<OpenAiConfig>,
    pub stripe: StripeConfig,
    pub email: Option<EmailConfig>,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

/// Both keys are optional; each one missing degrades its endpoint to a stub.
#[derive(Debug, Clone, Default)]
pub struct StripeConfig {
    pub secret_key: Option<String>,
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_key: String,
    pub api_url: String,
    pub from: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let site_url = env::var("SITE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| "http://localhost:5173".to_string());

        let auth = AuthConfig {
            jwt_secret: env::var("AUTH_JWT_SECRET")?,
            jwt_audience: optional("AUTH_JWT_AUDIENCE"),
        };

        let openai = optional("OPENAI_API_KEY").map(|api_key| OpenAiConfig {
            api_key,
            base_url: optional("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            model: optional("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
        });

        let stripe = StripeConfig {
            secret_key: optional("STRIPE_SECRET_KEY"),
            webhook_secret: optional("STRIPE_WEBHOOK_SECRET"),
        };

        let email = optional("EMAIL_API_KEY").map(|api_key| EmailConfig {
            api_key,
            api_url: optional("EMAIL_API_URL").unwrap_or_else(|| DEFAULT_EMAIL_API_URL.to_string()),
            from: optional("EMAIL_FROM").unwrap_or_else(|| DEFAULT_EMAIL_FROM.to_string()),
        });

        Ok(Self {
            database_url,
            host,
            port,
            site_url,
            auth,
            openai,
            stripe,
            email,
        })
    }

    /// Configuration with every optional integration switched off.
    pub fn minimal(database_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            site_url: "http://localhost:5173".to_string(),
            auth: AuthConfig {
                jwt_secret: jwt_secret.into(),
                jwt_audience: None,
            },
            openai: None,
            stripe: StripeConfig::default(),
            email: None,
        }
    }
}

// Empty values count as unset so a blank line in `.env` does not enable a stub-less path.
fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
