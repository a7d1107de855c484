use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Claims of the bearer tokens minted by the hosted auth provider.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    pub exp: usize,
}
