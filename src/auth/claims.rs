use serde::{Deserialize, Serialize};

/// JWT claims structure for Supabase tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    pub aud: String,

    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    #[serde(default)]
    pub email: Option<String>,

    /// Postgres role; "authenticated" for normal Supabase sessions
    #[serde(default)]
    pub role: Option<String>,

    /// Server-controlled metadata; back-office staff carry `role` here
    #[serde(default)]
    pub app_metadata: Option<AppMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppMetadata {
    #[serde(default)]
    pub role: Option<String>,
}
