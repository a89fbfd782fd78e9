use chrono::{DateTime, Utc};
use sqlx::FromRow;

pub const USER_COLUMNS: &str = "id, google_id, nome, email, foto_url, criado_em";

/// Database model for an account created through Google login (`usuarios`)
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub google_id: String,
    #[sqlx(rename = "nome")]
    pub name: String,
    pub email: String,
    #[sqlx(rename = "foto_url")]
    pub picture_url: Option<String>,
    #[sqlx(rename = "criado_em")]
    pub created_at: DateTime<Utc>,
}

/// Identity returned by the OAuth provider
#[derive(Debug, Clone)]
pub struct ExternalIdentity {
    pub google_id: String,
    pub name: String,
    pub email: String,
    pub picture_url: Option<String>,
}

/// User with their number of approved reports
#[derive(Debug, Clone, FromRow)]
pub struct UserReportCount {
    pub id: i64,
    #[sqlx(rename = "nome")]
    pub name: String,
    #[sqlx(rename = "foto_url")]
    pub picture_url: Option<String>,
    pub total_relatos: i64,
}
