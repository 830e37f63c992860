use serde::Serialize;
use sqlx::types::Json;

/// User data from the users table.
///
/// The password hash is never serialized into API responses.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dietary_preference: String,
    pub allergies: Json<Vec<String>>,
    pub token_count: i64,
    pub created_at: String,
}
