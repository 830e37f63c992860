use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{UserError, UserResult};
use crate::password::{hash_password, verify_password};
use crate::types::User;

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, \
                            dietary_preference, allergies, token_count, created_at";

/// Starting action-token balance for new accounts.
const INITIAL_TOKEN_COUNT: i64 = 10;

/// Payload for registering a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dietary_preference: String,
    pub allergies: Vec<String>,
}

/// Register a new user. The email must not be taken yet; the password is
/// stored as an Argon2 hash, never in plaintext.
pub async fn create_user(pool: &SqlitePool, new_user: &NewUser) -> UserResult<User> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE email = ?1")
        .bind(&new_user.email)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Err(UserError::EmailAlreadyExists);
    }

    let password_hash = hash_password(&new_user.password)?;
    let allergies = serde_json::to_string(&new_user.allergies)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

    let id = sqlx::query(
        r#"
        INSERT INTO users (
            email, password_hash, first_name, last_name,
            dietary_preference, allergies, token_count, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&new_user.email)
    .bind(&password_hash)
    .bind(&new_user.first_name)
    .bind(&new_user.last_name)
    .bind(&new_user.dietary_preference)
    .bind(allergies)
    .bind(INITIAL_TOKEN_COUNT)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?
    .last_insert_rowid();

    tracing::info!(user_id = id, "user registered");

    let user = user_by_id(pool, id)
        .await?
        .ok_or(UserError::InvalidCredentials)?;

    Ok(user)
}

/// Verify credentials and return the matching user.
///
/// A missing account and a wrong password both map to InvalidCredentials so
/// the response does not reveal which one failed.
pub async fn authenticate(pool: &SqlitePool, email: &str, password: &str) -> UserResult<User> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?1"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?
    .ok_or(UserError::InvalidCredentials)?;

    if !verify_password(password, &user.password_hash)? {
        return Err(UserError::InvalidCredentials);
    }

    Ok(user)
}

/// Fetch a user by id.
pub async fn user_by_id(pool: &SqlitePool, user_id: i64) -> UserResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Spend one action token.
///
/// The guard in the WHERE clause keeps the balance from ever going negative;
/// a zero balance leaves the row untouched and fails the paid action.
pub async fn spend_action_token(pool: &SqlitePool, user_id: i64) -> UserResult<()> {
    let result = sqlx::query(
        "UPDATE users SET token_count = token_count - 1 WHERE id = ?1 AND token_count > 0",
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(UserError::OutOfActionTokens);
    }

    Ok(())
}
