//! User repository for database operations

use common::{
    auth::UserRole,
    error::{DatabaseError, DatabaseResult},
};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{NewUser, UpdateUser, User};

const USER_COLUMNS: &str = "id, email, full_name, phone_number, avatar, password_hash, role, \
     is_email_verified, is_phone_verified, created_at, updated_at";

/// Unique constraint on `users.email`
pub const EMAIL_CONSTRAINT: &str = "users_email_key";
/// Unique constraint on `users.phone_number`
pub const PHONE_CONSTRAINT: &str = "users_phone_number_key";

fn user_from_row(row: &PgRow) -> DatabaseResult<User> {
    let role: String = row.try_get("role")?;
    let role = role.parse::<UserRole>().map_err(DatabaseError::decode)?;

    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        full_name: row.try_get("full_name")?,
        phone_number: row.try_get("phone_number")?,
        avatar: row.try_get("avatar")?,
        password_hash: row.try_get("password_hash")?,
        role,
        is_email_verified: row.try_get("is_email_verified")?,
        is_phone_verified: row.try_get("is_phone_verified")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user
    pub async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        info!("Creating new user: {}", new_user.email);

        let row = sqlx::query(&format!(
            "INSERT INTO users (email, full_name, password_hash, role) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&new_user.email)
        .bind(&new_user.full_name)
        .bind(&new_user.password_hash)
        .bind(new_user.role.as_str())
        .fetch_one(&self.pool)
        .await?;

        user_from_row(&row)
    }

    /// Find a user by (normalized) email
    pub async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    /// Apply a partial profile update, returning the updated user
    pub async fn update(&self, id: Uuid, update: &UpdateUser) -> DatabaseResult<User> {
        info!("Updating profile for user: {}", id);

        // `$3`/`$5` flag whether the nullable columns change at all, so a
        // clear (NULL) is distinguishable from "leave as is".
        let row = sqlx::query(&format!(
            "UPDATE users SET \
                 full_name = COALESCE($2, full_name), \
                 phone_number = CASE WHEN $3 THEN $4 ELSE phone_number END, \
                 avatar = CASE WHEN $5 THEN $6 ELSE avatar END, \
                 updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(update.full_name.as_deref())
        .bind(update.phone_number.is_some())
        .bind(update.phone_number.clone().flatten())
        .bind(update.avatar.is_some())
        .bind(update.avatar.clone().flatten())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DatabaseError::NotFound)?;

        user_from_row(&row)
    }

    /// List users, newest first
    pub async fn list(&self, limit: u32, offset: i64) -> DatabaseResult<(Vec<User>, i64)> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            USER_COLUMNS
        ))
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let users = rows.iter().map(user_from_row).collect::<DatabaseResult<_>>()?;
        Ok((users, total))
    }
}
