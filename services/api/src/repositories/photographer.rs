//! Photographer repository for database operations

use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{OwnerSummary, Photographer, PhotographerFilter, PhotographerProfile, PhotographerUpdate};

const PHOTOGRAPHER_COLUMNS: &str = "p.id, p.user_id, p.username, p.bio, p.location, p.specialties, \
     p.price_from, p.created_at, p.updated_at";

const PROFILE_SELECT: &str = "SELECT p.id, p.user_id, p.username, p.bio, p.location, \
     p.specialties, p.price_from, p.created_at, p.updated_at, \
     u.full_name, u.avatar, u.email \
     FROM photographers p JOIN users u ON u.id = p.user_id";

/// Unique constraint on `photographers.username`
pub const USERNAME_CONSTRAINT: &str = "photographers_username_key";
/// Unique constraint on `photographers.user_id`
pub const USER_CONSTRAINT: &str = "photographers_user_id_key";

/// Validated onboarding data
#[derive(Debug, Clone)]
pub struct NewPhotographer {
    pub username: String,
    pub bio: Option<String>,
    pub location: String,
    pub specialties: Vec<String>,
    pub price_from: Option<f64>,
}

fn photographer_from_row(row: &PgRow) -> DatabaseResult<Photographer> {
    Ok(Photographer {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        username: row.try_get("username")?,
        bio: row.try_get("bio")?,
        location: row.try_get("location")?,
        specialties: row.try_get("specialties")?,
        price_from: row.try_get("price_from")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn profile_from_row(row: &PgRow) -> DatabaseResult<PhotographerProfile> {
    let photographer = photographer_from_row(row)?;
    Ok(PhotographerProfile {
        user: OwnerSummary {
            id: photographer.user_id,
            full_name: row.try_get("full_name")?,
            avatar: row.try_get("avatar")?,
            email: row.try_get("email")?,
        },
        photographer,
    })
}

/// Escape `%`, `_` and `\` for use inside an ILIKE pattern
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Append the directory filters as a WHERE clause
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &PhotographerFilter) {
    builder.push(" WHERE TRUE");

    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        builder
            .push(" AND (p.username ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.bio ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.location ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.full_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(location) = &filter.location {
        builder
            .push(" AND p.location ILIKE ")
            .push_bind(like_pattern(location));
    }

    if let Some(specialty) = &filter.specialty {
        builder
            .push(" AND ")
            .push_bind(specialty.clone())
            .push(" = ANY(p.specialties)");
    }

    if let Some(min_price) = filter.min_price {
        builder.push(" AND p.price_from >= ").push_bind(min_price);
    }

    if let Some(max_price) = filter.max_price {
        builder.push(" AND p.price_from <= ").push_bind(max_price);
    }
}

/// Photographer repository
#[derive(Clone)]
pub struct PhotographerRepository {
    pool: PgPool,
}

impl PhotographerRepository {
    /// Create a new photographer repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the profile and promote the owner to the photographer role
    pub async fn create(&self, user_id: Uuid, new: &NewPhotographer) -> DatabaseResult<Photographer> {
        info!("Creating photographer profile for user: {}", user_id);

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "INSERT INTO photographers AS p (user_id, username, bio, location, specialties, price_from) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            PHOTOGRAPHER_COLUMNS
        ))
        .bind(user_id)
        .bind(&new.username)
        .bind(new.bio.as_deref())
        .bind(&new.location)
        .bind(&new.specialties)
        .bind(new.price_from)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE users SET role = 'photographer', updated_at = NOW() \
             WHERE id = $1 AND role = 'user'",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        photographer_from_row(&row)
    }

    /// Find the profile owned by a user
    pub async fn find_by_user_id(&self, user_id: Uuid) -> DatabaseResult<Option<Photographer>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM photographers p WHERE p.user_id = $1",
            PHOTOGRAPHER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(photographer_from_row).transpose()
    }

    /// Find a profile by ID
    pub async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Photographer>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM photographers p WHERE p.id = $1",
            PHOTOGRAPHER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(photographer_from_row).transpose()
    }

    /// Find a profile by username (case-insensitive)
    pub async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<Photographer>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM photographers p WHERE p.username = $1",
            PHOTOGRAPHER_COLUMNS
        ))
        .bind(username.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(photographer_from_row).transpose()
    }

    /// Public profile by ID or username
    pub async fn find_public(&self, id_or_username: &str) -> DatabaseResult<Option<PhotographerProfile>> {
        let row = match id_or_username.parse::<Uuid>() {
            Ok(id) => {
                sqlx::query(&format!("{} WHERE p.id = $1", PROFILE_SELECT))
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            Err(_) => {
                sqlx::query(&format!("{} WHERE p.username = $1", PROFILE_SELECT))
                    .bind(id_or_username.trim().to_lowercase())
                    .fetch_optional(&self.pool)
                    .await?
            }
        };

        row.as_ref().map(profile_from_row).transpose()
    }

    /// Apply a partial update to the caller's own profile
    pub async fn update(&self, user_id: Uuid, update: &PhotographerUpdate) -> DatabaseResult<Photographer> {
        info!("Updating photographer profile for user: {}", user_id);

        let row = sqlx::query(&format!(
            "UPDATE photographers AS p SET \
                 bio = CASE WHEN $2 THEN $3 ELSE p.bio END, \
                 location = COALESCE($4, p.location), \
                 specialties = COALESCE($5, p.specialties), \
                 price_from = COALESCE($6, p.price_from), \
                 updated_at = NOW() \
             WHERE p.user_id = $1 RETURNING {}",
            PHOTOGRAPHER_COLUMNS
        ))
        .bind(user_id)
        .bind(update.bio.is_some())
        .bind(update.bio.clone().flatten())
        .bind(update.location.as_deref())
        .bind(update.specialties.as_ref())
        .bind(update.price_from)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DatabaseError::NotFound)?;

        photographer_from_row(&row)
    }

    /// One page of the directory, newest first, with the total match count
    pub async fn browse(
        &self,
        filter: &PhotographerFilter,
        limit: u32,
        offset: i64,
    ) -> DatabaseResult<(Vec<PhotographerProfile>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM photographers p JOIN users u ON u.id = p.user_id",
        );
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(PROFILE_SELECT);
        push_filters(&mut select, filter);
        select
            .push(" ORDER BY p.created_at DESC LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = select.build().fetch_all(&self.pool).await?;
        let photographers = rows
            .iter()
            .map(profile_from_row)
            .collect::<DatabaseResult<_>>()?;

        Ok((photographers, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("wed"), "%wed%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn filters_bind_every_value() {
        let filter = PhotographerFilter {
            search: Some("jane".to_string()),
            location: Some("lisbon".to_string()),
            specialty: Some("wedding".to_string()),
            min_price: Some(10.0),
            max_price: Some(500.0),
        };

        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM photographers p");
        push_filters(&mut builder, &filter);
        let sql = builder.sql();

        assert!(sql.contains("p.username ILIKE $1"));
        assert!(sql.contains("u.full_name ILIKE $4"));
        assert!(sql.contains("p.location ILIKE $5"));
        assert!(sql.contains("$6 = ANY(p.specialties)"));
        assert!(sql.contains("p.price_from >= $7"));
        assert!(sql.contains("p.price_from <= $8"));
    }

    #[test]
    fn empty_filter_matches_everything() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM photographers p");
        push_filters(&mut builder, &PhotographerFilter::default());
        assert_eq!(builder.sql(), "SELECT 1 FROM photographers p WHERE TRUE");
    }
}
