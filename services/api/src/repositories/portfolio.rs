//! Portfolio repository for database operations

use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{MediaType, PortfolioItem};

const ITEM_COLUMNS: &str = "id, photographer_id, media_url, media_type, category, created_at";

/// Validated portfolio entry
#[derive(Debug, Clone)]
pub struct NewPortfolioItem {
    pub media_url: String,
    pub media_type: MediaType,
    pub category: Option<String>,
}

fn item_from_row(row: &PgRow) -> DatabaseResult<PortfolioItem> {
    let media_type: String = row.try_get("media_type")?;

    Ok(PortfolioItem {
        id: row.try_get("id")?,
        photographer_id: row.try_get("photographer_id")?,
        media_url: row.try_get("media_url")?,
        media_type: media_type.parse().map_err(DatabaseError::decode)?,
        category: row.try_get("category")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Portfolio repository
#[derive(Clone)]
pub struct PortfolioRepository {
    pool: PgPool,
}

impl PortfolioRepository {
    /// Create a new portfolio repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attach a media reference to a profile
    pub async fn create(
        &self,
        photographer_id: Uuid,
        new: &NewPortfolioItem,
    ) -> DatabaseResult<PortfolioItem> {
        info!("Adding portfolio item for photographer: {}", photographer_id);

        let row = sqlx::query(&format!(
            "INSERT INTO portfolio_items (photographer_id, media_url, media_type, category) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            ITEM_COLUMNS
        ))
        .bind(photographer_id)
        .bind(&new.media_url)
        .bind(new.media_type.as_str())
        .bind(new.category.as_deref())
        .fetch_one(&self.pool)
        .await?;

        item_from_row(&row)
    }

    /// A profile's items, newest first
    pub async fn list_for_photographer(&self, photographer_id: Uuid) -> DatabaseResult<Vec<PortfolioItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM portfolio_items WHERE photographer_id = $1 ORDER BY created_at DESC",
            ITEM_COLUMNS
        ))
        .bind(photographer_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(item_from_row).collect()
    }

    /// Delete an item owned by the profile; false when there is no such item
    pub async fn delete(&self, id: Uuid, photographer_id: Uuid) -> DatabaseResult<bool> {
        let result =
            sqlx::query("DELETE FROM portfolio_items WHERE id = $1 AND photographer_id = $2")
                .bind(id)
                .bind(photographer_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
