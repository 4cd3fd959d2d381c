//! Review repository for database operations

use common::error::DatabaseResult;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{Review, ReviewAuthor, ReviewWithAuthor};

const REVIEW_COLUMNS: &str = "r.id, r.photographer_id, r.user_id, r.rating, r.comment, r.created_at";

/// One review per (photographer, user)
pub const REVIEW_PAIR_CONSTRAINT: &str = "reviews_photographer_user_key";

/// Validated review
#[derive(Debug, Clone)]
pub struct NewReview {
    pub photographer_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
}

fn review_from_row(row: &PgRow) -> DatabaseResult<Review> {
    Ok(Review {
        id: row.try_get("id")?,
        photographer_id: row.try_get("photographer_id")?,
        user_id: row.try_get("user_id")?,
        rating: row.try_get("rating")?,
        comment: row.try_get("comment")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Review repository
#[derive(Clone)]
pub struct ReviewRepository {
    pool: PgPool,
}

impl ReviewRepository {
    /// Create a new review repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: Uuid, new: &NewReview) -> DatabaseResult<Review> {
        info!(
            "Creating review by {} for photographer {}",
            user_id, new.photographer_id
        );

        let row = sqlx::query(&format!(
            "INSERT INTO reviews AS r (photographer_id, user_id, rating, comment) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            REVIEW_COLUMNS
        ))
        .bind(new.photographer_id)
        .bind(user_id)
        .bind(new.rating)
        .bind(new.comment.as_deref())
        .fetch_one(&self.pool)
        .await?;

        review_from_row(&row)
    }

    pub async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Review>> {
        let row = sqlx::query(&format!("SELECT {} FROM reviews r WHERE r.id = $1", REVIEW_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(review_from_row).transpose()
    }

    /// Reviews of a profile with their authors, newest first
    pub async fn list_for_photographer(
        &self,
        photographer_id: Uuid,
    ) -> DatabaseResult<Vec<ReviewWithAuthor>> {
        let rows = sqlx::query(&format!(
            "SELECT {}, u.full_name, u.avatar \
             FROM reviews r JOIN users u ON u.id = r.user_id \
             WHERE r.photographer_id = $1 \
             ORDER BY r.created_at DESC",
            REVIEW_COLUMNS
        ))
        .bind(photographer_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> DatabaseResult<ReviewWithAuthor> {
                let review = review_from_row(row)?;
                Ok(ReviewWithAuthor {
                    user: ReviewAuthor {
                        id: review.user_id,
                        full_name: row.try_get("full_name")?,
                        avatar: row.try_get("avatar")?,
                    },
                    review,
                })
            })
            .collect()
    }

    /// Average rating (None without reviews) and review count
    pub async fn summary(&self, photographer_id: Uuid) -> DatabaseResult<(Option<f64>, i64)> {
        let row = sqlx::query(
            "SELECT AVG(rating)::DOUBLE PRECISION AS average, COUNT(*) AS total \
             FROM reviews WHERE photographer_id = $1",
        )
        .bind(photographer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((row.try_get("average")?, row.try_get("total")?))
    }

    /// Delete a review; false when it did not exist
    pub async fn delete(&self, id: Uuid) -> DatabaseResult<bool> {
        info!("Deleting review: {}", id);

        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
