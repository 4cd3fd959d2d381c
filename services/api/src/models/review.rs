//! Review models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub photographer_id: Uuid,
    pub user_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAuthor {
    pub id: Uuid,
    pub full_name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewWithAuthor {
    #[serde(flatten)]
    pub review: Review,
    pub user: ReviewAuthor,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    pub photographer_id: Uuid,
    pub rating: i16,
    #[serde(default)]
    pub comment: Option<String>,
}

impl CreateReviewRequest {
    pub fn normalized_comment(&self) -> Option<String> {
        self.comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
    }
}

/// Public review listing for one photographer
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewListResponse {
    pub reviews: Vec<ReviewWithAuthor>,
    pub average_rating: f64,
    pub total_reviews: i64,
}

impl ReviewListResponse {
    pub fn new(reviews: Vec<ReviewWithAuthor>, average: Option<f64>, total_reviews: i64) -> Self {
        Self {
            reviews,
            average_rating: round_rating(average),
            total_reviews,
        }
    }
}

/// Average rounded to one decimal; no reviews reads as 0
pub fn round_rating(average: Option<f64>) -> f64 {
    average.map(|avg| (avg * 10.0).round() / 10.0).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratings_round_to_one_decimal() {
        assert_eq!(round_rating(None), 0.0);
        assert_eq!(round_rating(Some(4.0)), 4.0);
        assert_eq!(round_rating(Some(4.333_333)), 4.3);
        assert_eq!(round_rating(Some(4.666_666)), 4.7);
    }

    #[test]
    fn listing_serializes_camel_case() {
        let value = serde_json::to_value(ReviewListResponse::new(vec![], Some(3.25), 4)).unwrap();
        assert_eq!(value["averageRating"], 3.3);
        assert_eq!(value["totalReviews"], 4);
        assert!(value["reviews"].as_array().unwrap().is_empty());
    }
}
