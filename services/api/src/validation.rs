//! Input validation for marketplace payloads

use chrono::Utc;
use common::validation::{Validate, check_length, is_url};
use regex::Regex;
use std::sync::OnceLock;

use crate::models::{
    CreateBookingRequest, CreatePhotographerRequest, CreatePortfolioItemRequest,
    CreateReviewRequest, UpdateBookingStatusRequest, UpdatePhotographerRequest,
    photographer::normalize_specialties,
};

const MAX_SPECIALTIES: usize = 3;
const MAX_TEXT: usize = 1000;

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    let username = username.trim();
    check_length("Username", username, 3, 30)?;

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err("Username can only contain letters, numbers, and underscores".to_string());
    }

    Ok(())
}

pub fn validate_location(location: &str) -> Result<(), String> {
    check_length("Location", location.trim(), 1, 100)
}

pub fn validate_bio(bio: &str) -> Result<(), String> {
    check_length("Bio", bio.trim(), 0, MAX_TEXT)
}

/// 1 to 3 distinct, non-blank tags of at most 50 characters
pub fn validate_specialties(specialties: &[String]) -> Result<(), String> {
    let tags = normalize_specialties(specialties);

    if tags.is_empty() {
        return Err("At least one specialty is required".to_string());
    }

    if tags.len() > MAX_SPECIALTIES {
        return Err(format!(
            "You can choose at most {} specialties",
            MAX_SPECIALTIES
        ));
    }

    for tag in &tags {
        check_length("Specialty", tag, 1, 50)?;
    }

    Ok(())
}

pub fn validate_price(price: f64) -> Result<(), String> {
    if !price.is_finite() || price < 0.0 {
        return Err("Price must be a non-negative number".to_string());
    }
    Ok(())
}

impl Validate for CreatePhotographerRequest {
    fn validate(&self) -> Result<(), String> {
        validate_username(&self.username)?;
        validate_location(&self.location)?;
        validate_specialties(&self.specialties)?;
        if let Some(bio) = &self.bio {
            validate_bio(bio)?;
        }
        if let Some(price) = self.price_from {
            validate_price(price)?;
        }
        Ok(())
    }
}

impl Validate for UpdatePhotographerRequest {
    fn validate(&self) -> Result<(), String> {
        if let Some(location) = &self.location {
            validate_location(location)?;
        }
        if let Some(specialties) = &self.specialties {
            validate_specialties(specialties)?;
        }
        if let Some(bio) = &self.bio {
            validate_bio(bio)?;
        }
        if let Some(price) = self.price_from {
            validate_price(price)?;
        }
        Ok(())
    }
}

impl Validate for CreateBookingRequest {
    fn validate(&self) -> Result<(), String> {
        if self.event_date <= Utc::now() {
            return Err("Event date must be in the future".to_string());
        }
        if let Some(message) = &self.message {
            check_length("Message", message.trim(), 0, MAX_TEXT)?;
        }
        Ok(())
    }
}

/// The status enum is closed; whether the move is allowed depends on the booking
impl Validate for UpdateBookingStatusRequest {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

impl Validate for CreatePortfolioItemRequest {
    fn validate(&self) -> Result<(), String> {
        let url = self.media_url.trim();
        if !is_url(url) || !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err("Media URL must be a valid http(s) URL".to_string());
        }
        if let Some(category) = &self.category {
            check_length("Category", category.trim(), 0, 50)?;
        }
        Ok(())
    }
}

impl Validate for CreateReviewRequest {
    fn validate(&self) -> Result<(), String> {
        if !(1..=5).contains(&self.rating) {
            return Err("Rating must be between 1 and 5".to_string());
        }
        if let Some(comment) = &self.comment {
            check_length("Comment", comment.trim(), 0, MAX_TEXT)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaType;
    use chrono::Duration;
    use uuid::Uuid;

    fn onboarding(username: &str, specialties: &[&str]) -> CreatePhotographerRequest {
        CreatePhotographerRequest {
            username: username.to_string(),
            bio: None,
            location: "Lisbon".to_string(),
            specialties: specialties.iter().map(|s| s.to_string()).collect(),
            price_from: Some(100.0),
        }
    }

    #[test]
    fn username_rules() {
        assert!(validate_username("jane_shoots").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("jane shoots").is_err());
        assert!(validate_username(&"a".repeat(31)).is_err());
    }

    #[test]
    fn specialties_need_one_to_three_tags() {
        assert!(onboarding("jane", &["wedding"]).validate().is_ok());
        assert!(onboarding("jane", &[]).validate().is_err());
        assert!(onboarding("jane", &["  "]).validate().is_err());
        assert!(
            onboarding("jane", &["a", "b", "c", "d"])
                .validate()
                .is_err()
        );
        // Duplicates collapse before counting
        assert!(
            onboarding("jane", &["a", "b", "c", "A"])
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn negative_price_is_rejected() {
        let mut request = onboarding("jane", &["wedding"]);
        request.price_from = Some(-5.0);
        assert!(request.validate().is_err());
    }

    #[test]
    fn booking_date_must_be_in_the_future() {
        let mut request = CreateBookingRequest {
            photographer_id: Uuid::new_v4(),
            event_date: Utc::now() - Duration::days(1),
            message: None,
        };
        assert_eq!(
            request.validate().unwrap_err(),
            "Event date must be in the future"
        );

        request.event_date = Utc::now() + Duration::days(30);
        assert!(request.validate().is_ok());

        request.message = Some("x".repeat(1001));
        assert!(request.validate().is_err());
    }

    #[test]
    fn portfolio_url_must_be_http() {
        let request = |url: &str| CreatePortfolioItemRequest {
            media_url: url.to_string(),
            media_type: MediaType::Image,
            category: None,
        };

        assert!(request("https://cdn.example.com/a.jpg").validate().is_ok());
        assert!(request("ftp://files.example.com/a.jpg").validate().is_err());
        assert!(request("not a url").validate().is_err());
    }

    #[test]
    fn review_rating_bounds() {
        let request = |rating: i16| CreateReviewRequest {
            photographer_id: Uuid::new_v4(),
            rating,
            comment: None,
        };

        assert!(request(1).validate().is_ok());
        assert!(request(5).validate().is_ok());
        assert!(request(0).validate().is_err());
        assert!(request(6).validate().is_err());
    }

    #[test]
    fn status_update_accepts_every_known_status() {
        for status in ["accepted", "rejected", "completed", "cancelled"] {
            let request: UpdateBookingStatusRequest =
                serde_json::from_str(&format!(r#"{{"status":"{}"}}"#, status)).unwrap();
            assert!(request.validate().is_ok());
        }

        assert!(serde_json::from_str::<UpdateBookingStatusRequest>(r#"{"status":"paid"}"#).is_err());
    }
}
