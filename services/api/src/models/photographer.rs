//! Photographer profile models

use chrono::{DateTime, Utc};
use common::response::Pagination;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Photographer profile row
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Photographer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub bio: Option<String>,
    pub location: String,
    pub specialties: Vec<String>,
    pub price_from: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public fields of the account behind a profile
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: Uuid,
    pub full_name: String,
    pub avatar: Option<String>,
    pub email: String,
}

/// Profile joined with its owner, as shown in the directory
#[derive(Debug, Clone, Serialize)]
pub struct PhotographerProfile {
    #[serde(flatten)]
    pub photographer: Photographer,
    pub user: OwnerSummary,
}

/// Onboarding payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePhotographerRequest {
    pub username: String,
    #[serde(default)]
    pub bio: Option<String>,
    pub location: String,
    pub specialties: Vec<String>,
    #[serde(default)]
    pub price_from: Option<f64>,
}

/// Partial profile update payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePhotographerRequest {
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub specialties: Option<Vec<String>>,
    #[serde(default)]
    pub price_from: Option<f64>,
}

/// Normalized profile update
///
/// A blank bio clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotographerUpdate {
    pub bio: Option<Option<String>>,
    pub location: Option<String>,
    pub specialties: Option<Vec<String>>,
    pub price_from: Option<f64>,
}

impl PhotographerUpdate {
    pub fn is_empty(&self) -> bool {
        self.bio.is_none()
            && self.location.is_none()
            && self.specialties.is_none()
            && self.price_from.is_none()
    }
}

/// Trim, lowercase and de-duplicate specialty tags, keeping their order
pub fn normalize_specialties(specialties: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::with_capacity(specialties.len());
    for tag in specialties {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

impl CreatePhotographerRequest {
    /// Canonical username used for storage and lookup
    pub fn normalized_username(&self) -> String {
        self.username.trim().to_lowercase()
    }

    pub fn normalized_bio(&self) -> Option<String> {
        self.bio
            .as_deref()
            .map(str::trim)
            .filter(|bio| !bio.is_empty())
            .map(str::to_string)
    }
}

impl UpdatePhotographerRequest {
    pub fn into_update(self) -> PhotographerUpdate {
        PhotographerUpdate {
            bio: self.bio.map(|bio| {
                let bio = bio.trim().to_string();
                if bio.is_empty() { None } else { Some(bio) }
            }),
            location: self.location.map(|l| l.trim().to_string()),
            specialties: self.specialties.as_deref().map(normalize_specialties),
            price_from: self.price_from,
        }
    }
}

/// Directory query string
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseQuery {
    pub search: Option<String>,
    pub location: Option<String>,
    pub specialty: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Directory filters with blank parameters dropped
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotographerFilter {
    pub search: Option<String>,
    pub location: Option<String>,
    pub specialty: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl BrowseQuery {
    /// Validate the price range and normalize the text filters
    pub fn filter(&self) -> Result<PhotographerFilter, String> {
        fn text(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        for price in [self.min_price, self.max_price].into_iter().flatten() {
            if !price.is_finite() || price < 0.0 {
                return Err("Price filters must be non-negative numbers".to_string());
            }
        }

        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err("minPrice cannot be greater than maxPrice".to_string());
            }
        }

        Ok(PhotographerFilter {
            search: text(&self.search),
            location: text(&self.location),
            specialty: text(&self.specialty).map(|s| s.to_lowercase()),
            min_price: self.min_price,
            max_price: self.max_price,
        })
    }
}

/// Directory page
#[derive(Debug, Serialize)]
pub struct BrowseResponse {
    pub photographers: Vec<PhotographerProfile>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specialties_are_normalized() {
        let tags = normalize_specialties(&[
            " Wedding ".to_string(),
            "wedding".to_string(),
            "".to_string(),
            "Portrait".to_string(),
        ]);
        assert_eq!(tags, vec!["wedding", "portrait"]);
    }

    #[test]
    fn browse_filter_drops_blank_parameters() {
        let query = BrowseQuery {
            search: Some("   ".to_string()),
            specialty: Some(" Wedding".to_string()),
            min_price: Some(50.0),
            ..Default::default()
        };

        let filter = query.filter().unwrap();
        assert_eq!(filter.search, None);
        assert_eq!(filter.specialty.as_deref(), Some("wedding"));
        assert_eq!(filter.min_price, Some(50.0));
    }

    #[test]
    fn browse_filter_rejects_inverted_price_range() {
        let query = BrowseQuery {
            min_price: Some(200.0),
            max_price: Some(100.0),
            ..Default::default()
        };
        assert!(query.filter().is_err());

        let query = BrowseQuery {
            min_price: Some(-1.0),
            ..Default::default()
        };
        assert!(query.filter().is_err());
    }

    #[test]
    fn update_request_normalizes_fields() {
        let update = UpdatePhotographerRequest {
            bio: Some("  ".to_string()),
            location: Some(" Lisbon ".to_string()),
            specialties: Some(vec!["Events".to_string()]),
            price_from: None,
        }
        .into_update();

        assert_eq!(update.bio, Some(None));
        assert_eq!(update.location.as_deref(), Some("Lisbon"));
        assert_eq!(update.specialties, Some(vec!["events".to_string()]));
        assert!(UpdatePhotographerRequest::default().into_update().is_empty());
    }

    #[test]
    fn profile_flattens_photographer_fields() {
        let now = Utc::now();
        let profile = PhotographerProfile {
            photographer: Photographer {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                username: "jane_shoots".to_string(),
                bio: None,
                location: "Lisbon".to_string(),
                specialties: vec!["wedding".to_string()],
                price_from: Some(150.0),
                created_at: now,
                updated_at: now,
            },
            user: OwnerSummary {
                id: Uuid::new_v4(),
                full_name: "Jane Doe".to_string(),
                avatar: None,
                email: "jane@example.com".to_string(),
            },
        };

        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["username"], "jane_shoots");
        assert_eq!(value["priceFrom"], 150.0);
        assert_eq!(value["user"]["fullName"], "Jane Doe");
    }
}
