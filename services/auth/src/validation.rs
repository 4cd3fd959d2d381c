//! Input validation for account payloads

use common::{
    auth::UserRole,
    validation::{Validate, check_length, is_url},
};
use regex::Regex;
use std::sync::OnceLock;

use crate::models::{LoginRequest, RegisterRequest, UpdateProfileRequest};

/// Canonical form used for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate full name
pub fn validate_full_name(full_name: &str) -> Result<(), String> {
    let full_name = full_name.trim();
    check_length("Full name", full_name, 2, 50)?;

    static NAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = NAME_REGEX
        .get_or_init(|| Regex::new(r"^[\p{L} ]+$").expect("Failed to compile name regex"));

    if !regex.is_match(full_name) {
        return Err("Full name can only contain letters and spaces".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    let email = normalize_email(email);

    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email cannot exceed 254 characters".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(&email) {
        return Err("Please provide a valid email".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    check_length("Password", password, 8, 70)
}

/// Validate phone number
pub fn validate_phone_number(phone_number: &str) -> Result<(), String> {
    let phone_number = phone_number.trim();
    check_length("Phone number", phone_number, 7, 20)?;

    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PHONE_REGEX
        .get_or_init(|| Regex::new(r"^[0-9 +()\-]+$").expect("Failed to compile phone regex"));

    if !regex.is_match(phone_number) {
        return Err("Please provide a valid phone number".to_string());
    }

    Ok(())
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), String> {
        validate_full_name(&self.full_name)?;
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

impl RegisterRequest {
    /// Role to create the account with; admins cannot be self-registered
    pub fn requested_role(&self) -> Option<UserRole> {
        match self.role {
            Some(UserRole::Admin) => None,
            Some(role) => Some(role),
            None => Some(UserRole::User),
        }
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), String> {
        validate_email(&self.email)?;
        if self.password.is_empty() {
            return Err("Password is required".to_string());
        }
        Ok(())
    }
}

impl Validate for UpdateProfileRequest {
    fn validate(&self) -> Result<(), String> {
        if let Some(full_name) = &self.full_name {
            validate_full_name(full_name)?;
        }

        if let Some(phone_number) = self.phone_number.as_deref().map(str::trim) {
            if !phone_number.is_empty() {
                validate_phone_number(phone_number)?;
            }
        }

        if let Some(avatar) = self.avatar.as_deref().map(str::trim) {
            if !avatar.is_empty() && !is_url(avatar) {
                return Err("Avatar must be a valid URL".to_string());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(full_name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            full_name: full_name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: None,
        }
    }

    #[test]
    fn email_is_normalized() {
        assert_eq!(normalize_email("  Jane@Example.COM "), "jane@example.com");
        assert!(validate_email(" Jane@Example.com ").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert_eq!(validate_email("   ").unwrap_err(), "Email is required");
    }

    #[test]
    fn full_name_rules() {
        assert!(validate_full_name("Jane Doe").is_ok());
        assert!(validate_full_name("Zoë Ångström").is_ok());
        assert_eq!(
            validate_full_name("J").unwrap_err(),
            "Full name must be at least 2 characters long"
        );
        assert!(validate_full_name("Jane D0e").is_err());
        assert!(validate_full_name(&"a".repeat(51)).is_err());
    }

    #[test]
    fn password_has_length_bounds_only() {
        assert!(validate_password("alllowercase").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"x".repeat(71)).is_err());
    }

    #[test]
    fn phone_number_rules() {
        assert!(validate_phone_number("+1 (555) 123-4567").is_ok());
        assert!(validate_phone_number("12345").is_err());
        assert!(validate_phone_number("555-CALL-NOW").is_err());
    }

    #[test]
    fn register_request_validation() {
        assert!(register("Jane Doe", "jane@example.com", "password123").validate().is_ok());
        assert!(register("Jane Doe", "jane@example.com", "pw").validate().is_err());
        assert!(register("", "jane@example.com", "password123").validate().is_err());
    }

    #[test]
    fn admin_role_cannot_be_requested() {
        let mut request = register("Jane Doe", "jane@example.com", "password123");
        assert_eq!(request.requested_role(), Some(UserRole::User));

        request.role = Some(UserRole::Photographer);
        assert_eq!(request.requested_role(), Some(UserRole::Photographer));

        request.role = Some(UserRole::Admin);
        assert_eq!(request.requested_role(), None);
    }

    #[test]
    fn profile_update_allows_clears() {
        let update = UpdateProfileRequest {
            full_name: None,
            phone_number: Some(String::new()),
            avatar: Some("  ".to_string()),
        };
        assert!(update.validate().is_ok());

        let update = UpdateProfileRequest {
            avatar: Some("not a url".to_string()),
            ..Default::default()
        };
        assert_eq!(update.validate().unwrap_err(), "Avatar must be a valid URL");
    }
}
