//! HTTP-only session cookies

use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use common::{
    auth::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE},
    jwt::TokenPair,
};
use time::Duration;

/// The refresh cookie is only sent to the account endpoints
pub const REFRESH_COOKIE_PATH: &str = "/api/v1/users";

/// Cookie attributes
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub secure: bool,
}

impl CookieConfig {
    /// Create a new CookieConfig from environment variables
    ///
    /// # Environment Variables
    /// - `COOKIE_SECURE`: set to `false` to allow cookies over plain HTTP (default: true)
    pub fn from_env() -> Self {
        let secure = std::env::var("COOKIE_SECURE")
            .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(true);

        Self { secure }
    }

    fn cookie(&self, name: &'static str, value: String, path: &'static str, max_age: i64) -> Cookie<'static> {
        Cookie::build((name, value))
            .path(path)
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(Duration::seconds(max_age))
            .build()
    }

    /// Attach both tokens of a freshly issued pair
    pub fn with_tokens(&self, jar: CookieJar, pair: &TokenPair) -> CookieJar {
        let access_age = pair.access_claims.remaining_lifetime() as i64;
        let refresh_age = pair.refresh_claims.remaining_lifetime() as i64;

        jar.add(self.cookie(
            ACCESS_TOKEN_COOKIE,
            pair.access_token.clone(),
            "/",
            access_age,
        ))
        .add(self.cookie(
            REFRESH_TOKEN_COOKIE,
            pair.refresh_token.clone(),
            REFRESH_COOKIE_PATH,
            refresh_age,
        ))
    }

    /// Expire both cookies
    pub fn cleared(&self, jar: CookieJar) -> CookieJar {
        jar.add(self.cookie(ACCESS_TOKEN_COOKIE, String::new(), "/", 0))
            .add(self.cookie(REFRESH_TOKEN_COOKIE, String::new(), REFRESH_COOKIE_PATH, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{
        auth::UserRole,
        jwt::{JwtConfig, JwtKeys, JwtService},
    };
    use uuid::Uuid;

    fn pair() -> TokenPair {
        JwtService::new(JwtConfig {
            keys: JwtKeys::Hmac {
                secret: "cookie-test".to_string(),
            },
            access_token_expiry: 900,
            refresh_token_expiry: 3600,
        })
        .unwrap()
        .issue_pair(Uuid::new_v4(), UserRole::User)
        .unwrap()
    }

    #[test]
    fn token_cookies_are_http_only() {
        let pair = pair();
        let jar = CookieConfig { secure: true }.with_tokens(CookieJar::new(), &pair);

        let access = jar.get(ACCESS_TOKEN_COOKIE).unwrap();
        assert_eq!(access.value(), pair.access_token);
        assert_eq!(access.http_only(), Some(true));
        assert_eq!(access.secure(), Some(true));
        assert_eq!(access.path(), Some("/"));

        let refresh = jar.get(REFRESH_TOKEN_COOKIE).unwrap();
        assert_eq!(refresh.value(), pair.refresh_token);
        assert_eq!(refresh.path(), Some(REFRESH_COOKIE_PATH));
        assert!(refresh.max_age().unwrap() > Duration::seconds(3500));
    }

    #[test]
    fn cleared_cookies_expire_immediately() {
        let jar = CookieConfig { secure: false }.cleared(CookieJar::new());

        let access = jar.get(ACCESS_TOKEN_COOKIE).unwrap();
        assert_eq!(access.value(), "");
        assert_eq!(access.max_age(), Some(Duration::ZERO));
        assert_eq!(access.secure(), Some(false));
    }
}
