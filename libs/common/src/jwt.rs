//! JWT service for token generation and validation
//!
//! Tokens are signed either with a shared HS256 secret or with an RS256 key
//! pair. Services that only verify tokens may be configured with the public
//! key alone.

use anyhow::Result;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::auth::UserRole;

/// Key material used to sign and verify tokens
#[derive(Debug, Clone)]
pub enum JwtKeys {
    /// Shared secret (HS256)
    Hmac { secret: String },
    /// PEM encoded key pair (RS256); the private key is optional for
    /// verify-only services
    Rsa {
        private_key: Option<String>,
        public_key: String,
    },
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub keys: JwtKeys,
    /// Access token expiration time in seconds (default: 15 minutes)
    pub access_token_expiry: u64,
    /// Refresh token expiration time in seconds (default: 7 days)
    pub refresh_token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: Shared HS256 secret. When set, the RSA variables are ignored
    /// - `JWT_PRIVATE_KEY`: Private key (PEM or path to a PEM file), optional
    /// - `JWT_PUBLIC_KEY`: Public key (PEM or path to a PEM file)
    /// - `JWT_ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 900)
    /// - `JWT_REFRESH_TOKEN_EXPIRY`: Refresh token expiry in seconds (default: 604800)
    pub fn from_env() -> Result<Self> {
        let keys = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => JwtKeys::Hmac { secret },
            _ => {
                let public_key = std::env::var("JWT_PUBLIC_KEY").map_err(|_| {
                    anyhow::anyhow!("Neither JWT_SECRET nor JWT_PUBLIC_KEY is set")
                })?;
                let private_key = std::env::var("JWT_PRIVATE_KEY")
                    .ok()
                    .map(|value| read_pem(&value))
                    .transpose()?;

                JwtKeys::Rsa {
                    private_key,
                    public_key: read_pem(&public_key)?,
                }
            }
        };

        let access_token_expiry = std::env::var("JWT_ACCESS_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "900".to_string()) // 15 minutes
            .parse()
            .unwrap_or(900);

        let refresh_token_expiry = std::env::var("JWT_REFRESH_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "604800".to_string()) // 7 days
            .parse()
            .unwrap_or(604800);

        Ok(JwtConfig {
            keys,
            access_token_expiry,
            refresh_token_expiry,
        })
    }
}

/// Accept either inline PEM or a path to a PEM file
fn read_pem(value: &str) -> Result<String> {
    if value.starts_with("-----BEGIN") {
        return Ok(value.to_string());
    }

    std::fs::read_to_string(value)
        .map(|pem| pem.trim().to_string())
        .map_err(|e| anyhow::anyhow!("Failed to read key file {}: {}", value, e))
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Role at the time the token was minted
    pub role: UserRole,
    /// Unique token id, used for revocation and session bookkeeping
    pub jti: Uuid,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

impl Claims {
    /// Seconds left until expiry, saturating at zero
    pub fn remaining_lifetime(&self) -> u64 {
        now_secs().map_or(0, |now| self.exp.saturating_sub(now))
    }
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// A freshly minted access/refresh pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_claims: Claims,
    pub refresh_claims: Claims,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: Option<EncodingKey>,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    validation: Validation,
    config: JwtConfig,
}

pub(crate) fn now_secs() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
        .as_secs())
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Result<Self> {
        let (algorithm, encoding_key, decoding_key) = match &config.keys {
            JwtKeys::Hmac { secret } => (
                Algorithm::HS256,
                Some(EncodingKey::from_secret(secret.as_bytes())),
                DecodingKey::from_secret(secret.as_bytes()),
            ),
            JwtKeys::Rsa {
                private_key,
                public_key,
            } => (
                Algorithm::RS256,
                private_key
                    .as_ref()
                    .map(|pem| EncodingKey::from_rsa_pem(pem.as_bytes()))
                    .transpose()?,
                DecodingKey::from_rsa_pem(public_key.as_bytes())?,
            ),
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        // Revocation entries expire with the token, so expiry must be exact.
        validation.leeway = 0;

        Ok(JwtService {
            encoding_key,
            decoding_key,
            algorithm,
            validation,
            config,
        })
    }

    fn mint(&self, user_id: Uuid, role: UserRole, token_type: TokenType) -> Result<(String, Claims)> {
        let now = now_secs()?;
        let lifetime = match token_type {
            TokenType::Access => self.config.access_token_expiry,
            TokenType::Refresh => self.config.refresh_token_expiry,
        };

        let claims = Claims {
            sub: user_id,
            role,
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + lifetime,
            token_type,
        };

        let token = self.encode_claims(&claims)?;
        Ok((token, claims))
    }

    pub(crate) fn encode_claims(&self, claims: &Claims) -> Result<String> {
        let key = self
            .encoding_key
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("JWT service is configured for verification only"))?;

        Ok(encode(&Header::new(self.algorithm), claims, key)?)
    }

    /// Generate an access token for a user
    pub fn generate_access_token(&self, user_id: Uuid, role: UserRole) -> Result<String> {
        self.mint(user_id, role, TokenType::Access)
            .map(|(token, _)| token)
    }

    /// Generate a refresh token for a user
    pub fn generate_refresh_token(&self, user_id: Uuid, role: UserRole) -> Result<String> {
        self.mint(user_id, role, TokenType::Refresh)
            .map(|(token, _)| token)
    }

    /// Mint an access token and a refresh token together
    pub fn issue_pair(&self, user_id: Uuid, role: UserRole) -> Result<TokenPair> {
        let (access_token, access_claims) = self.mint(user_id, role, TokenType::Access)?;
        let (refresh_token, refresh_claims) = self.mint(user_id, role, TokenType::Refresh)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_claims,
            refresh_claims,
        })
    }

    /// Validate a token and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Validate a token and require it to be an access token
    pub fn validate_access_token(&self, token: &str) -> Result<Claims> {
        self.validate_typed(token, TokenType::Access)
    }

    /// Validate a token and require it to be a refresh token
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims> {
        self.validate_typed(token, TokenType::Refresh)
    }

    fn validate_typed(&self, token: &str, expected: TokenType) -> Result<Claims> {
        let claims = self.validate_token(token)?;
        if claims.token_type != expected {
            anyhow::bail!("Expected a {:?} token, got {:?}", expected, claims.token_type);
        }
        Ok(claims)
    }

    /// Get the access token expiry time
    pub fn access_token_expiry(&self) -> u64 {
        self.config.access_token_expiry
    }

    /// Get the refresh token expiry time
    pub fn refresh_token_expiry(&self) -> u64 {
        self.config.refresh_token_expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn hmac_service(secret: &str) -> JwtService {
        JwtService::new(JwtConfig {
            keys: JwtKeys::Hmac {
                secret: secret.to_string(),
            },
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
        })
        .expect("HMAC service should build")
    }

    #[test]
    fn access_token_round_trips_claims() {
        let service = hmac_service("test-secret");
        let user_id = Uuid::new_v4();

        let token = service
            .generate_access_token(user_id, UserRole::Photographer)
            .unwrap();
        let claims = service.validate_access_token(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, UserRole::Photographer);
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn token_type_is_enforced() {
        let service = hmac_service("test-secret");
        let pair = service.issue_pair(Uuid::new_v4(), UserRole::User).unwrap();

        assert!(service.validate_access_token(&pair.refresh_token).is_err());
        assert!(service.validate_refresh_token(&pair.access_token).is_err());
        assert!(service.validate_refresh_token(&pair.refresh_token).is_ok());
    }

    #[test]
    fn every_token_has_a_distinct_jti() {
        let service = hmac_service("test-secret");
        let user_id = Uuid::new_v4();
        let first = service.issue_pair(user_id, UserRole::User).unwrap();
        let second = service.issue_pair(user_id, UserRole::User).unwrap();

        assert_ne!(first.refresh_claims.jti, second.refresh_claims.jti);
        assert_ne!(first.access_claims.jti, first.refresh_claims.jti);
        assert_ne!(first.refresh_token, second.refresh_token);
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let issuer = hmac_service("issuer-secret");
        let verifier = hmac_service("another-secret");
        let token = issuer
            .generate_access_token(Uuid::new_v4(), UserRole::User)
            .unwrap();

        assert!(verifier.validate_token(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = hmac_service("test-secret");
        let now = now_secs().unwrap();
        let claims = Claims {
            sub: Uuid::new_v4(),
            role: UserRole::User,
            jti: Uuid::new_v4(),
            iat: now - 1000,
            exp: now - 30,
            token_type: TokenType::Access,
        };
        let token = service.encode_claims(&claims).unwrap();

        assert!(service.validate_access_token(&token).is_err());
        assert_eq!(claims.remaining_lifetime(), 0);
    }

    #[test]
    fn garbage_is_rejected() {
        let service = hmac_service("test-secret");
        assert!(service.validate_token("not.a.jwt").is_err());
        assert!(service.validate_token("").is_err());
    }

    fn test_key(name: &str) -> String {
        read_pem(&format!("{}/tests/keys/{}", env!("CARGO_MANIFEST_DIR"), name)).unwrap()
    }

    #[test]
    fn rsa_verifier_accepts_tokens_from_signer() {
        let signer = JwtService::new(JwtConfig {
            keys: JwtKeys::Rsa {
                private_key: Some(test_key("test_private.pem")),
                public_key: test_key("test_public.pem"),
            },
            access_token_expiry: 60,
            refresh_token_expiry: 120,
        })
        .unwrap();
        let verifier = JwtService::new(JwtConfig {
            keys: JwtKeys::Rsa {
                private_key: None,
                public_key: test_key("test_public.pem"),
            },
            access_token_expiry: 60,
            refresh_token_expiry: 120,
        })
        .unwrap();

        let user_id = Uuid::new_v4();
        let token = signer.generate_access_token(user_id, UserRole::Admin).unwrap();
        let claims = verifier.validate_access_token(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, UserRole::Admin);

        // Verify-only services cannot mint.
        assert!(verifier.generate_access_token(user_id, UserRole::Admin).is_err());
    }

    #[test]
    #[serial]
    fn config_prefers_shared_secret() {
        unsafe {
            std::env::set_var("JWT_SECRET", "from-env");
            std::env::remove_var("JWT_ACCESS_TOKEN_EXPIRY");
            std::env::set_var("JWT_REFRESH_TOKEN_EXPIRY", "3600");
        }

        let config = JwtConfig::from_env().unwrap();
        assert!(matches!(config.keys, JwtKeys::Hmac { ref secret } if secret == "from-env"));
        assert_eq!(config.access_token_expiry, 900);
        assert_eq!(config.refresh_token_expiry, 3600);

        unsafe {
            std::env::remove_var("JWT_SECRET");
            std::env::remove_var("JWT_REFRESH_TOKEN_EXPIRY");
        }
    }

    #[test]
    #[serial]
    fn config_requires_some_key_material() {
        unsafe {
            std::env::remove_var("JWT_SECRET");
            std::env::remove_var("JWT_PUBLIC_KEY");
            std::env::remove_var("JWT_PRIVATE_KEY");
        }

        assert!(JwtConfig::from_env().is_err());
    }
}
