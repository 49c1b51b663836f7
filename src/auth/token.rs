//! Stateless HS256 session tokens.
//!
//! A token carries the account id (`sub`), its email, and issue/expiry times.
//! Both `issue_at` and `verify_at` take the clock explicitly.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::TokenError;

/// Claims carried by a session token. Timestamps are seconds since the epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 session tokens.
///
/// Tokens are never stored; a token is valid exactly when its signature
/// checks out under the configured secret and its `exp` has not passed.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked in `verify_at` against the caller's clock, with no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, sub: &str, email: &str) -> Result<String, TokenError> {
        self.issue_at(sub, email, Utc::now())
    }

    pub fn issue_at(&self, sub: &str, email: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Encoding("token expiry out of range".into()))?;
        let claims = TokenClaims {
            sub: sub.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        let claims = decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::SignatureInvalid
                }
                _ => TokenError::Malformed,
            })?;

        if now.timestamp() > claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &Algorithm::HS256)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret-key-that-is-at-least-32-chars";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, Duration::minutes(15))
    }

    #[test]
    fn test_issue_and_verify() {
        let codec = codec();
        let now = Utc::now();

        let token = codec.issue_at("user-123", "a@x.com", now).unwrap();
        let claims = codec.verify_at(&token, now).unwrap();

        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp, now.timestamp() + 15 * 60);
    }

    #[test]
    fn test_valid_until_expiry_instant() {
        let codec = codec();
        let issued = Utc::now();
        let token = codec.issue_at("user-123", "a@x.com", issued).unwrap();

        assert!(codec.verify_at(&token, issued + Duration::minutes(15)).is_ok());
        assert_eq!(
            codec.verify_at(&token, issued + Duration::minutes(15) + Duration::seconds(1)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_expired_against_wall_clock() {
        let codec = codec();
        let issued = Utc::now() - Duration::minutes(20);
        let token = codec.issue_at("user-123", "a@x.com", issued).unwrap();

        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_wrong_secret() {
        let token = codec().issue("user-123", "a@x.com").unwrap();
        let other = TokenCodec::new(b"another-secret-that-is-32-chars-long!", Duration::minutes(15));

        assert_eq!(other.verify(&token), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn test_tampered_payload() {
        let codec = codec();
        let token = codec.issue("user-123", "a@x.com").unwrap();
        let forged_claims = TokenClaims {
            sub: "admin".into(),
            email: "a@x.com".into(),
            iat: 0,
            exp: i64::MAX / 2,
        };
        let forged_payload = encode(
            &Header::new(Algorithm::HS256),
            &forged_claims,
            &EncodingKey::from_secret(b"attacker-secret-attacker-secret-xx"),
        )
        .unwrap();

        // Original header and signature around the attacker's payload.
        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged_payload.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        assert_eq!(codec.verify(&spliced), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn test_unrepresentable_expiry_is_an_error() {
        let codec = TokenCodec::new(SECRET, Duration::weeks(1_000_000_000));

        assert!(matches!(
            codec.issue("user-123", "a@x.com"),
            Err(TokenError::Encoding(_))
        ));
    }

    #[test]
    fn test_malformed() {
        let codec = codec();
        assert_eq!(codec.verify("invalid.token.here"), Err(TokenError::Malformed));
        assert_eq!(codec.verify("not-a-token"), Err(TokenError::Malformed));
        assert_eq!(codec.verify(""), Err(TokenError::Malformed));
    }
}
