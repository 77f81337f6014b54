use chrono::DateTime;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    auth::{
        claims::{Claims, RefreshClaims, REFRESH_TOKEN_TYPE},
        password::hash_token,
    },
    errors::{AppError, AppResult},
    models::{
        domain::{RefreshToken, User},
        dto::response::TokenPair,
    },
};

/// Tokens handed to a client on login, plus the digest record that makes the
/// refresh half revocable.
pub struct IssuedTokens {
    pub pair: TokenPair,
    pub record: RefreshToken,
}

/// HS256 signer for the access/refresh pair.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_hours: i64,
    refresh_hours: i64,
}

impl JwtService {
    pub fn new(secret: &SecretString, access_hours: i64, refresh_hours: i64) -> Self {
        let secret = secret.expose_secret().as_bytes();

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_hours,
            refresh_hours,
        }
    }

    pub fn issue(&self, user: &User) -> AppResult<IssuedTokens> {
        let access = Claims::new(user, self.access_hours);
        let refresh = RefreshClaims::new(&access.sub, self.refresh_hours);
        let expires_at = DateTime::from_timestamp(refresh.exp as i64, 0)
            .ok_or_else(|| AppError::InternalError("Refresh expiry out of range".to_string()))?;

        let pair = TokenPair {
            access_token: self.sign(&access)?,
            refresh_token: self.sign(&refresh)?,
        };
        let record = RefreshToken::new(&refresh.sub, hash_token(&pair.refresh_token), expires_at);

        Ok(IssuedTokens { pair, record })
    }

    pub fn verify_access(&self, token: &str) -> AppResult<Claims> {
        self.verify(token).map_err(|e| rejected("Access", e.kind()))
    }

    pub fn verify_refresh(&self, token: &str) -> AppResult<RefreshClaims> {
        let claims: RefreshClaims = self.verify(token).map_err(|e| rejected("Refresh", e.kind()))?;
        if claims.token_type != REFRESH_TOKEN_TYPE {
            return Err(AppError::Unauthorized(
                "Refresh token rejected: wrong token type".to_string(),
            ));
        }
        Ok(claims)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> AppResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(format!("Token signing failed: {}", e)))
    }

    fn verify<T: DeserializeOwned>(&self, token: &str) -> jsonwebtoken::errors::Result<T> {
        decode::<T>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
    }
}

fn rejected(kind: &str, error: &ErrorKind) -> AppError {
    let reason = match error {
        ErrorKind::ExpiredSignature => "expired",
        ErrorKind::InvalidSignature => "bad signature",
        _ => "malformed",
    };
    AppError::Unauthorized(format!("{} token rejected: {}", kind, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::Utc;

    fn service() -> JwtService {
        JwtService::new(&Config::test_config().jwt_secret, 1, 168)
    }

    fn user() -> User {
        User::new("John", "Doe", "john@example.com", "$argon2id$hash")
    }

    #[test]
    fn issued_pair_verifies_on_both_halves() {
        let jwt = service();
        let user = user();

        let issued = jwt.issue(&user).unwrap();

        let access = jwt.verify_access(&issued.pair.access_token).unwrap();
        assert_eq!(access.sub, user.id_hex());
        assert_eq!(access.email, "john@example.com");

        let refresh = jwt.verify_refresh(&issued.pair.refresh_token).unwrap();
        assert_eq!(refresh.sub, user.id_hex());
    }

    #[test]
    fn issued_record_stores_digest_and_refresh_expiry() {
        let issued = service().issue(&user()).unwrap();

        assert_eq!(issued.record.token_hash, hash_token(&issued.pair.refresh_token));
        assert_ne!(issued.record.token_hash, issued.pair.refresh_token);
        assert!(!issued.record.revoked);
        let lifetime = issued.record.expires_at - Utc::now();
        assert!(lifetime.num_hours() >= 167 && lifetime.num_hours() <= 168);
    }

    #[test]
    fn back_to_back_issues_never_share_a_refresh_token() {
        let jwt = service();
        let user = user();

        let first = jwt.issue(&user).unwrap();
        let second = jwt.issue(&user).unwrap();

        assert_ne!(first.record.token_hash, second.record.token_hash);
    }

    #[test]
    fn halves_are_not_interchangeable() {
        let jwt = service();
        let issued = jwt.issue(&user()).unwrap();

        assert!(matches!(
            jwt.verify_refresh(&issued.pair.access_token),
            Err(AppError::Unauthorized(_))
        ));
        assert!(jwt.verify_access(&issued.pair.refresh_token).is_err());
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let issued = service().issue(&user()).unwrap();
        let stranger = JwtService::new(&SecretString::from("another-secret-entirely"), 1, 168);

        match stranger.verify_refresh(&issued.pair.refresh_token) {
            Err(AppError::Unauthorized(msg)) => assert!(msg.contains("bad signature")),
            other => panic!("expected Unauthorized, got {:?}", other.map(|c| c.sub)),
        }
    }

    #[test]
    fn garbage_is_malformed() {
        match service().verify_access("invalid.token.here") {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "Access token rejected: malformed"),
            _ => panic!("expected Unauthorized"),
        }
    }
}
