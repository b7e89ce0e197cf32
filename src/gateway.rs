//! Caller identity resolution.
//!
//! Every mutating operation in this crate takes a [`Caller`]. The only way to get
//! one from an inbound call is through an [`AccessGateway`], so authentication is
//! always settled before any ownership or business rule is looked at.
use super::error::{LedgerError, Result};
use super::types::UserId;
use chrono::{TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// An authenticated user, scoped to a single inbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    user_id: UserId,
}

impl Caller {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }
}

pub trait AccessGateway: Send + Sync {
    /// Resolve the caller from the raw `Authorization` header value.
    fn authenticate(&self, authorization: Option<&str>) -> Result<Caller>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user: ClaimedUser,
    pub exp: u64,
    #[serde(default)]
    pub iat: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimedUser {
    pub id: String,
}

/// HS256 bearer tokens signed with a shared secret.
pub struct JwtGateway {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtGateway {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Mint a token for `user_id`. Issuing tokens belongs to the identity provider;
    /// this exists for local development and tests.
    pub fn issue_token(
        &self,
        user_id: &UserId,
        ttl: TimeDelta,
    ) -> std::result::Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            user: ClaimedUser {
                id: user_id.to_string(),
            },
            exp: (now + ttl).timestamp().max(0) as u64,
            iat: Some(now.timestamp().max(0) as u64),
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
    }
}

impl AccessGateway for JwtGateway {
    fn authenticate(&self, authorization: Option<&str>) -> Result<Caller> {
        let header = authorization
            .ok_or_else(|| LedgerError::unauthenticated("no token, authorization denied"))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| LedgerError::unauthenticated("token format is invalid"))?
            .trim();
        if token.is_empty() {
            return Err(LedgerError::unauthenticated("token value missing"));
        }

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|e| {
                tracing::warn!("token verification failed: {e}");
                match e.kind() {
                    JwtErrorKind::ExpiredSignature => {
                        LedgerError::unauthenticated("token has expired")
                    }
                    _ => LedgerError::unauthenticated("token is not valid"),
                }
            })?;

        let user_id = data.claims.user.id;
        if user_id.trim().is_empty() {
            return Err(LedgerError::unauthenticated("token carries no user id"));
        }
        if user_id.chars().any(char::is_control) {
            return Err(LedgerError::unauthenticated("token user id is malformed"));
        }
        Ok(Caller::new(UserId::from(user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn message(result: Result<Caller>) -> String {
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
        err.to_string()
    }

    #[test]
    fn accepts_valid_bearer_token() {
        let gateway = JwtGateway::new(b"secret");
        let token = gateway
            .issue_token(&UserId::from("alice"), TimeDelta::hours(1))
            .unwrap();

        let caller = gateway
            .authenticate(Some(&format!("Bearer {token}")))
            .unwrap();
        assert_eq!(caller.user_id(), &UserId::from("alice"));
    }

    #[test]
    fn rejects_missing_and_malformed_headers() {
        let gateway = JwtGateway::new(b"secret");

        assert_eq!(
            message(gateway.authenticate(None)),
            "no token, authorization denied"
        );
        assert_eq!(
            message(gateway.authenticate(Some("Token abc"))),
            "token format is invalid"
        );
        assert_eq!(
            message(gateway.authenticate(Some("Bearer  "))),
            "token value missing"
        );
        assert_eq!(
            message(gateway.authenticate(Some("Bearer not.a.jwt"))),
            "token is not valid"
        );
    }

    #[test]
    fn rejects_foreign_signature() {
        let ours = JwtGateway::new(b"secret");
        let theirs = JwtGateway::new(b"other-secret");
        let token = theirs
            .issue_token(&UserId::from("alice"), TimeDelta::hours(1))
            .unwrap();

        assert_eq!(
            message(ours.authenticate(Some(&format!("Bearer {token}")))),
            "token is not valid"
        );
    }

    #[test]
    fn rejects_user_id_with_control_characters() {
        let gateway = JwtGateway::new(b"secret");
        for id in ["alice\0mallory", "alice\nbob"] {
            let token = gateway
                .issue_token(&UserId::from(id), TimeDelta::hours(1))
                .unwrap();
            assert_eq!(
                message(gateway.authenticate(Some(&format!("Bearer {token}")))),
                "token user id is malformed"
            );
        }
    }

    #[test]
    fn rejects_expired_token() {
        let gateway = JwtGateway::new(b"secret");
        let token = gateway
            .issue_token(&UserId::from("alice"), TimeDelta::hours(-2))
            .unwrap();

        assert_eq!(
            message(gateway.authenticate(Some(&format!("Bearer {token}")))),
            "token has expired"
        );
    }
}
