//! Signed session cookies and the per-session visited-set
//!
//! Sessions live entirely on the client as an HS256-signed token in the
//! `session` cookie. The claims carry at most two things: the authenticated
//! user id (absent for anonymous browsers) and a compact serialization of
//! which short codes this browser has already been counted as a unique
//! visitor for. The server keeps no session table; a token that fails
//! signature or expiry checks is simply treated as an anonymous session.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::{distr::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::env;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// Claims carried by the session token
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Authenticated user id, or `None` for an anonymous session
    pub sub: Option<String>,

    /// Comma-joined set of short codes this session has been credited for
    pub visit: String,

    pub iat: i64,
    pub exp: i64,
}

/// The set of short codes a session has already visited
///
/// Serialized as a comma-joined string inside the session claims. Membership
/// is an exact-token test over the decoded set: a session that visited
/// "bc1234" is never treated as having visited "abc123", which a raw
/// substring check against the joined string would get wrong.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitedCodes(BTreeSet<String>);

impl VisitedCodes {
    /// Parses the comma-joined claim value; empty segments are dropped
    pub fn decode(raw: &str) -> Self {
        Self(
            raw.split(',')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Joins the set back into the claim value
    pub fn encode(&self) -> String {
        self.0.iter().cloned().collect::<Vec<_>>().join(",")
    }

    pub fn contains(&self, code: &str) -> bool {
        self.0.contains(code)
    }

    pub fn insert(&mut self, code: &str) {
        self.0.insert(code.to_string());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Service for issuing and verifying session tokens
pub struct Sessions {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_days: i64,
}

impl Sessions {
    pub fn new(secret: &str, ttl_days: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_days,
        }
    }

    /// Builds the service from the `SESSION_SECRET` environment variable
    ///
    /// Without a configured secret, a random per-process one is generated;
    /// sessions then survive exactly as long as the process, which matches
    /// the lifetime of the in-memory tables they refer to.
    pub fn from_env() -> Self {
        let secret = env::var("SESSION_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                tracing::warn!("SESSION_SECRET not set, generating a per-process secret");
                rand::rng()
                    .sample_iter(&Alphanumeric)
                    .take(64)
                    .map(char::from)
                    .collect()
            });

        Self::new(&secret, 7)
    }

    /// Signs a fresh token for the given user (or anonymous) and visited-set
    pub fn issue(
        &self,
        user_id: Option<&str>,
        visited: &VisitedCodes,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user_id.map(str::to_string),
            visit: visited.encode(),
            iat: now.timestamp(),
            exp: (now + Duration::days(self.ttl_days)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }

    /// Verifies a token's signature and expiry, returning its claims
    pub fn verify(&self, token: &str) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        decode::<SessionClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
    }

    /// Renders the Set-Cookie value for a token
    pub fn cookie(&self, token: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE,
            token,
            self.ttl_days * 24 * 60 * 60
        )
    }
}

/// Pulls the session token out of a Cookie header value
pub fn token_from_cookies(header: &str) -> Option<&str> {
    header.split(';').map(str::trim).find_map(|pair| {
        pair.strip_prefix(SESSION_COOKIE)
            .and_then(|rest| rest.strip_prefix('='))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> Sessions {
        Sessions::new("test_secret_key_32_bytes_long!!", 7)
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let sessions = create_test_service();
        let mut visited = VisitedCodes::default();
        visited.insert("b2xVn2");
        visited.insert("9sm5xK");

        let token = sessions.issue(Some("u1A9zQ"), &visited).unwrap();
        let claims = sessions.verify(&token).unwrap();

        assert_eq!(claims.sub.as_deref(), Some("u1A9zQ"));
        assert_eq!(VisitedCodes::decode(&claims.visit), visited);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_anonymous_session() {
        let sessions = create_test_service();
        let token = sessions.issue(None, &VisitedCodes::default()).unwrap();
        let claims = sessions.verify(&token).unwrap();

        assert_eq!(claims.sub, None);
        assert!(VisitedCodes::decode(&claims.visit).is_empty());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let sessions = create_test_service();
        let other = Sessions::new("a_completely_different_secret!!!", 7);

        let token = sessions.issue(Some("u1A9zQ"), &VisitedCodes::default()).unwrap();
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        let sessions = create_test_service();
        assert!(sessions.verify("not.a.token").is_err());
    }

    #[test]
    fn test_membership_is_exact_token_not_substring() {
        // "abc123" appears as a substring of "xabc1234" and overlaps
        // "bc1234"; neither may count as a visit to "abc123".
        let mut visited = VisitedCodes::default();
        visited.insert("bc1234");
        visited.insert("xabc1234");

        assert!(!visited.contains("abc123"));
        assert!(visited.contains("bc1234"));

        let round_tripped = VisitedCodes::decode(&visited.encode());
        assert!(!round_tripped.contains("abc123"));
        assert_eq!(round_tripped, visited);
    }

    #[test]
    fn test_encode_decode_empty() {
        assert!(VisitedCodes::decode("").is_empty());
        assert_eq!(VisitedCodes::default().encode(), "");
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut visited = VisitedCodes::default();
        visited.insert("b2xVn2");
        visited.insert("b2xVn2");
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_token_from_cookies() {
        assert_eq!(
            token_from_cookies("session=abc.def.ghi"),
            Some("abc.def.ghi")
        );
        assert_eq!(
            token_from_cookies("theme=dark; session=tok; lang=en"),
            Some("tok")
        );
        assert_eq!(token_from_cookies("theme=dark"), None);
        // A cookie whose name merely starts with "session" must not match.
        assert_eq!(token_from_cookies("session_id=nope"), None);
    }
}
