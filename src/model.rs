//! Data models for the tinylink URL shortener
//!
//! This module defines all the data structures used throughout the application:
//! the in-memory records (short links, users, visit log entries) and the
//! request/response payloads exchanged over the JSON API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A shortened link stored in the link table
///
/// The record carries everything the dashboard and the redirect handler need:
/// - The six-character short code identifying the link
/// - The destination URL, normalized so redirects always have a scheme
/// - The owning user, if the link was created while signed in
/// - Creation timestamp and view counters
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ShortLink {
    /// Six-character identifier for the link (e.g., "b2xVn2")
    pub code: String,

    /// The destination this code redirects to
    ///
    /// Always carries a scheme: inputs without one are stored with an
    /// "http://" prefix so the redirect response is a valid absolute URL.
    pub destination_url: String,

    /// Id of the user that created this link
    ///
    /// `None` for links created before ownership tracking existed; every
    /// link created through the API today has an owner.
    pub owner_id: Option<String>,

    /// When this link was created, reset whenever the destination is replaced
    pub created_at: DateTime<Utc>,

    /// Number of times this link has been traversed, by anyone
    #[serde(default)]
    pub total_views: u64,

    /// Number of distinct sessions that have traversed this link
    #[serde(default)]
    pub unique_views: u64,
}

/// A registered account
///
/// The id is drawn from the same generator namespace as short codes, so a
/// user id can never collide with a link code. Only the salted hash of the
/// password is kept; this type deliberately does not implement `Serialize`
/// so the hash cannot leak into a response by accident.
#[derive(Debug, Clone)]
pub struct User {
    /// Six-character account id
    pub id: String,

    /// Login email, unique across all accounts
    pub email: String,

    /// Argon2id hash of the account password
    pub password_hash: String,

    /// When the account was registered
    pub created_at: DateTime<Utc>,
}

/// One distinct-visitor event in a link's audit trail
///
/// The visitor id tags the event only; it is generated fresh for each unique
/// visit and is unrelated to any user account.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VisitEntry {
    /// Freshly generated id for this distinct visitor
    pub visitor_id: String,

    /// When the first traversal by this visitor happened
    pub visited_at: DateTime<Utc>,
}

/// Request payload for creating a new short link
///
/// # Example
/// ```json
/// { "url": "example.com/some/long/path" }
/// ```
#[derive(Deserialize)]
pub struct CreateLinkRequest {
    /// The destination to shorten; "http://" is prepended when no scheme is given
    pub url: String,
}

/// Request payload for replacing a link's destination
#[derive(Deserialize)]
pub struct UpdateLinkRequest {
    /// The new destination, normalized the same way as at creation
    pub url: String,
}

/// A link as returned by the API
///
/// # Example
/// ```json
/// {
///   "code": "b2xVn2",
///   "short_url": "http://localhost:8080/u/b2xVn2",
///   "destination_url": "http://www.lighthouselabs.ca",
///   "owner_id": "u1A9zQ",
///   "created_at": "2026-01-17T13:40:00Z",
///   "total_views": 4,
///   "unique_views": 2
/// }
/// ```
#[derive(Serialize)]
pub struct LinkResponse {
    pub code: String,
    pub short_url: String,
    pub destination_url: String,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub total_views: u64,
    pub unique_views: u64,
}

impl LinkResponse {
    /// Builds the response shape from a stored record and the public base URL
    pub fn new(link: ShortLink, base: &str) -> Self {
        Self {
            short_url: format!("{}/u/{}", base, link.code),
            code: link.code,
            destination_url: link.destination_url,
            owner_id: link.owner_id,
            created_at: link.created_at,
            total_views: link.total_views,
            unique_views: link.unique_views,
        }
    }
}

/// A link plus its distinct-visitor audit trail, returned by the detail endpoint
#[derive(Serialize)]
pub struct LinkDetailResponse {
    pub code: String,
    pub short_url: String,
    pub destination_url: String,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub total_views: u64,
    pub unique_views: u64,
    pub visits: Vec<VisitEntry>,
}

impl LinkDetailResponse {
    pub fn new(link: ShortLink, visits: Vec<VisitEntry>, base: &str) -> Self {
        Self {
            short_url: format!("{}/u/{}", base, link.code),
            code: link.code,
            destination_url: link.destination_url,
            owner_id: link.owner_id,
            created_at: link.created_at,
            total_views: link.total_views,
            unique_views: link.unique_views,
            visits,
        }
    }
}

/// Request payload for registration
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Request payload for login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// An account as returned by the API; never includes the password hash
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
        }
    }
}
