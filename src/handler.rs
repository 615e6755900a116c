//! HTTP request handlers for the tinylink API
//!
//! This module implements all the core business logic for:
//! - Creating, editing, and deleting short links with ownership checks
//! - Redirecting short links while tracking total and unique views
//! - Listing a user's links and serializing the full table
//! - Registration, login, and logout

use axum::{
    extract::{Path, State},
    http::{header::SET_COOKIE, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Extension, Json,
};
use chrono::Utc;
use serde_json::json;
use std::collections::BTreeMap;
use std::env;

use crate::error::ApiError;
use crate::middleware::CurrentSession;
use crate::model::{
    CreateLinkRequest, LinkDetailResponse, LinkResponse, LoginRequest, RegisterRequest,
    UpdateLinkRequest, User, UserResponse,
};
use crate::password::{hash_password, verify_password};
use crate::store::AppState;

/// Public base URL used when rendering short links in responses
///
/// Built from the `URL` and `PORT` environment variables, defaulting to
/// "http://localhost:8080".
fn public_base() -> String {
    let base = env::var("URL").unwrap_or_else(|_| "http://localhost".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    format!("{}:{}", base, port)
}

/// Resolves the acting user, or fails with `Unauthorized`
///
/// The session only claims an id; the account must still exist in the user
/// table for the request to count as authenticated.
fn require_user(state: &AppState, session: &CurrentSession) -> Result<User, ApiError> {
    session
        .user_id
        .as_deref()
        .and_then(|id| state.store.get_user(id))
        .ok_or(ApiError::Unauthorized)
}

/// Lists the acting user's links, keyed by short code
///
/// # Response
///
/// - **200 OK** - `{"urls": {code: link, ...}}`
/// - **401 Unauthorized** - no acting user
pub async fn list_links(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Response, ApiError> {
    let user = require_user(&state, &session)?;
    let base = public_base();

    let urls: BTreeMap<String, LinkResponse> = state
        .store
        .links_for_owner(&user.id)
        .into_iter()
        .map(|(code, link)| (code, LinkResponse::new(link, &base)))
        .collect();

    Ok(Json(json!({ "urls": urls })).into_response())
}

/// Auth probe for the "new link" form
///
/// The form itself lives in the client; this endpoint only tells it whether
/// the browser is signed in, mirroring the page that would refuse to render
/// for anonymous visitors.
pub async fn new_link_form(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Response, ApiError> {
    let user = require_user(&state, &session)?;
    Ok(Json(json!({ "user": UserResponse::from(user) })).into_response())
}

/// Shows one link with its counters and distinct-visitor trail
///
/// # Response
///
/// - **200 OK** - link detail
/// - **404 Not Found** - unknown code (checked before authentication)
/// - **401 Unauthorized** - no acting user
/// - **403 Forbidden** - acting user does not own the link
pub async fn show_link(
    Path(code): Path<String>,
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Response, ApiError> {
    let link = state.store.get_link(&code).ok_or(ApiError::NotFound)?;
    let user = require_user(&state, &session)?;
    if link.owner_id.as_deref() != Some(user.id.as_str()) {
        return Err(ApiError::Forbidden);
    }

    let visits = state.store.visits_for(&code);
    Ok(Json(LinkDetailResponse::new(link, visits, &public_base())).into_response())
}

/// Redirects a short link to its destination, tracking the visit
///
/// Every traversal increments the link's total view count. The first
/// traversal by a given session also increments the unique view count,
/// appends an entry to the link's visitor trail, and records the code in
/// the session's visited-set; the refreshed session cookie rides along on
/// the redirect response. An unknown code changes nothing and returns 404.
///
/// Uses 307 Temporary Redirect so browsers keep coming back through the
/// counter instead of caching the hop.
pub async fn redirect_link(
    Path(code): Path<String>,
    State(state): State<AppState>,
    Extension(mut session): Extension<CurrentSession>,
) -> Result<Response, ApiError> {
    let first_visit = !session.visited.contains(&code);

    let destination = state
        .store
        .record_visit(&code, first_visit, Utc::now())
        .ok_or(ApiError::NotFound)?;

    if first_visit {
        session.visited.insert(&code);
    }
    let token = state
        .sessions
        .issue(session.user_id.as_deref(), &session.visited)?;

    Ok((
        [(SET_COOKIE, state.sessions.cookie(&token))],
        Redirect::temporary(&destination),
    )
        .into_response())
}

/// Serializes the full link table as JSON
pub async fn links_json(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.all_links())
}

/// Creates a new short link owned by the acting user
///
/// # Request Body
///
/// ```json
/// { "url": "example.com/some/long/path" }
/// ```
///
/// # Response
///
/// - **201 Created** - the new link; destinations without a scheme come back
///   with an "http://" prefix
/// - **401 Unauthorized** - no acting user
pub async fn create_link(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<Response, ApiError> {
    let user = require_user(&state, &session)?;

    let link = state
        .store
        .create_link(&payload.url, Some(&user.id), Utc::now());
    tracing::debug!(code = %link.code, owner = %user.id, "short link created");

    Ok((
        StatusCode::CREATED,
        Json(LinkResponse::new(link, &public_base())),
    )
        .into_response())
}

/// Replaces a link's destination
///
/// Editing keeps the view counters but resets the creation timestamp, so the
/// record reads as "this destination since then".
///
/// # Response
///
/// - **200 OK** - the updated link
/// - **401 / 404 / 403** - checked in that order
pub async fn update_link(
    Path(code): Path<String>,
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Json(payload): Json<UpdateLinkRequest>,
) -> Result<Response, ApiError> {
    let user = require_user(&state, &session)?;
    let link = state.store.get_link(&code).ok_or(ApiError::NotFound)?;
    if link.owner_id.as_deref() != Some(user.id.as_str()) {
        return Err(ApiError::Forbidden);
    }

    let updated = state
        .store
        .update_link(&code, &payload.url, Utc::now())
        .ok_or(ApiError::NotFound)?;

    Ok(Json(LinkResponse::new(updated, &public_base())).into_response())
}

/// Deletes a link owned by the acting user
///
/// # Response
///
/// - **200 OK** - `{"message", "deleted_code"}`
/// - **401 / 404 / 403** - checked in that order
pub async fn delete_link(
    Path(code): Path<String>,
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Response, ApiError> {
    let user = require_user(&state, &session)?;
    let link = state.store.get_link(&code).ok_or(ApiError::NotFound)?;
    if link.owner_id.as_deref() != Some(user.id.as_str()) {
        return Err(ApiError::Forbidden);
    }

    state.store.delete_link(&code);
    tracing::debug!(code = %code, owner = %user.id, "short link deleted");

    Ok(Json(json!({
        "message": "Short link deleted successfully",
        "deleted_code": code
    }))
    .into_response())
}

/// Matches the registration form's email shape: something@something.something
fn plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() => domain
            .char_indices()
            .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len()),
        _ => false,
    }
}

/// Registers a new account and signs the browser in
///
/// # Request Body
///
/// ```json
/// { "email": "user@example.com", "password": "swordfish" }
/// ```
///
/// # Response
///
/// - **201 Created** - the new account, with a session cookie
/// - **400 Bad Request** - empty or malformed email/password, or the email
///   is already registered
pub async fn register(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    if payload.email.is_empty() || payload.password.is_empty() || !plausible_email(&payload.email)
    {
        return Err(ApiError::Validation("invalid email or password".into()));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = state
        .store
        .create_user(&payload.email, &password_hash, Utc::now())
        .ok_or_else(|| ApiError::Validation("existing user".into()))?;
    tracing::debug!(user = %user.id, "account registered");

    // The new account takes over the session; any visit history the browser
    // accumulated while anonymous is kept.
    let token = state.sessions.issue(Some(&user.id), &session.visited)?;

    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, state.sessions.cookie(&token))],
        Json(UserResponse::from(user)),
    )
        .into_response())
}

/// Logs an account in
///
/// # Response
///
/// - **200 OK** - the account, with a session cookie
/// - **403 Forbidden** - unknown email or wrong password, indistinguishably
pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let user = state
        .store
        .find_user_by_email(&payload.email)
        .ok_or(ApiError::InvalidCredentials)?;

    let verified = verify_password(&payload.password, &user.password_hash).unwrap_or(false);
    if !verified {
        return Err(ApiError::InvalidCredentials);
    }

    let token = state.sessions.issue(Some(&user.id), &session.visited)?;

    Ok((
        [(SET_COOKIE, state.sessions.cookie(&token))],
        Json(UserResponse::from(user)),
    )
        .into_response())
}

/// Logs the browser out
///
/// Only the user id is dropped from the session; the visited-set survives so
/// unique view counts stay honest across sign-ins.
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Response, ApiError> {
    let token = state.sessions.issue(None, &session.visited)?;

    Ok((
        [(SET_COOKIE, state.sessions.cookie(&token))],
        Json(json!({ "message": "Logged out" })),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plausible_email() {
        assert!(plausible_email("user@example.com"));
        assert!(plausible_email("a@b.c"));
        assert!(plausible_email("first.last@sub.example.co"));

        assert!(!plausible_email(""));
        assert!(!plausible_email("no-at-sign.com"));
        assert!(!plausible_email("@example.com"));
        assert!(!plausible_email("user@nodot"));
        assert!(!plausible_email("user@.com"));
        assert!(!plausible_email("user@domain."));
    }
}
