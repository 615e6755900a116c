//! Route definitions for the tinylink API
//!
//! This module configures all HTTP routes and maps them to their respective
//! handlers. Every route passes through the session middleware, which
//! resolves the session cookie into a request extension; the handlers
//! themselves decide who is allowed to do what.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::handler::{
    create_link, delete_link, links_json, list_links, login, logout, new_link_form,
    redirect_link, register, show_link, update_link,
};
use crate::middleware::session_middleware;
use crate::store::AppState;

/// Creates and configures the Axum application router with all routes
///
/// # Route Definitions
///
/// - `GET /urls` - the acting user's links
/// - `GET /urls/new` - auth probe for the create form
/// - `GET /urls/{code}` - one link with its visit analytics (owner only)
/// - `GET /urls.json` - the full link table
/// - `GET /u/{code}` - public redirect, with view tracking
/// - `POST /urls` - create a link
/// - `POST|PUT /urls/{code}` - replace a link's destination (owner only)
/// - `POST|DELETE /urls/{code}/delete` - delete a link (owner only)
/// - `POST /register`, `/login`, `/logout` - account lifecycle
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/urls", get(list_links).post(create_link))
        .route("/urls.json", get(links_json))
        .route("/urls/new", get(new_link_form))
        .route("/urls/{code}", get(show_link).post(update_link).put(update_link))
        .route("/urls/{code}/delete", post(delete_link).delete(delete_link))
        .route("/u/{code}", get(redirect_link))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .with_state(state)
}
