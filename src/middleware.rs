use axum::{
    extract::{Request, State},
    http::header::COOKIE,
    middleware::Next,
    response::Response,
};

use crate::session::{token_from_cookies, VisitedCodes};
use crate::store::AppState;

/// What the session cookie resolved to for the current request
///
/// `user_id` is the claimed account id; handlers still look it up in the
/// user table before trusting it. A missing, malformed, expired, or
/// tampered cookie resolves to the default (anonymous, nothing visited).
#[derive(Debug, Clone, Default)]
pub struct CurrentSession {
    pub user_id: Option<String>,
    pub visited: VisitedCodes,
}

/// Middleware that decodes the session cookie for every request
///
/// Never rejects a request; it only attaches a `CurrentSession` extension.
/// Authorization decisions belong to the handlers.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = request
        .headers()
        .get(COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(token_from_cookies)
        .and_then(|token| state.sessions.verify(token).ok())
        .map(|claims| CurrentSession {
            user_id: claims.sub,
            visited: VisitedCodes::decode(&claims.visit),
        })
        .unwrap_or_default();

    request.extensions_mut().insert(session);

    next.run(request).await
}
