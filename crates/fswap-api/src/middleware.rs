//! API middleware.

use axum::body::Body;
use axum::http::{header, HeaderValue, Request, Response};
use axum::middleware::Next;
use axum_extra::extract::CookieJar;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

/// Name of the anonymous session cookie.
pub const SESSION_COOKIE: &str = "fswap_session";

/// Cookie lifetime in seconds (30 days).
const SESSION_MAX_AGE_SECS: u64 = 30 * 24 * 3600;

/// Session id for the current request, minted on first contact.
#[derive(Debug, Clone)]
pub struct SessionId(pub String);

/// Ensure every caller carries a session cookie.
///
/// The session id is what ties an anonymous caller's admissions
/// together in the usage ledger. A request without one gets a fresh id
/// that is visible to handlers immediately (via request extensions)
/// and persisted on the response, so the very first submission already
/// counts against the new session.
pub async fn session_cookie(request: Request<Body>, next: Next) -> Response<Body> {
    let jar = CookieJar::from_headers(request.headers());
    let existing = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
    let minted = existing.is_none();
    let session = existing.unwrap_or_else(|| Uuid::new_v4().simple().to_string());

    let mut request = request;
    request.extensions_mut().insert(SessionId(session.clone()));

    let mut response = next.run(request).await;

    if minted {
        let cookie = format!(
            "{SESSION_COOKIE}={session}; Max-Age={SESSION_MAX_AGE_SECS}; Path=/; HttpOnly; SameSite=Lax"
        );
        if let Ok(value) = cookie.parse() {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    response
}

/// Create CORS layer.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    use axum::http::Method;

    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_origin(Any)
            .max_age(std::time::Duration::from_secs(600))
    } else {
        // Explicit origins allow credentials, which rules out wildcards
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
            .expose_headers([header::CONTENT_DISPOSITION, header::RETRY_AFTER])
            .allow_credentials(true)
            .allow_origin(origins)
            .max_age(std::time::Duration::from_secs(600))
    }
}
