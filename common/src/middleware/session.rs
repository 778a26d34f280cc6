//! Session cookie middleware.
//!
//! Correlates requests from the same browser through an opaque cookie. The
//! session ID is the key of the connection registry; nothing else is stored
//! per session.

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header::SET_COOKIE, request::Parts, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::AppError;

const MAX_SESSION_ID_LEN: usize = 128;

/// Cookie settings used by [`session_middleware`].
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Cookie name.
    pub cookie_name: String,
    /// Whether to set the `Secure` attribute.
    pub secure: bool,
}

impl From<&AppConfig> for SessionConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            cookie_name: config.session_cookie_name.clone(),
            secure: config.session_cookie_secure,
        }
    }
}

/// Session identifier attached to every request.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generates a fresh random session ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Returns the session ID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_well_formed(value: &str) -> bool {
        !value.is_empty()
            && value.len() <= MAX_SESSION_ID_LEN
            && value
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for SessionId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionId>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session middleware not installed".into()))
    }
}

/// Session middleware handler.
///
/// Reads the session cookie, or issues a new one when it is missing or
/// malformed, and stores the [`SessionId`] in the request extensions.
pub async fn session_middleware(
    State(config): State<SessionConfig>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(req.headers());
    let existing = jar
        .get(&config.cookie_name)
        .map(|c| c.value().to_string())
        .filter(|v| SessionId::is_well_formed(v));

    let (session_id, issued) = match existing {
        Some(id) => (SessionId(id), false),
        None => (SessionId::generate(), true),
    };

    req.extensions_mut().insert(session_id.clone());
    let mut response = next.run(req).await;

    if issued {
        let cookie = Cookie::build((config.cookie_name.clone(), session_id.0.clone()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(config.secure)
            .build();
        if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
            response.headers_mut().append(SET_COOKIE, value);
        }
        tracing::debug!(session_id = %session_id, "issued new session");
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{header::COOKIE, StatusCode},
        middleware, routing::get, Router,
    };
    use tower::ServiceExt;

    fn app() -> Router {
        let config = SessionConfig {
            cookie_name: "sid".into(),
            secure: false,
        };
        Router::new()
            .route("/", get(|session: SessionId| async move { session.0 }))
            .layer(middleware::from_fn_with_state(config, session_middleware))
    }

    #[tokio::test]
    async fn test_issues_cookie_when_missing() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("sid="));
        assert!(cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn test_reuses_existing_cookie() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(COOKIE, "sid=abc123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.headers().get(SET_COOKIE).is_none());
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"abc123");
    }

    #[tokio::test]
    async fn test_replaces_malformed_cookie() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(COOKIE, "sid=bad%20value")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_ne!(&body[..], b"bad%20value");
        assert!(!body.is_empty());
    }
}
