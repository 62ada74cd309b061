//! Request authentication for the admin surface.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

/// Decides whether a request may use the admin endpoints.
pub trait Authenticator: Send + Sync + 'static {
    fn authenticate(&self, headers: &HeaderMap) -> bool;
}

/// Accepts requests carrying `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct BearerToken {
    expected: String,
}

impl BearerToken {
    pub fn new(token: impl AsRef<str>) -> Self {
        Self {
            expected: format!("Bearer {}", token.as_ref()),
        }
    }
}

impl Authenticator for BearerToken {
    fn authenticate(&self, headers: &HeaderMap) -> bool {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .is_some_and(|value| value == self.expected)
    }
}

/// Lets every request through. For local development only.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authenticator for AllowAll {
    fn authenticate(&self, _headers: &HeaderMap) -> bool {
        true
    }
}

pub async fn require_auth(
    State(auth): State<Arc<dyn Authenticator>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth.authenticate(request.headers()) {
        return Ok(next.run(request).await);
    }

    tracing::warn!(uri = %request.uri(), "Rejected unauthenticated admin request");
    Err(StatusCode::UNAUTHORIZED)
}
