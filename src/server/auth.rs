//! Authentication middleware for the server
//!
//! API and WebSocket paths require the session token: as a Bearer header, or
//! as a `token` query parameter on `/ws/` paths since browsers cannot set
//! headers on WebSocket upgrades. Health, version and the index page are public.

use axum::{
    body::Body,
    extract::Request,
    http::{header::AUTHORIZATION, Method, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tower::Layer;

const PUBLIC_PATHS: [&str; 2] = ["/health", "/api/version"];

/// Authentication layer that validates Bearer tokens
#[derive(Clone)]
pub struct AuthLayer {
    token: Arc<String>,
}

impl AuthLayer {
    pub fn new(token: String) -> Self {
        Self {
            token: Arc::new(token),
        }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            token: self.token.clone(),
        }
    }
}

/// The actual middleware service
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    token: Arc<String>,
}

/// Whether a request may pass without a token
fn is_public(method: &Method, path: &str) -> bool {
    // CORS preflight requests never carry credentials
    if method == Method::OPTIONS {
        return true;
    }
    if PUBLIC_PATHS.contains(&path) {
        return true;
    }
    !(path.starts_with("/api/") || path.starts_with("/ws/"))
}

/// Token from the `token=` query parameter
fn query_token(query: Option<&str>) -> Option<&str> {
    query?
        .split('&')
        .find_map(|pair| pair.strip_prefix("token="))
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn is_authorized(req: &Request, token: &str) -> bool {
    let path = req.uri().path();
    if path.starts_with("/ws/") && query_token(req.uri().query()) == Some(token) {
        return true;
    }
    bearer_token(req) == Some(token)
}

impl<S> tower::Service<Request> for AuthMiddleware<S>
where
    S: tower::Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let token = self.token.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if is_public(req.method(), req.uri().path()) || is_authorized(&req, &token) {
                return inner.call(req).await;
            }

            log::debug!("Rejected unauthenticated request to {}", req.uri().path());
            Ok((
                StatusCode::UNAUTHORIZED,
                Body::from("Unauthorized: Invalid or missing Bearer token"),
            )
                .into_response())
        })
    }
}

/// Generate a secure random auth token (32 hex chars)
pub fn generate_auth_token() -> String {
    use rand::Rng;
    let bytes: [u8; 16] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
