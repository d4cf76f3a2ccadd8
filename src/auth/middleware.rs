//! Authentication Middleware
//! Mission: Protect API endpoints with bearer-token validation

use crate::auth::{
    error::AuthError,
    jwt::TokenService,
    models::{Identity, RoleSet},
};
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

/// Exact, case-sensitive prefix expected in the `Authorization` header
pub const BEARER_PREFIX: &str = "Bearer ";

static NO_ROLES: RoleSet = RoleSet::new();

/// Per-request identity, placed in request extensions by the gates.
///
/// Downstream code reads identity only from here, never from the token.
#[derive(Debug, Clone)]
pub struct RequestContext {
    identity: Option<Identity>,
}

impl RequestContext {
    pub fn authenticated(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    /// Context for a caller that presented no usable credential on an
    /// optionally-authenticated route.
    pub fn anonymous() -> Self {
        Self { identity: None }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn subject_id(&self) -> Option<i64> {
        self.identity.as_ref().map(|i| i.subject_id)
    }

    pub fn subject_name(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.subject_name.as_str())
    }

    pub fn roles(&self) -> &RoleSet {
        self.identity.as_ref().map(|i| &i.roles).unwrap_or(&NO_ROLES)
    }
}

/// Pull the bearer token out of the headers and verify it.
///
/// The token service is only consulted once the prefix has been found.
pub fn authenticate(
    headers: &HeaderMap,
    tokens: &dyn TokenService,
) -> Result<RequestContext, AuthError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
        .ok_or(AuthError::MissingCredential)?;

    let identity = tokens.verify_token(token)?;
    Ok(RequestContext::authenticated(identity))
}

/// Mandatory authentication: rejects with 401 unless a valid token is present
pub async fn auth_middleware(
    State(tokens): State<Arc<dyn TokenService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let ctx = authenticate(req.headers(), tokens.as_ref()).map_err(|e| {
        debug!(path = %req.uri().path(), "Authentication rejected: {}", e);
        e
    })?;

    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}

/// Optional authentication: never rejects. Callers without a valid token
/// continue with an anonymous context.
pub async fn optional_auth_middleware(
    State(tokens): State<Arc<dyn TokenService>>,
    mut req: Request,
    next: Next,
) -> Response {
    let ctx = match authenticate(req.headers(), tokens.as_ref()) {
        Ok(ctx) => ctx,
        Err(e) => {
            debug!(path = %req.uri().path(), "Proceeding anonymously: {}", e);
            RequestContext::anonymous()
        }
    };

    req.extensions_mut().insert(ctx);
    next.run(req).await
}

/// Extract the context from a request (use after one of the gates)
pub fn extract_context(req: &Request) -> Option<&RequestContext> {
    req.extensions().get::<RequestContext>()
}

/// A handler asking for a context on a route with no gate is a wiring bug;
/// deny rather than guess.
#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or(AuthError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Role;
    use axum::{
        body::Body,
        http::{HeaderValue, Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    /// Accepts exactly the token "good" and counts every call
    struct CountingTokens {
        calls: AtomicUsize,
    }

    impl CountingTokens {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl TokenService for CountingTokens {
        fn issue_token(&self, _identity: &Identity) -> anyhow::Result<String> {
            Ok("good".to_string())
        }

        fn verify_token(&self, token: &str) -> Result<Identity, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match token {
                "good" => Ok(Identity {
                    subject_id: 1,
                    subject_name: "alice".to_string(),
                    roles: RoleSet::from([Role::User]),
                }),
                "old" => Err(AuthError::Expired),
                _ => Err(AuthError::InvalidSignature),
            }
        }
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    async fn whoami(ctx: RequestContext) -> String {
        ctx.subject_name().unwrap_or("anonymous").to_string()
    }

    fn app(tokens: Arc<CountingTokens>) -> Router {
        let tokens: Arc<dyn TokenService> = tokens;
        Router::new()
            .route(
                "/protected",
                get(whoami).route_layer(middleware::from_fn_with_state(
                    tokens.clone(),
                    auth_middleware,
                )),
            )
            .route(
                "/optional",
                get(whoami).route_layer(middleware::from_fn_with_state(
                    tokens,
                    optional_auth_middleware,
                )),
            )
            .route("/ungated", get(whoami))
    }

    async fn call(app: Router, uri: &str, auth: Option<&str>) -> (StatusCode, String) {
        let mut builder = HttpRequest::builder().uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(AUTHORIZATION, auth);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn test_authenticate_valid_bearer() {
        let tokens = CountingTokens::new();
        let ctx = authenticate(&headers_with("Bearer good"), tokens.as_ref()).unwrap();

        assert!(ctx.is_authenticated());
        assert_eq!(ctx.subject_id(), Some(1));
        assert_eq!(ctx.subject_name(), Some("alice"));
        assert!(ctx.roles().contains(Role::User));
        assert_eq!(tokens.calls(), 1);
    }

    #[test]
    fn test_prefix_mismatch_never_reaches_token_service() {
        let tokens = CountingTokens::new();

        for value in ["Bear good", "bearer good", "Bearer", "Token good", "good"] {
            let err = authenticate(&headers_with(value), tokens.as_ref()).unwrap_err();
            assert_eq!(err, AuthError::MissingCredential, "header {:?}", value);
        }
        let err = authenticate(&HeaderMap::new(), tokens.as_ref()).unwrap_err();
        assert_eq!(err, AuthError::MissingCredential);

        assert_eq!(tokens.calls(), 0);
    }

    #[test]
    fn test_verification_failure_is_passed_through() {
        let tokens = CountingTokens::new();
        assert_eq!(
            authenticate(&headers_with("Bearer old"), tokens.as_ref()).unwrap_err(),
            AuthError::Expired
        );
        assert_eq!(
            authenticate(&headers_with("Bearer forged"), tokens.as_ref()).unwrap_err(),
            AuthError::InvalidSignature
        );
    }

    #[test]
    fn test_anonymous_context_has_no_roles() {
        let ctx = RequestContext::anonymous();
        assert!(!ctx.is_authenticated());
        assert!(ctx.subject_name().is_none());
        assert!(ctx.roles().is_empty());
    }

    #[tokio::test]
    async fn test_protected_route_requires_token() {
        let tokens = CountingTokens::new();

        let (status, body) = call(app(tokens.clone()), "/protected", Some("Bearer good")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "alice");

        let (status, body) = call(app(tokens.clone()), "/protected", Some("Bearer forged")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(!body.contains("forged"));

        let (status, _) = call(app(tokens.clone()), "/protected", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_prefix_rejected_before_verification() {
        let tokens = CountingTokens::new();

        let (status, _) = call(app(tokens.clone()), "/protected", Some("Bear xyz")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(tokens.calls(), 0);
    }

    #[tokio::test]
    async fn test_optional_route_falls_back_to_anonymous() {
        let tokens = CountingTokens::new();

        let (status, body) = call(app(tokens.clone()), "/optional", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");

        let (status, body) = call(app(tokens.clone()), "/optional", Some("Bearer forged")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");

        let (status, body) = call(app(tokens), "/optional", Some("Bearer good")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "alice");
    }

    #[tokio::test]
    async fn test_context_extractor_fails_closed_without_gate() {
        let (status, _) = call(app(CountingTokens::new()), "/ungated", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
