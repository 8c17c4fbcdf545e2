//! JWT Authentication Middleware
//!
//! Security properties:
//! - Zero-copy token extraction from Authorization header
//! - Validates algorithm (HS256 only) — prevents algorithm confusion attacks
//! - Validates exp, iat, sub claims — rejects malformed or expired tokens
//! - Derives the household key from the token subject; whatever a request
//!   body claims about its household is advisory only
//! - Injects HouseholdKey into request extensions — handlers get a typed,
//!   already-validated value
//! - All errors return the same generic 401 to prevent information leakage
//!
//! Dev mode: a missing or invalid token falls back to household "default"
//! so the single-card flow can be exercised without an issuer running.

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::StatusCode,
    Error, HttpMessage, HttpResponse,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use serde_json::json;
use std::rc::Rc;
use std::sync::Arc;

use crate::services::token::TokenService;

/// Household key for dev-mode fallback requests
pub const DEV_HOUSEHOLD_KEY: &str = "default";

/// The authenticated household, injected into request extensions
#[derive(Debug, Clone)]
pub struct HouseholdKey(pub String);

/// Middleware factory — wrap a scope with `.wrap(JwtAuth::new(token_service, dev))`
pub struct JwtAuth {
    token_service: Arc<TokenService>,
    dev_fallback: bool,
}

impl JwtAuth {
    pub fn new(token_service: Arc<TokenService>, dev_fallback: bool) -> Self {
        Self { token_service, dev_fallback }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JwtAuthMiddleware {
            service: Rc::new(service),
            token_service: self.token_service.clone(),
            dev_fallback: self.dev_fallback,
        })
    }
}

pub struct JwtAuthMiddleware<S> {
    service: Rc<S>,
    token_service: Arc<TokenService>,
    dev_fallback: bool,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let token_service = self.token_service.clone();
        let dev_fallback = self.dev_fallback;

        Box::pin(async move {
            // ── Extract Bearer token ─────────────────────────────────────────
            let auth_header = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok());

            let raw_token = match auth_header {
                Some(h) if h.len() > 7 && h[..7].eq_ignore_ascii_case("bearer ") => Some(&h[7..]),
                _ => None,
            };

            // ── Derive household key (auth wins over any body field) ─────────
            let household = match raw_token {
                Some(token) => match token_service.household_key_from_token(token) {
                    Ok(key) => Some(key),
                    Err(e) => {
                        tracing::debug!("JWT validation failed: {:?}", e);
                        None
                    }
                },
                None => None,
            };

            let household = match (household, dev_fallback) {
                (Some(key), _) => key,
                (None, true) => DEV_HOUSEHOLD_KEY.to_string(),
                (None, false) => return Ok(unauthorized(req)),
            };

            // ── Inject household into request extensions ─────────────────────
            // Handlers use web::ReqData<HouseholdKey>
            req.extensions_mut().insert(HouseholdKey(household));

            // ── Continue to handler ──────────────────────────────────────────
            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// Build a 401 Unauthorized response with a generic error body
fn unauthorized<B>(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
    let (http_req, _payload) = req.into_parts();
    let response = HttpResponse::build(StatusCode::UNAUTHORIZED)
        .content_type("application/json")
        .json(json!({ "error": "unauthorized" }));
    ServiceResponse::new(http_req, response).map_into_right_body()
}
