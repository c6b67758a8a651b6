/// HTTP middleware utilities for blog-service
///
/// `ApiKeyAuth` turns an optional `Authorization: Bearer <api key>` header into
/// an [`Identity`] stored in the request extensions. Requests without the header
/// continue as anonymous; an unknown key is rejected with 401.
pub mod permissions;

pub use permissions::*;

use crate::models::User;
use crate::state::AppState;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{error::ErrorUnauthorized, web, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::time::Instant;

// =====================================================================
// API key identity
// =====================================================================

/// Who is making the request
#[derive(Debug, Clone)]
pub enum Identity {
    Anonymous,
    User(User),
}

impl Identity {
    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::User(user) => Some(user),
            Identity::Anonymous => None,
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user().map(|u| u.id)
    }
}

/// Extractor for endpoints that need a signed-in user
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

pub struct ApiKeyAuth;

impl<S, B> Transform<S, ServiceRequest> for ApiKeyAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ApiKeyAuthService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiKeyAuthService {
            service: Rc::new(service),
        }))
    }
}

pub struct ApiKeyAuthService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ApiKeyAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let api_key = match req.headers().get("Authorization") {
                None => None,
                Some(header) => {
                    let value = header
                        .to_str()
                        .map_err(|_| ErrorUnauthorized("Invalid Authorization header"))?;
                    let key = value
                        .strip_prefix("Bearer ")
                        .ok_or_else(|| ErrorUnauthorized("Invalid Authorization scheme"))?;
                    Some(key.trim().to_string())
                }
            };

            let identity = match api_key {
                None => Identity::Anonymous,
                Some(key) => {
                    let state = req
                        .app_data::<web::Data<AppState>>()
                        .cloned()
                        .ok_or_else(|| {
                            actix_web::error::ErrorInternalServerError("App state missing")
                        })?;

                    match state.users.find_by_api_key(&key).await? {
                        Some(user) => Identity::User(user),
                        None => return Err(ErrorUnauthorized("Invalid API key")),
                    }
                }
            };

            tracing::debug!(user_id = ?identity.user_id(), "request identity resolved");
            req.extensions_mut().insert(identity);

            service.call(req).await
        })
    }
}

impl FromRequest for Identity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(Ok(req
            .extensions()
            .get::<Identity>()
            .cloned()
            .unwrap_or(Identity::Anonymous)))
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Identity>()
                .and_then(Identity::user)
                .cloned()
                .map(AuthenticatedUser)
                .ok_or_else(|| ErrorUnauthorized("Authentication required")),
        )
    }
}

// =====================================================================
// Request timing
// =====================================================================

pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let res = service.call(req).await;
            let elapsed = start.elapsed();
            let status = match &res {
                Ok(response) => response.status().as_u16().to_string(),
                Err(err) => err.as_response_error().status_code().as_u16().to_string(),
            };

            crate::metrics::HTTP_REQUEST_DURATION_SECONDS
                .with_label_values(&[&method, &status])
                .observe(elapsed.as_secs_f64());
            tracing::debug!(%method, %status, elapsed_ms = elapsed.as_millis() as u64, "request completed");
            res
        })
    }
}
