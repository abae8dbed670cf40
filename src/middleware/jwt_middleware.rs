/// JWT Authentication Middleware
///
/// Reads the access token from the `accessToken` cookie or, failing that,
/// the `Authorization: Bearer` header, resolves it to a user and injects an
/// `AuthenticatedUser` into request extensions for route handlers.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{authenticate, ACCESS_TOKEN_COOKIE};
use crate::configuration::JwtSettings;
use crate::store::{PublicUser, UserStore};

/// Identity attached to a request by [`JwtMiddleware`]
///
/// Only the middleware can construct it, so a handler extracting
/// `web::ReqData<AuthenticatedUser>` always sees a verified user.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(PublicUser);

impl AuthenticatedUser {
    pub(crate) fn new(user: PublicUser) -> Self {
        Self(user)
    }

    pub fn id(&self) -> Uuid {
        self.0.id
    }

    pub fn into_inner(self) -> PublicUser {
        self.0
    }
}

/// Cookie first, then `Authorization: Bearer <token>`
fn extract_access_token(req: &ServiceRequest) -> Option<String> {
    if let Some(cookie) = req.request().cookie(ACCESS_TOKEN_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    req.headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

/// JWT middleware for protecting routes
pub struct JwtMiddleware {
    jwt_config: JwtSettings,
    store: Arc<dyn UserStore>,
}

impl JwtMiddleware {
    pub fn new(jwt_config: JwtSettings, store: Arc<dyn UserStore>) -> Self {
        Self { jwt_config, store }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtMiddlewareService {
            service: Rc::new(service),
            jwt_config: self.jwt_config.clone(),
            store: self.store.clone(),
        }))
    }
}

pub struct JwtMiddlewareService<S> {
    service: Rc<S>,
    jwt_config: JwtSettings,
    store: Arc<dyn UserStore>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
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
        let token = extract_access_token(&req);
        let service = self.service.clone();
        let store = self.store.clone();
        let jwt_config = self.jwt_config.clone();

        Box::pin(async move {
            let user = authenticate(store.as_ref(), token.as_deref(), &jwt_config).await?;

            tracing::debug!(
                user_id = %user.id,
                username = %user.username,
                "Access token validated"
            );

            req.extensions_mut().insert(AuthenticatedUser::new(user));
            service.call(req).await
        })
    }
}
