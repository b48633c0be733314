use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use sqlx::PgPool;
use std::rc::Rc;

use crate::auth::extractors::CurrentUser;
use crate::auth::token::TokenService;
use crate::models::User;

/// Per-request authentication gate.
///
/// Extracts a bearer token, resolves its subject to a stored user and, when
/// the token validates against that user, attaches a [`CurrentUser`] to the
/// request's extensions. The gate never rejects a request itself: any
/// failure (missing header, malformed token, unknown subject, expired or
/// mismatched token, store error) leaves the request unauthenticated and
/// defers rejection to the handlers' `CurrentUser` extractor.
pub struct AuthGate;

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthGateService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGateService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthGateService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthGateService<S>
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
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            authenticate(&req).await;
            service.call(req).await
        })
    }
}

/// Attempts to establish request identity. Populates extensions on success,
/// does nothing on any failure.
async fn authenticate(req: &ServiceRequest) {
    let token = match bearer_token(req) {
        Some(token) => token,
        None => {
            log::debug!("no bearer credential on {}", req.path());
            return;
        }
    };

    let (pool, tokens) = match (
        req.app_data::<web::Data<PgPool>>(),
        req.app_data::<web::Data<TokenService>>(),
    ) {
        (Some(pool), Some(tokens)) => (pool, tokens),
        _ => {
            log::error!("auth gate is missing pool or token service app data");
            return;
        }
    };

    let subject = match tokens.extract_subject(&token) {
        Ok(subject) => subject,
        Err(e) => {
            log::debug!("malformed token on {}: {}", req.path(), e);
            return;
        }
    };

    let user = match User::find_by_username(pool.get_ref(), &subject).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            log::debug!("token subject {:?} does not resolve to a user", subject);
            return;
        }
        Err(e) => {
            log::warn!("identity lookup failed for {:?}: {}", subject, e);
            return;
        }
    };

    if tokens.validate(&token, &user.username) {
        log::debug!("authenticated request as {}", user.username);
        req.extensions_mut().insert(CurrentUser {
            id: user.id,
            username: user.username,
            email: user.email,
        });
    } else {
        log::debug!("token validation failed for {}", user.username);
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned)
}
