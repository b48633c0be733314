use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;

/// The resolved identity of an authenticated request.
///
/// `AuthGate` inserts this into request extensions after validating the
/// bearer token and resolving its subject to a stored user. Handlers that
/// require identity take `CurrentUser` as an argument; the extractor is the
/// rejection point for unauthenticated requests, since the gate itself never
/// rejects.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl FromRequest for CurrentUser {
    type Error = ActixError; // AppError will be converted into ActixError via ResponseError
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<CurrentUser>().cloned() {
            Some(user) => ready(Ok(user)),
            None => {
                // The gate left the request unauthenticated: missing, malformed,
                // expired or mismatched token. The response is uniform.
                let err = AppError::Unauthorized("Authentication required".to_string());
                ready(Err(err.into()))
            }
        }
    }
}
