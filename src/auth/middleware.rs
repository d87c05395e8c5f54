use std::future::{Ready, ready};

use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest, ResponseError,
    body::MessageBody,
    dev::{Payload, ServiceRequest, ServiceResponse},
    middleware::Next,
    web,
};

use crate::auth::principal::Principal;
use crate::auth::token::extract_bearer;
use crate::errors::AppError;
use crate::state::AppState;

/// Middleware function that verifies the bearer token and attaches the
/// principal to the request. Responds 401 before any handler runs when the
/// token is missing, malformed, expired or wrongly signed.
pub async fn require_auth(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let principal = match req.app_data::<web::Data<AppState>>() {
        Some(state) => extract_bearer(req.headers()).and_then(|t| state.tokens.verify(t).ok()),
        None => {
            log::error!("require_auth mounted without application state");
            None
        }
    };

    let Some(principal) = principal else {
        let response = AppError::Unauthenticated.error_response();
        return Ok(req.into_response(response).map_into_right_body());
    };

    req.extensions_mut().insert(principal);
    next.call(req).await.map(|res| res.map_into_left_body())
}

impl FromRequest for Principal {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Principal>()
                .cloned()
                .ok_or(AppError::Unauthenticated),
        )
    }
}
