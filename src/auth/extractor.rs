//! Actix-web extractor for the acting user's identity.
//!
//! The caller is identified by a UUID in the `X-Actor-Id` header, set by the
//! gateway that authenticated the request. Authorization (who may verify or
//! delete) is decided upstream; handlers only record who acted.

use std::future::{Ready, ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use uuid::Uuid;

use crate::config::ACTOR_ID_HEADER;
use crate::error::AppError;

/// Identity of the user performing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorIdentity {
    pub user_id: Uuid,
}

impl ActorIdentity {
    /// Parse the identity header value.
    pub fn from_header(value: Option<&str>) -> Result<Self, AppError> {
        let raw = value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Unauthorized(format!("missing {} header", ACTOR_ID_HEADER)))?;

        let user_id = Uuid::parse_str(raw).map_err(|_| {
            AppError::Unauthorized(format!("{} header must be a UUID", ACTOR_ID_HEADER))
        })?;

        Ok(Self { user_id })
    }
}

impl FromRequest for ActorIdentity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let header = req
            .headers()
            .get(ACTOR_ID_HEADER)
            .and_then(|v| v.to_str().ok());
        ready(Self::from_header(header))
    }
}
