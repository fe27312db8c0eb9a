//! Caller identity
//!
//! The caller is named by the `x-user-id` header. There is no credential
//! check; the header is trusted as sent.

use crate::errors::ApiError;
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use elosya_ledger::UserId;
use std::future::{ready, Ready};

/// Header carrying the caller's user ID
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated caller, extracted from [`USER_ID_HEADER`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub UserId);

impl Caller {
    pub fn into_inner(self) -> UserId {
        self.0
    }
}

impl FromRequest for Caller {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(caller_from(req))
    }
}

fn caller_from(req: &HttpRequest) -> Result<Caller, ApiError> {
    let value = req
        .headers()
        .get(USER_ID_HEADER)
        .ok_or_else(|| ApiError::Unauthorized(format!("missing {} header", USER_ID_HEADER)))?;

    let user_id = value
        .to_str()
        .map_err(|_| ApiError::Unauthorized(format!("invalid {} header", USER_ID_HEADER)))?
        .trim();

    if user_id.is_empty() {
        return Err(ApiError::Unauthorized(format!(
            "empty {} header",
            USER_ID_HEADER
        )));
    }

    Ok(Caller(UserId::new(user_id)))
}
