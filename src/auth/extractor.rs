use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use log::warn;

use super::jwt::{Claims, JwtKeys, TokenError, TokenType};
use crate::error::ApiError;

// Identity carried by a valid access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
}

// Identity carried by a valid refresh token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshIdentity {
    pub user_id: i64,
}

pub fn bearer_token(req: &HttpRequest) -> Result<&str, TokenError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(TokenError::Missing)?
        .to_str()
        .map_err(|_| TokenError::Malformed)?;
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(TokenError::Malformed)
}

fn claims_from_request(req: &HttpRequest, expected: TokenType) -> Result<Claims, ApiError> {
    let keys = req
        .app_data::<web::Data<JwtKeys>>()
        .ok_or_else(|| ApiError::Internal("JWT keys are not configured".into()))?;
    let token = bearer_token(req).map_err(|e| ApiError::Unauthorized(e.to_string()))?;
    keys.verify(token, expected).map_err(|e| {
        warn!("Rejected token on {}: {}", req.path(), e);
        ApiError::Unauthorized(e.to_string())
    })
}

fn user_id_of(claims: &Claims) -> Result<i64, ApiError> {
    claims
        .user_id()
        .ok_or_else(|| ApiError::Unauthorized(TokenError::BadSubject.to_string()))
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            claims_from_request(req, TokenType::Access)
                .and_then(|claims| user_id_of(&claims))
                .map(|user_id| AuthenticatedUser { user_id }),
        )
    }
}

impl FromRequest for RefreshIdentity {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            claims_from_request(req, TokenType::Refresh)
                .and_then(|claims| user_id_of(&claims))
                .map(|user_id| RefreshIdentity { user_id }),
        )
    }
}
