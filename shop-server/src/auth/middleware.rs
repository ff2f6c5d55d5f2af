//! Authentication middleware
//!
//! Axum middleware for bearer-token authentication and role checks.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;
use shared::{AppError, ErrorCode};

/// Resolve the bearer token of a request into a [`CurrentUser`]
///
/// `Ok(None)` when no `Authorization` header is present.
pub(crate) fn authenticate(
    jwt: &JwtService,
    headers: &http::HeaderMap,
    uri: &http::Uri,
) -> Result<Option<CurrentUser>, AppError> {
    let Some(header) = headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    else {
        return Ok(None);
    };

    let token = JwtService::extract_from_header(header)
        .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?;

    let claims = jwt.validate_access_token(token).map_err(|e| {
        security_log!(
            "WARN",
            "auth_failed",
            error = e.to_string(),
            uri = uri.to_string()
        );
        match e {
            JwtError::ExpiredToken => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid token"),
        }
    })?;

    CurrentUser::try_from(claims)
        .map(Some)
        .map_err(|e| AppError::invalid_token(format!("Malformed token claims: {e}")))
}

/// Require a valid access token
///
/// Inserts the [`CurrentUser`] into the request extensions.
///
/// | Failure | Code |
/// |---------|------|
/// | No `Authorization` header | `NotAuthenticated` |
/// | Expired token | `TokenExpired` |
/// | Anything else | `TokenInvalid` |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    match authenticate(&state.jwt_service, req.headers(), req.uri())? {
        Some(user) => {
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        None => {
            security_log!("WARN", "auth_missing", uri = req.uri().to_string());
            Err(AppError::not_authenticated())
        }
    }
}

/// Attach the caller when a valid bearer is present; never rejects
pub async fn optional_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Ok(Some(user)) = authenticate(&state.jwt_service, req.headers(), req.uri()) {
        req.extensions_mut().insert(user);
    }
    next.run(req).await
}

/// Require the ADMIN role; must run after [`require_auth`]
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(AppError::not_authenticated)?;
    if !user.is_admin() {
        security_log!(
            "WARN",
            "admin_required",
            user_id = user.id.as_str(),
            user_role = user.role.as_str()
        );
        return Err(AppError::new(ErrorCode::AdminRequired));
    }

    Ok(next.run(req).await)
}
