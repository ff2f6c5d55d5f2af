//! Request extractors that reject with [`AppError`]

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, Query, Request};
use serde::de::DeserializeOwned;
use shared::AppError;
use shared::models::{PageQuery, Pagination};
use validator::Validate;

use crate::utils::validate_payload;

/// JSON body; malformed input becomes `InvalidRequest`
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| AppError::invalid_request(e.body_text()))?;
        Ok(Self(value))
    }
}

/// JSON body checked with `validator`
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let JsonBody(value) = JsonBody::<T>::from_request(req, state).await?;
        validate_payload(&value)?;
        Ok(Self(value))
    }
}

/// Normalized pagination; unparsable parameters fall back to the defaults
pub fn pagination(query: Result<Query<PageQuery>, QueryRejection>) -> Pagination {
    query.map(|Query(q)| q).unwrap_or_default().into()
}
