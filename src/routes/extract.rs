//! Extractors that answer malformed requests in the API's own error format.

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Path, Request,
        rejection::{JsonRejection, PathRejection},
    },
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{AppError, PromoError};

/// `Json<T>` whose rejections become [`AppError::BadRequest`].
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|err| AppError::BadRequest(err.body_text()))?;
        Ok(AppJson(value))
    }
}

/// `Path<T>` whose rejections (e.g. a malformed UUID segment) become
/// [`AppError::BadRequest`].
pub struct AppPath<T>(pub T);

impl<S, T> FromRequestParts<S> for AppPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|err: PathRejection| AppError::BadRequest(err.body_text()))?;
        Ok(AppPath(value))
    }
}

/// `Json<T>` whose rejections become a `{"status":"invalid"}` promo response.
pub struct PromoJson<T>(pub T);

impl<S, T> FromRequest<S> for PromoJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = PromoError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|err| {
            debug!(error = %err.body_text(), "rejected promo request body");
            PromoError::Invalid
        })?;
        Ok(PromoJson(value))
    }
}
