//! Request extractors.

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::errors::{AppError, AppResult};
use crate::utils::first_message;

/// JSON body extractor whose rejections use the standard error envelope.
///
/// Only the body shape is checked here; field-level rules are applied with
/// [`validate_request`] once the handler knows the request may proceed.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(AppError::Validation(rejection.body_text())),
        }
    }
}

/// Runs `validator` rules, mapping the first failure to [`AppError::Validation`].
pub fn validate_request<T: Validate>(req: &T) -> AppResult<()> {
    req.validate()
        .map_err(|errors| AppError::Validation(first_message(&errors)))
}
