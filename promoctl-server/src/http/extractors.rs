//! Custom Axum extractors
//!
//! [`Bound`] resolves a path id to its row before the handler body runs,
//! so every handler taking one can assume the resource exists.

use std::sync::Arc;

use axum::extract::{FromRequest, FromRequestParts, Json, Path, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::server::AppState;
use crate::db::repos::{self, Resource};

/// Row resolved from the `{id}` path segment; 404 if absent
pub struct Bound<T>(pub T);

impl<T> FromRequestParts<Arc<AppState>> for Bound<T>
where
    T: Resource,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::NotFound {
                resource: T::NAME,
                id: String::new(),
            })?;

        // A non-numeric id can never match a row
        let id: i64 = raw.parse().map_err(|_| ApiError::NotFound {
            resource: T::NAME,
            id: raw.clone(),
        })?;

        let row = repos::find::<T>(&state.pool, id).await?;
        Ok(Self(row))
    }
}

/// JSON body whose rejections use the validation envelope
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}
