//! Request extractors: bearer authentication, and query/path wrappers whose
//! rejections use the JSON error envelope.

use super::error::ApiError;
use crate::auth::{bearer_token, Authenticator, Principal};
use axum::extract::{FromRef, FromRequestParts, Path, Query};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// [`Query`] that rejects with a 400 `{error, details}` body.
#[derive(Clone, Debug)]
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(QueryParams(params))
    }
}

/// [`Path`] that rejects with a 400 `{error, details}` body.
#[derive(Clone, Debug)]
pub struct PathParam<T>(pub T);

impl<T, S> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(param) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(PathParam(param))
    }
}

/// The authenticated caller of a request.
///
/// Rejects with 401 when no `Authorization` header is present and with 403
/// when the header is malformed or the token does not validate.
#[derive(Clone, Debug)]
pub struct AuthUser(pub Principal);

impl<S> FromRequestParts<S> for AuthUser
where
    Arc<dyn Authenticator>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let authenticator = Arc::<dyn Authenticator>::from_ref(state);

        let header = match parts.headers.get(AUTHORIZATION) {
            Some(value) => Some(value.to_str().map_err(|_| {
                ApiError(crate::Error::InvalidToken(
                    "Authorization header is not valid UTF-8".to_string(),
                ))
            })?),
            None => None,
        };

        let token = bearer_token(header)?;
        let principal = authenticator.validate(token)?;
        Ok(AuthUser(principal))
    }
}
