//! Mapping of crate errors onto JSON error responses.

use crate::error::Error;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub const MISSING_TOKEN: &str = "Token de acesso necessário";
pub const INVALID_TOKEN: &str = "Token inválido";
pub const INVALID_PARAMETERS: &str = "Parâmetros inválidos";
pub const UPSTREAM_FAILED: &str = "Erro ao buscar dados do catálogo";
pub const INTERNAL_ERROR: &str = "Erro interno do servidor";
pub const ROUTE_NOT_FOUND: &str = "Rota não encontrada";

/// Error body: `{error, details?}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// An [`Error`] on its way to the client.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(Error::BadRequest(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError(Error::BadRequest(rejection.body_text()))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn body(&self) -> ErrorBody {
        let (error, details) = match &self.0 {
            Error::Unauthenticated => (MISSING_TOKEN.to_string(), None),
            Error::InvalidToken(_) => (INVALID_TOKEN.to_string(), None),
            Error::BadRequest(detail) => (INVALID_PARAMETERS.to_string(), Some(detail.clone())),
            Error::Forbidden(msg) | Error::NotFound(msg) => (msg.clone(), None),
            Error::UpstreamUnavailable(detail) => {
                (UPSTREAM_FAILED.to_string(), Some(detail.clone()))
            }
            _ => (INTERNAL_ERROR.to_string(), None),
        };
        ErrorBody { error, details }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{} -> {}", self.0, status);
        } else {
            warn!("{} -> {}", self.0, status);
        }

        (status, Json(self.body())).into_response()
    }
}
