use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::WithRejection;
use bazar_types::api::MessageOnly;
use rusqlite::ErrorCode;
use tracing::{error, warn};

/// JSON body extractor that reports malformed input as [`ApiError::Validation`].
pub type JsonBody<T> = WithRejection<Json<T>, ApiError>;

/// Path extractor with the same rejection mapping.
pub type PathParam<T> = WithRejection<axum::extract::Path<T>, ApiError>;

/// Query extractor with the same rejection mapping.
pub type QueryParams<T> = WithRejection<axum::extract::Query<T>, ApiError>;

/// Every failure a request can end in. Messages are user facing.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// A write was refused by the store, e.g. a unique constraint.
    #[error("{0}")]
    Persistence(String),

    #[error("internal error: {0:#}")]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Persistence(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let constraint = err.chain().find_map(|cause| match cause.downcast_ref::<rusqlite::Error>() {
            Some(rusqlite::Error::SqliteFailure(e, detail))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                Some(detail.clone().unwrap_or_else(|| e.to_string()))
            }
            _ => None,
        });

        match constraint {
            Some(detail) => {
                warn!("Constraint violation: {}", detail);
                Self::Persistence(format!("No se pudo guardar el registro: {}", detail))
            }
            None => Self::Internal(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(format!("Cuerpo de la petición no válido: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(format!("Ruta no válida: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(format!("Parámetros de búsqueda no válidos: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Internal(err) => {
                error!("Request failed: {:#}", err);
                "Error interno del servidor".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(MessageOnly::new(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn unique_violation_becomes_persistence_error() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (email TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err = conn.execute("INSERT INTO t VALUES ('a')", []).unwrap_err();

        let api: ApiError = anyhow::Error::from(err).into();
        assert!(matches!(api, ApiError::Persistence(_)));
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn other_failures_are_internal() {
        let api: ApiError = anyhow::anyhow!("disk on fire").into();
        assert!(matches!(api, ApiError::Internal(_)));
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
