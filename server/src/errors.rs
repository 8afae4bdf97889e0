use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("only GET is supported here")]
    MethodNotAllowed,

    #[error("invalid {name} value {value:?}: {reason}")]
    BadParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("archive error: {0}")]
    Archive(String),

    #[error("internal server error: {0}")]
    InternalServerError(String),
}

/// Helper for mapping any unknown error into internal error
pub fn internal_error<E: ToString>(err: E) -> AppError {
    AppError::InternalServerError(err.to_string())
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        // Choose status codes per variant
        let status = match self {
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::BadParameter { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Archive(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Endpoint contract wants plain text, not JSON
        let body = format!("{self}\n");

        if matches!(self, AppError::MethodNotAllowed) {
            (status, [(header::ALLOW, "GET")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_parameter_names_the_offender() {
        let err = AppError::BadParameter {
            name: "begin",
            value: "yesterdayish".to_string(),
            reason: "unrecognized date/time expression".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("begin"));
        assert!(message.contains("yesterdayish"));
    }

    #[test]
    fn method_not_allowed_maps_to_405() {
        let response = AppError::MethodNotAllowed.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            response.headers().get(header::ALLOW).unwrap(),
            "GET"
        );
    }
}
