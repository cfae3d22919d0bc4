use actix_web::HttpResponse;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }
}

impl From<DieselError> for AppError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                AppError::Validation(format!("{} already exists", info.message()))
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for AppError {
    fn from(e: r2d2::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Unauthorized => HttpResponse::Unauthorized().json(serde_json::json!({
                "error": self.to_string()
            })),
            AppError::Forbidden => HttpResponse::Forbidden().json(serde_json::json!({
                "error": self.to_string()
            })),
            AppError::Validation(_) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": self.to_string()
            })),
            AppError::NotFound(_) => HttpResponse::NotFound().json(serde_json::json!({
                "error": self.to_string()
            })),
            // Internal detail stays in the logs; the caller gets a safe message.
            AppError::Internal(detail) => {
                log::error!("internal error: {}", detail);
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Internal server error"
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::ResponseError;

    #[test]
    fn unauthorized_returns_401() {
        assert_eq!(
            AppError::Unauthorized.error_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn forbidden_returns_403() {
        assert_eq!(
            AppError::Forbidden.error_response().status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn validation_returns_400() {
        let err = AppError::validation("no fields to update");
        assert_eq!(err.error_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "no fields to update");
    }

    #[test]
    fn not_found_returns_404() {
        let err = AppError::NotFound("Order");
        assert_eq!(err.error_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Order not found");
    }

    #[test]
    fn internal_error_returns_500_with_safe_message() {
        let err = AppError::Internal("connection refused".to_string());
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unique_violation_maps_to_validation() {
        let db_err = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("users_email_key".to_string()),
        );
        let app_err: AppError = db_err.into();
        assert!(matches!(app_err, AppError::Validation(_)));
    }

    #[test]
    fn other_diesel_error_maps_to_internal() {
        let app_err: AppError = DieselError::NotFound.into();
        assert!(matches!(app_err, AppError::Internal(_)));
    }
}
