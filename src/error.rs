//! Application error taxonomy and its HTTP mapping.

use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::auth::AuthError;
use crate::invoice::validation::ValidationErrors;
use crate::pdf::PdfError;
use crate::render::RenderError;
use crate::ErrorResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(ValidationErrors),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Too many requests, please try again later")]
    RateLimited { retry_after_secs: u64 },
    #[error("Template '{0}' not found")]
    TemplateNotFound(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Template rendering failed: {0}")]
    Render(RenderError),
    #[error("PDF generation failed: {0}")]
    Pdf(#[from] PdfError),
    #[error("Database error: {0}")]
    Persistence(#[from] sqlx::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<RenderError> for AppError {
    fn from(error: RenderError) -> Self {
        match error {
            RenderError::TemplateNotFound(name) => AppError::TemplateNotFound(name),
            other => AppError::Render(other),
        }
    }
}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "ValidationError",
            AppError::Auth(AuthError::Missing) => "Unauthorized",
            AppError::Auth(AuthError::Invalid) => "Forbidden",
            AppError::Auth(AuthError::NotConfigured) => "ServerMisconfigured",
            AppError::RateLimited { .. } => "TooManyRequests",
            AppError::TemplateNotFound(_) | AppError::NotFound(_) => "NotFound",
            AppError::BadRequest(_) => "BadRequest",
            AppError::Render(_) | AppError::Pdf(_) => "RenderFailure",
            AppError::Persistence(_) | AppError::Io(_) => "InternalServerError",
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Validation(errors) => errors.summary(),
            AppError::Persistence(_) => "Database operation failed".to_string(),
            AppError::Io(_) => "File operation failed".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(AuthError::Missing) => StatusCode::UNAUTHORIZED,
            AppError::Auth(AuthError::Invalid) => StatusCode::FORBIDDEN,
            AppError::Auth(AuthError::NotConfigured) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::TemplateNotFound(_) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Render(_) | AppError::Pdf(_) | AppError::Persistence(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        }

        let mut body = ErrorResponse::new(self.kind(), &self.public_message());
        if let AppError::Validation(errors) = self {
            body = body.with_details(errors.errors().to_vec());
        }

        let mut response = HttpResponse::build(status);
        if let AppError::RateLimited { retry_after_secs } = self {
            response.insert_header((header::RETRY_AFTER, retry_after_secs.to_string()));
        }
        response.json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::validation::ValidationError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::from(AuthError::Missing).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(AuthError::Invalid).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::from(AuthError::NotConfigured).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(RenderError::TemplateNotFound("x".into())).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(PdfError::EmptyOutput).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_error_carries_details() {
        let errors = ValidationErrors::from(ValidationError::empty_field(
            "customer.name",
            "Customer name",
        ));
        let response = AppError::from(errors).error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = AppError::RateLimited {
            retry_after_secs: 42,
        }
        .error_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(header::RETRY_AFTER).unwrap(),
            "42"
        );
    }

    #[test]
    fn test_persistence_details_are_not_leaked() {
        let error = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(error.public_message(), "Database operation failed");
    }
}
