//! HTTP error responses.
//!
//! Every failure leaves a handler as an [`ApiError`], which renders as
//! `{"error": CODE, "message": ...}` with the status of the wrapped
//! [`AppError`].

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use orderdesk_core::currency::ConversionOverflow;
use orderdesk_core::invoice::InvoiceError;
use orderdesk_core::order::{LineItemError, StatusParseError};
use orderdesk_core::storage::StorageError;
use orderdesk_db::repositories::{CustomerError, OrderError, ProductError};
use orderdesk_shared::AppError;
use orderdesk_shared::types::CurrencyCodeError;
use sea_orm::DbErr;
use serde_json::json;
use tracing::error;

/// Error type returned by handlers.
#[derive(Debug)]
pub struct ApiError(pub AppError);

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// 400 with `message`.
    pub fn validation(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }

    /// 404 with `message`.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self(AppError::NotFound(message.into()))
    }

    /// 403 with `message`.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self(AppError::Forbidden(message.into()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = if self.0.is_client_visible() {
            self.0.to_string()
        } else {
            error!(error = %self.0, "Request failed");
            "An error occurred".to_string()
        };

        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": message,
            })),
        )
            .into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self(AppError::Database(err.to_string()))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::validation(err.body_text())
    }
}

impl From<CurrencyCodeError> for ApiError {
    fn from(err: CurrencyCodeError) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<StatusParseError> for ApiError {
    fn from(err: StatusParseError) -> Self {
        Self::validation(err.to_string())
    }
}

/// Line items sent by a client are a bad request.
impl From<LineItemError> for ApiError {
    fn from(err: LineItemError) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        let app = match err {
            StorageError::NotFound { key } => AppError::NotFound(format!("file {key}")),
            StorageError::FileTooLarge { .. }
            | StorageError::InvalidMimeType { .. }
            | StorageError::InvalidKey(_) => AppError::Validation(err.to_string()),
            StorageError::Configuration(_) => AppError::Unavailable(err.to_string()),
            StorageError::Operation(_) => AppError::Internal(err.to_string()),
        };
        Self(app)
    }
}

impl From<InvoiceError> for ApiError {
    fn from(err: InvoiceError) -> Self {
        match err {
            InvoiceError::UnresolvableLineItem { .. } => Self(AppError::BusinessRule {
                code: "UNRESOLVABLE_LINE_ITEM",
                message: err.to_string(),
            }),
            InvoiceError::TooManyLines { .. } => Self(AppError::BusinessRule {
                code: "INVOICE_TOO_LARGE",
                message: err.to_string(),
            }),
            InvoiceError::PriceOverflow { .. } | InvoiceError::TotalOverflow => {
                Self(AppError::BusinessRule {
                    code: "PRICE_OVERFLOW",
                    message: err.to_string(),
                })
            }
            // Stored line items that no longer decode.
            InvoiceError::LineItems(_) => Self(AppError::BusinessRule {
                code: "INVALID_LINE_ITEMS",
                message: err.to_string(),
            }),
            InvoiceError::Catalog(_) => Self(AppError::Database(err.to_string())),
            InvoiceError::Template(_) | InvoiceError::Render(_) => {
                Self(AppError::Internal(err.to_string()))
            }
            InvoiceError::Storage(inner) => inner.into(),
        }
    }
}

impl From<ConversionOverflow> for ApiError {
    fn from(err: ConversionOverflow) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<CustomerError> for ApiError {
    fn from(err: CustomerError) -> Self {
        match err {
            CustomerError::NotFound(_) => Self::not_found(err.to_string()),
            CustomerError::CompanyRequired => Self::validation(err.to_string()),
            CustomerError::Database(e) => e.into(),
        }
    }
}

impl From<ProductError> for ApiError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::NotFound(_) => Self::not_found(err.to_string()),
            ProductError::DuplicateId(_) => Self(AppError::Conflict(err.to_string())),
            ProductError::Invalid(_) => Self::validation(err.to_string()),
            ProductError::Database(e) => e.into(),
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound(_) => Self::not_found(err.to_string()),
            OrderError::CustomerNotFound(_) => Self::validation(err.to_string()),
            OrderError::DuplicateId(_) => Self(AppError::Conflict(err.to_string())),
            OrderError::Database(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parts(err: ApiError) -> (u16, &'static str) {
        (err.0.status_code(), err.0.error_code())
    }

    #[rstest]
    #[case(InvoiceError::unresolvable("GONE"), 422, "UNRESOLVABLE_LINE_ITEM")]
    #[case(InvoiceError::TooManyLines { count: 12, capacity: 11 }, 422, "INVOICE_TOO_LARGE")]
    #[case(
        InvoiceError::LineItems(LineItemError::Malformed("eof".into())),
        422,
        "INVALID_LINE_ITEMS"
    )]
    #[case(
        InvoiceError::PriceOverflow { product_id: "BIG".into() },
        422,
        "PRICE_OVERFLOW"
    )]
    #[case(InvoiceError::TotalOverflow, 422, "PRICE_OVERFLOW")]
    #[case(InvoiceError::Catalog("timeout".into()), 500, "DATABASE_ERROR")]
    #[case(InvoiceError::Render("zip".into()), 500, "INTERNAL_ERROR")]
    fn test_invoice_error_mapping(
        #[case] err: InvoiceError,
        #[case] status: u16,
        #[case] code: &str,
    ) {
        assert_eq!(parts(err.into()), (status, code));
    }

    #[test]
    fn test_client_line_items_are_bad_request() {
        let err: ApiError = LineItemError::EmptyProductId.into();
        assert_eq!(parts(err), (400, "VALIDATION_ERROR"));
    }

    #[rstest]
    #[case(StorageError::not_found("a/b.png"), 404)]
    #[case(StorageError::file_too_large(10, 5), 400)]
    #[case(StorageError::invalid_mime_type("text/plain"), 400)]
    #[case(StorageError::configuration("no root"), 503)]
    #[case(StorageError::Operation("io".into()), 500)]
    fn test_storage_error_status(#[case] err: StorageError, #[case] status: u16) {
        assert_eq!(ApiError::from(err).0.status_code(), status);
    }

    #[test]
    fn test_repository_errors() {
        assert_eq!(
            parts(ProductError::DuplicateId("P1".into()).into()),
            (409, "CONFLICT")
        );
        assert_eq!(
            parts(OrderError::NotFound("2025010001".into()).into()),
            (404, "NOT_FOUND")
        );
        assert_eq!(
            parts(CustomerError::CompanyRequired.into()),
            (400, "VALIDATION_ERROR")
        );
    }

    #[tokio::test]
    async fn test_response_hides_internal_details() {
        use http_body_util::BodyExt;

        let response = ApiError(AppError::Database("password authentication failed".into()))
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "DATABASE_ERROR");
        assert_eq!(json["message"], "An error occurred");
    }
}
