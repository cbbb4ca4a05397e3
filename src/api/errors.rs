use actix_web::{http::StatusCode, HttpResponse, ResponseError};

use crate::enrichment::EnrichmentError;
use crate::service::OrderServiceError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("request deadline exceeded")]
    Timeout,

    #[error(transparent)]
    Service(#[from] OrderServiceError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Service(err) => match err {
                OrderServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                OrderServiceError::Rejected(_)
                | OrderServiceError::Enrichment(
                    EnrichmentError::InsufficientStock { .. } | EnrichmentError::PriceOverflow(_),
                ) => StatusCode::UNPROCESSABLE_ENTITY,
                OrderServiceError::Enrichment(
                    EnrichmentError::StockCheck { .. } | EnrichmentError::Pricing { .. },
                ) => StatusCode::BAD_GATEWAY,
                OrderServiceError::Enrichment(EnrichmentError::Dispatch)
                | OrderServiceError::Persistence { .. }
                | OrderServiceError::Publish { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string(),
        }))
    }
}
