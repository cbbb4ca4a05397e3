use crate::domain::order::{OrderError, Transition};
use crate::enrichment::EnrichmentError;
use crate::messaging::PublishError;
use crate::store::StoreError;

// ============================================================================
// Order Service Errors - terminal failure of one request
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderServiceError {
    #[error(transparent)]
    Enrichment(#[from] EnrichmentError),

    #[error(transparent)]
    Rejected(#[from] OrderError),

    #[error("order with ID {0} not found")]
    NotFound(i64),

    /// `order_id` is absent only for a create that never got an identity
    #[error("failed to persist order{}: {source}", order_label(.order_id))]
    Persistence {
        order_id: Option<i64>,
        #[source]
        source: StoreError,
    },

    /// The order was persisted but its event was not delivered
    #[error("failed to publish order {transition} event for order ID {order_id}: {source}")]
    Publish {
        order_id: i64,
        transition: Transition,
        #[source]
        source: PublishError,
    },
}

impl OrderServiceError {
    /// Stable label for metrics and API mapping
    pub fn kind(&self) -> &'static str {
        match self {
            OrderServiceError::Enrichment(EnrichmentError::InsufficientStock { .. }) => {
                "insufficient_stock"
            }
            OrderServiceError::Enrichment(EnrichmentError::PriceOverflow(_)) => "price_overflow",
            OrderServiceError::Enrichment(EnrichmentError::Dispatch) => "internal",
            OrderServiceError::Enrichment(_) => "gateway_error",
            OrderServiceError::Rejected(_) => "rejected",
            OrderServiceError::NotFound(_) => "not_found",
            OrderServiceError::Persistence { .. } => "persistence_error",
            OrderServiceError::Publish { .. } => "publish_error",
        }
    }
}

fn order_label(order_id: &Option<i64>) -> String {
    order_id.map(|id| format!(" with ID {id}")).unwrap_or_default()
}
