mod errors;
mod order_service;

pub use errors::OrderServiceError;
pub use order_service::OrderService;
