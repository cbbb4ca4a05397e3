// ============================================================================
// Order Domain - Business Logic for the Order Aggregate
// ============================================================================
//
// - Value objects (OrderStatus, PricingQuote)
// - Aggregate (Order, OrderRequest, totals and status transitions)
// - Commands (CreateOrder, UpdateOrder)
// - Events (Transition, OrderEvent)
// - Errors (OrderError)
//
// No I/O happens in here. Gateways, storage and the bus live in their
// own modules and are sequenced by the service layer.
//
// ============================================================================

pub mod value_objects;
pub mod aggregate;
pub mod commands;
pub mod events;
pub mod errors;

pub use value_objects::*;
pub use aggregate::*;
pub use commands::*;
pub use events::*;
pub use errors::*;
