// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Aggregates and their rules. Kept free of gateway, storage and bus
// concerns so the service layer can sequence them explicitly.
//
// ============================================================================

pub mod order;
