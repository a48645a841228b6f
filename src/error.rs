use thiserror::Error;

/// Errors surfaced by the connector.
///
/// Fulfillment-sync problems are intentionally not represented here: the sync
/// step reports a [`crate::shopify::SyncOutcome`] instead, because it must
/// never fail a shipment that was already created.
#[derive(Debug, Error)]
pub enum ShippingError {
    /// A precondition on the delivery note or its address was not met.
    #[error("{0}")]
    Validation(String),

    /// The carrier call failed or its response could not be used.
    #[error("GLS error: {0}")]
    Carrier(String),

    /// The referenced document does not exist in the store.
    #[error("not found: {0}")]
    NotFound(String),

    /// The document store itself failed.
    #[error("store error: {0}")]
    Store(String),
}

impl ShippingError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn carrier(msg: impl Into<String>) -> Self {
        Self::Carrier(msg.into())
    }
}
