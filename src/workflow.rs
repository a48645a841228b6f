use std::sync::Arc;

use serde::Serialize;

use crate::carrier::CarrierApi;
use crate::error::ShippingError;
use crate::models::{DocStatus, ShipmentFields, ShipmentResult, ShippingStatus, TrackingStatus};
use crate::shopify::{ShopifySync, SyncOutcome};
use crate::store::NoteStore;

/// Orchestrates label creation: validation, carrier call, persistence, and
/// the best-effort Shopify sync.
pub struct ShipmentService {
    store: Arc<dyn NoteStore>,
    carrier: Arc<dyn CarrierApi>,
    shopify: Arc<ShopifySync>,
}

impl ShipmentService {
    pub fn new(
        store: Arc<dyn NoteStore>,
        carrier: Arc<dyn CarrierApi>,
        shopify: Arc<ShopifySync>,
    ) -> Self {
        Self {
            store,
            carrier,
            shopify,
        }
    }

    /// Create a shipment for a submitted delivery note.
    ///
    /// The note must not already carry a tracking number; a carrier failure
    /// leaves it untouched. A failed Shopify sync is reported as an advisory
    /// and never rolls the shipment back.
    pub async fn create_shipment(&self, note_id: &str) -> Result<ShipmentResult, ShippingError> {
        let note = self
            .store
            .get_note(note_id)
            .await?
            .ok_or_else(|| ShippingError::NotFound(format!("Delivery Note {note_id}")))?;

        if note.docstatus != DocStatus::Submitted {
            return Err(ShippingError::validation("Delivery Note must be submitted"));
        }

        if let Some(existing) = &note.tracking_number {
            return Err(ShippingError::validation(format!(
                "Shipment already exists: {existing}"
            )));
        }

        let address = match note.shipping_address.as_deref() {
            Some(address_id) => self.store.get_address(address_id).await?,
            None => None,
        };
        let country_code = match &address {
            Some(address) => self.store.country_code(&address.country).await?,
            None => None,
        };

        let result = self
            .carrier
            .create_shipment(&note, address.as_ref(), country_code.as_deref())
            .await?;

        let fields = ShipmentFields {
            carrier: self.carrier.name().to_string(),
            tracking_number: result.tracking_number.clone(),
            label_url: result.label_url.clone(),
            shipping_status: ShippingStatus::LabelCreated,
        };
        self.store.apply_shipment(&note.id, &fields).await?;

        if let Some(order_id) = note.shopify_order_id.as_deref().filter(|id| !id.is_empty()) {
            match self
                .shopify
                .sync(order_id, self.carrier.name(), &result.tracking_number)
                .await
            {
                SyncOutcome::Synced | SyncOutcome::Skipped(_) => {}
                SyncOutcome::Failed(_) => {
                    tracing::warn!(
                        note_id = %note.id,
                        "Shopify sync pending, manual update may be needed"
                    );
                }
            }
        }

        tracing::info!(
            note_id = %note.id,
            tracking_number = %result.tracking_number,
            "Shipment created"
        );

        Ok(result)
    }

    /// Create shipments for a batch of notes; one bad note never blocks the rest.
    pub async fn bulk_create_shipments(&self, note_ids: &[String]) -> BulkReport {
        let mut report = BulkReport::default();

        for note_id in note_ids {
            match self.create_shipment(note_id).await {
                Ok(result) => report.success.push(BulkSuccess {
                    note_id: note_id.clone(),
                    tracking_number: result.tracking_number,
                }),
                Err(err) => report.errors.push(BulkFailure {
                    note_id: note_id.clone(),
                    error: err.to_string(),
                }),
            }
        }

        report
    }

    /// Host-facing tracking lookup; carrier-side polling is not implemented yet.
    pub fn get_tracking_status(&self, tracking_number: &str) -> TrackingStatus {
        TrackingStatus {
            tracking_number: tracking_number.to_string(),
            status: "unknown".to_string(),
        }
    }
}

/// Partitioned result of a bulk creation run.
#[derive(Debug, Default, Serialize)]
pub struct BulkReport {
    pub success: Vec<BulkSuccess>,
    pub errors: Vec<BulkFailure>,
}

#[derive(Debug, Serialize)]
pub struct BulkSuccess {
    #[serde(rename = "order")]
    pub note_id: String,
    pub tracking_number: String,
}

#[derive(Debug, Serialize)]
pub struct BulkFailure {
    #[serde(rename = "order")]
    pub note_id: String,
    pub error: String,
}
