use std::sync::Arc;

use crate::carrier::CarrierApi;
use crate::error::ShippingError;
use crate::models::ShippingStatus;
use crate::store::NoteStore;

/// Maximum notes examined per sweep.
pub const SWEEP_BATCH_SIZE: usize = 100;

/// Scheduled sweep that re-queries carrier status for open shipments.
pub struct TrackingPoller {
    store: Arc<dyn NoteStore>,
    gls: Arc<dyn CarrierApi>,
}

impl TrackingPoller {
    pub fn new(store: Arc<dyn NoteStore>, gls: Arc<dyn CarrierApi>) -> Self {
        Self { store, gls }
    }

    /// One sweep over the open shipments.
    ///
    /// Per-note failures are logged and skipped; the changed statuses that
    /// did accumulate are committed in a single batch at the end.
    pub async fn run(&self) -> Result<(), ShippingError> {
        let shipments = self.store.list_open_shipments(SWEEP_BATCH_SIZE).await?;
        if shipments.is_empty() {
            return Ok(());
        }

        tracing::debug!(count = shipments.len(), "tracking sweep started");

        let mut updates: Vec<(String, ShippingStatus)> = Vec::new();
        for shipment in &shipments {
            let carrier = shipment.carrier.as_deref().unwrap_or("GLS");
            match self.lookup(carrier, &shipment.tracking_number).await {
                Ok(Some(status)) if Some(status) != shipment.shipping_status => {
                    tracing::info!(
                        note_id = %shipment.note_id,
                        %status,
                        "tracking status updated"
                    );
                    updates.push((shipment.note_id.clone(), status));
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(
                        note_id = %shipment.note_id,
                        error = %err,
                        "tracking update failed"
                    );
                }
            }
        }

        if !updates.is_empty() {
            self.store.apply_status_updates(&updates).await?;
        }

        Ok(())
    }

    /// Dispatch by carrier name; only GLS is recognized, everything else
    /// yields no update.
    async fn lookup(
        &self,
        carrier: &str,
        tracking_number: &str,
    ) -> Result<Option<ShippingStatus>, ShippingError> {
        match carrier {
            "GLS" => self.gls.fetch_tracking_status(tracking_number).await,
            _ => Ok(None),
        }
    }
}
