use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::ShippingError;
use crate::models::{Address, DeliveryNote, DocStatus, OpenShipment, ShipmentFields, ShippingStatus};

/// Access to the ERP document store.
///
/// The ERP owns the schema; the connector only reads notes and addresses and
/// writes the shipping fields back.
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn get_note(&self, note_id: &str) -> Result<Option<DeliveryNote>, ShippingError>;

    async fn get_address(&self, address_id: &str) -> Result<Option<Address>, ShippingError>;

    /// Resolve a country name to its ISO code via the ERP reference table.
    async fn country_code(&self, country: &str) -> Result<Option<String>, ShippingError>;

    /// Persist carrier, tracking number, label URL and status in one update.
    ///
    /// Must reject the write when the note already carries a tracking number,
    /// so that two racing creation calls cannot both persist a shipment.
    async fn apply_shipment(
        &self,
        note_id: &str,
        fields: &ShipmentFields,
    ) -> Result<(), ShippingError>;

    /// Submitted notes with a tracking number and a non-terminal status.
    async fn list_open_shipments(&self, limit: usize)
        -> Result<Vec<OpenShipment>, ShippingError>;

    /// Apply the sweep's accumulated status updates in one commit.
    async fn apply_status_updates(
        &self,
        updates: &[(String, ShippingStatus)],
    ) -> Result<(), ShippingError>;
}

#[derive(Default)]
struct MemoryState {
    notes: HashMap<String, DeliveryNote>,
    addresses: HashMap<String, Address>,
    country_codes: HashMap<String, String>,
}

/// In-memory [`NoteStore`].
///
/// Backs the standalone binary and the tests; hosts embedding the library
/// supply their own store over the real document backend.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let store = Self::default();
        {
            let mut state = store.state.lock().expect("fresh lock");
            for (name, code) in [
                ("Italy", "IT"),
                ("Germany", "DE"),
                ("Austria", "AT"),
                ("France", "FR"),
            ] {
                state.country_codes.insert(name.to_string(), code.to_string());
            }
        }
        store
    }

    pub fn insert_note(&self, note: DeliveryNote) {
        let mut state = self.state.lock().expect("store lock poisoned");
        state.notes.insert(note.id.clone(), note);
    }

    pub fn insert_address(&self, address_id: &str, address: Address) {
        let mut state = self.state.lock().expect("store lock poisoned");
        state.addresses.insert(address_id.to_string(), address);
    }

    pub fn insert_country(&self, name: &str, code: &str) {
        let mut state = self.state.lock().expect("store lock poisoned");
        state.country_codes.insert(name.to_string(), code.to_string());
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, ShippingError> {
        self.state
            .lock()
            .map_err(|_| ShippingError::Store("store lock poisoned".to_string()))
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn get_note(&self, note_id: &str) -> Result<Option<DeliveryNote>, ShippingError> {
        Ok(self.lock()?.notes.get(note_id).cloned())
    }

    async fn get_address(&self, address_id: &str) -> Result<Option<Address>, ShippingError> {
        Ok(self.lock()?.addresses.get(address_id).cloned())
    }

    async fn country_code(&self, country: &str) -> Result<Option<String>, ShippingError> {
        Ok(self.lock()?.country_codes.get(country).cloned())
    }

    async fn apply_shipment(
        &self,
        note_id: &str,
        fields: &ShipmentFields,
    ) -> Result<(), ShippingError> {
        let mut state = self.lock()?;
        let note = state
            .notes
            .get_mut(note_id)
            .ok_or_else(|| ShippingError::NotFound(format!("Delivery Note {note_id}")))?;

        // Conditional write: the tracking number is set at most once.
        if let Some(existing) = &note.tracking_number {
            return Err(ShippingError::validation(format!(
                "Shipment already exists: {existing}"
            )));
        }

        note.carrier = Some(fields.carrier.clone());
        note.tracking_number = Some(fields.tracking_number.clone());
        note.label_url = fields.label_url.clone();
        note.shipping_status = Some(fields.shipping_status);
        note.modified = Some(Utc::now());
        Ok(())
    }

    async fn list_open_shipments(
        &self,
        limit: usize,
    ) -> Result<Vec<OpenShipment>, ShippingError> {
        let state = self.lock()?;
        let mut open: Vec<OpenShipment> = state
            .notes
            .values()
            .filter(|note| {
                note.docstatus == DocStatus::Submitted
                    && note.tracking_number.is_some()
                    && note.shipping_status.is_some_and(|s| !s.is_terminal())
            })
            .map(|note| OpenShipment {
                note_id: note.id.clone(),
                tracking_number: note.tracking_number.clone().unwrap_or_default(),
                carrier: note.carrier.clone(),
                shipping_status: note.shipping_status,
            })
            .collect();
        open.sort_by(|a, b| a.note_id.cmp(&b.note_id));
        open.truncate(limit);
        Ok(open)
    }

    async fn apply_status_updates(
        &self,
        updates: &[(String, ShippingStatus)],
    ) -> Result<(), ShippingError> {
        let mut state = self.lock()?;
        for (note_id, status) in updates {
            if let Some(note) = state.notes.get_mut(note_id) {
                note.shipping_status = Some(*status);
                note.modified = Some(Utc::now());
            }
        }
        Ok(())
    }
}
