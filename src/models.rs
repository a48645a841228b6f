use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Submission state of an ERP document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocStatus {
    Draft,
    Submitted,
    Cancelled,
}

/// Shipping status stored on the delivery note.
///
/// The serialized forms match the labels the ERP keeps in its status field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShippingStatus {
    #[serde(rename = "Label Created")]
    LabelCreated,
    #[serde(rename = "Picked Up")]
    PickedUp,
    #[serde(rename = "In Transit")]
    InTransit,
    #[serde(rename = "Out for Delivery")]
    OutForDelivery,
    Delivered,
    Returned,
    Exception,
}

impl ShippingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingStatus::LabelCreated => "Label Created",
            ShippingStatus::PickedUp => "Picked Up",
            ShippingStatus::InTransit => "In Transit",
            ShippingStatus::OutForDelivery => "Out for Delivery",
            ShippingStatus::Delivered => "Delivered",
            ShippingStatus::Returned => "Returned",
            ShippingStatus::Exception => "Exception",
        }
    }

    /// Terminal statuses are excluded from the tracking sweep.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ShippingStatus::Delivered | ShippingStatus::Returned)
    }
}

impl std::fmt::Display for ShippingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A delivery-note line item (only the fields the connector reads).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteItem {
    pub item_code: String,
    /// Total weight of the line in carrier-native units; missing counts as zero.
    pub total_weight: Option<f64>,
}

/// The ERP delivery note, as seen through the document store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryNote {
    pub id: String,
    pub docstatus: DocStatus,
    pub customer_name: String,
    /// Id of the linked shipping address, if one is attached.
    pub shipping_address: Option<String>,
    pub items: Vec<NoteItem>,
    /// Set when the note originated from a Shopify order.
    pub shopify_order_id: Option<String>,
    pub shopify_order_number: Option<String>,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub label_url: Option<String>,
    pub shipping_status: Option<ShippingStatus>,
    pub modified: Option<DateTime<Utc>>,
}

/// A shipping address, read-only input to request building.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    /// Address title; the customer name is used when this is empty.
    pub name: Option<String>,
    pub street1: String,
    pub street2: Option<String>,
    pub postal_code: String,
    pub city: String,
    /// Country name as stored in the ERP reference table.
    pub country: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Shipment request in the GLS wire shape.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentRequest {
    pub shipper_id: Option<String>,
    pub references: Vec<String>,
    pub addresses: ShipmentAddresses,
    pub parcels: Vec<Parcel>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShipmentAddresses {
    pub delivery: DeliveryAddress,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    pub name1: String,
    pub street1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street2: Option<String>,
    pub zip_code: String,
    pub city: String,
    pub country_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Parcel {
    pub weight: f64,
    pub comment: String,
}

/// What a successful carrier call yields; consumed once by the workflow.
#[derive(Debug, Clone, Serialize)]
pub struct ShipmentResult {
    pub tracking_number: String,
    pub label_url: Option<String>,
}

/// The field update persisted onto the note after label creation.
#[derive(Debug, Clone)]
pub struct ShipmentFields {
    pub carrier: String,
    pub tracking_number: String,
    pub label_url: Option<String>,
    pub shipping_status: ShippingStatus,
}

/// A note eligible for the tracking sweep.
#[derive(Debug, Clone)]
pub struct OpenShipment {
    pub note_id: String,
    pub tracking_number: String,
    pub carrier: Option<String>,
    pub shipping_status: Option<ShippingStatus>,
}

/// Host-facing tracking lookup payload.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingStatus {
    pub tracking_number: String,
    pub status: String,
}
