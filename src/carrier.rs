use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;

use crate::config::{GLS_SANDBOX_URL, GlsSettings};
use crate::error::ShippingError;
use crate::models::{
    Address, DeliveryAddress, DeliveryNote, Parcel, ShipmentAddresses, ShipmentRequest,
    ShipmentResult, ShippingStatus,
};

/// Parcels below this are booked at the carrier minimum.
const MIN_PARCEL_WEIGHT: f64 = 1.0;

/// Used when the country reference table has no code for the address country.
const FALLBACK_COUNTRY_CODE: &str = "IT";

/// Carrier operations the workflow and the tracking sweep depend on.
#[async_trait]
pub trait CarrierApi: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create_shipment(
        &self,
        note: &DeliveryNote,
        address: Option<&Address>,
        country_code: Option<&str>,
    ) -> Result<ShipmentResult, ShippingError>;

    async fn fetch_tracking_status(
        &self,
        tracking_number: &str,
    ) -> Result<Option<ShippingStatus>, ShippingError>;
}

pub struct GlsClient {
    settings: GlsSettings,
    http_client: Client,
}

impl GlsClient {
    pub fn new(settings: GlsSettings) -> Result<Self, ShippingError> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|err| ShippingError::carrier(format!("failed to create HTTP client: {err}")))?;

        Ok(Self {
            settings,
            http_client,
        })
    }

    /// Build the shipment request from a note and its shipping address.
    pub fn build_request(
        &self,
        note: &DeliveryNote,
        address: Option<&Address>,
        country_code: Option<&str>,
    ) -> Result<ShipmentRequest, ShippingError> {
        let address =
            address.ok_or_else(|| ShippingError::validation("Shipping address required"))?;

        let weight: f64 = note
            .items
            .iter()
            .map(|item| item.total_weight.unwrap_or(0.0))
            .sum();
        let weight = weight.max(MIN_PARCEL_WEIGHT);

        let name1 = address
            .name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| note.customer_name.clone());

        let comment = note
            .shopify_order_number
            .clone()
            .unwrap_or_else(|| note.id.clone());

        Ok(ShipmentRequest {
            shipper_id: self.settings.customer_id.clone(),
            references: vec![note.id.clone()],
            addresses: ShipmentAddresses {
                delivery: DeliveryAddress {
                    name1,
                    street1: address.street1.clone(),
                    street2: address.street2.clone(),
                    zip_code: address.postal_code.clone(),
                    city: address.city.clone(),
                    country_code: country_code.unwrap_or(FALLBACK_COUNTRY_CODE).to_string(),
                    phone: address.phone.clone(),
                    email: address.email.clone(),
                },
            },
            parcels: vec![Parcel { weight, comment }],
        })
    }

    /// Book the shipment with GLS, or fabricate a demo result when no
    /// credentials are configured.
    pub async fn post_shipment(
        &self,
        request: &ShipmentRequest,
    ) -> Result<ShipmentResult, ShippingError> {
        if !self.settings.is_configured() {
            let suffix: u32 = rand::thread_rng().gen_range(100_000_000..=999_999_999);
            tracing::warn!("GLS not configured - returning demo tracking number");
            return Ok(ShipmentResult {
                tracking_number: format!("DEMO{suffix}"),
                label_url: None,
            });
        }

        let base = if self.settings.sandbox {
            GLS_SANDBOX_URL
        } else {
            self.settings.api_url.as_str()
        };
        let url = format!("{base}/shipments");

        let contact_id = self.settings.contact_id.as_deref().unwrap_or_default();
        let response = self
            .http_client
            .post(&url)
            .basic_auth(contact_id, self.settings.password.as_deref())
            .json(request)
            .send()
            .await
            .map_err(|err| {
                tracing::error!(error = %err, "GLS shipment request failed");
                ShippingError::carrier(err.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %body, "GLS API rejected the shipment request");
            return Err(ShippingError::carrier(format!(
                "shipment request failed (status {status}): {body}"
            )));
        }

        let parsed: GlsShipmentResponse = response.json().await.map_err(|err| {
            tracing::error!(error = %err, "failed to parse GLS shipment response");
            ShippingError::carrier(format!("failed to parse GLS response: {err}"))
        })?;

        shipment_result(parsed)
    }
}

#[async_trait]
impl CarrierApi for GlsClient {
    fn name(&self) -> &'static str {
        "GLS"
    }

    async fn create_shipment(
        &self,
        note: &DeliveryNote,
        address: Option<&Address>,
        country_code: Option<&str>,
    ) -> Result<ShipmentResult, ShippingError> {
        let request = self.build_request(note, address, country_code)?;
        self.post_shipment(&request).await
    }

    async fn fetch_tracking_status(
        &self,
        _tracking_number: &str,
    ) -> Result<Option<ShippingStatus>, ShippingError> {
        // TODO: wire up the GLS partner tracking API once partner credentials
        // exist; the public tracking page has no stable JSON endpoint. Until
        // then every poll yields no update.
        Ok(None)
    }
}

/// Shipment response (partial, only the fields we need)
#[derive(Debug, Deserialize)]
struct GlsShipmentResponse {
    #[serde(default)]
    parcels: Vec<GlsParcel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GlsParcel {
    tracking_number: String,
    label_url: Option<String>,
}

fn shipment_result(response: GlsShipmentResponse) -> Result<ShipmentResult, ShippingError> {
    let parcel = response
        .parcels
        .into_iter()
        .next()
        .ok_or_else(|| ShippingError::carrier("GLS response contained no parcels"))?;

    Ok(ShipmentResult {
        tracking_number: parcel.tracking_number,
        label_url: parcel.label_url,
    })
}

/// Public tracking page for a shipment; unknown carriers fall back to GLS.
pub fn tracking_url(carrier: &str, tracking_number: &str) -> String {
    match carrier {
        "BRT" => format!(
            "https://vas.brt.it/vas/sped_det_boll.hsm?referer=sped_numspe.htm&numSped={tracking_number}"
        ),
        "DHL" => {
            format!("https://www.dhl.com/it-it/home/tracking.html?tracking-id={tracking_number}")
        }
        "UPS" => format!("https://www.ups.com/track?loc=it_IT&tracknum={tracking_number}"),
        _ => format!("https://gls-group.com/IT/it/servizi-online/tracking?match={tracking_number}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocStatus, NoteItem};

    fn demo_settings() -> GlsSettings {
        GlsSettings {
            api_url: crate::config::DEFAULT_GLS_API_URL.to_string(),
            contact_id: None,
            password: None,
            customer_id: Some("276000001".to_string()),
            sandbox: true,
        }
    }

    fn note_with_weights(weights: &[Option<f64>]) -> DeliveryNote {
        DeliveryNote {
            id: "DN-0042".to_string(),
            docstatus: DocStatus::Submitted,
            customer_name: "Rossi SpA".to_string(),
            shipping_address: Some("ADDR-1".to_string()),
            items: weights
                .iter()
                .enumerate()
                .map(|(i, w)| NoteItem {
                    item_code: format!("ITEM-{i}"),
                    total_weight: *w,
                })
                .collect(),
            shopify_order_id: None,
            shopify_order_number: None,
            carrier: None,
            tracking_number: None,
            label_url: None,
            shipping_status: None,
            modified: None,
        }
    }

    fn milan_address() -> Address {
        Address {
            name: Some("Rossi SpA - Magazzino".to_string()),
            street1: "Via Roma 1".to_string(),
            street2: None,
            postal_code: "20100".to_string(),
            city: "Milano".to_string(),
            country: "Italy".to_string(),
            phone: None,
            email: None,
        }
    }

    #[test]
    fn build_request_requires_an_address() {
        let client = GlsClient::new(demo_settings()).unwrap();
        let err = client
            .build_request(&note_with_weights(&[Some(0.2), Some(0.3)]), None, Some("IT"))
            .unwrap_err();
        assert!(matches!(err, ShippingError::Validation(_)));
    }

    #[test]
    fn build_request_floors_parcel_weight() {
        let client = GlsClient::new(demo_settings()).unwrap();
        let request = client
            .build_request(
                &note_with_weights(&[Some(0.2), Some(0.3)]),
                Some(&milan_address()),
                Some("IT"),
            )
            .unwrap();
        assert_eq!(request.parcels.len(), 1);
        assert_eq!(request.parcels[0].weight, 1.0);

        let request = client
            .build_request(
                &note_with_weights(&[Some(2.0), None, Some(0.5)]),
                Some(&milan_address()),
                Some("IT"),
            )
            .unwrap();
        assert_eq!(request.parcels[0].weight, 2.5);
    }

    #[test]
    fn build_request_falls_back_on_country_and_name() {
        let client = GlsClient::new(demo_settings()).unwrap();
        let mut address = milan_address();
        address.name = None;

        let request = client
            .build_request(&note_with_weights(&[Some(1.0)]), Some(&address), None)
            .unwrap();
        assert_eq!(request.addresses.delivery.country_code, "IT");
        assert_eq!(request.addresses.delivery.name1, "Rossi SpA");
        assert_eq!(request.references, vec!["DN-0042".to_string()]);
        assert_eq!(request.parcels[0].comment, "DN-0042");
        assert_eq!(request.shipper_id.as_deref(), Some("276000001"));
    }

    #[test]
    fn optional_address_fields_stay_off_the_wire() {
        let client = GlsClient::new(demo_settings()).unwrap();
        let request = client
            .build_request(
                &note_with_weights(&[Some(1.0)]),
                Some(&milan_address()),
                Some("IT"),
            )
            .unwrap();

        let wire = serde_json::to_value(&request).unwrap();
        let delivery = &wire["addresses"]["delivery"];
        assert_eq!(delivery["zipCode"], "20100");
        assert_eq!(delivery["countryCode"], "IT");
        assert!(delivery.get("street2").is_none());
        assert!(delivery.get("phone").is_none());
        assert!(delivery.get("email").is_none());
    }

    #[test]
    fn shopify_order_number_becomes_the_parcel_comment() {
        let client = GlsClient::new(demo_settings()).unwrap();
        let mut note = note_with_weights(&[Some(1.0)]);
        note.shopify_order_number = Some("#1001".to_string());

        let request = client
            .build_request(&note, Some(&milan_address()), Some("IT"))
            .unwrap();
        assert_eq!(request.parcels[0].comment, "#1001");
    }

    #[tokio::test]
    async fn unconfigured_client_returns_a_demo_tracking_number() {
        let client = GlsClient::new(demo_settings()).unwrap();
        let request = client
            .build_request(
                &note_with_weights(&[Some(1.0)]),
                Some(&milan_address()),
                Some("IT"),
            )
            .unwrap();

        let result = client.post_shipment(&request).await.unwrap();
        assert!(result.tracking_number.starts_with("DEMO"));
        let suffix = &result.tracking_number["DEMO".len()..];
        assert_eq!(suffix.len(), 9);
        assert!(suffix.chars().all(|ch| ch.is_ascii_digit()));
        assert!(result.label_url.is_none());
    }

    #[test]
    fn response_without_parcels_is_an_error() {
        let err = shipment_result(GlsShipmentResponse { parcels: vec![] }).unwrap_err();
        assert!(matches!(err, ShippingError::Carrier(_)));
        assert!(err.to_string().contains("no parcels"));
    }

    #[test]
    fn first_parcel_wins() {
        let result = shipment_result(GlsShipmentResponse {
            parcels: vec![
                GlsParcel {
                    tracking_number: "ZR10001".to_string(),
                    label_url: Some("https://labels.example/1.pdf".to_string()),
                },
                GlsParcel {
                    tracking_number: "ZR10002".to_string(),
                    label_url: None,
                },
            ],
        })
        .unwrap();
        assert_eq!(result.tracking_number, "ZR10001");
        assert_eq!(result.label_url.as_deref(), Some("https://labels.example/1.pdf"));
    }

    #[test]
    fn tracking_urls_cover_known_carriers() {
        assert!(tracking_url("GLS", "ZR1").contains("gls-group.com"));
        assert!(tracking_url("UPS", "1Z").contains("ups.com"));
        // Unknown carriers land on the GLS page.
        assert!(tracking_url("SDA", "X").contains("gls-group.com"));
    }
}
