use std::sync::Arc;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::carrier::tracking_url;
use crate::config::ShopifySettings;

/// Outcome of a fulfillment sync attempt.
///
/// The sync is fire-and-forget: whatever happens here, the shipment that
/// triggered it stays created. Callers log the outcome and move on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Synced,
    Skipped(&'static str),
    Failed(String),
}

/// Tracking metadata attached to the fulfillment.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingInfo {
    pub number: String,
    pub company: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FulfillmentOrder {
    pub id: i64,
    pub status: String,
}

/// Shopify fulfillment endpoints used by the sync.
#[async_trait]
pub trait FulfillmentApi: Send + Sync {
    async fn list_fulfillment_orders(&self, order_id: &str) -> Result<Vec<FulfillmentOrder>>;

    async fn create_fulfillment(
        &self,
        fulfillment_order_id: i64,
        tracking: &TrackingInfo,
    ) -> Result<()>;
}

pub struct ShopifyClient {
    settings: ShopifySettings,
    http_client: Client,
}

impl ShopifyClient {
    pub fn new(settings: ShopifySettings) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            settings,
            http_client,
        })
    }

    fn base_url(&self) -> Result<&str> {
        self.settings
            .shop_url
            .as_deref()
            .context("Shopify shop URL not configured")
    }

    fn token(&self) -> Result<&str> {
        self.settings
            .access_token
            .as_deref()
            .context("Shopify access token not configured")
    }
}

#[async_trait]
impl FulfillmentApi for ShopifyClient {
    async fn list_fulfillment_orders(&self, order_id: &str) -> Result<Vec<FulfillmentOrder>> {
        let url = format!("{}/orders/{}/fulfillment_orders.json", self.base_url()?, order_id);

        let response = self
            .http_client
            .get(&url)
            .header("X-Shopify-Access-Token", self.token()?)
            .send()
            .await
            .context("Failed to query Shopify fulfillment orders")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("fulfillment orders query failed (status {}): {}", status, body);
        }

        let parsed: FulfillmentOrdersResponse = response
            .json()
            .await
            .context("Failed to parse fulfillment orders response")?;

        Ok(parsed.fulfillment_orders)
    }

    async fn create_fulfillment(
        &self,
        fulfillment_order_id: i64,
        tracking: &TrackingInfo,
    ) -> Result<()> {
        let url = format!("{}/fulfillments.json", self.base_url()?);

        let payload = FulfillmentPayload {
            fulfillment: Fulfillment {
                line_items_by_fulfillment_order: vec![FulfillmentOrderRef {
                    fulfillment_order_id,
                }],
                tracking_info: tracking.clone(),
                notify_customer: true,
            },
        };

        let response = self
            .http_client
            .post(&url)
            .header("X-Shopify-Access-Token", self.token()?)
            .json(&payload)
            .send()
            .await
            .context("Failed to post Shopify fulfillment")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("fulfillment creation failed (status {}): {}", status, body);
        }

        Ok(())
    }
}

/// Pushes tracking data into Shopify after a label is created.
pub struct ShopifySync {
    settings: ShopifySettings,
    api: Arc<dyn FulfillmentApi>,
}

impl ShopifySync {
    pub fn from_settings(settings: ShopifySettings) -> Result<Self> {
        let api = Arc::new(ShopifyClient::new(settings.clone())?);
        Ok(Self { settings, api })
    }

    pub fn with_api(settings: ShopifySettings, api: Arc<dyn FulfillmentApi>) -> Self {
        Self { settings, api }
    }

    /// Attach tracking to the first open fulfillment order of a Shopify order.
    ///
    /// Every exit is soft: missing prerequisites skip, transport and HTTP
    /// errors fail the sync only, never the shipment.
    pub async fn sync(&self, order_id: &str, carrier: &str, tracking_number: &str) -> SyncOutcome {
        if !self.settings.enabled {
            tracing::debug!(order_id, "Shopify sync disabled, skipping");
            return SyncOutcome::Skipped("Shopify sync disabled");
        }
        if !self.settings.is_configured() {
            tracing::debug!(order_id, "Shopify credentials not configured, skipping");
            return SyncOutcome::Skipped("Shopify credentials not configured");
        }

        let orders = match self.api.list_fulfillment_orders(order_id).await {
            Ok(orders) => orders,
            Err(err) => {
                tracing::warn!(order_id, error = %err, "Shopify fulfillment order lookup failed");
                return SyncOutcome::Failed(err.to_string());
            }
        };

        if orders.is_empty() {
            tracing::info!(order_id, "no fulfillment orders on Shopify order, skipping");
            return SyncOutcome::Skipped("no fulfillment orders");
        }

        let Some(open) = orders.iter().find(|order| order.status == "open") else {
            tracing::info!(order_id, "no open fulfillment order, skipping");
            return SyncOutcome::Skipped("no open fulfillment order");
        };

        let tracking = TrackingInfo {
            number: tracking_number.to_string(),
            company: carrier.to_string(),
            url: tracking_url(carrier, tracking_number),
        };

        match self.api.create_fulfillment(open.id, &tracking).await {
            Ok(()) => {
                tracing::info!(order_id, tracking_number, "tracking synced to Shopify");
                SyncOutcome::Synced
            }
            Err(err) => {
                tracing::warn!(order_id, error = %err, "Shopify fulfillment creation failed");
                SyncOutcome::Failed(err.to_string())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct FulfillmentOrdersResponse {
    #[serde(default)]
    fulfillment_orders: Vec<FulfillmentOrder>,
}

#[derive(Debug, Serialize)]
struct FulfillmentPayload {
    fulfillment: Fulfillment,
}

#[derive(Debug, Serialize)]
struct Fulfillment {
    line_items_by_fulfillment_order: Vec<FulfillmentOrderRef>,
    tracking_info: TrackingInfo,
    notify_customer: bool,
}

#[derive(Debug, Serialize)]
struct FulfillmentOrderRef {
    fulfillment_order_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Mutex;

    struct MockFulfillmentApi {
        orders: Result<Vec<FulfillmentOrder>, String>,
        create_fails: bool,
        created: Mutex<Vec<(i64, TrackingInfo)>>,
    }

    impl MockFulfillmentApi {
        fn with_orders(orders: Vec<FulfillmentOrder>) -> Self {
            Self {
                orders: Ok(orders),
                create_fails: false,
                created: Mutex::new(Vec::new()),
            }
        }

        fn failing_lookup(message: &str) -> Self {
            Self {
                orders: Err(message.to_string()),
                create_fails: false,
                created: Mutex::new(Vec::new()),
            }
        }

        fn created(&self) -> Vec<(i64, TrackingInfo)> {
            self.created.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FulfillmentApi for MockFulfillmentApi {
        async fn list_fulfillment_orders(
            &self,
            _order_id: &str,
        ) -> Result<Vec<FulfillmentOrder>> {
            match &self.orders {
                Ok(orders) => Ok(orders.clone()),
                Err(message) => Err(anyhow!(message.clone())),
            }
        }

        async fn create_fulfillment(
            &self,
            fulfillment_order_id: i64,
            tracking: &TrackingInfo,
        ) -> Result<()> {
            if self.create_fails {
                return Err(anyhow!("boom"));
            }
            self.created
                .lock()
                .unwrap()
                .push((fulfillment_order_id, tracking.clone()));
            Ok(())
        }
    }

    fn configured() -> ShopifySettings {
        ShopifySettings {
            enabled: true,
            shop_url: Some("https://demo.myshopify.com/admin/api/2024-01".to_string()),
            access_token: Some("shpat_test".to_string()),
        }
    }

    fn sync_with(api: MockFulfillmentApi) -> (ShopifySync, Arc<MockFulfillmentApi>) {
        let api = Arc::new(api);
        (ShopifySync::with_api(configured(), api.clone()), api)
    }

    #[tokio::test]
    async fn disabled_sync_skips_before_any_call() {
        let api = Arc::new(MockFulfillmentApi::with_orders(vec![FulfillmentOrder {
            id: 1,
            status: "open".to_string(),
        }]));
        let mut settings = configured();
        settings.enabled = false;
        let sync = ShopifySync::with_api(settings, api.clone());

        let outcome = sync.sync("5501", "GLS", "ZR10001").await;
        assert_eq!(outcome, SyncOutcome::Skipped("Shopify sync disabled"));
        assert!(api.created().is_empty());
    }

    #[tokio::test]
    async fn zero_fulfillment_orders_skip_without_posting() {
        let (sync, api) = sync_with(MockFulfillmentApi::with_orders(vec![]));

        let outcome = sync.sync("5501", "GLS", "ZR10001").await;
        assert_eq!(outcome, SyncOutcome::Skipped("no fulfillment orders"));
        assert!(api.created().is_empty());
    }

    #[tokio::test]
    async fn closed_fulfillment_orders_skip_without_posting() {
        let (sync, api) = sync_with(MockFulfillmentApi::with_orders(vec![FulfillmentOrder {
            id: 7,
            status: "closed".to_string(),
        }]));

        let outcome = sync.sync("5501", "GLS", "ZR10001").await;
        assert_eq!(outcome, SyncOutcome::Skipped("no open fulfillment order"));
        assert!(api.created().is_empty());
    }

    #[tokio::test]
    async fn first_open_fulfillment_order_gets_the_tracking() {
        let (sync, api) = sync_with(MockFulfillmentApi::with_orders(vec![
            FulfillmentOrder {
                id: 7,
                status: "closed".to_string(),
            },
            FulfillmentOrder {
                id: 8,
                status: "open".to_string(),
            },
            FulfillmentOrder {
                id: 9,
                status: "open".to_string(),
            },
        ]));

        let outcome = sync.sync("5501", "GLS", "ZR10001").await;
        assert_eq!(outcome, SyncOutcome::Synced);

        let created = api.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].0, 8);
        assert_eq!(created[0].1.number, "ZR10001");
        assert_eq!(created[0].1.company, "GLS");
        assert!(created[0].1.url.contains("ZR10001"));
    }

    #[tokio::test]
    async fn lookup_errors_fail_softly() {
        let (sync, api) = sync_with(MockFulfillmentApi::failing_lookup("status 503"));

        let outcome = sync.sync("5501", "GLS", "ZR10001").await;
        assert!(matches!(outcome, SyncOutcome::Failed(message) if message.contains("503")));
        assert!(api.created().is_empty());
    }

    #[tokio::test]
    async fn creation_errors_fail_softly() {
        let mut mock = MockFulfillmentApi::with_orders(vec![FulfillmentOrder {
            id: 3,
            status: "open".to_string(),
        }]);
        mock.create_fails = true;
        let (sync, _api) = sync_with(mock);

        let outcome = sync.sync("5501", "GLS", "ZR10001").await;
        assert!(matches!(outcome, SyncOutcome::Failed(_)));
    }
}
