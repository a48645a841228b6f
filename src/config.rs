use std::env;

pub const DEFAULT_GLS_API_URL: &str = "https://api.gls-group.eu/public/v1";
pub const GLS_SANDBOX_URL: &str = "https://api.gls-group.eu/public/v1/sandbox";

/// GLS carrier credentials and endpoint selection.
///
/// Loaded fresh from the environment; no validation happens here. Missing
/// credentials are a valid state — the carrier client runs in demo mode then.
#[derive(Debug, Clone)]
pub struct GlsSettings {
    pub api_url: String,
    pub contact_id: Option<String>,
    pub password: Option<String>,
    pub customer_id: Option<String>,
    pub sandbox: bool,
}

impl GlsSettings {
    /// Load GLS settings from environment variables
    ///
    /// # Environment Variables
    /// - `GLS_API_URL`: Optional - API base URL (default: production base)
    /// - `GLS_CONTACT_ID`: Optional - contact id for HTTP basic auth; unset enables demo mode
    /// - `GLS_PASSWORD`: Optional - password for HTTP basic auth
    /// - `GLS_CUSTOMER_ID`: Optional - customer/shipper id placed on requests
    /// - `GLS_SANDBOX`: Optional - route calls to the sandbox endpoint (default: true)
    pub fn from_env() -> Self {
        GlsSettings {
            api_url: env::var("GLS_API_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_GLS_API_URL.to_string()),
            contact_id: non_empty(env::var("GLS_CONTACT_ID").ok()),
            password: non_empty(env::var("GLS_PASSWORD").ok()),
            customer_id: non_empty(env::var("GLS_CUSTOMER_ID").ok()),
            sandbox: parse_flag(env::var("GLS_SANDBOX").ok(), true),
        }
    }

    /// Without a contact id the client never talks to the network.
    pub fn is_configured(&self) -> bool {
        self.contact_id.is_some()
    }
}

/// Shopify admin API access for the fulfillment sync.
#[derive(Debug, Clone)]
pub struct ShopifySettings {
    pub enabled: bool,
    /// Admin API base, e.g. `https://{shop}.myshopify.com/admin/api/2024-01`.
    pub shop_url: Option<String>,
    pub access_token: Option<String>,
}

impl ShopifySettings {
    /// Load Shopify settings from environment variables
    ///
    /// # Environment Variables
    /// - `SHOPIFY_SYNC_ENABLED`: Optional - turn the fulfillment sync off entirely (default: true)
    /// - `SHOPIFY_SHOP_URL`: Optional - admin API base URL; unset skips the sync
    /// - `SHOPIFY_ACCESS_TOKEN`: Optional - admin API access token; unset skips the sync
    pub fn from_env() -> Self {
        ShopifySettings {
            enabled: parse_flag(env::var("SHOPIFY_SYNC_ENABLED").ok(), true),
            shop_url: non_empty(env::var("SHOPIFY_SHOP_URL").ok()),
            access_token: non_empty(env::var("SHOPIFY_ACCESS_TOKEN").ok()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.shop_url.is_some() && self.access_token.is_some()
    }
}

/// Everything the binary needs to run.
#[derive(Debug, Clone)]
pub struct Config {
    pub cron_schedule: String,
    pub gls: GlsSettings,
    pub shopify: ShopifySettings,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Environment Variables
    /// - `CRON_SCHEDULE`: Optional - cron expression for the tracking sweep (default: hourly)
    /// - plus the `GLS_*` and `SHOPIFY_*` variables documented on the settings structs
    pub fn from_env() -> Self {
        let cron_schedule =
            env::var("CRON_SCHEDULE").unwrap_or_else(|_| "0 0 * * * *".to_string());

        Config {
            cron_schedule,
            gls: GlsSettings::from_env(),
            shopify: ShopifySettings::from_env(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_flag(value: Option<String>, default: bool) -> bool {
    match value.as_deref().map(str::trim) {
        Some("0") | Some("false") | Some("False") | Some("no") => false,
        Some("1") | Some("true") | Some("True") | Some("yes") => true,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_parsing_defaults_when_unset_or_garbage() {
        assert!(parse_flag(None, true));
        assert!(!parse_flag(None, false));
        assert!(parse_flag(Some("maybe".to_string()), true));
    }

    #[test]
    fn flag_parsing_reads_common_forms() {
        assert!(!parse_flag(Some("false".to_string()), true));
        assert!(!parse_flag(Some("0".to_string()), true));
        assert!(parse_flag(Some("true".to_string()), false));
        assert!(parse_flag(Some("1".to_string()), false));
    }

    #[test]
    fn blank_values_count_as_unset() {
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(Some(String::new())), None);
        assert_eq!(non_empty(Some("abc".to_string())), Some("abc".to_string()));
    }
}
