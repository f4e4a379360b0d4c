use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub payment: PaymentConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ListenConfig {
    #[serde(default = "default_listen_address")]
    pub address: String,
    #[serde(default = "default_listen_port")]
    pub port: u16,
}

/// x402 payment gate settings
///
/// Only the presence of the header is checked; the token itself is never
/// verified against a ledger.
#[derive(Debug, Deserialize, Clone)]
pub struct PaymentConfig {
    #[serde(default = "default_protocol")]
    pub protocol: String,
    /// Wallet that receives query payments
    #[serde(default = "default_payment_address")]
    pub address: String,
    /// Price per query, in USDC, kept as text so it is echoed verbatim
    #[serde(default = "default_price")]
    pub price_per_query_usdc: String,
    /// Header carrying the payment-proof token
    #[serde(default = "default_payment_header")]
    pub header: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_true")]
    pub cors: bool,
    /// Expose /metrics and /api/stats
    #[serde(default = "default_true")]
    pub metrics: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LogConfig {
    /// Emit JSON lines instead of the human-readable format
    #[serde(default)]
    pub json: bool,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: default_listen_address(),
            port: default_listen_port(),
        }
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            protocol: default_protocol(),
            address: default_payment_address(),
            price_per_query_usdc: default_price(),
            header: default_payment_header(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self { name: default_service_name() }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self { cors: true, metrics: true }
    }
}

// Default value functions
fn default_true() -> bool { true }
fn default_listen_address() -> String { "0.0.0.0".to_string() }
fn default_listen_port() -> u16 { 8000 }
fn default_protocol() -> String { "x402".to_string() }
fn default_payment_address() -> String { "0x53e585d65a6DE5ac14C09774C9844B4909Fb8cFD".to_string() }
fn default_price() -> String { "0.05".to_string() }
fn default_payment_header() -> String { "x-402-payment-token".to_string() }
fn default_service_name() -> String { "Agent Trust & Reputation API".to_string() }

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path, e))?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config '{}': {}", path, e))
    }

    /// Load the file if it exists. Returns `None` when there is nothing to load.
    pub fn load_if_present(path: &str) -> anyhow::Result<Option<Self>> {
        if Path::new(path).exists() {
            Self::load(path).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
