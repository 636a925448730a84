pub mod env;
pub mod networks;

use crate::error::{ConfigError, Result};
use alloy::primitives::utils::parse_units;
use alloy::primitives::{Address, U256};
use std::str::FromStr;
use std::time::Duration;

pub use networks::{NetworkDefaults, NetworkProfile};

const DEFAULT_MAX_FEE_GWEI: &str = "50";
const DEFAULT_GAS_LIMIT: u64 = 300_000;
const DEFAULT_MAX_IN_FLIGHT: usize = 256;
const MAX_IN_FLIGHT_CAP: usize = 65_536;
const DEFAULT_SIGNAL_POLL_MS: u64 = 2_000;
const DEFAULT_SIGNAL_TIMEOUT_MS: u64 = 1_500;
const DEFAULT_BASE_SYMBOL: &str = "USDC";
const DEFAULT_INITIAL_TICKER: &str = "WETH";
const DEFAULT_HEALTH_PORT: u16 = 8080;
const DEFAULT_STATUS_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct SignalConfig {
    pub url: Option<String>,
    pub poll_interval: Duration,
    pub timeout: Duration,
    pub base_symbol: String,
    pub initial_ticker: String,
}

pub struct Config {
    pub private_key: String,
    pub executor_address: Address,
    /// Dispatch order follows `NETWORKS`.
    pub networks: Vec<NetworkProfile>,
    pub max_fee_wei: u128,
    pub gas_limit: u64,
    pub signal: SignalConfig,
    pub health_port: Option<u16>,
    pub status_interval: Option<Duration>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("private_key", &"<redacted>")
            .field("executor_address", &self.executor_address)
            .field("networks", &self.networks)
            .field("max_fee_wei", &self.max_fee_wei)
            .field("gas_limit", &self.gas_limit)
            .field("signal", &self.signal)
            .field("health_port", &self.health_port)
            .field("status_interval", &self.status_interval)
            .finish()
    }
}

fn invalid(msg: String) -> crate::error::DispatchError {
    ConfigError::Invalid(msg).into()
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match non_empty(raw) {
        Some(value) => value
            .parse::<T>()
            .map_err(|e| invalid(format!("{key} must be a number, got `{value}`: {e}"))),
        None => Ok(default),
    }
}

fn parse_amount(key: &str, raw: &str, decimals: u8) -> Result<U256> {
    parse_units(raw.trim(), decimals)
        .map(|units| units.get_absolute())
        .map_err(|e| invalid(format!("{key} must be a decimal amount, got `{raw}`: {e}")))
}

fn parse_gwei(key: &str, raw: &str) -> Result<u128> {
    let wei = parse_units(raw.trim(), "gwei")
        .map(|units| units.get_absolute())
        .map_err(|e| invalid(format!("{key} must be a gwei amount, got `{raw}`: {e}")))?;
    u128::try_from(wei).map_err(|_| invalid(format!("{key} is out of range: `{raw}`")))
}

/// Rejects URLs whose scheme cannot carry JSON-RPC. Used for the signal source; endpoint
/// URLs are validated by the pool so one bad entry only drops that endpoint.
pub fn validate_http_url(name: &str, raw: &str) -> Result<()> {
    let parsed = raw
        .parse::<reqwest::Url>()
        .map_err(|e| invalid(format!("{name} must be a valid URL, got `{raw}`: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!(
            "{name} must use http(s) scheme, got `{other}`"
        ))),
    }
}

impl Config {
    /// Reads the process environment. Call `env::load_dot_env` first to honour `.env`.
    pub fn load(network_override: Option<&[String]>) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), network_override)
    }

    pub fn from_lookup<F>(lookup: F, network_override: Option<&[String]>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let private_key = non_empty(lookup("PRIVATE_KEY"))
            .ok_or_else(|| ConfigError::Missing("PRIVATE_KEY must be set".to_string()))?;

        let executor_raw = non_empty(lookup("EXECUTOR_ADDRESS"))
            .ok_or_else(|| ConfigError::Missing("EXECUTOR_ADDRESS must be set".to_string()))?;
        let executor_address = Address::from_str(&executor_raw).map_err(|e| {
            invalid(format!(
                "EXECUTOR_ADDRESS must be a 0x-prefixed address, got `{executor_raw}`: {e}"
            ))
        })?;

        let network_ids = match network_override {
            Some(ids) => ids.to_vec(),
            None => non_empty(lookup("NETWORKS"))
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
        };
        if network_ids.is_empty() {
            return Err(ConfigError::Missing(
                "NETWORKS must list at least one network id".to_string(),
            )
            .into());
        }

        let mut networks = Vec::with_capacity(network_ids.len());
        for id in &network_ids {
            let id = id.to_ascii_lowercase();
            if networks.iter().any(|n: &NetworkProfile| n.id == id) {
                continue;
            }
            networks.push(resolve_network(&id, &lookup)?);
        }

        let max_fee_raw =
            non_empty(lookup("MAX_FEE_GWEI")).unwrap_or_else(|| DEFAULT_MAX_FEE_GWEI.to_string());
        let max_fee_wei = parse_gwei("MAX_FEE_GWEI", &max_fee_raw)?;
        let gas_limit = parse_number("GAS_LIMIT", lookup("GAS_LIMIT"), DEFAULT_GAS_LIMIT)?;
        if gas_limit == 0 {
            return Err(invalid("GAS_LIMIT must be positive".to_string()));
        }

        let signal_url = non_empty(lookup("SIGNAL_URL"));
        if let Some(url) = signal_url.as_deref() {
            validate_http_url("SIGNAL_URL", url)?;
        }
        let poll_ms = parse_number(
            "SIGNAL_POLL_MS",
            lookup("SIGNAL_POLL_MS"),
            DEFAULT_SIGNAL_POLL_MS,
        )?
        .max(1);
        let timeout_ms = parse_number(
            "SIGNAL_TIMEOUT_MS",
            lookup("SIGNAL_TIMEOUT_MS"),
            DEFAULT_SIGNAL_TIMEOUT_MS,
        )?
        .max(1);
        let signal = SignalConfig {
            url: signal_url,
            poll_interval: Duration::from_millis(poll_ms),
            timeout: Duration::from_millis(timeout_ms),
            base_symbol: non_empty(lookup("BASE_SYMBOL"))
                .unwrap_or_else(|| DEFAULT_BASE_SYMBOL.to_string()),
            initial_ticker: non_empty(lookup("INITIAL_TICKER"))
                .unwrap_or_else(|| DEFAULT_INITIAL_TICKER.to_string()),
        };

        let health_port = match non_empty(lookup("HEALTH_PORT")) {
            Some(raw) if raw.eq_ignore_ascii_case("off") => None,
            raw => Some(parse_number("HEALTH_PORT", raw, DEFAULT_HEALTH_PORT)?),
        };

        let status_secs = parse_number(
            "STATUS_INTERVAL_SECS",
            lookup("STATUS_INTERVAL_SECS"),
            DEFAULT_STATUS_INTERVAL_SECS,
        )?;
        let status_interval = (status_secs > 0).then(|| Duration::from_secs(status_secs));

        Ok(Self {
            private_key,
            executor_address,
            networks,
            max_fee_wei,
            gas_limit,
            signal,
            health_port,
            status_interval,
        })
    }
}

fn resolve_network<F>(id: &str, lookup: &F) -> Result<NetworkProfile>
where
    F: Fn(&str) -> Option<String>,
{
    let prefix = NetworkProfile::env_prefix(id);
    let key = |suffix: &str| format!("{prefix}_{suffix}");
    let defaults = NetworkDefaults::lookup(id);

    let chain_id = match (non_empty(lookup(&key("CHAIN_ID"))), defaults) {
        (Some(raw), _) => raw.parse::<u64>().map_err(|e| {
            invalid(format!("{} must be a number, got `{raw}`: {e}", key("CHAIN_ID")))
        })?,
        (None, Some(d)) => d.chain_id,
        (None, None) => {
            return Err(ConfigError::Missing(format!(
                "{} must be set for network `{id}` (not in the built-in catalog)",
                key("CHAIN_ID")
            ))
            .into())
        }
    };

    let rpc_urls = match non_empty(lookup(&key("RPC_URLS"))) {
        Some(raw) => split_list(&raw),
        None => defaults
            .map(|d| d.rpc_urls.iter().map(|u| u.to_string()).collect())
            .unwrap_or_default(),
    };
    if rpc_urls.is_empty() {
        return Err(ConfigError::Missing(format!(
            "{} must list at least one endpoint for network `{id}`",
            key("RPC_URLS")
        ))
        .into());
    }

    let native_symbol = non_empty(lookup(&key("NATIVE_SYMBOL")))
        .or_else(|| defaults.map(|d| d.native_symbol.to_string()))
        .unwrap_or_else(|| "ETH".to_string());
    let decimals = parse_number(
        &key("DECIMALS"),
        lookup(&key("DECIMALS")),
        defaults.map(|d| d.decimals).unwrap_or(18),
    )?;

    let fee_raw = non_empty(lookup(&key("PRIORITY_FEE_GWEI")))
        .or_else(|| defaults.map(|d| d.priority_fee_gwei.to_string()))
        .unwrap_or_else(|| "1".to_string());
    let priority_fee_wei = parse_gwei(&key("PRIORITY_FEE_GWEI"), &fee_raw)?;

    let min_raw = non_empty(lookup(&key("SIZE_MIN")))
        .or_else(|| defaults.map(|d| d.size_min.to_string()))
        .ok_or_else(|| ConfigError::Missing(format!("{} must be set", key("SIZE_MIN"))))?;
    let max_raw = non_empty(lookup(&key("SIZE_MAX")))
        .or_else(|| defaults.map(|d| d.size_max.to_string()))
        .ok_or_else(|| ConfigError::Missing(format!("{} must be set", key("SIZE_MAX"))))?;
    let size_min = parse_amount(&key("SIZE_MIN"), &min_raw, decimals)?;
    let size_max = parse_amount(&key("SIZE_MAX"), &max_raw, decimals)?;
    if size_min > size_max {
        return Err(invalid(format!(
            "{} ({min_raw}) must not exceed {} ({max_raw})",
            key("SIZE_MIN"),
            key("SIZE_MAX")
        )));
    }

    let max_fires_per_sec = parse_number(
        &key("MAX_FIRES_PER_SEC"),
        lookup(&key("MAX_FIRES_PER_SEC")),
        0u32,
    )?;
    let max_in_flight = parse_number(
        &key("MAX_IN_FLIGHT"),
        lookup(&key("MAX_IN_FLIGHT")),
        DEFAULT_MAX_IN_FLIGHT,
    )?
    .clamp(1, MAX_IN_FLIGHT_CAP);

    Ok(NetworkProfile {
        id: id.to_string(),
        chain_id,
        name: defaults
            .map(|d| d.name.to_string())
            .unwrap_or_else(|| id.to_string()),
        rpc_urls,
        native_symbol,
        decimals,
        priority_fee_wei,
        size_min,
        size_max,
        max_fires_per_sec,
        max_in_flight,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("PRIVATE_KEY", KEY),
            (
                "EXECUTOR_ADDRESS",
                "0x00000000000000000000000000000000000000aa",
            ),
            ("NETWORKS", "base, arbitrum"),
        ]
    }

    #[test]
    fn test_load_uses_catalog_defaults_in_configured_order() {
        let cfg = Config::from_lookup(env(&minimal()), None).unwrap();
        let ids: Vec<_> = cfg.networks.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["base", "arbitrum"]);
        let base = &cfg.networks[0];
        assert_eq!(base.chain_id, 8453);
        assert_eq!(base.priority_fee_wei, 10_000_000);
        assert_eq!(base.size_min, U256::from(10_000_000_000_000_000u128));
        assert_eq!(base.size_max, U256::from(50_000_000_000_000_000u128));
        assert_eq!(base.max_fires_per_sec, 0);
        assert_eq!(cfg.max_fee_wei, 50_000_000_000);
        assert_eq!(cfg.gas_limit, 300_000);
        assert_eq!(cfg.health_port, Some(8080));
        assert!(cfg.signal.url.is_none());
    }

    #[test]
    fn test_per_network_overrides_win() {
        let mut pairs = minimal();
        pairs.push(("BASE_RPC_URLS", "http://a:8545, http://b:8545"));
        pairs.push(("BASE_PRIORITY_FEE_GWEI", "3"));
        pairs.push(("BASE_MAX_FIRES_PER_SEC", "20"));
        let cfg = Config::from_lookup(env(&pairs), None).unwrap();
        let base = &cfg.networks[0];
        assert_eq!(base.rpc_urls, vec!["http://a:8545", "http://b:8545"]);
        assert_eq!(base.priority_fee_wei, 3_000_000_000);
        assert_eq!(base.max_fires_per_sec, 20);
    }

    #[test]
    fn test_missing_credential_is_reported() {
        let pairs = vec![("NETWORKS", "base")];
        let err = Config::from_lookup(env(&pairs), None).unwrap_err();
        assert!(err.to_string().contains("PRIVATE_KEY"));
    }

    #[test]
    fn test_unknown_network_requires_chain_id_and_endpoints() {
        let mut pairs = minimal();
        pairs.retain(|(k, _)| *k != "NETWORKS");
        pairs.push(("NETWORKS", "devnet"));
        let err = Config::from_lookup(env(&pairs), None).unwrap_err();
        assert!(err.to_string().contains("DEVNET_CHAIN_ID"));

        pairs.push(("DEVNET_CHAIN_ID", "31337"));
        pairs.push(("DEVNET_RPC_URLS", "http://127.0.0.1:8545"));
        pairs.push(("DEVNET_SIZE_MIN", "1"));
        pairs.push(("DEVNET_SIZE_MAX", "2"));
        let cfg = Config::from_lookup(env(&pairs), None).unwrap();
        assert_eq!(cfg.networks[0].chain_id, 31337);
        assert_eq!(cfg.networks[0].native_symbol, "ETH");
    }

    #[test]
    fn test_inverted_size_bounds_are_rejected() {
        let mut pairs = minimal();
        pairs.push(("BASE_SIZE_MIN", "1"));
        pairs.push(("BASE_SIZE_MAX", "0.5"));
        let err = Config::from_lookup(env(&pairs), None).unwrap_err();
        assert!(err.to_string().contains("BASE_SIZE_MIN"));
    }

    #[test]
    fn test_network_override_replaces_env_list() {
        let override_ids = vec!["bsc".to_string()];
        let cfg = Config::from_lookup(env(&minimal()), Some(&override_ids)).unwrap();
        assert_eq!(cfg.networks.len(), 1);
        assert_eq!(cfg.networks[0].native_symbol, "BNB");
    }

    #[test]
    fn test_signal_url_scheme_is_validated() {
        let mut pairs = minimal();
        pairs.push(("SIGNAL_URL", "ftp://signals.local/feed"));
        assert!(Config::from_lookup(env(&pairs), None).is_err());
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let cfg = Config::from_lookup(env(&minimal()), None).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains(&KEY[4..]));
    }

    #[test]
    fn test_health_port_can_be_disabled() {
        let mut pairs = minimal();
        pairs.push(("HEALTH_PORT", "off"));
        pairs.push(("STATUS_INTERVAL_SECS", "0"));
        let cfg = Config::from_lookup(env(&pairs), None).unwrap();
        assert!(cfg.health_port.is_none());
        assert!(cfg.status_interval.is_none());
    }
}
