use crate::config::Config;
use crate::dispatch::NetworkDispatcher;
use crate::transport::SubmissionTransport;
use alloy::primitives::utils::format_units;
use alloy::primitives::U256;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

fn display_amount(value: U256, decimals: u8) -> String {
    format_units(value, decimals).unwrap_or_else(|_| value.to_string())
}

fn display_gwei(wei: u128) -> String {
    format_units(U256::from(wei), "gwei").unwrap_or_else(|_| format!("{wei} wei"))
}

/// Logs the resolved configuration. The private key never appears.
pub fn emit_config_summary(config: &Config) {
    tracing::info!(
        "[OPS] Config resolved: networks={} executor={:#x} max_fee={} gwei gas_limit={}",
        config
            .networks
            .iter()
            .map(|n| n.id.as_str())
            .collect::<Vec<_>>()
            .join(","),
        config.executor_address,
        display_gwei(config.max_fee_wei),
        config.gas_limit
    );
    for network in &config.networks {
        let rate = match network.max_fires_per_sec {
            0 => "unbounded".to_string(),
            n => format!("{n}/s"),
        };
        tracing::info!(
            "[OPS]   {} ({} chain={}): endpoints={} priority_fee={} gwei size=[{}, {}] {} rate={} max_in_flight={}",
            network.id,
            network.name,
            network.chain_id,
            network.rpc_urls.len(),
            display_gwei(network.priority_fee_wei),
            display_amount(network.size_min, network.decimals),
            display_amount(network.size_max, network.decimals),
            network.native_symbol,
            rate,
            network.max_in_flight
        );
    }
    let signal = &config.signal;
    match signal.url.as_deref() {
        Some(url) => tracing::info!(
            "[OPS] Signal source: {} every {:?} (timeout {:?}) base={} initial={}",
            url,
            signal.poll_interval,
            signal.timeout,
            signal.base_symbol,
            signal.initial_ticker
        ),
        None => tracing::info!(
            "[OPS] Signal source: none; target stays {} -> {} -> {}",
            signal.base_symbol,
            signal.initial_ticker,
            signal.base_symbol
        ),
    }
    tracing::info!(
        "[OPS] Liveness port: {} | status interval: {}",
        config
            .health_port
            .map(|p| p.to_string())
            .unwrap_or_else(|| "off".to_string()),
        config
            .status_interval
            .map(|d| format!("{}s", d.as_secs()))
            .unwrap_or_else(|| "off".to_string())
    );
}

/// Logs one stats line per network.
pub async fn emit_network_status<T: SubmissionTransport>(
    dispatchers: &[Arc<NetworkDispatcher<T>>],
) {
    for dispatcher in dispatchers {
        let stats = dispatcher.stats();
        let seq = dispatcher.sequences().snapshot().await;
        let next = seq
            .next
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        tracing::info!(
            "[STATUS] {} active={} issued={} ok={} failed={} conflicts={} rate_limited={} saturated={} in_flight={} next_seq={} resyncs={}/{}",
            dispatcher.network(),
            dispatcher.is_active(),
            stats.issued,
            stats.succeeded,
            stats.failed,
            stats.conflicts,
            stats.rate_limited,
            stats.saturated,
            dispatcher.in_flight(),
            next,
            seq.resyncs_applied,
            seq.resyncs_applied + seq.resyncs_failed
        );
    }
}

/// Emits network status every `interval` until shutdown.
pub async fn run_status_reporter<T: SubmissionTransport>(
    dispatchers: Vec<Arc<NetworkDispatcher<T>>>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;
    while !*shutdown.borrow() {
        tokio::select! {
            _ = ticker.tick() => emit_network_status(&dispatchers).await,
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
}
