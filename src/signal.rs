//! Signal producer: polls the external analysis source and republishes the target.
//!
//! One poll is in flight at a time. A failed poll leaves the previous target untouched and
//! is retried after the same fixed interval, forever.

use crate::config::SignalConfig;
use crate::error::{compact_error_message, DispatchError, Result};
use crate::target::{TargetDescriptor, TargetWriter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::watch;

const SIGNAL_ERR_MAX_LEN: usize = 200;

#[derive(Debug, Deserialize)]
struct SignalPayload {
    #[serde(alias = "symbol")]
    ticker: Option<String>,
    score: Option<Value>,
}

fn score_from_value(value: &Value) -> Option<f64> {
    let score = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    score.filter(|v| v.is_finite())
}

/// Turns a raw response body into a descriptor. A missing or unusable score is replaced by
/// a uniform draw from `[0, 1)`.
pub fn descriptor_from_body<R: Rng + ?Sized>(
    base_symbol: &str,
    body: &str,
    rng: &mut R,
) -> Result<TargetDescriptor> {
    let payload: SignalPayload = serde_json::from_str(body)
        .map_err(|e| DispatchError::Signal(format!("malformed body: {e}")))?;
    let ticker = payload
        .ticker
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| DispatchError::Signal("response has no ticker".to_string()))?;
    let confidence = payload
        .score
        .as_ref()
        .and_then(score_from_value)
        .unwrap_or_else(|| rng.gen::<f64>());
    Ok(TargetDescriptor::round_trip(base_symbol, &ticker, confidence))
}

pub struct SignalProducer {
    client: reqwest::Client,
    url: String,
    base_symbol: String,
    interval: Duration,
    writer: TargetWriter,
    rng: StdRng,
}

impl SignalProducer {
    pub fn new(url: String, config: &SignalConfig, writer: TargetWriter) -> Self {
        let client = match reqwest::Client::builder().timeout(config.timeout).build() {
            Ok(client) => client,
            Err(err) => {
                tracing::warn!(
                    "[SIGNAL] failed to build timeout HTTP client: {err}; falling back to default client"
                );
                reqwest::Client::new()
            }
        };
        Self {
            client,
            url,
            base_symbol: config.base_symbol.clone(),
            interval: config.poll_interval,
            writer,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    async fn fetch(&mut self) -> Result<TargetDescriptor> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| DispatchError::Signal(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Signal(format!("HTTP {status}")));
        }
        let body = response
            .text()
            .await
            .map_err(|e| DispatchError::Signal(e.to_string()))?;
        descriptor_from_body(&self.base_symbol, &body, &mut self.rng)
    }

    /// Performs one poll and publishes on success. The prior target survives a failure.
    pub async fn poll_once(&mut self) -> Result<()> {
        let descriptor = self.fetch().await?;
        if !descriptor.confidence_in_range() {
            tracing::warn!(
                "[SIGNAL] confidence {} for {} is outside [0, 1]; upstream producer bug",
                descriptor.confidence,
                descriptor.ticker
            );
        }
        let previous = self.writer.current();
        if previous.ticker != descriptor.ticker {
            tracing::info!(
                "[SIGNAL] target {} -> {} (confidence {:.3})",
                previous.ticker,
                descriptor.ticker,
                descriptor.confidence
            );
        }
        self.writer.publish(descriptor);
        Ok(())
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            "[SIGNAL] polling {} every {:?}",
            self.url,
            self.interval
        );
        while !*shutdown.borrow() {
            if let Err(err) = self.poll_once().await {
                tracing::warn!(
                    "[SIGNAL] poll failed, keeping {}: {}",
                    self.writer.current().ticker,
                    compact_error_message(&err.to_string(), SIGNAL_ERR_MAX_LEN)
                );
            }
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::info!("[SIGNAL] producer stopped");
    }
}
