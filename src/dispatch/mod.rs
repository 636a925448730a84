//! Per-network fire-and-forget dispatcher.
//!
//! `fire` picks an endpoint, allocates a sequence number, snapshots the target, sizes the
//! request and hands submission to a spawned task. It returns as soon as the submission is
//! issued. Completions arrive in any order and only drive logging, stats, and (for
//! sequence conflicts) a background resync.

pub mod classify;

use crate::config::NetworkProfile;
use crate::error::compact_error_message;
use crate::pool::EndpointPool;
use crate::sequence::{self, SequenceAllocator};
use crate::sizing::SizeGenerator;
use crate::target::TargetReader;
use crate::transport::{SubmissionRequest, SubmissionTransport};
use alloy::primitives::{TxHash, U256};
use classify::{classify_failure, FailureClass};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::Semaphore;

const FIRE_ERR_MAX_LEN: usize = 240;

/// Transport-level parameters shared by every network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeePolicy {
    pub max_fee_per_gas: u128,
    pub gas_limit: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// No usable endpoints or no bootstrapped sequence. Nothing was mutated.
    Inactive,
    /// The in-flight bound is reached. Nothing was allocated.
    Saturated,
    Issued { sequence: u64, endpoint: usize },
}

#[derive(Debug, Default)]
pub struct DispatchStats {
    issued: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    conflicts: AtomicU64,
    rate_limited: AtomicU64,
    saturated: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchStatsSnapshot {
    pub issued: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub conflicts: u64,
    pub rate_limited: u64,
    pub saturated: u64,
}

impl DispatchStats {
    pub fn snapshot(&self) -> DispatchStatsSnapshot {
        DispatchStatsSnapshot {
            issued: self.issued.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            saturated: self.saturated.load(Ordering::Relaxed),
        }
    }
}

pub struct NetworkDispatcher<T> {
    profile: NetworkProfile,
    pool: Arc<EndpointPool<T>>,
    sequences: SequenceAllocator,
    sizer: SizeGenerator,
    target: TargetReader,
    fees: FeePolicy,
    in_flight: Arc<Semaphore>,
    max_in_flight: usize,
    rng: StdMutex<StdRng>,
    stats: Arc<DispatchStats>,
    active: bool,
}

impl<T: SubmissionTransport> NetworkDispatcher<T> {
    /// Bootstraps the sequence counter from the pool's trusted endpoint and wires the
    /// dispatcher. A network whose pool is empty or whose bootstrap fails is inactive.
    pub async fn bootstrap(
        profile: NetworkProfile,
        pool: EndpointPool<T>,
        target: TargetReader,
        fees: FeePolicy,
    ) -> Self {
        let seq0 = sequence::bootstrap(&pool).await;
        let sequences = SequenceAllocator::spawn(&profile.id, seq0, pool.primary());
        Self::new(profile, pool, sequences, target, fees, seq0.is_some())
    }

    pub fn new(
        profile: NetworkProfile,
        pool: EndpointPool<T>,
        sequences: SequenceAllocator,
        target: TargetReader,
        fees: FeePolicy,
        bootstrapped: bool,
    ) -> Self {
        let max_in_flight = profile.max_in_flight.max(1);
        let active = bootstrapped && !pool.is_empty();
        if !active {
            tracing::warn!(
                "[FIRE] {}: inactive (endpoints={}, bootstrapped={}); dispatch will skip it",
                profile.id,
                pool.len(),
                bootstrapped
            );
        }
        Self {
            sizer: SizeGenerator::for_profile(&profile),
            profile,
            pool: Arc::new(pool),
            sequences,
            target,
            fees,
            in_flight: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
            rng: StdMutex::new(StdRng::from_entropy()),
            stats: Arc::new(DispatchStats::default()),
            active,
        }
    }

    /// Replaces the size RNG with a seeded one.
    pub fn with_rng_seed(self, seed: u64) -> Self {
        Self {
            rng: StdMutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    pub fn network(&self) -> &str {
        &self.profile.id
    }

    pub fn profile(&self) -> &NetworkProfile {
        &self.profile
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn pool(&self) -> &EndpointPool<T> {
        &self.pool
    }

    pub fn sequences(&self) -> &SequenceAllocator {
        &self.sequences
    }

    pub fn stats(&self) -> DispatchStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn in_flight(&self) -> usize {
        self.max_in_flight
            .saturating_sub(self.in_flight.available_permits())
    }

    pub fn has_capacity(&self) -> bool {
        self.in_flight.available_permits() > 0
    }

    /// Resolves once at least one in-flight slot is free. Holds nothing on return.
    pub async fn wait_for_capacity(&self) {
        if let Ok(permit) = self.in_flight.acquire().await {
            drop(permit);
        }
    }

    fn next_size(&self) -> U256 {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| {
            tracing::error!("[FIRE] {}: size RNG lock poisoned; recovering", self.profile.id);
            poisoned.into_inner()
        });
        self.sizer.size(&mut *rng)
    }

    /// Issues one submission and returns without waiting for its completion.
    pub async fn fire(&self) -> FireOutcome {
        if !self.active {
            return FireOutcome::Inactive;
        }
        let Ok(permit) = self.in_flight.clone().try_acquire_owned() else {
            self.stats.saturated.fetch_add(1, Ordering::Relaxed);
            return FireOutcome::Saturated;
        };
        let Some(endpoint) = self.pool.next() else {
            return FireOutcome::Inactive;
        };
        let Some(sequence) = self.sequences.allocate().await else {
            return FireOutcome::Inactive;
        };

        let target = self.target.snapshot();
        let amount = self.next_size();
        let request = SubmissionRequest {
            path: target.path.clone(),
            amount,
            sequence,
            max_fee_per_gas: self.fees.max_fee_per_gas,
            max_priority_fee_per_gas: self.profile.priority_fee_wei,
            gas_limit: self.fees.gas_limit,
        };
        self.stats.issued.fetch_add(1, Ordering::Relaxed);

        let completion = Completion {
            network: self.profile.id.clone(),
            native_symbol: self.profile.native_symbol.clone(),
            ticker: target.ticker.clone(),
            sequence,
            amount,
            endpoint: endpoint.index,
            sequences: self.sequences.clone(),
            stats: self.stats.clone(),
        };
        let endpoint_index = endpoint.index;
        tokio::spawn(async move {
            let result = endpoint
                .transport
                .submit(request)
                .await
                .map_err(|err| err.to_string());
            completion.record(result);
            drop(permit);
        });

        FireOutcome::Issued {
            sequence,
            endpoint: endpoint_index,
        }
    }

    /// Waits until every in-flight submission has completed, up to `timeout`.
    /// Returns the number still outstanding.
    pub async fn drain(&self, timeout: Duration) -> usize {
        let all = u32::try_from(self.max_in_flight).unwrap_or(u32::MAX);
        match tokio::time::timeout(timeout, self.in_flight.acquire_many(all)).await {
            Ok(Ok(permits)) => {
                drop(permits);
                0
            }
            _ => self.in_flight(),
        }
    }
}

/// What the completion continuation needs; detached from the dispatcher's lifetime.
struct Completion {
    network: String,
    native_symbol: String,
    ticker: String,
    sequence: u64,
    amount: U256,
    endpoint: usize,
    sequences: SequenceAllocator,
    stats: Arc<DispatchStats>,
}

impl Completion {
    fn record(self, result: Result<TxHash, String>) {
        match result {
            Ok(hash) => {
                self.stats.succeeded.fetch_add(1, Ordering::Relaxed);
                tracing::info!(
                    "[FIRE] ✓ {} seq={} size={} {} ticker={} endpoint={} tx={:#x}",
                    self.network,
                    self.sequence,
                    self.amount,
                    self.native_symbol,
                    self.ticker,
                    self.endpoint,
                    hash
                );
            }
            Err(message) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                let class = classify_failure(&message);
                tracing::warn!(
                    "[FIRE] ✗ {} seq={} endpoint={} class={} {}",
                    self.network,
                    self.sequence,
                    self.endpoint,
                    class.as_str(),
                    compact_error_message(&message, FIRE_ERR_MAX_LEN)
                );
                match class {
                    FailureClass::SequenceConflict => {
                        self.stats.conflicts.fetch_add(1, Ordering::Relaxed);
                        self.sequences.resync();
                    }
                    FailureClass::RateLimited => {
                        self.stats.rate_limited.fetch_add(1, Ordering::Relaxed);
                    }
                    FailureClass::Transient => {}
                }
            }
        }
    }
}
