//! Per-network sequence (nonce) allocator.
//!
//! A single owner task holds the counter. Allocation and resync requests both travel through
//! its channel, so an optimistic `allocate` and a remote-driven overwrite can never interleave
//! inside one update. Allocation is optimistic: the counter advances before the caller knows
//! whether the submission will be accepted, and is never rolled back.

use crate::error::compact_error_message;
use crate::pool::{EndpointHandle, EndpointPool};
use crate::transport::SubmissionTransport;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

const COMMAND_QUEUE_CAPACITY: usize = 1_024;
const SEQ_ERR_MAX_LEN: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SequenceSnapshot {
    /// `None` means the network is inactive.
    pub next: Option<u64>,
    pub allocated: u64,
    pub resyncs_applied: u64,
    pub resyncs_failed: u64,
    pub resync_in_flight: bool,
}

enum Command {
    Allocate(oneshot::Sender<Option<u64>>),
    Resync(Option<oneshot::Sender<Option<u64>>>),
    Resynced(Result<u64, String>),
    Snapshot(oneshot::Sender<SequenceSnapshot>),
}

/// Queries the trusted (first) endpoint for its view of our next sequence number.
/// `None` when the pool is empty or the query fails; the network then starts inactive.
pub async fn bootstrap<T: SubmissionTransport>(pool: &EndpointPool<T>) -> Option<u64> {
    let trusted = pool.primary()?;
    match trusted.transport.sequence().await {
        Ok(seq) => {
            tracing::info!(
                "[SEQ] {}: bootstrapped at {} from {}",
                pool.network(),
                seq,
                trusted.url
            );
            Some(seq)
        }
        Err(err) => {
            tracing::error!(
                "[SEQ] {}: bootstrap query to {} failed; network disabled: {}",
                pool.network(),
                trusted.url,
                compact_error_message(&err.to_string(), SEQ_ERR_MAX_LEN)
            );
            None
        }
    }
}

/// Handle to a network's sequence owner task. Cheap to clone.
#[derive(Clone)]
pub struct SequenceAllocator {
    network: Arc<str>,
    tx: mpsc::Sender<Command>,
}

impl SequenceAllocator {
    /// Spawns the owner task. `initial = None` yields a permanently inactive allocator.
    pub fn spawn<T: SubmissionTransport>(
        network: &str,
        initial: Option<u64>,
        trusted: Option<Arc<EndpointHandle<T>>>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let owner = SequenceOwner {
            network: Arc::from(network),
            next: initial,
            trusted,
            loopback: tx.downgrade(),
            resync_in_flight: false,
            waiters: Vec::new(),
            allocated: 0,
            resyncs_applied: 0,
            resyncs_failed: 0,
        };
        tokio::spawn(owner.run(rx));
        Self {
            network: Arc::from(network),
            tx,
        }
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    /// Returns the current value and advances the counter, or `None` if inactive.
    pub async fn allocate(&self) -> Option<u64> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Command::Allocate(reply)).await.ok()?;
        rx.await.ok().flatten()
    }

    /// Requests a background re-query of the trusted endpoint. Never waits; coalesces with a
    /// query already in flight.
    pub fn resync(&self) {
        if let Err(err) = self.tx.try_send(Command::Resync(None)) {
            tracing::debug!("[SEQ] {}: resync request not queued: {}", self.network, err);
        }
    }

    /// Like `resync`, but resolves with the counter value once the pending query settles.
    pub async fn resync_settled(&self) -> Option<u64> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Command::Resync(Some(reply))).await.ok()?;
        rx.await.ok().flatten()
    }

    pub async fn snapshot(&self) -> SequenceSnapshot {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(Command::Snapshot(reply)).await.is_err() {
            return SequenceSnapshot::default();
        }
        rx.await.unwrap_or_default()
    }
}

struct SequenceOwner<T> {
    network: Arc<str>,
    next: Option<u64>,
    trusted: Option<Arc<EndpointHandle<T>>>,
    loopback: mpsc::WeakSender<Command>,
    resync_in_flight: bool,
    waiters: Vec<oneshot::Sender<Option<u64>>>,
    allocated: u64,
    resyncs_applied: u64,
    resyncs_failed: u64,
}

impl<T: SubmissionTransport> SequenceOwner<T> {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        while let Some(cmd) = rx.recv().await {
            match cmd {
                Command::Allocate(reply) => {
                    let current = self.next;
                    if let Some(n) = current {
                        self.next = Some(n.saturating_add(1));
                        self.allocated += 1;
                    }
                    let _ = reply.send(current);
                }
                Command::Resync(waiter) => {
                    if let Some(w) = waiter {
                        self.waiters.push(w);
                    }
                    self.start_resync();
                }
                Command::Resynced(result) => self.apply_resync(result),
                Command::Snapshot(reply) => {
                    let _ = reply.send(SequenceSnapshot {
                        next: self.next,
                        allocated: self.allocated,
                        resyncs_applied: self.resyncs_applied,
                        resyncs_failed: self.resyncs_failed,
                        resync_in_flight: self.resync_in_flight,
                    });
                }
            }
        }
        tracing::debug!("[SEQ] {}: owner task stopped", self.network);
    }

    fn start_resync(&mut self) {
        if self.resync_in_flight {
            return;
        }
        let trusted = match (&self.trusted, self.next) {
            (Some(trusted), Some(_)) => trusted.clone(),
            _ => {
                self.notify_waiters();
                return;
            }
        };
        let Some(loopback) = self.loopback.upgrade() else {
            self.notify_waiters();
            return;
        };

        self.resync_in_flight = true;
        tokio::spawn(async move {
            let result = trusted
                .transport
                .sequence()
                .await
                .map_err(|err| err.to_string());
            let _ = loopback.send(Command::Resynced(result)).await;
        });
    }

    fn apply_resync(&mut self, result: Result<u64, String>) {
        self.resync_in_flight = false;
        match result {
            Ok(remote) => {
                tracing::info!(
                    "[SEQ] {}: resynced {:?} -> {}",
                    self.network,
                    self.next,
                    remote
                );
                self.next = Some(remote);
                self.resyncs_applied += 1;
            }
            Err(err) => {
                self.resyncs_failed += 1;
                tracing::warn!(
                    "[SEQ] {}: resync query failed, keeping {:?}: {}",
                    self.network,
                    self.next,
                    compact_error_message(&err, SEQ_ERR_MAX_LEN)
                );
            }
        }
        self.notify_waiters();
    }

    fn notify_waiters(&mut self) {
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(self.next);
        }
    }
}
