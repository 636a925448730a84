use crate::config::NetworkProfile;
use crate::error::{compact_error_message, TransportError};
use crate::transport::SubmissionTransport;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const POOL_ERR_MAX_LEN: usize = 200;

/// A constructed endpoint and its position in the configured list.
pub struct EndpointHandle<T> {
    /// Index among the handles that survived construction.
    pub index: usize,
    pub url: String,
    pub transport: T,
}

/// Ordered endpoints for one network, visited in fixed round-robin order.
///
/// The cursor advances on every `next` call regardless of what the caller later observes;
/// selection never adapts to latency or error rate.
pub struct EndpointPool<T> {
    network: String,
    handles: Vec<Arc<EndpointHandle<T>>>,
    cursor: AtomicUsize,
}

impl<T: SubmissionTransport> EndpointPool<T> {
    /// Builds a handle per configured URL. Individual failures are logged and that
    /// endpoint is dropped; an empty result is returned as an empty pool, not an error.
    pub fn initialize<F>(profile: &NetworkProfile, mut connect: F) -> Self
    where
        F: FnMut(&str) -> Result<T, TransportError>,
    {
        let mut handles = Vec::with_capacity(profile.rpc_urls.len());
        for url in &profile.rpc_urls {
            match connect(url) {
                Ok(transport) => {
                    tracing::debug!("[POOL] {}: endpoint ready {}", profile.id, url);
                    handles.push(Arc::new(EndpointHandle {
                        index: handles.len(),
                        url: url.clone(),
                        transport,
                    }));
                }
                Err(err) => {
                    tracing::warn!(
                        "[POOL] {}: dropping endpoint {}: {}",
                        profile.id,
                        url,
                        compact_error_message(&err.to_string(), POOL_ERR_MAX_LEN)
                    );
                }
            }
        }

        if handles.is_empty() {
            tracing::error!(
                "[POOL] {}: all {} endpoint(s) failed to construct; network disabled",
                profile.id,
                profile.rpc_urls.len()
            );
        } else {
            tracing::info!(
                "[POOL] {}: {}/{} endpoint(s) usable",
                profile.id,
                handles.len(),
                profile.rpc_urls.len()
            );
        }

        Self::from_transports_inner(profile.id.clone(), handles)
    }

    /// Wraps already-constructed transports, keeping their order.
    pub fn from_transports(network: impl Into<String>, transports: Vec<T>) -> Self {
        let handles = transports
            .into_iter()
            .enumerate()
            .map(|(index, transport)| {
                Arc::new(EndpointHandle {
                    index,
                    url: transport.label().to_string(),
                    transport,
                })
            })
            .collect();
        Self::from_transports_inner(network.into(), handles)
    }

    fn from_transports_inner(network: String, handles: Vec<Arc<EndpointHandle<T>>>) -> Self {
        Self {
            network,
            handles,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// The trusted endpoint used for sequence queries.
    pub fn primary(&self) -> Option<Arc<EndpointHandle<T>>> {
        self.handles.first().cloned()
    }

    /// Returns the handle at `cursor mod len` and advances the cursor.
    pub fn next(&self) -> Option<Arc<EndpointHandle<T>>> {
        let n = self.handles.len();
        if n == 0 {
            return None;
        }
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % n;
        Some(self.handles[idx].clone())
    }

    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }
}
