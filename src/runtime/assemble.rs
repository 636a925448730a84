use crate::config::Config;
use crate::dispatch::{FeePolicy, NetworkDispatcher};
use crate::pool::EndpointPool;
use crate::target::TargetReader;
use crate::transport::EvmEndpoint;
use alloy::signers::local::PrivateKeySigner;
use std::sync::Arc;

/// Builds one dispatcher per configured network, in `NETWORKS` order. Networks that end up
/// without endpoints or without a bootstrapped sequence are still returned, marked inactive.
pub async fn build_dispatchers(
    config: &Config,
    signer: &PrivateKeySigner,
    target: &TargetReader,
) -> Vec<Arc<NetworkDispatcher<EvmEndpoint>>> {
    let fees = FeePolicy {
        max_fee_per_gas: config.max_fee_wei,
        gas_limit: config.gas_limit,
    };
    let mut dispatchers = Vec::with_capacity(config.networks.len());
    for profile in &config.networks {
        let pool = EndpointPool::initialize(profile, |url| {
            EvmEndpoint::connect(url, signer, config.executor_address, profile.chain_id)
        });
        let dispatcher =
            NetworkDispatcher::bootstrap(profile.clone(), pool, target.clone(), fees).await;
        dispatchers.push(Arc::new(dispatcher));
    }
    dispatchers
}
