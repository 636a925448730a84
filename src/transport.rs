use crate::error::TransportError;
use alloy::eips::eip2718::Encodable2718;
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::eth::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::sol_types::SolCall;
use alloy::transports::http::Http;
use async_trait::async_trait;
use reqwest::Client;
use std::str::FromStr;

alloy::sol! {
    interface IRouteExecutor {
        function executeRoute(string[] calldata path, uint256 amount) external payable;
    }
}

/// Everything one submission carries. Attached value is always zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    pub path: Vec<String>,
    pub amount: U256,
    pub sequence: u64,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
    pub gas_limit: u64,
}

/// One reachable endpoint bound to a signing identity.
#[async_trait]
pub trait SubmissionTransport: Send + Sync + 'static {
    /// Human-readable endpoint label for logs.
    fn label(&self) -> &str;

    /// Next sequence number the remote ledger expects from our signer, counting pending
    /// submissions.
    async fn sequence(&self) -> Result<u64, TransportError>;

    /// Hands the request to the endpoint. Resolves once the endpoint has accepted or
    /// rejected it; inclusion is never awaited.
    async fn submit(&self, request: SubmissionRequest) -> Result<TxHash, TransportError>;
}

pub type HttpProvider = RootProvider<Http<Client>>;

pub fn parse_signer(raw: &str) -> Result<PrivateKeySigner, TransportError> {
    let clean = raw.trim().trim_start_matches("0x");
    if clean.len() != 64 {
        return Err(TransportError::Signing(format!(
            "private key must be 32 bytes of hex, got {} chars",
            clean.len()
        )));
    }
    PrivateKeySigner::from_str(clean)
        .map_err(|e| TransportError::Signing(format!("invalid private key: {e}")))
}

pub struct EvmEndpoint {
    url: String,
    provider: HttpProvider,
    wallet: EthereumWallet,
    signer_address: Address,
    executor: Address,
    chain_id: u64,
}

impl std::fmt::Debug for EvmEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmEndpoint")
            .field("url", &self.url)
            .field("signer_address", &self.signer_address)
            .field("executor", &self.executor)
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

impl EvmEndpoint {
    pub fn connect(
        url: &str,
        signer: &PrivateKeySigner,
        executor: Address,
        chain_id: u64,
    ) -> Result<Self, TransportError> {
        let trimmed = url.trim();
        let parsed = trimmed
            .parse::<reqwest::Url>()
            .map_err(|e| TransportError::InvalidUrl {
                url: trimmed.to_string(),
                reason: e.to_string(),
            })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TransportError::InvalidUrl {
                url: trimmed.to_string(),
                reason: format!("unsupported scheme `{}`", parsed.scheme()),
            });
        }

        Ok(Self {
            url: trimmed.to_string(),
            provider: ProviderBuilder::new().on_http(parsed),
            wallet: EthereumWallet::from(signer.clone()),
            signer_address: signer.address(),
            executor,
            chain_id,
        })
    }

    fn build_request(&self, request: &SubmissionRequest) -> TransactionRequest {
        let calldata = IRouteExecutor::executeRouteCall {
            path: request.path.clone(),
            amount: request.amount,
        }
        .abi_encode();

        let mut tx = TransactionRequest::default()
            .with_to(self.executor)
            .with_input(calldata)
            .with_chain_id(self.chain_id)
            .with_nonce(request.sequence)
            .with_gas_limit(request.gas_limit)
            .with_max_fee_per_gas(request.max_fee_per_gas)
            .with_max_priority_fee_per_gas(request.max_priority_fee_per_gas)
            .with_value(U256::ZERO);
        tx.from = Some(self.signer_address);
        tx
    }
}

#[async_trait]
impl SubmissionTransport for EvmEndpoint {
    fn label(&self) -> &str {
        &self.url
    }

    async fn sequence(&self) -> Result<u64, TransportError> {
        self.provider
            .get_transaction_count(self.signer_address)
            .pending()
            .await
            .map_err(|e| TransportError::Rpc(e.to_string()))
    }

    async fn submit(&self, request: SubmissionRequest) -> Result<TxHash, TransportError> {
        let envelope = self
            .build_request(&request)
            .build(&self.wallet)
            .await
            .map_err(|e| TransportError::Signing(e.to_string()))?;
        let pending = self
            .provider
            .send_raw_transaction(&envelope.encoded_2718())
            .await
            .map_err(|e| TransportError::Rpc(e.to_string()))?;
        Ok(*pending.tx_hash())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    fn request() -> SubmissionRequest {
        SubmissionRequest {
            path: vec!["USDC".into(), "WETH".into(), "USDC".into()],
            amount: U256::from(1_000u64),
            sequence: 42,
            max_fee_per_gas: 50_000_000_000,
            max_priority_fee_per_gas: 2_000_000_000,
            gas_limit: 300_000,
        }
    }

    #[test]
    fn test_parse_signer_accepts_prefixed_and_bare_hex() {
        let a = parse_signer(KEY).unwrap();
        let b = parse_signer(&KEY[2..]).unwrap();
        assert_eq!(a.address(), b.address());
        assert!(parse_signer("0x1234").is_err());
    }

    #[test]
    fn test_connect_rejects_bad_urls() {
        let signer = parse_signer(KEY).unwrap();
        let executor = address!("00000000000000000000000000000000000000aa");
        assert!(matches!(
            EvmEndpoint::connect("not a url", &signer, executor, 1),
            Err(TransportError::InvalidUrl { .. })
        ));
        assert!(matches!(
            EvmEndpoint::connect("wss://node.example", &signer, executor, 1),
            Err(TransportError::InvalidUrl { .. })
        ));
        assert!(EvmEndpoint::connect("http://127.0.0.1:8545", &signer, executor, 1).is_ok());
    }

    #[test]
    fn test_built_request_carries_transport_parameters() {
        let signer = parse_signer(KEY).unwrap();
        let executor = address!("00000000000000000000000000000000000000aa");
        let endpoint = EvmEndpoint::connect("http://127.0.0.1:8545", &signer, executor, 8453)
            .unwrap();
        let tx = endpoint.build_request(&request());

        assert_eq!(tx.nonce, Some(42));
        assert_eq!(tx.gas, Some(300_000));
        assert_eq!(tx.max_fee_per_gas, Some(50_000_000_000));
        assert_eq!(tx.max_priority_fee_per_gas, Some(2_000_000_000));
        assert_eq!(tx.value, Some(U256::ZERO));
        assert_eq!(tx.chain_id, Some(8453));
        assert_eq!(tx.from, Some(signer.address()));

        let input = tx.input.input().cloned().unwrap_or_default();
        let decoded = IRouteExecutor::executeRouteCall::abi_decode(&input, true).unwrap();
        assert_eq!(decoded.path, vec!["USDC", "WETH", "USDC"]);
        assert_eq!(decoded.amount, U256::from(1_000u64));
    }
}
