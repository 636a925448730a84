use alloy::primitives::U256;

/// Built-in defaults for a network id. Env keys override every field.
#[derive(Debug, Clone, Copy)]
pub struct NetworkDefaults {
    pub id: &'static str,
    pub chain_id: u64,
    pub name: &'static str,
    pub native_symbol: &'static str,
    pub decimals: u8,
    pub rpc_urls: &'static [&'static str],
    pub priority_fee_gwei: &'static str,
    pub size_min: &'static str,
    pub size_max: &'static str,
}

const ETHEREUM_RPCS: &[&str] = &[
    "https://eth.llamarpc.com",
    "https://ethereum-rpc.publicnode.com",
    "https://rpc.ankr.com/eth",
];

const BASE_RPCS: &[&str] = &[
    "https://mainnet.base.org",
    "https://base-rpc.publicnode.com",
    "https://base.llamarpc.com",
];

const ARBITRUM_RPCS: &[&str] = &[
    "https://arb1.arbitrum.io/rpc",
    "https://arbitrum-one-rpc.publicnode.com",
];

const OPTIMISM_RPCS: &[&str] = &[
    "https://mainnet.optimism.io",
    "https://optimism-rpc.publicnode.com",
];

const POLYGON_RPCS: &[&str] = &[
    "https://polygon-rpc.com",
    "https://polygon-bor-rpc.publicnode.com",
];

const BSC_RPCS: &[&str] = &[
    "https://bsc-dataseed.bnbchain.org",
    "https://bsc-rpc.publicnode.com",
];

const AVALANCHE_RPCS: &[&str] = &[
    "https://api.avax.network/ext/bc/C/rpc",
    "https://avalanche-c-chain-rpc.publicnode.com",
];

const CATALOG: &[NetworkDefaults] = &[
    NetworkDefaults {
        id: "ethereum",
        chain_id: 1,
        name: "Ethereum Mainnet",
        native_symbol: "ETH",
        decimals: 18,
        rpc_urls: ETHEREUM_RPCS,
        priority_fee_gwei: "2",
        size_min: "0.01",
        size_max: "0.05",
    },
    NetworkDefaults {
        id: "base",
        chain_id: 8453,
        name: "Base",
        native_symbol: "ETH",
        decimals: 18,
        rpc_urls: BASE_RPCS,
        priority_fee_gwei: "0.01",
        size_min: "0.01",
        size_max: "0.05",
    },
    NetworkDefaults {
        id: "arbitrum",
        chain_id: 42161,
        name: "Arbitrum One",
        native_symbol: "ETH",
        decimals: 18,
        rpc_urls: ARBITRUM_RPCS,
        priority_fee_gwei: "0.01",
        size_min: "0.01",
        size_max: "0.05",
    },
    NetworkDefaults {
        id: "optimism",
        chain_id: 10,
        name: "OP Mainnet",
        native_symbol: "ETH",
        decimals: 18,
        rpc_urls: OPTIMISM_RPCS,
        priority_fee_gwei: "0.01",
        size_min: "0.01",
        size_max: "0.05",
    },
    NetworkDefaults {
        id: "polygon",
        chain_id: 137,
        name: "Polygon PoS",
        native_symbol: "POL",
        decimals: 18,
        rpc_urls: POLYGON_RPCS,
        priority_fee_gwei: "30",
        size_min: "50",
        size_max: "200",
    },
    NetworkDefaults {
        id: "bsc",
        chain_id: 56,
        name: "BNB Smart Chain",
        native_symbol: "BNB",
        decimals: 18,
        rpc_urls: BSC_RPCS,
        priority_fee_gwei: "1",
        size_min: "0.05",
        size_max: "0.2",
    },
    NetworkDefaults {
        id: "avalanche",
        chain_id: 43114,
        name: "Avalanche C-Chain",
        native_symbol: "AVAX",
        decimals: 18,
        rpc_urls: AVALANCHE_RPCS,
        priority_fee_gwei: "1.5",
        size_min: "1",
        size_max: "5",
    },
];

impl NetworkDefaults {
    pub fn lookup(id: &str) -> Option<&'static NetworkDefaults> {
        let id = id.trim();
        CATALOG.iter().find(|n| n.id.eq_ignore_ascii_case(id))
    }

    pub fn catalog() -> &'static [NetworkDefaults] {
        CATALOG
    }
}

/// Static description of one network, resolved once at startup.
#[derive(Debug, Clone)]
pub struct NetworkProfile {
    pub id: String,
    pub chain_id: u64,
    pub name: String,
    /// Ordered; the first entry is the trusted endpoint for sequence queries.
    pub rpc_urls: Vec<String>,
    pub native_symbol: String,
    pub decimals: u8,
    pub priority_fee_wei: u128,
    /// Magnitude bounds in base units (already scaled by `decimals`).
    pub size_min: U256,
    pub size_max: U256,
    /// 0 means unbounded.
    pub max_fires_per_sec: u32,
    pub max_in_flight: usize,
}

impl NetworkProfile {
    /// Env key prefix for per-network overrides, e.g. `BASE_RPC_URLS`.
    pub fn env_prefix(id: &str) -> String {
        id.trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect()
    }
}
