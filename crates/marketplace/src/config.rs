use {
    alloy::primitives::Address,
    anyhow::{Context, Result},
    serde::{Deserialize, Serialize},
    std::{num::NonZeroUsize, path::Path},
    url::Url,
};

/// Top level configuration, loaded from a toml file.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// JSON-RPC node to talk to.
    pub node_url: Url,

    /// Address of the deployed marketplace contract.
    pub market_address: Address,

    /// Ticker of the chain's native currency, for presentation.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Content retrieval and pinning.
    #[serde(default)]
    pub ipfs: ipfs::IpfsConfig,

    /// Metadata aggregation tunables.
    #[serde(default)]
    pub aggregator: AggregatorSettings,
}

fn default_currency() -> String {
    "BNB".to_string()
}

/// Serde face of [`metadata::AggregatorConfig`].
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct AggregatorSettings {
    /// Upper bound on concurrently resolving records.
    pub max_concurrent: Option<NonZeroUsize>,

    /// Whether an access denied response gets one extra attempt against
    /// the public gateway.
    pub retry_denied_via_public: Option<bool>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&raw).context("invalid configuration")
    }

    pub fn aggregator_config(&self) -> metadata::AggregatorConfig {
        metadata::AggregatorConfig {
            max_concurrent: self.aggregator.max_concurrent,
            retry_denied_via_public: self.aggregator.retry_denied_via_public.unwrap_or(true),
            public_gateway: self.ipfs.public_gateway.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::io::Write};

    #[test]
    fn loads_a_minimal_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            node-url = "https://data-seed-prebsc-1-s1.binance.org:8545/"
            market-address = "0x9ba1bcd88e99d6e1e03252a70a63fea83bf1208c"
            "#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.currency, "BNB");
        assert_eq!(config.ipfs.gateways, ipfs::config::default_gateways());
        let aggregator = config.aggregator_config();
        assert!(aggregator.retry_denied_via_public);
        assert!(aggregator.max_concurrent.is_none());
    }

    #[test]
    fn deserialize_full() {
        let toml = r#"
        node-url = "http://localhost:8545"
        market-address = "0x9ba1bcd88e99d6e1e03252a70a63fea83bf1208c"
        currency = "ETH"

        [ipfs]
        timeout = "3s"

        [aggregator]
        max-concurrent = 8
        retry-denied-via-public = false
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.currency, "ETH");
        let aggregator = config.aggregator_config();
        assert_eq!(aggregator.max_concurrent, NonZeroUsize::new(8));
        assert!(!aggregator.retry_denied_via_public);
    }

    #[test]
    fn rejects_unknown_fields() {
        let toml = r#"
        node-url = "http://localhost:8545"
        market-address = "0x9ba1bcd88e99d6e1e03252a70a63fea83bf1208c"
        nodeurl = "oops"
        "#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }
}
