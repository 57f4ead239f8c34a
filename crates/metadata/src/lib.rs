//! Joins on-chain market items with their off-chain metadata into
//! display ready records.

use {
    futures::{StreamExt, stream},
    ipfs::{FetchError, GatewayClient, Reference},
    model::{DisplayNft, MarketItem, TokenMetadata},
    serde_json::Value,
    std::num::NonZeroUsize,
    url::Url,
};

/// Tunables of the aggregation fan out.
#[derive(Clone, Debug)]
pub struct AggregatorConfig {
    /// Upper bound on concurrently resolving records. `None` launches
    /// every record at once.
    pub max_concurrent: Option<NonZeroUsize>,

    /// Whether an access denied response gets one extra attempt against
    /// the public gateway before the record is given up on.
    pub retry_denied_via_public: bool,

    /// Gateway used for that extra attempt.
    pub public_gateway: Url,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: None,
            retry_denied_via_public: true,
            public_gateway: ipfs::PUBLIC_GATEWAY.parse().unwrap(),
        }
    }
}

/// Failure to produce a display record for one market item.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("metadata unavailable: {0}")]
    Unavailable(#[from] FetchError),
    #[error("metadata malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Resolves the off-chain metadata of market items and joins it with the
/// on-chain record.
pub struct MetadataAggregator {
    gateway: GatewayClient,
    config: AggregatorConfig,
    metrics: &'static Metrics,
}

#[derive(prometheus_metric_storage::MetricStorage, Clone, Debug)]
#[metric(subsystem = "metadata")]
struct Metrics {
    /// Number of completed metadata resolutions.
    #[metric(labels("outcome"))]
    resolutions: prometheus::IntCounterVec,

    /// Timing of metadata aggregation batches.
    batches: prometheus::Histogram,
}

impl MetadataAggregator {
    pub fn new(gateway: GatewayClient, config: AggregatorConfig) -> Self {
        let metrics = Metrics::instance(observe::metrics::get_storage_registry()).unwrap();
        // Initialize metrics.
        for outcome in &["found", "missing"] {
            metrics.resolutions.with_label_values(&[outcome]);
        }
        Self {
            gateway,
            config,
            metrics,
        }
    }

    /// Resolves the metadata of every item concurrently.
    ///
    /// The result has the same length and order as the input. A record
    /// whose metadata cannot be retrieved yields `None` in its slot and
    /// never fails the batch or its sibling records. Callers decide
    /// whether absent slots are filtered out or rendered as placeholders.
    pub async fn aggregate(&self, items: &[MarketItem]) -> Vec<Option<DisplayNft>> {
        let _timer = self.metrics.batches.start_timer();
        let tasks = items.iter().map(|item| async move {
            match self.resolve(item).await {
                Ok(nft) => {
                    self.metrics.resolutions.with_label_values(&["found"]).inc();
                    Some(nft)
                }
                Err(err) => {
                    self.metrics
                        .resolutions
                        .with_label_values(&["missing"])
                        .inc();
                    tracing::warn!(
                        token_id = %item.token_id,
                        uri = %item.token_uri,
                        ?err,
                        "failed to resolve metadata"
                    );
                    None
                }
            }
        });
        match self.config.max_concurrent {
            Some(limit) => {
                stream::iter(tasks)
                    .buffered(limit.get())
                    .collect::<Vec<_>>()
                    .await
            }
            None => futures::future::join_all(tasks).await,
        }
    }

    /// Resolves a single item, propagating failures. Used by the detail
    /// and resale views, which have nothing to show without metadata.
    pub async fn resolve(&self, item: &MarketItem) -> Result<DisplayNft, MetadataError> {
        let payload = self.fetch(&item.token_uri).await?;
        let metadata: TokenMetadata = serde_json::from_value(payload)?;
        Ok(DisplayNft {
            token_id: item.token_id,
            seller: item.seller,
            owner: item.owner,
            price: number::format_ether(item.price),
            image: ipfs::accessible_url(&metadata.image),
            name: metadata.name,
            description: metadata.description,
            token_uri: item.token_uri.clone(),
        })
    }

    async fn fetch(&self, uri: &str) -> Result<Value, MetadataError> {
        let err = match self.gateway.fetch(uri).await {
            Ok(payload) => return Ok(payload),
            Err(err) => err,
        };
        // One bounded extra attempt, never a retry loop.
        if self.config.retry_denied_via_public && err.is_access_denied() {
            if let Some(cid) = Reference::parse(uri).cid() {
                tracing::debug!(%uri, "access denied, retrying via public gateway");
                if let Ok(payload) = self
                    .gateway
                    .fetch_via(&self.config.public_gateway, cid)
                    .await
                {
                    return Ok(payload);
                }
            }
        }
        Err(err.into())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::primitives::{Address, U256},
        httpmock::prelude::*,
        ipfs::IpfsConfig,
        serde_json::json,
        std::time::Duration,
    };

    fn item(token_id: u64, price: u128, token_uri: &str) -> MarketItem {
        MarketItem {
            token_id: U256::from(token_id),
            seller: Address::repeat_byte(0x11),
            owner: Address::repeat_byte(0x22),
            price: U256::from(price),
            token_uri: token_uri.to_string(),
        }
    }

    fn aggregator(gateways: &[String], config: AggregatorConfig) -> MetadataAggregator {
        let gateway = GatewayClient::new(&IpfsConfig {
            gateways: gateways.iter().map(|url| url.parse().unwrap()).collect(),
            timeout: Duration::from_millis(500),
            ..Default::default()
        });
        MetadataAggregator::new(gateway, config)
    }

    // The primary gateway times out for the first record, the fallback
    // serves it; the second record's uri is fetched directly. The first
    // image is rewritten onto the public gateway, the second is already
    // a complete url and left alone.
    #[tokio::test]
    async fn aggregates_across_gateways_and_direct_urls() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/g1/Qm111");
            then.status(200)
                .json_body(json!({"name": "late"}))
                .delay(Duration::from_secs(2));
        });
        server.mock(|when, then| {
            when.method(GET).path("/g2/Qm111");
            then.status(200)
                .json_body(json!({"name": "A", "description": "d", "image": "Qm_img"}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/host/2.json");
            then.status(200).json_body(
                json!({"name": "B", "description": "e", "image": "https://host/img2.png"}),
            );
        });

        let aggregator = aggregator(
            &[server.url("/g1"), server.url("/g2")],
            AggregatorConfig::default(),
        );
        let items = [
            item(1, 1_500_000_000_000_000_000, "ipfs://Qm111"),
            item(2, 1_000_000_000_000_000_000, &server.url("/host/2.json")),
        ];
        let nfts = aggregator.aggregate(&items).await;

        assert_eq!(nfts.len(), 2);
        let first = nfts[0].as_ref().unwrap();
        assert_eq!(first.token_id, U256::from(1u64));
        assert_eq!(first.name, "A");
        assert_eq!(first.price, "1.5");
        assert_eq!(first.image, "https://ipfs.io/ipfs/Qm_img");
        let second = nfts[1].as_ref().unwrap();
        assert_eq!(second.name, "B");
        assert_eq!(second.price, "1.0");
        assert_eq!(second.image, "https://host/img2.png");
    }

    #[tokio::test]
    async fn one_failing_record_does_not_fail_the_batch() {
        let server = MockServer::start();
        for cid in ["Qm1", "Qm3"] {
            server.mock(|when, then| {
                when.method(GET).path(format!("/g1/{cid}"));
                then.status(200)
                    .json_body(json!({"name": cid, "image": "Qm_img"}));
            });
        }
        server.mock(|when, then| {
            when.method(GET).path("/g1/Qm2");
            then.status(404);
        });

        let aggregator = aggregator(&[server.url("/g1")], AggregatorConfig::default());
        let items = [
            item(1, 1, "ipfs://Qm1"),
            item(2, 1, "ipfs://Qm2"),
            item(3, 1, "ipfs://Qm3"),
        ];
        let nfts = aggregator.aggregate(&items).await;

        assert_eq!(nfts.len(), 3);
        assert!(nfts[0].is_some());
        assert!(nfts[1].is_none());
        assert!(nfts[2].is_some());
    }

    #[tokio::test]
    async fn malformed_metadata_yields_an_absent_slot() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/g1/Qm1");
            then.status(200).json_body(json!({"name": "no image"}));
        });

        let aggregator = aggregator(&[server.url("/g1")], AggregatorConfig::default());
        let nfts = aggregator.aggregate(&[item(1, 1, "ipfs://Qm1")]).await;
        assert_eq!(nfts, vec![None]);
    }

    #[tokio::test]
    async fn access_denied_gets_one_retry_via_public_gateway() {
        let server = MockServer::start();
        let denied = server.mock(|when, then| {
            when.method(GET).path("/g1/Qm1");
            then.status(403);
        });
        let public = server.mock(|when, then| {
            when.method(GET).path("/public/Qm1");
            then.status(200)
                .json_body(json!({"name": "A", "image": "Qm_img"}));
        });

        let config = AggregatorConfig {
            public_gateway: server.url("/public").parse().unwrap(),
            ..Default::default()
        };
        let aggregator = aggregator(&[server.url("/g1")], config);
        let nfts = aggregator.aggregate(&[item(1, 1, "ipfs://Qm1")]).await;

        assert!(nfts[0].is_some());
        denied.assert_hits(1);
        public.assert_hits(1);
    }

    #[tokio::test]
    async fn access_denied_retry_can_be_disabled() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/g1/Qm1");
            then.status(403);
        });
        let public = server.mock(|when, then| {
            when.method(GET).path("/public/Qm1");
            then.status(200)
                .json_body(json!({"name": "A", "image": "Qm_img"}));
        });

        let config = AggregatorConfig {
            public_gateway: server.url("/public").parse().unwrap(),
            retry_denied_via_public: false,
            ..Default::default()
        };
        let aggregator = aggregator(&[server.url("/g1")], config);
        let nfts = aggregator.aggregate(&[item(1, 1, "ipfs://Qm1")]).await;

        assert!(nfts[0].is_none());
        public.assert_hits(0);
    }

    #[tokio::test]
    async fn not_found_gets_no_retry() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/g1/Qm1");
            then.status(404);
        });
        let public = server.mock(|when, then| {
            when.method(GET).path("/public/Qm1");
            then.status(200)
                .json_body(json!({"name": "A", "image": "Qm_img"}));
        });

        let config = AggregatorConfig {
            public_gateway: server.url("/public").parse().unwrap(),
            ..Default::default()
        };
        let aggregator = aggregator(&[server.url("/g1")], config);
        let nfts = aggregator.aggregate(&[item(1, 1, "ipfs://Qm1")]).await;

        assert!(nfts[0].is_none());
        public.assert_hits(0);
    }

    #[tokio::test]
    async fn bounded_concurrency_preserves_input_order() {
        let server = MockServer::start();
        for (cid, delay) in [("Qm1", 300u64), ("Qm2", 0), ("Qm3", 100), ("Qm4", 0)] {
            server.mock(|when, then| {
                when.method(GET).path(format!("/g1/{cid}"));
                then.status(200)
                    .json_body(json!({"name": cid, "image": "Qm_img"}))
                    .delay(Duration::from_millis(delay));
            });
        }

        let config = AggregatorConfig {
            max_concurrent: NonZeroUsize::new(2),
            ..Default::default()
        };
        let aggregator = aggregator(&[server.url("/g1")], config);
        let items = [
            item(1, 1, "ipfs://Qm1"),
            item(2, 1, "ipfs://Qm2"),
            item(3, 1, "ipfs://Qm3"),
            item(4, 1, "ipfs://Qm4"),
        ];
        let nfts = aggregator.aggregate(&items).await;

        let names = nfts
            .iter()
            .map(|nft| nft.as_ref().unwrap().name.clone())
            .collect::<Vec<_>>();
        assert_eq!(names, ["Qm1", "Qm2", "Qm3", "Qm4"]);
    }

    #[tokio::test]
    async fn resolve_propagates_exhaustion() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/g1/Qm1");
            then.status(404);
        });
        server.mock(|when, then| {
            when.method(GET).path("/g2/Qm1");
            then.status(500);
        });

        let aggregator = aggregator(
            &[server.url("/g1"), server.url("/g2")],
            AggregatorConfig::default(),
        );
        let err = aggregator
            .resolve(&item(1, 1, "ipfs://Qm1"))
            .await
            .unwrap_err();

        let MetadataError::Unavailable(FetchError::AllGatewaysExhausted { attempts, .. }) = &err
        else {
            panic!("expected exhaustion, got {err:?}");
        };
        assert_eq!(attempts.len(), 2);
    }
}
