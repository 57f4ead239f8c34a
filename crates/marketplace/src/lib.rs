//! Client side core of the NFT marketplace: contract access, metadata
//! aggregation and the minting, resale and purchase flows.

pub mod arguments;
pub mod config;
pub mod gateway;
pub mod session;

use {
    crate::{
        config::Config,
        gateway::{MarketGateway, OnchainGateway, TransactionError},
        session::WalletSession,
    },
    alloy::{primitives::U256, rpc::types::TransactionReceipt},
    anyhow::Result,
    ipfs::{GatewayClient, PinError, PinningClient},
    metadata::{MetadataAggregator, MetadataError},
    model::{DisplayNft, MarketItem, TokenMetadata},
    std::sync::Arc,
};

/// Failure of a user initiated marketplace flow, typed so the calling
/// view can map it to a message.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("price must be a positive number")]
    InvalidPrice,
    #[error("no pinning service configured")]
    PinningUnavailable,
    #[error(transparent)]
    Pin(#[from] PinError),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

/// What gets minted: the metadata fields of the new token and its asking
/// price as the user typed it.
#[derive(Clone, Debug)]
pub struct MintRequest {
    pub name: String,
    pub description: String,
    /// Reference to the already uploaded media: a url or a content
    /// identifier.
    pub image: String,
    /// Asking price in whole units of the native currency.
    pub price: String,
}

/// The assembled marketplace client: contract gateway, metadata
/// aggregation and pinning behind the operations the views need.
pub struct Marketplace {
    gateway: Arc<dyn MarketGateway>,
    aggregator: MetadataAggregator,
    pinning: Option<PinningClient>,
    session: WalletSession,
}

impl Marketplace {
    pub fn new(config: &Config, session: WalletSession) -> Self {
        let aggregator = MetadataAggregator::new(
            GatewayClient::new(&config.ipfs),
            config.aggregator_config(),
        );
        let gateway = Arc::new(OnchainGateway::new(
            config.market_address,
            session.provider(),
        ));
        let pinning = config.ipfs.pinning.as_ref().map(PinningClient::new);
        Self {
            gateway,
            aggregator,
            pinning,
            session,
        }
    }

    /// All listings with their metadata resolved. Records whose metadata
    /// is unavailable are dropped from the result.
    pub async fn browse(&self) -> Result<Vec<DisplayNft>> {
        let items = self.gateway.listings().await?;
        Ok(self.dense(&items).await)
    }

    /// Items owned by the session account.
    pub async fn owned(&self) -> Result<Vec<DisplayNft>> {
        let items = self.gateway.owned_by(self.session.account()).await?;
        Ok(self.dense(&items).await)
    }

    /// Items the session account has listed for sale.
    pub async fn listed(&self) -> Result<Vec<DisplayNft>> {
        let items = self.gateway.listed_by(self.session.account()).await?;
        Ok(self.dense(&items).await)
    }

    /// The single item view used by the resale page; fails when the
    /// metadata cannot be retrieved.
    pub async fn item(&self, item: &MarketItem) -> Result<DisplayNft, MetadataError> {
        self.aggregator.resolve(item).await
    }

    /// Uploads media to the pinning service, returning a displayable url
    /// for the minting form preview.
    pub async fn upload_media(&self, content: Vec<u8>, name: &str) -> Result<String, FlowError> {
        let pinning = self.pinning.as_ref().ok_or(FlowError::PinningUnavailable)?;
        let cid = pinning.pin_file(content, name).await?;
        Ok(ipfs::accessible_url(&cid))
    }

    /// Pins the metadata document and lists the new token for sale,
    /// waiting until the listing transaction is mined.
    pub async fn mint(&self, request: MintRequest) -> Result<TransactionReceipt, FlowError> {
        let price = parse_positive_price(&request.price)?;
        let pinning = self.pinning.as_ref().ok_or(FlowError::PinningUnavailable)?;
        let metadata = TokenMetadata {
            name: request.name,
            description: request.description,
            image: request.image,
        };
        let name = format!("{}-metadata", metadata.name);
        let cid = pinning.pin_json(&metadata, &name).await?;
        let token_uri = ipfs::accessible_url(&cid);
        let handle = self.gateway.create_listing(token_uri, price, None).await?;
        Ok(handle.await_confirmation().await?)
    }

    /// Re-lists an owned token for sale at a new price.
    pub async fn resell(
        &self,
        nft: &DisplayNft,
        price: &str,
    ) -> Result<TransactionReceipt, FlowError> {
        let price = parse_positive_price(price)?;
        let handle = self
            .gateway
            .create_listing(nft.token_uri.clone(), price, Some(nft.token_id))
            .await?;
        Ok(handle.await_confirmation().await?)
    }

    /// Buys a listed token at its asking price.
    pub async fn buy(&self, nft: &DisplayNft) -> Result<TransactionReceipt, FlowError> {
        let price = parse_positive_price(&nft.price)?;
        let handle = self.gateway.purchase(nft.token_id, price).await?;
        Ok(handle.await_confirmation().await?)
    }

    async fn dense(&self, items: &[MarketItem]) -> Vec<DisplayNft> {
        self.aggregator
            .aggregate(items)
            .await
            .into_iter()
            .flatten()
            .collect()
    }
}

fn parse_positive_price(price: &str) -> Result<U256, FlowError> {
    let wei = number::parse_ether(price).map_err(|_| FlowError::InvalidPrice)?;
    if wei.is_zero() {
        return Err(FlowError::InvalidPrice);
    }
    Ok(wei)
}
