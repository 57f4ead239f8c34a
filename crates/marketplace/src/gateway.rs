use {
    alloy::{
        contract::Error as ContractError,
        network::Ethereum,
        primitives::{Address, U256},
        providers::{DynProvider, PendingTransactionBuilder},
        rpc::{json_rpc::ErrorPayload, types::TransactionReceipt},
    },
    anyhow::{Context, Result},
    async_trait::async_trait,
    contracts::NftMarket,
    futures::future::try_join_all,
    model::MarketItem,
};

/// Failure of a state changing marketplace call, classified so that the
/// calling view can tell the user what happened. This layer performs no
/// user facing notification itself.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// The user rejected the request in their wallet.
    #[error("transaction cancelled by user")]
    Cancelled,
    /// The wallet is already waiting on a user interaction.
    #[error("wallet has a pending request")]
    WalletBusy,
    /// The node or the contract rejected the transaction.
    #[error("transaction rejected: {0}")]
    Rejected(String),
    #[error(transparent)]
    Other(anyhow::Error),
}

/// A submitted transaction that can be awaited until it is mined.
pub struct TransactionHandle(PendingTransactionBuilder<Ethereum>);

impl TransactionHandle {
    pub fn new(pending: PendingTransactionBuilder<Ethereum>) -> Self {
        Self(pending)
    }

    /// Suspends until the transaction is included in a block and returns
    /// the receipt.
    pub async fn await_confirmation(self) -> Result<TransactionReceipt, TransactionError> {
        self.0
            .get_receipt()
            .await
            .map_err(|err| TransactionError::Other(err.into()))
    }
}

/// Read and write access to the marketplace contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketGateway: Send + Sync {
    /// All items currently listed for sale.
    async fn listings(&self) -> Result<Vec<MarketItem>>;

    /// Items owned by the account.
    async fn owned_by(&self, account: Address) -> Result<Vec<MarketItem>>;

    /// Items the account has listed for sale.
    async fn listed_by(&self, account: Address) -> Result<Vec<MarketItem>>;

    /// Fee the contract charges for creating a listing.
    async fn listing_price(&self) -> Result<U256>;

    /// Lists a token for sale. `resale` re-lists the given existing
    /// token instead of minting a new one from `uri`.
    async fn create_listing(
        &self,
        uri: String,
        price: U256,
        resale: Option<U256>,
    ) -> Result<TransactionHandle, TransactionError>;

    /// Buys a listed token at its asking price.
    async fn purchase(
        &self,
        token_id: U256,
        price: U256,
    ) -> Result<TransactionHandle, TransactionError>;
}

/// [`MarketGateway`] backed by the deployed contract.
pub struct OnchainGateway {
    instance: contracts::Instance,
}

impl OnchainGateway {
    pub fn new(address: Address, provider: DynProvider) -> Self {
        Self {
            instance: NftMarket::new(address, provider),
        }
    }

    /// Joins the raw on-chain records with their token uris.
    async fn with_uris(&self, items: Vec<NftMarket::MarketItem>) -> Result<Vec<MarketItem>> {
        try_join_all(items.into_iter().map(|item| async move {
            let token_uri = self
                .instance
                .tokenURI(item.tokenId)
                .call()
                .await
                .with_context(|| format!("tokenURI({})", item.tokenId))?;
            Ok(MarketItem {
                token_id: item.tokenId,
                seller: item.seller,
                owner: item.owner,
                price: item.price,
                token_uri,
            })
        }))
        .await
    }
}

#[async_trait]
impl MarketGateway for OnchainGateway {
    async fn listings(&self) -> Result<Vec<MarketItem>> {
        let items = self
            .instance
            .fetchMarketItems()
            .call()
            .await
            .context("fetchMarketItems")?;
        self.with_uris(items).await
    }

    async fn owned_by(&self, account: Address) -> Result<Vec<MarketItem>> {
        // The contract filters by msg.sender, which a read only call can
        // impersonate.
        let items = self
            .instance
            .fetchMyNFTs()
            .from(account)
            .call()
            .await
            .context("fetchMyNFTs")?;
        self.with_uris(items).await
    }

    async fn listed_by(&self, account: Address) -> Result<Vec<MarketItem>> {
        let items = self
            .instance
            .fetchItemsListed()
            .from(account)
            .call()
            .await
            .context("fetchItemsListed")?;
        self.with_uris(items).await
    }

    async fn listing_price(&self) -> Result<U256> {
        self.instance
            .getListingPrice()
            .call()
            .await
            .context("getListingPrice")
    }

    async fn create_listing(
        &self,
        uri: String,
        price: U256,
        resale: Option<U256>,
    ) -> Result<TransactionHandle, TransactionError> {
        let fee = self
            .instance
            .getListingPrice()
            .call()
            .await
            .map_err(classify)?;
        let pending = match resale {
            None => self.instance.createToken(uri, price).value(fee).send().await,
            Some(token_id) => {
                self.instance
                    .resellToken(token_id, price)
                    .value(fee)
                    .send()
                    .await
            }
        }
        .map_err(classify)?;
        Ok(TransactionHandle::new(pending))
    }

    async fn purchase(
        &self,
        token_id: U256,
        price: U256,
    ) -> Result<TransactionHandle, TransactionError> {
        let pending = self
            .instance
            .createMarketSale(token_id)
            .value(price)
            .send()
            .await
            .map_err(classify)?;
        Ok(TransactionHandle::new(pending))
    }
}

fn classify(error: ContractError) -> TransactionError {
    if let ContractError::TransportError(transport) = &error {
        if let Some(payload) = transport.as_error_resp() {
            return classify_rpc(payload);
        }
    }
    TransactionError::Other(error.into())
}

/// Maps the EIP-1193 error codes wallet backed providers surface onto the
/// transaction error taxonomy.
fn classify_rpc(payload: &ErrorPayload) -> TransactionError {
    const USER_REJECTED: i64 = 4001;
    const REQUEST_PENDING: i64 = -32002;
    match payload.code {
        USER_REJECTED => TransactionError::Cancelled,
        REQUEST_PENDING => TransactionError::WalletBusy,
        _ if payload.message.to_lowercase().contains("user rejected") => {
            TransactionError::Cancelled
        }
        _ => TransactionError::Rejected(payload.message.to_string()),
    }
}
