use {
    alloy::{
        network::EthereumWallet,
        primitives::Address,
        providers::{DynProvider, Provider, ProviderBuilder},
        signers::local::PrivateKeySigner,
    },
    url::Url,
};

/// Explicit session state: the acting account and the provider used for
/// chain access. Passed by reference to whatever needs it instead of
/// living in ambient global state.
#[derive(Clone)]
pub struct WalletSession {
    account: Address,
    provider: DynProvider,
}

impl WalletSession {
    /// Session backed by a signing wallet. Required for transactions.
    pub fn connect(node_url: &Url, signer: PrivateKeySigner) -> Self {
        let account = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(node_url.clone())
            .erased();
        Self { account, provider }
    }

    /// Read only session for browsing without a wallet.
    pub fn read_only(node_url: &Url) -> Self {
        let provider = ProviderBuilder::new()
            .connect_http(node_url.clone())
            .erased();
        Self {
            account: Address::ZERO,
            provider,
        }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn provider(&self) -> DynProvider {
        self.provider.clone()
    }
}
