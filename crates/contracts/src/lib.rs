//! Bindings to the marketplace smart contract.

pub mod networks {
    pub const MAINNET: u64 = 1;
    pub const BNB: u64 = 56;
    /// The BNB chain testnet the reference deployment lives on.
    pub const BNB_TESTNET: u64 = 97;
    pub const SEPOLIA: u64 = 11155111;
    /// Local hardhat node.
    pub const LOCALHOST: u64 = 31337;
}

pub use alloy::providers::DynProvider as Provider;

// The marketplace has no canonical public deployment, so there is no
// artifact to generate bindings from; the contract surface is declared
// inline and the deployment address comes from configuration.
alloy::sol!(
    #[allow(missing_docs)]
    #[sol(rpc, all_derives)]
    contract NftMarket {
        struct MarketItem {
            uint256 tokenId;
            address seller;
            address owner;
            uint256 price;
            bool sold;
        }

        function getListingPrice() external view returns (uint256);
        function tokenURI(uint256 tokenId) external view returns (string memory);

        function createToken(string memory tokenUri, uint256 price) external payable returns (uint256);
        function resellToken(uint256 tokenId, uint256 price) external payable;
        function createMarketSale(uint256 tokenId) external payable;

        function fetchMarketItems() external view returns (MarketItem[] memory);
        function fetchMyNFTs() external view returns (MarketItem[] memory);
        function fetchItemsListed() external view returns (MarketItem[] memory);
    }
);

/// Contract instance type used throughout the workspace.
pub type Instance = NftMarket::NftMarketInstance<Provider>;

#[cfg(test)]
mod tests {
    use {super::*, alloy::sol_types::SolCall};

    #[test]
    fn abi_signatures() {
        assert_eq!(
            NftMarket::getListingPriceCall::SIGNATURE,
            "getListingPrice()"
        );
        assert_eq!(
            NftMarket::createTokenCall::SIGNATURE,
            "createToken(string,uint256)"
        );
        assert_eq!(
            NftMarket::resellTokenCall::SIGNATURE,
            "resellToken(uint256,uint256)"
        );
        assert_eq!(
            NftMarket::createMarketSaleCall::SIGNATURE,
            "createMarketSale(uint256)"
        );
        assert_eq!(NftMarket::tokenURICall::SIGNATURE, "tokenURI(uint256)");
    }
}
