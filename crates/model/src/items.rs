use {
    crate::u256_decimal,
    alloy::primitives::{Address, U256},
    serde::{Deserialize, Serialize},
    serde_with::serde_as,
};

/// An item listed on the marketplace contract, as read from chain state.
/// This layer only ever reads these records, it never mutates them.
#[serde_as]
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketItem {
    #[serde_as(as = "u256_decimal::DecimalU256")]
    pub token_id: U256,
    pub seller: Address,
    pub owner: Address,
    /// Asking price in base units (wei) of the native currency.
    #[serde_as(as = "u256_decimal::DecimalU256")]
    pub price: U256,
    /// Reference to the item's off-chain metadata.
    pub token_uri: String,
}

/// The fully joined, display ready view of a listing: an on-chain record
/// combined with its resolved off-chain metadata.
///
/// Constructed per aggregation pass and discarded with it; there is no
/// shared cache of these.
#[serde_as]
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayNft {
    #[serde_as(as = "u256_decimal::DecimalU256")]
    pub token_id: U256,
    pub seller: Address,
    pub owner: Address,
    /// Human readable price in whole units of the native currency.
    pub price: String,
    /// Url under which the item's media is reachable from a browser.
    pub image: String,
    pub name: String,
    pub description: String,
    pub token_uri: String,
}

#[cfg(test)]
mod tests {
    use {super::*, alloy::primitives::address};

    #[test]
    fn market_item_roundtrip() {
        let item = MarketItem {
            token_id: U256::from(7u64),
            seller: address!("0x9ba1bcd88e99d6e1e03252a70a63fea83bf1208c"),
            owner: Address::ZERO,
            price: U256::from(1_500_000_000_000_000_000u128),
            token_uri: "ipfs://QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG".to_string(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["tokenId"], "7");
        assert_eq!(json["price"], "1500000000000000000");
        let back: MarketItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }
}
