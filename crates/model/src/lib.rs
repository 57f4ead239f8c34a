//! Contains the data types shared between the marketplace components.

pub mod items;
pub mod metadata;
pub mod u256_decimal;

pub use {
    items::{DisplayNft, MarketItem},
    metadata::TokenMetadata,
};
