//! Resilient access to content addressed data.
//!
//! Public gateways are frequently rate limited, region blocked or plain
//! down, so content is fetched through an ordered gateway fallback list
//! with a bounded timeout per attempt. The pinning client used by the
//! minting flow lives here as well.

pub mod config;
pub mod gateway;
pub mod pin;
pub mod reference;
pub mod url;

pub use {
    config::{IpfsConfig, PinningConfig},
    gateway::{FetchError, GatewayClient, GatewayError},
    pin::{PinError, PinningClient},
    reference::{PUBLIC_GATEWAY, Reference, accessible_url},
};
