//! Conversions between base-unit (wei) amounts and the decimal strings
//! shown to users.
pub mod units;

pub use units::{format_ether, format_units, parse_ether};
