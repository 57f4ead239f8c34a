use {
    alloy::primitives::{
        U256,
        utils::{ParseUnits, Unit, parse_units},
    },
    anyhow::{Context, Result, bail},
};

/// Converts an amount of base units with the specified amount of decimals
/// into its exact decimal representation as a string.
///
/// # Examples
///
/// ```rust
/// use {alloy::primitives::U256, number::units::format_units};
///
/// assert_eq!(format_units(U256::from(42u64), 0), "42");
/// assert_eq!(format_units(U256::from(1_337_000u64), 6), "1.337000")
/// ```
pub fn format_units(amount: U256, decimals: usize) -> String {
    let str_amount = amount.to_string();
    if decimals == 0 {
        str_amount
    } else if str_amount.len() <= decimals {
        format!("0.{:0>pad_left$}", str_amount, pad_left = decimals)
    } else {
        format!(
            "{}.{}",
            &str_amount[0..str_amount.len() - decimals],
            &str_amount[str_amount.len() - decimals..]
        )
    }
}

/// Formats a wei amount the way wallets display native currency values:
/// 18 decimals with trailing zeros trimmed, keeping at least one
/// fractional digit.
pub fn format_ether(amount: U256) -> String {
    let formatted = format_units(amount, Unit::ETHER.get() as usize);
    let Some((integer, fraction)) = formatted.split_once('.') else {
        return formatted;
    };
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        format!("{integer}.0")
    } else {
        format!("{integer}.{fraction}")
    }
}

/// Parses a user supplied decimal string into a wei amount.
pub fn parse_ether(amount: &str) -> Result<U256> {
    match parse_units(amount.trim(), "ether")
        .with_context(|| format!("failed to parse {amount:?} as an ether amount"))?
    {
        ParseUnits::U256(wei) => Ok(wei),
        ParseUnits::I256(_) => bail!("amount must not be negative"),
    }
}
