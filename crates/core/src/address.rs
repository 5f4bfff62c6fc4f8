use alloy::primitives::Address;
use std::str::FromStr;

use crate::error::{EthError, EthResult};

/// Parses and validates an Ethereum address string.
///
/// The address must be `0x` followed by 40 hex characters. An all-lowercase
/// body is accepted as-is; any other casing must match the EIP-55 checksum.
pub fn parse_address(address: &str) -> EthResult<Address> {
    let hex_part = address
        .strip_prefix("0x")
        .ok_or_else(|| EthError::InvalidAddress("address must start with 0x".into()))?;

    if hex_part.len() != 40 {
        return Err(EthError::InvalidAddress(format!(
            "expected 40 hex characters, got {}",
            hex_part.len()
        )));
    }

    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(EthError::InvalidAddress(
            "address contains non-hex characters".into(),
        ));
    }

    let parsed =
        Address::from_str(address).map_err(|e| EthError::InvalidAddress(e.to_string()))?;

    let is_all_lower = hex_part.chars().all(|c| !c.is_ascii_uppercase());
    if !is_all_lower && parsed.to_checksum(None) != address {
        return Err(EthError::InvalidAddress(format!(
            "checksum mismatch for {address}"
        )));
    }

    Ok(parsed)
}

/// Returns true if `address` passes [`parse_address`].
pub fn is_address(address: &str) -> bool {
    parse_address(address).is_ok()
}
