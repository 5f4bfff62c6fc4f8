use alloy::primitives::keccak256;

use crate::error::{EthError, EthResult};

/// Returns true for `0x` followed by zero or more hex digits.
pub fn is_hex(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .is_some_and(|body| body.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Decodes a `0x`-prefixed hex string into bytes.
///
/// Odd-length bodies are left-padded with a single `0` nibble, so `0x123`
/// decodes to `[0x01, 0x23]`.
pub fn hex_to_bytes(value: &str) -> EthResult<Vec<u8>> {
    let body = value
        .strip_prefix("0x")
        .ok_or_else(|| EthError::InvalidHex(format!("{value:?} is missing the 0x prefix")))?;

    let decoded = if body.len() % 2 == 1 {
        hex::decode(format!("0{body}"))
    } else {
        hex::decode(body)
    };

    decoded.map_err(|e| EthError::InvalidHex(format!("{value:?}: {e}")))
}

/// Formats bytes as lowercase `0x` hex.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Keccak-256 of `value`.
///
/// Hex input is hashed as the bytes it encodes; anything else is hashed as
/// its UTF-8 bytes.
pub fn keccak256_hash(value: &str) -> EthResult<String> {
    let digest = if is_hex(value) {
        keccak256(hex_to_bytes(value)?)
    } else {
        keccak256(value.as_bytes())
    };

    Ok(bytes_to_hex(digest.as_slice()))
}
