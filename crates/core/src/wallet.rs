use std::fmt;

use alloy::primitives::Address;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::SecretKey;
use rand::rngs::OsRng;
use serde::Serialize;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{EthError, EthResult};
use crate::hashing::{bytes_to_hex, hex_to_bytes};

/// A throwaway secp256k1 keypair with its Ethereum address.
///
/// The hex-encoded private key is wiped from memory when the wallet is
/// dropped.
#[derive(Clone, Serialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct BurnerWallet {
    pub private_key: String,
    pub address: String,
}

impl fmt::Debug for BurnerWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BurnerWallet")
            .field("private_key", &"<redacted>")
            .field("address", &self.address)
            .finish()
    }
}

/// Generates a new wallet from the OS CSPRNG.
pub fn create_wallet() -> BurnerWallet {
    let secret = SecretKey::random(&mut OsRng);
    wallet_from_secret(&secret)
}

/// Rebuilds a wallet from a `0x`-prefixed 32-byte private key.
pub fn wallet_from_private_key(private_key: &str) -> EthResult<BurnerWallet> {
    let bytes = Zeroizing::new(hex_to_bytes(private_key)?);
    if bytes.len() != 32 {
        return Err(EthError::InvalidHex(format!(
            "private key must be 32 bytes, got {}",
            bytes.len()
        )));
    }

    let secret = SecretKey::from_slice(&bytes)
        .map_err(|_| EthError::InvalidHex("private key is not a valid secp256k1 scalar".into()))?;

    Ok(wallet_from_secret(&secret))
}

fn wallet_from_secret(secret: &SecretKey) -> BurnerWallet {
    let mut key_bytes = secret.to_bytes();
    let private_key = bytes_to_hex(&key_bytes);
    key_bytes.as_mut_slice().zeroize();

    // Address is the last 20 bytes of keccak256 over the 64-byte public key.
    let public_key = secret.public_key().to_encoded_point(false);
    let address = Address::from_raw_public_key(&public_key.as_bytes()[1..]);

    BurnerWallet {
        private_key,
        address: address.to_checksum(None),
    }
}
