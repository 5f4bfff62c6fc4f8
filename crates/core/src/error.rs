use thiserror::Error;

/// Result type for Ethereum tool operations.
pub type EthResult<T> = Result<T, EthError>;

/// Errors surfaced by the Ethereum operations.
///
/// Failures reported by the underlying ABI, hashing and RPC libraries are
/// carried verbatim in the variant's message.
#[derive(Debug, Error)]
pub enum EthError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid ABI: {0}")]
    InvalidAbi(String),

    #[error("invalid ABI type: {0}")]
    AbiType(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("decoding error: {0}")]
    Decoding(String),

    #[error("function not found: {0}")]
    FunctionNotFound(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("invalid chain id: {0}")]
    InvalidChainId(u64),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("execution reverted: {0}")]
    Revert(alloy::primitives::Bytes),

    #[error("offchain lookup failed: {0}")]
    Gateway(String),
}
