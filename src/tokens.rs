//! Token/asset resolver for the Intents Provider
//!
//! Maps a (symbol, chain) pair to the provider-specific asset identifier and
//! its decimal precision. The table is static; entries must match the `id`
//! field returned by the provider's token listing. If the provider changes
//! its id schema the table must be updated.
//!
//! Resolution is pure and synchronous - no network I/O.

use crate::error::GatewayError;

/// Provider-side token identifier plus decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenInfo {
    /// Asset id in the Intents Provider's schema (e.g. "usdc-ethereum-mainnet")
    pub id: &'static str,
    /// Number of decimal places in the token's atomic representation
    pub decimals: u32,
}

/// Provider asset id for ZEC, the fixed origin asset of the privacy-coin
/// settlement path.
pub const ZEC: TokenInfo = TokenInfo {
    id: "zec-mainnet",
    decimals: 8,
};

/// Resolves an (asset, chain) pair to the Intents Provider token entry.
///
/// Inputs are normalized before lookup: the symbol is uppercased, the chain
/// identifier is uppercased and a trailing "-MAINNET" suffix is stripped, so
/// "ethereum", "ETHEREUM-MAINNET" and "Ethereum-Mainnet" all resolve
/// identically.
///
/// # Arguments
///
/// * `asset` - Asset symbol (e.g. "USDC", "zec")
/// * `chain` - Chain identifier (e.g. "ETHEREUM", "polygon-mainnet")
///
/// # Returns
///
/// * `Ok(TokenInfo)` - Matching provider token entry
/// * `Err(GatewayError::UnsupportedAsset)` - No entry for the normalized pair
pub fn resolve_intents_token(asset: &str, chain: &str) -> Result<TokenInfo, GatewayError> {
    let normalized_asset = asset.to_uppercase();
    let mut normalized_chain = chain.to_uppercase();
    if let Some(stripped) = normalized_chain.strip_suffix("-MAINNET") {
        normalized_chain = stripped.to_string();
    }

    let info = match (normalized_asset.as_str(), normalized_chain.as_str()) {
        // ZEC is chain-independent on the provider side
        ("ZEC", _) => ZEC,
        ("USDC", "ETHEREUM") => TokenInfo {
            id: "usdc-ethereum-mainnet",
            decimals: 6,
        },
        ("USDC", "POLYGON") => TokenInfo {
            id: "usdc-polygon-mainnet",
            decimals: 6,
        },
        ("USDC", "ARBITRUM") => TokenInfo {
            id: "usdc-arbitrum-mainnet",
            decimals: 6,
        },
        ("USDC", "OPTIMISM") => TokenInfo {
            id: "usdc-optimism-mainnet",
            decimals: 6,
        },
        ("USDC", "BASE") => TokenInfo {
            id: "usdc-base-mainnet",
            decimals: 6,
        },
        _ => {
            return Err(GatewayError::UnsupportedAsset {
                asset: asset.to_string(),
                chain: chain.to_string(),
            })
        }
    };

    Ok(info)
}
