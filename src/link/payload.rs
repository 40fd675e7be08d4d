//! Wire format of the elevated link helper
//!
//! The batch is a JSON array of `{"old": .., "new": ..}` objects, base64
//! encoded with the URL-safe alphabet so it survives as one command-line
//! argument.

use base64::Engine;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};

use super::LinkRequest;
use crate::error::{Result, VendError};

/// Encode a batch for the `link` subcommand
pub fn encode(batch: &[LinkRequest]) -> Result<String> {
    let json = serde_json::to_vec(batch)?;
    Ok(URL_SAFE.encode(json))
}

/// Decode a `link` subcommand argument; padding is optional
pub fn decode(payload: &str) -> Result<Vec<LinkRequest>> {
    let payload = payload.trim();
    let bytes = URL_SAFE
        .decode(payload)
        .or_else(|_| URL_SAFE_NO_PAD.decode(payload))
        .map_err(|e| VendError::LinkPayloadInvalid {
            reason: format!("base64 decode failed: {e}"),
        })?;
    Ok(serde_json::from_slice(&bytes)?)
}
