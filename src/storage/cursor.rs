//! Pagination cursor codec
//!
//! A cursor is the backend key a scan stopped at, wrapped in a small
//! versioned bincode payload and hex-encoded so it is safe to pass around as an
//! opaque token (URLs, headers).

use crate::error::{IndexError, Result};
use crate::storage::kv::ItemKey;
use serde::{Deserialize, Serialize};

const CURSOR_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct CursorPayload {
    v: u8,
    pk: String,
    sk: String,
}

pub fn encode_cursor(key: &ItemKey) -> Result<String> {
    let payload = CursorPayload {
        v: CURSOR_VERSION,
        pk: key.partition.clone(),
        sk: key.sort.clone(),
    };
    let bytes = bincode::serialize(&payload)?;
    Ok(hex::encode(bytes))
}

/// Decode a token produced by [`encode_cursor`]
///
/// Any malformed token yields [`IndexError::InvalidCursor`].
pub fn decode_cursor(token: &str) -> Result<ItemKey> {
    if token.is_empty() {
        return Err(IndexError::InvalidCursor("empty cursor".to_string()));
    }

    let bytes = hex::decode(token)
        .map_err(|e| IndexError::InvalidCursor(format!("bad token encoding: {}", e)))?;
    let payload: CursorPayload = bincode::deserialize(&bytes)
        .map_err(|e| IndexError::InvalidCursor(format!("undecodable payload: {}", e)))?;

    if payload.v != CURSOR_VERSION {
        return Err(IndexError::InvalidCursor(format!(
            "unsupported cursor version {}",
            payload.v
        )));
    }

    Ok(ItemKey::new(payload.pk, payload.sk))
}
