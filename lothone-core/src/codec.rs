//! Record codec
//!
//! Converts an [`AccountCollection`] to and from the on-disk document: a JSON
//! object whose `clients` array holds the records.

use std::path::Path;

use crate::error::{CoreError, CoreResult};
use crate::types::AccountCollection;

/// Decodes a collection document read from `path`.
///
/// A document without a `clients` key decodes to an empty collection.
pub fn decode(bytes: &[u8], path: &Path) -> CoreResult<AccountCollection> {
    serde_json::from_slice(bytes).map_err(|e| CoreError::CorruptCollection {
        path: path.display().to_string(),
        detail: e.to_string(),
    })
}

/// Encodes a collection as pretty-printed JSON with a trailing newline.
pub fn encode(collection: &AccountCollection) -> CoreResult<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(collection)
        .map_err(|e| CoreError::Serialization(e.to_string()))?;
    bytes.push(b'\n');
    Ok(bytes)
}
