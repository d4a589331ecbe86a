use docchain_types::{Document, PropertyEntryList};

use crate::error::CodecResult;
use crate::flatten::flatten;

/// Decode a raw JSON payload into a document.
pub fn decode_json(raw: &[u8]) -> CodecResult<Document> {
    let value: serde_json::Value = serde_json::from_slice(raw)?;
    Ok(Document::from(value))
}

/// Encode a document as compact JSON.
pub fn encode_json(document: &Document) -> CodecResult<Vec<u8>> {
    Ok(serde_json::to_vec(&document.to_json())?)
}

/// Decode a raw JSON payload and flatten it under `doc_id`.
pub fn flatten_json(doc_id: &str, raw: &[u8]) -> CodecResult<PropertyEntryList> {
    let document = decode_json(raw)?;
    flatten(doc_id, &document)
}
