use docchain_types::{Document, ValueType};

use crate::error::{CodecError, CodecResult};

/// Canonical binary encoding of a leaf. Returns `None` for containers and
/// holes, which have no leaf encoding.
pub fn encode_value(leaf: &Document) -> Option<(ValueType, Vec<u8>)> {
    match leaf {
        Document::Null => Some((ValueType::Nil, Vec::new())),
        Document::String(s) => Some((ValueType::String, s.as_bytes().to_vec())),
        Document::Bool(b) => Some((ValueType::Bool, b.to_string().into_bytes())),
        Document::Float(f) => Some((ValueType::Float64, f.to_be_bytes().to_vec())),
        Document::Map(_) | Document::Sequence(_) | Document::Hole => None,
    }
}

/// Decode leaf bytes according to their type tag. `path` is only used for
/// error reporting.
pub fn decode_value(value_type: ValueType, bytes: &[u8], path: &str) -> CodecResult<Document> {
    let invalid = |reason: String| CodecError::InvalidValue {
        path: path.to_string(),
        value_type,
        reason,
    };

    match value_type {
        ValueType::Nil if bytes.is_empty() => Ok(Document::Null),
        ValueType::Nil => Err(invalid(format!("expected no bytes, got {}", bytes.len()))),
        ValueType::String => String::from_utf8(bytes.to_vec())
            .map(Document::String)
            .map_err(|e| invalid(e.to_string())),
        ValueType::Bool => match bytes {
            b"true" => Ok(Document::Bool(true)),
            b"false" => Ok(Document::Bool(false)),
            _ => Err(invalid("expected `true` or `false`".into())),
        },
        ValueType::Float64 => {
            let raw: [u8; 8] = bytes
                .try_into()
                .map_err(|_| invalid(format!("expected 8 bytes, got {}", bytes.len())))?;
            Ok(Document::Float(f64::from_be_bytes(raw)))
        }
    }
}
