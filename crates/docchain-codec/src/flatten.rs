use docchain_types::{Document, PropertyEntry, PropertyEntryList, Segment, PATH_SEPARATOR};
use tracing::debug;

use crate::error::{CodecError, CodecResult};
use crate::value::encode_value;

/// Flatten `document` into one property per leaf, rooted at `doc_id`.
///
/// Map keys are visited in sorted order. Holes and empty containers emit no
/// properties.
pub fn flatten(doc_id: &str, document: &Document) -> CodecResult<PropertyEntryList> {
    check_segment(doc_id)?;
    if doc_id.is_empty() {
        return Err(CodecError::InvalidSegment {
            segment: String::new(),
            reason: "document ID must not be empty",
        });
    }

    let mut stack = vec![doc_id.to_string()];
    let mut properties = PropertyEntryList::new();
    walk(&mut stack, document, &mut properties)?;

    debug!(doc_id, count = properties.len(), "document flattened");
    Ok(properties)
}

/// Depth-first walk over a shared segment stack. Each recursive call pushes
/// one segment and pops it again before any error propagates.
fn walk(stack: &mut Vec<String>, node: &Document, out: &mut PropertyEntryList) -> CodecResult<()> {
    match node {
        Document::Map(map) => {
            for (key, child) in map {
                check_segment(key)?;
                stack.push(key.clone());
                let result = walk(stack, child, out);
                stack.pop();
                result?;
            }
        }
        Document::Sequence(items) => {
            let capacity = items.len();
            for (index, child) in items.iter().enumerate() {
                stack.push(Segment::element(index, capacity).to_string());
                let result = walk(stack, child, out);
                stack.pop();
                result?;
            }
        }
        Document::Hole => {}
        leaf => {
            if let Some((value_type, value)) = encode_value(leaf) {
                let mut path = stack.join("/");
                path.push(PATH_SEPARATOR);
                path.push_str(value_type.as_str());
                out.push(PropertyEntry::new(path, value));
            }
        }
    }
    Ok(())
}

fn check_segment(segment: &str) -> CodecResult<()> {
    if segment.contains(PATH_SEPARATOR) {
        return Err(CodecError::InvalidSegment {
            segment: segment.to_string(),
            reason: "contains the path separator",
        });
    }
    if Segment::has_element_format(segment) {
        return Err(CodecError::InvalidSegment {
            segment: segment.to_string(),
            reason: "collides with the array element format",
        });
    }
    Ok(())
}
