use std::fmt;

use crate::error::TypeError;

/// One step in a property path.
///
/// Sequence elements carry the total length of their sequence so the array
/// can be sized correctly on reconstruction, whatever order its elements
/// are read back in.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A map key.
    Key(String),
    /// A sequence element, rendered as `[index.capacity]`.
    Element { index: usize, capacity: usize },
}

impl Segment {
    pub fn key(name: impl Into<String>) -> Self {
        Self::Key(name.into())
    }

    pub fn element(index: usize, capacity: usize) -> Self {
        Self::Element { index, capacity }
    }

    /// Parse a raw path segment.
    ///
    /// Anything of the shape `[<digits>.<digits>]` is an element; everything
    /// else is a map key. An element whose numbers overflow `usize` is an
    /// error rather than a key.
    pub fn parse(raw: &str) -> Result<Self, TypeError> {
        match split_element(raw) {
            Some((index, capacity)) => {
                let index = index
                    .parse()
                    .map_err(|_| TypeError::InvalidSegment(raw.to_string()))?;
                let capacity = capacity
                    .parse()
                    .map_err(|_| TypeError::InvalidSegment(raw.to_string()))?;
                Ok(Self::Element { index, capacity })
            }
            None => Ok(Self::Key(raw.to_string())),
        }
    }

    /// Returns `true` if `raw` has the `[index.capacity]` element shape.
    pub fn has_element_format(raw: &str) -> bool {
        split_element(raw).is_some()
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(name) => f.write_str(name),
            Self::Element { index, capacity } => write!(f, "[{index}.{capacity}]"),
        }
    }
}

fn split_element(raw: &str) -> Option<(&str, &str)> {
    let inner = raw.strip_prefix('[')?.strip_suffix(']')?;
    let (index, capacity) = inner.split_once('.')?;
    let is_number = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    (is_number(index) && is_number(capacity)).then_some((index, capacity))
}
