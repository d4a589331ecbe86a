use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;
use crate::PATH_SEPARATOR;

/// Type tag closing every property path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    Nil,
    String,
    Bool,
    Float64,
}

impl ValueType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::String => "string",
            Self::Bool => "bool",
            Self::Float64 => "float64",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = TypeError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "nil" => Ok(Self::Nil),
            "string" => Ok(Self::String),
            "bool" => Ok(Self::Bool),
            "float64" => Ok(Self::Float64),
            other => Err(TypeError::UnknownValueType(other.to_string())),
        }
    }
}

/// A single leaf of a flattened document.
///
/// `path` is `<docID>/<segment>(/<segment>)*/<type>` and `value` holds the
/// canonical binary encoding of the leaf for that type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyEntry {
    pub path: String,
    pub value: Vec<u8>,
}

/// A property path split into its three parts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathParts<'a> {
    pub doc_id: &'a str,
    pub segments: Vec<&'a str>,
    pub value_type: ValueType,
}

impl PropertyEntry {
    pub fn new(path: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Split the path into document ID, middle segments, and type tag.
    pub fn dissect(&self) -> Result<PathParts<'_>, TypeError> {
        let mut parts: Vec<&str> = self.path.split(PATH_SEPARATOR).collect();
        if parts.len() < 2 {
            return Err(TypeError::InvalidPath {
                path: self.path.clone(),
                reason: "expected at least a document ID and a type tag".into(),
            });
        }
        let tag = parts.pop().unwrap_or_default();
        let value_type = tag.parse()?;
        let doc_id = parts.remove(0);
        if doc_id.is_empty() {
            return Err(TypeError::InvalidPath {
                path: self.path.clone(),
                reason: "empty document ID".into(),
            });
        }
        Ok(PathParts {
            doc_id,
            segments: parts,
            value_type,
        })
    }
}

/// Split a full property path into the part before its type tag and the tag.
///
/// Returns `None` if the path has no separator or the tag is unknown.
pub fn split_type_tag(path: &str) -> Option<(&str, ValueType)> {
    let (prefix, tag) = path.rsplit_once(PATH_SEPARATOR)?;
    tag.parse().ok().map(|value_type| (prefix, value_type))
}

/// Ordered list of property entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyEntryList(Vec<PropertyEntry>);

impl PropertyEntryList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn push(&mut self, entry: PropertyEntry) {
        self.0.push(entry);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PropertyEntry> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[PropertyEntry] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<PropertyEntry> {
        self.0
    }

    /// Sort lexicographically by full path. The sort is stable, so entries
    /// sharing a path keep their relative order.
    pub fn sort_by_path(&mut self) {
        self.0.sort_by(|a, b| a.path.cmp(&b.path));
    }

    /// Look up an entry by its full path.
    pub fn get(&self, path: &str) -> Option<&PropertyEntry> {
        self.0.iter().find(|entry| entry.path == path)
    }
}

impl From<Vec<PropertyEntry>> for PropertyEntryList {
    fn from(entries: Vec<PropertyEntry>) -> Self {
        Self(entries)
    }
}

impl FromIterator<PropertyEntry> for PropertyEntryList {
    fn from_iter<I: IntoIterator<Item = PropertyEntry>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for PropertyEntryList {
    type Item = PropertyEntry;
    type IntoIter = std::vec::IntoIter<PropertyEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PropertyEntryList {
    type Item = &'a PropertyEntry;
    type IntoIter = std::slice::Iter<'a, PropertyEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_type_tags_roundtrip() {
        for vt in [ValueType::Nil, ValueType::String, ValueType::Bool, ValueType::Float64] {
            assert_eq!(vt.as_str().parse::<ValueType>().unwrap(), vt);
        }
        assert_eq!(
            "int".parse::<ValueType>().unwrap_err(),
            TypeError::UnknownValueType("int".into())
        );
    }

    #[test]
    fn dissect_nested_path() {
        let entry = PropertyEntry::new("doc1/b/[0.3]/float64", vec![0; 8]);
        let parts = entry.dissect().unwrap();
        assert_eq!(parts.doc_id, "doc1");
        assert_eq!(parts.segments, vec!["b", "[0.3]"]);
        assert_eq!(parts.value_type, ValueType::Float64);
    }

    #[test]
    fn dissect_root_scalar() {
        let entry = PropertyEntry::new("doc1/string", b"x".to_vec());
        let parts = entry.dissect().unwrap();
        assert!(parts.segments.is_empty());
        assert_eq!(parts.value_type, ValueType::String);
    }

    #[test]
    fn dissect_rejects_short_or_untagged_paths() {
        assert!(PropertyEntry::new("doc1", vec![]).dissect().is_err());
        assert!(PropertyEntry::new("doc1/a/int", vec![]).dissect().is_err());
        assert!(PropertyEntry::new("/a/nil", vec![]).dissect().is_err());
    }

    #[test]
    fn split_type_tag_works() {
        assert_eq!(split_type_tag("doc1/a/string"), Some(("doc1/a", ValueType::String)));
        assert_eq!(split_type_tag("doc1/a/unknown"), None);
        assert_eq!(split_type_tag("nil"), None);
    }

    #[test]
    fn sort_is_lexicographic_and_stable() {
        let mut list: PropertyEntryList = vec![
            PropertyEntry::new("d/b/nil", b"1".to_vec()),
            PropertyEntry::new("d/a/nil", vec![]),
            PropertyEntry::new("d/b/nil", b"2".to_vec()),
        ]
        .into();
        list.sort_by_path();
        let paths: Vec<_> = list.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["d/a/nil", "d/b/nil", "d/b/nil"]);
        assert_eq!(list.as_slice()[1].value, b"1");
        assert_eq!(list.as_slice()[2].value, b"2");
    }

    #[test]
    fn get_by_path() {
        let list: PropertyEntryList = vec![PropertyEntry::new("d/a/bool", b"true".to_vec())].into();
        assert!(list.get("d/a/bool").is_some());
        assert!(list.get("d/b/bool").is_none());
    }
}
