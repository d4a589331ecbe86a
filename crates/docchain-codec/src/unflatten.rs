use std::collections::BTreeMap;

use docchain_types::{Document, PropertyEntryList, Segment};
use tracing::debug;

use crate::error::{CodecError, CodecResult};
use crate::value::decode_value;

/// Upper bound on a declared sequence capacity, so a forged path cannot
/// force an arbitrarily large allocation.
pub const MAX_SEQUENCE_CAPACITY: usize = 1 << 24;

/// Rebuild a document from its leaf properties.
///
/// The list is sorted by path first, so processing order is deterministic,
/// but the result does not depend on the input order. Sequences are sized
/// to their declared capacity the first time any of their elements is seen;
/// slots no property fills stay [`Document::Hole`]. Missing map leaves are
/// simply absent.
///
/// A path that appears twice is resolved last-wins in sorted order (the
/// sort is stable, so the later duplicate in the input wins). An empty list
/// rebuilds [`Document::Null`].
pub fn unflatten(mut properties: PropertyEntryList) -> CodecResult<Document> {
    properties.sort_by_path();

    let mut root = Document::Hole;
    let mut doc_id: Option<&str> = None;

    for entry in &properties {
        let parts = entry.dissect()?;
        match doc_id {
            None => doc_id = Some(parts.doc_id),
            Some(expected) if expected != parts.doc_id => {
                return Err(CodecError::MixedDocuments {
                    path: entry.path.clone(),
                    expected: expected.to_string(),
                    found: parts.doc_id.to_string(),
                });
            }
            Some(_) => {}
        }

        let value = decode_value(parts.value_type, &entry.value, &entry.path)?;

        let mut slot = &mut root;
        for raw in &parts.segments {
            let segment = Segment::parse(raw)?;
            slot = descend(slot, &segment, &entry.path)?;
        }
        assign(slot, value, &entry.path)?;
    }

    debug!(count = properties.len(), "document rebuilt");
    Ok(match root {
        Document::Hole => Document::Null,
        document => document,
    })
}

/// Step from `slot` into the child named by `segment`, creating the
/// container on first use.
fn descend<'a>(slot: &'a mut Document, segment: &Segment, path: &str) -> CodecResult<&'a mut Document> {
    if matches!(slot, Document::Hole) {
        *slot = match segment {
            Segment::Element { capacity, .. } => {
                if *capacity > MAX_SEQUENCE_CAPACITY {
                    return Err(CodecError::CapacityTooLarge {
                        path: path.to_string(),
                        capacity: *capacity,
                    });
                }
                Document::Sequence(vec![Document::Hole; *capacity])
            }
            Segment::Key(_) => Document::Map(BTreeMap::new()),
        };
    }

    match (slot, segment) {
        (Document::Sequence(items), Segment::Element { index, .. }) => {
            let len = items.len();
            items.get_mut(*index).ok_or_else(|| CodecError::IndexOutOfBounds {
                path: path.to_string(),
                index: *index,
                len,
            })
        }
        (Document::Map(map), Segment::Key(name)) => {
            Ok(map.entry(name.clone()).or_insert(Document::Hole))
        }
        _ => Err(CodecError::ShapeConflict {
            path: path.to_string(),
        }),
    }
}

fn assign(slot: &mut Document, value: Document, path: &str) -> CodecResult<()> {
    match slot {
        Document::Map(_) | Document::Sequence(_) => Err(CodecError::ShapeConflict {
            path: path.to_string(),
        }),
        _ => {
            *slot = value;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use docchain_types::PropertyEntry;
    use proptest::prelude::*;
    use serde_json::json;

    fn float(path: &str, f: f64) -> PropertyEntry {
        PropertyEntry::new(path, f.to_be_bytes().to_vec())
    }

    fn string(path: &str, s: &str) -> PropertyEntry {
        PropertyEntry::new(path, s.as_bytes().to_vec())
    }

    // -----------------------------------------------------------------------
    // Reconstruction
    // -----------------------------------------------------------------------

    #[test]
    fn rebuilds_scenario_document() {
        let list: PropertyEntryList = vec![
            float("doc1/b/[2.3]/float64", 3.0),
            string("doc1/a/string", "x"),
            float("doc1/b/[0.3]/float64", 1.0),
            float("doc1/b/[1.3]/float64", 2.0),
        ]
        .into();
        let doc = unflatten(list).unwrap();
        assert_eq!(doc, Document::from(json!({"a": "x", "b": [1, 2, 3]})));
    }

    #[test]
    fn nested_sequences_and_maps() {
        let original = Document::from(json!({
            "matrix": [[1, 2], [3]],
            "people": [{"name": "ann", "tags": ["a", null]}, {"name": "bob", "ok": true}],
        }));
        let list = flatten("d", &original).unwrap();
        assert_eq!(unflatten(list).unwrap(), original);
    }

    #[test]
    fn root_sequence_and_root_scalar() {
        let seq = Document::from(json!(["x", false]));
        assert_eq!(unflatten(flatten("d", &seq).unwrap()).unwrap(), seq);

        let scalar = Document::Float(4.5);
        assert_eq!(unflatten(flatten("d", &scalar).unwrap()).unwrap(), scalar);
    }

    #[test]
    fn empty_list_rebuilds_null() {
        assert_eq!(unflatten(PropertyEntryList::new()).unwrap(), Document::Null);
    }

    #[test]
    fn capacity_is_allocated_on_first_sight() {
        let list: PropertyEntryList = vec![float("d/a/[3.4]/float64", 9.0)].into();
        let doc = unflatten(list).unwrap();
        assert_eq!(
            doc.get("a"),
            Some(&Document::Sequence(vec![
                Document::Hole,
                Document::Hole,
                Document::Hole,
                Document::Float(9.0),
            ]))
        );
    }

    // -----------------------------------------------------------------------
    // Incomplete and duplicate input
    // -----------------------------------------------------------------------

    #[test]
    fn missing_leaves_leave_silent_gaps() {
        let original = Document::from(json!({"a": "x", "b": [1, 2, 3], "c": {"d": true}}));
        let list: PropertyEntryList = flatten("doc1", &original)
            .unwrap()
            .into_iter()
            .filter(|e| e.path != "doc1/b/[1.3]/float64" && e.path != "doc1/c/d/bool")
            .collect();

        let doc = unflatten(list).unwrap();
        assert_eq!(doc.get("a"), Some(&Document::from("x")));
        assert_eq!(
            doc.get("b"),
            Some(&Document::Sequence(vec![
                Document::Float(1.0),
                Document::Hole,
                Document::Float(3.0),
            ]))
        );
        assert!(doc.get("c").is_none());
        assert_eq!(doc.to_json(), json!({"a": "x", "b": [1, null, 3]}));
    }

    #[test]
    fn duplicate_paths_resolve_last_wins() {
        let list: PropertyEntryList = vec![
            string("d/a/string", "first"),
            string("d/a/string", "second"),
        ]
        .into();
        assert_eq!(unflatten(list).unwrap(), Document::from(json!({"a": "second"})));
    }

    #[test]
    fn first_declared_capacity_wins() {
        let list: PropertyEntryList = vec![
            float("d/a/[0.2]/float64", 1.0),
            float("d/a/[1.5]/float64", 2.0),
        ]
        .into();
        let doc = unflatten(list).unwrap();
        assert_eq!(doc.to_json(), json!({"a": [1, 2]}));
    }

    // -----------------------------------------------------------------------
    // Malformed input
    // -----------------------------------------------------------------------

    #[test]
    fn index_beyond_capacity_is_rejected() {
        let list: PropertyEntryList = vec![float("d/a/[3.3]/float64", 1.0)].into();
        assert!(matches!(
            unflatten(list),
            Err(CodecError::IndexOutOfBounds { index: 3, len: 3, .. })
        ));
    }

    #[test]
    fn shape_conflicts_are_rejected() {
        let map_vs_seq: PropertyEntryList = vec![
            float("d/a/[0.1]/float64", 1.0),
            float("d/a/k/float64", 1.0),
        ]
        .into();
        assert!(matches!(unflatten(map_vs_seq), Err(CodecError::ShapeConflict { .. })));

        let leaf_vs_map: PropertyEntryList = vec![
            string("d/a/string", "x"),
            string("d/a/b/string", "y"),
        ]
        .into();
        assert!(matches!(unflatten(leaf_vs_map), Err(CodecError::ShapeConflict { .. })));
    }

    #[test]
    fn oversized_capacity_is_rejected() {
        let path = format!("d/a/[0.{}]/nil", MAX_SEQUENCE_CAPACITY + 1);
        let list: PropertyEntryList = vec![PropertyEntry::new(path, vec![])].into();
        assert!(matches!(unflatten(list), Err(CodecError::CapacityTooLarge { .. })));
    }

    #[test]
    fn mixed_documents_are_rejected() {
        let list: PropertyEntryList = vec![string("d1/a/string", "x"), string("d2/a/string", "y")].into();
        assert!(matches!(unflatten(list), Err(CodecError::MixedDocuments { .. })));
    }

    #[test]
    fn bad_type_tag_is_rejected() {
        let list: PropertyEntryList = vec![PropertyEntry::new("d/a/int", vec![1])].into();
        assert!(matches!(unflatten(list), Err(CodecError::Path(_))));
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    fn leaf() -> impl Strategy<Value = Document> {
        prop_oneof![
            Just(Document::Null),
            any::<bool>().prop_map(Document::Bool),
            any::<f64>().prop_map(Document::Float),
            ".{0,8}".prop_map(Document::String),
        ]
    }

    fn document() -> impl Strategy<Value = Document> {
        leaf().prop_recursive(4, 48, 5, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 1..5).prop_map(Document::Sequence),
                prop::collection::btree_map("[a-z]{1,6}", inner, 1..5).prop_map(Document::Map),
            ]
        })
    }

    proptest! {
        #[test]
        fn roundtrip_preserves_structure(doc in document()) {
            let list = flatten("doc", &doc).unwrap();
            prop_assert_eq!(unflatten(list).unwrap(), doc);
        }

        #[test]
        fn any_permutation_rebuilds_the_same_document(
            (doc, shuffled) in document().prop_flat_map(|doc| {
                let entries = flatten("doc", &doc).unwrap().into_inner();
                (Just(doc), Just(entries).prop_shuffle())
            })
        ) {
            prop_assert_eq!(unflatten(shuffled.into()).unwrap(), doc);
        }
    }
}
