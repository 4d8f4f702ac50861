//! Flattening ranked hits into a single context block.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use helios_core::{inner_hit_key, HeliosError, Result, SearchHit};

/// Separator placed between inner-hit fragments of the same hit.
pub const FRAGMENT_SEPARATOR: &str = " --- ";

/// Flatten hits into one context string, preserving hit order.
///
/// Each hit contributes one line: its inner-hit fragments joined with
/// [`FRAGMENT_SEPARATOR`] when the backend returned chunks under
/// `<index>.<field>`, otherwise the primary field read straight from the
/// document source.
///
/// # Arguments
/// * `hits` - Hits in rank order
/// * `index_fields` - Primary semantic field for every index that may appear
///
/// # Errors
/// Returns [`HeliosError::UnknownIndex`] when a hit comes from an index with
/// no descriptor, and [`HeliosError::SchemaMismatch`] when a flat hit lacks
/// its primary field.
pub fn flatten_context(hits: &[SearchHit], index_fields: &HashMap<String, String>) -> Result<String> {
    let mut context = String::new();
    let mut chunked = 0usize;

    for hit in hits {
        let field = index_fields
            .get(&hit.index)
            .ok_or_else(|| HeliosError::unknown_index(&hit.index))?;

        let key = inner_hit_key(&hit.index, field);
        match hit.inner_hits_for(&key) {
            Some(fragments) => {
                chunked += 1;
                let joined = fragments
                    .iter()
                    .map(|fragment| fragment.text.as_str())
                    .collect::<Vec<_>>()
                    .join(FRAGMENT_SEPARATOR);
                context.push_str(&joined);
            }
            None => {
                let value = source_text(hit, field)?;
                context.push_str(&value);
            }
        }
        context.push('\n');
    }

    debug!(
        "Flattened {} hits ({} chunked) into {} bytes of context",
        hits.len(),
        chunked,
        context.len()
    );

    Ok(context)
}

/// Text of a flat hit's primary field.
fn source_text(hit: &SearchHit, field: &str) -> Result<String> {
    match hit.source.get(field) {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(Value::Null) | None => Err(HeliosError::schema_mismatch(&hit.index, field)),
        Some(other) => Ok(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(names: &[&str]) -> HashMap<String, String> {
        names
            .iter()
            .map(|n| (n.to_string(), "semantic_field".to_string()))
            .collect()
    }

    fn source(value: Value) -> serde_json::Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("source must be an object"),
        }
    }

    fn pharmacy_hits() -> Vec<SearchHit> {
        vec![
            SearchHit::flat("A", serde_json::Map::new()).with_inner_hits(
                "A.semantic_field",
                ["Pharmacy X open 24h", "Located 1.2km away"],
            ),
            SearchHit::flat(
                "B",
                source(json!({"semantic_field": "Community Pharmacy Network"})),
            ),
        ]
    }

    #[test]
    fn test_mixed_inner_and_flat_hits() {
        let context = flatten_context(&pharmacy_hits(), &fields(&["A", "B"])).unwrap();
        assert_eq!(
            context,
            "Pharmacy X open 24h --- Located 1.2km away\nCommunity Pharmacy Network\n"
        );
    }

    #[test]
    fn test_order_follows_hits() {
        let mut hits = pharmacy_hits();
        hits.reverse();
        let context = flatten_context(&hits, &fields(&["A", "B"])).unwrap();
        assert_eq!(
            context,
            "Community Pharmacy Network\nPharmacy X open 24h --- Located 1.2km away\n"
        );
    }

    #[test]
    fn test_deterministic_output() {
        let hits = pharmacy_hits();
        let map = fields(&["A", "B"]);
        let first = flatten_context(&hits, &map).unwrap();
        let second = flatten_context(&hits, &map).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_single_fragment_has_no_separator() {
        let hits = vec![SearchHit::flat("A", serde_json::Map::new())
            .with_inner_hits("A.semantic_field", ["only chunk"])];
        let context = flatten_context(&hits, &fields(&["A"])).unwrap();
        assert_eq!(context, "only chunk\n");
        assert!(!context.contains(FRAGMENT_SEPARATOR.trim()));
    }

    #[test]
    fn test_inner_hits_under_other_key_fall_back_to_source() {
        let hits = vec![SearchHit::flat("A", source(json!({"semantic_field": "from source"})))
            .with_inner_hits("A.description", ["ignored"])];
        let context = flatten_context(&hits, &fields(&["A"])).unwrap();
        assert_eq!(context, "from source\n");
    }

    #[test]
    fn test_missing_field_is_schema_mismatch() {
        let hits = vec![SearchHit::flat("B", source(json!({"title": "no semantic field"})))];
        let err = flatten_context(&hits, &fields(&["B"])).unwrap_err();
        match err {
            HeliosError::SchemaMismatch { index, field } => {
                assert_eq!(index, "B");
                assert_eq!(field, "semantic_field");
            }
            other => panic!("expected schema mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_null_field_is_schema_mismatch() {
        let hits = vec![SearchHit::flat("B", source(json!({"semantic_field": null})))];
        let err = flatten_context(&hits, &fields(&["B"])).unwrap_err();
        assert_eq!(err.error_code(), "SCHEMA_MISMATCH");
    }

    #[test]
    fn test_unknown_index_is_schema_mismatch() {
        let hits = vec![SearchHit::flat("C", source(json!({"semantic_field": "x"})))];
        let err = flatten_context(&hits, &fields(&["A"])).unwrap_err();
        assert_eq!(err.error_code(), "SCHEMA_MISMATCH");
        match err {
            HeliosError::UnknownIndex { index } => assert_eq!(index, "C"),
            other => panic!("expected unknown index, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_inner_hits_give_empty_line() {
        let hits = vec![
            SearchHit::flat("A", source(json!({"semantic_field": "not used"})))
                .with_inner_hits("A.semantic_field", Vec::<String>::new()),
            SearchHit::flat("B", source(json!({"semantic_field": "after"}))),
        ];
        let context = flatten_context(&hits, &fields(&["A", "B"])).unwrap();
        assert_eq!(context, "\nafter\n");
    }

    #[test]
    fn test_non_string_field_uses_json_text() {
        let hits = vec![SearchHit::flat("A", source(json!({"semantic_field": 123456})))];
        let context = flatten_context(&hits, &fields(&["A"])).unwrap();
        assert_eq!(context, "123456\n");
    }

    #[test]
    fn test_empty_hits_give_empty_context() {
        let context = flatten_context(&[], &fields(&["A"])).unwrap();
        assert!(context.is_empty());
    }
}
