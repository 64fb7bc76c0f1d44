//! Candidate prefetch-path extraction.
//!
//! Every scalar leaf nested under at least one relation level contributes the
//! dot-joined chain of relation names down to its parent. A relation that is
//! itself decomposed further is superseded at that level, so a shallow path is
//! never kept when a longer path through the same prefix was also recorded.

use crate::namespace::{FieldSelector, FieldSpec};
use std::collections::BTreeSet;

/// Extract the deduplicated prefetch-path set for a field spec.
pub fn prefetch_paths(spec: &FieldSpec) -> BTreeSet<String> {
    let mut recorded = BTreeSet::new();
    let mut superseded = BTreeSet::new();
    walk(spec, "", &mut recorded, &mut superseded);
    recorded.difference(&superseded).cloned().collect()
}

fn walk(
    spec: &FieldSpec,
    prefix: &str,
    recorded: &mut BTreeSet<String>,
    superseded: &mut BTreeSet<String>,
) {
    for item in &spec.0 {
        match item {
            FieldSelector::Field(_) => {
                if !prefix.is_empty() {
                    recorded.insert(prefix.to_string());
                }
            }
            FieldSelector::Nested(map) => {
                if !prefix.is_empty() {
                    superseded.insert(prefix.to_string());
                }
                for (name, sub) in map {
                    let joined = if prefix.is_empty() {
                        name.clone()
                    } else {
                        format!("{prefix}.{name}")
                    };
                    walk(sub, &joined, recorded, superseded);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(v: serde_json::Value) -> FieldSpec {
        serde_json::from_value(v).expect("field spec parses")
    }

    #[test]
    fn deeper_path_supersedes_shallow_prefix() {
        let paths = prefetch_paths(&spec(json!([
            "id",
            {"school": ["name", {"teachers": ["name"]}]}
        ])));
        let expected: BTreeSet<String> = ["school.teachers".to_string()].into();
        assert_eq!(paths, expected);
    }

    #[test]
    fn sibling_relations_both_recorded() {
        let paths = prefetch_paths(&spec(json!([
            {"school": ["name"]},
            {"card": ["card_number"]}
        ])));
        assert!(paths.contains("school"));
        assert!(paths.contains("card"));
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn duplicate_and_split_selections_merge() {
        // The same relation selected twice, once shallow and once deep: the
        // deep decomposition wins.
        let paths = prefetch_paths(&spec(json!([
            {"school": ["name"]},
            {"school": [{"teachers": ["name"]}]}
        ])));
        let expected: BTreeSet<String> = ["school.teachers".to_string()].into();
        assert_eq!(paths, expected);
    }

    #[test]
    fn top_level_scalars_contribute_nothing() {
        assert!(prefetch_paths(&spec(json!(["id", "name"]))).is_empty());
        assert!(prefetch_paths(&spec(json!([]))).is_empty());
    }

    #[test]
    fn relation_with_empty_sub_selection_is_not_prefetched() {
        assert!(prefetch_paths(&spec(json!([{"school": []}]))).is_empty());
    }
}
