use lando_config::codec::{decode_path, encode_path, is_scoped};
use lando_config::{MergeStrategy, merge_arrays};
use proptest::prelude::*;
use serde_json::{Value, json};

fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,5}([A-Z][a-z0-9]{1,5}){0,3}"
}

fn dotted_path() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 1..5).prop_map(|parts| parts.join("."))
}

fn records() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::btree_set(0u32..1000, 0..20).prop_map(|ids| {
        ids.into_iter()
            .map(|id| json!({"id": id, "name": format!("r{id}")}))
            .collect()
    })
}

proptest! {
    #[test]
    fn codec_round_trips_camel_paths(path in dotted_path()) {
        prop_assume!(!is_scoped(&path));
        prop_assert_eq!(decode_path(&encode_path(&path)), path);
    }

    #[test]
    fn encoded_paths_have_no_uppercase(path in dotted_path()) {
        prop_assert!(!encode_path(&path).chars().any(char::is_uppercase));
    }

    #[test]
    fn concat_doubles_length(a in records()) {
        prop_assert_eq!(merge_arrays(&a, &a, &MergeStrategy::Concat).len(), 2 * a.len());
    }

    #[test]
    fn merge_by_id_keeps_unique_records(a in records()) {
        let merged = merge_arrays(&a, &a, &MergeStrategy::merge_by_id());
        prop_assert_eq!(merged, a);
    }

    #[test]
    fn first_and_last_pick_a_side(a in records(), b in records()) {
        prop_assert_eq!(merge_arrays(&a, &b, &MergeStrategy::First), a);
        prop_assert_eq!(merge_arrays(&[], &b, &MergeStrategy::Last), b);
    }
}
