//! Property-based tests for model types.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::model::{ActionSet, Actions, NodeRef, PermissionValue};

    /// Strategy to generate alias paths like "controllers/Users/edit"
    fn alias_path_strategy() -> impl Strategy<Value = String> {
        prop::collection::vec("[A-Za-z][A-Za-z_]{0,9}", 1..5).prop_map(|segments| segments.join("/"))
    }

    proptest! {
        #[test]
        fn test_tri_state_roundtrips_through_storage_form(raw in -1i8..=1) {
            let value = PermissionValue::try_from(raw).unwrap();
            prop_assert_eq!(value.as_i8(), raw);
        }

        #[test]
        fn test_out_of_range_values_are_rejected(raw in any::<i8>()) {
            prop_assume!(!(-1..=1).contains(&raw));
            prop_assert_eq!(PermissionValue::try_from(raw), Err(raw));
        }

        #[test]
        fn test_numeric_identifiers_parse_as_ids(id in any::<u64>()) {
            prop_assert_eq!(NodeRef::parse(&id.to_string()), Some(NodeRef::Id(id)));
        }

        #[test]
        fn test_alias_paths_parse_as_paths(path in alias_path_strategy()) {
            let parsed = NodeRef::parse(&path);
            prop_assert_eq!(parsed, Some(NodeRef::Path(path.clone())));
        }

        #[test]
        fn test_bindings_parse_and_display(model in "[A-Z][a-z]{1,8}", key in "[0-9a-z]{1,8}") {
            let text = format!("{model}::{key}");
            let parsed = NodeRef::parse(&text).unwrap();
            prop_assert_eq!(parsed.to_string(), text);
            let is_binding = matches!(parsed, NodeRef::Binding { .. });
            prop_assert!(is_binding);
        }

        #[test]
        fn test_underscore_prefix_is_ignored(name in "[a-z]{1,10}") {
            let actions = ActionSet::new([name.as_str()]).unwrap();
            let prefixed = format!("_{name}");
            prop_assert!(actions.contains(&prefixed));
            prop_assert_eq!(actions.field_name(&name), Some(prefixed));
        }

        #[test]
        fn test_comma_lists_keep_every_name(names in prop::collection::vec("[a-z]{1,6}", 1..6)) {
            let parsed = Actions::from(names.join(",").as_str());
            prop_assert_eq!(parsed, Actions::Named(names));
        }
    }
}
