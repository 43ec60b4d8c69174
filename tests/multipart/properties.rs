use futures::executor::block_on;
use less_form::{
    create_form, ArrayStrategy, FieldValue, FormData, FormError, FormOptions, FormValue,
};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn run(body: Value, options: FormOptions) -> Result<FormData, FormError> {
    block_on(create_form(FormValue::from(body), options))
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 _-]{0,12}".prop_map(Value::from),
    ]
}

fn nested() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<String, Value>>())),
        ]
    })
}

fn nest(depth: usize) -> Value {
    (0..depth).fold(json!("leaf"), |acc, i| json!({ format!("l{i}"): acc }))
}

proptest! {
    #[test]
    fn scalar_emits_exactly_one_field(key in "[a-z]{1,8}", value in scalar()) {
        let expected = match &value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let form = run(json!({ key.clone(): value }), FormOptions::default()).unwrap();
        let entries = form.into_entries();
        prop_assert_eq!(entries, vec![(key, FieldValue::Text(expected))]);
    }

    #[test]
    fn indexed_names_follow_source_order(items in prop::collection::vec("[a-z]{0,5}", 0..12)) {
        let options = FormOptions {
            array_strategy: Some(ArrayStrategy::BracketIndexed),
            ..Default::default()
        };
        let form = run(json!({ "k": items.clone() }), options).unwrap();
        let names: Vec<String> = form.names().map(str::to_string).collect();
        let expected: Vec<String> = (0..items.len()).map(|i| format!("k[{i}]")).collect();
        prop_assert_eq!(names, expected);
    }

    #[test]
    fn comma_joined_emits_one_field(items in prop::collection::vec("[a-z0-9]{0,5}", 1..10)) {
        let options = FormOptions {
            array_strategy: Some(ArrayStrategy::CommaJoined),
            ..Default::default()
        };
        let form = run(json!({ "k": items.clone() }), options).unwrap();
        let entries = form.into_entries();
        prop_assert_eq!(entries, vec![("k".to_string(), FieldValue::Text(items.join(",")))]);
    }

    #[test]
    fn serialization_is_idempotent(
        body in prop::collection::btree_map("[a-z]{1,4}", nested(), 0..5)
    ) {
        let body = Value::Object(body.into_iter().collect());
        let first = run(body.clone(), FormOptions::default()).unwrap();
        let second = run(body, FormOptions::default()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn depth_boundary(max_depth in 1usize..8) {
        let options = || FormOptions {
            max_depth: Some(max_depth),
            ..Default::default()
        };
        // `nest(n)` puts the leaf at depth n - 1 below the top-level key.
        prop_assert!(run(nest(max_depth + 1), options()).is_ok());
        let err = run(nest(max_depth + 2), options()).unwrap_err();
        let depth_matches = matches!(
            err,
            FormError::MaxDepthExceeded { max_depth: m, .. } if m == max_depth
        );
        prop_assert!(depth_matches);
    }
}
