//! Property tests for the configuration format: any tree serializes to
//! text that parses back structurally equal.

use std::sync::Arc;

use flujo_cfg::{Obj, Scalar, parse};
use proptest::prelude::*;

fn scalar_strategy() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        any::<bool>().prop_map(Scalar::Bool),
        any::<i64>().prop_map(Scalar::Int),
        any::<u64>().prop_map(Scalar::UInt),
        // Finite reals only: NaN breaks equality, infinities don't lex.
        (-1.0e30f32..1.0e30f32).prop_map(Scalar::Float),
        (-1.0e60f64..1.0e60f64).prop_map(Scalar::Double),
        "[ -~]{0,12}".prop_map(Scalar::Str),
    ]
}

fn label_strategy() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,8}"
}

fn obj_strategy() -> impl Strategy<Value = Arc<Obj>> {
    let leaf = scalar_strategy().prop_map(|s| Arc::new(Obj::Scalar(s)));
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(|v| Arc::new(Obj::List(v))),
            prop::collection::vec((label_strategy(), inner), 0..4).prop_map(|pairs| {
                // Drop duplicate labels: the parser rejects them.
                let mut seen = std::collections::HashSet::new();
                let pairs = pairs
                    .into_iter()
                    .filter(|(k, _)| seen.insert(k.clone()))
                    .collect();
                Arc::new(Obj::Dict(pairs))
            }),
        ]
    })
}

proptest! {
    #[test]
    fn roundtrip_structural_equality(pairs in prop::collection::vec((label_strategy(), obj_strategy()), 0..4)) {
        let mut seen = std::collections::HashSet::new();
        let pairs: Vec<(String, Arc<Obj>)> = pairs
            .into_iter()
            .filter(|(k, _)| seen.insert(k.clone()))
            .collect();
        let root = Arc::new(Obj::Dict(pairs));

        let text = root.to_text();
        let back = parse(&text).unwrap_or_else(|e| panic!("reparse failed: {e}\n{text}"));
        prop_assert_eq!(&*root, &*back);

        // A second print of the reparsed tree is bit-identical.
        prop_assert_eq!(text, back.to_text());
    }
}
