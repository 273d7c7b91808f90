//! Properties that hold for any tree: rendering and parsing back
//! gives the same tree, and an unclosed construct is always reported
//! at its opening.

use proptest::prelude::*;
use sexpnode::parse::{parse, ParseError};
use sexpnode::value::{ByteString, Value};

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 200,
        ..ProptestConfig::default()
    }
}

fn value() -> impl Strategy<Value = Value> {
    let leaf = prop::collection::vec(any::<u8>(), 0..8)
        .prop_map(|bs| Value::Scalar(ByteString(bs)));
    leaf.prop_recursive(6, 64, 6, |inner| {
        prop::collection::vec(inner, 0..6).prop_map(Value::List)
    })
}

fn render(vs: &[Value]) -> String {
    vs.iter().map(Value::to_string).collect::<Vec<_>>().join(" ")
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn rendering_parses_back(vs in prop::collection::vec(value(), 0..6)) {
        let src = render(&vs);
        let ast = parse(src.as_bytes(), "", None, None).unwrap();
        prop_assert_eq!(Value::from(ast.root()), Value::List(vs));
    }

    #[test]
    fn untyped_decoding_is_repeatable(vs in prop::collection::vec(value(), 0..6)) {
        let src = render(&vs);
        let ast = parse(src.as_bytes(), "", None, None).unwrap();
        let mut a = Value::default();
        let mut b = Value::Scalar("stale".into());
        ast.root().decode(&mut a).unwrap();
        ast.root().decode(&mut b).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn unclosed_construct_is_reported_at_its_opening(
        vs in prop::collection::vec(value(), 0..4),
        (opener, closer) in prop::sample::select(vec![('(', ')'), ('"', '"'), ('`', '`')]),
    ) {
        let prefix = render(&vs);
        let src = format!("{} {}abc def", prefix, opener);
        let err = parse(src.as_bytes(), "", None, None).unwrap_err();
        prop_assert!(matches!(err.err, ParseError::MissingDelimiter(c) if c == closer),
                     "{}", err);
        prop_assert_eq!(err.loc.offset(), prefix.len() + 1);
    }

    #[test]
    fn arbitrary_input_does_not_panic(input in prop::collection::vec(any::<u8>(), 0..600)) {
        let _ = parse(&input[..], "", None, None);
    }

    #[test]
    fn node_count_matches_value_shape(vs in prop::collection::vec(value(), 0..6)) {
        fn count(v: &Value) -> usize {
            1 + v.as_list().map_or(0, |l| l.iter().map(count).sum())
        }
        let src = render(&vs);
        let ast = parse(src.as_bytes(), "", None, None).unwrap();
        prop_assert_eq!(ast.num_nodes(), count(&Value::List(vs)));
    }
}
