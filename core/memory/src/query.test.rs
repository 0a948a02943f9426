use super::*;

#[test]
fn query_options_applies_offset_then_limit() {
    let opts = QueryOptions {
        offset: Some(1),
        limit: Some(2),
    };
    assert_eq!(opts.apply(vec![1, 2, 3, 4, 5]), vec![2, 3]);
}

#[test]
fn query_options_offset_past_end_returns_empty() {
    let opts = QueryOptions {
        offset: Some(10),
        limit: None,
    };
    assert_eq!(opts.apply(vec![1, 2, 3]), Vec::<i32>::new());
}

#[test]
fn query_options_defaults_return_everything() {
    let opts = QueryOptions::default();
    assert_eq!(opts.apply(vec![1, 2, 3]), vec![1, 2, 3]);
}
