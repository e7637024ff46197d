use query_core::{
    translate, Error, Filter, OperatorKind, Predicate, QueryParams, QueryTranslator, QueryValue,
    SameFieldPolicy, SortDir, StructuredQuery, TranslatorConfig, DEFAULT_PAGE_SIZE,
};

fn params(pairs: &[(&str, &str)]) -> QueryParams {
    QueryParams::from_pairs(pairs.iter().copied())
}

#[test]
fn every_operator_yields_one_plain_filter() {
    for op in OperatorKind::ALL {
        let key = format!("field__{op}");
        let q = translate(&params(&[(key.as_str(), "v")])).unwrap();
        assert_eq!(q.filters.len(), 1, "operator {op}");
        let f = &q.filters[0];
        assert_eq!(f.field, "field");
        assert_eq!(f.operator, op);
        assert!(!f.negated);
    }
}

#[test]
fn negated_greater_than() {
    let q = translate(&params(&[("field__not__gt", "5")])).unwrap();
    let f = &q.filters[0];
    assert!(f.negated);
    assert_eq!(f.operator, OperatorKind::Gt);
    assert_eq!(
        f.predicate(),
        Predicate::Not(Box::new(Predicate::Gt("5".into())))
    );
}

#[test]
fn unknown_operator_is_an_error() {
    let err = translate(&params(&[("field__bogus", "x")])).unwrap_err();
    assert_eq!(err, Error::InvalidOperator("bogus".into()));
}

#[test]
fn bare_key_is_equality_on_first_value() {
    let mut p = QueryParams::new();
    p.insert("name", vec!["bob", "alice"]);
    let q = translate(&p).unwrap();
    let f = q.filter("name").unwrap();
    assert_eq!(f.operator, OperatorKind::Eq);
    assert_eq!(f.predicate(), Predicate::Eq("bob".into()));
}

#[test]
fn pagination_defaults() {
    let q = translate(&QueryParams::new()).unwrap();
    assert_eq!(q.skip, 0);
    assert_eq!(q.take, DEFAULT_PAGE_SIZE);
    assert!(q.filters.is_empty());
    assert_eq!(q.order, None);
    assert_eq!(q.relations, None);
}

#[test]
fn pagination_page_and_size() {
    let q = translate(&params(&[("__page", "3"), ("__page_size", "10")])).unwrap();
    assert_eq!(q.skip, 20);
    assert_eq!(q.take, 10);
    assert_eq!(q.page(), 3);
}

#[test]
fn array_page_falls_back_to_first_page() {
    let mut p = QueryParams::new();
    p.insert("__page", vec!["a", "b"]);
    p.insert("__page_size", vec!["5", "6"]);
    let q = translate(&p).unwrap();
    assert_eq!(q.skip, 0);
    assert_eq!(q.take, DEFAULT_PAGE_SIZE);
}

#[test]
fn garbage_pagination_degrades_to_defaults() {
    let q = translate(&params(&[("__page", "-4"), ("__page_size", "zero")])).unwrap();
    assert_eq!(q.skip, 0);
    assert_eq!(q.take, DEFAULT_PAGE_SIZE);

    let q = translate(&params(&[("__page", "2"), ("__page_size", "0")])).unwrap();
    assert_eq!(q.take, DEFAULT_PAGE_SIZE);
    assert_eq!(q.skip, DEFAULT_PAGE_SIZE);
}

#[test]
fn order_sign_selects_direction() {
    let q = translate(&params(&[("__order", "-name")])).unwrap();
    let order = q.order.unwrap();
    assert_eq!(order.len(), 1);
    assert_eq!(order[0].column, "name");
    assert_eq!(order[0].direction, SortDir::Desc);

    let q = translate(&params(&[("__order", "+name"), ("__order", "age")])).unwrap();
    let order = q.order.unwrap();
    assert_eq!(order[0].direction, SortDir::Asc);
    // unsigned tokens sort descending
    assert_eq!(order[1].column, "age");
    assert_eq!(order[1].direction, SortDir::Desc);
}

#[test]
fn populate_is_kept_verbatim() {
    let q = translate(&QueryParams::parse("__populate=author&__populate=comments")).unwrap();
    assert_eq!(
        q.relations,
        Some(vec!["author".to_string(), "comments".to_string()])
    );

    let q = translate(&params(&[("__populate", "nonexistent")])).unwrap();
    assert_eq!(q.relations, Some(vec!["nonexistent".to_string()]));
}

#[test]
fn control_keys_never_filter() {
    let q = translate(&params(&[
        ("__page", "1"),
        ("__page_size", "2"),
        ("__order", "x"),
        ("__populate", "y"),
        ("__mystery", "z"),
    ]))
    .unwrap();
    assert!(q.filters.is_empty());
}

#[test]
fn same_field_overwrites_by_default() {
    let q = translate(&params(&[
        ("age__gte", "18"),
        ("name", "bob"),
        ("age__lt", "65"),
    ]))
    .unwrap();
    assert_eq!(q.filters.len(), 2);
    assert_eq!(q.filters[0].field, "age");
    assert_eq!(q.filters[0].operator, OperatorKind::Lt);
    assert_eq!(q.filters[1].field, "name");
}

#[test]
fn same_field_conjoin_policy_keeps_all() {
    let translator = QueryTranslator::new(TranslatorConfig {
        same_field: SameFieldPolicy::Conjoin,
        ..Default::default()
    });
    let q = translator
        .translate(&params(&[("age__gte", "18"), ("age__lt", "65")]))
        .unwrap();
    let ops: Vec<OperatorKind> = q.filters.iter().map(|f| f.operator).collect();
    assert_eq!(ops, [OperatorKind::Gte, OperatorKind::Lt]);
}

#[test]
fn max_page_size_caps_take() {
    let translator = QueryTranslator::new(TranslatorConfig {
        max_page_size: Some(50),
        ..Default::default()
    });
    let q = translator
        .translate(&params(&[("__page", "2"), ("__page_size", "500")]))
        .unwrap();
    assert_eq!(q.take, 50);
    assert_eq!(q.skip, 50);
}

#[test]
fn where_json_adds_equality_filters() {
    let q = translate(&params(&[("age__gte", "18")]))
        .unwrap()
        .with_where_json(r#"{"status":"active"}"#)
        .unwrap();
    assert_eq!(q.filters.len(), 2);
    assert_eq!(
        q.filter("status").unwrap(),
        &Filter::eq("status", QueryValue::One("active".into()))
    );

    let err = StructuredQuery::default().with_where_json("nope").unwrap_err();
    assert!(matches!(err, Error::InvalidWhereClause { .. }));
}

#[test]
fn structured_query_serializes_to_plain_json() {
    let q = translate(&QueryParams::parse("name__not__icontains=bob&__order=-created_at")).unwrap();
    let json = serde_json::to_value(&q).unwrap();
    assert_eq!(json["filters"][0]["operator"], "icontains");
    assert_eq!(json["filters"][0]["negated"], true);
    assert_eq!(json["filters"][0]["value"], "bob");
    assert_eq!(json["order"][0]["direction"], "DESC");
    assert!(json.get("relations").is_none());
}

#[test]
fn empty_operator_segment_is_equality() {
    let q = QueryParams::parse("name__=bob");
    let q = translate(&q).unwrap();
    assert_eq!(q.filters, vec![Filter::eq("name", "bob".into())]);
}

#[test]
fn empty_order_and_populate_are_ignored() {
    let q = translate(&QueryParams::parse("__order=&__populate=")).unwrap();
    assert_eq!(q.order, None);
    assert_eq!(q.relations, None);
    assert!(q.filters.is_empty());

    let q = translate(&QueryParams::parse("__order=-&__order=%2Bage&__populate=&__populate=team"))
        .unwrap();
    let order = q.order.unwrap();
    assert_eq!(order.len(), 1);
    assert_eq!(order[0].column, "age");
    assert_eq!(order[0].direction, SortDir::Asc);
    assert_eq!(q.relations, Some(vec!["team".to_string()]));
}
