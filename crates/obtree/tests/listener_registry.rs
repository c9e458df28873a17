use std::sync::{Arc, Mutex};

use obtree::{FieldDef, Matcher, ModelTree, PropertyMatcher, SchemaSet, TreeError, TypeDef};

fn setup() -> (ModelTree, obtree::NodeId, obtree::NodeId) {
    let schema = Arc::new(
        SchemaSet::new()
            .define(TypeDef::new("Root").field(FieldDef::new("item")))
            .define(
                TypeDef::new("Item")
                    .field(FieldDef::new("x"))
                    .field(FieldDef::new("y")),
            ),
    );
    let mut tree = ModelTree::new(schema);
    let root = tree.create("Root");
    let item = tree.create("Item");
    tree.set(root, "item", item).unwrap();
    tree.inject(item, root);
    (tree, root, item)
}

fn counter() -> (
    Arc<Mutex<u32>>,
    impl FnMut(&mut obtree::ModelEvent) + Clone + Send + Sync + 'static,
) {
    let count = Arc::new(Mutex::new(0u32));
    let seen = Arc::clone(&count);
    (count, move |_event: &mut obtree::ModelEvent| {
        *seen.lock().unwrap() += 1;
    })
}

#[test]
fn catch_all_bin_receives_generic_and_field_events() {
    let (mut tree, _root, item) = setup();
    let (count, callback) = counter();
    tree.listen(item, Matcher::Any, PropertyMatcher::None, callback)
        .unwrap();

    tree.handle(item);
    tree.set(item, "x", 1).unwrap();

    assert_eq!(*count.lock().unwrap(), 2);
}

#[test]
fn property_listener_fires_for_its_property_only() {
    let (mut tree, _root, item) = setup();
    let (count, callback) = counter();
    tree.listen(
        item,
        Matcher::Any,
        PropertyMatcher::Name("x".to_owned()),
        callback,
    )
    .unwrap();

    tree.set(item, "x", 1).unwrap();
    tree.set(item, "y", 2).unwrap();

    assert_eq!(*count.lock().unwrap(), 1);
}

#[test]
fn property_array_fans_out_with_one_disposer() {
    let (mut tree, _root, item) = setup();
    let (count, callback) = counter();
    let sub = tree
        .listen(
            item,
            Matcher::Any,
            PropertyMatcher::Names(vec!["x".to_owned(), "y".to_owned()]),
            callback,
        )
        .unwrap();

    tree.set(item, "x", 1).unwrap();
    tree.set(item, "y", 2).unwrap();
    assert_eq!(*count.lock().unwrap(), 2);

    assert!(tree.unlisten(&sub));
    tree.set(item, "x", 3).unwrap();
    tree.set(item, "y", 4).unwrap();
    assert_eq!(*count.lock().unwrap(), 2);
}

#[test]
fn kind_matcher_ignores_the_property_matcher() {
    let (mut tree, _root, item) = setup();
    let (count, callback) = counter();
    tree.listen(
        item,
        Matcher::Kind("save".to_owned()),
        PropertyMatcher::Name("x".to_owned()),
        callback,
    )
    .unwrap();

    tree.set(item, "x", 1).unwrap();
    assert_eq!(*count.lock().unwrap(), 0);

    let event = tree.event_as(item, "save");
    tree.handle_event(item, event, true);
    assert_eq!(*count.lock().unwrap(), 1);
}

#[test]
fn matcher_array_fans_out_with_one_disposer() {
    let (mut tree, _root, item) = setup();
    let (count, callback) = counter();
    let sub = tree
        .listen(
            item,
            Matcher::Each(vec![Matcher::Kind("save".to_owned()), Matcher::Every]),
            PropertyMatcher::None,
            callback,
        )
        .unwrap();

    // a typed event hits the kind bucket and the unfiltered bin
    let event = tree.event_as(item, "save");
    tree.handle_event(item, event, true);
    assert_eq!(*count.lock().unwrap(), 2);

    // a generic event only hits the unfiltered bin
    tree.handle(item);
    assert_eq!(*count.lock().unwrap(), 3);

    assert!(tree.unlisten(&sub));
    tree.handle(item);
    assert_eq!(*count.lock().unwrap(), 3);
    assert!(!tree.unlisten(&sub));
}

#[test]
fn unfiltered_bin_sees_every_event_shape() {
    let (mut tree, _root, item) = setup();
    let (count, callback) = counter();
    tree.listen(item, Matcher::Every, PropertyMatcher::None, callback)
        .unwrap();

    tree.handle(item);
    tree.set(item, "x", 1).unwrap();
    let event = tree.event_as(item, "save");
    tree.handle_event(item, event, true);

    assert_eq!(*count.lock().unwrap(), 3);
}

#[test]
fn disposing_removes_exactly_one_subscription() {
    let (mut tree, _root, item) = setup();
    let (first_count, first) = counter();
    let (second_count, second) = counter();
    let first_sub = tree
        .listen(item, Matcher::Any, PropertyMatcher::None, first)
        .unwrap();
    tree.listen(item, Matcher::Any, PropertyMatcher::None, second)
        .unwrap();

    tree.handle(item);
    assert!(tree.unlisten(&first_sub));
    tree.handle(item);

    assert_eq!(*first_count.lock().unwrap(), 1);
    assert_eq!(*second_count.lock().unwrap(), 2);

    // disposing twice is a no-op, not an error
    assert!(!tree.unlisten(&first_sub));
    assert_eq!(*second_count.lock().unwrap(), 2);
}

#[test]
fn malformed_specs_fail_before_touching_any_bin() {
    let (mut tree, _root, item) = setup();
    let (count, callback) = counter();

    let specs: Vec<(Matcher, PropertyMatcher)> = vec![
        (Matcher::Kind(String::new()), PropertyMatcher::None),
        (Matcher::Each(Vec::new()), PropertyMatcher::None),
        (
            Matcher::Each(vec![Matcher::Kind("ok".to_owned()), Matcher::Kind(String::new())]),
            PropertyMatcher::None,
        ),
        (Matcher::Any, PropertyMatcher::Name(String::new())),
        (Matcher::Any, PropertyMatcher::Names(Vec::new())),
        (
            Matcher::Any,
            PropertyMatcher::Names(vec!["x".to_owned(), String::new()]),
        ),
    ];
    for (matcher, properties) in specs {
        let result = tree.listen(item, matcher, properties, callback.clone());
        assert!(matches!(result, Err(TreeError::InvalidListenerSpec(_))));
    }

    // the partially-valid array registered nothing
    let event = tree.event_as(item, "ok");
    tree.handle_event(item, event, true);
    tree.set(item, "x", 1).unwrap();
    tree.handle(item);
    assert_eq!(*count.lock().unwrap(), 0);
}
