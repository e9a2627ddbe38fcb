//! Memory Store Tests
//!
//! Filter, sort and update semantics of the in-memory document store,
//! driven through normalized payloads the way the HTTP layer drives it.

use nodedb_proxy::query::{normalize, wrap_for_replacement, Node, StandardCommands};
use nodedb_proxy::store::{
    DatabaseConfig, DocumentStore, FindOptions, MemoryStore, SortOrder, StoreError,
};
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

const F: StandardCommands = StandardCommands;

fn filter(value: Value) -> Node {
    normalize(&value, Some(&F)).unwrap()
}

fn update(value: Value) -> Node {
    wrap_for_replacement(normalize(&value, Some(&F)).unwrap(), &F)
}

fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new(&DatabaseConfig::new("test-env"));
    let docs = [
        json!({"_id": "u1", "name": "Ann", "age": 31, "tags": ["admin", "ops"],
               "profile": {"city": "Shanghai", "level": 3},
               "joined": {"$date": "2023-05-01"}}),
        json!({"_id": "u2", "name": "Bob", "age": 17, "tags": ["ops"],
               "profile": {"city": "Beijing", "level": 1},
               "joined": {"$date": "2024-02-10"}}),
        json!({"_id": "u3", "name": "Cid", "age": 45, "tags": [],
               "profile": null, "deleted": true,
               "joined": {"$date": "2022-11-20"}}),
        json!({"_id": "u4", "name": "Dee", "tags": ["admin"],
               "profile": {"city": "Shanghai", "level": 2}}),
    ];
    for doc in docs {
        // Inserts carry values only, as on the HTTP path
        store
            .add("users", &normalize(&doc, None).unwrap())
            .unwrap();
    }
    store
}

fn ids(docs: &[Value]) -> Vec<&str> {
    docs.iter().map(|d| d["_id"].as_str().unwrap()).collect()
}

fn find(store: &MemoryStore, where_: Value) -> Vec<Value> {
    let options = FindOptions {
        order_by: Some(("_id".to_string(), SortOrder::Asc)),
        ..Default::default()
    };
    store.query("users", &filter(where_), &options).unwrap()
}

// =============================================================================
// Filter Tests
// =============================================================================

#[test]
fn test_empty_filter_matches_all() {
    let store = seeded_store();
    assert_eq!(ids(&find(&store, json!({}))), vec!["u1", "u2", "u3", "u4"]);
}

#[test]
fn test_range_filter() {
    let store = seeded_store();
    assert_eq!(
        ids(&find(&store, json!({"age": {"$gte": 18, "$lt": 40}}))),
        vec!["u1"]
    );
}

#[test]
fn test_missing_field_semantics() {
    let store = seeded_store();
    // Range operators never match a missing field
    assert_eq!(ids(&find(&store, json!({"age": {"$lt": 100}}))), vec!["u1", "u2", "u3"]);
    // null matches missing
    assert_eq!(ids(&find(&store, json!({"deleted": null}))), vec!["u1", "u2", "u4"]);
    // neq matches missing
    assert_eq!(
        ids(&find(&store, json!({"deleted": {"$neq": true}}))),
        vec!["u1", "u2", "u4"]
    );
}

#[test]
fn test_array_field_membership() {
    let store = seeded_store();
    assert_eq!(ids(&find(&store, json!({"tags": "admin"}))), vec!["u1", "u4"]);
    assert_eq!(
        ids(&find(&store, json!({"tags": {"$all": ["admin", "ops"]}}))),
        vec!["u1"]
    );
    assert_eq!(
        ids(&find(&store, json!({"tags": {"$in": ["ops"]}}))),
        vec!["u1", "u2"]
    );
    assert_eq!(
        ids(&find(&store, json!({"name": {"$nin": ["Ann", "Bob"]}}))),
        vec!["u3", "u4"]
    );
}

#[test]
fn test_nested_paths() {
    let store = seeded_store();
    assert_eq!(
        ids(&find(&store, json!({"profile.city": "Shanghai"}))),
        vec!["u1", "u4"]
    );
    assert_eq!(
        ids(&find(&store, json!({"profile": {"city": "Shanghai", "level": {"$gt": 2}}}))),
        vec!["u1"]
    );
    assert_eq!(ids(&find(&store, json!({"tags.0": "ops"}))), vec!["u2"]);
}

#[test]
fn test_logical_filters() {
    let store = seeded_store();
    assert_eq!(
        ids(&find(&store, json!({"$or": [{"age": {"$lt": 18}}, {"name": "Dee"}]}))),
        vec!["u2", "u4"]
    );
    assert_eq!(
        ids(&find(
            &store,
            json!({"profile.city": "Shanghai", "$or": [{"age": {"$gt": 40}}, {"name": "Dee"}]})
        )),
        vec!["u4"]
    );
    assert_eq!(
        ids(&find(&store, json!({"$and": [{"tags": "ops"}], "age": {"$gt": 20}}))),
        vec!["u1"]
    );
}

#[test]
fn test_date_filters() {
    let store = seeded_store();
    assert_eq!(
        ids(&find(&store, json!({"joined": {"$gte": {"$date": "2023-01-01T00:00:00Z"}}}))),
        vec!["u1", "u2"]
    );
    assert_eq!(
        ids(&find(&store, json!({"joined": {"$lt": {"$date": "2023-05-01T00:00+0000"}}}))),
        vec!["u3"]
    );
    assert_eq!(
        ids(&find(&store, json!({"joined": {"$date": "2022-11-20"}}))),
        vec!["u3"]
    );
}

#[test]
fn test_set_marker_in_filter_rejected() {
    let store = seeded_store();
    let err = store
        .query("users", &update(json!({"profile": {"city": "x"}})), &FindOptions::default())
        .unwrap_err();
    assert!(matches!(err, StoreError::UnsupportedFilter(_)));
}

// =============================================================================
// Sorting and Paging Tests
// =============================================================================

#[test]
fn test_sort_desc_puts_missing_last() {
    let store = seeded_store();
    let options = FindOptions {
        order_by: Some(("age".to_string(), SortOrder::Desc)),
        ..Default::default()
    };
    let docs = store.query("users", &filter(json!({})), &options).unwrap();
    assert_eq!(ids(&docs), vec!["u3", "u1", "u2", "u4"]);
}

#[test]
fn test_sort_by_date_then_page() {
    let store = seeded_store();
    let options = FindOptions {
        limit: Some(2),
        skip: 1,
        order_by: Some(("joined".to_string(), SortOrder::Asc)),
    };
    let docs = store.query("users", &filter(json!({})), &options).unwrap();
    // u4 (missing) < u3 (2022) < u1 (2023) < u2 (2024)
    assert_eq!(ids(&docs), vec!["u3", "u1"]);
}

#[test]
fn test_unbounded_limit() {
    let store = seeded_store();
    let options = FindOptions {
        limit: None,
        skip: 3,
        order_by: None,
    };
    assert_eq!(store.query("users", &filter(json!({})), &options).unwrap().len(), 1);
}

// =============================================================================
// Update Tests
// =============================================================================

#[test]
fn test_update_replaces_null_nested_field() {
    let store = seeded_store();
    let result = store
        .update_by_id("users", "u3", &update(json!({"profile": {"city": "Xi'an"}})))
        .unwrap();
    assert_eq!(result.updated, 1);
    assert_eq!(find(&store, json!({"_id": "u3"}))[0]["profile"], json!({"city": "Xi'an"}));
}

#[test]
fn test_unwrapped_merge_under_null_fails() {
    let store = seeded_store();
    let raw = normalize(&json!({"profile": {"city": "Xi'an"}}), Some(&F)).unwrap();
    let err = store.update_by_id("users", "u3", &raw).unwrap_err();
    assert!(matches!(err, StoreError::BlockedPath { .. }));
}

#[test]
fn test_update_many_with_dotted_path() {
    let store = seeded_store();
    let result = store
        .update(
            "users",
            &filter(json!({"profile.city": "Shanghai"})),
            &update(json!({"profile.level": 9, "seen": {"$date": "2024-06-01"}})),
        )
        .unwrap();
    assert_eq!(result.updated, 2);

    let docs = find(&store, json!({"profile.level": 9}));
    assert_eq!(ids(&docs), vec!["u1", "u4"]);
    assert_eq!(docs[0]["profile"]["city"], "Shanghai");
    assert_eq!(docs[0]["seen"], json!({"$date": "2024-06-01T00:00:00.000Z"}));
}

#[test]
fn test_update_array_element_by_index() {
    let store = seeded_store();
    let result = store
        .update_by_id("users", "u2", &update(json!({"tags.0": "dev"})))
        .unwrap();
    assert_eq!(result.updated, 1);
    assert_eq!(ids(&find(&store, json!({"tags.0": "dev"}))), vec!["u2"]);
    assert_eq!(find(&store, json!({"_id": "u2"}))[0]["tags"], json!(["dev"]));
}

#[test]
fn test_update_field_inside_array_element() {
    let store = seeded_store();
    store
        .add(
            "orders",
            &normalize(
                &json!({"_id": "o1", "items": [{"sku": "a", "qty": 1}, {"sku": "b", "qty": 2}]}),
                None,
            )
            .unwrap(),
        )
        .unwrap();

    let result = store
        .update_by_id("orders", "o1", &update(json!({"items.1.qty": 5})))
        .unwrap();
    assert_eq!(result.updated, 1);

    let docs = store
        .query("orders", &filter(json!({})), &FindOptions::default())
        .unwrap();
    assert_eq!(
        docs[0]["items"],
        json!([{"sku": "a", "qty": 1}, {"sku": "b", "qty": 5}])
    );
}

#[test]
fn test_update_index_past_end_leaves_document_unchanged() {
    let store = seeded_store();
    let err = store
        .update_by_id("users", "u2", &update(json!({"tags.4": "dev"})))
        .unwrap_err();
    assert!(matches!(err, StoreError::BlockedPath { found: "array", .. }));
    assert_eq!(find(&store, json!({"_id": "u2"}))[0]["tags"], json!(["ops"]));
}

#[test]
fn test_update_cannot_touch_id() {
    let store = seeded_store();
    let err = store
        .update_by_id("users", "u1", &update(json!({"_id": "zz"})))
        .unwrap_err();
    assert_eq!(err, StoreError::ImmutableId);
}

#[test]
fn test_update_unknown_id_is_zero() {
    let store = seeded_store();
    let result = store
        .update_by_id("users", "nobody", &update(json!({"a": 1})))
        .unwrap();
    assert_eq!(result.updated, 0);
}

// =============================================================================
// Remove Tests
// =============================================================================

#[test]
fn test_remove_by_filter() {
    let store = seeded_store();
    let result = store
        .remove("users", &filter(json!({"tags": {"$in": ["admin"]}})))
        .unwrap();
    assert_eq!(result.deleted, 2);
    assert_eq!(ids(&find(&store, json!({}))), vec!["u2", "u3"]);
}

#[test]
fn test_remove_from_unknown_collection() {
    let store = seeded_store();
    assert_eq!(store.remove("nope", &filter(json!({}))).unwrap().deleted, 0);
    assert_eq!(store.count("users").unwrap(), 4);
}
