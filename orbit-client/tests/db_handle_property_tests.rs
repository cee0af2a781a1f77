use orbit_client::DbHandle;
use orbit_core::Method;
use orbit_test_utils::fixtures::{db_path, docstore_params, feed_params, DOCS_ID, FEED_ID};
use orbit_test_utils::generators::{
    arb_db_params, arb_entry_hash, arb_indexed_item, arb_json_value, arb_key,
};
use orbit_test_utils::MockConnection;
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
        .block_on(future)
}

proptest! {
    #[test]
    fn cached_get_returns_equal_detached_copies(key in arb_key(), value in arb_json_value()) {
        let conn = Arc::new(MockConnection::new());
        conn.respond(Method::Get, db_path(FEED_ID, &[&key]), value.clone());
        let mut db = DbHandle::new(conn.clone(), feed_params(), false).unwrap();

        block_on(async {
            let mut first = db.get(&key, Some(true)).await.unwrap();
            match first.as_object_mut() {
                Some(map) => {
                    map.insert("__mutated".to_string(), json!(true));
                }
                None => first = json!({"__mutated": true}),
            }
            let second = db.get(&key, Some(true)).await.unwrap();
            prop_assert_eq!(&second, &value);
            prop_assert_ne!(&first, &second);
            prop_assert_eq!(conn.call_count(), 1);
            Ok(())
        })?;
        prop_assert_eq!(db.cache_get(&key), Some(value));
    }

    #[test]
    fn uncached_get_never_touches_cache(key in arb_key(), cached in arb_json_value(), fresh in arb_json_value()) {
        let conn = Arc::new(MockConnection::new());
        let path = db_path(FEED_ID, &[&key]);
        conn.respond_once(Method::Get, path.clone(), cached.clone())
            .respond(Method::Get, path.clone(), fresh.clone());
        let mut db = DbHandle::new(conn.clone(), feed_params(), true).unwrap();

        block_on(async {
            db.get(&key, None).await.unwrap();
            let result = db.get(&key, Some(false)).await.unwrap();
            prop_assert_eq!(result, fresh);
            Ok(())
        })?;
        prop_assert_eq!(conn.calls_to(Method::Get, &path), 2);
        prop_assert_eq!(db.cache_get(&key), Some(cached));
    }

    #[test]
    fn remove_then_get_is_absent(keys in prop::collection::vec(arb_key(), 1..8)) {
        let index: serde_json::Map<_, _> = keys.iter().map(|k| (k.clone(), json!(k))).collect();
        let conn = Arc::new(MockConnection::new());
        conn.respond(Method::Get, db_path(FEED_ID, &["index"]), serde_json::Value::Object(index));
        let mut db = DbHandle::new(conn, feed_params(), false).unwrap();
        block_on(db.index()).unwrap();

        for key in &keys {
            db.cache_remove(key);
            prop_assert!(db.cache_get(key).is_none());
        }
        prop_assert!(db.cache().is_empty());
    }

    #[test]
    fn put_caches_under_index_and_hash((index, item) in arb_indexed_item("name"), hash in arb_entry_hash()) {
        let conn = Arc::new(MockConnection::new());
        conn.respond(Method::Post, db_path(DOCS_ID, &["put"]), json!(hash.as_str()));
        let mut db = DbHandle::new(conn, docstore_params("name"), true).unwrap();

        let returned = block_on(db.put(&item, None)).unwrap();
        prop_assert_eq!(&returned, &hash);

        let cache = db.cache();
        prop_assert_eq!(cache.len(), 2);
        prop_assert_eq!(cache.get(&index), Some(&item));
        prop_assert_eq!(cache.get(hash.as_str()), Some(&item));
    }

    #[test]
    fn add_caches_under_hash_only((_index, item) in arb_indexed_item("name"), hash in arb_entry_hash()) {
        let conn = Arc::new(MockConnection::new());
        conn.respond(Method::Post, db_path(DOCS_ID, &["add"]), json!(hash.as_str()));
        let mut db = DbHandle::new(conn, docstore_params("name"), true).unwrap();

        block_on(db.add(&item, None)).unwrap();
        let cache = db.cache();
        prop_assert_eq!(cache.len(), 1);
        prop_assert_eq!(cache.get(hash.as_str()), Some(&item));
    }

    #[test]
    fn capability_accessors_match_params(params in arb_db_params()) {
        let conn = Arc::new(MockConnection::new());
        let db = DbHandle::new(conn, params.clone(), false).unwrap();

        prop_assert_eq!(db.queryable(), params.capabilities.contains("query"));
        prop_assert_eq!(db.putable(), params.capabilities.contains("put"));
        prop_assert_eq!(db.params(), params);
        prop_assert!(!db.id_safe().contains('/'));
    }
}
