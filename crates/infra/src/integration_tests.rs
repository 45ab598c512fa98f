//! Store tests against private SQLite databases.
//!
//! Most tests use an in-memory database. The concurrency tests use a WAL file
//! database behind a multi-connection pool, the production setup. Each test
//! gets its own migrated database, so they run in parallel without sharing
//! state.

use chrono::Utc;

use chemstock_core::{DomainError, Entity, InventoryId, ProductId};
use chemstock_inventory::{AdjustStock, MovementType, RegisterProduct};

use crate::config::DatabaseConfig;
use crate::db;
use crate::store::{InventoryStore, ProductRegistration, StoreError};

async fn store() -> InventoryStore {
    let pool = db::connect_and_migrate(&DatabaseConfig::in_memory())
        .await
        .expect("in-memory database");
    InventoryStore::new(pool)
}

async fn count(store: &InventoryStore, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(store.pool())
        .await
        .unwrap()
}

async fn register(
    store: &InventoryStore,
    name: &str,
    identifier: &str,
    qty: f64,
) -> ProductRegistration {
    let cmd = RegisterProduct::new(name, identifier, "L", qty).unwrap();
    store.register_product(&cmd).await.unwrap()
}

fn adjust(id: InventoryId, movement_type: &str, qty: f64) -> AdjustStock {
    AdjustStock::parse(id, qty, movement_type, Utc::now()).unwrap()
}

#[tokio::test]
async fn registration_creates_product_inventory_and_opening_movement() {
    let store = store().await;
    let reg = register(&store, "Acetone", "67-64-1", 10.0).await;

    assert_eq!(reg.product.name(), "Acetone");
    assert_eq!(reg.inventory.product_id(), reg.product.id());
    assert_eq!(reg.inventory.current_stock(), 10.0);
    assert_eq!(reg.movement.product_id(), reg.product.id());
    assert_eq!(reg.movement.movement_type(), MovementType::In);
    assert_eq!(reg.movement.quantity().get(), 10.0);

    assert_eq!(count(&store, "chemical_products").await, 1);
    assert_eq!(count(&store, "inventory").await, 1);
    assert_eq!(count(&store, "stock_movements").await, 1);

    let stored = store.get_inventory(reg.inventory.id()).await.unwrap().unwrap();
    assert_eq!(stored, reg.inventory);
}

#[tokio::test]
async fn duplicate_identifier_is_rejected_without_new_rows() {
    let store = store().await;
    register(&store, "Acetone", "67-64-1", 10.0).await;

    let dup = RegisterProduct::new("Propanone", " 67-64-1 ", "mL", 3.0).unwrap();
    let err = store.register_product(&dup).await.unwrap_err();
    match err {
        StoreError::DuplicateIdentifier(id) => assert_eq!(id, "67-64-1"),
        other => panic!("expected DuplicateIdentifier, got {other:?}"),
    }

    assert_eq!(count(&store, "chemical_products").await, 1);
    assert_eq!(count(&store, "inventory").await, 1);
    assert_eq!(count(&store, "stock_movements").await, 1);
}

#[tokio::test]
async fn concurrent_duplicate_registrations_leave_exactly_one_product() {
    let store = store().await;
    let a = RegisterProduct::new("Ethanol", "64-17-5", "L", 1.0).unwrap();
    let b = RegisterProduct::new("Ethyl alcohol", "64-17-5", "L", 2.0).unwrap();

    let (ra, rb) = tokio::join!(store.register_product(&a), store.register_product(&b));

    let failures: Vec<StoreError> = [ra, rb].into_iter().filter_map(Result::err).collect();
    assert_eq!(failures.len(), 1);
    assert!(matches!(failures[0], StoreError::DuplicateIdentifier(_)));
    assert_eq!(count(&store, "chemical_products").await, 1);
    assert_eq!(count(&store, "stock_movements").await, 1);
}

#[tokio::test]
async fn unique_constraint_backs_the_explicit_check() {
    let store = store().await;
    register(&store, "Acetone", "67-64-1", 10.0).await;

    let err = sqlx::query(
        "INSERT INTO chemical_products (name, cas_number, unit) VALUES ('x', '67-64-1', 'L')",
    )
    .execute(store.pool())
    .await
    .unwrap_err();
    match crate::store::map_sqlx_error("raw_insert", err) {
        StoreError::Domain(DomainError::Conflict(_)) => {}
        other => panic!("expected Conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn acetone_example_walkthrough() {
    let store = store().await;
    let reg = register(&store, "Acetone", "67-64-1", 10.0).await;
    let inv = reg.inventory.id();

    let out4 = store.adjust_stock(&adjust(inv, "OUT", 4.0)).await.unwrap();
    assert_eq!(out4.inventory.current_stock(), 6.0);
    assert_eq!(out4.movement.movement_type(), MovementType::Out);
    assert_eq!(out4.movement.quantity().get(), 4.0);

    let history = store.list_movements().await.unwrap();
    let seen: Vec<(MovementType, f64)> = history
        .iter()
        .map(|l| (l.movement.movement_type(), l.movement.quantity().get()))
        .collect();
    assert_eq!(seen, vec![(MovementType::Out, 4.0), (MovementType::In, 10.0)]);

    let err = store.adjust_stock(&adjust(inv, "OUT", 10.0)).await.unwrap_err();
    match err {
        StoreError::Domain(DomainError::InvariantViolation(msg)) => {
            assert_eq!(msg, "stock cannot go below zero")
        }
        other => panic!("expected InvariantViolation, got {other:?}"),
    }

    let stored = store.get_inventory(inv).await.unwrap().unwrap();
    assert_eq!(stored.current_stock(), 6.0);
    assert_eq!(count(&store, "stock_movements").await, 2);
}

#[tokio::test]
async fn stock_matches_initial_plus_ins_minus_outs() {
    let store = store().await;
    let reg = register(&store, "Toluene", "108-88-3", 25.0).await;
    let inv = reg.inventory.id();

    let ops = [("IN", 5.0), ("OUT", 12.0), ("out", 3.0), ("in", 40.0), ("OUT", 55.0)];
    let mut expected = 25.0;
    for (dir, qty) in ops {
        let adj = store.adjust_stock(&adjust(inv, dir, qty)).await.unwrap();
        expected += if dir.eq_ignore_ascii_case("in") { qty } else { -qty };
        assert_eq!(adj.inventory.current_stock(), expected);
        assert_eq!(adj.movement.product_id(), reg.product.id());
        assert_eq!(adj.movement.quantity().get(), qty);
    }

    assert_eq!(expected, 0.0);
    assert_eq!(count(&store, "stock_movements").await, 1 + ops.len() as i64);
}

#[tokio::test]
async fn stock_in_that_would_overflow_is_rejected() {
    let store = store().await;
    let reg = register(&store, "Water", "7732-18-5", 1e308).await;
    let inv = reg.inventory.id();

    let err = store.adjust_stock(&adjust(inv, "IN", 1e308)).await.unwrap_err();
    assert!(matches!(err, StoreError::Domain(DomainError::InvariantViolation(_))));

    let stored = store.get_inventory(inv).await.unwrap().unwrap();
    assert_eq!(stored.current_stock(), 1e308);
    assert_eq!(count(&store, "stock_movements").await, 1);

    let out = store.adjust_stock(&adjust(inv, "OUT", 1e308)).await.unwrap();
    assert_eq!(out.inventory.current_stock(), 0.0);
}

#[tokio::test]
async fn adjusting_unknown_inventory_is_not_found() {
    let store = store().await;
    let err = store
        .adjust_stock(&adjust(InventoryId::new(404), "IN", 1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound("inventory record")));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn delete_product_cascades_to_inventory_and_movements() {
    let store = store().await;
    let keep = register(&store, "Water", "7732-18-5", 100.0).await;
    let gone = register(&store, "Acetone", "67-64-1", 10.0).await;
    store
        .adjust_stock(&adjust(gone.inventory.id(), "OUT", 1.0))
        .await
        .unwrap();

    let deletion = store.delete_product(gone.product.id()).await.unwrap();
    assert_eq!(deletion.product.name(), "Acetone");
    assert_eq!(deletion.movements_removed, 2);

    assert!(store.get_product(gone.product.id()).await.unwrap().is_none());
    assert!(store.get_inventory(gone.inventory.id()).await.unwrap().is_none());
    assert_eq!(count(&store, "chemical_products").await, 1);
    assert_eq!(count(&store, "inventory").await, 1);
    assert_eq!(count(&store, "stock_movements").await, 1);

    let lines = store.list_inventory().await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].record.id(), keep.inventory.id());
}

#[tokio::test]
async fn deleting_unknown_product_is_not_found() {
    let store = store().await;
    let err = store.delete_product(ProductId::new(9)).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound("product")));
}

#[tokio::test]
async fn identifier_can_be_reused_after_deletion() {
    let store = store().await;
    let first = register(&store, "Acetone", "67-64-1", 10.0).await;
    store.delete_product(first.product.id()).await.unwrap();

    let again = register(&store, "Acetone", "67-64-1", 2.0).await;
    assert_ne!(again.product.id(), first.product.id());
    assert_eq!(again.inventory.current_stock(), 2.0);
}

#[tokio::test]
async fn search_matches_name_or_identifier_case_insensitively() {
    let store = store().await;
    register(&store, "Acetone", "67-64-1", 1.0).await;
    register(&store, "Ethanol", "64-17-5", 1.0).await;
    register(&store, "Sodium chloride", "7647-14-5", 1.0).await;

    let names = |products: Vec<chemstock_products::Product>| {
        products.iter().map(|p| p.name().to_string()).collect::<Vec<_>>()
    };

    assert_eq!(names(store.list_products(None).await.unwrap()).len(), 3);
    assert_eq!(names(store.list_products(Some("   ")).await.unwrap()).len(), 3);
    assert_eq!(names(store.list_products(Some("aCeT")).await.unwrap()), vec!["Acetone"]);
    assert_eq!(names(store.list_products(Some("67-64")).await.unwrap()), vec!["Acetone"]);
    assert_eq!(
        names(store.list_products(Some("-1")).await.unwrap()),
        vec!["Acetone", "Ethanol", "Sodium chloride"]
    );
    assert!(store.list_products(Some("%")).await.unwrap().is_empty());
    assert!(store.list_products(Some("benzene")).await.unwrap().is_empty());
}

#[tokio::test]
async fn search_folds_non_ascii_case() {
    let store = store().await;
    register(&store, "Äthanol", "64-17-5", 1.0).await;
    register(&store, "α-Pinene", "80-56-8", 1.0).await;
    register(&store, "Acetone", "67-64-1", 1.0).await;

    let hits = store.list_products(Some("äTHANOL")).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name(), "Äthanol");

    let hits = store.list_products(Some("Α-PINENE")).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name(), "α-Pinene");
}

#[tokio::test]
async fn inventory_listing_carries_product_details() {
    let store = store().await;
    register(&store, "Toluene", "108-88-3", 3.5).await;
    register(&store, "Acetone", "67-64-1", 10.0).await;

    let lines = store.list_inventory().await.unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].product_name, "Acetone");
    assert_eq!(lines[0].identifier, "67-64-1");
    assert_eq!(lines[0].unit, "L");
    assert_eq!(lines[1].product_name, "Toluene");
    assert_eq!(lines[1].record.current_stock(), 3.5);
}

#[tokio::test]
async fn history_lists_newest_first_across_products() {
    let store = store().await;
    let a = register(&store, "Acetone", "67-64-1", 10.0).await;
    let b = register(&store, "Ethanol", "64-17-5", 5.0).await;
    store.adjust_stock(&adjust(a.inventory.id(), "IN", 1.0)).await.unwrap();
    store.adjust_stock(&adjust(b.inventory.id(), "OUT", 2.0)).await.unwrap();

    let history = store.list_movements().await.unwrap();
    let ids: Vec<i64> = history.iter().map(|l| l.movement.id().get()).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable_by(|x, y| y.cmp(x));
    assert_eq!(ids, sorted);

    assert_eq!(history[0].product_name, "Ethanol");
    assert_eq!(history[0].movement.movement_type(), MovementType::Out);
    assert!(history.windows(2).all(|w| w[0].movement.created_at() >= w[1].movement.created_at()));
}

mod file_database {
    use super::*;

    use std::sync::Arc;

    use tempfile::TempDir;

    /// WAL file database with a multi-connection pool. The directory must
    /// outlive the store.
    async fn file_store() -> (TempDir, InventoryStore) {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("inventory.db").display()),
            max_connections: 5,
            connect_timeout_secs: 30,
        };
        let pool = db::connect_and_migrate(&config).await.unwrap();
        (dir, InventoryStore::new(pool))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_adjustments_on_different_products_all_succeed() {
        let (_dir, store) = file_store().await;

        let mut inventory_ids = Vec::new();
        for i in 0..5 {
            let reg = register(&store, &format!("Solvent {i}"), &format!("100-00-{i}"), 10.0).await;
            inventory_ids.push(reg.inventory.id());
        }

        let mut handles = Vec::new();
        for n in 0..50 {
            let store = store.clone();
            let inv = inventory_ids[n % inventory_ids.len()];
            handles.push(tokio::spawn(async move {
                store.adjust_stock(&adjust(inv, "IN", 1.0)).await
            }));
        }

        let mut failures = Vec::new();
        for handle in handles {
            if let Err(e) = handle.await.unwrap() {
                failures.push(e.to_string());
            }
        }
        assert!(failures.is_empty(), "failed adjustments: {failures:?}");

        for inv in inventory_ids {
            let stored = store.get_inventory(inv).await.unwrap().unwrap();
            assert_eq!(stored.current_stock(), 20.0);
        }
        assert_eq!(count(&store, "stock_movements").await, 55);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_registrations_of_one_identifier_report_duplicates() {
        let (_dir, store) = file_store().await;

        for round in 0..5 {
            let identifier = format!("71-43-{round}");
            let cmd = Arc::new(RegisterProduct::new("Benzene", &identifier, "L", 1.0).unwrap());

            let mut handles = Vec::new();
            for _ in 0..6 {
                let store = store.clone();
                let cmd = Arc::clone(&cmd);
                handles.push(tokio::spawn(async move { store.register_product(&cmd).await }));
            }

            let mut created = 0;
            for handle in handles {
                match handle.await.unwrap() {
                    Ok(_) => created += 1,
                    Err(StoreError::DuplicateIdentifier(id)) => assert_eq!(id, identifier),
                    Err(other) => panic!("round {round}: expected DuplicateIdentifier, got {other}"),
                }
            }
            assert_eq!(created, 1, "round {round}");
        }

        assert_eq!(count(&store, "chemical_products").await, 5);
        assert_eq!(count(&store, "inventory").await, 5);
        assert_eq!(count(&store, "stock_movements").await, 5);
    }

    #[tokio::test]
    async fn unique_violation_on_insert_maps_to_duplicate_identifier() {
        let (_dir, store) = file_store().await;
        register(&store, "Acetone", "67-64-1", 10.0).await;

        let err = sqlx::query(
            "INSERT INTO chemical_products (name, cas_number, unit) VALUES ('x', '67-64-1', 'L')",
        )
        .execute(store.pool())
        .await
        .unwrap_err();

        match crate::store::map_insert_product_error("67-64-1", err) {
            StoreError::DuplicateIdentifier(id) => assert_eq!(id, "67-64-1"),
            other => panic!("expected DuplicateIdentifier, got {other:?}"),
        }
    }
}

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 24,
            ..ProptestConfig::default()
        })]

        /// Property: stored stock equals initial + accepted INs - accepted OUTs,
        /// and the log gains exactly one row per accepted adjustment.
        #[test]
        fn persisted_stock_is_conserved(
            initial in 1u32..200,
            ops in prop::collection::vec((any::<bool>(), 1u32..150), 0..12),
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            rt.block_on(async {
                let store = store().await;
                let reg = register(&store, "Benzene", "71-43-2", f64::from(initial)).await;
                let inv = reg.inventory.id();
                let mut expected = f64::from(initial);
                let mut accepted = 1i64;

                for (is_in, qty) in ops {
                    let dir = if is_in { "IN" } else { "OUT" };
                    match store.adjust_stock(&adjust(inv, dir, f64::from(qty))).await {
                        Ok(adj) => {
                            expected += if is_in { f64::from(qty) } else { -f64::from(qty) };
                            accepted += 1;
                            prop_assert_eq!(adj.inventory.current_stock(), expected);
                        }
                        Err(err) => {
                            prop_assert!(!is_in);
                            prop_assert!(f64::from(qty) > expected);
                            prop_assert!(err.is_client_error());
                        }
                    }
                }

                let stored = store.get_inventory(inv).await.unwrap().unwrap();
                prop_assert_eq!(stored.current_stock(), expected);
                prop_assert_eq!(count(&store, "stock_movements").await, accepted);
                Ok(())
            })?;
        }
    }
}
