//! Integration tests for the full write → notify → re-read pipeline.
//!
//! Tests: ProductStore → Repository (memory + SQLite) → ChangeBus → subscriber re-reads
//!
//! Verifies:
//! - Name uniqueness holds for every insertion path
//! - Exactly one notification per committed transaction
//! - Delete-by-position and seed idempotence behave the same on every backend

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use chrono::NaiveDate;

    use shelf_products::{Price, Product, ProductDraft, parse_start_date, seed_products};

    use crate::error::StoreError;
    use crate::repository::SqliteProductRepository;
    use crate::store::{ProductStore, StoreChange};

    fn today() -> NaiveDate {
        parse_start_date("2024-06-01").unwrap()
    }

    fn product(name: &str) -> Product {
        Product::new(name, Price::from_cents(500), 3, today()).unwrap()
    }

    fn names(store: &ProductStore) -> Vec<String> {
        store
            .list_all()
            .unwrap()
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    /// One store per backend, so every pipeline test runs against both.
    fn backends() -> Vec<(&'static str, ProductStore)> {
        vec![
            ("memory", ProductStore::in_memory()),
            (
                "sqlite",
                ProductStore::new(SqliteProductRepository::open_in_memory().unwrap()),
            ),
        ]
    }

    #[test]
    fn seed_duplicate_and_delete_scenario() {
        for (backend, store) in backends() {
            let inserted = store.seed_if_empty(seed_products(today()).unwrap()).unwrap();
            assert_eq!(inserted, 4, "{backend}");
            assert_eq!(names(&store), ["Katana", "Sais", "Nunchakus", "Bo"], "{backend}");

            // Presenter-style pre-check, then the store-level guard.
            assert_eq!(store.find_by_name("Katana").unwrap().len(), 1, "{backend}");
            let err = store.add(product("Katana")).unwrap_err();
            assert_eq!(err, StoreError::DuplicateName("Katana".into()), "{backend}");
            assert_eq!(store.len().unwrap(), 4, "{backend}");

            let removed = store.delete_at(0).unwrap();
            assert_eq!(removed.name(), "Katana", "{backend}");
            assert_eq!(store.len().unwrap(), 3, "{backend}");
            assert!(store.find_by_name("Katana").unwrap().is_empty(), "{backend}");
        }
    }

    #[test]
    fn delete_at_middle_keeps_relative_order() {
        for (backend, store) in backends() {
            store.add_all(vec![product("A"), product("B"), product("C")]).unwrap();

            store.delete_at(1).unwrap();

            assert_eq!(names(&store), ["A", "C"], "{backend}");
        }
    }

    #[test]
    fn seed_runs_only_once() {
        for (backend, store) in backends() {
            let first = store.seed_if_empty(seed_products(today()).unwrap()).unwrap();
            let before = store.len().unwrap();
            let second = store.seed_if_empty(seed_products(today()).unwrap()).unwrap();

            assert_eq!(first, 4, "{backend}");
            assert_eq!(second, 0, "{backend}");
            assert_eq!(store.len().unwrap(), before, "{backend}");
        }
    }

    #[test]
    fn failed_batch_is_invisible_and_silent() {
        for (backend, store) in backends() {
            store.add(product("Katana")).unwrap();
            let feed = store.changes();

            let err = store
                .add_all(vec![product("Tonfa"), product("Kama"), product("Katana")])
                .unwrap_err();

            assert_eq!(err, StoreError::DuplicateName("Katana".into()), "{backend}");
            assert_eq!(names(&store), ["Katana"], "{backend}");
            assert!(feed.drain().is_empty(), "{backend}");
        }
    }

    #[test]
    fn every_committed_mutation_notifies_exactly_once() {
        for (backend, store) in backends() {
            let count = Arc::new(AtomicUsize::new(0));
            let seen = count.clone();
            let _subscription = store.subscribe(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            });

            store.add(product("A")).unwrap();
            assert_eq!(count.load(Ordering::SeqCst), 1, "{backend}");

            store.add_all(vec![product("B"), product("C")]).unwrap();
            assert_eq!(count.load(Ordering::SeqCst), 2, "{backend}");

            store.delete_at(2).unwrap();
            assert_eq!(count.load(Ordering::SeqCst), 3, "{backend}");
        }
    }

    #[test]
    fn subscriber_thread_sees_committed_state() {
        for (backend, store) in backends() {
            let feed = store.changes();
            let reader = store.clone();
            let (tx, rx) = std::sync::mpsc::channel();

            let worker = std::thread::spawn(move || {
                for _ in 0..2 {
                    match feed.recv_timeout(Duration::from_secs(5)) {
                        Ok(_) => {
                            let _ = tx.send(reader.list_all().map(|l| l.len()));
                        }
                        Err(_) => break,
                    }
                }
            });

            // The worker only reads after each write has returned.
            store.add(product("A")).unwrap();
            let after_add = rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
            store.delete_at(0).unwrap();
            let after_delete = rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();

            worker.join().unwrap();
            assert_eq!((after_add, after_delete), (1, 0), "{backend}");
        }
    }

    #[test]
    fn form_input_flows_into_the_store() {
        for (backend, store) in backends() {
            let feed = store.changes();
            let draft = ProductDraft::new(" Tonfa ", "12.5", "4");

            store.add(draft.parse(today()).unwrap()).unwrap();

            let listed = store.find_by_name("Tonfa").unwrap();
            assert_eq!(listed.len(), 1, "{backend}");
            assert_eq!(
                listed[0].detail_line(),
                "$12.50, 4 stars, sold since 2024-06-01",
                "{backend}"
            );
            assert!(
                matches!(feed.try_recv(), Ok(StoreChange::Inserted { count: 1, .. })),
                "{backend}"
            );
        }
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashSet;

        #[derive(Debug, Clone)]
        enum Op {
            Add(String),
            Delete(usize),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                3 => "[A-D]{1,2}".prop_map(Op::Add),
                1 => (0usize..6).prop_map(Op::Delete),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 200,
                ..ProptestConfig::default()
            })]

            /// Property: no sequence of adds/deletes ever stores two products with one name,
            /// and each accepted mutation notifies exactly once.
            #[test]
            fn names_stay_unique(ops in proptest::collection::vec(op(), 1..40)) {
                let store = ProductStore::in_memory();
                let feed = store.changes();

                for op in ops {
                    let before = store.len().unwrap();
                    let accepted = match op {
                        Op::Add(name) => {
                            let duplicate = !store.find_by_name(&name).unwrap().is_empty();
                            let result = store.add(product(&name));
                            prop_assert_eq!(result.is_err(), duplicate);
                            result.is_ok()
                        }
                        Op::Delete(index) => {
                            let result = store.delete_at(index);
                            prop_assert_eq!(result.is_ok(), index < before);
                            result.is_ok()
                        }
                    };

                    prop_assert_eq!(feed.drain().len(), usize::from(accepted));
                    if !accepted {
                        prop_assert_eq!(store.len().unwrap(), before);
                    }

                    let listed = names(&store);
                    let distinct: HashSet<&String> = listed.iter().collect();
                    prop_assert_eq!(distinct.len(), listed.len());
                }
            }
        }
    }
}
