//! Property-Based Tests for the Deduplication Group
//!
//! The leader's producer holds until every other caller has subscribed, so
//! each case exercises a fully overlapping burst without relying on timing.

use proptest::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::flight::{FlightError, Group};

fn multi_thread_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap()
}

/// Fires `callers` concurrent executions for one key. Returns how many
/// times the producer ran and every caller's `(result, shared)`.
fn burst(
    callers: usize,
    outcome: Result<u64, String>,
) -> (u32, Vec<(Result<u64, FlightError<String>>, bool)>) {
    let rt = multi_thread_runtime();
    rt.block_on(async move {
        let group = Arc::new(Group::<u64, String>::new());
        let runs = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::with_capacity(callers);
        for _ in 0..callers {
            let group = group.clone();
            let runs = runs.clone();
            let outcome = outcome.clone();
            handles.push(tokio::spawn(async move {
                let watcher = group.clone();
                group
                    .execute("hot", || async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        while watcher.waiters("hot") < callers - 1 {
                            tokio::task::yield_now().await;
                        }
                        outcome
                    })
                    .await
            }));
        }

        let mut results = Vec::with_capacity(callers);
        for handle in handles {
            let execution = handle.await.unwrap();
            results.push((execution.result, execution.shared));
        }
        assert_eq!(group.in_flight(), 0);
        (runs.load(Ordering::SeqCst), results)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    // Exactly one leader per burst; everyone else shares its value.
    #[test]
    fn prop_at_most_one_leader(callers in 1usize..64, value in any::<u64>()) {
        let (runs, results) = burst(callers, Ok(value));

        prop_assert_eq!(runs, 1);
        prop_assert_eq!(results.iter().filter(|(_, shared)| !shared).count(), 1);
        prop_assert_eq!(results.iter().filter(|(_, shared)| *shared).count(), callers - 1);
        for (result, _) in &results {
            prop_assert_eq!(result, &Ok(value));
        }
    }

    // A failing producer hands the identical error to every caller.
    #[test]
    fn prop_error_identity(callers in 1usize..32, message in "[a-z ]{1,24}") {
        let (runs, results) = burst(callers, Err(message.clone()));

        prop_assert_eq!(runs, 1);
        for (result, _) in &results {
            prop_assert_eq!(result, &Err(FlightError::Failed(message.clone())));
        }
    }
}
