// Concurrency tests for the pending registration store
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use chrono::TimeDelta;
use passkey_registry::registration::RegistrationError;
use passkey_registry::testing::TestFixtures;
use passkey_registry::RequestId;

const THREADS: usize = 16;

#[test]
fn test_concurrent_consume_succeeds_exactly_once() {
    for _ in 0..20 {
        let (store, _clock) = TestFixtures::store_with_clock::<String>(10);
        let id = store.begin("alice", "phone", "opts".to_string()).unwrap();
        let barrier = Arc::new(Barrier::new(THREADS));

        let results: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    let store = &store;
                    let id = &id;
                    let barrier = barrier.clone();
                    scope.spawn(move || {
                        barrier.wait();
                        store.consume(id.as_str())
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| *e == RegistrationError::UnknownRequest));
        assert_eq!(store.pending_count(), 0);
    }
}

#[test]
fn test_concurrent_begin_respects_capacity() {
    let capacity = 50;
    let (store, _clock) = TestFixtures::store_with_clock::<usize>(capacity);
    let barrier = Arc::new(Barrier::new(THREADS));

    let issued: Vec<RequestId> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let store = &store;
                let barrier = barrier.clone();
                scope.spawn(move || {
                    barrier.wait();
                    (0..10)
                        .filter_map(|i| store.begin("user", "key", t * 10 + i).ok())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    assert_eq!(issued.len(), capacity);
    assert_eq!(store.pending_count(), capacity);
    let distinct: HashSet<_> = issued.iter().collect();
    assert_eq!(distinct.len(), capacity);
    assert_eq!(
        store.metrics().capacity_rejections,
        u64::try_from(THREADS * 10 - capacity).unwrap()
    );

    // Every issued entry is still live and consumable
    for id in &issued {
        assert!(store.consume(id.as_str()).is_ok());
    }
}

#[test]
fn test_eviction_runs_alongside_consumers() {
    let (store, clock) = TestFixtures::store_with_clock::<usize>(1_000);

    let stale: Vec<RequestId> = (0..200).map(|i| store.begin("old", "k", i).unwrap()).collect();
    clock.advance(TimeDelta::seconds(120));
    let live: Vec<RequestId> = (0..200).map(|i| store.begin("new", "k", i).unwrap()).collect();

    let consumed = thread::scope(|scope| {
        let sweeper = scope.spawn(|| {
            let mut total = 0;
            for _ in 0..10 {
                total += store.evict_expired();
            }
            total
        });
        let consumer = scope.spawn(|| live.iter().filter(|id| store.consume(id.as_str()).is_ok()).count());
        assert_eq!(sweeper.join().unwrap(), 200);
        consumer.join().unwrap()
    });

    assert_eq!(consumed, 200);
    assert_eq!(store.pending_count(), 0);
    for id in &stale {
        assert_eq!(
            store.consume(id.as_str()).unwrap_err(),
            RegistrationError::UnknownRequest
        );
    }
}
