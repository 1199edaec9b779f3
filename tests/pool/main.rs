// Integration coverage for rpex::pool — ThreadPool, Future — driven
// through the public crate API with real OS threads.

use rpex::{Error, ThreadPool};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn fixed_pool_runs_every_submission_exactly_once() {
    let pool = ThreadPool::fixed(4).unwrap();
    let completed = Arc::new(AtomicUsize::new(0));

    let futures: Vec<_> = (0..100)
        .map(|i| {
            let completed = Arc::clone(&completed);
            pool.execute(move || {
                completed.fetch_add(1, Ordering::SeqCst);
                i * 2
            })
            .unwrap()
        })
        .collect();

    for (i, f) in futures.into_iter().enumerate() {
        assert_eq!(f.join(), i * 2);
    }
    assert_eq!(completed.load(Ordering::SeqCst), 100);
}

#[test]
fn elastic_pool_grows_to_max_under_concurrent_load() {
    let pool = ThreadPool::elastic(1, 6).unwrap();
    let barrier = Arc::new(std::sync::Barrier::new(6));

    let futures: Vec<_> = (0..6)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            pool.execute(move || {
                barrier.wait();
            })
            .unwrap()
        })
        .collect();

    for f in futures {
        f.join();
    }
    assert_eq!(pool.live_workers(), 6);
}

#[test]
fn fixed_pool_rejects_zero_workers() {
    assert_eq!(ThreadPool::fixed(0).err(), Some(Error::InvalidArgument));
    assert_eq!(ThreadPool::elastic(0, 4).err(), Some(Error::InvalidArgument));
    assert_eq!(ThreadPool::elastic(4, 2).err(), Some(Error::InvalidArgument));
}

#[test]
fn future_join_returns_value_produced_on_a_different_thread() {
    let pool = ThreadPool::fixed(2).unwrap();
    let future = pool.execute(|| {
        std::thread::sleep(std::time::Duration::from_millis(10));
        "done"
    })
    .unwrap();
    assert_eq!(future.join(), "done");
}

#[test]
fn drop_waits_for_in_flight_work_before_returning() {
    let pool = ThreadPool::fixed(2).unwrap();
    let ran = Arc::new(AtomicUsize::new(0));
    for _ in 0..4 {
        let ran = Arc::clone(&ran);
        let future = pool
            .execute(move || {
                std::thread::sleep(std::time::Duration::from_millis(5));
                ran.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        future.join();
    }
    drop(pool);
    assert_eq!(ran.load(Ordering::SeqCst), 4);
}
