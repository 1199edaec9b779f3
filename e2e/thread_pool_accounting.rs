//! End-to-end: a fixed pool of 1 worker runs every submitted callback
//! exactly once, each future returns exactly the value its callback
//! produced, and a shared completion counter reaches 42 at the end.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use rpex::ThreadPool;

#[test]
fn thread_pool_accounting() {
    let pool = ThreadPool::fixed(1).unwrap();
    let completions = Arc::new(AtomicI64::new(0));

    let futures: Vec<_> = (1..=42i64)
        .map(|i| {
            let completions = Arc::clone(&completions);
            pool.execute(move || {
                completions.fetch_add(1, Ordering::SeqCst);
                i
            })
            .unwrap()
        })
        .collect();

    for (i, future) in (1..=42i64).zip(futures) {
        assert_eq!(future.join(), i);
    }

    assert_eq!(completions.load(Ordering::SeqCst), 42);
}
