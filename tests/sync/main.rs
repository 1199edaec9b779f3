// Integration coverage for rpex::sync — Semaphore, RwLock, Barrier — driven
// only through the public crate API (unit tests inside src/sync/*.rs cover
// the private monitor internals).

use rpex::{Barrier, Error, RwLock, Semaphore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn semaphore_enforces_backpressure_across_threads() {
    let sem = Arc::new(Semaphore::new(2).unwrap());
    let active = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let sem = Arc::clone(&sem);
            let active = Arc::clone(&active);
            let max_seen = Arc::clone(&max_seen);
            std::thread::spawn(move || {
                sem.down().unwrap();
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(10));
                active.fetch_sub(1, Ordering::SeqCst);
                sem.up().unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert!(max_seen.load(Ordering::SeqCst) <= 2);
    assert_eq!(sem.value(), 2);
}

#[test]
fn rwlock_allows_many_readers_but_serializes_writers() {
    let lock = Arc::new(RwLock::new());
    let counter = Arc::new(std::sync::Mutex::new(0i64));

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let lock = Arc::clone(&lock);
            let counter = Arc::clone(&counter);
            std::thread::spawn(move || {
                if i % 2 == 0 {
                    lock.acquire_reader().unwrap();
                    std::thread::sleep(Duration::from_millis(5));
                    lock.release_reader().unwrap();
                } else {
                    lock.acquire_writer().unwrap();
                    *counter.lock().unwrap() += 1;
                    lock.release_writer().unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(*counter.lock().unwrap(), 3);
    assert_eq!(lock.value(), 0);
}

#[test]
fn barrier_releases_all_participants_together() {
    const N: usize = 6;
    let barrier = Arc::new(Barrier::new(N).unwrap());
    let arrived = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..N)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            let arrived = Arc::clone(&arrived);
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis((rand_ish()) * 2));
                barrier.sync().unwrap();
                arrived.fetch_add(1, Ordering::SeqCst)
            })
        })
        .collect();

    let mut results: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    results.sort_unstable();
    assert_eq!(results, (0..N).collect::<Vec<_>>());
}

fn rand_ish() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .subsec_nanos() as u64
        % 5
}

#[test]
fn invalid_arguments_are_rejected_before_any_blocking() {
    assert_eq!(Semaphore::new(0).err(), Some(Error::InvalidArgument));
    assert_eq!(Barrier::new(0).err(), Some(Error::InvalidArgument));
}
