// Integration coverage for rpex::mempool — FixedPool, Arena — exercised
// across threads through the public crate API.

use rpex::{Arena, Error, FixedPool};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn fixed_pool_shared_across_threads_never_double_allocates() {
    let pool = Arc::new(FixedPool::create(32, 64, true).unwrap());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pool = Arc::clone(&pool);
            std::thread::spawn(move || {
                let mut held = Vec::new();
                for _ in 0..4 {
                    if let Some(ptr) = pool.alloc() {
                        held.push(ptr);
                    }
                }
                for ptr in held {
                    pool.free(ptr).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    // Every cell was returned, so the pool should be fully allocatable again.
    let mut all = Vec::new();
    for _ in 0..64 {
        all.push(pool.alloc().expect("pool should be fully available"));
    }
    assert!(pool.alloc().is_none());
    for ptr in all {
        pool.free(ptr).unwrap();
    }
}

#[test]
fn arena_shared_across_threads_recovers_full_capacity() {
    let arena = Arc::new(Arena::create(1024 * 1024, true).unwrap());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let arena = Arc::clone(&arena);
            std::thread::spawn(move || {
                for _ in 0..50 {
                    let size = 16 + i * 8;
                    let ptr = arena.alloc(size).unwrap();
                    arena.free(ptr).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    // Every allocation was immediately freed, so the arena should have
    // recoalesced back to a single span covering (almost) its full size.
    let ptr = arena.alloc(1024 * 1024 - 256).expect("arena did not recoalesce");
    arena.free(ptr).unwrap();
}

#[test]
fn fixed_pool_unprotected_mode_is_fine_single_threaded() {
    let pool = FixedPool::create(8, 4, false).unwrap();
    let ptrs: Vec<_> = (0..4).map(|_| pool.alloc().unwrap()).collect();
    assert!(pool.alloc().is_none());
    for ptr in ptrs {
        pool.free(ptr).unwrap();
    }
}

#[test]
fn arena_alloc_zero_is_rejected() {
    let arena = Arena::create(4096, true).unwrap();
    assert_eq!(arena.alloc(0).err(), Some(Error::InvalidArgument));
}

#[test]
fn arena_tracks_total_size_across_concurrent_activity() {
    let arena = Arc::new(Arena::create(65536, true).unwrap());
    let outstanding = Arc::new(AtomicUsize::new(0));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let arena = Arc::clone(&arena);
            let outstanding = Arc::clone(&outstanding);
            std::thread::spawn(move || {
                for _ in 0..20 {
                    if let Ok(ptr) = arena.alloc(128) {
                        outstanding.fetch_add(1, Ordering::SeqCst);
                        arena.free(ptr).unwrap();
                        outstanding.fetch_sub(1, Ordering::SeqCst);
                    }
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(outstanding.load(Ordering::SeqCst), 0);
    assert_eq!(arena.size(), 65536);
}
