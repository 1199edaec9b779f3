//! End-to-end: four threads rendezvous at a barrier every iteration, so a
//! shared log filled under a mutex groups every thread's iteration index
//! together before any thread's next index appears.

use std::sync::{Arc, Mutex};

use rpex::Barrier;

#[test]
fn barrier_ordering() {
    const THREADS: usize = 4;
    const ITERATIONS: usize = 128;

    let barrier = Arc::new(Barrier::new(THREADS).unwrap());
    let log = Arc::new(Mutex::new(Vec::with_capacity(THREADS * ITERATIONS)));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            let log = Arc::clone(&log);
            std::thread::spawn(move || {
                for i in 0..ITERATIONS {
                    log.lock().unwrap().push(i);
                    barrier.sync().unwrap();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let log = log.lock().unwrap();
    assert_eq!(log.len(), THREADS * ITERATIONS);
    let expected: Vec<usize> = (0..ITERATIONS).flat_map(|i| std::iter::repeat(i).take(THREADS)).collect();
    assert_eq!(*log, expected);
}
