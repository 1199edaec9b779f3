// Integration coverage for rpex::queue — BoundedQueue — driven by real
// producer/consumer threads through the public crate API.

use rpex::{BoundedQueue, Error};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[test]
fn multi_producer_multi_consumer_preserves_total_item_count() {
    let q = Arc::new(BoundedQueue::new(8).unwrap());
    const PER_PRODUCER: i32 = 200;

    let producers: Vec<_> = (0..4)
        .map(|p| {
            let q = Arc::clone(&q);
            std::thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    q.enqueue(p * PER_PRODUCER + i).unwrap();
                }
            })
        })
        .collect();

    let consumer_q = Arc::clone(&q);
    let consumer = std::thread::spawn(move || {
        let mut items = Vec::new();
        for _ in 0..4 * PER_PRODUCER {
            items.push(consumer_q.dequeue().unwrap());
        }
        items
    });

    for p in producers {
        p.join().unwrap();
    }
    let mut items = consumer.join().unwrap();
    items.sort_unstable();
    let expected: Vec<i32> = (0..4 * PER_PRODUCER).collect();
    assert_eq!(items, expected);
}

#[test]
fn timed_enqueue_succeeds_once_a_slot_frees_within_deadline() {
    let q = Arc::new(BoundedQueue::new(1).unwrap());
    q.enqueue(1).unwrap();

    let dequeue_q = Arc::clone(&q);
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(40));
        dequeue_q.dequeue().unwrap()
    });

    let start = Instant::now();
    q.timed_enqueue(2, 500).unwrap();
    assert!(start.elapsed() < Duration::from_millis(500));
    assert_eq!(handle.join().unwrap(), 1);
    assert_eq!(q.dequeue().unwrap(), 2);
}

#[test]
fn zero_capacity_is_rejected_before_any_semaphore_is_built() {
    assert_eq!(
        BoundedQueue::<()>::new(0).err(),
        Some(Error::InvalidArgument)
    );
}

#[test]
fn dropped_values_run_their_destructors_on_the_draining_side() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    struct DropCounter<'a>(&'a AtomicUsize);
    impl Drop for DropCounter<'_> {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let counter = AtomicUsize::new(0);
    {
        let q = BoundedQueue::new(4).unwrap();
        q.enqueue(DropCounter(&counter)).unwrap();
        q.enqueue(DropCounter(&counter)).unwrap();
        let a = q.dequeue().unwrap();
        drop(a);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}
