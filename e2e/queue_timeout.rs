//! End-to-end: a full depth-3 queue times out on a timed enqueue, and a
//! drained queue times out on a fourth timed dequeue after its three
//! items are consumed.

use std::time::Instant;

use rpex::{BoundedQueue, Error};

#[test]
fn queue_timeout() {
    let q = BoundedQueue::new(3).unwrap();
    q.enqueue(1).unwrap();
    q.enqueue(2).unwrap();
    q.enqueue(3).unwrap();

    let start = Instant::now();
    assert_eq!(q.timed_enqueue(4, 1000).err(), Some(Error::Timeout));
    let elapsed = start.elapsed().as_millis();
    assert!(elapsed >= 950, "timed out too early: {elapsed}ms");
    assert!(elapsed < 2000, "timed out too late: {elapsed}ms");

    assert_eq!(q.timed_dequeue(500).unwrap(), 1);
    assert_eq!(q.timed_dequeue(500).unwrap(), 2);
    assert_eq!(q.timed_dequeue(500).unwrap(), 3);
    assert_eq!(q.timed_dequeue(200).err(), Some(Error::Timeout));
}
