//! End-to-end: a depth-3 bounded queue preserves FIFO order across an
//! interleaved sequence of enqueues and dequeues that never fills past
//! capacity.

use rpex::BoundedQueue;

#[test]
fn queue_fifo() {
    let q = BoundedQueue::new(3).unwrap();

    q.enqueue(1).unwrap();
    q.enqueue(2).unwrap();
    q.enqueue(3).unwrap();

    assert_eq!(q.dequeue().unwrap(), 1);
    assert_eq!(q.dequeue().unwrap(), 2);

    q.enqueue(4).unwrap();
    q.enqueue(5).unwrap();

    assert_eq!(q.dequeue().unwrap(), 3);
    assert_eq!(q.dequeue().unwrap(), 4);
    assert_eq!(q.dequeue().unwrap(), 5);
}
