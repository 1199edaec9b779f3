//! Composition sketch: how a caller wires this crate's primitives into a
//! connection-handling service.
//!
//! This is deliberately NOT a TCP server — socket setup, the accept loop,
//! and the dispatcher thread are out of scope. Nothing here opens a
//! `std::net` socket; `accept_one_connection` is a stand-in the caller
//! would replace with a real `TcpListener::accept()`. The file exists to
//! document the contract the thread pool, queue, and fixed pool jointly
//! expose to such a server, built entirely on this crate's public API.

use std::sync::Arc;

use rpex::{BoundedQueue, FixedPool, RbTreeMap, ThreadPool};

/// Stands in for an accepted socket: whatever bytes a real server would
/// have read off the wire before handing the connection to a worker.
type Connection = Vec<u8>;

/// Request-scoped state a worker would otherwise carve out of a private
/// arena. Kept to a fixed size here so it can live in a `FixedPool` cell
/// instead.
struct RequestScratch {
    buf: [u8; 256],
}

/// Sketches the shape of a server built on this crate:
/// - a bounded queue hands accepted connections to idle workers,
/// - a thread pool supplies the workers,
/// - each worker borrows a scratch cell from a fixed pool for the
///   duration of one request,
/// - a shared sorted map (behind its own reader/writer lock) tracks some
///   cross-connection index, e.g. a session table.
pub fn run(listen_backlog: usize, worker_count: usize) -> rpex::Result<()> {
    let queue: Arc<BoundedQueue<Connection>> = Arc::new(BoundedQueue::new(listen_backlog)?);
    let scratch_pool = Arc::new(FixedPool::create(
        std::mem::size_of::<RequestScratch>(),
        worker_count,
        true,
    )?);
    let sessions = Arc::new(RbTreeMap::new());
    let pool = ThreadPool::elastic(worker_count, worker_count * 2)?;

    // The accept loop (out of scope) would run on its own thread, looping
    // `queue.enqueue(accept_one_connection())` — shown here as a single
    // call so this file stays a non-executing sketch, not a server.
    let connection = accept_one_connection();
    queue.enqueue(connection)?;

    // Each worker submission mirrors what a dispatcher thread would do
    // once per item pulled off `queue`.
    let worker_queue = Arc::clone(&queue);
    let worker_pool = Arc::clone(&scratch_pool);
    let worker_sessions = Arc::clone(&sessions);
    let future = pool.execute(move || -> rpex::Result<()> {
        let conn = worker_queue.dequeue()?;
        let cell = worker_pool.alloc().ok_or(rpex::Error::ResourceExhausted)?;
        handle_connection(&conn, &worker_sessions)?;
        worker_pool.free(cell)?;
        Ok(())
    })?;

    future.join()
}

fn accept_one_connection() -> Connection {
    Vec::new()
}

fn handle_connection(_conn: &Connection, sessions: &RbTreeMap) -> rpex::Result<()> {
    sessions.put(1, 1)?;
    Ok(())
}

#[test]
fn composition_sketch_wires_together_without_panicking() {
    run(4, 2).unwrap();
}
