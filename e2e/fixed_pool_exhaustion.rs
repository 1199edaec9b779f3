//! End-to-end: a fixed pool of 2 x 64-byte cells exhausts after two
//! allocations, and freeing one cell makes room for exactly one more.

use rpex::FixedPool;

#[test]
fn fixed_pool_exhaustion() {
    let pool = FixedPool::create(64, 2, true).unwrap();

    let a = pool.alloc().expect("first alloc should succeed");
    let b = pool.alloc().expect("second alloc should succeed");
    assert!(pool.alloc().is_none(), "third alloc should fail");

    pool.free(a).unwrap();
    let c = pool.alloc().expect("alloc after free should succeed");
    assert!(pool.alloc().is_none(), "pool should be exhausted again");

    pool.free(b).unwrap();
    pool.free(c).unwrap();
}
