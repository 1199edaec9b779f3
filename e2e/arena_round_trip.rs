//! End-to-end: a 6 MiB arena fully recoalesces after two allocations are
//! freed, so a single allocation sized to (almost) the whole arena
//! succeeds afterward.

use rpex::Arena;

const MIB: usize = 1024 * 1024;
// Comfortably below the arena's true capacity so the request succeeds
// regardless of the allocator's exact per-span header overhead.
const SAFETY_MARGIN: usize = 256;

#[test]
fn arena_round_trip() {
    let arena = Arena::create(6 * MIB, true).unwrap();

    let p1 = arena.alloc(64).unwrap();
    let p2 = arena.alloc(128).unwrap();
    arena.free(p1).unwrap();
    arena.free(p2).unwrap();

    let p3 = arena.alloc(6 * MIB - SAFETY_MARGIN);
    assert!(p3.is_ok(), "arena did not fully recoalesce: {p3:?}");
    arena.free(p3.unwrap()).unwrap();
}
