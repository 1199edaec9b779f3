// Integration coverage for rpex::collections — RbTreeMap, SegmentedList
// — driven through the public crate API, including from multiple threads.

use rpex::{Error, RbTreeMap, SegmentedList};
use std::sync::Arc;

#[test]
fn rbtree_put_get_delete_round_trip() {
    let map = RbTreeMap::new();
    for key in 0..500 {
        map.put(key, key * 10).unwrap();
    }
    for key in 0..500 {
        assert_eq!(map.get(key).unwrap(), Some(key * 10));
    }
    for key in (0..500).step_by(2) {
        assert!(map.delete(key).unwrap());
    }
    for key in 0..500 {
        let expected = if key % 2 == 0 { None } else { Some(key * 10) };
        assert_eq!(map.get(key).unwrap(), expected);
    }
    assert_eq!(map.len().unwrap(), 250);
}

#[test]
fn rbtree_overwriting_a_key_keeps_the_same_entry_count() {
    let map = RbTreeMap::new();
    map.put(1, 100).unwrap();
    map.put(1, 200).unwrap();
    assert_eq!(map.get(1).unwrap(), Some(200));
    assert_eq!(map.len().unwrap(), 1);
}

#[test]
fn rbtree_delete_of_absent_key_returns_false() {
    let map = RbTreeMap::new();
    map.put(1, 1).unwrap();
    assert!(!map.delete(999).unwrap());
    assert_eq!(map.len().unwrap(), 1);
}

#[test]
fn rbtree_shared_across_threads_keeps_every_insert() {
    let map = Arc::new(RbTreeMap::new());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let map = Arc::clone(&map);
            std::thread::spawn(move || {
                for i in 0..200 {
                    map.put(t * 1000 + i, i).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(map.len().unwrap(), 8 * 200);
    for t in 0..8 {
        for i in 0..200 {
            assert_eq!(map.get(t * 1000 + i).unwrap(), Some(i));
        }
    }
}

#[test]
fn rbtree_ascending_insertion_order_still_balances_correctly() {
    // A naive unbalanced BST degenerates into a linked list under sorted
    // insertion order; confirm values remain reachable and deletions work
    // across the whole range, which only holds if rebalancing kept the
    // tree shallow enough for the recursive delete-fixup to terminate.
    let map = RbTreeMap::new();
    for key in 0..2000 {
        map.put(key, key).unwrap();
    }
    for key in 0..2000 {
        assert!(map.delete(key).unwrap());
    }
    assert!(map.is_empty().unwrap());
}

#[test]
fn segmented_list_append_get_set_remove() {
    let list = SegmentedList::new();
    for i in 0..300 {
        list.append(i).unwrap();
    }
    assert_eq!(list.size().unwrap(), 300);
    assert_eq!(list.get(150).unwrap(), 150);

    list.set(150, 9999).unwrap();
    assert_eq!(list.get(150).unwrap(), 9999);

    let removed = list.remove_at(150).unwrap();
    assert_eq!(removed, 9999);
    assert_eq!(list.size().unwrap(), 299);
    assert_eq!(list.get(150).unwrap(), 151);
}

#[test]
fn segmented_list_spans_multiple_rows() {
    let list = SegmentedList::with_row_size(4, false);
    for i in 0..37 {
        list.append(i).unwrap();
    }
    let collected = list.to_array().unwrap();
    let expected: Vec<i64> = (0..37).collect();
    assert_eq!(collected, expected);
}

#[test]
fn segmented_list_index_of_finds_first_match() {
    let list = SegmentedList::new();
    for v in [3, 1, 4, 1, 5, 9] {
        list.append(v).unwrap();
    }
    assert_eq!(list.index_of(1).unwrap(), Some(1));
    assert_eq!(list.index_of(2).unwrap(), None);
}

#[test]
fn segmented_list_out_of_bounds_access_is_rejected() {
    let list = SegmentedList::new();
    list.append(1).unwrap();
    assert_eq!(list.get(5).err(), Some(Error::InvalidArgument));
    assert_eq!(list.remove_at(5).err(), Some(Error::InvalidArgument));
}

#[test]
fn segmented_list_clear_resets_size_but_keeps_it_usable() {
    let list = SegmentedList::new();
    for i in 0..10 {
        list.append(i).unwrap();
    }
    list.clear().unwrap();
    assert_eq!(list.size().unwrap(), 0);
    list.append(42).unwrap();
    assert_eq!(list.get(0).unwrap(), 42);
}

#[test]
fn segmented_list_shared_across_threads_appends_every_value() {
    let list = Arc::new(SegmentedList::with_row_size(8, true));
    let handles: Vec<_> = (0..6)
        .map(|_| {
            let list = Arc::clone(&list);
            std::thread::spawn(move || {
                for i in 0..100 {
                    list.append(i).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(list.size().unwrap(), 6 * 100);
}
