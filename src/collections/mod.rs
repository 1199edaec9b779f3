//! Sorted map and segmented list, built on [`crate::sync::RwLock`].

mod rbtree;
mod segmented_list;

pub use rbtree::RbTreeMap;
pub use segmented_list::{SegmentedList, DEFAULT_ROW_SIZE};
