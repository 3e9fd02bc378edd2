//! A skiplist is a way of storing elements in such a way that elements can be
//! efficiently accessed, inserted and removed, all in `O(log(n))` on average.
//!
//! Conceptually, a skiplist resembles something like:
//!
//! ```text
//! <head> ----------> [2] --------------------------------------------------> [9] ---------->
//! <head> ----------> [2] ------------------------------------[7] ----------> [9] ---------->
//! <head> ----------> [2] ----------> [4] ------------------> [7] ----------> [9] --> [10] ->
//! <head> --> [1] --> [2] --> [3] --> [4] --> [5] --> [6] --> [7] --> [8] --> [9] --> [10] ->
//! ```
//!
//! where each node `[x]` has references to nodes further down the list,
//! allowing the algorithm to effectively skip ahead.
//!
//! The [`RankedSkipList`] in this crate additionally records, for every link,
//! how many bottom-level positions it skips. In the picture above the link
//! from `[4]` to `[7]` on level 1 has length 3. Summing link lengths
//! during a descent gives the rank of the node reached, so the `$k$`-th
//! smallest entry is found with the same expected `$O(\log n)$` work as a
//! lookup by key.
//!
//! ```
//! use ranked_skiplist::RankedSkipList;
//!
//! let mut list = RankedSkipList::new(16, 1)?;
//! for key in [30, 10, 20] {
//!     list.insert(key, key * key)?;
//! }
//!
//! assert_eq!(list.get(&20), Some(&400));
//! assert_eq!(list.get_index(0)?, (&10, &100));
//!
//! assert_eq!(list.remove(&10)?, 100);
//! assert_eq!(list.get_index(0)?, (&20, &400));
//! assert_eq!(list.len(), 2);
//! # Ok::<(), ranked_skiplist::SkipListError>(())
//! ```
//!
//! The height of each node is drawn by a [`LevelGenerator`]. The default,
//! [`RandomBits`], is configured with the number of levels and the width of
//! the random sample that decides each promotion.

mod arena;
pub mod level_generator;
mod ranked_skiplist;
mod skipnode;

pub use arena::AllocError;
pub use level_generator::{BitsError, LevelGenerator, RandomBits};
pub use ranked_skiplist::{RankedSkipList, SkipListError};
