//! An ordered skiplist map with rank-based lookup.

use std::{borrow::Borrow, fmt, iter, mem};

use thiserror::Error;

use crate::{
    arena::{AllocError, Arena, Handle},
    level_generator::{BitsError, LevelGenerator, RandomBits},
    skipnode::SkipNode,
};

// ////////////////////////////////////////////////////////////////////////////
// Errors
// ////////////////////////////////////////////////////////////////////////////

/// Errors returned by [`RankedSkipList`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SkipListError {
    /// No entry has the requested key.
    #[error("key not found.")]
    NotFound,
    /// The requested rank is not below the length of the list.
    #[error("rank {rank} is out of range for a list of length {len}.")]
    OutOfRange {
        /// The requested 0-based rank.
        rank: usize,
        /// The length of the list at the time of the request.
        len: usize,
    },
    /// The level generator reported zero levels.
    #[error("the level generator must provide at least one level.")]
    ZeroLevels,
    /// The level generator configuration was rejected.
    #[error(transparent)]
    Config(#[from] BitsError),
    /// Storage for a node or for a traversal could not be obtained.
    #[error(transparent)]
    Alloc(#[from] AllocError),
}

// ////////////////////////////////////////////////////////////////////////////
// RankedSkipList
// ////////////////////////////////////////////////////////////////////////////

/// An ordered map which, in addition to lookup by key, provides lookup by
/// rank (the 0-based position of an entry in key order).
///
/// Every link in the list records how many entries it skips over, so the
/// `$k$`-th smallest entry is reached in expected `$O(\log n)$` hops instead
/// of a scan of the bottom level.
///
/// Keys may repeat. Entries with equal keys are kept next to one another, in
/// an unspecified order; [`get`][Self::get] returns one of the matching values
/// and [`remove`][Self::remove] removes the first matching entry in key
/// order.
///
/// The list is not synchronized. Mutating operations take `&mut self`, so
/// sharing a list across threads requires an external lock.
pub struct RankedSkipList<K, V, G = RandomBits> {
    // Storage for the head and every entry node.
    nodes: Arena<SkipNode<K, V>>,
    // The head node, always the first slot of `nodes`.
    head: Handle,
    len: usize,
    level_generator: G,
}

// ///////////////////////////////////////////////
// Inherent methods
// ///////////////////////////////////////////////

impl<K, V> RankedSkipList<K, V> {
    /// Create a new skiplist with `max_level` levels, promoting a new node to
    /// the next level whenever a `bits`-wide random sample is nonzero.
    ///
    /// With `bits = 1` each level holds about half the nodes of the level
    /// below; larger values make the list taller and sparser.
    ///
    /// # Errors
    ///
    /// Returns [`SkipListError::Config`] if `max_level` is zero or `bits` is
    /// not within `[1, 64]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_skiplist::RankedSkipList;
    ///
    /// let list: RankedSkipList<i32, String> = RankedSkipList::new(16, 1)?;
    /// assert!(list.is_empty());
    /// assert_eq!(list.max_level(), 16);
    ///
    /// assert!(RankedSkipList::<i32, String>::new(0, 1).is_err());
    /// assert!(RankedSkipList::<i32, String>::new(16, 0).is_err());
    /// # Ok::<(), ranked_skiplist::SkipListError>(())
    /// ```
    #[inline]
    pub fn new(max_level: usize, bits: u32) -> Result<Self, SkipListError> {
        Self::with_level_generator(RandomBits::new(max_level, bits)?)
    }

    /// Same as [`new`][Self::new], but the levels assigned to nodes are fully
    /// determined by `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`SkipListError::Config`] if `max_level` is zero or `bits` is
    /// not within `[1, 64]`.
    #[inline]
    pub fn with_seed(max_level: usize, bits: u32, seed: u64) -> Result<Self, SkipListError> {
        Self::with_level_generator(RandomBits::with_seed(max_level, bits, seed)?)
    }
}

impl<K, V, G> RankedSkipList<K, V, G>
where
    G: LevelGenerator,
{
    /// Create a new skiplist using a custom level generator. The list has
    /// `level_generator.total()` levels.
    ///
    /// # Errors
    ///
    /// Returns [`SkipListError::ZeroLevels`] if the generator has no levels,
    /// or [`SkipListError::Alloc`] if the head node cannot be allocated.
    #[inline]
    pub fn with_level_generator(level_generator: G) -> Result<Self, SkipListError> {
        let total = level_generator.total();
        if total == 0 {
            return Err(SkipListError::ZeroLevels);
        }
        let mut nodes = Arena::new();
        let head = nodes.alloc(SkipNode::head(total)?)?;
        tracing::debug!(max_level = total, "created skiplist");
        Ok(RankedSkipList {
            nodes,
            head,
            len: 0,
            level_generator,
        })
    }
}

impl<K, V, G> RankedSkipList<K, V, G> {
    /// Returns the number of entries in the skiplist.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_skiplist::RankedSkipList;
    ///
    /// let mut list = RankedSkipList::new(8, 1)?;
    /// for i in 0..10 {
    ///     list.insert(i, ())?;
    /// }
    /// assert_eq!(list.len(), 10);
    /// # Ok::<(), ranked_skiplist::SkipListError>(())
    /// ```
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the skiplist contains no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of levels of the skiplist, fixed at construction.
    #[inline]
    #[must_use]
    pub fn max_level(&self) -> usize {
        self.nodes.get(self.head).level + 1
    }

    /// Removes every entry. The level generator keeps its state.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_skiplist::RankedSkipList;
    ///
    /// let mut list = RankedSkipList::new(8, 1)?;
    /// list.insert(1, "one")?;
    /// list.clear();
    /// assert!(list.is_empty());
    /// assert_eq!(list.get(&1), None);
    /// # Ok::<(), ranked_skiplist::SkipListError>(())
    /// ```
    pub fn clear(&mut self) {
        self.nodes.truncate(self.head.to_index() + 1);
        self.nodes.get_mut(self.head).unlink_all();
        self.len = 0;
        tracing::debug!("cleared skiplist");
    }

    /// Returns the level of every node, in key order.
    ///
    /// The distribution of levels is determined by the level generator; this
    /// is mostly useful to inspect it.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_skiplist::RankedSkipList;
    ///
    /// let mut list = RankedSkipList::new(4, 1)?;
    /// list.extend_from([(2, ()), (1, ()), (3, ())])?;
    /// let levels = list.node_levels();
    /// assert_eq!(levels.len(), 3);
    /// assert!(levels.iter().all(|&level| level < 4));
    /// # Ok::<(), ranked_skiplist::SkipListError>(())
    /// ```
    #[must_use]
    pub fn node_levels(&self) -> Vec<usize> {
        self.walk().map(|node| node.level).collect()
    }

    /// Renders every level of the skiplist, top level first.
    ///
    /// Each line lists the nodes of one level, starting with the head, along
    /// with the length of the link leaving each node:
    ///
    /// ```text
    /// 1: head(2) 20(1)
    /// 0: head(1) 10(1) 20(1) 30(0)
    /// ```
    #[must_use]
    pub fn debug_structure(&self) -> String
    where
        K: fmt::Debug,
    {
        let head = self.nodes.get(self.head);
        (0..=head.level)
            .rev()
            .map(|level| {
                let mut row = vec![
                    format!("{level}:"),
                    format!("head({})", head.links_len[level]),
                ];
                let mut next = head.links[level];
                while let Some(handle) = next {
                    let node = self.nodes.get(handle);
                    if let Some(key) = node.key() {
                        row.push(format!("{key:?}({})", node.links_len[level]));
                    }
                    next = node.links[level];
                }
                row.join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Walks the bottom level, in key order, skipping the head.
    fn walk(&self) -> impl Iterator<Item = &SkipNode<K, V>> {
        iter::successors(self.nodes.get(self.head).links[0], |&handle| {
            self.nodes.get(handle).links[0]
        })
        .map(|handle| self.nodes.get(handle))
    }
}

impl<K, V, G> RankedSkipList<K, V, G>
where
    K: Ord,
    G: LevelGenerator,
{
    /// Insert the entry into the skiplist.
    ///
    /// The entry is always added, even if an entry with an equal key is
    /// already present.
    ///
    /// # Errors
    ///
    /// Returns [`SkipListError::Alloc`] if memory for the new node cannot be
    /// obtained; the list is left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_skiplist::RankedSkipList;
    ///
    /// let mut list = RankedSkipList::new(8, 1)?;
    /// list.insert(5, 'b')?;
    /// list.insert(1, 'a')?;
    /// assert_eq!(list.get_index(0)?, (&1, &'a'));
    /// assert_eq!(list.get_index(1)?, (&5, &'b'));
    /// # Ok::<(), ranked_skiplist::SkipListError>(())
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Result<(), SkipListError> {
        let total = self.max_level();
        let level = self.level_generator.level().min(total - 1);

        let mut travelled = scratch(total, 0)?;
        let update = self.find_predecessors(&key, Some(travelled.as_mut_slice()))?;
        let new_node = self.nodes.alloc(SkipNode::new(key, value, level)?)?;

        // Rank distance from `update[i]` to the new node.
        let mut distance = 0;
        for (i, &prev) in update.iter().enumerate().take(level + 1) {
            distance += if i == 0 { 1 } else { travelled[i - 1] };
            let prev_node = self.nodes.get_mut(prev);
            let next = prev_node.links[i].replace(new_node);
            let prev_len = mem::replace(&mut prev_node.links_len[i], distance);

            let node = self.nodes.get_mut(new_node);
            node.links[i] = next;
            node.links_len[i] = (prev_len + 1).saturating_sub(distance);
        }
        // Links passing over the new node now span one more entry.
        for (i, &prev) in update.iter().enumerate().skip(level + 1) {
            self.nodes.get_mut(prev).links_len[i] += 1;
        }

        self.len += 1;
        debug_assert_eq!(self.nodes.len(), self.len + 1);
        tracing::trace!(level, len = self.len, "inserted node");
        Ok(())
    }

    /// Extends the skiplist with the entries of an iterator.
    ///
    /// # Errors
    ///
    /// Stops at, and returns, the first error from [`insert`][Self::insert].
    /// Entries inserted before the failure remain in the list.
    pub fn extend_from<I>(&mut self, entries: I) -> Result<(), SkipListError>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        entries
            .into_iter()
            .try_for_each(|(key, value)| self.insert(key, value))
    }

    /// Removes the first entry with the given key, returning its value.
    ///
    /// # Errors
    ///
    /// Returns [`SkipListError::NotFound`] if there is no such entry; the list
    /// is left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_skiplist::{RankedSkipList, SkipListError};
    ///
    /// let mut list = RankedSkipList::new(8, 1)?;
    /// list.insert(1, "one")?;
    /// assert_eq!(list.remove(&1), Ok("one"));
    /// assert_eq!(list.remove(&1), Err(SkipListError::NotFound));
    /// # Ok::<(), ranked_skiplist::SkipListError>(())
    /// ```
    pub fn remove<Q>(&mut self, key: &Q) -> Result<V, SkipListError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let update = self.find_predecessors(key, None)?;
        let target = match self.nodes.get(update[0]).links[0] {
            Some(next) if self.nodes.get(next).key().is_some_and(|k| k.borrow() == key) => next,
            _ => return Err(SkipListError::NotFound),
        };

        let removed = self.nodes.take(target);
        for (level, &prev) in update.iter().enumerate() {
            let prev_node = self.nodes.get_mut(prev);
            if level <= removed.level {
                prev_node.links[level] = removed.links[level];
                prev_node.links_len[level] += removed.links_len[level];
            }
            prev_node.links_len[level] -= 1;
        }

        self.len -= 1;
        debug_assert_eq!(self.nodes.len(), self.len + 1);
        tracing::trace!(level = removed.level, len = self.len, "removed node");
        match removed.entry {
            Some((_, value)) => Ok(value),
            None => unreachable!("the head node is never unlinked"),
        }
    }

    /// Returns a reference to a value with the given key, or `None` if there
    /// is no such entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_skiplist::RankedSkipList;
    ///
    /// let mut list = RankedSkipList::new(8, 1)?;
    /// list.insert(String::from("a"), 1)?;
    /// assert_eq!(list.get("a"), Some(&1));
    /// assert_eq!(list.get("b"), None);
    /// # Ok::<(), ranked_skiplist::SkipListError>(())
    /// ```
    #[inline]
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let handle = self.find_key(key)?;
        self.nodes.get(handle).value()
    }

    /// Returns a mutable reference to a value with the given key, or `None` if
    /// there is no such entry.
    #[inline]
    #[must_use]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let handle = self.find_key(key)?;
        self.nodes.get_mut(handle).value_mut()
    }

    /// Returns `true` if an entry with the given key is present.
    #[inline]
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_key(key).is_some()
    }

    /// Returns the entry at the given 0-based rank in key order.
    ///
    /// # Errors
    ///
    /// Returns [`SkipListError::OutOfRange`] if `rank >= self.len()`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ranked_skiplist::{RankedSkipList, SkipListError};
    ///
    /// let mut list = RankedSkipList::new(8, 1)?;
    /// list.extend_from((0..10).rev().map(|i| (i, i * i)))?;
    /// assert_eq!(list.get_index(3)?, (&3, &9));
    /// assert_eq!(
    ///     list.get_index(10),
    ///     Err(SkipListError::OutOfRange { rank: 10, len: 10 })
    /// );
    /// # Ok::<(), ranked_skiplist::SkipListError>(())
    /// ```
    #[inline]
    pub fn get_index(&self, rank: usize) -> Result<(&K, &V), SkipListError> {
        let out_of_range = || SkipListError::OutOfRange {
            rank,
            len: self.len,
        };
        let target = rank.checked_add(1).ok_or_else(out_of_range)?;

        let mut current = self.head;
        let mut reached = 0;
        for level in (0..self.max_level()).rev() {
            let (node, distance) = self.advance_at_level(current, level, target - reached);
            current = node;
            reached += distance;
            if reached == target {
                return self.nodes.get(current).item().ok_or_else(out_of_range);
            }
        }
        Err(out_of_range())
    }
}

// ///////////////////////////////////////////////
// Internal methods
// ///////////////////////////////////////////////

impl<K, V, G> RankedSkipList<K, V, G> {
    /// Runs the shared top-down descent towards `key`.
    ///
    /// Returns, for every level, the last node whose key is less than `key`.
    /// If `travelled` is given, it receives the number of bottom-level
    /// positions advanced while scanning each level.
    fn find_predecessors<Q>(
        &self,
        key: &Q,
        mut travelled: Option<&mut [usize]>,
    ) -> Result<Vec<Handle>, SkipListError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let total = self.max_level();
        let mut update = scratch(total, self.head)?;
        let mut current = self.head;
        for level in (0..total).rev() {
            let (node, distance) =
                self.advance_while_at_level(current, level, |_, next| precedes(next, key));
            current = node;
            update[level] = node;
            if let Some(travelled) = travelled.as_deref_mut() {
                travelled[level] = distance;
            }
        }
        Ok(update)
    }

    /// Find the node with the given key, stopping at the highest level where
    /// it appears.
    fn find_key<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.head;
        for level in (0..self.max_level()).rev() {
            let (node, _) =
                self.advance_while_at_level(current, level, |_, next| precedes(next, key));
            current = node;
            let found = self.nodes.get(current).links[level].filter(|&next| {
                self.nodes
                    .get(next)
                    .key()
                    .is_some_and(|k| k.borrow() == key)
            });
            if found.is_some() {
                return found;
            }
        }
        None
    }

    /// Try to move for the given distance, only using links at the specified
    /// level. If it's impossible, then move as far as possible.
    ///
    /// Returns the new node and the distance travelled.
    fn advance_at_level(
        &self,
        start: Handle,
        level: usize,
        mut max_distance: usize,
    ) -> (Handle, usize) {
        self.advance_while_at_level(start, level, move |current, _| {
            let travelled = current.links_len[level];
            if travelled <= max_distance {
                max_distance -= travelled;
                true
            } else {
                false
            }
        })
    }

    /// Keep moving at the specified level as long as pred is true.
    /// pred takes reference to current node and next node.
    fn advance_while_at_level(
        &self,
        start: Handle,
        level: usize,
        mut pred: impl FnMut(&SkipNode<K, V>, &SkipNode<K, V>) -> bool,
    ) -> (Handle, usize) {
        let mut current = start;
        let mut travelled = 0;
        loop {
            match self.next_if_at_level(current, level, &mut pred) {
                Ok((node, steps)) => {
                    current = node;
                    travelled += steps;
                }
                Err(node) => return (node, travelled),
            }
        }
    }

    /// Move to the next node at given level if the given predicate is true.
    /// The predicate takes reference to the current node and the next node.
    fn next_if_at_level(
        &self,
        current: Handle,
        level: usize,
        predicate: impl FnOnce(&SkipNode<K, V>, &SkipNode<K, V>) -> bool,
    ) -> Result<(Handle, usize), Handle> {
        let node = self.nodes.get(current);
        match node.links[level] {
            Some(next) if predicate(node, self.nodes.get(next)) => {
                Ok((next, node.links_len[level]))
            }
            _ => Err(current),
        }
    }
}

/// Whether `node` holds a key strictly less than `key`.
fn precedes<K, V, Q>(node: &SkipNode<K, V>, key: &Q) -> bool
where
    K: Borrow<Q>,
    Q: Ord + ?Sized,
{
    node.key().is_some_and(|k| k.borrow() < key)
}

/// Allocates a per-call buffer with one slot per level.
fn scratch<T: Clone>(levels: usize, fill: T) -> Result<Vec<T>, AllocError> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(levels)?;
    buffer.resize(levels, fill);
    Ok(buffer)
}

// ///////////////////////////////////////////////
// Trait implementation
// ///////////////////////////////////////////////

impl<K, V, G> fmt::Debug for RankedSkipList<K, V, G>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.walk().filter_map(SkipNode::item))
            .finish()
    }
}
