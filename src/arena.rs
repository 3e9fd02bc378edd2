//! Slot storage for skiplist nodes.
//!
//! Nodes never own one another. Every node lives in a slot of the arena owned
//! by the list, and links between nodes are [`Handle`]s. Removing a node
//! returns its slot to a free list, so a stale handle can only ever observe an
//! empty slot (which panics) and never freed memory.

pub(crate) mod handle;

use std::collections::TryReserveError;

use thiserror::Error;

pub(crate) use self::handle::Handle;

/// Errors that can occur when storing a new node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AllocError {
    /// The allocator could not provide the requested memory.
    #[error("failed to reserve memory: {0}")]
    Reserve(#[from] TryReserveError),
    /// Every addressable slot is in use.
    #[error("arena is at maximum capacity ({max} nodes).")]
    Capacity {
        /// The maximum number of nodes.
        max: usize,
    },
}

#[derive(Debug)]
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<Handle>,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len().saturating_sub(self.free.len())
    }

    /// Stores `element`, reusing a free slot when there is one.
    ///
    /// On failure the arena is left unchanged and `element` is dropped.
    pub(crate) fn alloc(&mut self, element: T) -> Result<Handle, AllocError> {
        if let Some(handle) = self.free.pop() {
            self.slots[handle.to_index()] = Some(element);
            return Ok(handle);
        }
        let handle = Handle::from_index(self.slots.len())
            .ok_or(AllocError::Capacity { max: Handle::MAX })?;
        // The free list must be able to hold every slot, so that `take` never
        // needs to allocate.
        self.free.try_reserve(self.slots.len() + 1 - self.free.len())?;
        self.slots.try_reserve(1)?;
        self.slots.push(Some(element));
        Ok(handle)
    }

    #[inline]
    #[expect(clippy::expect_used, reason = "a dangling handle is a logic error")]
    pub(crate) fn get(&self, handle: Handle) -> &T {
        self.slots[handle.to_index()]
            .as_ref()
            .expect("`Arena::get()` - `handle` is invalid!")
    }

    #[inline]
    #[expect(clippy::expect_used, reason = "a dangling handle is a logic error")]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> &mut T {
        self.slots[handle.to_index()]
            .as_mut()
            .expect("`Arena::get_mut()` - `handle` is invalid!")
    }

    /// Removes the element at `handle`, recycling its slot.
    #[expect(clippy::expect_used, reason = "a dangling handle is a logic error")]
    pub(crate) fn take(&mut self, handle: Handle) -> T {
        let element = self.slots[handle.to_index()]
            .take()
            .expect("`Arena::take()` - `handle` is invalid!");
        self.free.push(handle);
        element
    }

    /// Drops every element stored after the first `len` slots.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.slots.truncate(len);
        self.free.retain(|handle| handle.to_index() < len);
    }
}
