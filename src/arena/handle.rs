//! Handles into the node arena.

use core::num::NonZero;

/// An index into an [`Arena`][super::Arena].
///
/// The handle stores `index + 1` so that `Option<Handle>` is the same size as
/// the handle itself; node links are `Option<Handle>` and this keeps them at
/// four bytes each.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub(crate) struct Handle(NonZero<u32>);

impl Handle {
    /// The largest index a handle can address.
    pub(crate) const MAX: usize = (u32::MAX - 1) as usize;

    /// Creates a handle for the slot at `index`, or `None` if the index cannot
    /// be addressed.
    #[inline]
    pub(crate) fn from_index(index: usize) -> Option<Self> {
        let raw = u32::try_from(index).ok()?.checked_add(1)?;
        NonZero::new(raw).map(Self)
    }

    /// The slot index this handle refers to.
    #[inline]
    #[expect(clippy::as_conversions, reason = "u32 always fits in usize")]
    pub(crate) const fn to_index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

#[cfg(test)]
mod tests {
    use core::mem::size_of;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::Handle;

    #[test]
    fn niche() {
        assert_eq!(size_of::<Handle>(), size_of::<Option<Handle>>());
        assert_eq!(size_of::<Handle>(), size_of::<u32>());
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(1234)]
    #[case(Handle::MAX)]
    fn round_trip(#[case] index: usize) {
        let handle = Handle::from_index(index);
        assert_eq!(handle.map(Handle::to_index), Some(index));
    }

    #[test]
    fn too_large() {
        assert_eq!(Handle::from_index(Handle::MAX + 1), None);
        assert_eq!(Handle::from_index(usize::MAX), None);
    }
}
