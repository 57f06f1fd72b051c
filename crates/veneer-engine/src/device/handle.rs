use std::collections::HashMap;
use std::fmt;

use super::ObjectKind;

/// Opaque identifier for a driver-side object.
///
/// `GraphicsHandle::NONE` (zero) means "not allocated". When passed to a bind
/// call it selects the default binding (for framebuffers: the on-screen one).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct GraphicsHandle(u32);

impl GraphicsHandle {
    pub const NONE: Self = Self(0);

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_allocated(self) -> bool {
        self.0 != 0
    }

    /// Returns the handle and resets `slot` to `NONE`.
    ///
    /// Owners call this right before deleting the object so the slot is never
    /// observed holding a handle to a destroyed object.
    #[inline]
    pub fn take(slot: &mut Self) -> Self {
        std::mem::take(slot)
    }
}

impl fmt::Display for GraphicsHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle-keyed storage for one kind of driver object.
///
/// Handles are issued from a per-table counter starting at 1 and are never
/// reused while the table lives, so a stale handle can never alias a newer
/// object.
#[derive(Debug)]
pub(crate) struct HandleTable<T> {
    next: u32,
    entries: HashMap<GraphicsHandle, T>,
}

impl<T> HandleTable<T> {
    pub(crate) fn new() -> Self {
        Self {
            next: 0,
            entries: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, value: T) -> GraphicsHandle {
        self.next = self.next.checked_add(1).unwrap_or(1);
        let handle = GraphicsHandle(self.next);
        self.entries.insert(handle, value);
        handle
    }

    #[inline]
    pub(crate) fn get(&self, handle: GraphicsHandle) -> Option<&T> {
        self.entries.get(&handle)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: GraphicsHandle) -> Option<&mut T> {
        self.entries.get_mut(&handle)
    }

    #[inline]
    pub(crate) fn contains(&self, handle: GraphicsHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    /// Removes an object on behalf of a `delete_*` call.
    ///
    /// `NONE` is a silent no-op; an unknown handle is logged and ignored.
    pub(crate) fn release(&mut self, kind: ObjectKind, handle: GraphicsHandle) -> Option<T> {
        if !handle.is_allocated() {
            return None;
        }
        let removed = self.entries.remove(&handle);
        if removed.is_none() {
            log::warn!("delete of unknown {kind} {handle} ignored");
        }
        removed
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_not_allocated() {
        assert!(!GraphicsHandle::NONE.is_allocated());
        assert_eq!(GraphicsHandle::default(), GraphicsHandle::NONE);
    }

    #[test]
    fn take_zeroes_the_slot() {
        let mut table = HandleTable::new();
        let mut slot = table.insert(());
        let taken = GraphicsHandle::take(&mut slot);
        assert!(taken.is_allocated());
        assert_eq!(slot, GraphicsHandle::NONE);
    }

    #[test]
    fn handles_are_not_reused_after_removal() {
        let mut table = HandleTable::new();
        let a = table.insert("a");
        assert_eq!(table.release(ObjectKind::Texture, a), Some("a"));
        let b = table.insert("b");
        assert_ne!(a, b);
        assert!(!table.contains(a));
        assert_eq!(table.get(b), Some(&"b"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn release_ignores_none_and_stale_handles() {
        let mut table = HandleTable::new();
        let a = table.insert(7);
        assert_eq!(table.release(ObjectKind::Buffer, GraphicsHandle::NONE), None);
        assert_eq!(table.release(ObjectKind::Buffer, a), Some(7));
        assert_eq!(table.release(ObjectKind::Buffer, a), None);
        assert_eq!(table.len(), 0);
    }
}
