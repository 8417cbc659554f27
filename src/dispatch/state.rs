// src/dispatch/state.rs

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Rotation pointer for one service, shared by every dispatch made against it.
///
/// The host owns this (usually behind an `Arc`) for as long as it wants the pointer to persist.
/// `0 <= current_index() < len()` always holds.
#[derive(Debug)]
pub struct DispatcherState {
    current: AtomicUsize,
    len: usize,
    disabled: Mutex<HashSet<usize>>,
}

impl DispatcherState {
    /// A state for `len` credentials; a zero length is treated as one.
    pub fn new(len: usize) -> Self {
        Self::starting_at(len, 0)
    }

    pub fn starting_at(len: usize, index: usize) -> Self {
        let len = len.max(1);
        Self {
            current: AtomicUsize::new(index % len),
            len,
            disabled: Mutex::new(HashSet::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn current_index(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    /// Points the state at the key after `failed`, wrapping.
    pub fn advance_past(&self, failed: usize) -> usize {
        let next = (failed + 1) % self.len;
        self.current.store(next, Ordering::SeqCst);
        next
    }

    pub(crate) fn set_current(&self, index: usize) {
        self.current.store(index % self.len, Ordering::SeqCst);
    }

    pub fn disable(&self, index: usize) {
        self.disabled.lock().insert(index);
    }

    pub fn is_disabled(&self, index: usize) -> bool {
        self.disabled.lock().contains(&index)
    }

    pub fn disabled_count(&self) -> usize {
        self.disabled.lock().len()
    }

    /// Re-enables every key disabled by the invalid-key policy.
    pub fn reset_disabled(&self) {
        self.disabled.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_wraps() {
        let state = DispatcherState::new(3);
        assert_eq!(state.advance_past(0), 1);
        assert_eq!(state.advance_past(2), 0);
        assert_eq!(state.current_index(), 0);
    }

    #[test]
    fn test_starting_index_is_reduced() {
        let state = DispatcherState::starting_at(3, 7);
        assert_eq!(state.current_index(), 1);
        assert_eq!(DispatcherState::new(0).len(), 1);
    }

    #[test]
    fn test_disable_and_reset() {
        let state = DispatcherState::new(2);
        state.disable(1);
        assert!(state.is_disabled(1));
        assert_eq!(state.disabled_count(), 1);
        state.reset_disabled();
        assert!(!state.is_disabled(1));
    }
}
