//! Interrupt-safe key queue shared between the scanner and the application

use core::cell::RefCell;
use critical_section::Mutex;

use crate::ring_buffer::{RingBuffer, RingBufferError};
use crate::types::{KeyEvent, NO_KEY};

/// Confirmed key symbols waiting for the application.
///
/// The scanner side pushes from interrupt or tick context; the application
/// drains with [`KeyQueue::try_read_key`]. Every access runs inside a
/// critical section, so a `static KeyQueue` is sound on single- and
/// multi-core targets alike.
pub struct KeyQueue<const N: usize> {
    inner: Mutex<RefCell<RingBuffer<u8, N>>>,
}

impl<const N: usize> KeyQueue<N> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(RingBuffer::new(NO_KEY))),
        }
    }

    /// Reset to empty and clear the overrun counter
    pub fn init(&self) -> Result<(), RingBufferError> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).init())
    }

    /// Enqueue a confirmed key, overwriting the oldest one if full
    pub fn push(&self, key: KeyEvent) -> Result<(), RingBufferError> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).write(key.symbol()))
    }

    /// Oldest pending key, if any. Never blocks.
    pub fn try_read_key(&self) -> Option<KeyEvent> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).read()).map(KeyEvent)
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow_ref(cs).count())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Keys lost to overruns since the last `init`
    pub fn dropped(&self) -> u32 {
        critical_section::with(|cs| self.inner.borrow_ref(cs).dropped())
    }

    pub fn flush(&self) {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).flush())
    }
}

impl<const N: usize> Default for KeyQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
