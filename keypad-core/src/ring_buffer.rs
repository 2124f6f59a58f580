//! Fixed-capacity FIFO that overwrites its oldest element on overrun

/// Ring buffer errors
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RingBufferError {
    /// Buffer has no backing storage (zero capacity)
    NoStorage,
}

#[cfg(feature = "std")]
impl core::fmt::Display for RingBufferError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RingBufferError::NoStorage => write!(f, "Ring buffer has no storage"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RingBufferError {}

/// Single-producer single-consumer ring of `N` elements.
///
/// Writes never fail on a bound buffer: when all `N` slots are occupied the
/// oldest element is discarded to make room. `head` is the next write slot,
/// `tail` the next read slot, and `len` disambiguates full from empty so
/// every slot is usable.
///
/// A buffer with `N == 0` is unbound: it reads as empty and rejects writes.
#[derive(Clone, Debug)]
pub struct RingBuffer<T, const N: usize> {
    buf: [T; N],
    head: usize,
    tail: usize,
    len: usize,
    dropped: u32,
}

impl<T: Copy, const N: usize> RingBuffer<T, N> {
    /// Create an empty buffer with every slot set to `fill`
    pub const fn new(fill: T) -> Self {
        Self {
            buf: [fill; N],
            head: 0,
            tail: 0,
            len: 0,
            dropped: 0,
        }
    }

    /// Reset to empty. Fails when the buffer has no storage.
    pub fn init(&mut self) -> Result<(), RingBufferError> {
        self.flush();
        self.dropped = 0;
        if self.is_bound() {
            Ok(())
        } else {
            Err(RingBufferError::NoStorage)
        }
    }

    /// True when the buffer has at least one slot
    pub const fn is_bound(&self) -> bool {
        N > 0
    }

    /// Append `value`, discarding the oldest element if full
    pub fn write(&mut self, value: T) -> Result<(), RingBufferError> {
        if !self.is_bound() {
            return Err(RingBufferError::NoStorage);
        }

        if self.len == N {
            // Overrun: the slot at tail is about to be overwritten
            self.tail = (self.tail + 1) % N;
            self.len -= 1;
            self.dropped = self.dropped.saturating_add(1);

            #[cfg(feature = "defmt")]
            defmt::warn!("⚠️ Ring buffer overrun, {} dropped", self.dropped);
        }

        self.buf[self.head] = value;
        self.head = (self.head + 1) % N;
        self.len += 1;
        Ok(())
    }

    /// Remove and return the oldest element
    pub fn read(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }

        let value = self.buf[self.tail];
        self.tail = (self.tail + 1) % N;
        self.len -= 1;
        Some(value)
    }

    /// Oldest element without removing it
    pub fn peek(&self) -> Option<T> {
        if self.len == 0 {
            None
        } else {
            Some(self.buf[self.tail])
        }
    }

    pub const fn count(&self) -> usize {
        self.len
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn is_full(&self) -> bool {
        N > 0 && self.len == N
    }

    /// Discard all contents
    pub fn flush(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.len = 0;
    }

    /// Elements discarded by overruns since the last `init`
    pub const fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl<T: Copy + Default, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
