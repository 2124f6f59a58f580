#![cfg_attr(not(feature = "std"), no_std)]

//! # Keypad Core
//!
//! Debounced matrix keypad scanning for embedded systems.
//! Supports a poll-driven tick state machine and an EXTI interrupt-driven
//! scan, feeding an overwrite-oldest key queue.

pub mod types;
pub mod ring_buffer;
pub mod queue;
pub mod exti;
pub mod hal;
pub mod scan;
pub mod fsm;
pub mod irq;
pub mod driver;

#[cfg(feature = "test-utils")]
pub mod test_utils;


pub use types::*;
pub use ring_buffer::{RingBuffer, RingBufferError};
pub use queue::KeyQueue;
pub use exti::ExtiVector;
pub use hal::{*, Instant, Duration};
pub use scan::KeyHit;
pub use fsm::PollKeypad;
pub use irq::{IrqKeypad, IrqOutcome};
pub use driver::{KeypadDriver, KeypadError};

/// Keypad library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Wiring and keymap of the reference 4x4 board
pub fn reference_config() -> KeyMatrixConfig<4, 4> {
    REFERENCE_MATRIX
}
