//! Keypad driver with the detection strategy chosen per deployment

use crate::exti::ExtiVector;
use crate::fsm::PollKeypad;
use crate::hal::{HalError, KeypadHal};
use crate::irq::{IrqKeypad, IrqOutcome};
use crate::queue::KeyQueue;
use crate::ring_buffer::RingBufferError;
use crate::types::{ConfigError, KeyEvent, KeyMatrixConfig, ScanMode};

/// Errors from driver operations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeypadError {
    /// Matrix configuration rejected at init
    Config(ConfigError),
    /// Key queue has no storage
    Queue(RingBufferError),
    /// Collaborator failure, passed through unchanged
    Hal(HalError),
    /// Entry point of the other detection strategy was called
    WrongMode(ScanMode),
}

impl From<ConfigError> for KeypadError {
    fn from(e: ConfigError) -> Self {
        KeypadError::Config(e)
    }
}

impl From<RingBufferError> for KeypadError {
    fn from(e: RingBufferError) -> Self {
        KeypadError::Queue(e)
    }
}

impl From<HalError> for KeypadError {
    fn from(e: HalError) -> Self {
        KeypadError::Hal(e)
    }
}

#[cfg(feature = "std")]
impl core::fmt::Display for KeypadError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            KeypadError::Config(e) => write!(f, "Invalid keypad configuration: {}", e),
            KeypadError::Queue(e) => write!(f, "Key queue unavailable: {}", e),
            KeypadError::Hal(e) => write!(f, "Hardware error: {}", e),
            KeypadError::WrongMode(mode) => write!(f, "Driver is in {:?} mode", mode),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for KeypadError {}

/// A keypad running exactly one detection strategy
pub enum KeypadDriver<'q, H, const R: usize, const C: usize, const N: usize> {
    /// Periodic scan with a tick-counted debounce
    Poll(PollKeypad<'q, H, R, C, N>),
    /// Column edge interrupts with an in-handler settle delay
    Interrupt(IrqKeypad<'q, H, R, C, N>),
}

impl<'q, H, const R: usize, const C: usize, const N: usize> KeypadDriver<'q, H, R, C, N>
where
    H: KeypadHal,
{
    pub fn poll(hal: H, queue: &'q KeyQueue<N>) -> Self {
        KeypadDriver::Poll(PollKeypad::new(hal, queue))
    }

    pub fn interrupt(hal: H, queue: &'q KeyQueue<N>) -> Self {
        KeypadDriver::Interrupt(IrqKeypad::new(hal, queue))
    }

    /// Driver for `mode`
    pub fn new(mode: ScanMode, hal: H, queue: &'q KeyQueue<N>) -> Self {
        match mode {
            ScanMode::Poll => Self::poll(hal, queue),
            ScanMode::Interrupt => Self::interrupt(hal, queue),
        }
    }

    pub fn mode(&self) -> ScanMode {
        match self {
            KeypadDriver::Poll(_) => ScanMode::Poll,
            KeypadDriver::Interrupt(_) => ScanMode::Interrupt,
        }
    }

    /// One-time setup. On error the driver stays inert.
    pub fn init(&mut self, config: &KeyMatrixConfig<R, C>) -> Result<(), KeypadError> {
        let result = match self {
            KeypadDriver::Poll(keypad) => keypad.init(config),
            KeypadDriver::Interrupt(keypad) => keypad.init(config),
        };

        #[cfg(feature = "defmt")]
        if let Err(e) = result {
            defmt::error!("❌ Keypad init failed: {}", e);
        }

        result
    }

    pub fn is_active(&self) -> bool {
        match self {
            KeypadDriver::Poll(keypad) => keypad.is_active(),
            KeypadDriver::Interrupt(keypad) => keypad.is_active(),
        }
    }

    /// Periodic entry point of the poll strategy
    pub fn scan_tick(&mut self) -> Result<Option<KeyEvent>, KeypadError> {
        match self {
            KeypadDriver::Poll(keypad) => keypad.scan_tick(),
            KeypadDriver::Interrupt(_) => Err(KeypadError::WrongMode(ScanMode::Interrupt)),
        }
    }

    /// Vector entry point of the interrupt strategy
    pub fn on_interrupt(&mut self, vector: ExtiVector) -> Result<IrqOutcome, KeypadError> {
        match self {
            KeypadDriver::Interrupt(keypad) => keypad.on_interrupt(vector),
            KeypadDriver::Poll(_) => Err(KeypadError::WrongMode(ScanMode::Poll)),
        }
    }

    /// Oldest confirmed key, if any. Never blocks.
    pub fn try_read_key(&self) -> Option<KeyEvent> {
        match self {
            KeypadDriver::Poll(keypad) => keypad.try_read_key(),
            KeypadDriver::Interrupt(keypad) => keypad.try_read_key(),
        }
    }

    pub fn hal(&self) -> &H {
        match self {
            KeypadDriver::Poll(keypad) => keypad.hal(),
            KeypadDriver::Interrupt(keypad) => keypad.hal(),
        }
    }

    pub fn hal_mut(&mut self) -> &mut H {
        match self {
            KeypadDriver::Poll(keypad) => keypad.hal_mut(),
            KeypadDriver::Interrupt(keypad) => keypad.hal_mut(),
        }
    }
}
