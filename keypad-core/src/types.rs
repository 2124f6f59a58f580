//! Core data types for the matrix keypad

use crate::hal::Duration;

/// Consecutive sensing ticks required to confirm a press in poll mode
pub const DEBOUNCE_TICKS: u16 = 20;

/// Poll scan period
pub const SCAN_PERIOD_MS: u64 = 1;

/// Settle delay applied inside the column interrupt handler
pub const IRQ_SETTLE_MS: u64 = 5;

/// Key queue slots for the 4x4 reference matrix
pub const KEYPAD_QUEUE_SLOTS: usize = 16;

/// Symbol value reserved for "no key"
pub const NO_KEY: u8 = 0;

/// Highest EXTI line / pin number on a port
pub const MAX_PIN: u8 = 15;

/// Settle delay as a [`Duration`]
pub fn irq_settle() -> Duration {
    Duration::from_millis(IRQ_SETTLE_MS)
}

/// GPIO port letter
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "std", derive(Hash))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
}

impl Port {
    /// Zero-based port index (A = 0), used for register strides and the
    /// EXTI line multiplexer
    pub const fn index(&self) -> u8 {
        match self {
            Port::A => 0,
            Port::B => 1,
            Port::C => 2,
            Port::D => 3,
            Port::E => 4,
            Port::F => 5,
            Port::G => 6,
            Port::H => 7,
        }
    }
}

/// A physical pin: port plus pin number. The pin number is also the
/// pin's EXTI line.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "std", derive(Hash))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinId {
    pub port: Port,
    pub pin: u8,
}

impl PinId {
    pub const fn new(port: Port, pin: u8) -> Self {
        Self { port, pin }
    }

    /// EXTI line this pin is routed to
    pub const fn exti_line(&self) -> u8 {
        self.pin
    }

    /// Single-bit mask of the pin within its port, 0 when out of range
    pub const fn mask(&self) -> u16 {
        if self.pin > MAX_PIN {
            0
        } else {
            1 << self.pin
        }
    }
}

/// Logic level of a pin
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub const fn is_low(&self) -> bool {
        matches!(self, Level::Low)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Input,
    Output,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    None,
    Up,
    Down,
}

/// Edge selection for an external interrupt line
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Rising,
    Falling,
    Both,
}

impl Edge {
    pub const fn falling(&self) -> bool {
        matches!(self, Edge::Falling | Edge::Both)
    }

    pub const fn rising(&self) -> bool {
        matches!(self, Edge::Rising | Edge::Both)
    }
}

/// One decoded key symbol, taken verbatim from the keymap
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "std", derive(Hash))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyEvent(pub u8);

impl KeyEvent {
    pub const fn symbol(&self) -> u8 {
        self.0
    }

    /// Symbol as a `char` for display
    pub const fn as_char(&self) -> char {
        self.0 as char
    }
}

/// Detection strategy; exactly one is active per deployment
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanMode {
    Poll,
    Interrupt,
}

/// Poll-driven debounce phase
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanPhase {
    /// No key, waiting for one to appear
    Idle,
    /// A key is sensed, counting consecutive ticks
    Debounce,
    /// Press confirmed and queued, waiting for full release
    Pressed,
}

/// Poll-driven scan state
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanState {
    pub phase: ScanPhase,
    /// Consecutive sensing ticks in DEBOUNCE; 0 in the other phases
    pub debounce_ticks: u16,
}

impl ScanState {
    pub const fn new() -> Self {
        Self {
            phase: ScanPhase::Idle,
            debounce_ticks: 0,
        }
    }
}

impl Default for ScanState {
    fn default() -> Self {
        Self::new()
    }
}

/// Rejected matrix configuration
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Zero rows or zero columns
    EmptyMatrix,
    /// Pin number above 15
    PinOutOfRange(PinId),
    /// The same pin appears twice among rows and columns
    DuplicatePin(PinId),
    /// Two interrupt columns map to the same EXTI line
    SharedExtiLine(u8),
    /// Keymap entry equal to the "no key" value
    NulSymbol { row: usize, col: usize },
}

#[cfg(feature = "std")]
impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::EmptyMatrix => write!(f, "Matrix has no rows or no columns"),
            ConfigError::PinOutOfRange(pin) => {
                write!(f, "Pin P{:?}{} is out of range", pin.port, pin.pin)
            }
            ConfigError::DuplicatePin(pin) => {
                write!(f, "Pin P{:?}{} is used more than once", pin.port, pin.pin)
            }
            ConfigError::SharedExtiLine(line) => {
                write!(f, "Two columns share EXTI line {}", line)
            }
            ConfigError::NulSymbol { row, col } => {
                write!(f, "Keymap entry ({}, {}) is the no-key value", row, col)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// Matrix wiring and symbol table
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct KeyMatrixConfig<const R: usize, const C: usize> {
    /// Row pins, driven as outputs
    pub rows: [PinId; R],
    /// Column pins, sampled as pulled-up inputs
    pub cols: [PinId; C],
    /// Symbol for each (row, column) intersection
    pub keymap: [[u8; C]; R],
}

impl<const R: usize, const C: usize> KeyMatrixConfig<R, C> {
    pub const fn new(rows: [PinId; R], cols: [PinId; C], keymap: [[u8; C]; R]) -> Self {
        Self { rows, cols, keymap }
    }

    pub const fn num_rows(&self) -> usize {
        R
    }

    pub const fn num_cols(&self) -> usize {
        C
    }

    /// Symbol at a matrix intersection, if in range
    pub fn symbol(&self, row: usize, col: usize) -> Option<u8> {
        self.keymap.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Check the layout for use in the given mode
    pub fn validate(&self, mode: ScanMode) -> Result<(), ConfigError> {
        if R == 0 || C == 0 {
            return Err(ConfigError::EmptyMatrix);
        }

        let pins = self.rows.iter().chain(self.cols.iter());
        for (i, pin) in pins.clone().enumerate() {
            if pin.pin > MAX_PIN {
                return Err(ConfigError::PinOutOfRange(*pin));
            }
            if pins.clone().skip(i + 1).any(|other| other == pin) {
                return Err(ConfigError::DuplicatePin(*pin));
            }
        }

        // One port per EXTI line: two columns on the same line number
        // cannot both raise interrupts.
        if mode == ScanMode::Interrupt {
            for (i, col) in self.cols.iter().enumerate() {
                if self.cols[i + 1..]
                    .iter()
                    .any(|other| other.exti_line() == col.exti_line())
                {
                    return Err(ConfigError::SharedExtiLine(col.exti_line()));
                }
            }
        }

        for (row, symbols) in self.keymap.iter().enumerate() {
            if let Some(col) = symbols.iter().position(|s| *s == NO_KEY) {
                return Err(ConfigError::NulSymbol { row, col });
            }
        }

        Ok(())
    }
}

/// Symbol table of the reference 4x4 telephone-style pad
pub const REFERENCE_KEYMAP: [[u8; 4]; 4] = [
    *b"123A",
    *b"456B",
    *b"789C",
    *b"*0#D",
];

/// Reference board wiring: rows PA10 PB3 PB5 PB4, columns PB10 PA8 PA9 PC7
pub const REFERENCE_MATRIX: KeyMatrixConfig<4, 4> = KeyMatrixConfig::new(
    [
        PinId::new(Port::A, 10),
        PinId::new(Port::B, 3),
        PinId::new(Port::B, 5),
        PinId::new(Port::B, 4),
    ],
    [
        PinId::new(Port::B, 10),
        PinId::new(Port::A, 8),
        PinId::new(Port::A, 9),
        PinId::new(Port::C, 7),
    ],
    REFERENCE_KEYMAP,
);
