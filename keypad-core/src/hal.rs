//! Hardware Abstraction Layer for keypad implementation

// Re-export time types based on feature
#[cfg(feature = "embassy-time")]
pub use embassy_time::{Duration, Instant};

#[cfg(not(feature = "embassy-time"))]
pub use self::mock_time::{Duration, Instant};

#[cfg(not(feature = "embassy-time"))]
mod mock_time {
    /// Millisecond instant for builds without embassy-time
    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
    pub struct Instant(u64);

    impl Instant {
        pub const fn from_millis(ms: u64) -> Self {
            Self(ms)
        }

        pub fn duration_since(&self, other: Instant) -> Duration {
            Duration::from_millis(self.0.saturating_sub(other.0))
        }

        pub const fn as_millis(&self) -> u64 {
            self.0
        }
    }

    /// Millisecond duration for builds without embassy-time
    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
    pub struct Duration(u64);

    impl Duration {
        pub const fn from_millis(ms: u64) -> Self {
            Self(ms)
        }

        pub const fn as_millis(&self) -> u64 {
            self.0
        }
    }
}

use embedded_hal::digital::{InputPin, OutputPin};
use crate::types::{Direction, Edge, Level, PinId, Pull};

/// Error types for HAL operations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// GPIO operation failed
    GpioError,
    /// Pin not managed by this implementation
    InvalidConfig,
}

#[cfg(feature = "std")]
impl core::fmt::Display for HalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HalError::GpioError => write!(f, "GPIO operation failed"),
            HalError::InvalidConfig => write!(f, "Invalid configuration"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HalError {}

/// Pin-level GPIO access
pub trait KeypadGpio {
    /// Set direction and pull resistor
    fn configure(&mut self, pin: PinId, direction: Direction, pull: Pull) -> Result<(), HalError>;

    /// Drive the pin high
    fn set(&mut self, pin: PinId) -> Result<(), HalError>;

    /// Drive the pin low
    fn reset(&mut self, pin: PinId) -> Result<(), HalError>;

    /// Sample the pin
    fn read(&mut self, pin: PinId) -> Result<Level, HalError>;

    /// Invert the driven level
    fn toggle(&mut self, pin: PinId) -> Result<(), HalError> {
        match self.read(pin)? {
            Level::Low => self.set(pin),
            Level::High => self.reset(pin),
        }
    }

    /// Drive the pin to `level`
    fn write(&mut self, pin: PinId, level: Level) -> Result<(), HalError> {
        match level {
            Level::Low => self.reset(pin),
            Level::High => self.set(pin),
        }
    }
}

/// External interrupt line control, one line per pin number
pub trait InterruptLines {
    /// Route `pin` to its line and select the trigger edge
    fn arm(&mut self, pin: PinId, edge: Edge) -> Result<(), HalError>;

    /// Unmask the line
    fn enable(&mut self, pin: PinId) -> Result<(), HalError>;

    /// Mask the line
    fn disable(&mut self, pin: PinId) -> Result<(), HalError>;

    /// True when the line has latched an edge
    fn is_pending(&mut self, pin: PinId) -> Result<bool, HalError>;

    /// Acknowledge a latched edge
    fn clear_pending(&mut self, pin: PinId) -> Result<(), HalError>;
}

/// Monotonic time and blocking delay
pub trait TimeSource {
    fn now(&self) -> Instant;

    /// Busy-wait for `duration`
    fn delay(&mut self, duration: Duration);
}

/// Complete keypad HAL interface
pub trait KeypadHal {
    type Gpio: KeypadGpio;
    type Lines: InterruptLines;
    type Clock: TimeSource;

    /// Access to GPIO
    fn gpio(&mut self) -> &mut Self::Gpio;

    /// Access to external interrupt lines
    fn lines(&mut self) -> &mut Self::Lines;

    /// Access to time source
    fn clock(&mut self) -> &mut Self::Clock;
}

/// Independent GPIO, interrupt and clock implementations bundled as one HAL
pub struct KeypadParts<G, L, T> {
    pub gpio: G,
    pub lines: L,
    pub clock: T,
}

impl<G, L, T> KeypadParts<G, L, T> {
    pub fn new(gpio: G, lines: L, clock: T) -> Self {
        Self { gpio, lines, clock }
    }
}

impl<G, L, T> KeypadHal for KeypadParts<G, L, T>
where
    G: KeypadGpio,
    L: InterruptLines,
    T: TimeSource,
{
    type Gpio = G;
    type Lines = L;
    type Clock = T;

    fn gpio(&mut self) -> &mut G {
        &mut self.gpio
    }

    fn lines(&mut self) -> &mut L {
        &mut self.lines
    }

    fn clock(&mut self) -> &mut T {
        &mut self.clock
    }
}

/// Generic implementation for embedded-hal compatible pins.
///
/// Rows are push-pull outputs, columns are inputs whose pull-up is set up
/// by whoever constructed the pins, so `configure` only checks ownership.
pub struct EmbeddedHalGpio<O, I, const R: usize, const C: usize> {
    rows: [O; R],
    cols: [I; C],
    row_ids: [PinId; R],
    col_ids: [PinId; C],
    driven: [Level; R],
}

impl<O, I, const R: usize, const C: usize> EmbeddedHalGpio<O, I, R, C>
where
    O: OutputPin,
    I: InputPin,
{
    pub fn new(rows: [O; R], row_ids: [PinId; R], cols: [I; C], col_ids: [PinId; C]) -> Self {
        Self {
            rows,
            cols,
            row_ids,
            col_ids,
            driven: [Level::High; R],
        }
    }

    /// Give the pins back
    pub fn release(self) -> ([O; R], [I; C]) {
        (self.rows, self.cols)
    }

    fn row_index(&self, pin: PinId) -> Option<usize> {
        self.row_ids.iter().position(|id| *id == pin)
    }

    fn col_index(&self, pin: PinId) -> Option<usize> {
        self.col_ids.iter().position(|id| *id == pin)
    }
}

impl<O, I, const R: usize, const C: usize> KeypadGpio for EmbeddedHalGpio<O, I, R, C>
where
    O: OutputPin,
    I: InputPin,
{
    fn configure(&mut self, pin: PinId, direction: Direction, _pull: Pull) -> Result<(), HalError> {
        match direction {
            Direction::Output if self.row_index(pin).is_some() => Ok(()),
            Direction::Input if self.col_index(pin).is_some() => Ok(()),
            _ => Err(HalError::InvalidConfig),
        }
    }

    fn set(&mut self, pin: PinId) -> Result<(), HalError> {
        let r = self.row_index(pin).ok_or(HalError::InvalidConfig)?;
        self.rows[r].set_high().map_err(|_| HalError::GpioError)?;
        self.driven[r] = Level::High;
        Ok(())
    }

    fn reset(&mut self, pin: PinId) -> Result<(), HalError> {
        let r = self.row_index(pin).ok_or(HalError::InvalidConfig)?;
        self.rows[r].set_low().map_err(|_| HalError::GpioError)?;
        self.driven[r] = Level::Low;
        Ok(())
    }

    fn read(&mut self, pin: PinId) -> Result<Level, HalError> {
        if let Some(c) = self.col_index(pin) {
            let low = self.cols[c].is_low().map_err(|_| HalError::GpioError)?;
            return Ok(if low { Level::Low } else { Level::High });
        }

        // embedded-hal output pins cannot be read back
        self.row_index(pin)
            .map(|r| self.driven[r])
            .ok_or(HalError::InvalidConfig)
    }
}

/// No-op interrupt lines for poll-only deployments
pub struct NoOpInterruptLines;

impl InterruptLines for NoOpInterruptLines {
    fn arm(&mut self, _pin: PinId, _edge: Edge) -> Result<(), HalError> {
        Ok(())
    }

    fn enable(&mut self, _pin: PinId) -> Result<(), HalError> {
        Ok(())
    }

    fn disable(&mut self, _pin: PinId) -> Result<(), HalError> {
        Ok(())
    }

    fn is_pending(&mut self, _pin: PinId) -> Result<bool, HalError> {
        Ok(false)
    }

    fn clear_pending(&mut self, _pin: PinId) -> Result<(), HalError> {
        Ok(())
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! Mock implementations for testing

    use super::*;
    use crate::exti::ExtiVector;

    /// Simulated keypad board.
    ///
    /// Models an `R`x`C` matrix whose columns are pulled up and read low when
    /// a pressed key connects them to a row driven low. Column falling edges
    /// latch pending flags on armed lines, whether or not the line is
    /// enabled. Implements every collaborator trait, so one board serves as
    /// the whole HAL.
    pub struct MockBoard<const R: usize, const C: usize> {
        rows: [PinId; R],
        cols: [PinId; C],
        pressed: [[bool; C]; R],
        driven: [Level; R],
        col_level: [Level; C],
        configured: u32,

        max_rows_low: usize,
        max_rows_low_sampling: usize,
        row_writes: u32,
        column_reads: u32,

        falling: u16,
        enabled: u16,
        pending: u16,
        enable_calls: u32,
        disable_calls: u32,
        clear_calls: u32,

        now_ms: u64,
        delays: u32,
        bounce_on_delay: bool,
        fail_reads: bool,
        fail_enable_line: Option<u8>,
    }

    impl<const R: usize, const C: usize> MockBoard<R, C> {
        pub fn new(rows: [PinId; R], cols: [PinId; C]) -> Self {
            Self {
                rows,
                cols,
                pressed: [[false; C]; R],
                driven: [Level::High; R],
                col_level: [Level::High; C],
                configured: 0,
                max_rows_low: 0,
                max_rows_low_sampling: 0,
                row_writes: 0,
                column_reads: 0,
                falling: 0,
                enabled: 0,
                pending: 0,
                enable_calls: 0,
                disable_calls: 0,
                clear_calls: 0,
                now_ms: 0,
                delays: 0,
                bounce_on_delay: false,
                fail_reads: false,
                fail_enable_line: None,
            }
        }

        /// Board wired for `config`
        pub fn for_config(config: &crate::types::KeyMatrixConfig<R, C>) -> Self {
            Self::new(config.rows, config.cols)
        }

        /// Close the switch at (row, col)
        pub fn press(&mut self, row: usize, col: usize) {
            self.pressed[row][col] = true;
            self.update_columns();
        }

        /// Open the switch at (row, col)
        pub fn release(&mut self, row: usize, col: usize) {
            self.pressed[row][col] = false;
            self.update_columns();
        }

        /// Open every switch
        pub fn release_all(&mut self) {
            self.pressed = [[false; C]; R];
            self.update_columns();
        }

        /// Latch a pending flag on an arbitrary line, e.g. a button that
        /// shares a vector with the keypad
        pub fn raise_line(&mut self, line: u8) {
            self.pending |= 1 << line;
        }

        /// Re-latch pressed columns during every settle delay
        pub fn set_bounce_on_delay(&mut self, bounce: bool) {
            self.bounce_on_delay = bounce;
        }

        /// Make every column read fail
        pub fn set_fail_reads(&mut self, fail: bool) {
            self.fail_reads = fail;
        }

        /// Make unmasking `line` fail
        pub fn set_fail_enable_line(&mut self, line: Option<u8>) {
            self.fail_enable_line = line;
        }

        pub fn advance(&mut self, ms: u64) {
            self.now_ms += ms;
        }

        /// Level currently driven on row `r`
        pub fn row_level(&self, r: usize) -> Level {
            self.driven[r]
        }

        /// Largest number of rows ever driven low at the same time
        pub fn max_rows_low(&self) -> usize {
            self.max_rows_low
        }

        /// Largest number of rows low while a column was being sampled
        pub fn max_rows_low_while_sampling(&self) -> usize {
            self.max_rows_low_sampling
        }

        pub fn reset_row_stats(&mut self) {
            self.max_rows_low = self.rows_low();
            self.max_rows_low_sampling = 0;
        }

        pub fn row_writes(&self) -> u32 {
            self.row_writes
        }

        pub fn column_reads(&self) -> u32 {
            self.column_reads
        }

        pub fn is_configured(&self, pin: PinId) -> bool {
            self.index_of(pin)
                .map(|i| self.configured & (1 << i) != 0)
                .unwrap_or(false)
        }

        pub fn is_enabled(&self, line: u8) -> bool {
            self.enabled & (1 << line) != 0
        }

        pub fn is_line_pending(&self, line: u8) -> bool {
            self.pending & (1 << line) != 0
        }

        pub fn enabled_mask(&self) -> u16 {
            self.enabled
        }

        pub fn enable_calls(&self) -> u32 {
            self.enable_calls
        }

        pub fn disable_calls(&self) -> u32 {
            self.disable_calls
        }

        pub fn clear_calls(&self) -> u32 {
            self.clear_calls
        }

        pub fn delays(&self) -> u32 {
            self.delays
        }

        /// First vector with a line that is both pending and enabled, i.e.
        /// the interrupt the NVIC would take next
        pub fn firing_vector(&self) -> Option<ExtiVector> {
            let firing = self.pending & self.enabled;
            ExtiVector::ALL
                .into_iter()
                .find(|vector| vector.line_mask() & firing != 0)
        }

        fn rows_low(&self) -> usize {
            self.driven.iter().filter(|l| l.is_low()).count()
        }

        /// Position among rows then columns, used as a configured bit
        fn index_of(&self, pin: PinId) -> Option<usize> {
            self.rows
                .iter()
                .chain(self.cols.iter())
                .position(|id| *id == pin)
        }

        fn compute_column(&self, c: usize) -> Level {
            let connected = (0..R).any(|r| self.pressed[r][c] && self.driven[r].is_low());
            if connected {
                Level::Low
            } else {
                Level::High
            }
        }

        fn update_columns(&mut self) {
            for c in 0..C {
                let level = self.compute_column(c);
                let line = self.cols[c].exti_line();
                if self.col_level[c] == Level::High
                    && level == Level::Low
                    && self.falling & (1 << line) != 0
                {
                    self.pending |= 1 << line;
                }
                self.col_level[c] = level;
            }
        }

        fn drive(&mut self, pin: PinId, level: Level) -> Result<(), HalError> {
            let r = self
                .rows
                .iter()
                .position(|id| *id == pin)
                .ok_or(HalError::InvalidConfig)?;
            self.driven[r] = level;
            self.row_writes += 1;
            self.max_rows_low = self.max_rows_low.max(self.rows_low());
            self.update_columns();
            Ok(())
        }
    }

    impl<const R: usize, const C: usize> KeypadGpio for MockBoard<R, C> {
        fn configure(
            &mut self,
            pin: PinId,
            _direction: Direction,
            _pull: Pull,
        ) -> Result<(), HalError> {
            let i = self.index_of(pin).ok_or(HalError::InvalidConfig)?;
            self.configured |= 1 << i;
            Ok(())
        }

        fn set(&mut self, pin: PinId) -> Result<(), HalError> {
            self.drive(pin, Level::High)
        }

        fn reset(&mut self, pin: PinId) -> Result<(), HalError> {
            self.drive(pin, Level::Low)
        }

        fn read(&mut self, pin: PinId) -> Result<Level, HalError> {
            if let Some(r) = self.rows.iter().position(|id| *id == pin) {
                return Ok(self.driven[r]);
            }

            let c = self
                .cols
                .iter()
                .position(|id| *id == pin)
                .ok_or(HalError::InvalidConfig)?;
            if self.fail_reads {
                return Err(HalError::GpioError);
            }
            self.column_reads += 1;
            self.max_rows_low_sampling = self.max_rows_low_sampling.max(self.rows_low());
            Ok(self.col_level[c])
        }
    }

    impl<const R: usize, const C: usize> InterruptLines for MockBoard<R, C> {
        fn arm(&mut self, pin: PinId, edge: Edge) -> Result<(), HalError> {
            let bit = pin.mask();
            if edge.falling() {
                self.falling |= bit;
            } else {
                self.falling &= !bit;
            }
            Ok(())
        }

        fn enable(&mut self, pin: PinId) -> Result<(), HalError> {
            self.enable_calls += 1;
            if self.fail_enable_line == Some(pin.exti_line()) {
                return Err(HalError::GpioError);
            }
            self.enabled |= pin.mask();
            Ok(())
        }

        fn disable(&mut self, pin: PinId) -> Result<(), HalError> {
            self.enabled &= !pin.mask();
            self.disable_calls += 1;
            Ok(())
        }

        fn is_pending(&mut self, pin: PinId) -> Result<bool, HalError> {
            Ok(self.pending & pin.mask() != 0)
        }

        fn clear_pending(&mut self, pin: PinId) -> Result<(), HalError> {
            self.pending &= !pin.mask();
            self.clear_calls += 1;
            Ok(())
        }
    }

    impl<const R: usize, const C: usize> TimeSource for MockBoard<R, C> {
        fn now(&self) -> Instant {
            Instant::from_millis(self.now_ms)
        }

        fn delay(&mut self, duration: Duration) {
            self.now_ms += duration.as_millis();
            self.delays += 1;

            if self.bounce_on_delay {
                for c in 0..C {
                    if (0..R).any(|r| self.pressed[r][c]) {
                        self.pending |= self.cols[c].mask() & self.falling;
                    }
                }
            }
        }
    }

    impl<const R: usize, const C: usize> KeypadHal for MockBoard<R, C> {
        type Gpio = Self;
        type Lines = Self;
        type Clock = Self;

        fn gpio(&mut self) -> &mut Self {
            self
        }

        fn lines(&mut self) -> &mut Self {
            self
        }

        fn clock(&mut self) -> &mut Self {
            self
        }
    }
}
