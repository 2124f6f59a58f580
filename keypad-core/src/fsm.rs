//! Poll-driven debounce state machine

use crate::driver::KeypadError;
use crate::hal::KeypadHal;
use crate::queue::KeyQueue;
use crate::scan::{configure_matrix, scan_matrix};
use crate::types::{
    KeyEvent, KeyMatrixConfig, Level, ScanMode, ScanPhase, ScanState, DEBOUNCE_TICKS,
};

/// Keypad scanned from a periodic tick.
///
/// Every [`scan_tick`](Self::scan_tick) performs one full matrix scan and
/// advances `Idle -> Debounce -> Pressed -> Idle`. A key must be sensed on
/// [`DEBOUNCE_TICKS`] consecutive ticks, counting the tick that left `Idle`,
/// before its symbol is queued. One event is queued per press-and-release.
pub struct PollKeypad<'q, H, const R: usize, const C: usize, const N: usize> {
    hal: H,
    queue: &'q KeyQueue<N>,
    config: Option<KeyMatrixConfig<R, C>>,
    state: ScanState,
}

impl<'q, H, const R: usize, const C: usize, const N: usize> PollKeypad<'q, H, R, C, N>
where
    H: KeypadHal,
{
    /// Create an inert keypad; nothing happens until [`init`](Self::init)
    pub fn new(hal: H, queue: &'q KeyQueue<N>) -> Self {
        Self {
            hal,
            queue,
            config: None,
            state: ScanState::new(),
        }
    }

    /// Validate `config`, set up the pins and reset state.
    ///
    /// On failure the keypad stays inert and every tick is a no-op.
    pub fn init(&mut self, config: &KeyMatrixConfig<R, C>) -> Result<(), KeypadError> {
        self.config = None;
        self.state = ScanState::new();

        config.validate(ScanMode::Poll)?;
        self.queue.init()?;
        configure_matrix(self.hal.gpio(), config, Level::High)?;

        self.config = Some(*config);

        #[cfg(feature = "defmt")]
        defmt::info!("⌨️ Poll keypad ready ({}x{})", R, C);

        Ok(())
    }

    /// True once `init` has succeeded
    pub fn is_active(&self) -> bool {
        self.config.is_some()
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Run one scan period. Returns the key confirmed on this tick, if any.
    pub fn scan_tick(&mut self) -> Result<Option<KeyEvent>, KeypadError> {
        let Some(config) = self.config.as_ref() else {
            return Ok(None);
        };

        let sensed = scan_matrix(self.hal.gpio(), config)?.map(|hit| hit.key);
        Ok(self.advance(sensed))
    }

    /// Feed one scan result through the state machine
    fn advance(&mut self, sensed: Option<KeyEvent>) -> Option<KeyEvent> {
        match (self.state.phase, sensed) {
            (ScanPhase::Idle, None) => None,

            (ScanPhase::Idle, Some(key)) => {
                self.state.phase = ScanPhase::Debounce;
                self.state.debounce_ticks = 0;
                self.count_debounce(key)
            }

            (ScanPhase::Debounce, Some(key)) => self.count_debounce(key),

            (ScanPhase::Debounce, None) => {
                // Bounce: no partial credit
                #[cfg(feature = "defmt")]
                defmt::trace!("🔁 Bounce after {} ticks", self.state.debounce_ticks);

                self.state = ScanState::new();
                None
            }

            // Held: auto-repeat suppressed
            (ScanPhase::Pressed, Some(_)) => None,

            (ScanPhase::Pressed, None) => {
                self.state = ScanState::new();
                None
            }
        }
    }

    fn count_debounce(&mut self, key: KeyEvent) -> Option<KeyEvent> {
        self.state.debounce_ticks += 1;
        if self.state.debounce_ticks < DEBOUNCE_TICKS {
            return None;
        }

        self.state.phase = ScanPhase::Pressed;
        self.state.debounce_ticks = 0;
        // Queue errors only occur without storage, which init rejects
        let _ = self.queue.push(key);

        #[cfg(feature = "defmt")]
        defmt::debug!("🔑 Key '{}' confirmed", key.as_char());

        Some(key)
    }

    /// Oldest confirmed key, if any
    pub fn try_read_key(&self) -> Option<KeyEvent> {
        self.queue.try_read_key()
    }

    pub fn hal(&self) -> &H {
        &self.hal
    }

    pub fn hal_mut(&mut self) -> &mut H {
        &mut self.hal
    }
}
