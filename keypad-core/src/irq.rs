//! Interrupt-driven keypad: one atomic debounce-and-scan per column edge

use crate::driver::KeypadError;
use crate::exti::ExtiVector;
use crate::hal::{HalError, InterruptLines, KeypadHal, TimeSource};
use crate::queue::KeyQueue;
use crate::scan::{configure_matrix, drive_rows, scan_matrix};
use crate::types::{irq_settle, Edge, KeyEvent, KeyMatrixConfig, Level, PinId, ScanMode};

/// Result of one interrupt entry
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqOutcome {
    /// Keypad not initialised; nothing was touched
    Inactive,
    /// No keypad column on this vector has latched; nothing was touched
    NotPending,
    /// Handled, but the settled scan found no key
    NoKey,
    /// Handled and a key was queued
    Key(KeyEvent),
}

/// Keypad serviced from the column EXTI vectors.
///
/// Between scans every row is parked low so that any press pulls its
/// column low and raises a falling edge. An entry on a vector that serves a
/// pending column masks all columns, waits out contact bounce, scans,
/// queues the key, acknowledges every column and unmasks the columns that
/// were unmasked on entry. The unmasking runs on every path past the
/// pending check.
pub struct IrqKeypad<'q, H, const R: usize, const C: usize, const N: usize> {
    hal: H,
    queue: &'q KeyQueue<N>,
    config: Option<KeyMatrixConfig<R, C>>,
    enabled: [bool; C],
    last_trigger: Option<PinId>,
}

impl<'q, H, const R: usize, const C: usize, const N: usize> IrqKeypad<'q, H, R, C, N>
where
    H: KeypadHal,
{
    /// Create an inert keypad; nothing happens until [`init`](Self::init)
    pub fn new(hal: H, queue: &'q KeyQueue<N>) -> Self {
        Self {
            hal,
            queue,
            config: None,
            enabled: [false; C],
            last_trigger: None,
        }
    }

    /// Validate `config`, set up pins, arm every column on its falling
    /// edge and unmask it.
    ///
    /// On failure the keypad stays inert: every column it had unmasked,
    /// from an earlier init or from this one, is masked and acknowledged
    /// again, and every interrupt entry is a no-op.
    pub fn init(&mut self, config: &KeyMatrixConfig<R, C>) -> Result<(), KeypadError> {
        self.last_trigger = None;
        if let Some(previous) = self.config.take() {
            self.quiesce_columns(&previous.cols)?;
        }

        config.validate(ScanMode::Interrupt)?;
        self.queue.init()?;
        configure_matrix(self.hal.gpio(), config, Level::Low)?;

        if let Err(e) = self.arm_columns(config) {
            // First error wins; the cleanup is best effort
            let _ = self.quiesce_columns(&config.cols);
            return Err(e.into());
        }

        self.config = Some(*config);

        #[cfg(feature = "defmt")]
        defmt::info!("⌨️ Interrupt keypad ready ({}x{})", R, C);

        Ok(())
    }

    fn arm_columns(&mut self, config: &KeyMatrixConfig<R, C>) -> Result<(), HalError> {
        let lines = self.hal.lines();
        for (c, col) in config.cols.iter().enumerate() {
            lines.arm(*col, Edge::Falling)?;
            lines.clear_pending(*col)?;
            lines.enable(*col)?;
            self.enabled[c] = true;
        }
        Ok(())
    }

    /// Mask and acknowledge every column, carrying on past failures
    fn quiesce_columns(&mut self, cols: &[PinId; C]) -> Result<(), HalError> {
        let lines = self.hal.lines();
        let mut result = Ok(());
        for (c, col) in cols.iter().enumerate() {
            result = result.and(lines.disable(*col));
            result = result.and(lines.clear_pending(*col));
            self.enabled[c] = false;
        }
        result
    }

    /// True once `init` has succeeded
    pub fn is_active(&self) -> bool {
        self.config.is_some()
    }

    /// Column whose edge started the most recent handled entry
    pub fn last_trigger(&self) -> Option<PinId> {
        self.last_trigger
    }

    /// Service one entry of `vector`.
    ///
    /// Safe to call once per physical edge even when several columns share
    /// the vector: acknowledging every column at the end leaves nothing
    /// pending for the redundant entries, which return
    /// [`IrqOutcome::NotPending`].
    pub fn on_interrupt(&mut self, vector: ExtiVector) -> Result<IrqOutcome, KeypadError> {
        let Some(config) = self.config else {
            return Ok(IrqOutcome::Inactive);
        };

        let Some(trigger) = self.pending_column(&config, vector)? else {
            return Ok(IrqOutcome::NotPending);
        };
        self.last_trigger = Some(trigger);

        #[cfg(feature = "defmt")]
        defmt::trace!("⚡ Column edge on line {}", trigger.exti_line());

        let unmasked = self.enabled;
        let masked = self.mask_columns(&config);

        let found = masked.and_then(|_| self.settle_and_scan(&config));
        if let Ok(Some(key)) = found {
            // Queue errors only occur without storage, which init rejects
            let _ = self.queue.push(key);

            #[cfg(feature = "defmt")]
            defmt::debug!("🔑 Key '{}' confirmed", key.as_char());
        }

        let restored = self.restore_columns(&config, unmasked);
        let found = found?;
        restored?;

        Ok(match found {
            Some(key) => IrqOutcome::Key(key),
            None => IrqOutcome::NoKey,
        })
    }

    fn pending_column(
        &mut self,
        config: &KeyMatrixConfig<R, C>,
        vector: ExtiVector,
    ) -> Result<Option<PinId>, HalError> {
        let lines = self.hal.lines();
        for col in config.cols.iter().filter(|col| vector.serves(**col)) {
            if lines.is_pending(*col)? {
                return Ok(Some(*col));
            }
        }
        Ok(None)
    }

    /// Mask every column, carrying on past failures
    fn mask_columns(&mut self, config: &KeyMatrixConfig<R, C>) -> Result<(), HalError> {
        let lines = self.hal.lines();
        let mut result = Ok(());
        for (c, col) in config.cols.iter().enumerate() {
            match lines.disable(*col) {
                Ok(()) => self.enabled[c] = false,
                Err(e) => result = result.and(Err(e)),
            }
        }
        result
    }

    fn settle_and_scan(
        &mut self,
        config: &KeyMatrixConfig<R, C>,
    ) -> Result<Option<KeyEvent>, HalError> {
        self.hal.clock().delay(irq_settle());

        // Release the parked rows so the scan drives one row at a time
        let gpio = self.hal.gpio();
        drive_rows(gpio, &config.rows, Level::High)?;
        Ok(scan_matrix(gpio, config)?.map(|hit| hit.key))
    }

    /// Re-park rows, acknowledge every column and unmask the ones that
    /// were unmasked on entry. Every step is attempted.
    fn restore_columns(
        &mut self,
        config: &KeyMatrixConfig<R, C>,
        unmasked: [bool; C],
    ) -> Result<(), HalError> {
        let mut result = drive_rows(self.hal.gpio(), &config.rows, Level::Low);

        let lines = self.hal.lines();
        for col in &config.cols {
            result = result.and(lines.clear_pending(*col));
        }
        for (c, col) in config.cols.iter().enumerate() {
            if unmasked[c] {
                match lines.enable(*col) {
                    Ok(()) => self.enabled[c] = true,
                    Err(e) => result = result.and(Err(e)),
                }
            }
        }
        result
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
