//! Test utilities for keypad scenarios

use std::vec::Vec;

use crate::driver::{KeypadDriver, KeypadError};
use crate::hal::mock::MockBoard;
use crate::irq::IrqOutcome;
use crate::queue::KeyQueue;
use crate::types::{KeyEvent, KeyMatrixConfig, ScanMode, SCAN_PERIOD_MS};

/// One step of a scripted key sequence
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Close the switch at (row, col)
    Press(usize, usize),
    /// Open the switch at (row, col)
    Release(usize, usize),
    /// Open every switch
    ReleaseAll,
    /// Let this many scan periods pass
    Ticks(u32),
    /// Toggle contact bounce during the interrupt settle delay
    Bounce(bool),
}

/// Drives a keypad on a [`MockBoard`] through scripted presses.
///
/// Poll drivers get one `scan_tick` per elapsed period. Interrupt drivers
/// get an `on_interrupt` for every vector the board would fire, right after
/// each switch change and each period.
pub struct KeypadSimulator<'q, const R: usize, const C: usize, const N: usize> {
    driver: KeypadDriver<'q, MockBoard<R, C>, R, C, N>,
    confirmed: Vec<KeyEvent>,
    entries: Vec<IrqOutcome>,
}

impl<'q, const R: usize, const C: usize, const N: usize> KeypadSimulator<'q, R, C, N> {
    /// Build and initialise a driver for `config`
    pub fn new(
        mode: ScanMode,
        config: &KeyMatrixConfig<R, C>,
        queue: &'q KeyQueue<N>,
    ) -> Result<Self, KeypadError> {
        let mut driver = KeypadDriver::new(mode, MockBoard::for_config(config), queue);
        driver.init(config)?;
        Ok(Self {
            driver,
            confirmed: Vec::new(),
            entries: Vec::new(),
        })
    }

    pub fn press(&mut self, row: usize, col: usize) -> Result<(), KeypadError> {
        self.board().press(row, col);
        self.service_interrupts()
    }

    pub fn release(&mut self, row: usize, col: usize) -> Result<(), KeypadError> {
        self.board().release(row, col);
        self.service_interrupts()
    }

    pub fn release_all(&mut self) -> Result<(), KeypadError> {
        self.board().release_all();
        self.service_interrupts()
    }

    /// Let `n` scan periods elapse
    pub fn tick(&mut self, n: u32) -> Result<(), KeypadError> {
        for _ in 0..n {
            self.board().advance(SCAN_PERIOD_MS);
            match self.driver.mode() {
                ScanMode::Poll => {
                    if let Some(key) = self.driver.scan_tick()? {
                        self.confirmed.push(key);
                    }
                }
                ScanMode::Interrupt => self.service_interrupts()?,
            }
        }
        Ok(())
    }

    /// Play a script from start to end
    pub fn run(&mut self, script: &[Step]) -> Result<(), KeypadError> {
        for step in script {
            match *step {
                Step::Press(row, col) => self.press(row, col)?,
                Step::Release(row, col) => self.release(row, col)?,
                Step::ReleaseAll => self.release_all()?,
                Step::Ticks(n) => self.tick(n)?,
                Step::Bounce(on) => self.board().set_bounce_on_delay(on),
            }
        }
        Ok(())
    }

    /// Take every queued key, oldest first
    pub fn drain(&mut self) -> Vec<KeyEvent> {
        core::iter::from_fn(|| self.driver.try_read_key()).collect()
    }

    /// Keys reported as confirmed by the driver, in order
    pub fn confirmed(&self) -> &[KeyEvent] {
        &self.confirmed
    }

    /// Outcome of every interrupt entry so far
    pub fn entries(&self) -> &[IrqOutcome] {
        &self.entries
    }

    pub fn driver(&self) -> &KeypadDriver<'q, MockBoard<R, C>, R, C, N> {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut KeypadDriver<'q, MockBoard<R, C>, R, C, N> {
        &mut self.driver
    }

    pub fn board(&mut self) -> &mut MockBoard<R, C> {
        self.driver.hal_mut()
    }

    fn service_interrupts(&mut self) -> Result<(), KeypadError> {
        if self.driver.mode() != ScanMode::Interrupt {
            return Ok(());
        }

        while let Some(vector) = self.driver.hal().firing_vector() {
            let outcome = self.driver.on_interrupt(vector)?;
            self.entries.push(outcome);
            match outcome {
                IrqOutcome::Key(key) => self.confirmed.push(key),
                IrqOutcome::NoKey => {}
                // Nothing of ours is pending; a real NVIC would not re-enter
                IrqOutcome::NotPending | IrqOutcome::Inactive => break,
            }
        }
        Ok(())
    }
}

/// Script for one press of (row, col) held for `hold` periods then
/// released for `gap` periods
pub fn tap(row: usize, col: usize, hold: u32, gap: u32) -> [Step; 4] {
    [
        Step::Press(row, col),
        Step::Ticks(hold),
        Step::Release(row, col),
        Step::Ticks(gap),
    ]
}
