//! Row/column matrix scan shared by both detection strategies

use crate::hal::{HalError, KeypadGpio};
use crate::types::{Direction, KeyEvent, KeyMatrixConfig, Level, PinId, Pull};

/// A key located by a scan
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyHit {
    pub row: usize,
    pub col: usize,
    pub key: KeyEvent,
}

/// Put rows in output mode at `idle` and columns in pulled-up input mode
pub fn configure_matrix<G, const R: usize, const C: usize>(
    gpio: &mut G,
    config: &KeyMatrixConfig<R, C>,
    idle: Level,
) -> Result<(), HalError>
where
    G: KeypadGpio + ?Sized,
{
    for row in &config.rows {
        gpio.configure(*row, Direction::Output, Pull::None)?;
        gpio.write(*row, idle)?;
    }
    for col in &config.cols {
        gpio.configure(*col, Direction::Input, Pull::Up)?;
    }
    Ok(())
}

/// Drive every row to `level`, attempting all rows even if one fails
pub fn drive_rows<G>(gpio: &mut G, rows: &[PinId], level: Level) -> Result<(), HalError>
where
    G: KeypadGpio + ?Sized,
{
    rows.iter().fold(Ok(()), |acc, row| acc.and(gpio.write(*row, level)))
}

/// Locate the pressed key.
///
/// Drives one row low at a time, starting from all rows high, and samples
/// every column; the first (row, col) reading low wins. Each row is
/// restored high before the next one is driven, including when sampling
/// fails or a key is found.
pub fn scan_matrix<G, const R: usize, const C: usize>(
    gpio: &mut G,
    config: &KeyMatrixConfig<R, C>,
) -> Result<Option<KeyHit>, HalError>
where
    G: KeypadGpio + ?Sized,
{
    for (row, row_pin) in config.rows.iter().enumerate() {
        gpio.reset(*row_pin)?;
        let sampled = first_low_column(gpio, &config.cols);
        let restored = gpio.set(*row_pin);

        let col = sampled?;
        restored?;

        if let Some(col) = col {
            let key = KeyEvent(config.keymap[row][col]);
            return Ok(Some(KeyHit { row, col, key }));
        }
    }
    Ok(None)
}

fn first_low_column<G>(gpio: &mut G, cols: &[PinId]) -> Result<Option<usize>, HalError>
where
    G: KeypadGpio + ?Sized,
{
    for (col, pin) in cols.iter().enumerate() {
        if gpio.read(*pin)?.is_low() {
            return Ok(Some(col));
        }
    }
    Ok(None)
}
