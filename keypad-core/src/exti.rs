//! External interrupt vector grouping
//!
//! Lines 0..=4 each own a vector. Lines 5..=9 share one vector and lines
//! 10..=15 share another, so a handler on a shared vector must check which
//! physical line actually latched before acting.

use crate::types::PinId;

/// Interrupt vector serving one or more EXTI lines
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "std", derive(Hash))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExtiVector {
    Exti0,
    Exti1,
    Exti2,
    Exti3,
    Exti4,
    /// Lines 5 to 9
    Exti9_5,
    /// Lines 10 to 15
    Exti15_10,
}

impl ExtiVector {
    pub const ALL: [ExtiVector; 7] = [
        ExtiVector::Exti0,
        ExtiVector::Exti1,
        ExtiVector::Exti2,
        ExtiVector::Exti3,
        ExtiVector::Exti4,
        ExtiVector::Exti9_5,
        ExtiVector::Exti15_10,
    ];

    /// Vector that serves `line`
    pub const fn for_line(line: u8) -> Option<Self> {
        match line {
            0 => Some(ExtiVector::Exti0),
            1 => Some(ExtiVector::Exti1),
            2 => Some(ExtiVector::Exti2),
            3 => Some(ExtiVector::Exti3),
            4 => Some(ExtiVector::Exti4),
            5..=9 => Some(ExtiVector::Exti9_5),
            10..=15 => Some(ExtiVector::Exti15_10),
            _ => None,
        }
    }

    /// Vector that serves `pin`'s line
    pub const fn for_pin(pin: PinId) -> Option<Self> {
        Self::for_line(pin.exti_line())
    }

    /// Bit mask of the lines this vector serves
    pub const fn line_mask(&self) -> u16 {
        match self {
            ExtiVector::Exti0 => 0x0001,
            ExtiVector::Exti1 => 0x0002,
            ExtiVector::Exti2 => 0x0004,
            ExtiVector::Exti3 => 0x0008,
            ExtiVector::Exti4 => 0x0010,
            ExtiVector::Exti9_5 => 0x03E0,
            ExtiVector::Exti15_10 => 0xFC00,
        }
    }

    pub const fn serves(&self, pin: PinId) -> bool {
        self.line_mask() & pin.mask() != 0
    }

    /// True when more than one line shares this vector
    pub const fn is_shared(&self) -> bool {
        matches!(self, ExtiVector::Exti9_5 | ExtiVector::Exti15_10)
    }
}

/// Vectors that must be enabled at the interrupt controller for `pins`,
/// each listed once
pub fn vectors_for<'a>(pins: &'a [PinId]) -> impl Iterator<Item = ExtiVector> + 'a {
    ExtiVector::ALL
        .into_iter()
        .filter(move |vector| pins.iter().any(|pin| vector.serves(*pin)))
}
