//! Interrupt numbers and vector table for the STM32L476
//!
//! Only the vectors this firmware services are named. Every other slot
//! is reserved and falls through to `DefaultHandler`.

use cortex_m::interrupt::InterruptNumber;
use keypad_core::ExtiVector;

pub use cortex_m_rt::interrupt;
pub use self::Interrupt as interrupt;

/// Number of device interrupt slots on the STM32L476
pub const VECTOR_COUNT: usize = 82;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(non_camel_case_types)]
#[repr(u16)]
pub enum Interrupt {
    EXTI0 = 6,
    EXTI1 = 7,
    EXTI2 = 8,
    EXTI3 = 9,
    EXTI4 = 10,
    EXTI9_5 = 23,
    USART2 = 38,
    EXTI15_10 = 40,
}

unsafe impl InterruptNumber for Interrupt {
    #[inline(always)]
    fn number(self) -> u16 {
        self as u16
    }
}

impl From<ExtiVector> for Interrupt {
    fn from(vector: ExtiVector) -> Self {
        match vector {
            ExtiVector::Exti0 => Interrupt::EXTI0,
            ExtiVector::Exti1 => Interrupt::EXTI1,
            ExtiVector::Exti2 => Interrupt::EXTI2,
            ExtiVector::Exti3 => Interrupt::EXTI3,
            ExtiVector::Exti4 => Interrupt::EXTI4,
            ExtiVector::Exti9_5 => Interrupt::EXTI9_5,
            ExtiVector::Exti15_10 => Interrupt::EXTI15_10,
        }
    }
}

extern "C" {
    fn EXTI0();
    fn EXTI1();
    fn EXTI2();
    fn EXTI3();
    fn EXTI4();
    fn EXTI9_5();
    fn USART2();
    fn EXTI15_10();
}

#[doc(hidden)]
pub union Vector {
    _handler: unsafe extern "C" fn(),
    _reserved: u32,
}

const RESERVED: Vector = Vector { _reserved: 0 };

#[doc(hidden)]
#[link_section = ".vector_table.interrupts"]
#[no_mangle]
pub static __INTERRUPTS: [Vector; VECTOR_COUNT] = {
    let mut table = [RESERVED; VECTOR_COUNT];
    table[Interrupt::EXTI0 as usize] = Vector { _handler: EXTI0 };
    table[Interrupt::EXTI1 as usize] = Vector { _handler: EXTI1 };
    table[Interrupt::EXTI2 as usize] = Vector { _handler: EXTI2 };
    table[Interrupt::EXTI3 as usize] = Vector { _handler: EXTI3 };
    table[Interrupt::EXTI4 as usize] = Vector { _handler: EXTI4 };
    table[Interrupt::EXTI9_5 as usize] = Vector { _handler: EXTI9_5 };
    table[Interrupt::USART2 as usize] = Vector { _handler: USART2 };
    table[Interrupt::EXTI15_10 as usize] = Vector { _handler: EXTI15_10 };
    table
};
