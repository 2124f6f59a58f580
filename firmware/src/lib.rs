#![no_std]

//! STM32L476 board support for the matrix keypad firmware

pub use keypad_core::*;

pub use crate::stm32l4_hardware::*;
pub use crate::vectors::Interrupt;

// STM32L476 register-level hardware
pub mod stm32l4_hardware;

// Device interrupt table for cortex-m-rt
pub mod vectors;

// SysTick-driven embassy time driver
pub mod time_driver;
