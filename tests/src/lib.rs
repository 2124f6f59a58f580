//! Host-side integration tests for the keypad core

pub mod ring_buffer_tests;
pub mod poll_scenario_tests;
pub mod irq_scenario_tests;
pub mod adapter_tests;
