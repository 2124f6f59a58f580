//! Simple embassy time driver for STM32L476, clocked by a 1 ms SysTick

use embassy_time_driver::{AlarmHandle, Driver};
use portable_atomic::{AtomicU32, Ordering};

/// Simple time driver using system tick counter
pub struct SimpleTimeDriver {
    tick_count: AtomicU32,
}

impl SimpleTimeDriver {
    const fn new() -> Self {
        Self {
            tick_count: AtomicU32::new(0),
        }
    }

    /// Increment tick count (called from SysTick)
    pub fn tick(&self) {
        self.tick_count.fetch_add(1, Ordering::Relaxed);
    }
}

impl Driver for SimpleTimeDriver {
    fn now(&self) -> u64 {
        self.tick_count.load(Ordering::Relaxed) as u64
    }

    // The keypad firmware only reads `Instant::now()` for the heartbeat;
    // there is no executor and no `Timer`, so no alarm is ever requested.
    unsafe fn allocate_alarm(&self) -> Option<AlarmHandle> {
        None
    }

    // Unreachable without an allocated alarm
    fn set_alarm_callback(&self, _alarm: AlarmHandle, _callback: fn(*mut ()), _ctx: *mut ()) {}

    // Reporting "already due" makes any caller poll `now()` itself
    fn set_alarm(&self, _alarm: AlarmHandle, _timestamp: u64) -> bool {
        false
    }
}

embassy_time_driver::time_driver_impl!(static DRIVER: SimpleTimeDriver = SimpleTimeDriver::new());

/// Advance embassy time by one tick
pub fn on_tick() {
    DRIVER.tick();
}
