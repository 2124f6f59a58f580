#![no_std]
#![no_main]

// Logging support
#[cfg(feature = "defmt")]
use defmt::{error, info, warn};
#[cfg(feature = "defmt")]
use defmt_rtt as _;
#[cfg(feature = "defmt")]
use panic_probe as _;
#[cfg(not(feature = "defmt"))]
use panic_halt as _;

// Define simple logging macros when defmt is not available
#[cfg(not(feature = "defmt"))]
macro_rules! info {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "defmt"))]
macro_rules! warn {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "defmt"))]
macro_rules! error {
    ($($arg:tt)*) => {};
}

use core::cell::RefCell;
use core::fmt::Write;

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::NVIC;
use cortex_m_rt::{entry, exception};
use critical_section::Mutex;
use embassy_time::{Duration, Instant};
use embedded_hal::digital::StatefulOutputPin;
use portable_atomic::{AtomicBool, Ordering};

use keypad_core::exti::vectors_for;
use keypad_core::{
    Direction, Edge, ExtiVector, InterruptLines, KeyQueue, KeypadDriver, KeypadGpio, Pull,
    ScanMode,
};
use keypad_firmware::memory::KEY_QUEUE_SIZE;
use keypad_firmware::pins::{HEARTBEAT_LED, KEYPAD, USER_BUTTON};
use keypad_firmware::timing::{CONSOLE_BAUD, HEARTBEAT_MS, SYSCLK_HZ, SYSTICK_HZ};
use keypad_firmware::vectors::{interrupt, Interrupt};
use keypad_firmware::{init_clocks, time_driver, LedPin, Stm32Board, Usart2Console};

#[cfg(feature = "poll-scan")]
const SCAN_MODE: ScanMode = ScanMode::Poll;
#[cfg(not(feature = "poll-scan"))]
const SCAN_MODE: ScanMode = ScanMode::Interrupt;

type Keypad = KeypadDriver<'static, Stm32Board, 4, 4, KEY_QUEUE_SIZE>;

/// Global state
static KEY_QUEUE: KeyQueue<KEY_QUEUE_SIZE> = KeyQueue::new();
static KEYPAD_DRIVER: Mutex<RefCell<Option<Keypad>>> = Mutex::new(RefCell::new(None));
static BUTTON_PRESSED: AtomicBool = AtomicBool::new(false);

#[entry]
fn main() -> ! {
    info!("🔧 Keypad Firmware Starting...");

    let Some(mut cp) = cortex_m::Peripherals::take() else {
        error!("❌ Core peripherals already taken");
        halt();
    };

    init_clocks();

    // 1 ms SysTick drives embassy time and, in poll mode, the scan
    cp.SYST.set_clock_source(SystClkSource::Core);
    cp.SYST.set_reload(SYSCLK_HZ / SYSTICK_HZ - 1);
    cp.SYST.clear_current();
    cp.SYST.enable_counter();
    cp.SYST.enable_interrupt();

    let mut console = Usart2Console::new(SYSCLK_HZ, CONSOLE_BAUD);
    let mut board = Stm32Board::new(SYSCLK_HZ);

    let mut led = match LedPin::new(board, HEARTBEAT_LED) {
        Ok(led) => Some(led),
        Err(e) => {
            warn!("⚠️ Heartbeat LED unavailable: {:?}", e);
            None
        }
    };

    if let Err(e) = arm_user_button(&mut board) {
        warn!("⚠️ User button unavailable: {:?}", e);
    }

    let mut keypad = Keypad::new(SCAN_MODE, board, &KEY_QUEUE);
    match keypad.init(&KEYPAD) {
        Ok(()) => info!("⌨️ Keypad ready ({:?})", SCAN_MODE),
        // Driver stays inert; the rest of the board keeps running
        Err(e) => error!("❌ Keypad init failed: {:?}", e),
    }
    critical_section::with(|cs| {
        KEYPAD_DRIVER.borrow_ref_mut(cs).replace(keypad);
    });

    unsafe {
        NVIC::unmask(Interrupt::EXTI15_10);
        if SCAN_MODE == ScanMode::Interrupt {
            for vector in vectors_for(&KEYPAD.cols) {
                NVIC::unmask(Interrupt::from(vector));
            }
        }
    }

    console.write_str("System Initialized. Ready.\r\n").ok();
    info!("✨ Keypad firmware ready!");

    let heartbeat = Duration::from_millis(HEARTBEAT_MS);
    let mut last_heartbeat = Instant::now();

    loop {
        while let Some(key) = KEY_QUEUE.try_read_key() {
            info!("🔑 Key {}", key.as_char());
            write!(console, "Key pressed: {}\r\n", key.as_char()).ok();
        }

        if BUTTON_PRESSED.swap(false, Ordering::AcqRel) {
            info!("🔘 Button");
            console.write_str("Button Pressed\r\n").ok();
        }

        let now = Instant::now();
        if now.duration_since(last_heartbeat) >= heartbeat {
            last_heartbeat = now;
            if let Some(led) = led.as_mut() {
                led.toggle().ok();
            }
        }

        // SysTick wakes us every millisecond
        cortex_m::asm::wfi();
    }
}

fn arm_user_button(board: &mut Stm32Board) -> Result<(), keypad_core::HalError> {
    board.configure(USER_BUTTON, Direction::Input, Pull::Up)?;
    board.arm(USER_BUTTON, Edge::Falling)?;
    board.clear_pending(USER_BUTTON)?;
    board.enable(USER_BUTTON)
}

fn halt() -> ! {
    loop {
        cortex_m::asm::wfi();
    }
}

// ========================================
// Interrupt Handlers
// ========================================

#[exception]
fn SysTick() {
    time_driver::on_tick();

    #[cfg(feature = "poll-scan")]
    critical_section::with(|cs| {
        if let Some(keypad) = KEYPAD_DRIVER.borrow_ref_mut(cs).as_mut() {
            if let Err(e) = keypad.scan_tick() {
                warn!("⚠️ Scan failed: {:?}", e);
            }
        }
    });
}

// Lines 0 to 4 carry no column on the reference wiring
#[interrupt]
fn EXTI0() {
    service_keypad(ExtiVector::Exti0);
}

#[interrupt]
fn EXTI1() {
    service_keypad(ExtiVector::Exti1);
}

#[interrupt]
fn EXTI2() {
    service_keypad(ExtiVector::Exti2);
}

#[interrupt]
fn EXTI3() {
    service_keypad(ExtiVector::Exti3);
}

#[interrupt]
fn EXTI4() {
    service_keypad(ExtiVector::Exti4);
}

#[interrupt]
fn EXTI9_5() {
    service_keypad(ExtiVector::Exti9_5);
}

#[interrupt]
fn EXTI15_10() {
    // The button shares this vector with keypad columns 10 to 15
    let mut board = Stm32Board::new(SYSCLK_HZ);
    if board.is_pending(USER_BUTTON).unwrap_or(false) {
        board.clear_pending(USER_BUTTON).ok();
        BUTTON_PRESSED.store(true, Ordering::Release);
    }

    service_keypad(ExtiVector::Exti15_10);
}

fn service_keypad(vector: ExtiVector) {
    if SCAN_MODE != ScanMode::Interrupt {
        return;
    }

    critical_section::with(|cs| {
        if let Some(keypad) = KEYPAD_DRIVER.borrow_ref_mut(cs).as_mut() {
            if let Err(e) = keypad.on_interrupt(vector) {
                warn!("⚠️ Keypad interrupt failed: {:?}", e);
            }
        }
    });
}
