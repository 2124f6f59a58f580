//! STM32L476 specific hardware implementations
//!
//! Register-level GPIO, EXTI and USART2 access for the keypad firmware.
//! The board runs from HSI16 with no PLL, so every bus clock is 16 MHz.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin, StatefulOutputPin};
use keypad_core::hal::{
    Duration, HalError, Instant, InterruptLines, KeypadGpio, KeypadHal, TimeSource,
};
use keypad_core::types::{Direction, Edge, Level, PinId, Pull, MAX_PIN};

// ========================================
// STM32L476 Hardware Definitions
// ========================================

const RCC_BASE: u32 = 0x4002_1000;
const GPIOA_BASE: u32 = 0x4800_0000;
const GPIO_PORT_STRIDE: u32 = 0x400;
const SYSCFG_BASE: u32 = 0x4001_0000;
const EXTI_BASE: u32 = 0x4001_0400;
const USART2_BASE: u32 = 0x4000_4400;

/// RCC register offsets
const RCC_CR: u32 = 0x00;
const RCC_CFGR: u32 = 0x08;
const RCC_AHB2ENR: u32 = 0x4C;
const RCC_APB1ENR1: u32 = 0x58;
const RCC_APB2ENR: u32 = 0x60;

const RCC_CR_HSION: u32 = 1 << 8;
const RCC_CR_HSIRDY: u32 = 1 << 10;
const RCC_CFGR_SW_MASK: u32 = 0b11;
const RCC_CFGR_SW_HSI16: u32 = 0b01;
const RCC_CFGR_SWS_SHIFT: u32 = 2;
const RCC_APB1ENR1_USART2EN: u32 = 1 << 17;
const RCC_APB2ENR_SYSCFGEN: u32 = 1 << 0;

/// GPIO register offsets
const GPIO_MODER: u32 = 0x00;
const GPIO_OTYPER: u32 = 0x04;
const GPIO_PUPDR: u32 = 0x0C;
const GPIO_IDR: u32 = 0x10;
const GPIO_ODR: u32 = 0x14;
const GPIO_BSRR: u32 = 0x18;
const GPIO_AFRL: u32 = 0x20;
const GPIO_BRR: u32 = 0x28;

const MODER_INPUT: u32 = 0b00;
const MODER_OUTPUT: u32 = 0b01;
const MODER_ALTERNATE: u32 = 0b10;

const PUPDR_NONE: u32 = 0b00;
const PUPDR_UP: u32 = 0b01;
const PUPDR_DOWN: u32 = 0b10;

/// SYSCFG external interrupt configuration, four lines per register
const SYSCFG_EXTICR1: u32 = 0x08;

/// EXTI register offsets (lines 0..=31)
const EXTI_IMR1: u32 = 0x00;
const EXTI_RTSR1: u32 = 0x08;
const EXTI_FTSR1: u32 = 0x0C;
const EXTI_PR1: u32 = 0x14;

/// USART register offsets
const USART_CR1: u32 = 0x00;
const USART_BRR: u32 = 0x0C;
const USART_ISR: u32 = 0x1C;
const USART_TDR: u32 = 0x28;

const USART_CR1_UE: u32 = 1 << 0;
const USART_CR1_TE: u32 = 1 << 3;
const USART_ISR_TXE: u32 = 1 << 7;

/// PA2 alternate function for USART2_TX
const USART2_TX_AF: u32 = 7;

#[inline(always)]
fn reg(address: u32) -> *mut u32 {
    address as *mut u32
}

#[inline(always)]
unsafe fn read_reg(address: u32) -> u32 {
    core::ptr::read_volatile(reg(address))
}

#[inline(always)]
unsafe fn write_reg(address: u32, value: u32) {
    core::ptr::write_volatile(reg(address), value)
}

#[inline(always)]
unsafe fn modify_reg(address: u32, clear: u32, set: u32) {
    let current = read_reg(address);
    write_reg(address, (current & !clear) | set);
}

fn port_base(pin: PinId) -> u32 {
    GPIOA_BASE + GPIO_PORT_STRIDE * pin.port.index() as u32
}

fn checked(pin: PinId) -> Result<PinId, HalError> {
    if pin.pin > MAX_PIN {
        Err(HalError::InvalidConfig)
    } else {
        Ok(pin)
    }
}

// ========================================
// Clock setup
// ========================================

/// Switch SYSCLK to HSI16 and enable the SYSCFG clock
pub fn init_clocks() {
    unsafe {
        modify_reg(RCC_BASE + RCC_CR, 0, RCC_CR_HSION);
        while read_reg(RCC_BASE + RCC_CR) & RCC_CR_HSIRDY == 0 {}

        modify_reg(RCC_BASE + RCC_CFGR, RCC_CFGR_SW_MASK, RCC_CFGR_SW_HSI16);
        while (read_reg(RCC_BASE + RCC_CFGR) >> RCC_CFGR_SWS_SHIFT) & RCC_CFGR_SW_MASK
            != RCC_CFGR_SW_HSI16
        {}

        modify_reg(RCC_BASE + RCC_APB2ENR, 0, RCC_APB2ENR_SYSCFGEN);
    }
}

/// Enable the AHB2 clock of `pin`'s GPIO port
fn enable_port_clock(pin: PinId) {
    unsafe {
        modify_reg(RCC_BASE + RCC_AHB2ENR, 0, 1 << pin.port.index());
    }
}

// ========================================
// Keypad board
// ========================================

/// The whole keypad HAL for the STM32L476: GPIO ports, EXTI lines and
/// a cycle-counted delay. Stateless, so any number of handles may exist.
#[derive(Copy, Clone, Debug)]
pub struct Stm32Board {
    sysclk_hz: u32,
}

impl Stm32Board {
    pub const fn new(sysclk_hz: u32) -> Self {
        Self { sysclk_hz }
    }

    fn cycles_per_ms(&self) -> u32 {
        self.sysclk_hz / 1_000
    }
}

impl KeypadGpio for Stm32Board {
    fn configure(&mut self, pin: PinId, direction: Direction, pull: Pull) -> Result<(), HalError> {
        let pin = checked(pin)?;
        enable_port_clock(pin);

        let base = port_base(pin);
        let shift = pin.pin as u32 * 2;
        let mode = match direction {
            Direction::Input => MODER_INPUT,
            Direction::Output => MODER_OUTPUT,
        };
        let pupd = match pull {
            Pull::None => PUPDR_NONE,
            Pull::Up => PUPDR_UP,
            Pull::Down => PUPDR_DOWN,
        };

        unsafe {
            // Push-pull for outputs
            modify_reg(base + GPIO_OTYPER, pin.mask() as u32, 0);
            modify_reg(base + GPIO_PUPDR, 0b11 << shift, pupd << shift);
            modify_reg(base + GPIO_MODER, 0b11 << shift, mode << shift);
        }
        Ok(())
    }

    fn set(&mut self, pin: PinId) -> Result<(), HalError> {
        let pin = checked(pin)?;
        unsafe { write_reg(port_base(pin) + GPIO_BSRR, pin.mask() as u32) };
        Ok(())
    }

    fn reset(&mut self, pin: PinId) -> Result<(), HalError> {
        let pin = checked(pin)?;
        unsafe { write_reg(port_base(pin) + GPIO_BRR, pin.mask() as u32) };
        Ok(())
    }

    fn read(&mut self, pin: PinId) -> Result<Level, HalError> {
        let pin = checked(pin)?;
        let idr = unsafe { read_reg(port_base(pin) + GPIO_IDR) };
        Ok(if idr & pin.mask() as u32 == 0 {
            Level::Low
        } else {
            Level::High
        })
    }

    // Output data register, not the pad, so a loaded pin still toggles
    fn toggle(&mut self, pin: PinId) -> Result<(), HalError> {
        let pin = checked(pin)?;
        let odr = unsafe { read_reg(port_base(pin) + GPIO_ODR) };
        if odr & pin.mask() as u32 == 0 {
            self.set(pin)
        } else {
            self.reset(pin)
        }
    }
}

impl InterruptLines for Stm32Board {
    fn arm(&mut self, pin: PinId, edge: Edge) -> Result<(), HalError> {
        let pin = checked(pin)?;
        let line = pin.exti_line() as u32;
        let bit = 1 << line;
        let exticr = SYSCFG_BASE + SYSCFG_EXTICR1 + 4 * (line / 4);
        let shift = (line % 4) * 4;

        unsafe {
            modify_reg(exticr, 0xF << shift, (pin.port.index() as u32) << shift);
            modify_reg(
                EXTI_BASE + EXTI_FTSR1,
                bit,
                if edge.falling() { bit } else { 0 },
            );
            modify_reg(
                EXTI_BASE + EXTI_RTSR1,
                bit,
                if edge.rising() { bit } else { 0 },
            );
        }
        Ok(())
    }

    fn enable(&mut self, pin: PinId) -> Result<(), HalError> {
        let pin = checked(pin)?;
        unsafe { modify_reg(EXTI_BASE + EXTI_IMR1, 0, 1 << pin.exti_line()) };
        Ok(())
    }

    fn disable(&mut self, pin: PinId) -> Result<(), HalError> {
        let pin = checked(pin)?;
        unsafe { modify_reg(EXTI_BASE + EXTI_IMR1, 1 << pin.exti_line(), 0) };
        Ok(())
    }

    fn is_pending(&mut self, pin: PinId) -> Result<bool, HalError> {
        let pin = checked(pin)?;
        let pr = unsafe { read_reg(EXTI_BASE + EXTI_PR1) };
        Ok(pr & (1 << pin.exti_line()) != 0)
    }

    fn clear_pending(&mut self, pin: PinId) -> Result<(), HalError> {
        let pin = checked(pin)?;
        // Write-one-to-clear; zeros leave other lines latched
        unsafe { write_reg(EXTI_BASE + EXTI_PR1, 1 << pin.exti_line()) };
        Ok(())
    }
}

impl TimeSource for Stm32Board {
    fn now(&self) -> Instant {
        Instant::now()
    }

    // Counts core cycles: the interrupt handler runs with SysTick masked,
    // so a tick-based wait would never finish there.
    fn delay(&mut self, duration: Duration) {
        let cycles = (duration.as_millis() as u32).saturating_mul(self.cycles_per_ms());
        cortex_m::asm::delay(cycles);
    }
}

impl KeypadHal for Stm32Board {
    type Gpio = Self;
    type Lines = Self;
    type Clock = Self;

    fn gpio(&mut self) -> &mut Self {
        self
    }

    fn lines(&mut self) -> &mut Self {
        self
    }

    fn clock(&mut self) -> &mut Self {
        self
    }
}

// ========================================
// Status LED
// ========================================

/// Push-pull LED on a board pin
pub struct LedPin {
    board: Stm32Board,
    pin: PinId,
}

impl LedPin {
    pub fn new(mut board: Stm32Board, pin: PinId) -> Result<Self, HalError> {
        board.configure(pin, Direction::Output, Pull::None)?;
        board.reset(pin)?;
        Ok(Self { board, pin })
    }

    fn is_driven_high(&self) -> bool {
        let odr = unsafe { read_reg(port_base(self.pin) + GPIO_ODR) };
        odr & self.pin.mask() as u32 != 0
    }
}

impl ErrorType for LedPin {
    type Error = Infallible;
}

impl OutputPin for LedPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        // Pin was range-checked in `new`
        self.board.reset(self.pin).ok();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.board.set(self.pin).ok();
        Ok(())
    }
}

impl StatefulOutputPin for LedPin {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.is_driven_high())
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.is_driven_high())
    }
}

// ========================================
// Serial console
// ========================================

/// Transmit-only USART2 console on PA2
pub struct Usart2Console {
    _private: (),
}

impl Usart2Console {
    /// Route PA2 to USART2 and enable the transmitter at `baud`
    pub fn new(sysclk_hz: u32, baud: u32) -> Self {
        let tx = pins::UART_TX;
        let shift = tx.pin as u32;
        enable_port_clock(tx);

        unsafe {
            modify_reg(RCC_BASE + RCC_APB1ENR1, 0, RCC_APB1ENR1_USART2EN);

            let base = port_base(tx);
            modify_reg(base + GPIO_AFRL, 0xF << (shift * 4), USART2_TX_AF << (shift * 4));
            modify_reg(base + GPIO_MODER, 0b11 << (shift * 2), MODER_ALTERNATE << (shift * 2));

            write_reg(USART2_BASE + USART_CR1, 0);
            write_reg(USART2_BASE + USART_BRR, sysclk_hz / baud);
            write_reg(USART2_BASE + USART_CR1, USART_CR1_UE | USART_CR1_TE);
        }

        Self { _private: () }
    }

    /// Blocking single-byte transmit
    pub fn write_byte(&mut self, byte: u8) {
        unsafe {
            while read_reg(USART2_BASE + USART_ISR) & USART_ISR_TXE == 0 {}
            write_reg(USART2_BASE + USART_TDR, byte as u32);
        }
    }
}

impl core::fmt::Write for Usart2Console {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        s.bytes().for_each(|b| self.write_byte(b));
        Ok(())
    }
}

/// Pin assignments for the reference board
pub mod pins {
    use keypad_core::types::{KeyMatrixConfig, PinId, Port, REFERENCE_MATRIX};

    /// Rows PA10 PB3 PB5 PB4, columns PB10 PA8 PA9 PC7
    pub const KEYPAD: KeyMatrixConfig<4, 4> = REFERENCE_MATRIX;

    /// Blue user button, active low
    pub const USER_BUTTON: PinId = PinId::new(Port::C, 13);

    /// Green user LED
    pub const HEARTBEAT_LED: PinId = PinId::new(Port::A, 5);

    /// ST-LINK virtual COM port
    pub const UART_TX: PinId = PinId::new(Port::A, 2);
}

/// Timing constants
pub mod timing {
    /// HSI16 with no PLL
    pub const SYSCLK_HZ: u32 = 16_000_000;

    /// SysTick rate, matching the embassy tick rate
    pub const SYSTICK_HZ: u32 = 1_000;

    pub const CONSOLE_BAUD: u32 = 115_200;

    pub const HEARTBEAT_MS: u64 = 500;
}

/// Memory configuration
pub mod memory {
    /// Unread key presses kept before the oldest is overwritten
    pub const KEY_QUEUE_SIZE: usize = keypad_core::KEYPAD_QUEUE_SLOTS;
}
