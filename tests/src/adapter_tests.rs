//! Driving the keypad through embedded-hal pins

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;

    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};
    use embedded_hal_mock::eh1::MockError;
    use keypad_core::{
        Duration, EmbeddedHalGpio, HalError, Instant, KeyEvent, KeyMatrixConfig, KeyQueue,
        KeypadDriver, KeypadError, KeypadParts, NoOpInterruptLines, PinId, Port, TimeSource,
        DEBOUNCE_TICKS,
    };

    /// Clock that only moves when delayed
    #[derive(Default)]
    struct StepClock {
        ms: u64,
    }

    impl TimeSource for StepClock {
        fn now(&self) -> Instant {
            Instant::from_millis(self.ms)
        }

        fn delay(&mut self, duration: Duration) {
            self.ms += duration.as_millis();
        }
    }

    const ROW: PinId = PinId::new(Port::B, 0);
    const COL_X: PinId = PinId::new(Port::B, 1);
    const COL_Y: PinId = PinId::new(Port::B, 2);

    fn config() -> KeyMatrixConfig<1, 2> {
        KeyMatrixConfig::new([ROW], [COL_X, COL_Y], [*b"xy"])
    }

    #[test]
    fn test_poll_keypad_over_embedded_hal_pins() {
        let ticks = DEBOUNCE_TICKS as usize;

        let mut row_expect = vec![Transaction::set(State::High)];
        for _ in 0..ticks {
            row_expect.push(Transaction::set(State::Low));
            row_expect.push(Transaction::set(State::High));
        }
        let row = PinMock::new(&row_expect);
        let col_x = PinMock::new(&vec![Transaction::get(State::High); ticks]);
        let col_y = PinMock::new(&vec![Transaction::get(State::Low); ticks]);

        let mut checks = [row.clone(), col_x.clone(), col_y.clone()];

        let gpio = EmbeddedHalGpio::new([row], [ROW], [col_x, col_y], [COL_X, COL_Y]);
        let queue: KeyQueue<4> = KeyQueue::new();
        let mut driver = KeypadDriver::poll(
            KeypadParts::new(gpio, NoOpInterruptLines, StepClock::default()),
            &queue,
        );
        driver.init(&config()).unwrap();

        let confirmed: Vec<KeyEvent> = (0..ticks)
            .filter_map(|_| driver.scan_tick().unwrap())
            .collect();
        assert_eq!(confirmed, vec![KeyEvent(b'y')]);
        assert_eq!(driver.try_read_key(), Some(KeyEvent(b'y')));

        for pin in checks.iter_mut() {
            pin.done();
        }
    }

    #[test]
    fn test_pin_error_is_reported_and_row_released() {
        let row = PinMock::new(&[
            Transaction::set(State::High),
            Transaction::set(State::Low),
            Transaction::set(State::High),
        ]);
        let col_x = PinMock::new(&[
            Transaction::get(State::High).with_error(MockError::Io(ErrorKind::Other)),
        ]);
        let col_y = PinMock::new(&Vec::<Transaction>::new());

        let mut checks = [row.clone(), col_x.clone(), col_y.clone()];

        let gpio = EmbeddedHalGpio::new([row], [ROW], [col_x, col_y], [COL_X, COL_Y]);
        let queue: KeyQueue<4> = KeyQueue::new();
        let mut driver = KeypadDriver::poll(
            KeypadParts::new(gpio, NoOpInterruptLines, StepClock::default()),
            &queue,
        );
        driver.init(&config()).unwrap();

        assert_eq!(driver.scan_tick(), Err(KeypadError::Hal(HalError::GpioError)));

        for pin in checks.iter_mut() {
            pin.done();
        }
    }
}
