//! End-to-end scenarios for the interrupt-driven keypad

#[cfg(test)]
mod tests {
    use keypad_core::test_utils::{tap, KeypadSimulator, Step};
    use keypad_core::{
        reference_config, ExtiVector, HalError, IrqOutcome, KeyEvent, KeyQueue, KeypadError,
        Level, ScanMode, KEYPAD_QUEUE_SLOTS,
    };
    use rstest::rstest;

    type Queue = KeyQueue<KEYPAD_QUEUE_SLOTS>;

    // Columns PB10, PA8, PA9, PC7
    const COLUMN_LINES: u16 = (1 << 10) | (1 << 8) | (1 << 9) | (1 << 7);

    fn simulator(queue: &Queue) -> KeypadSimulator<'_, 4, 4, KEYPAD_QUEUE_SLOTS> {
        KeypadSimulator::new(ScanMode::Interrupt, &reference_config(), queue).unwrap()
    }

    #[test]
    fn test_reference_scenario_eight_held_then_released() {
        let queue = Queue::new();
        let mut sim = simulator(&queue);

        sim.run(&tap(2, 1, 25, 5)).unwrap();

        assert_eq!(sim.driver().try_read_key(), Some(KeyEvent(b'8')));
        assert_eq!(sim.driver().try_read_key(), None);
        assert_eq!(sim.entries(), &[IrqOutcome::Key(KeyEvent(b'8'))]);
    }

    #[rstest]
    #[case(0, 0, b'1', ExtiVector::Exti15_10)]
    #[case(1, 0, b'4', ExtiVector::Exti15_10)]
    #[case(0, 1, b'2', ExtiVector::Exti9_5)]
    #[case(2, 2, b'9', ExtiVector::Exti9_5)]
    #[case(3, 3, b'D', ExtiVector::Exti9_5)]
    fn test_each_column_vector(
        #[case] row: usize,
        #[case] col: usize,
        #[case] symbol: u8,
        #[case] vector: ExtiVector,
    ) {
        let queue = Queue::new();
        let mut sim = simulator(&queue);

        sim.board().press(row, col);
        assert_eq!(sim.board().firing_vector(), Some(vector));

        let outcome = sim.driver_mut().on_interrupt(vector).unwrap();
        assert_eq!(outcome, IrqOutcome::Key(KeyEvent(symbol)));
        assert_eq!(sim.board().enabled_mask(), COLUMN_LINES);
    }

    #[test]
    fn test_long_hold_does_not_refire() {
        let queue = Queue::new();
        let mut sim = simulator(&queue);

        sim.run(&[Step::Press(1, 3), Step::Ticks(1000)]).unwrap();

        assert_eq!(sim.entries().len(), 1);
        assert_eq!(sim.drain(), vec![KeyEvent(b'B')]);
    }

    #[test]
    fn test_bounce_during_settle_is_absorbed() {
        let queue = Queue::new();
        let mut sim = simulator(&queue);

        sim.run(&[Step::Bounce(true)]).unwrap();
        sim.run(&tap(0, 2, 10, 10)).unwrap();

        assert_eq!(sim.drain(), vec![KeyEvent(b'3')]);
        assert_eq!(sim.board().firing_vector(), None);
    }

    #[test]
    fn test_every_entry_restores_enables() {
        let queue = Queue::new();
        let mut sim = simulator(&queue);

        let script = [
            Step::Press(0, 0),
            Step::Ticks(3),
            Step::ReleaseAll,
            Step::Press(3, 1),
            Step::Press(3, 2),
            Step::Ticks(3),
            Step::ReleaseAll,
        ];
        sim.run(&script).unwrap();

        let board = sim.board();
        assert_eq!(board.enabled_mask(), COLUMN_LINES);
        // init enabled each column once; every entry disables and re-enables all four
        assert_eq!(board.enable_calls(), 4 + board.disable_calls());
    }

    #[test]
    fn test_enable_symmetry_when_scan_fails() {
        let queue = Queue::new();
        let mut sim = simulator(&queue);

        sim.board().set_fail_reads(true);
        let result = sim.press(2, 0);

        assert_eq!(result, Err(KeypadError::Hal(HalError::GpioError)));
        assert_eq!(sim.board().enabled_mask(), COLUMN_LINES);
        assert_eq!(sim.board().firing_vector(), None);

        // Recovers once reads work again
        sim.board().set_fail_reads(false);
        sim.run(&[Step::ReleaseAll, Step::Press(2, 0)]).unwrap();
        assert_eq!(sim.drain(), vec![KeyEvent(b'7')]);
    }

    #[test]
    fn test_released_before_settle_yields_no_key() {
        let queue = Queue::new();
        let mut sim = simulator(&queue);

        sim.board().press(1, 1);
        sim.board().release_all();
        let outcome = sim.driver_mut().on_interrupt(ExtiVector::Exti9_5).unwrap();

        assert_eq!(outcome, IrqOutcome::NoKey);
        assert!(sim.drain().is_empty());
        assert_eq!(sim.board().enabled_mask(), COLUMN_LINES);
    }

    #[test]
    fn test_redundant_shared_vector_entries() {
        let queue = Queue::new();
        let mut sim = simulator(&queue);

        // Two columns on EXTI9_5 latch before the handler runs
        sim.board().press(0, 1);
        sim.board().press(0, 2);
        let first = sim.driver_mut().on_interrupt(ExtiVector::Exti9_5).unwrap();
        let second = sim.driver_mut().on_interrupt(ExtiVector::Exti9_5).unwrap();

        assert_eq!(first, IrqOutcome::Key(KeyEvent(b'2')));
        assert_eq!(second, IrqOutcome::NotPending);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_button_on_shared_vector_is_not_consumed() {
        let queue = Queue::new();
        let mut sim = simulator(&queue);

        sim.board().raise_line(13);
        let outcome = sim.driver_mut().on_interrupt(ExtiVector::Exti15_10).unwrap();

        assert_eq!(outcome, IrqOutcome::NotPending);
        assert!(sim.board().is_line_pending(13));
        assert_eq!(sim.board().disable_calls(), 0);
    }

    #[test]
    fn test_rows_parked_low_between_scans_and_exclusive_while_sampling() {
        let queue = Queue::new();
        let mut sim = simulator(&queue);

        sim.run(&[Step::Press(0, 0), Step::Press(3, 3), Step::Ticks(2)]).unwrap();

        let board = sim.board();
        assert!((0..4).all(|r| board.row_level(r) == Level::Low));
        assert_eq!(board.max_rows_low_while_sampling(), 1);
    }

    #[test]
    fn test_failed_reinit_leaves_vectors_quiet() {
        let queue = Queue::new();
        let mut sim = simulator(&queue);

        let mut config = reference_config();
        config.keymap[0][0] = 0;
        assert!(sim.driver_mut().init(&config).is_err());
        assert!(!sim.driver().is_active());
        assert_eq!(sim.board().enabled_mask(), 0);

        sim.run(&tap(2, 1, 25, 5)).unwrap();

        assert!(sim.entries().is_empty());
        assert!(sim.drain().is_empty());
        assert_eq!(sim.board().firing_vector(), None);
    }

    #[test]
    fn test_wrong_mode_entry_point() {
        let queue = Queue::new();
        let mut sim = simulator(&queue);

        assert_eq!(
            sim.driver_mut().scan_tick(),
            Err(KeypadError::WrongMode(ScanMode::Interrupt))
        );
    }
}
