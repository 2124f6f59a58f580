//! End-to-end scenarios for the poll-driven keypad

#[cfg(test)]
mod tests {
    use keypad_core::test_utils::{tap, KeypadSimulator, Step};
    use keypad_core::{
        reference_config, KeyEvent, KeyQueue, ScanMode, DEBOUNCE_TICKS, KEYPAD_QUEUE_SLOTS,
    };
    use rstest::rstest;

    type Queue = KeyQueue<KEYPAD_QUEUE_SLOTS>;

    fn simulator(queue: &Queue) -> KeypadSimulator<'_, 4, 4, KEYPAD_QUEUE_SLOTS> {
        KeypadSimulator::new(ScanMode::Poll, &reference_config(), queue).unwrap()
    }

    #[test]
    fn test_reference_scenario_eight_held_then_released() {
        let queue = Queue::new();
        let mut sim = simulator(&queue);

        sim.run(&tap(2, 1, 25, 5)).unwrap();

        assert_eq!(sim.driver().try_read_key(), Some(KeyEvent(b'8')));
        for _ in 0..10 {
            assert_eq!(sim.driver().try_read_key(), None);
        }
    }

    #[rstest]
    #[case(1)]
    #[case(5)]
    #[case(DEBOUNCE_TICKS as u32 - 1)]
    fn test_short_hold_produces_nothing(#[case] hold: u32) {
        let queue = Queue::new();
        let mut sim = simulator(&queue);

        sim.run(&tap(0, 0, hold, 10)).unwrap();

        assert!(sim.confirmed().is_empty());
        assert!(sim.drain().is_empty());
    }

    #[rstest]
    #[case(DEBOUNCE_TICKS as u32)]
    #[case(DEBOUNCE_TICKS as u32 + 1)]
    #[case(100)]
    #[case(DEBOUNCE_TICKS as u32 + 1000)]
    fn test_sustained_hold_produces_exactly_one(#[case] hold: u32) {
        let queue = Queue::new();
        let mut sim = simulator(&queue);

        sim.run(&tap(1, 2, hold, 3)).unwrap();

        assert_eq!(sim.drain(), vec![KeyEvent(b'6')]);
    }

    #[rstest]
    #[case(0, 0, b'1')]
    #[case(0, 3, b'A')]
    #[case(1, 1, b'5')]
    #[case(2, 2, b'9')]
    #[case(3, 0, b'*')]
    #[case(3, 1, b'0')]
    #[case(3, 2, b'#')]
    #[case(3, 3, b'D')]
    fn test_every_position_decodes(#[case] row: usize, #[case] col: usize, #[case] symbol: u8) {
        let queue = Queue::new();
        let mut sim = simulator(&queue);

        sim.run(&tap(row, col, 30, 2)).unwrap();

        assert_eq!(sim.drain(), vec![KeyEvent(symbol)]);
    }

    #[test]
    fn test_typing_a_sequence() {
        let queue = Queue::new();
        let mut sim = simulator(&queue);

        // "1", "5", "9", "#"
        for (row, col) in [(0, 0), (1, 1), (2, 2), (3, 2)] {
            sim.run(&tap(row, col, 40, 15)).unwrap();
        }

        let typed: Vec<char> = sim.drain().iter().map(|k| k.as_char()).collect();
        assert_eq!(typed, vec!['1', '5', '9', '#']);
    }

    #[test]
    fn test_chatter_before_settling_confirms_once() {
        let queue = Queue::new();
        let mut sim = simulator(&queue);

        // Contact chatter: short closures separated by single open ticks
        for _ in 0..6 {
            sim.run(&[Step::Press(2, 3), Step::Ticks(3), Step::Release(2, 3), Step::Ticks(1)])
                .unwrap();
        }
        assert!(sim.confirmed().is_empty());

        sim.run(&tap(2, 3, 25, 5)).unwrap();
        assert_eq!(sim.drain(), vec![KeyEvent(b'C')]);
    }

    #[test]
    fn test_rows_never_driven_low_together() {
        let queue = Queue::new();
        let mut sim = simulator(&queue);

        let script = [
            Step::Press(0, 1),
            Step::Press(3, 3),
            Step::Ticks(50),
            Step::ReleaseAll,
            Step::Ticks(5),
        ];
        sim.run(&script).unwrap();

        assert_eq!(sim.board().max_rows_low(), 1);
        assert_eq!(sim.board().max_rows_low_while_sampling(), 1);
    }

    #[test]
    fn test_unread_keys_overrun_oldest_first() {
        let queue = Queue::new();
        let mut sim = simulator(&queue);

        for _ in 0..KEYPAD_QUEUE_SLOTS + 2 {
            sim.run(&tap(0, 1, 20, 1)).unwrap();
        }
        sim.run(&tap(3, 3, 20, 1)).unwrap();

        let keys = sim.drain();
        assert_eq!(keys.len(), KEYPAD_QUEUE_SLOTS);
        assert_eq!(keys.last(), Some(&KeyEvent(b'D')));
        assert_eq!(queue.dropped(), 3);
    }

    #[test]
    fn test_invalid_config_stays_inert() {
        let queue = Queue::new();
        let mut config = reference_config();
        config.keymap[0][0] = 0;

        assert!(KeypadSimulator::new(ScanMode::Poll, &config, &queue).is_err());
        assert!(queue.is_empty());
    }
}
