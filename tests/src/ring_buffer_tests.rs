//! Ring buffer and key queue behaviour under arbitrary traffic

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use keypad_core::{KeyEvent, KeyQueue, RingBuffer, KEYPAD_QUEUE_SLOTS};
    use proptest::prelude::*;
    use rstest::rstest;

    const CAP: usize = KEYPAD_QUEUE_SLOTS;

    /// Reference model: bounded deque that drops its front when full
    fn model_write(model: &mut VecDeque<u8>, value: u8) {
        if model.len() == CAP {
            model.pop_front();
        }
        model.push_back(value);
    }

    proptest! {
        /// Reads return values in write order, with the oldest dropped on
        /// overrun, for any interleaving of writes and reads
        #[test]
        fn prop_matches_bounded_fifo_model(
            ops in prop::collection::vec(prop::option::of(any::<u8>()), 0..200)
        ) {
            let mut rb: RingBuffer<u8, CAP> = RingBuffer::new(0);
            rb.init().unwrap();
            let mut model = VecDeque::new();
            let mut dropped = 0u32;

            for op in ops {
                match op {
                    Some(value) => {
                        if model.len() == CAP {
                            dropped += 1;
                        }
                        rb.write(value).unwrap();
                        model_write(&mut model, value);
                    }
                    None => prop_assert_eq!(rb.read(), model.pop_front()),
                }
                prop_assert_eq!(rb.count(), model.len());
                prop_assert_eq!(rb.is_empty(), model.is_empty());
                prop_assert_eq!(rb.is_full(), model.len() == CAP);
            }
            prop_assert_eq!(rb.dropped(), dropped);
        }

        /// Without overruns, every value comes back out in order
        #[test]
        fn prop_fifo_order_without_overrun(values in prop::collection::vec(any::<u8>(), 0..=CAP)) {
            let mut rb: RingBuffer<u8, CAP> = RingBuffer::new(0);
            for v in &values {
                rb.write(*v).unwrap();
            }
            let out: Vec<u8> = std::iter::from_fn(|| rb.read()).collect();
            prop_assert_eq!(out, values);
        }
    }

    #[test]
    fn test_overrun_keeps_newest_capacity_values() {
        let mut rb: RingBuffer<u8, CAP> = RingBuffer::new(0);
        rb.init().unwrap();

        for v in 0..=CAP as u8 {
            rb.write(v).unwrap();
        }
        let out: Vec<u8> = (0..CAP).filter_map(|_| rb.read()).collect();
        let expected: Vec<u8> = (1..=CAP as u8).collect();
        assert_eq!(out, expected);
        assert_eq!(rb.read(), None);
    }

    #[test]
    fn test_empty_full_boundary() {
        let mut rb: RingBuffer<u8, CAP> = RingBuffer::new(0);
        rb.init().unwrap();
        assert!(rb.is_empty());
        assert!(!rb.is_full());

        for n in 1..CAP {
            rb.write(n as u8).unwrap();
            assert_eq!(rb.count(), n);
        }
        assert!(!rb.is_empty());
        assert!(!rb.is_full());

        rb.write(0xFF).unwrap();
        assert!(rb.is_full());
        assert_eq!(rb.count(), CAP);

        for n in (0..CAP).rev() {
            rb.read().unwrap();
            assert_eq!(rb.count(), n);
        }
        assert!(rb.is_empty());
    }

    #[rstest]
    #[case(0, 0)]
    #[case(CAP - 1, 0)]
    #[case(CAP, 0)]
    #[case(CAP + 1, 1)]
    #[case(3 * CAP, 2 * CAP)]
    fn test_queue_overrun_accounting(#[case] pushes: usize, #[case] dropped: usize) {
        let queue: KeyQueue<CAP> = KeyQueue::new();
        queue.init().unwrap();

        for i in 0..pushes {
            queue.push(KeyEvent(b'0' + (i % 10) as u8)).unwrap();
        }
        assert_eq!(queue.dropped() as usize, dropped);
        assert_eq!(queue.len(), pushes.min(CAP));

        queue.flush();
        assert_eq!(queue.try_read_key(), None);
    }
}
