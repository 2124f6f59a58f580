// Host-side smoke run of the reference keypad in both detection modes

use keypad_core::test_utils::{tap, KeypadSimulator};
use keypad_core::{reference_config, KeyQueue, ScanMode, KEYPAD_QUEUE_SLOTS};

fn main() {
    println!("🧪 Keypad Integration Smoke Run");

    for mode in [ScanMode::Poll, ScanMode::Interrupt] {
        run_reference_scenario(mode);
    }

    println!("✅ All smoke scenarios passed!");
    println!();
    println!("📝 Run the full suite with: cargo test");
}

/// Press '8' for 25 ticks, release for 5, then type "159#"
fn run_reference_scenario(mode: ScanMode) {
    println!("⌨️ {:?} mode", mode);

    let queue: KeyQueue<KEYPAD_QUEUE_SLOTS> = KeyQueue::new();
    let mut sim = match KeypadSimulator::new(mode, &reference_config(), &queue) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("❌ init failed: {}", e);
            std::process::exit(1);
        }
    };

    let mut script = Vec::new();
    script.extend(tap(2, 1, 25, 5));
    for (row, col) in [(0, 0), (1, 1), (2, 2), (3, 2)] {
        script.extend(tap(row, col, 30, 10));
    }

    if let Err(e) = sim.run(&script) {
        eprintln!("❌ scenario failed: {}", e);
        std::process::exit(1);
    }

    let typed: String = sim.drain().iter().map(|k| k.as_char()).collect();
    println!("  ✓ typed {:?}", typed);
    assert_eq!(typed, "8159#");
    assert_eq!(queue.dropped(), 0);
}
