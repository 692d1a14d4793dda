//! Save/load example: serialization round-trip.
//!
//! Builds an AC rig with a selector and a motor, runs 30 ticks, serializes
//! the document to bytes, restores it into a fresh control, and verifies
//! both simulations continue identically.
//!
//! Run with: `cargo run -p voltlab-core --example save_load`

use voltlab_core::component::{ComponentKind, Position};
use voltlab_core::control::{Control, SimulationStrategy};
use voltlab_core::wire::WireSpec;

/// AC source -> selector -> two resistive branches -> merge -> motor.
fn build_rig() -> Control {
    let mut control = Control::with_seed(SimulationStrategy::Tick, 42);

    let place = |c: &mut Control, kind, x| {
        c.create(kind, Position::new(x, 0.0)).expect("create")
    };

    let source = place(&mut control, ComponentKind::AcSource, 0.0);
    let fork = place(&mut control, ComponentKind::Selector, 1.0);
    let upper = place(&mut control, ComponentKind::Resistor, 2.0);
    let lower = place(&mut control, ComponentKind::Heater, 2.0);
    let merge = place(&mut control, ComponentKind::Merge, 3.0);
    let motor = place(&mut control, ComponentKind::Motor, 4.0);

    for (from, to) in [
        (source, fork),
        (fork, upper),
        (fork, lower),
        (upper, merge),
        (lower, merge),
        (merge, motor),
        (motor, source),
    ] {
        control
            .connect(from, to, Vec::new(), WireSpec::ideal())
            .expect("connect");
    }

    // Flip every 10 ticks instead of the 60-tick default, so the 30-tick
    // runs below cover several polarity reversals.
    control
        .network
        .component_mut(source)
        .expect("source exists")
        .role
        .as_source_mut()
        .expect("source role")
        .half_period = Some(10);

    control
}

fn main() {
    // --- Step 1: Build and run ---

    let mut original = build_rig();

    println!("Running 30 ticks...\n");
    for _ in 0..30 {
        original.step().expect("step");
    }
    println!("Tick count: {}", original.tick());

    // --- Step 2: Serialize ---

    let bytes = original.serialize().expect("serialization should succeed");
    println!("Serialized to {} bytes", bytes.len());

    // --- Step 3: Restore ---

    let mut restored = Control::deserialize(&bytes).expect("deserialization should succeed");
    println!("Restored tick count: {}", restored.tick());
    assert_eq!(original.tick(), restored.tick(), "tick counts should match");

    // --- Step 4: Verify both continue identically ---

    for _ in 0..30 {
        original.step().expect("step");
        restored.step().expect("step");
    }

    let left = original.network.component_snapshots();
    let right = restored.network.component_snapshots();
    assert_eq!(left, right, "snapshots should match after save/load");

    println!("\nAfter 30 more ticks on both:");
    for (a, b) in left.iter().zip(right.iter()) {
        println!(
            "  {}: original {:.4} A, restored {:.4} A",
            a.label, a.current, b.current
        );
    }

    println!("\nSave/load round trip verified successfully.");
}
