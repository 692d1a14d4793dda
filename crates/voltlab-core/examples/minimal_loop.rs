//! Minimal circuit example: a cell, a switch, and a bulb in one loop.
//!
//! Builds the loop, closes the switch, and runs 10 ticks. After each tick,
//! queries and prints the component state.
//!
//! Run with: `cargo run -p voltlab-core --example minimal_loop`

use voltlab_core::component::{ComponentKind, Position};
use voltlab_core::control::{Control, SimulationStrategy};
use voltlab_core::wire::WireSpec;

fn main() {
    let mut control = Control::new(SimulationStrategy::Tick);

    // --- Step 1: Place the components ---

    let cell = control
        .create(ComponentKind::Cell, Position::new(0.0, 0.0))
        .expect("create cell");
    let switch = control
        .create(ComponentKind::Switch, Position::new(1.0, 0.0))
        .expect("create switch");
    let bulb = control
        .create(ComponentKind::Bulb, Position::new(2.0, 0.0))
        .expect("create bulb");

    // --- Step 2: Wire the loop ---

    for (from, to) in [(cell, switch), (switch, bulb), (bulb, cell)] {
        control
            .connect(from, to, Vec::new(), WireSpec::ideal())
            .expect("connect");
    }

    // The switch starts open, so the loop is dark until we close it.
    let closed = control.toggle_switch(switch).expect("toggle switch");
    println!("Switch closed: {closed}\n");

    // --- Step 3: Run the simulation ---

    println!("Running 10 ticks of the minimal loop...\n");

    for tick in 0..10 {
        control.step().expect("step");

        println!("=== Tick {} ===", tick + 1);
        for snap in control.network.component_snapshots() {
            println!(
                "  {}: current={:.3} A, drop={:.3} V, power={:.3} W, on={}",
                snap.label, snap.current, snap.voltage_drop, snap.power_watts, snap.on
            );
        }
        println!();
    }

    // --- Step 4: Final circuit summary ---

    if let Some(root) = control.network.root_snapshot() {
        println!(
            "Root circuit: {:.3} ohm, {:.3} V, {:.3} A, {:.3} W",
            root.resistance, root.voltage, root.current, root.power_watts
        );
    }
}
