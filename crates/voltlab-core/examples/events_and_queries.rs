//! Events and queries example: fault listeners and the snapshot API.
//!
//! Builds a cell -> fuse -> bulb loop, registers listeners for blown
//! components and broken circuits, then cranks the cell voltage until the
//! fuse pops. Demonstrates both listener delivery and the query surface.
//!
//! Run with: `cargo run -p voltlab-core --example events_and_queries`

use std::cell::RefCell;
use std::rc::Rc;

use voltlab_core::component::{ComponentKind, Position};
use voltlab_core::control::{Control, SimulationStrategy};
use voltlab_core::event::{Event, EventKind};
use voltlab_core::wire::WireSpec;

fn main() {
    let mut control = Control::new(SimulationStrategy::Tick);

    // --- Build the loop: cell -> fuse -> bulb ---

    let cell = control
        .create(ComponentKind::Cell, Position::new(0.0, 0.0))
        .expect("create cell");
    let fuse = control
        .create(ComponentKind::Fuse, Position::new(1.0, 0.0))
        .expect("create fuse");
    let bulb = control
        .create(ComponentKind::Bulb, Position::new(2.0, 0.0))
        .expect("create bulb");

    for (from, to) in [(cell, fuse), (fuse, bulb), (bulb, cell)] {
        control
            .connect(from, to, Vec::new(), WireSpec::ideal())
            .expect("connect");
    }

    // --- Register listeners ---

    // Count blown components through a shared cell.
    let blown = Rc::new(RefCell::new(0u32));
    let counter = blown.clone();
    control.network.events.on(
        EventKind::ComponentBlown,
        Box::new(move |event| {
            if let Event::ComponentBlown { component, tick } = event {
                println!("  !! component {component:?} blew at tick {tick}");
                *counter.borrow_mut() += 1;
            }
        }),
    );

    let breaks = Rc::new(RefCell::new(0u32));
    let break_counter = breaks.clone();
    control.network.events.on(
        EventKind::CircuitBroken,
        Box::new(move |_event| {
            *break_counter.borrow_mut() += 1;
        }),
    );

    // --- Run at normal voltage, then overdrive ---

    println!("Running at 1.5 V (bulb draws 0.25 A, fuse holds 3 A)...\n");

    for tick in 0..5 {
        control.step().expect("step");
        let snap = control
            .network
            .component_snapshot(bulb)
            .expect("bulb snapshot");
        println!(
            "=== Tick {} === bulb: {:.3} A, {:.3} W, on={}",
            tick + 1,
            snap.current,
            snap.power_watts,
            snap.on
        );
    }

    println!("\nCranking the cell to 24 V (4 A exceeds the fuse rating)...\n");
    control.set_voltage(cell, 24.0).expect("set voltage");

    for tick in 5..10 {
        control.step().expect("step");
        let snap = control
            .network
            .component_snapshot(fuse)
            .expect("fuse snapshot");
        println!(
            "=== Tick {} === fuse: {:.3} A, blown={}",
            tick + 1,
            snap.current,
            snap.blown
        );
    }

    // --- Final queries ---

    println!("\nBlown components: {}", blown.borrow());
    println!("Circuit breaks:   {}", breaks.borrow());
    println!(
        "Blown events emitted in total: {}",
        control.network.events.total_emitted(EventKind::ComponentBlown)
    );

    if let Some(root) = control.network.root_snapshot() {
        println!(
            "Root circuit now: broken={}, caused by {:?}",
            root.broken, root.broken_by
        );
    }
}
