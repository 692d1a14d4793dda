//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::component::{ComponentKind, Position};
use crate::control::{Control, SimulationStrategy};
use crate::id::{ComponentId, WireId};
use crate::wire::WireSpec;

// ===========================================================================
// Coordinator constructors
// ===========================================================================

/// A tick-strategy coordinator with a fixed seed, so selector draws are
/// reproducible across runs.
pub fn control() -> Control {
    Control::with_seed(SimulationStrategy::Tick, 7)
}

// ===========================================================================
// Graph builders
// ===========================================================================

pub fn add(c: &mut Control, kind: ComponentKind) -> ComponentId {
    c.create(kind, Position::default()).expect("create component")
}

pub fn link(c: &mut Control, from: ComponentId, to: ComponentId) -> WireId {
    c.connect(from, to, Vec::new(), WireSpec::ideal())
        .expect("connect components")
}

pub fn step_n(c: &mut Control, n: usize) {
    for _ in 0..n {
        c.step().expect("step");
    }
}

// ===========================================================================
// Canonical rigs
// ===========================================================================

/// Cell -> load -> cell.
pub struct SeriesRig {
    pub control: Control,
    pub cell: ComponentId,
    pub load: ComponentId,
}

/// A single series loop with one load of the given kind.
pub fn build_series_loop(kind: ComponentKind) -> SeriesRig {
    let mut c = control();
    let cell = add(&mut c, ComponentKind::Cell);
    let load = add(&mut c, kind);
    link(&mut c, cell, load);
    link(&mut c, load, cell);
    SeriesRig {
        control: c,
        cell,
        load,
    }
}

/// Cell -> fork -> [first | second] -> merge -> cell.
pub struct ParallelRig {
    pub control: Control,
    pub cell: ComponentId,
    pub fork: ComponentId,
    pub first: ComponentId,
    pub second: ComponentId,
    pub merge: ComponentId,
}

/// Two resistive branches behind a fork. `fork_kind` is a splitter for a
/// plain parallel pair or a selector for an either/or pair.
pub fn build_parallel_pair(fork_kind: ComponentKind, r1: f64, r2: f64) -> ParallelRig {
    let mut c = control();
    let cell = add(&mut c, ComponentKind::Cell);
    let fork = add(&mut c, fork_kind);
    let first = add(&mut c, ComponentKind::Resistor);
    let second = add(&mut c, ComponentKind::Resistor);
    let merge = add(&mut c, ComponentKind::Merge);
    c.set_resistance(first, r1).expect("set resistance");
    c.set_resistance(second, r2).expect("set resistance");
    link(&mut c, cell, fork);
    link(&mut c, fork, first);
    link(&mut c, fork, second);
    link(&mut c, first, merge);
    link(&mut c, second, merge);
    link(&mut c, merge, cell);
    ParallelRig {
        control: c,
        cell,
        fork,
        first,
        second,
        merge,
    }
}

/// Cell -> switch -> resistor -> capacitor -> bulb -> cell.
pub struct CapacitorRig {
    pub control: Control,
    pub cell: ComponentId,
    pub switch: ComponentId,
    pub resistor: ComponentId,
    pub capacitor: ComponentId,
    pub bulb: ComponentId,
}

/// The classic RC demo: close the switch to charge the capacitor through
/// the resistor; the resistor dominates the supply path and so sets the
/// time constant.
pub fn build_capacitor_rig() -> CapacitorRig {
    let mut c = control();
    let cell = add(&mut c, ComponentKind::Cell);
    let switch = add(&mut c, ComponentKind::Switch);
    let resistor = add(&mut c, ComponentKind::Resistor);
    let capacitor = add(&mut c, ComponentKind::Capacitor);
    let bulb = add(&mut c, ComponentKind::Bulb);
    link(&mut c, cell, switch);
    link(&mut c, switch, resistor);
    link(&mut c, resistor, capacitor);
    link(&mut c, capacitor, bulb);
    link(&mut c, bulb, cell);
    CapacitorRig {
        control: c,
        cell,
        switch,
        resistor,
        capacitor,
        bulb,
    }
}

// ===========================================================================
// Benchmark-scale builders
// ===========================================================================

/// One long series loop of `n` resistors.
pub fn build_resistor_chain(n: usize) -> (Control, Vec<ComponentId>) {
    let mut c = control();
    let cell = add(&mut c, ComponentKind::Cell);
    let mut resistors = Vec::with_capacity(n);
    let mut prev = cell;
    for _ in 0..n {
        let r = add(&mut c, ComponentKind::Resistor);
        link(&mut c, prev, r);
        resistors.push(r);
        prev = r;
    }
    link(&mut c, prev, cell);
    (c, resistors)
}

/// `sections` fork/merge sections in series, each holding two resistive
/// branches. Exercises the branch solver and connector splitting.
pub fn build_ladder(sections: usize) -> Control {
    let mut c = control();
    let cell = add(&mut c, ComponentKind::Cell);
    let mut prev = cell;
    for _ in 0..sections {
        let fork = add(&mut c, ComponentKind::Splitter);
        let a = add(&mut c, ComponentKind::Resistor);
        let b = add(&mut c, ComponentKind::Resistor);
        let merge = add(&mut c, ComponentKind::Merge);
        link(&mut c, prev, fork);
        link(&mut c, fork, a);
        link(&mut c, fork, b);
        link(&mut c, a, merge);
        link(&mut c, b, merge);
        prev = merge;
    }
    link(&mut c, prev, cell);
    c
}
