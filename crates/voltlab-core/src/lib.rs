//! VoltLab Core -- the evaluation engine for virtual electrical circuits.
//!
//! This crate provides the component/wire/circuit arena, the
//! series-parallel resistance solver, the per-tick evaluation cascade,
//! wire-graph tracing, events, queries, and versioned serialization that a
//! circuit sandbox builds on.
//!
//! # Tick Pipeline
//!
//! Each call to [`control::Control::step`] advances the simulation by one
//! tick through the following phases:
//!
//! 1. **Reset** -- Zero every component current from the previous tick.
//! 2. **Solve** -- Recompute the root circuit's combined resistance,
//!    driving voltage, and current, and push the current onto root members.
//! 3. **Cascade** -- Walk forward from the head power source along wires,
//!    running each component's fault check and kind hook (AC flip, motor
//!    spin, diode lock, capacitor transient, branch split).
//! 4. **Sweep** -- Step time-integrating components the cascade missed, so
//!    a charged capacitor keeps discharging inside a dark loop.
//! 5. **Deliver** -- Flush buffered events to listeners and advance the
//!    tick counter.
//!
//! # Key Types
//!
//! - [`control::Control`] -- Simulation coordinator: owns the network, the
//!   head designation, the RNG, and the stepping strategy.
//! - [`network::Network`] -- Arena of components, wires, and circuits, with
//!   the structural mutation API (connect, disconnect, remove).
//! - [`component::Component`] -- One part on the board: shared electrical
//!   state plus a kind-specific role.
//! - [`circuit::Circuit`] -- A series or parallel grouping with break
//!   bookkeeping; branches nest under fork connectors.
//! - [`trace`] -- Fewest-hops path and cycle searches over the wire graph.
//! - [`event::EventBus`] -- Subscription-based event bus with buffered
//!   delivery.
//! - [`serialize`] -- Versioned index-based persistence via bitcode.

pub mod capacitor;
pub mod circuit;
pub mod component;
pub mod connector;
pub mod control;
pub mod diode;
pub mod evaluate;
pub mod event;
pub mod id;
pub mod network;
pub mod query;
pub mod rng;
pub mod serialize;
pub mod solver;
pub mod trace;
pub mod units;
pub mod wire;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
