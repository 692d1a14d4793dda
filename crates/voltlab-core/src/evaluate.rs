//! The per-tick evaluation pipeline.
//!
//! One tick runs in fixed phases:
//!
//! 1. zero all currents, then recompute the root circuit's resistance,
//!    voltage, and current, and push the current onto root members;
//! 2. cascade from the head power source forward along wires, visiting every
//!    reachable component once: fault check first, then the kind-specific
//!    hook (AC flip, motor spin, diode lock, capacitor step, branch split);
//! 3. sweep up time-integrating components the cascade could not reach, so a
//!    capacitor keeps discharging even while its circuit is dark;
//! 4. deliver buffered events to listeners.
//!
//! A power source found below the root circuit is a configuration error
//! fatal to the tick; the tick counter does not advance past it.

use std::collections::HashSet;

use crate::component::{ComponentKind, RoleState};
use crate::control::Control;
use crate::event::Event;
use crate::id::{ComponentId, WireId};
use crate::network::Network;
use crate::units::{MOTOR_DEGREES_PER_AMP_TICK, Ticks};

// ---------------------------------------------------------------------------
// Tick context and errors
// ---------------------------------------------------------------------------

/// Per-tick scratch state, built fresh each tick and threaded through the
/// cascade by reference. Nothing in here survives the tick.
#[derive(Debug)]
pub struct TickContext {
    pub tick: Ticks,
    pub seconds_per_tick: f64,
    pub root_resistance: f64,
    pub root_voltage: f64,
    pub root_current: f64,
    /// Components already evaluated this tick. Guards against both cycles
    /// and double-stepping time integrators.
    pub(crate) visited: HashSet<ComponentId>,
}

/// Errors fatal to a tick. The graph keeps its last good state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("power source {component:?} found below the root circuit")]
    SourceBelowRoot { component: ComponentId },

    #[error("the simulation has been torn down")]
    TornDown,
}

// ---------------------------------------------------------------------------
// Fault check
// ---------------------------------------------------------------------------

impl Network {
    /// Blow a component whose current magnitude exceeds its rating. The flag
    /// is sticky and the notification fires exactly once. An already-broken
    /// circuit shields its remaining members: the first component to pop cuts
    /// the flow, so nothing downstream of it blows in the same tick.
    pub(crate) fn blow_check(&mut self, id: ComponentId) {
        let Some(comp) = self.components.get(id) else {
            return;
        };
        if comp.blown || comp.current.abs() <= comp.max_current {
            return;
        }
        let circuit = comp.circuit;
        if self.is_broken(circuit) {
            return;
        }

        if let Some(comp) = self.components.get_mut(id) {
            comp.blown = true;
        }
        let tick = self.events.tick();
        self.events.emit(Event::ComponentBlown {
            component: id,
            tick,
        });
        self.break_circuit(circuit, id);
    }
}

// ---------------------------------------------------------------------------
// Cascade
// ---------------------------------------------------------------------------

impl Control {
    /// Run one evaluation pass over the whole network.
    pub(crate) fn run_tick(&mut self) -> Result<(), EvalError> {
        let tick = self.sim.tick;
        self.network.events.set_tick(tick);
        self.network.zero_all_currents();

        let root = self.network.root();
        let resistance = self.network.circuit_resistance(root);
        let voltage = self.network.circuit_voltage(root);
        let current = self.network.circuit_current(root);
        self.network.set_circuit_current(root, current);

        let mut ctx = TickContext {
            tick,
            seconds_per_tick: self.seconds_per_tick(),
            root_resistance: resistance,
            root_voltage: voltage,
            root_current: current,
            visited: HashSet::new(),
        };

        if let Some(head) = self.head() {
            self.eval_component(head, head, &mut ctx)?;
        }

        // Time integrators run exactly once per tick even when the cascade
        // never reaches them (dark circuit, no head).
        let pending: Vec<ComponentId> = self
            .network
            .component_ids()
            .filter(|id| !ctx.visited.contains(id))
            .filter(|id| {
                self.network
                    .component(*id)
                    .is_some_and(|c| c.caps.accumulates_time)
            })
            .collect();
        for id in pending {
            ctx.visited.insert(id);
            self.eval_steps(id, &mut ctx)?;
        }

        self.network.events.deliver();
        Ok(())
    }

    /// Evaluate one component and cascade forward along its output wires.
    fn eval_component(
        &mut self,
        id: ComponentId,
        head: ComponentId,
        ctx: &mut TickContext,
    ) -> Result<(), EvalError> {
        if !ctx.visited.insert(id) {
            return Ok(());
        }
        self.eval_steps(id, ctx)?;

        let outputs: Vec<WireId> = self
            .network
            .component(id)
            .map(|c| c.outputs.clone())
            .unwrap_or_default();
        for wire in outputs {
            let Some(dest) = self.network.wire(wire).map(|w| w.dest) else {
                continue;
            };
            // Arriving back at the head closes the loop.
            if dest == head {
                continue;
            }
            self.eval_component(dest, head, ctx)?;
        }
        Ok(())
    }

    /// The per-component evaluation steps: structure check, fault check,
    /// kind-specific hook.
    fn eval_steps(&mut self, id: ComponentId, ctx: &mut TickContext) -> Result<(), EvalError> {
        let Some(comp) = self.network.component(id) else {
            return Ok(());
        };
        let kind = comp.kind;
        let depth = self
            .network
            .circuit(comp.circuit)
            .map_or(0, |c| c.depth);
        if comp.caps.power_source && depth > 0 {
            return Err(EvalError::SourceBelowRoot { component: id });
        }

        self.network.blow_check(id);

        match kind {
            ComponentKind::AcSource => self.step_ac_source(id, ctx.tick),
            ComponentKind::Motor => self.step_motor(id),
            ComponentKind::Diode | ComponentKind::Led => self.network.check_diode(id),
            ComponentKind::Capacitor => {
                let head = self.head();
                self.network
                    .step_capacitor(id, head, ctx.tick, ctx.seconds_per_tick);
            }
            ComponentKind::Selector | ComponentKind::Splitter => self.network.split_current(id),
            _ => {}
        }
        Ok(())
    }

    /// Flip an AC source's polarity on its half-period cadence and let locked
    /// diodes reconsider.
    fn step_ac_source(&mut self, id: ComponentId, tick: Ticks) {
        let Some(half) = self
            .network
            .component(id)
            .and_then(|c| c.role.as_source())
            .and_then(|s| s.half_period)
        else {
            return;
        };
        if tick == 0 || half == 0 || tick % half != 0 {
            return;
        }

        if let Some(source) = self
            .network
            .component_mut(id)
            .and_then(|c| c.role.as_source_mut())
        {
            source.flip();
        }
        let stamp = self.network.events.tick();
        self.network.events.emit(Event::SourceFlipped {
            component: id,
            tick: stamp,
        });
        self.network.settle_diodes();
    }

    /// Advance a motor shaft in proportion to the current through it.
    fn step_motor(&mut self, id: ComponentId) {
        if let Some(comp) = self.network.component_mut(id) {
            let amps = comp.current;
            if let RoleState::Motor(m) = &mut comp.role {
                m.angle_degrees =
                    (m.angle_degrees + amps * MOTOR_DEGREES_PER_AMP_TICK).rem_euclid(360.0);
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
