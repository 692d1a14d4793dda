//! The root coordinator: owns the network, the tick counter, the designated
//! head power source, and the simulation RNG.
//!
//! All external mutation flows through here so that torn-down simulations
//! reject everything, the head stays valid, and randomized construction
//! (selector initial positions) draws from one deterministic stream.

use crate::component::{ComponentKind, Position, RoleState};
use crate::connector::BranchMode;
use crate::evaluate::EvalError;
use crate::event::Event;
use crate::id::{ComponentId, WireId};
use crate::network::{Network, NetworkError};
use crate::rng::SimRng;
use crate::units::{DEFAULT_SECONDS_PER_TICK, Ticks, clamp_resistance};
use crate::wire::WireSpec;

/// Seed used when the caller does not supply one.
pub const DEFAULT_SEED: u64 = 0x5EED_0E1E_C770_CA11;

/// Upper bound on catch-up steps per `advance` call, so one long stall never
/// spirals into an unbounded burst of ticks.
const MAX_CATCHUP_TICKS: u32 = 240;

// ---------------------------------------------------------------------------
// Strategy
// ---------------------------------------------------------------------------

/// How wall time maps onto simulation ticks.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum SimulationStrategy {
    /// One call to [`Control::advance`] is one tick; elapsed time is ignored.
    Tick,
    /// Accumulate elapsed seconds and run fixed-length ticks from the pool.
    Delta { fixed_timestep: f64 },
}

/// Tick counter plus the delta-time accumulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SimState {
    pub(crate) tick: Ticks,
    pub(crate) accumulator: f64,
}

// ---------------------------------------------------------------------------
// Control
// ---------------------------------------------------------------------------

/// The simulation coordinator.
#[derive(Debug)]
pub struct Control {
    pub network: Network,
    pub(crate) strategy: SimulationStrategy,
    pub(crate) sim: SimState,
    pub(crate) paused: bool,
    pub(crate) head: Option<ComponentId>,
    pub(crate) rng: SimRng,
    pub(crate) torn: bool,
}

impl Control {
    pub fn new(strategy: SimulationStrategy) -> Self {
        Self::with_seed(strategy, DEFAULT_SEED)
    }

    /// Create a coordinator with an explicit RNG seed, for reproducible runs.
    pub fn with_seed(strategy: SimulationStrategy, seed: u64) -> Self {
        Self {
            network: Network::new(),
            strategy,
            sim: SimState {
                tick: 0,
                accumulator: 0.0,
            },
            paused: false,
            head: None,
            rng: SimRng::new(seed),
            torn: false,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn strategy(&self) -> SimulationStrategy {
        self.strategy
    }

    /// Current tick count (number of completed evaluations).
    pub fn tick(&self) -> Ticks {
        self.sim.tick
    }

    /// Simulated seconds represented by one tick.
    pub fn seconds_per_tick(&self) -> f64 {
        match self.strategy {
            SimulationStrategy::Tick => DEFAULT_SECONDS_PER_TICK,
            SimulationStrategy::Delta { fixed_timestep } => {
                if fixed_timestep > 0.0 {
                    fixed_timestep
                } else {
                    DEFAULT_SECONDS_PER_TICK
                }
            }
        }
    }

    /// The designated head power source, if any.
    pub fn head(&self) -> Option<ComponentId> {
        self.head
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Whether [`Control::teardown`] has been called.
    pub fn is_torn(&self) -> bool {
        self.torn
    }

    /// Designate the evaluation head. Must be a power source in the root
    /// circuit.
    pub fn set_head(&mut self, id: ComponentId) -> Result<(), NetworkError> {
        self.ensure_live()?;
        let comp = self
            .network
            .component(id)
            .ok_or(NetworkError::ComponentNotFound(id))?;
        let depth = self.network.circuit(comp.circuit).map_or(0, |c| c.depth);
        if !comp.caps.power_source || depth != 0 {
            return Err(NetworkError::UnsupportedOperation {
                component: id,
                operation: "head designation",
            });
        }
        self.head = Some(id);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Graph mutation
    // -----------------------------------------------------------------------

    /// Create a component. The first power source automatically becomes the
    /// head.
    pub fn create(
        &mut self,
        kind: ComponentKind,
        position: Position,
    ) -> Result<ComponentId, NetworkError> {
        self.ensure_live()?;
        let role = RoleState::for_kind(kind, &mut self.rng);
        let id = self.network.create(kind, position, role);
        if self.head.is_none() && kind.capabilities().power_source {
            self.head = Some(id);
        }
        Ok(id)
    }

    pub fn connect(
        &mut self,
        source: ComponentId,
        dest: ComponentId,
        path: Vec<Position>,
        spec: WireSpec,
    ) -> Result<WireId, NetworkError> {
        self.ensure_live()?;
        self.network.connect(source, dest, path, spec)
    }

    pub fn disconnect(&mut self, wire: WireId) -> Result<(), NetworkError> {
        self.ensure_live()?;
        self.network.disconnect(wire)
    }

    /// Remove a component. If it was the head, the oldest surviving power
    /// source takes over.
    pub fn remove(&mut self, id: ComponentId) -> Result<(), NetworkError> {
        self.ensure_live()?;
        self.network.remove(id)?;
        if self.head == Some(id) {
            self.head = self.network.component_ids().find(|c| {
                self.network
                    .component(*c)
                    .is_some_and(|x| x.caps.power_source)
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Component pokes
    // -----------------------------------------------------------------------

    /// Toggle a switch open or closed. Returns the new closed state.
    pub fn toggle_switch(&mut self, id: ComponentId) -> Result<bool, NetworkError> {
        self.ensure_live()?;
        let comp = self
            .network
            .component_mut(id)
            .ok_or(NetworkError::ComponentNotFound(id))?;
        let circuit = comp.circuit;
        let closed = match &mut comp.role {
            RoleState::Switch(s) => {
                s.closed = !s.closed;
                s.closed
            }
            _ => {
                return Err(NetworkError::UnsupportedOperation {
                    component: id,
                    operation: "switch toggle",
                });
            }
        };

        if closed {
            let held = self
                .network
                .circuit(circuit)
                .is_some_and(|c| c.broken_by == Some(id));
            if held {
                self.network.unbreak_circuit(circuit);
            }
        } else {
            self.network.break_circuit(circuit, id);
        }
        Ok(closed)
    }

    /// Flip a selector to its other branch. Returns the new mode.
    pub fn toggle_branch(&mut self, id: ComponentId) -> Result<BranchMode, NetworkError> {
        self.ensure_live()?;
        let comp = self
            .network
            .component(id)
            .ok_or(NetworkError::ComponentNotFound(id))?;
        if comp.kind != ComponentKind::Selector {
            return Err(NetworkError::UnsupportedOperation {
                component: id,
                operation: "branch toggle",
            });
        }
        let mode = comp
            .role
            .as_connector()
            .map_or(BranchMode::All, |s| s.mode.toggled());
        self.network.set_branch_mode(id, mode)?;
        Ok(mode)
    }

    /// Reverse a power source's polarity and let locked diodes reconsider.
    pub fn flip_source(&mut self, id: ComponentId) -> Result<(), NetworkError> {
        self.ensure_live()?;
        let source = self
            .network
            .component_mut(id)
            .ok_or(NetworkError::ComponentNotFound(id))?
            .role
            .as_source_mut();
        match source {
            Some(s) => s.flip(),
            None => {
                return Err(NetworkError::UnsupportedOperation {
                    component: id,
                    operation: "polarity flip",
                });
            }
        }
        let tick = self.network.events.tick();
        self.network.events.emit(Event::SourceFlipped {
            component: id,
            tick,
        });
        self.network.settle_diodes();
        Ok(())
    }

    /// Reverse a diode's conduction direction and let locks reconsider.
    pub fn flip_diode(&mut self, id: ComponentId) -> Result<(), NetworkError> {
        self.ensure_live()?;
        let diode = self
            .network
            .component_mut(id)
            .ok_or(NetworkError::ComponentNotFound(id))?
            .role
            .as_diode_mut();
        match diode {
            Some(d) => d.direction = d.direction.flipped(),
            None => {
                return Err(NetworkError::UnsupportedOperation {
                    component: id,
                    operation: "direction flip",
                });
            }
        }
        self.network.settle_diodes();
        Ok(())
    }

    /// Set a component's resistance, clamped into the representable band.
    pub fn set_resistance(&mut self, id: ComponentId, ohms: f64) -> Result<(), NetworkError> {
        self.ensure_live()?;
        let comp = self
            .network
            .component_mut(id)
            .ok_or(NetworkError::ComponentNotFound(id))?;
        comp.resistance = clamp_resistance(ohms);
        Ok(())
    }

    /// Set a component's fault threshold.
    pub fn set_max_current(&mut self, id: ComponentId, amps: f64) -> Result<(), NetworkError> {
        self.ensure_live()?;
        let comp = self
            .network
            .component_mut(id)
            .ok_or(NetworkError::ComponentNotFound(id))?;
        comp.max_current = amps.max(0.0);
        Ok(())
    }

    /// Set a power source's EMF magnitude.
    pub fn set_voltage(&mut self, id: ComponentId, volts: f64) -> Result<(), NetworkError> {
        self.ensure_live()?;
        let source = self
            .network
            .component_mut(id)
            .ok_or(NetworkError::ComponentNotFound(id))?
            .role
            .as_source_mut();
        match source {
            Some(s) => {
                s.voltage = volts.max(0.0);
                Ok(())
            }
            None => Err(NetworkError::UnsupportedOperation {
                component: id,
                operation: "voltage adjustment",
            }),
        }
    }

    /// Set a capacitor's capacitance in microfarads.
    pub fn set_capacitance(&mut self, id: ComponentId, microfarads: f64) -> Result<(), NetworkError> {
        self.ensure_live()?;
        let cap = self
            .network
            .component_mut(id)
            .ok_or(NetworkError::ComponentNotFound(id))?
            .role
            .as_capacitor_mut();
        match cap {
            Some(c) => {
                c.microfarads = microfarads.max(0.0);
                Ok(())
            }
            None => Err(NetworkError::UnsupportedOperation {
                component: id,
                operation: "capacitance adjustment",
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Stepping
    // -----------------------------------------------------------------------

    /// Run exactly one tick, regardless of pause state.
    pub fn step(&mut self) -> Result<(), EvalError> {
        if self.torn {
            return Err(EvalError::TornDown);
        }
        self.run_tick()?;
        self.sim.tick += 1;
        self.network.events.set_tick(self.sim.tick);
        Ok(())
    }

    /// Feed elapsed wall time to the simulation. Returns how many ticks ran.
    ///
    /// Under [`SimulationStrategy::Tick`] each call runs one tick. Under
    /// [`SimulationStrategy::Delta`] the seconds accumulate and whole
    /// fixed-length ticks are drained from the pool. No ticks run while
    /// paused.
    pub fn advance(&mut self, dt_seconds: f64) -> Result<u32, EvalError> {
        if self.torn {
            return Err(EvalError::TornDown);
        }
        if self.paused {
            return Ok(0);
        }
        match self.strategy {
            SimulationStrategy::Tick => {
                self.step()?;
                Ok(1)
            }
            SimulationStrategy::Delta { .. } => {
                let step_len = self.seconds_per_tick();
                let ceiling = step_len * f64::from(MAX_CATCHUP_TICKS);
                self.sim.accumulator = (self.sim.accumulator + dt_seconds.max(0.0)).min(ceiling);

                let mut ran = 0u32;
                while self.sim.accumulator >= step_len {
                    self.sim.accumulator -= step_len;
                    self.step()?;
                    ran += 1;
                }
                Ok(ran)
            }
        }
    }

    /// Detach everything. The graph is cleared and every subsequent mutation
    /// or evaluation is rejected.
    pub fn teardown(&mut self) {
        self.network.clear();
        self.head = None;
        self.torn = true;
    }

    fn ensure_live(&self) -> Result<(), NetworkError> {
        if self.torn {
            Err(NetworkError::TornDown)
        } else {
            Ok(())
        }
    }
}

impl Default for Control {
    fn default() -> Self {
        Self::new(SimulationStrategy::Tick)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;

    fn control() -> Control {
        Control::with_seed(SimulationStrategy::Tick, 7)
    }

    fn add(c: &mut Control, kind: ComponentKind) -> ComponentId {
        c.create(kind, Position::default()).unwrap()
    }

    fn link(c: &mut Control, a: ComponentId, b: ComponentId) {
        c.connect(a, b, Vec::new(), WireSpec::ideal()).unwrap();
    }

    // -----------------------------------------------------------------------
    // Test 1: the first source becomes the head
    // -----------------------------------------------------------------------
    #[test]
    fn first_source_becomes_head() {
        let mut c = control();
        let r = add(&mut c, ComponentKind::Resistor);
        assert_eq!(c.head(), None);

        let cell = add(&mut c, ComponentKind::Cell);
        assert_eq!(c.head(), Some(cell));

        // A later source does not displace it.
        let other = add(&mut c, ComponentKind::Cell);
        assert_eq!(c.head(), Some(cell));

        c.set_head(other).unwrap();
        assert_eq!(c.head(), Some(other));

        let err = c.set_head(r).unwrap_err();
        assert_eq!(
            err,
            NetworkError::UnsupportedOperation {
                component: r,
                operation: "head designation",
            }
        );
    }

    // -----------------------------------------------------------------------
    // Test 2: removing the head promotes the oldest survivor
    // -----------------------------------------------------------------------
    #[test]
    fn removing_head_promotes_survivor() {
        let mut c = control();
        let first = add(&mut c, ComponentKind::Cell);
        let second = add(&mut c, ComponentKind::Cell);
        assert_eq!(c.head(), Some(first));

        c.remove(first).unwrap();
        assert_eq!(c.head(), Some(second));

        c.remove(second).unwrap();
        assert_eq!(c.head(), None);
    }

    // -----------------------------------------------------------------------
    // Test 3: the canonical series scenario
    // -----------------------------------------------------------------------
    #[test]
    fn series_cell_and_resistor() {
        let mut c = control();
        let cell = add(&mut c, ComponentKind::Cell);
        let r = add(&mut c, ComponentKind::Resistor);
        c.set_resistance(r, 3.0).unwrap();
        link(&mut c, cell, r);
        link(&mut c, r, cell);

        c.step().unwrap();

        let comp = c.network.component(r).unwrap();
        assert!((comp.current - 0.5).abs() < 1e-9);
        assert!((comp.voltage_drop() - 1.5).abs() < 1e-9);
        assert!(comp.is_on());
        assert_eq!(c.tick(), 1);
    }

    // -----------------------------------------------------------------------
    // Test 4: switch toggling breaks and restores the circuit
    // -----------------------------------------------------------------------
    #[test]
    fn switch_toggle_breaks_and_restores() {
        let mut c = control();
        let cell = add(&mut c, ComponentKind::Cell);
        let switch = add(&mut c, ComponentKind::Switch);
        let r = add(&mut c, ComponentKind::Resistor);
        link(&mut c, cell, switch);
        link(&mut c, switch, r);
        link(&mut c, r, cell);

        // Starts open, so the root is broken.
        assert!(c.network.is_broken(c.network.root()));
        c.step().unwrap();
        assert_eq!(c.network.component(cell).unwrap().current, 0.0);

        assert!(c.toggle_switch(switch).unwrap());
        assert!(!c.network.is_broken(c.network.root()));
        c.step().unwrap();
        assert!(c.network.component(cell).unwrap().current > 0.0);

        assert!(!c.toggle_switch(switch).unwrap());
        assert!(c.network.is_broken(c.network.root()));
    }

    // -----------------------------------------------------------------------
    // Test 5: branch toggle is selector-only
    // -----------------------------------------------------------------------
    #[test]
    fn branch_toggle_is_selector_only() {
        let mut c = control();
        let splitter = add(&mut c, ComponentKind::Splitter);
        let err = c.toggle_branch(splitter).unwrap_err();
        assert_eq!(
            err,
            NetworkError::UnsupportedOperation {
                component: splitter,
                operation: "branch toggle",
            }
        );

        let sel = add(&mut c, ComponentKind::Selector);
        let before = c
            .network
            .component(sel)
            .unwrap()
            .role
            .as_connector()
            .unwrap()
            .mode;
        let after = c.toggle_branch(sel).unwrap();
        assert_eq!(after, before.toggled());
        // The as-built position is remembered.
        let state = *c.network.component(sel).unwrap().role.as_connector().unwrap();
        assert_eq!(state.original, before);
    }

    // -----------------------------------------------------------------------
    // Test 6: motor accumulates shaft angle per tick
    // -----------------------------------------------------------------------
    #[test]
    fn motor_accumulates_angle() {
        let mut c = control();
        let cell = add(&mut c, ComponentKind::Cell);
        let motor = add(&mut c, ComponentKind::Motor);
        link(&mut c, cell, motor);
        link(&mut c, motor, cell);

        // 1.5 V over 4 ohms: 0.375 A, so 2.25 degrees per tick.
        c.step().unwrap();
        c.step().unwrap();
        let angle = match &c.network.component(motor).unwrap().role {
            RoleState::Motor(m) => m.angle_degrees,
            _ => unreachable!(),
        };
        assert!((angle - 4.5).abs() < 1e-9);
    }

    // -----------------------------------------------------------------------
    // Test 7: AC sources flip on their half-period cadence
    // -----------------------------------------------------------------------
    #[test]
    fn ac_source_flips_on_cadence() {
        let mut c = control();
        let ac = add(&mut c, ComponentKind::AcSource);
        let r = add(&mut c, ComponentKind::Resistor);
        link(&mut c, ac, r);
        link(&mut c, r, ac);
        c.network
            .component_mut(ac)
            .unwrap()
            .role
            .as_source_mut()
            .unwrap()
            .half_period = Some(3);

        for _ in 0..4 {
            c.step().unwrap();
        }
        // Flipped once, at tick 3.
        assert!(c.network.component(ac).unwrap().signed_voltage() < 0.0);
        assert_eq!(c.network.events.total_emitted(EventKind::SourceFlipped), 1);

        for _ in 0..3 {
            c.step().unwrap();
        }
        // Flipped back at tick 6.
        assert!(c.network.component(ac).unwrap().signed_voltage() > 0.0);
        assert_eq!(c.network.events.total_emitted(EventKind::SourceFlipped), 2);
    }

    // -----------------------------------------------------------------------
    // Test 8: delta strategy drains whole steps from the accumulator
    // -----------------------------------------------------------------------
    #[test]
    fn delta_accumulator_runs_whole_steps() {
        let mut c = Control::with_seed(
            SimulationStrategy::Delta {
                fixed_timestep: 0.01,
            },
            7,
        );
        assert_eq!(c.advance(0.035).unwrap(), 3);
        assert_eq!(c.tick(), 3);
        // Residual 0.005 carries over.
        assert_eq!(c.advance(0.005).unwrap(), 1);
        assert_eq!(c.advance(0.0).unwrap(), 0);
    }

    // -----------------------------------------------------------------------
    // Test 9: pause gates advance but not manual stepping
    // -----------------------------------------------------------------------
    #[test]
    fn pause_gates_advance_only() {
        let mut c = control();
        c.set_paused(true);
        assert_eq!(c.advance(1.0).unwrap(), 0);
        assert_eq!(c.tick(), 0);

        c.step().unwrap();
        assert_eq!(c.tick(), 1);

        c.set_paused(false);
        assert_eq!(c.advance(0.0).unwrap(), 1);
        assert_eq!(c.tick(), 2);
    }

    // -----------------------------------------------------------------------
    // Test 10: teardown rejects everything afterwards
    // -----------------------------------------------------------------------
    #[test]
    fn teardown_rejects_everything() {
        let mut c = control();
        let cell = add(&mut c, ComponentKind::Cell);
        c.teardown();

        assert!(c.is_torn());
        assert_eq!(c.step(), Err(EvalError::TornDown));
        assert_eq!(c.advance(1.0), Err(EvalError::TornDown));
        assert_eq!(
            c.create(ComponentKind::Resistor, Position::default()),
            Err(NetworkError::TornDown)
        );
        assert_eq!(c.toggle_switch(cell), Err(NetworkError::TornDown));
        assert_eq!(c.network.component_count(), 0);
    }

    // -----------------------------------------------------------------------
    // Test 11: pokes validate their target kind
    // -----------------------------------------------------------------------
    #[test]
    fn pokes_validate_target_kind() {
        let mut c = control();
        let r = add(&mut c, ComponentKind::Resistor);

        assert!(matches!(
            c.set_voltage(r, 9.0),
            Err(NetworkError::UnsupportedOperation { .. })
        ));
        assert!(matches!(
            c.set_capacitance(r, 10.0),
            Err(NetworkError::UnsupportedOperation { .. })
        ));
        assert!(matches!(
            c.flip_source(r),
            Err(NetworkError::UnsupportedOperation { .. })
        ));
        assert!(matches!(
            c.flip_diode(r),
            Err(NetworkError::UnsupportedOperation { .. })
        ));

        // Resistance is clamped into the representable band.
        c.set_resistance(r, -3.0).unwrap();
        assert_eq!(
            c.network.component(r).unwrap().resistance,
            crate::units::NEAR_ZERO_OHMS
        );
    }
}
