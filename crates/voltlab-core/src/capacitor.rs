//! Capacitor RC transients.
//!
//! Each tick a capacitor decides its phase from reachability: if the head
//! power source can be reached along the supply side, it charges toward the
//! circuit's voltage on the standard RC curve; if the supply is gone but a
//! closed loop exists, it discharges through that loop, driving the loop
//! members itself; otherwise it idles and holds whatever charge it has.
//!
//! The time constant is `R_path * C`, with `R_path` summed over the traced
//! path. Elapsed time is simulated seconds derived from the tick counter, so
//! pausing or changing the tick rate never corrupts the curve.

use crate::event::Event;
use crate::id::ComponentId;
use crate::network::Network;
use crate::trace::TraceOptions;
use crate::units::{
    CURRENT_EPS, FLOAT_TOL, FULL_CHARGE_RATIO, MICRO, NEAR_ZERO_OHMS, Ticks, clamp_resistance,
};

// ---------------------------------------------------------------------------
// Phase and state
// ---------------------------------------------------------------------------

/// Where a capacitor is on its charge curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapacitorPhase {
    /// No supply and no loop. Charge is retained.
    #[default]
    Idle,
    Charging,
    Discharging,
    /// Within [`FULL_CHARGE_RATIO`] of the target voltage.
    Full,
}

/// Transient state of one capacitor.
#[derive(Debug, Clone, PartialEq)]
pub struct CapacitorState {
    /// Capacitance in microfarads. Micro-units preserve display precision;
    /// conversion to farads happens only inside the time constant.
    pub microfarads: f64,
    /// Stored voltage.
    pub voltage: f64,
    pub phase: CapacitorPhase,
    /// Tick at which the current phase began.
    pub phase_started: Ticks,
    /// Seconds already "on the curve" when charging resumed with a partial
    /// charge, so the curve continues instead of restarting from zero.
    pub elapsed_offset: f64,
    /// Voltage being charged toward.
    pub target_voltage: f64,
    /// Voltage held when discharge began.
    pub discharge_start: f64,
    /// Summed resistance of the most recent traced path.
    pub path_resistance: f64,
}

impl CapacitorState {
    pub fn new(microfarads: f64) -> Self {
        Self {
            microfarads,
            voltage: 0.0,
            phase: CapacitorPhase::Idle,
            phase_started: 0,
            elapsed_offset: 0.0,
            target_voltage: 0.0,
            discharge_start: 0.0,
            path_resistance: 0.0,
        }
    }

    /// Capacitance in farads.
    pub fn farads(&self) -> f64 {
        self.microfarads * MICRO
    }

    /// RC time constant in seconds, floored away from zero on both factors.
    pub fn time_constant(&self) -> f64 {
        self.path_resistance.max(NEAR_ZERO_OHMS) * self.farads().max(1e-12)
    }

    /// Charge percentage relative to the current target, `[0, 100]`.
    pub fn percent(&self) -> f64 {
        if self.target_voltage <= CURRENT_EPS {
            return 0.0;
        }
        (self.voltage / self.target_voltage * 100.0).min(100.0)
    }
}

/// Seconds already spent on the charging curve to have reached `v0` on the
/// way to `target`. Inverts `v = target * (1 - e^(-t/tau))`.
fn charge_offset(v0: f64, target: f64, tau: f64) -> f64 {
    if v0 <= 0.0 || v0 >= target {
        return 0.0;
    }
    -tau * (1.0 - v0 / target).ln()
}

// ---------------------------------------------------------------------------
// Network integration
// ---------------------------------------------------------------------------

impl Network {
    /// Advance one capacitor by one tick.
    ///
    /// `head` is the designated head power source; supply is probed by a
    /// backward trace toward it, because the input side is what limits the
    /// charging current.
    pub(crate) fn step_capacitor(
        &mut self,
        id: ComponentId,
        head: Option<ComponentId>,
        tick: Ticks,
        seconds_per_tick: f64,
    ) {
        let Some(comp) = self.components.get(id) else {
            return;
        };
        let circuit = comp.circuit;
        let Some(existing) = comp.role.as_capacitor() else {
            return;
        };
        let mut state = existing.clone();
        let before = state.phase;

        let supply = head.and_then(|h| {
            if h == id {
                return None;
            }
            self.trace(id, h, TraceOptions::backward())
        });
        let target = self.circuit_voltage(circuit).abs();

        if let (Some(path), true) = (supply, target > CURRENT_EPS) {
            if state.voltage >= FULL_CHARGE_RATIO * target {
                state.phase = CapacitorPhase::Full;
                state.target_voltage = target;
            } else {
                let restart = state.phase != CapacitorPhase::Charging
                    || (target - state.target_voltage).abs() > FLOAT_TOL;
                if restart {
                    state.phase = CapacitorPhase::Charging;
                    state.phase_started = tick;
                    state.target_voltage = target;
                    state.path_resistance = self.path_resistance(&path);
                    state.elapsed_offset =
                        charge_offset(state.voltage, target, state.time_constant());
                }
                let elapsed = state.elapsed_offset
                    + (tick - state.phase_started + 1) as f64 * seconds_per_tick;
                state.voltage = state.target_voltage * (1.0 - (-elapsed / state.time_constant()).exp());
                if state.voltage >= FULL_CHARGE_RATIO * state.target_voltage {
                    state.phase = CapacitorPhase::Full;
                }
            }
        } else if state.voltage > CURRENT_EPS {
            if let Some(cycle) = self.trace_cycle(id, TraceOptions::unrestrained()) {
                if state.phase != CapacitorPhase::Discharging {
                    state.phase = CapacitorPhase::Discharging;
                    state.phase_started = tick;
                    state.discharge_start = state.voltage;
                    state.path_resistance = self.path_resistance(&cycle);
                }
                let elapsed = (tick - state.phase_started + 1) as f64 * seconds_per_tick;
                state.voltage = state.discharge_start * (-elapsed / state.time_constant()).exp();
                if state.voltage <= CURRENT_EPS {
                    state.voltage = 0.0;
                    state.phase = CapacitorPhase::Idle;
                } else {
                    // The capacitor is acting as the loop's source: every
                    // member draws from the remaining voltage.
                    for member in cycle.iter().copied() {
                        if member == id {
                            continue;
                        }
                        if let Some(part) = self.components.get_mut(member) {
                            part.current =
                                state.voltage / clamp_resistance(part.effective_resistance());
                        }
                    }
                    for member in cycle.iter().copied() {
                        if member != id {
                            self.blow_check(member);
                        }
                    }
                }
            } else {
                // Charge is retained while there is nowhere for it to go.
                state.phase = CapacitorPhase::Idle;
            }
        } else {
            state.phase = CapacitorPhase::Idle;
        }

        let changed = state.phase != before;
        let phase = state.phase;
        if let Some(slot) = self
            .components
            .get_mut(id)
            .and_then(|c| c.role.as_capacitor_mut())
        {
            *slot = state;
        }
        if changed {
            self.events.emit(Event::CapacitorPhaseChanged {
                component: id,
                phase,
                tick,
            });
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
