//! Diode rectification: direction-locked conduction.
//!
//! A diode conducts in its configured direction and locks when the current
//! sign opposes it. A locked diode reads near-infinite resistance, is skipped
//! by traces, and breaks its circuit with itself as cause. Locks are only
//! reconsidered when a root source flips polarity (or a diode is flipped by
//! hand) -- never spontaneously mid-evaluation.

use crate::event::Event;
use crate::id::ComponentId;
use crate::network::Network;

// ---------------------------------------------------------------------------
// Direction and state
// ---------------------------------------------------------------------------

/// Conduction direction fixed at construction, flippable by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DiodeDirection {
    /// Conducts negative current, blocks positive.
    Left,
    /// Conducts positive current, blocks negative.
    Right,
}

impl DiodeDirection {
    pub fn flipped(self) -> Self {
        match self {
            DiodeDirection::Left => DiodeDirection::Right,
            DiodeDirection::Right => DiodeDirection::Left,
        }
    }

    /// Whether a current value opposes this direction. Zero current never
    /// conflicts.
    pub fn conflicts_with(self, amps: f64) -> bool {
        match self {
            DiodeDirection::Right => amps < 0.0,
            DiodeDirection::Left => amps > 0.0,
        }
    }
}

/// Lock state for diodes and LEDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiodeState {
    pub direction: DiodeDirection,
    pub locked: bool,
}

impl DiodeState {
    pub fn new(direction: DiodeDirection) -> Self {
        Self {
            direction,
            locked: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Network integration
// ---------------------------------------------------------------------------

impl Network {
    /// Lock a diode whose current opposes its direction. Runs on every
    /// evaluation of the diode; locking breaks its circuit with the diode as
    /// cause.
    pub(crate) fn check_diode(&mut self, id: ComponentId) {
        let Some(comp) = self.components.get(id) else {
            return;
        };
        let circuit = comp.circuit;
        let current = comp.current;
        let Some(state) = comp.role.as_diode() else {
            return;
        };
        if state.locked || !state.direction.conflicts_with(current) {
            return;
        }

        if let Some(state) = self
            .components
            .get_mut(id)
            .and_then(|c| c.role.as_diode_mut())
        {
            state.locked = true;
        }
        let tick = self.events.tick();
        self.events.emit(Event::DiodeLocked {
            component: id,
            tick,
        });
        self.break_circuit(circuit, id);
    }

    /// Reconsider every locked diode against the prevailing root polarity.
    /// Called when a source flips or a diode direction is changed by hand.
    pub(crate) fn settle_diodes(&mut self) {
        let prevailing = self.source_polarity_sum();
        let ids: Vec<ComponentId> = self.creation_order.clone();
        for id in ids {
            let Some(comp) = self.components.get(id) else {
                continue;
            };
            let circuit = comp.circuit;
            let Some(state) = comp.role.as_diode() else {
                continue;
            };
            if !state.locked || state.direction.conflicts_with(prevailing) {
                continue;
            }

            if let Some(state) = self
                .components
                .get_mut(id)
                .and_then(|c| c.role.as_diode_mut())
            {
                state.locked = false;
            }
            let tick = self.events.tick();
            self.events.emit(Event::DiodeUnlocked {
                component: id,
                tick,
            });
            let held = self
                .circuits
                .get(circuit)
                .is_some_and(|c| c.broken_by == Some(id));
            if held {
                self.unbreak_circuit(circuit);
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
