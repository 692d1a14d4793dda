//! Branch connectors: splitters, selectors, and merges.
//!
//! A fork connector (splitter or selector) owns up to two child circuits, one
//! per output slot. A splitter feeds both children in parallel; a selector
//! routes everything into exactly one child and force-breaks the other. The
//! merge connector is terminal: it owns no children and just carries branch
//! current back into the parent circuit.

use crate::id::{CircuitId, ComponentId, WireId};
use crate::network::{Network, NetworkError};
use crate::rng::SimRng;
use crate::units::clamp_resistance;
use crate::wire::Wire;

// ---------------------------------------------------------------------------
// Branch mode
// ---------------------------------------------------------------------------

/// Which child circuits a fork feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BranchMode {
    /// Both children carry current, split by conductance.
    All,
    OnlyFirst,
    OnlySecond,
}

impl BranchMode {
    /// The single active slot, or `None` when both are active.
    pub fn active_slot(self) -> Option<usize> {
        match self {
            BranchMode::All => None,
            BranchMode::OnlyFirst => Some(0),
            BranchMode::OnlySecond => Some(1),
        }
    }

    /// The opposite selection. `All` has no opposite.
    pub fn toggled(self) -> Self {
        match self {
            BranchMode::All => BranchMode::All,
            BranchMode::OnlyFirst => BranchMode::OnlySecond,
            BranchMode::OnlySecond => BranchMode::OnlyFirst,
        }
    }
}

// ---------------------------------------------------------------------------
// Connector state
// ---------------------------------------------------------------------------

/// Per-connector branch bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectorState {
    /// Child circuits by output slot. Populated lazily on first connection.
    pub children: [Option<CircuitId>; 2],
    /// Terminal connectors (merges) never spawn children.
    pub terminal: bool,
    pub mode: BranchMode,
    /// The mode drawn at construction. Selectors remember it so an editor
    /// can render the switch in its as-built position.
    pub original: BranchMode,
}

impl ConnectorState {
    /// A splitting junction: both branches always live.
    pub fn splitter() -> Self {
        Self {
            children: [None, None],
            terminal: false,
            mode: BranchMode::All,
            original: BranchMode::All,
        }
    }

    /// A terminal merge junction.
    pub fn merge() -> Self {
        Self {
            children: [None, None],
            terminal: true,
            mode: BranchMode::All,
            original: BranchMode::All,
        }
    }

    /// A two-way selector. The initial position is indeterminate, so it is
    /// drawn from the simulation RNG.
    pub fn selector(rng: &mut SimRng) -> Self {
        let mode = if rng.coin() {
            BranchMode::OnlyFirst
        } else {
            BranchMode::OnlySecond
        };
        Self {
            children: [None, None],
            terminal: false,
            mode,
            original: mode,
        }
    }

    /// Whether the given output slot is carrying current under the current
    /// mode.
    pub fn slot_active(&self, slot: usize) -> bool {
        self.mode.active_slot().is_none_or(|active| active == slot)
    }
}

// ---------------------------------------------------------------------------
// Network integration
// ---------------------------------------------------------------------------

impl Network {
    /// Select which branches of a fork carry current. Breaks the inactive
    /// child and restores the active one if this fork had broken it.
    pub fn set_branch_mode(
        &mut self,
        connector: ComponentId,
        mode: BranchMode,
    ) -> Result<(), NetworkError> {
        let comp = self
            .components
            .get_mut(connector)
            .ok_or(NetworkError::ComponentNotFound(connector))?;
        if !comp.kind.is_fork() {
            return Err(NetworkError::UnsupportedOperation {
                component: connector,
                operation: "branch selection",
            });
        }
        if let Some(state) = comp.role.as_connector_mut() {
            state.mode = mode;
        }
        self.enforce_branch_mode(connector);
        Ok(())
    }

    /// Re-apply a fork's mode to its children's break state. Active children
    /// are unbroken only if this fork caused the break; inactive children are
    /// broken with this fork as cause.
    pub(crate) fn enforce_branch_mode(&mut self, connector: ComponentId) {
        let Some(state) = self
            .components
            .get(connector)
            .and_then(|c| c.role.as_connector())
            .copied()
        else {
            return;
        };
        for (slot, child) in state.children.into_iter().enumerate() {
            let Some(child) = child else {
                continue;
            };
            if state.slot_active(slot) {
                let held = self
                    .circuits
                    .get(child)
                    .is_some_and(|c| c.broken_by == Some(connector));
                if held {
                    self.unbreak_circuit(child);
                }
            } else {
                self.break_circuit(child, connector);
            }
        }
    }

    /// Divide the current arriving at a fork between its live children.
    ///
    /// With two live branches, the shared parallel voltage is
    /// `incoming * (r_a * r_b) / (r_a + r_b)` and each branch draws
    /// `shared / r`. A lone live branch takes everything; dead branches are
    /// pinned to zero.
    pub(crate) fn split_current(&mut self, id: ComponentId) {
        let Some(comp) = self.components.get(id) else {
            return;
        };
        let incoming = comp.current;
        let Some(state) = comp.role.as_connector().copied() else {
            return;
        };

        let mut live: Vec<(CircuitId, f64)> = Vec::new();
        let mut dead: Vec<CircuitId> = Vec::new();
        for (slot, child) in state.children.into_iter().enumerate() {
            let Some(child) = child else {
                continue;
            };
            if self.circuits.get(child).is_none() {
                continue;
            }
            if state.slot_active(slot) && !self.is_broken(child) {
                live.push((child, clamp_resistance(self.circuit_resistance(child))));
            } else {
                dead.push(child);
            }
        }

        match live.as_slice() {
            &[] => {}
            &[(only, _)] => self.set_circuit_current(only, incoming),
            &[(a, ra), (b, rb)] => {
                let shared = incoming * (ra * rb) / (ra + rb);
                let first = shared / ra;
                self.set_circuit_current(a, first);
                self.set_circuit_current(b, incoming - first);
            }
            _ => {}
        }
        for child in dead {
            self.set_circuit_current(child, 0.0);
        }
    }

    /// Whether a trace may walk this wire. Wires leaving a fork into an
    /// inactive branch are closed off.
    pub(crate) fn connector_allows(&self, wire: &Wire) -> bool {
        let Some(src) = self.components.get(wire.source) else {
            return false;
        };
        if !src.kind.is_fork() {
            return true;
        }
        let Some(state) = src.role.as_connector() else {
            return true;
        };
        let Some(active) = state.mode.active_slot() else {
            return true;
        };
        let Some(target) = state.children[active] else {
            return false;
        };
        self.components
            .get(wire.dest)
            .is_some_and(|d| d.circuit == target)
    }

    /// Look up the wire joining two specific components, if one exists.
    pub fn find_wire(&self, source: ComponentId, dest: ComponentId) -> Option<WireId> {
        self.wires
            .iter()
            .find(|(_, w)| w.source == source && w.dest == dest)
            .map(|(id, _)| id)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
