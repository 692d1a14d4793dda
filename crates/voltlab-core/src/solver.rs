//! Resistance, voltage, and current composition over the circuit tree.
//!
//! Resistance composes bottom-up: members in series sum, fork connectors
//! contribute the parallel combination of their live child circuits. Voltage
//! is summed from signed source EMFs at the root; non-root circuits use the
//! resistance-fraction divider `(local_r / root_r) * root_v`. The divider is
//! an approximation for deep nesting, kept because component behavior is
//! tuned against it.
//!
//! Sentinel resistances keep every division well-defined: near-zero members
//! are skipped when summing, and denominators are clamped before dividing.

use crate::circuit::Composition;
use crate::id::{CircuitId, ComponentId};
use crate::network::Network;
use crate::units::{NEAR_INFINITE_OHMS, NEAR_ZERO_OHMS, clamp_resistance, is_near_zero};

impl Network {
    // -----------------------------------------------------------------------
    // Resistance
    // -----------------------------------------------------------------------

    /// Combined resistance of a circuit in ohms.
    ///
    /// Members at the sentinel near-zero value are skipped. A wire's own
    /// resistance counts only when both endpoints sit in this circuit, so
    /// wires into or out of a branch never double count the branch.
    pub fn circuit_resistance(&self, id: CircuitId) -> f64 {
        let Some(circuit) = self.circuits.get(id) else {
            return 0.0;
        };

        let mut parts: Vec<f64> = Vec::new();
        for member in &circuit.members {
            let Some(comp) = self.components.get(*member) else {
                continue;
            };
            let r = if comp.kind.is_fork() {
                self.connector_resistance(*member)
            } else {
                comp.effective_resistance()
            };
            if !is_near_zero(r) {
                parts.push(r);
            }
            for w in &comp.outputs {
                let Some(wire) = self.wires.get(*w) else {
                    continue;
                };
                let same_circuit = self
                    .components
                    .get(wire.dest)
                    .is_some_and(|d| d.circuit == id);
                if same_circuit {
                    let wr = wire.resistance();
                    if wr > 0.0 {
                        parts.push(wr);
                    }
                }
            }
        }

        match circuit.composition {
            Composition::Series => parts.iter().sum(),
            Composition::Parallel => {
                if parts.is_empty() {
                    return 0.0;
                }
                let conductance: f64 = parts.iter().map(|r| 1.0 / clamp_resistance(*r)).sum();
                if conductance <= 0.0 {
                    NEAR_INFINITE_OHMS
                } else {
                    1.0 / conductance
                }
            }
        }
    }

    /// Resistance a fork connector presents to its enclosing circuit: the
    /// parallel combination of its live child circuits, pass-through when
    /// only one child is live, near-infinite when every child is broken.
    pub fn connector_resistance(&self, id: ComponentId) -> f64 {
        let Some(comp) = self.components.get(id) else {
            return NEAR_ZERO_OHMS;
        };
        let Some(state) = comp.role.as_connector() else {
            return comp.effective_resistance();
        };

        let mut attached = 0usize;
        let mut live: Vec<f64> = Vec::new();
        for (slot, child) in state.children.iter().enumerate() {
            let Some(child) = *child else {
                continue;
            };
            if self.circuits.get(child).is_none() {
                continue;
            }
            attached += 1;
            if state.slot_active(slot) && !self.is_broken(child) {
                live.push(clamp_resistance(self.circuit_resistance(child)));
            }
        }

        match live.as_slice() {
            &[] => {
                if attached == 0 {
                    NEAR_ZERO_OHMS
                } else {
                    NEAR_INFINITE_OHMS
                }
            }
            &[only] => only,
            &[a, b] => {
                let denom = a + b;
                if denom <= 0.0 {
                    NEAR_ZERO_OHMS
                } else {
                    (a * b) / denom
                }
            }
            _ => NEAR_ZERO_OHMS,
        }
    }

    // -----------------------------------------------------------------------
    // Voltage and current
    // -----------------------------------------------------------------------

    /// EMF available to a circuit, in volts. Zero while the circuit or any
    /// ancestor is broken.
    pub fn circuit_voltage(&self, id: CircuitId) -> f64 {
        if self.is_broken(id) {
            return 0.0;
        }
        let Some(circuit) = self.circuits.get(id) else {
            return 0.0;
        };
        if circuit.depth == 0 {
            return circuit
                .members
                .iter()
                .filter_map(|m| self.components.get(*m))
                .map(|c| c.signed_voltage())
                .sum();
        }
        let local = self.circuit_resistance(id);
        let root = clamp_resistance(self.circuit_resistance(self.root));
        (local / root) * self.circuit_voltage(self.root)
    }

    /// Ohm's-law current for a circuit. Zero while broken.
    pub fn circuit_current(&self, id: CircuitId) -> f64 {
        if self.is_broken(id) {
            return 0.0;
        }
        self.circuit_voltage(id) / clamp_resistance(self.circuit_resistance(id))
    }

    /// Signed EMF sum over root members, ignoring break state. Diode
    /// settlement reads this to learn the prevailing polarity.
    pub(crate) fn source_polarity_sum(&self) -> f64 {
        let Some(root) = self.circuits.get(self.root) else {
            return 0.0;
        };
        root.members
            .iter()
            .filter_map(|m| self.components.get(*m))
            .map(|c| c.signed_voltage())
            .sum()
    }

    /// Push a current value onto a circuit and its members. Members read
    /// zero while the circuit is broken.
    pub(crate) fn set_circuit_current(&mut self, id: CircuitId, amps: f64) {
        let broken = self.is_broken(id);
        let value = if broken { 0.0 } else { amps };
        let members = match self.circuits.get_mut(id) {
            Some(circuit) => {
                circuit.current = value;
                circuit.members.clone()
            }
            None => return,
        };
        for member in members {
            if let Some(comp) = self.components.get_mut(member) {
                comp.current = value;
            }
        }
    }

    /// Reset every component and circuit current to zero. Each tick starts
    /// from here so stale flow never leaks across ticks.
    pub(crate) fn zero_all_currents(&mut self) {
        for (_, comp) in self.components.iter_mut() {
            comp.current = 0.0;
        }
        for (_, circuit) in self.circuits.iter_mut() {
            circuit.current = 0.0;
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
