//! Read-only snapshot views.
//!
//! A snapshot is an owned copy of one component's or circuit's state at the
//! moment of the call, safe to hand across a UI boundary without holding a
//! borrow on the network. Electrical figures reflect the last completed
//! evaluation; structural figures (resistance, voltage) are recomputed live.

use crate::capacitor::CapacitorPhase;
use crate::circuit::Composition;
use crate::component::{ComponentKind, Position, RoleState};
use crate::connector::BranchMode;
use crate::diode::DiodeDirection;
use crate::id::{CircuitId, ComponentId};
use crate::network::Network;
use crate::units::Ticks;

// ---------------------------------------------------------------------------
// Component snapshots
// ---------------------------------------------------------------------------

/// Kind-specific state carried by a [`ComponentSnapshot`].
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotDetail {
    Plain,
    Source {
        voltage: f64,
        flipped: bool,
        half_period: Option<Ticks>,
    },
    Lamp {
        brightness: f64,
    },
    Diode {
        direction: DiodeDirection,
        locked: bool,
    },
    Led {
        direction: DiodeDirection,
        locked: bool,
        brightness: f64,
    },
    Capacitor {
        phase: CapacitorPhase,
        voltage: f64,
        percent: f64,
        microfarads: f64,
    },
    Motor {
        angle_degrees: f64,
    },
    Switch {
        closed: bool,
    },
    Connector {
        mode: BranchMode,
        original: BranchMode,
        terminal: bool,
        children: [Option<CircuitId>; 2],
    },
}

/// Owned view of one component.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSnapshot {
    pub id: ComponentId,
    pub kind: ComponentKind,
    pub label: &'static str,
    pub position: Position,
    pub circuit: CircuitId,
    pub resistance: f64,
    /// Resistance as the solver sees it (locked diodes read near-infinite).
    pub effective_resistance: f64,
    pub current: f64,
    pub voltage_drop: f64,
    pub power_watts: f64,
    pub max_current: f64,
    pub blown: bool,
    pub on: bool,
    pub detail: SnapshotDetail,
}

// ---------------------------------------------------------------------------
// Circuit snapshots
// ---------------------------------------------------------------------------

/// Owned view of one circuit.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitSnapshot {
    pub id: CircuitId,
    pub composition: Composition,
    pub depth: usize,
    pub parent: Option<CircuitId>,
    pub broken: bool,
    pub broken_by: Option<ComponentId>,
    /// Combined resistance, recomputed at call time.
    pub resistance: f64,
    /// Driving voltage, recomputed at call time.
    pub voltage: f64,
    /// Current as propagated by the last evaluation.
    pub current: f64,
    pub power_watts: f64,
    pub members: Vec<ComponentId>,
}

impl Network {
    /// Snapshot one component, or `None` for a stale id.
    pub fn component_snapshot(&self, id: ComponentId) -> Option<ComponentSnapshot> {
        let comp = self.component(id)?;

        let detail = match comp.kind {
            ComponentKind::Cell | ComponentKind::AcSource => {
                let s = comp.role.as_source()?;
                SnapshotDetail::Source {
                    voltage: s.voltage,
                    flipped: s.flipped,
                    half_period: s.half_period,
                }
            }
            ComponentKind::Bulb => SnapshotDetail::Lamp {
                brightness: comp.brightness().unwrap_or(0.0),
            },
            ComponentKind::Diode => {
                let d = comp.role.as_diode()?;
                SnapshotDetail::Diode {
                    direction: d.direction,
                    locked: d.locked,
                }
            }
            ComponentKind::Led => {
                let d = comp.role.as_diode()?;
                SnapshotDetail::Led {
                    direction: d.direction,
                    locked: d.locked,
                    brightness: comp.brightness().unwrap_or(0.0),
                }
            }
            ComponentKind::Capacitor => {
                let c = comp.role.as_capacitor()?;
                SnapshotDetail::Capacitor {
                    phase: c.phase,
                    voltage: c.voltage,
                    percent: c.percent(),
                    microfarads: c.microfarads,
                }
            }
            ComponentKind::Motor => match &comp.role {
                RoleState::Motor(m) => SnapshotDetail::Motor {
                    angle_degrees: m.angle_degrees,
                },
                _ => SnapshotDetail::Plain,
            },
            ComponentKind::Switch => {
                let s = comp.role.as_switch()?;
                SnapshotDetail::Switch { closed: s.closed }
            }
            ComponentKind::Selector | ComponentKind::Splitter | ComponentKind::Merge => {
                let c = comp.role.as_connector()?;
                SnapshotDetail::Connector {
                    mode: c.mode,
                    original: c.original,
                    terminal: c.terminal,
                    children: c.children,
                }
            }
            _ => SnapshotDetail::Plain,
        };

        Some(ComponentSnapshot {
            id,
            kind: comp.kind,
            label: comp.kind.label(),
            position: comp.position,
            circuit: comp.circuit,
            resistance: comp.resistance,
            effective_resistance: comp.effective_resistance(),
            current: comp.current,
            voltage_drop: comp.voltage_drop(),
            power_watts: comp.power(),
            max_current: comp.max_current,
            blown: comp.blown,
            on: comp.is_on(),
            detail,
        })
    }

    /// Snapshot every component, oldest first.
    pub fn component_snapshots(&self) -> Vec<ComponentSnapshot> {
        self.creation_order
            .iter()
            .filter_map(|id| self.component_snapshot(*id))
            .collect()
    }

    /// Snapshot one circuit, or `None` for a stale id.
    pub fn circuit_snapshot(&self, id: CircuitId) -> Option<CircuitSnapshot> {
        let circuit = self.circuit(id)?;
        let voltage = self.circuit_voltage(id);
        let current = circuit.current;
        Some(CircuitSnapshot {
            id,
            composition: circuit.composition,
            depth: circuit.depth as usize,
            parent: circuit.parent,
            broken: circuit.broken,
            broken_by: circuit.broken_by,
            resistance: self.circuit_resistance(id),
            voltage,
            current,
            power_watts: voltage * current,
            members: circuit.members.clone(),
        })
    }

    /// Snapshot the root circuit.
    pub fn root_snapshot(&self) -> Option<CircuitSnapshot> {
        self.circuit_snapshot(self.root())
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{Control, SimulationStrategy};
    use crate::id::WireId;
    use crate::wire::WireSpec;

    fn control() -> Control {
        Control::with_seed(SimulationStrategy::Tick, 7)
    }

    fn add(c: &mut Control, kind: ComponentKind) -> ComponentId {
        c.create(kind, Position::default()).unwrap()
    }

    fn link(c: &mut Control, a: ComponentId, b: ComponentId) -> WireId {
        c.connect(a, b, Vec::new(), WireSpec::ideal()).unwrap()
    }

    // -----------------------------------------------------------------------
    // Test 1: a lamp snapshot carries the post-tick electrical figures
    // -----------------------------------------------------------------------
    #[test]
    fn lamp_snapshot_reflects_last_tick() {
        let mut c = control();
        let cell = add(&mut c, ComponentKind::Cell);
        let bulb = add(&mut c, ComponentKind::Bulb);
        link(&mut c, cell, bulb);
        link(&mut c, bulb, cell);
        c.step().unwrap();

        // 1.5 V over 6 ohms: 0.25 A through the loop.
        let snap = c.network.component_snapshot(bulb).unwrap();
        assert_eq!(snap.kind, ComponentKind::Bulb);
        assert_eq!(snap.label, "bulb");
        assert!((snap.current - 0.25).abs() < 1e-9);
        assert!((snap.voltage_drop - 1.5).abs() < 1e-9);
        assert!((snap.power_watts - 0.375).abs() < 1e-9);
        assert!(snap.on);
        assert!(!snap.blown);
        assert_eq!(
            snap.detail,
            SnapshotDetail::Lamp { brightness: 0.25 }
        );
    }

    // -----------------------------------------------------------------------
    // Test 2: the root circuit snapshot
    // -----------------------------------------------------------------------
    #[test]
    fn root_snapshot_summarizes_the_loop() {
        let mut c = control();
        let cell = add(&mut c, ComponentKind::Cell);
        let bulb = add(&mut c, ComponentKind::Bulb);
        link(&mut c, cell, bulb);
        link(&mut c, bulb, cell);
        c.step().unwrap();

        let snap = c.network.root_snapshot().unwrap();
        assert_eq!(snap.depth, 0);
        assert_eq!(snap.parent, None);
        assert!(!snap.broken);
        assert!((snap.resistance - 6.0).abs() < 1e-9);
        assert!((snap.voltage - 1.5).abs() < 1e-9);
        assert!((snap.current - 0.25).abs() < 1e-9);
        assert!((snap.power_watts - 0.375).abs() < 1e-9);
        assert_eq!(snap.members, vec![cell, bulb]);
    }

    // -----------------------------------------------------------------------
    // Test 3: kind-specific detail variants
    // -----------------------------------------------------------------------
    #[test]
    fn detail_matches_kind() {
        let mut c = control();
        let cell = add(&mut c, ComponentKind::Cell);
        let switch = add(&mut c, ComponentKind::Switch);
        let sel = add(&mut c, ComponentKind::Selector);

        match c.network.component_snapshot(cell).unwrap().detail {
            SnapshotDetail::Source {
                voltage,
                flipped,
                half_period,
            } => {
                assert_eq!(voltage, 1.5);
                assert!(!flipped);
                assert_eq!(half_period, None);
            }
            other => panic!("unexpected detail {other:?}"),
        }

        assert_eq!(
            c.network.component_snapshot(switch).unwrap().detail,
            SnapshotDetail::Switch { closed: false }
        );

        match c.network.component_snapshot(sel).unwrap().detail {
            SnapshotDetail::Connector {
                mode,
                original,
                terminal,
                children,
            } => {
                assert_eq!(mode, original);
                assert_ne!(mode, BranchMode::All);
                assert!(!terminal);
                assert_eq!(children, [None, None]);
            }
            other => panic!("unexpected detail {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // Test 4: a blown part reads off
    // -----------------------------------------------------------------------
    #[test]
    fn blown_part_reads_off() {
        let mut c = control();
        let bulb = add(&mut c, ComponentKind::Bulb);
        c.network.component_mut(bulb).unwrap().current = 3.0;
        c.network.blow_check(bulb);

        let snap = c.network.component_snapshot(bulb).unwrap();
        assert!(snap.blown);
        assert!(!snap.on);
        assert_eq!(snap.detail, SnapshotDetail::Lamp { brightness: 0.0 });
    }

    // -----------------------------------------------------------------------
    // Test 5: stale ids return None, listing follows creation order
    // -----------------------------------------------------------------------
    #[test]
    fn stale_ids_and_listing() {
        let mut c = control();
        let a = add(&mut c, ComponentKind::Cell);
        let b = add(&mut c, ComponentKind::Resistor);
        let d = add(&mut c, ComponentKind::Bulb);
        c.remove(b).unwrap();

        assert!(c.network.component_snapshot(b).is_none());
        let all = c.network.component_snapshots();
        assert_eq!(
            all.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![a, d]
        );
    }
}
