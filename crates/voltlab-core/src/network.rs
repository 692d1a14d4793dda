//! The component network: arena storage plus validated graph mutations.
//!
//! All entities live in [`SlotMap`] arenas and refer to each other by key.
//! Mutations validate every precondition before touching storage, so a
//! rejected call leaves the graph exactly as it was.
//!
//! Circuit assignment happens at connection time:
//!
//! - a wire out of a fork connector (splitter or selector) places its
//!   destination in a child circuit one depth below, creating it on first use;
//! - the first wire into a merge connector re-elevates the merge into the
//!   parent of the source's circuit;
//! - any other wire pulls the destination into the source's circuit.
//!
//! Power sources are pinned to the root circuit; any placement that would
//! sink one deeper is rejected.

use slotmap::SlotMap;

use crate::circuit::Circuit;
use crate::component::{Component, ComponentKind, Position, RoleState};
use crate::event::{Event, EventBus};
use crate::id::{CircuitId, ComponentId, WireId};
use crate::wire::{Wire, WireSpec};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Structural errors raised by graph mutations. The graph is unchanged
/// whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    #[error("component cannot connect to itself")]
    SelfConnection,

    #[error("unknown component {0:?}")]
    ComponentNotFound(ComponentId),

    #[error("unknown wire {0:?}")]
    WireNotFound(WireId),

    #[error("duplicate connection from {source:?} to {dest:?}")]
    DuplicateConnection {
        // `r#` keeps thiserror from treating this field as the error source.
        r#source: ComponentId,
        dest: ComponentId,
    },

    #[error("output capacity {capacity} exhausted on {component:?}")]
    OutputCapacity {
        component: ComponentId,
        capacity: usize,
    },

    #[error("input capacity {capacity} exhausted on {component:?}")]
    InputCapacity {
        component: ComponentId,
        capacity: usize,
    },

    #[error("power sources must stay in the root circuit; {component:?} would sink deeper")]
    SourceBelowRoot { component: ComponentId },

    #[error("no parent circuit to re-elevate into from {circuit:?}")]
    MissingParentCircuit { circuit: CircuitId },

    #[error("{component:?} does not support {operation}")]
    UnsupportedOperation {
        component: ComponentId,
        operation: &'static str,
    },

    #[error("the network has been torn down")]
    TornDown,
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// Arena-backed component graph. The single source of truth for board state.
#[derive(Debug)]
pub struct Network {
    pub(crate) components: SlotMap<ComponentId, Component>,
    pub(crate) wires: SlotMap<WireId, Wire>,
    pub(crate) circuits: SlotMap<CircuitId, Circuit>,
    pub(crate) root: CircuitId,
    /// Component keys in creation order. Serialization indices and iteration
    /// order both come from here, so they survive arena slot reuse.
    pub(crate) creation_order: Vec<ComponentId>,
    pub events: EventBus,
}

/// Where a new wire's destination ends up.
enum Placement {
    Stay,
    Move(CircuitId),
    NewBranch { slot: usize },
}

/// Which branch circuit a fork's next connection feeds.
enum ForkSlot {
    Existing(CircuitId),
    Fresh(usize),
}

impl Network {
    pub fn new() -> Self {
        let mut circuits = SlotMap::with_key();
        let root = circuits.insert(Circuit::root());
        Self {
            components: SlotMap::with_key(),
            wires: SlotMap::with_key(),
            circuits,
            root,
            creation_order: Vec::new(),
            events: EventBus::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The root circuit id.
    pub fn root(&self) -> CircuitId {
        self.root
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id)
    }

    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.components.get_mut(id)
    }

    pub fn wire(&self, id: WireId) -> Option<&Wire> {
        self.wires.get(id)
    }

    pub fn circuit(&self, id: CircuitId) -> Option<&Circuit> {
        self.circuits.get(id)
    }

    /// Component ids in creation order.
    pub fn component_ids(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.creation_order.iter().copied()
    }

    pub fn wire_ids(&self) -> Vec<WireId> {
        self.wires.keys().collect()
    }

    pub fn circuit_ids(&self) -> Vec<CircuitId> {
        self.circuits.keys().collect()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }

    pub fn circuit_count(&self) -> usize {
        self.circuits.len()
    }

    /// Whether a circuit is broken, locally or through any ancestor.
    pub fn is_broken(&self, id: CircuitId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(circuit) = self.circuits.get(current) else {
                return false;
            };
            if circuit.broken {
                return true;
            }
            cursor = circuit.parent;
        }
        false
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Add a component to the root circuit. Open switches break their circuit
    /// immediately; everything else arrives electrically inert.
    pub fn create(&mut self, kind: ComponentKind, position: Position, role: RoleState) -> ComponentId {
        let opens_circuit = matches!(&role, RoleState::Switch(s) if !s.closed);
        let root = self.root;
        let id = self.components.insert(Component::new(kind, position, root, role));
        if let Some(circuit) = self.circuits.get_mut(root) {
            circuit.members.push(id);
        }
        self.creation_order.push(id);

        let tick = self.events.tick();
        self.events.emit(Event::ComponentAdded {
            component: id,
            kind,
            tick,
        });
        if opens_circuit {
            self.break_circuit(root, id);
        }
        id
    }

    /// Wire `source`'s output to `dest`'s input, re-homing `dest` into
    /// whatever circuit the connection implies.
    pub fn connect(
        &mut self,
        source: ComponentId,
        dest: ComponentId,
        path: Vec<Position>,
        spec: WireSpec,
    ) -> Result<WireId, NetworkError> {
        if source == dest {
            return Err(NetworkError::SelfConnection);
        }
        let src = self
            .components
            .get(source)
            .ok_or(NetworkError::ComponentNotFound(source))?;
        let dst = self
            .components
            .get(dest)
            .ok_or(NetworkError::ComponentNotFound(dest))?;

        // A re-wired pair reports as a duplicate even when the terminal is
        // already full.
        let duplicate = src
            .outputs
            .iter()
            .any(|w| self.wires.get(*w).is_some_and(|wire| wire.dest == dest));
        if duplicate {
            return Err(NetworkError::DuplicateConnection { source, dest });
        }
        let out_cap = src.kind.output_capacity();
        if src.outputs.len() >= out_cap {
            return Err(NetworkError::OutputCapacity {
                component: source,
                capacity: out_cap,
            });
        }
        let in_cap = dst.kind.input_capacity();
        if dst.inputs.len() >= in_cap {
            return Err(NetworkError::InputCapacity {
                component: dest,
                capacity: in_cap,
            });
        }

        // Decide where `dest` will live before touching anything.
        let src_circuit = src.circuit;
        let placement = if src.kind.is_fork() {
            if dst.caps.power_source {
                return Err(NetworkError::SourceBelowRoot { component: dest });
            }
            match self.fork_slot(source) {
                ForkSlot::Existing(child) => Placement::Move(child),
                ForkSlot::Fresh(slot) => Placement::NewBranch { slot },
            }
        } else if dst.kind == ComponentKind::Merge {
            if dst.inputs.is_empty() {
                let parent = self
                    .circuits
                    .get(src_circuit)
                    .and_then(|c| c.parent)
                    .ok_or(NetworkError::MissingParentCircuit {
                        circuit: src_circuit,
                    })?;
                Placement::Move(parent)
            } else {
                // Already elevated by its first input.
                Placement::Stay
            }
        } else {
            let src_depth = self.circuits.get(src_circuit).map_or(0, |c| c.depth);
            if dst.caps.power_source && src_depth > 0 {
                return Err(NetworkError::SourceBelowRoot { component: dest });
            }
            if dst.circuit == src_circuit {
                Placement::Stay
            } else {
                Placement::Move(src_circuit)
            }
        };

        // All checks passed; apply.
        let wire = self.wires.insert(Wire {
            source,
            dest,
            path,
            spec,
        });
        if let Some(src) = self.components.get_mut(source) {
            src.outputs.push(wire);
        }
        if let Some(dst) = self.components.get_mut(dest) {
            dst.inputs.push(wire);
        }

        match placement {
            Placement::Stay => {}
            Placement::Move(target) => self.move_component(dest, target),
            Placement::NewBranch { slot } => {
                let depth = self.circuits.get(src_circuit).map_or(0, |c| c.depth);
                let child = self
                    .circuits
                    .insert(Circuit::child_of(src_circuit, depth + 1));
                if let Some(state) = self
                    .components
                    .get_mut(source)
                    .and_then(|c| c.role.as_connector_mut())
                {
                    state.children[slot] = Some(child);
                }
                self.move_component(dest, child);
                self.enforce_branch_mode(source);
            }
        }

        let tick = self.events.tick();
        self.events.emit(Event::WireAdded {
            wire,
            source,
            dest,
            tick,
        });
        Ok(wire)
    }

    /// Remove a wire. Circuit membership is deliberately left alone; only a
    /// component removal re-homes anything.
    pub fn disconnect(&mut self, wire: WireId) -> Result<(), NetworkError> {
        let w = self.wires.get(wire).ok_or(NetworkError::WireNotFound(wire))?;
        let (source, dest) = (w.source, w.dest);
        if let Some(src) = self.components.get_mut(source) {
            src.outputs.retain(|x| *x != wire);
        }
        if let Some(dst) = self.components.get_mut(dest) {
            dst.inputs.retain(|x| *x != wire);
        }
        self.wires.remove(wire);

        let tick = self.events.tick();
        self.events.emit(Event::WireRemoved {
            wire,
            source,
            dest,
            tick,
        });
        Ok(())
    }

    /// Remove a component along with its wires. Fork connectors dissolve
    /// their branch circuits, re-homing the members into the connector's own
    /// circuit. Breaks caused by the removed component are cleared.
    pub fn remove(&mut self, id: ComponentId) -> Result<(), NetworkError> {
        let comp = self
            .components
            .get(id)
            .ok_or(NetworkError::ComponentNotFound(id))?;
        let home = comp.circuit;
        let attached: Vec<WireId> = comp
            .inputs
            .iter()
            .chain(comp.outputs.iter())
            .copied()
            .collect();
        let children = comp
            .role
            .as_connector()
            .map_or([None, None], |c| c.children);

        for wire in attached {
            let _ = self.disconnect(wire);
        }

        // Dissolve branch circuits back into the connector's home.
        for child in children.into_iter().flatten() {
            let members = self
                .circuits
                .get(child)
                .map(|c| c.members.clone())
                .unwrap_or_default();
            for member in members {
                self.move_component(member, home);
            }
            self.circuits.remove(child);
        }

        let held: Vec<CircuitId> = self
            .circuits
            .iter()
            .filter(|(_, c)| c.broken_by == Some(id))
            .map(|(cid, _)| cid)
            .collect();

        if let Some(circuit) = self.circuits.get_mut(home) {
            circuit.remove_member(id);
        }
        self.components.remove(id);
        self.creation_order.retain(|c| *c != id);

        for circuit in held {
            self.unbreak_circuit(circuit);
        }

        let tick = self.events.tick();
        self.events.emit(Event::ComponentRemoved {
            component: id,
            tick,
        });
        Ok(())
    }

    /// Tear everything down, leaving a fresh empty root.
    pub fn clear(&mut self) {
        self.components.clear();
        self.wires.clear();
        self.circuits.clear();
        self.creation_order.clear();
        self.root = self.circuits.insert(Circuit::root());
        self.events.clear_all();
    }

    // -----------------------------------------------------------------------
    // Break bookkeeping
    // -----------------------------------------------------------------------

    /// Break a circuit, recording the cause. First cause wins; re-breaking an
    /// already broken circuit is a no-op.
    pub(crate) fn break_circuit(&mut self, id: CircuitId, cause: ComponentId) {
        let tick = self.events.tick();
        let Some(circuit) = self.circuits.get_mut(id) else {
            return;
        };
        if circuit.broken {
            return;
        }
        circuit.broken = true;
        circuit.broken_by = Some(cause);
        self.events.emit(Event::CircuitBroken {
            circuit: id,
            cause,
            tick,
        });
    }

    /// Clear a circuit's local break, then re-assert any standing cause that
    /// was shadowed by the first-cause-wins rule (a blown member, an open
    /// switch, or a locked diode still in the circuit).
    pub(crate) fn unbreak_circuit(&mut self, id: CircuitId) {
        let tick = self.events.tick();
        let Some(circuit) = self.circuits.get_mut(id) else {
            return;
        };
        if !circuit.broken {
            return;
        }
        circuit.broken = false;
        circuit.broken_by = None;
        self.events.emit(Event::CircuitRestored { circuit: id, tick });
        self.reassert_breaks(id);
    }

    fn reassert_breaks(&mut self, id: CircuitId) {
        let members = self
            .circuits
            .get(id)
            .map(|c| c.members.clone())
            .unwrap_or_default();
        for member in members {
            let Some(comp) = self.components.get(member) else {
                continue;
            };
            let standing = comp.blown
                || match &comp.role {
                    RoleState::Switch(s) => !s.closed,
                    RoleState::Diode(d) => d.locked,
                    _ => false,
                };
            if standing {
                self.break_circuit(id, member);
                return;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Move a component between circuits, carrying any break it holds and
    /// keeping nested branch circuits rooted under the new location.
    pub(crate) fn move_component(&mut self, id: ComponentId, to: CircuitId) {
        let Some(comp) = self.components.get(id) else {
            return;
        };
        let from = comp.circuit;
        if from == to {
            return;
        }

        let holds_break = self
            .circuits
            .get(from)
            .is_some_and(|c| c.broken_by == Some(id));

        if let Some(old) = self.circuits.get_mut(from) {
            old.remove_member(id);
        }
        if holds_break {
            self.unbreak_circuit(from);
        }
        if let Some(new) = self.circuits.get_mut(to) {
            new.members.push(id);
        }
        if let Some(comp) = self.components.get_mut(id) {
            comp.circuit = to;
        }
        if holds_break {
            self.break_circuit(to, id);
        }

        let children = self
            .components
            .get(id)
            .and_then(|c| c.role.as_connector())
            .map(|c| c.children);
        if let Some(children) = children {
            for child in children.into_iter().flatten() {
                if let Some(circuit) = self.circuits.get_mut(child) {
                    circuit.parent = Some(to);
                }
                self.refresh_depths(child);
            }
        }
    }

    /// Recompute depths for a circuit subtree after a re-parenting.
    fn refresh_depths(&mut self, start: CircuitId) {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let parent_depth = self
                .circuits
                .get(id)
                .and_then(|c| c.parent)
                .and_then(|p| self.circuits.get(p))
                .map(|p| p.depth);
            if let (Some(depth), Some(circuit)) = (parent_depth, self.circuits.get_mut(id)) {
                circuit.depth = depth + 1;
            }
            let members = self
                .circuits
                .get(id)
                .map(|c| c.members.clone())
                .unwrap_or_default();
            for member in members {
                if let Some(state) = self
                    .components
                    .get(member)
                    .and_then(|c| c.role.as_connector())
                {
                    stack.extend(state.children.into_iter().flatten());
                }
            }
        }
    }

    /// Which branch circuit a fork's next connection feeds: first a surviving
    /// child with no live wire into it, otherwise a fresh slot.
    fn fork_slot(&self, fork: ComponentId) -> ForkSlot {
        let Some(comp) = self.components.get(fork) else {
            return ForkSlot::Fresh(0);
        };
        let children = comp
            .role
            .as_connector()
            .map_or([None, None], |c| c.children);

        for child in children.iter().flatten() {
            let wired = comp.outputs.iter().any(|w| {
                self.wires
                    .get(*w)
                    .and_then(|wire| self.components.get(wire.dest))
                    .is_some_and(|dest| dest.circuit == *child)
            });
            if !wired {
                return ForkSlot::Existing(*child);
            }
        }
        let free = children.iter().position(|c| c.is_none()).unwrap_or(0);
        ForkSlot::Fresh(free)
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
