//! Circuits: tree nodes grouping components at one nesting depth.

use crate::id::{CircuitId, ComponentId};

/// How a circuit combines its members' resistances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Composition {
    #[default]
    Series,
    Parallel,
}

/// A node in the circuit tree.
///
/// The root circuit sits at depth 0 and is the only place power sources may
/// live. Fork connectors spawn child circuits one depth below their own.
/// Break state is local; ancestor breaks are folded in by
/// [`Network::is_broken`](crate::network::Network::is_broken).
#[derive(Debug, Clone)]
pub struct Circuit {
    /// Member components, in arrival order.
    pub members: Vec<ComponentId>,
    pub composition: Composition,
    /// Root is 0; children are `parent.depth + 1`.
    pub depth: u32,
    pub parent: Option<CircuitId>,
    /// Local break flag.
    pub broken: bool,
    /// Component that caused the local break.
    pub broken_by: Option<ComponentId>,
    /// Current last propagated into this circuit by the solver.
    pub current: f64,
}

impl Circuit {
    /// The root circuit of a fresh network.
    pub fn root() -> Self {
        Self {
            members: Vec::new(),
            composition: Composition::Series,
            depth: 0,
            parent: None,
            broken: false,
            broken_by: None,
            current: 0.0,
        }
    }

    /// A child circuit hanging off a fork connector in `parent`.
    pub fn child_of(parent: CircuitId, depth: u32) -> Self {
        Self {
            members: Vec::new(),
            composition: Composition::Series,
            depth,
            parent: Some(parent),
            broken: false,
            broken_by: None,
            current: 0.0,
        }
    }

    /// Number of member components.
    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub(crate) fn remove_member(&mut self, id: ComponentId) {
        self.members.retain(|m| *m != id);
    }
}

// ===========================================================================
// Tests
// ===========================================================================
