//! Reachability searches over the wire graph.
//!
//! Traces answer "can current get from here to there, and through what" --
//! capacitors use them to find their supply path and its resistance, and to
//! detect a discharge loop once the supply disappears.
//!
//! The search is a depth-first walk over wires. Each branch of the recursion
//! carries its own visited-wire set, so two sibling paths never poison each
//! other. When several routes reach the target, the one with the fewest hops
//! wins; among equal lengths the first one found is kept.

use std::collections::HashSet;

use crate::component::RoleState;
use crate::id::{ComponentId, WireId};
use crate::network::Network;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Which way a trace may walk a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraceDirection {
    /// Along outputs only, with the current.
    #[default]
    Forward,
    /// Along inputs only, against the current. Finds the supply side.
    Backward,
    /// Either way. Used for discharge-loop detection.
    Both,
}

/// Trace configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TraceOptions {
    pub direction: TraceDirection,
}

impl TraceOptions {
    pub fn forward() -> Self {
        Self {
            direction: TraceDirection::Forward,
        }
    }

    pub fn backward() -> Self {
        Self {
            direction: TraceDirection::Backward,
        }
    }

    /// Walk wires in either direction.
    pub fn unrestrained() -> Self {
        Self {
            direction: TraceDirection::Both,
        }
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

impl Network {
    /// Whether current can flow through a component at all.
    pub fn is_passable(&self, id: ComponentId) -> bool {
        let Some(comp) = self.components.get(id) else {
            return false;
        };
        if comp.blown {
            return false;
        }
        match &comp.role {
            RoleState::Switch(s) if !s.closed => return false,
            RoleState::Diode(d) if d.locked => return false,
            _ => {}
        }
        // A component holding its own circuit's break does not conduct.
        !self
            .circuits
            .get(comp.circuit)
            .is_some_and(|c| c.broken_by == Some(id))
    }

    /// Find the shortest live path from `start` to `target`.
    ///
    /// The returned path excludes `start` and ends with `target`; it is empty
    /// when `start == target`. `None` means unreachable.
    pub fn trace(
        &self,
        start: ComponentId,
        target: ComponentId,
        options: TraceOptions,
    ) -> Option<Vec<ComponentId>> {
        if start == target {
            return Some(Vec::new());
        }
        if !self.is_passable(start) || !self.is_passable(target) {
            return None;
        }
        let mut best = None;
        self.search(start, target, options, &HashSet::new(), &[], &mut best);
        best
    }

    /// Find the shortest loop from `start` back to itself. Each outgoing hop
    /// is seeded separately so the loop cannot reuse its first wire.
    pub fn trace_cycle(&self, start: ComponentId, options: TraceOptions) -> Option<Vec<ComponentId>> {
        if !self.is_passable(start) {
            return None;
        }
        let mut best = None;
        for (wire, next) in self.hops(start, options) {
            if !self.is_passable(next) {
                continue;
            }
            let mut visited = HashSet::new();
            visited.insert(wire);
            self.search(next, start, options, &visited, &[next], &mut best);
        }
        best
    }

    /// Summed resistance along a traced path.
    pub fn path_resistance(&self, path: &[ComponentId]) -> f64 {
        path.iter()
            .filter_map(|id| self.components.get(*id))
            .map(|c| c.effective_resistance())
            .sum()
    }

    fn search(
        &self,
        at: ComponentId,
        target: ComponentId,
        options: TraceOptions,
        visited: &HashSet<WireId>,
        path: &[ComponentId],
        best: &mut Option<Vec<ComponentId>>,
    ) {
        // Nothing longer than the current best can win.
        if let Some(len) = best.as_ref().map(|b| b.len())
            && path.len() + 1 >= len
        {
            return;
        }

        for (wire, next) in self.hops(at, options) {
            if visited.contains(&wire) {
                continue;
            }
            if next == target {
                let mut found = path.to_vec();
                found.push(next);
                // Strictly shorter replaces; ties keep the first found.
                if best.as_ref().is_none_or(|b| found.len() < b.len()) {
                    *best = Some(found);
                }
                continue;
            }
            if !self.is_passable(next) {
                continue;
            }
            let mut branch_visited = visited.clone();
            branch_visited.insert(wire);
            let mut branch_path = path.to_vec();
            branch_path.push(next);
            self.search(next, target, options, &branch_visited, &branch_path, best);
        }
    }

    /// Wires leaving `at` under the given direction, each paired with the
    /// component on the far end. Wires out of a fork respect the fork's
    /// active branch.
    fn hops(&self, at: ComponentId, options: TraceOptions) -> Vec<(WireId, ComponentId)> {
        let mut out = Vec::new();
        let Some(comp) = self.components.get(at) else {
            return out;
        };
        let forward = matches!(
            options.direction,
            TraceDirection::Forward | TraceDirection::Both
        );
        let backward = matches!(
            options.direction,
            TraceDirection::Backward | TraceDirection::Both
        );
        if forward {
            for w in &comp.outputs {
                if let Some(wire) = self.wires.get(*w)
                    && self.connector_allows(wire)
                {
                    out.push((*w, wire.dest));
                }
            }
        }
        if backward {
            for w in &comp.inputs {
                if let Some(wire) = self.wires.get(*w)
                    && self.connector_allows(wire)
                {
                    out.push((*w, wire.source));
                }
            }
        }
        out
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentKind, Position};
    use crate::connector::BranchMode;
    use crate::rng::SimRng;
    use crate::wire::WireSpec;

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn add(net: &mut Network, kind: ComponentKind) -> ComponentId {
        let mut rng = SimRng::new(23);
        let role = RoleState::for_kind(kind, &mut rng);
        net.create(kind, Position::default(), role)
    }

    fn link(net: &mut Network, a: ComponentId, b: ComponentId) {
        net.connect(a, b, Vec::new(), WireSpec::ideal()).unwrap();
    }

    fn close_switch(net: &mut Network, switch: ComponentId) {
        let circuit = net.component(switch).unwrap().circuit;
        if let Some(RoleState::Switch(s)) = net.component_mut(switch).map(|c| &mut c.role) {
            s.closed = true;
        }
        net.unbreak_circuit(circuit);
    }

    // -----------------------------------------------------------------------
    // Test 1: forward and backward single hops
    // -----------------------------------------------------------------------
    #[test]
    fn single_hop_each_direction() {
        let mut net = Network::new();
        let cell = add(&mut net, ComponentKind::Cell);
        let r = add(&mut net, ComponentKind::Resistor);
        link(&mut net, cell, r);

        assert_eq!(net.trace(cell, r, TraceOptions::forward()), Some(vec![r]));
        assert_eq!(net.trace(r, cell, TraceOptions::forward()), None);
        assert_eq!(net.trace(r, cell, TraceOptions::backward()), Some(vec![cell]));
    }

    // -----------------------------------------------------------------------
    // Test 2: start equals target yields an empty path
    // -----------------------------------------------------------------------
    #[test]
    fn trivial_trace_is_empty() {
        let mut net = Network::new();
        let r = add(&mut net, ComponentKind::Resistor);
        assert_eq!(net.trace(r, r, TraceOptions::forward()), Some(Vec::new()));
    }

    // -----------------------------------------------------------------------
    // Test 3: fewest hops wins over a longer route
    // -----------------------------------------------------------------------
    #[test]
    fn shortest_route_wins() {
        let mut net = Network::new();
        let fork = add(&mut net, ComponentKind::Splitter);
        let short = add(&mut net, ComponentKind::Resistor);
        let long_a = add(&mut net, ComponentKind::Resistor);
        let long_b = add(&mut net, ComponentKind::Resistor);
        let merge = add(&mut net, ComponentKind::Merge);
        link(&mut net, fork, short);
        link(&mut net, fork, long_a);
        link(&mut net, long_a, long_b);
        link(&mut net, short, merge);
        link(&mut net, long_b, merge);

        let path = net.trace(fork, merge, TraceOptions::forward()).unwrap();
        assert_eq!(path, vec![short, merge]);
    }

    // -----------------------------------------------------------------------
    // Test 4: open switches and blown parts block the walk
    // -----------------------------------------------------------------------
    #[test]
    fn impassable_components_block() {
        let mut net = Network::new();
        let cell = add(&mut net, ComponentKind::Cell);
        let switch = add(&mut net, ComponentKind::Switch);
        let bulb = add(&mut net, ComponentKind::Bulb);
        link(&mut net, cell, switch);
        link(&mut net, switch, bulb);

        // Switch starts open.
        assert_eq!(net.trace(bulb, cell, TraceOptions::backward()), None);

        close_switch(&mut net, switch);
        assert_eq!(
            net.trace(bulb, cell, TraceOptions::backward()),
            Some(vec![switch, cell])
        );

        net.component_mut(switch).unwrap().blown = true;
        assert_eq!(net.trace(bulb, cell, TraceOptions::backward()), None);
    }

    // -----------------------------------------------------------------------
    // Test 5: a full loop is found without reusing wires
    // -----------------------------------------------------------------------
    #[test]
    fn cycle_walks_whole_loop() {
        let mut net = Network::new();
        let cell = add(&mut net, ComponentKind::Cell);
        let r1 = add(&mut net, ComponentKind::Resistor);
        let r2 = add(&mut net, ComponentKind::Resistor);
        link(&mut net, cell, r1);
        link(&mut net, r1, r2);
        link(&mut net, r2, cell);

        let cycle = net.trace_cycle(r1, TraceOptions::forward()).unwrap();
        assert_eq!(cycle, vec![r2, cell, r1]);

        // No loop without the closing wire.
        let mut open = Network::new();
        let a = add(&mut open, ComponentKind::Resistor);
        let b = add(&mut open, ComponentKind::Resistor);
        link(&mut open, a, b);
        assert_eq!(open.trace_cycle(a, TraceOptions::unrestrained()), None);
    }

    // -----------------------------------------------------------------------
    // Test 6: unrestrained walks find a loop around a parallel sibling
    // -----------------------------------------------------------------------
    #[test]
    fn unrestrained_loop_through_sibling_branch() {
        let mut net = Network::new();
        let fork = add(&mut net, ComponentKind::Splitter);
        let cap = add(&mut net, ComponentKind::Capacitor);
        let bulb = add(&mut net, ComponentKind::Bulb);
        let merge = add(&mut net, ComponentKind::Merge);
        link(&mut net, fork, cap);
        link(&mut net, fork, bulb);
        link(&mut net, cap, merge);
        link(&mut net, bulb, merge);

        // Forward only cannot come back around.
        assert_eq!(net.trace_cycle(cap, TraceOptions::forward()), None);

        // Walking backward through the sibling closes the loop.
        let cycle = net.trace_cycle(cap, TraceOptions::unrestrained()).unwrap();
        assert_eq!(cycle.len(), 4);
        assert_eq!(cycle.last(), Some(&cap));
        assert!(cycle.contains(&bulb));
    }

    // -----------------------------------------------------------------------
    // Test 7: selector gates traversal to the active branch
    // -----------------------------------------------------------------------
    #[test]
    fn selector_restricts_to_active_branch() {
        let mut net = Network::new();
        let sel = add(&mut net, ComponentKind::Selector);
        let a = add(&mut net, ComponentKind::Resistor);
        let b = add(&mut net, ComponentKind::Resistor);
        link(&mut net, sel, a);
        link(&mut net, sel, b);

        net.set_branch_mode(sel, BranchMode::OnlyFirst).unwrap();
        assert!(net.trace(sel, a, TraceOptions::forward()).is_some());
        assert!(net.trace(sel, b, TraceOptions::forward()).is_none());

        net.set_branch_mode(sel, BranchMode::OnlySecond).unwrap();
        assert!(net.trace(sel, a, TraceOptions::forward()).is_none());
        assert!(net.trace(sel, b, TraceOptions::forward()).is_some());
    }

    // -----------------------------------------------------------------------
    // Test 8: path resistance sums effective member resistance
    // -----------------------------------------------------------------------
    #[test]
    fn path_resistance_sums_members() {
        let mut net = Network::new();
        let cell = add(&mut net, ComponentKind::Cell);
        let r1 = add(&mut net, ComponentKind::Resistor);
        let r2 = add(&mut net, ComponentKind::Resistor);
        link(&mut net, cell, r1);
        link(&mut net, r1, r2);

        let path = net.trace(cell, r2, TraceOptions::forward()).unwrap();
        assert_eq!(path, vec![r1, r2]);
        assert!((net.path_resistance(&path) - 20.0).abs() < 1e-9);
    }
}
