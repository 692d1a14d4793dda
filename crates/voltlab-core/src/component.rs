//! Component kinds, construction defaults, and per-component state.

use crate::capacitor::CapacitorState;
use crate::connector::ConnectorState;
use crate::diode::{DiodeDirection, DiodeState};
use crate::id::{CircuitId, WireId};
use crate::rng::SimRng;
use crate::units::{CURRENT_EPS, NEAR_INFINITE_OHMS, NEAR_ZERO_OHMS, Ticks};

// ---------------------------------------------------------------------------
// Construction defaults
// ---------------------------------------------------------------------------

/// Default cell EMF in volts.
pub const DEFAULT_CELL_VOLTS: f64 = 1.5;
/// Default AC source amplitude in volts.
pub const DEFAULT_AC_VOLTS: f64 = 2.0;
/// Default AC polarity half-period in ticks.
pub const DEFAULT_AC_HALF_PERIOD: Ticks = 60;
/// Default capacitor size in microfarads.
pub const DEFAULT_CAPACITANCE_MICROFARADS: f64 = 100.0;

/// Max-current rating for parts that never blow. Large enough that even a
/// discharge surge through a near-zero sentinel resistance stays below it,
/// while remaining a plain finite float for serialization.
const UNBLOWABLE_AMPS: f64 = 1e9;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// 2D placement on the board. Render geometry only; the solver never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

// ---------------------------------------------------------------------------
// ComponentKind
// ---------------------------------------------------------------------------

/// Closed set of component kinds. Behavior is dispatched by matching on this
/// enum; there is no open plugin surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ComponentKind {
    /// DC cell, 1.5 V by default.
    Cell,
    /// Square-wave source that flips polarity on a tick cadence.
    AcSource,
    Resistor,
    Bulb,
    /// Near-zero resistance, low max-current. Exists to blow first.
    Fuse,
    Motor,
    Heater,
    Diode,
    Led,
    Capacitor,
    /// Simple on/off switch. Starts open.
    Switch,
    /// Two-way selector switch: routes current into one of two branches.
    Selector,
    /// Splitting junction: feeds both branches in parallel.
    Splitter,
    /// Terminal junction where branches rejoin the enclosing circuit.
    Merge,
    /// Near-zero series resistance; reads current without disturbing it.
    Ammeter,
    /// Near-infinite resistance; reads voltage without conducting.
    Voltmeter,
}

/// Electrical construction defaults for a kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KindDefaults {
    pub resistance: f64,
    pub max_current: f64,
}

/// What a kind can do, resolved once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Supplies EMF; must stay in the root circuit.
    pub power_source: bool,
    /// Reports a brightness derived from current.
    pub luminous: bool,
    /// Dissipates meaningful heat under load.
    pub heat_emitting: bool,
    /// Member of the connector family (splitter, selector, merge).
    pub connector: bool,
    /// Enforces a conduction direction and can lock.
    pub directional: bool,
    /// Integrates time and must be stepped even when no current reaches it.
    pub accumulates_time: bool,
}

impl Capabilities {
    const NONE: Capabilities = Capabilities {
        power_source: false,
        luminous: false,
        heat_emitting: false,
        connector: false,
        directional: false,
        accumulates_time: false,
    };
}

impl ComponentKind {
    /// Every kind, in a stable order. Handy for property and fuzz harnesses.
    pub const ALL: [ComponentKind; 16] = [
        ComponentKind::Cell,
        ComponentKind::AcSource,
        ComponentKind::Resistor,
        ComponentKind::Bulb,
        ComponentKind::Fuse,
        ComponentKind::Motor,
        ComponentKind::Heater,
        ComponentKind::Diode,
        ComponentKind::Led,
        ComponentKind::Capacitor,
        ComponentKind::Switch,
        ComponentKind::Selector,
        ComponentKind::Splitter,
        ComponentKind::Merge,
        ComponentKind::Ammeter,
        ComponentKind::Voltmeter,
    ];

    /// Construction defaults (resistance, fault threshold).
    pub fn defaults(self) -> KindDefaults {
        let (resistance, max_current) = match self {
            ComponentKind::Cell => (NEAR_ZERO_OHMS, 5.0),
            ComponentKind::AcSource => (NEAR_ZERO_OHMS, 5.0),
            ComponentKind::Resistor => (10.0, 5.0),
            ComponentKind::Bulb => (6.0, 1.0),
            ComponentKind::Fuse => (NEAR_ZERO_OHMS, 3.0),
            ComponentKind::Motor => (4.0, 2.0),
            ComponentKind::Heater => (8.0, 2.0),
            ComponentKind::Diode => (1.0, 2.0),
            ComponentKind::Led => (2.0, 0.5),
            ComponentKind::Capacitor => (NEAR_ZERO_OHMS, 5.0),
            ComponentKind::Switch => (NEAR_ZERO_OHMS, UNBLOWABLE_AMPS),
            ComponentKind::Selector => (NEAR_ZERO_OHMS, UNBLOWABLE_AMPS),
            ComponentKind::Splitter => (NEAR_ZERO_OHMS, UNBLOWABLE_AMPS),
            ComponentKind::Merge => (NEAR_ZERO_OHMS, UNBLOWABLE_AMPS),
            ComponentKind::Ammeter => (NEAR_ZERO_OHMS, UNBLOWABLE_AMPS),
            ComponentKind::Voltmeter => (NEAR_INFINITE_OHMS, UNBLOWABLE_AMPS),
        };
        KindDefaults {
            resistance,
            max_current,
        }
    }

    /// Capability flags for this kind.
    pub fn capabilities(self) -> Capabilities {
        match self {
            ComponentKind::Cell => Capabilities {
                power_source: true,
                ..Capabilities::NONE
            },
            ComponentKind::AcSource => Capabilities {
                power_source: true,
                accumulates_time: true,
                ..Capabilities::NONE
            },
            ComponentKind::Bulb => Capabilities {
                luminous: true,
                heat_emitting: true,
                ..Capabilities::NONE
            },
            ComponentKind::Heater => Capabilities {
                heat_emitting: true,
                ..Capabilities::NONE
            },
            ComponentKind::Diode => Capabilities {
                directional: true,
                ..Capabilities::NONE
            },
            ComponentKind::Led => Capabilities {
                luminous: true,
                directional: true,
                ..Capabilities::NONE
            },
            ComponentKind::Capacitor => Capabilities {
                accumulates_time: true,
                ..Capabilities::NONE
            },
            ComponentKind::Selector | ComponentKind::Splitter | ComponentKind::Merge => {
                Capabilities {
                    connector: true,
                    ..Capabilities::NONE
                }
            }
            _ => Capabilities::NONE,
        }
    }

    /// How many incoming wires this kind accepts.
    pub fn input_capacity(self) -> usize {
        match self {
            ComponentKind::Merge => 2,
            _ => 1,
        }
    }

    /// How many outgoing wires this kind accepts.
    pub fn output_capacity(self) -> usize {
        match self {
            ComponentKind::Selector | ComponentKind::Splitter => 2,
            _ => 1,
        }
    }

    /// Connector that spawns branch circuits (selector or splitter).
    pub fn is_fork(self) -> bool {
        matches!(self, ComponentKind::Selector | ComponentKind::Splitter)
    }

    /// Any member of the connector family.
    pub fn is_connector(self) -> bool {
        self.capabilities().connector
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            ComponentKind::Cell => "cell",
            ComponentKind::AcSource => "ac source",
            ComponentKind::Resistor => "resistor",
            ComponentKind::Bulb => "bulb",
            ComponentKind::Fuse => "fuse",
            ComponentKind::Motor => "motor",
            ComponentKind::Heater => "heater",
            ComponentKind::Diode => "diode",
            ComponentKind::Led => "led",
            ComponentKind::Capacitor => "capacitor",
            ComponentKind::Switch => "switch",
            ComponentKind::Selector => "selector",
            ComponentKind::Splitter => "splitter",
            ComponentKind::Merge => "merge",
            ComponentKind::Ammeter => "ammeter",
            ComponentKind::Voltmeter => "voltmeter",
        }
    }
}

// ---------------------------------------------------------------------------
// Role state
// ---------------------------------------------------------------------------

/// Polarity source state shared by cells and AC sources.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceState {
    /// EMF magnitude in volts.
    pub voltage: f64,
    /// Whether the terminals are currently reversed.
    pub flipped: bool,
    /// Polarity flip cadence in ticks. `None` for DC cells.
    pub half_period: Option<Ticks>,
}

impl SourceState {
    /// Signed EMF: negative while flipped.
    pub fn signed_voltage(&self) -> f64 {
        if self.flipped {
            -self.voltage
        } else {
            self.voltage
        }
    }

    /// Reverse the terminals.
    pub fn flip(&mut self) {
        self.flipped = !self.flipped;
    }
}

/// On/off switch state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchState {
    pub closed: bool,
}

/// Motor shaft state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorState {
    /// Shaft angle in degrees, normalized to `[0, 360)`.
    pub angle_degrees: f64,
}

/// Kind-specific mutable state. One variant per behavioral family; kinds
/// without extra state use `Passive`.
#[derive(Debug, Clone, PartialEq)]
pub enum RoleState {
    /// Resistors, fuses, heaters, meters: nothing beyond the shared state.
    Passive,
    Source(SourceState),
    Motor(MotorState),
    Diode(DiodeState),
    Capacitor(CapacitorState),
    Switch(SwitchState),
    Connector(ConnectorState),
}

impl RoleState {
    /// Fresh role state for a kind. Selectors draw their initial branch from
    /// the RNG, which is why construction is routed through the coordinator.
    pub fn for_kind(kind: ComponentKind, rng: &mut SimRng) -> RoleState {
        match kind {
            ComponentKind::Cell => RoleState::Source(SourceState {
                voltage: DEFAULT_CELL_VOLTS,
                flipped: false,
                half_period: None,
            }),
            ComponentKind::AcSource => RoleState::Source(SourceState {
                voltage: DEFAULT_AC_VOLTS,
                flipped: false,
                half_period: Some(DEFAULT_AC_HALF_PERIOD),
            }),
            ComponentKind::Motor => RoleState::Motor(MotorState { angle_degrees: 0.0 }),
            ComponentKind::Diode | ComponentKind::Led => {
                RoleState::Diode(DiodeState::new(DiodeDirection::Right))
            }
            ComponentKind::Capacitor => {
                RoleState::Capacitor(CapacitorState::new(DEFAULT_CAPACITANCE_MICROFARADS))
            }
            ComponentKind::Switch => RoleState::Switch(SwitchState { closed: false }),
            ComponentKind::Selector => RoleState::Connector(ConnectorState::selector(rng)),
            ComponentKind::Splitter => RoleState::Connector(ConnectorState::splitter()),
            ComponentKind::Merge => RoleState::Connector(ConnectorState::merge()),
            _ => RoleState::Passive,
        }
    }

    pub fn as_source(&self) -> Option<&SourceState> {
        match self {
            RoleState::Source(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_source_mut(&mut self) -> Option<&mut SourceState> {
        match self {
            RoleState::Source(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_diode(&self) -> Option<&DiodeState> {
        match self {
            RoleState::Diode(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_diode_mut(&mut self) -> Option<&mut DiodeState> {
        match self {
            RoleState::Diode(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_capacitor(&self) -> Option<&CapacitorState> {
        match self {
            RoleState::Capacitor(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_capacitor_mut(&mut self) -> Option<&mut CapacitorState> {
        match self {
            RoleState::Capacitor(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_connector(&self) -> Option<&ConnectorState> {
        match self {
            RoleState::Connector(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_connector_mut(&mut self) -> Option<&mut ConnectorState> {
        match self {
            RoleState::Connector(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_switch(&self) -> Option<&SwitchState> {
        match self {
            RoleState::Switch(s) => Some(s),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// A single part on the board: shared electrical state plus connectivity.
#[derive(Debug, Clone)]
pub struct Component {
    pub kind: ComponentKind,
    pub caps: Capabilities,
    pub position: Position,
    /// Ohms. Sentinels stand in for zero and infinity.
    pub resistance: f64,
    /// Signed amps. The sign encodes flow direction; zero while the owning
    /// circuit is broken.
    pub current: f64,
    /// Fault threshold in amps.
    pub max_current: f64,
    /// Sticky fault flag. Never clears once set.
    pub blown: bool,
    /// Owning circuit.
    pub circuit: CircuitId,
    /// Wires this component drives, in connection order.
    pub outputs: Vec<WireId>,
    /// Wires driving this component, in connection order.
    pub inputs: Vec<WireId>,
    pub role: RoleState,
}

impl Component {
    /// Construct a component with its kind defaults, owned by `circuit`.
    pub fn new(
        kind: ComponentKind,
        position: Position,
        circuit: CircuitId,
        role: RoleState,
    ) -> Self {
        let defaults = kind.defaults();
        Self {
            kind,
            caps: kind.capabilities(),
            position,
            resistance: defaults.resistance,
            current: 0.0,
            max_current: defaults.max_current,
            blown: false,
            circuit,
            outputs: Vec::new(),
            inputs: Vec::new(),
            role,
        }
    }

    /// Resistance as seen by the solver. A locked diode reads near-infinite
    /// regardless of its configured resistance.
    pub fn effective_resistance(&self) -> f64 {
        if let RoleState::Diode(d) = &self.role
            && d.locked
        {
            return NEAR_INFINITE_OHMS;
        }
        self.resistance
    }

    /// Signed EMF contributed by this component (zero for non-sources).
    pub fn signed_voltage(&self) -> f64 {
        self.role.as_source().map_or(0.0, |s| s.signed_voltage())
    }

    /// Voltage drop across this component by Ohm's law.
    pub fn voltage_drop(&self) -> f64 {
        self.current * self.effective_resistance()
    }

    /// Power dissipated, in watts. Always non-negative.
    pub fn power(&self) -> f64 {
        self.voltage_drop() * self.current
    }

    /// Whether the part is carrying meaningful current and is not blown.
    pub fn is_on(&self) -> bool {
        !self.blown && self.current.abs() > CURRENT_EPS
    }

    /// Brightness in `[0, 1]` for luminous kinds, `None` otherwise.
    pub fn brightness(&self) -> Option<f64> {
        if !self.caps.luminous {
            return None;
        }
        if self.blown || self.max_current <= 0.0 {
            return Some(0.0);
        }
        Some((self.current.abs() / self.max_current).clamp(0.0, 1.0))
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn circuit_id() -> CircuitId {
        let mut sm = SlotMap::<CircuitId, ()>::with_key();
        sm.insert(())
    }

    fn passive(kind: ComponentKind) -> Component {
        Component::new(kind, Position::default(), circuit_id(), RoleState::Passive)
    }

    #[test]
    fn defaults_follow_kind_table() {
        let bulb = passive(ComponentKind::Bulb);
        assert_eq!(bulb.resistance, 6.0);
        assert_eq!(bulb.max_current, 1.0);

        let meter = passive(ComponentKind::Voltmeter);
        assert_eq!(meter.resistance, NEAR_INFINITE_OHMS);
    }

    #[test]
    fn capability_resolution() {
        assert!(ComponentKind::Cell.capabilities().power_source);
        assert!(ComponentKind::AcSource.capabilities().accumulates_time);
        assert!(ComponentKind::Led.capabilities().luminous);
        assert!(ComponentKind::Led.capabilities().directional);
        assert!(ComponentKind::Merge.capabilities().connector);
        assert!(!ComponentKind::Resistor.capabilities().connector);
    }

    #[test]
    fn terminal_capacities() {
        assert_eq!(ComponentKind::Splitter.output_capacity(), 2);
        assert_eq!(ComponentKind::Selector.output_capacity(), 2);
        assert_eq!(ComponentKind::Merge.input_capacity(), 2);
        assert_eq!(ComponentKind::Resistor.output_capacity(), 1);
        assert_eq!(ComponentKind::Resistor.input_capacity(), 1);
    }

    #[test]
    fn fork_classification() {
        assert!(ComponentKind::Splitter.is_fork());
        assert!(ComponentKind::Selector.is_fork());
        assert!(!ComponentKind::Merge.is_fork());
        assert!(ComponentKind::Merge.is_connector());
    }

    #[test]
    fn role_for_kind_defaults() {
        let mut rng = SimRng::new(3);
        let role = RoleState::for_kind(ComponentKind::Cell, &mut rng);
        let source = role.as_source().unwrap();
        assert_eq!(source.voltage, DEFAULT_CELL_VOLTS);
        assert!(!source.flipped);
        assert_eq!(source.half_period, None);

        let role = RoleState::for_kind(ComponentKind::AcSource, &mut rng);
        assert_eq!(role.as_source().unwrap().half_period, Some(DEFAULT_AC_HALF_PERIOD));

        let role = RoleState::for_kind(ComponentKind::Switch, &mut rng);
        assert!(!role.as_switch().unwrap().closed);
    }

    #[test]
    fn signed_voltage_flips_with_polarity() {
        let mut source = SourceState {
            voltage: 1.5,
            flipped: false,
            half_period: None,
        };
        assert_eq!(source.signed_voltage(), 1.5);
        source.flip();
        assert_eq!(source.signed_voltage(), -1.5);
        source.flip();
        assert_eq!(source.signed_voltage(), 1.5);
    }

    #[test]
    fn locked_diode_reads_near_infinite() {
        let mut rng = SimRng::new(0);
        let mut comp = Component::new(
            ComponentKind::Diode,
            Position::default(),
            circuit_id(),
            RoleState::for_kind(ComponentKind::Diode, &mut rng),
        );
        assert_eq!(comp.effective_resistance(), 1.0);
        if let RoleState::Diode(d) = &mut comp.role {
            d.locked = true;
        }
        assert_eq!(comp.effective_resistance(), NEAR_INFINITE_OHMS);
    }

    #[test]
    fn drop_and_power_follow_ohms_law() {
        let mut comp = passive(ComponentKind::Resistor);
        comp.resistance = 3.0;
        comp.current = 0.5;
        assert!((comp.voltage_drop() - 1.5).abs() < 1e-12);
        assert!((comp.power() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn is_on_thresholds() {
        let mut comp = passive(ComponentKind::Resistor);
        assert!(!comp.is_on());
        comp.current = 1e-12;
        assert!(!comp.is_on());
        comp.current = 0.25;
        assert!(comp.is_on());
        comp.blown = true;
        assert!(!comp.is_on());
    }

    #[test]
    fn brightness_only_for_luminous_kinds() {
        let mut bulb = passive(ComponentKind::Bulb);
        bulb.current = 0.5;
        assert_eq!(bulb.brightness(), Some(0.5));
        bulb.current = 5.0;
        assert_eq!(bulb.brightness(), Some(1.0));
        bulb.blown = true;
        assert_eq!(bulb.brightness(), Some(0.0));

        let resistor = passive(ComponentKind::Resistor);
        assert_eq!(resistor.brightness(), None);
    }
}
