//! Arena key types. All graph entities are addressed by generational keys,
//! so a stale id held across a removal can never alias a new entity.

use slotmap::new_key_type;

new_key_type! {
    /// Key for a component in the network arena.
    pub struct ComponentId;

    /// Key for a wire in the network arena.
    pub struct WireId;

    /// Key for a circuit (series/parallel grouping) in the network arena.
    pub struct CircuitId;
}

// ===========================================================================
// Tests
// ===========================================================================
