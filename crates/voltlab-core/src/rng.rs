//! Deterministic PRNG for simulation decisions.
//!
//! Uses the SplitMix64 algorithm: tiny state, fast, good enough statistical
//! properties for picking initial connector branches. Not cryptographic.
//! The full state is one `u64`, so it serializes into snapshots trivially and
//! replays are exactly reproducible.

/// Deterministic simulation RNG (SplitMix64).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    /// Create a new RNG from a seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Next raw 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Fair coin flip.
    pub fn coin(&mut self) -> bool {
        // Top bit; the low bits of SplitMix64 are fine too, but the top bit
        // keeps this independent from modulo-based draws.
        self.next_u64() >> 63 == 1
    }

    /// Current internal state, for snapshotting.
    pub fn state(&self) -> u64 {
        self.state
    }
}

// ===========================================================================
// Tests
// ===========================================================================
