//! Directed wires between component terminals.

use crate::component::Position;
use crate::id::ComponentId;

// ---------------------------------------------------------------------------
// Materials
// ---------------------------------------------------------------------------

/// Conductor material of a wire. `Ideal` contributes no resistance at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum WireMaterial {
    #[default]
    Ideal,
    Copper,
    Aluminum,
    Nichrome,
}

impl WireMaterial {
    /// Resistivity in ohm-metres.
    pub fn resistivity(self) -> f64 {
        match self {
            WireMaterial::Ideal => 0.0,
            WireMaterial::Copper => 1.68e-8,
            WireMaterial::Aluminum => 2.65e-8,
            WireMaterial::Nichrome => 1.10e-6,
        }
    }
}

// ---------------------------------------------------------------------------
// WireSpec
// ---------------------------------------------------------------------------

/// Electrical description of a wire: material and gauge.
///
/// The resistance is `rho * length / area`. With the default `Ideal` material
/// it is exactly zero and the wire never shows up in a circuit's total.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WireSpec {
    pub material: WireMaterial,
    pub length_m: f64,
    pub cross_section_mm2: f64,
}

impl WireSpec {
    /// An ideal (zero-resistance) hookup wire.
    pub fn ideal() -> Self {
        Self {
            material: WireMaterial::Ideal,
            length_m: 0.1,
            cross_section_mm2: 1.0,
        }
    }

    /// A resistive wire of the given material and gauge.
    pub fn resistive(material: WireMaterial, length_m: f64, cross_section_mm2: f64) -> Self {
        Self {
            material,
            length_m,
            cross_section_mm2,
        }
    }

    /// Resistance in ohms. Degenerate gauges resolve to zero rather than
    /// dividing by zero.
    pub fn resistance(&self) -> f64 {
        let area_m2 = self.cross_section_mm2 * 1e-6;
        if area_m2 <= 0.0 || self.length_m <= 0.0 {
            return 0.0;
        }
        self.material.resistivity() * self.length_m / area_m2
    }
}

impl Default for WireSpec {
    fn default() -> Self {
        Self::ideal()
    }
}

// ---------------------------------------------------------------------------
// Wire
// ---------------------------------------------------------------------------

/// A directed edge from one component's output terminal to another
/// component's input terminal.
#[derive(Debug, Clone)]
pub struct Wire {
    pub source: ComponentId,
    pub dest: ComponentId,
    /// Render-only polyline. Never consulted by the solver.
    pub path: Vec<Position>,
    pub spec: WireSpec,
}

impl Wire {
    /// Resistance contributed by this wire.
    pub fn resistance(&self) -> f64 {
        self.spec.resistance()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
