//! Numeric floor shared by the whole solver: sentinel resistances, comparison
//! thresholds, and unit conversions.
//!
//! True zero and true infinity are never stored as resistances. Every value is
//! clamped into the `[NEAR_ZERO_OHMS, NEAR_INFINITE_OHMS]` band before it can
//! reach a division, which keeps Ohm's law well-defined everywhere.

/// Simulation tick counter.
pub type Ticks = u64;

/// Stand-in for a true zero resistance (ideal conductors, closed switches).
pub const NEAR_ZERO_OHMS: f64 = 1e-4;

/// Stand-in for an unrepresentable infinite resistance (open paths, meters).
pub const NEAR_INFINITE_OHMS: f64 = 1e7;

/// Charge fraction at which a capacitor counts as full.
pub const FULL_CHARGE_RATIO: f64 = 0.993;

/// Currents below this magnitude count as "off".
pub const CURRENT_EPS: f64 = 1e-9;

/// Comparison tolerance for derived floating-point quantities.
pub const FLOAT_TOL: f64 = 1e-6;

/// Micro prefix, used to convert microfarads to farads.
pub const MICRO: f64 = 1e-6;

/// Degrees a motor shaft turns per amp per tick.
pub const MOTOR_DEGREES_PER_AMP_TICK: f64 = 6.0;

/// Wall-clock seconds represented by one tick at the nominal 60 Hz rate.
pub const DEFAULT_SECONDS_PER_TICK: f64 = 1.0 / 60.0;

/// Clamp a resistance into the representable band.
pub fn clamp_resistance(ohms: f64) -> f64 {
    if ohms.is_nan() {
        return NEAR_ZERO_OHMS;
    }
    ohms.clamp(NEAR_ZERO_OHMS, NEAR_INFINITE_OHMS)
}

/// True when the value sits at or below the near-zero sentinel.
pub fn is_near_zero(ohms: f64) -> bool {
    ohms <= NEAR_ZERO_OHMS
}

/// True when the value sits at or above the near-infinite sentinel.
pub fn is_near_infinite(ohms: f64) -> bool {
    ohms >= NEAR_INFINITE_OHMS
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp_resistance(0.0), NEAR_ZERO_OHMS);
        assert_eq!(clamp_resistance(-5.0), NEAR_ZERO_OHMS);
        assert_eq!(clamp_resistance(1e12), NEAR_INFINITE_OHMS);
        assert_eq!(clamp_resistance(10.0), 10.0);
    }

    #[test]
    fn clamp_rejects_nan() {
        assert_eq!(clamp_resistance(f64::NAN), NEAR_ZERO_OHMS);
    }

    #[test]
    fn sentinel_predicates() {
        assert!(is_near_zero(NEAR_ZERO_OHMS));
        assert!(is_near_zero(0.0));
        assert!(!is_near_zero(0.5));
        assert!(is_near_infinite(NEAR_INFINITE_OHMS));
        assert!(!is_near_infinite(1e6));
    }

    #[test]
    fn division_after_clamp_is_finite() {
        let i = 1.5 / clamp_resistance(0.0);
        assert!(i.is_finite());
        let i = 1.5 / clamp_resistance(f64::INFINITY);
        assert!(i.is_finite());
    }
}
