//! Fixed physical constants and resource identifiers.
//!
//! Tunable values (efficiencies, critical temperatures) live in
//! [`crate::config::H2Config`]; the numbers here never change at runtime.

/// Litres of oxygen burned per litre of hydrogen (2 H2 + O2).
pub const OXIDIZER_PER_FUEL: f32 = 0.5;

/// Thrust-to-flow divisor: `thrust × converter_efficiency / 1500` gives L/s.
pub const THRUST_TO_FLOW: f32 = 1500.0;

/// Joules per megajoule; power draws are reported in MW.
pub const ONE_MILLION: f32 = 1_000_000.0;

/// Resource subtype names as the host tags reservoirs and gases.
pub mod resources {
    pub const OXYGEN: &str = "Oxygen";
    pub const HYDROGEN: &str = "Hydrogen";
    /// Reservoirs with no subtype are the host's default oxygen tanks.
    pub const DEFAULT: &str = "";
}

/// Block subtype markers used by the behavior factories.
pub mod subtypes {
    pub const HYDROGEN_ENGINE: &str = "HydrogenEngine";
    pub const HYDROGEN_THRUSTER: &str = "HydrogenThrust";
}
