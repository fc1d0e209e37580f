//! H2Real Core - vehicle world and hydrogen device controllers
//!
//! An ECS model of a modular vehicle (modules joined by rotors, pistons and
//! docking connectors) carrying gas reservoirs and hydrogen devices. Every
//! engine, thruster and gas generator is driven by a controller that burns
//! oxygen alongside hydrogen, keeps the device's switch in line with the
//! operator's intent, and feeds its heat into a pluggable thermal engine.
//!
//! # Architecture
//!
//! - **Components**: plain data on `hecs` entities (Module, Joint, Reservoir, Device, ...)
//! - **Vehicle**: the host surface: joint graph, reservoir storage, the
//!   enabled switch and its notifications, UI and effect cues
//! - **Controllers**: one per managed device, built by the session's factories
//! - **Session**: attaches controllers and ticks them in order
//!
//! # Example
//!
//! ```rust
//! use h2real_core::prelude::*;
//! use h2real_logic::config::H2Config;
//!
//! let mut vehicle = Vehicle::new();
//! let hull = vehicle.add_module("hull");
//! vehicle.add_reservoir(Reservoir::new(hull, "Oxygen", 100.0).with_fill(1.0));
//! let engine = vehicle.add_engine(
//!     Device::new(hull, "Engine", "LargeHydrogenEngine", DeviceClass::Engine),
//!     EngineFuel::new(10.0),
//! );
//!
//! let mut thermal = LumpedThermalModel::default();
//! thermal.insert(engine, 1_000_000.0);
//!
//! let mut session = HeatSession::with_default_factories(H2Config::default());
//! session.attach(&mut vehicle, hull);
//! session.tick(&mut vehicle, &mut thermal, 1.0 / 60.0);
//! assert!(vehicle.is_enabled(engine));
//! ```

pub mod components;
pub mod controllers;
pub mod generation;
pub mod persistence;
pub mod session;
pub mod thermal;
pub mod vehicle;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::controllers::{DeviceController, HeatBehavior};
    pub use crate::session::HeatSession;
    pub use crate::thermal::{LumpedThermalModel, ThermalEngine};
    pub use crate::vehicle::Vehicle;
}
