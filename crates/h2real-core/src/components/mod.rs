//! Component definitions for the vehicle world.
//!
//! Components are plain data attached to entities. Modules, joints,
//! reservoirs and devices are all entities; behavior lives in the
//! controllers and in [`crate::vehicle::Vehicle`].

mod devices;
mod storage;
mod structure;

pub mod entity_serde;

pub use devices::*;
pub use storage::*;
pub use structure::*;
