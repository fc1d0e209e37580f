//! Gas storage components.

use hecs::Entity;
use serde::{Deserialize, Serialize};

use h2real_logic::depletion::ReservoirLevel;

use super::entity_serde;

/// Reservoir component - a gas tank mounted on a module
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservoir {
    /// Resource subtype ("" for the host's default tank).
    pub subtype: String,
    /// Capacity in litres.
    pub capacity: f64,
    /// Fill ratio in [0, 1].
    pub fill_ratio: f64,
    /// Stockpile mode: filled but never drained automatically.
    pub reserve_only: bool,
    /// Powered and functional; only working tanks count as destinations.
    pub working: bool,
    #[serde(with = "entity_serde")]
    pub module: Entity,
}

impl Reservoir {
    pub fn new(module: Entity, subtype: impl Into<String>, capacity: f64) -> Self {
        Self {
            subtype: subtype.into(),
            capacity,
            fill_ratio: 0.0,
            reserve_only: false,
            working: true,
            module,
        }
    }

    pub fn with_fill(mut self, fill_ratio: f64) -> Self {
        self.fill_ratio = fill_ratio.clamp(0.0, 1.0);
        self
    }

    pub fn with_reserve_only(mut self, reserve_only: bool) -> Self {
        self.reserve_only = reserve_only;
        self
    }

    pub fn with_working(mut self, working: bool) -> Self {
        self.working = working;
        self
    }

    pub fn level(&self) -> ReservoirLevel {
        ReservoirLevel::new(self.capacity, self.fill_ratio)
    }

    /// Stored volume in litres.
    pub fn stored(&self) -> f64 {
        self.capacity * self.fill_ratio
    }
}
