//! Device components: the shared Device record plus per-class state.

use hecs::Entity;
use serde::{Deserialize, Serialize};

use super::entity_serde;

/// Device class, decides which controller manages a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceClass {
    Engine,
    Thruster,
    GasGenerator,
}

/// Device component - a functional block with an on/off switch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    /// Block subtype, e.g. "LargeHydrogenEngine".
    pub subtype: String,
    pub class: DeviceClass,
    pub enabled: bool,
    pub integrity: f32,
    pub max_integrity: f32,
    #[serde(with = "entity_serde")]
    pub module: Entity,
    /// Detail text needs rebuilding.
    pub info_dirty: bool,
    /// Times the host was asked to refresh the detail panel.
    pub info_refreshes: u32,
    /// Heat-light intensity last pushed by the thermal engine.
    pub heat_light: f32,
}

impl Device {
    pub fn new(
        module: Entity,
        name: impl Into<String>,
        subtype: impl Into<String>,
        class: DeviceClass,
    ) -> Self {
        Self {
            name: name.into(),
            subtype: subtype.into(),
            class,
            enabled: true,
            integrity: 1000.0,
            max_integrity: 1000.0,
            module,
            info_dirty: false,
            info_refreshes: 0,
            heat_light: 0.0,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_integrity(mut self, max_integrity: f32) -> Self {
        self.integrity = max_integrity;
        self.max_integrity = max_integrity;
        self
    }

    /// Functional while any integrity is left.
    pub fn is_functional(&self) -> bool {
        self.integrity > 0.0
    }
}

/// Hydrogen engine state: its fuel sink and output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineFuel {
    /// Current hydrogen intake (L/s); `None` when the engine has no fuel sink.
    pub hydrogen_input: Option<f32>,
    /// Maximum hydrogen intake (L/s).
    pub max_hydrogen_input: f32,
    /// Current electrical output (MW).
    pub current_output: f32,
}

impl EngineFuel {
    pub fn new(max_hydrogen_input: f32) -> Self {
        Self {
            hydrogen_input: Some(0.0),
            max_hydrogen_input,
            current_output: 0.0,
        }
    }
}

/// Hydrogen thruster state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThrusterDrive {
    /// Current thrust (N).
    pub current_thrust: f32,
    pub max_thrust: f32,
    /// Fuel-converter efficiency; `None` when the block has no converter.
    pub fuel_converter_efficiency: Option<f32>,
}

impl ThrusterDrive {
    pub fn new(max_thrust: f32, fuel_converter_efficiency: Option<f32>) -> Self {
        Self {
            current_thrust: 0.0,
            max_thrust,
            fuel_converter_efficiency,
        }
    }
}

/// One gas a generator produces from ice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducedGas {
    pub gas: String,
    /// Litres of gas per kg of ice.
    pub ice_to_gas_ratio: f32,
}

/// Static production figures of a gas generator block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorDefinition {
    /// Ice consumed per second while producing (kg/s).
    pub ice_consumption_per_second: f32,
    /// Base electrical draw while producing (MW).
    pub operational_power: f32,
    pub produced_gases: Vec<ProducedGas>,
}

/// Electrical sink of a generator
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PowerSink {
    /// Power requested from the grid (MW).
    pub required_input: f32,
    /// Number of writes to `required_input`.
    pub updates: u32,
}

/// Gas generator state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasGeneratorUnit {
    /// Currently producing gas.
    pub producing: bool,
    /// Powered and functional.
    pub working: bool,
    pub definition: Option<GeneratorDefinition>,
    pub power_sink: Option<PowerSink>,
}

impl GasGeneratorUnit {
    pub fn new(definition: GeneratorDefinition) -> Self {
        Self {
            producing: false,
            working: true,
            definition: Some(definition),
            power_sink: Some(PowerSink::default()),
        }
    }
}
