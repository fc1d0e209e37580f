//! Per-device heat controllers.
//!
//! Each managed device gets one [`DeviceController`]. The session drives it
//! through [`HeatBehavior`] once per tick: compute the intrinsic heat change
//! (running the oxidizer state machine for combustion devices), let the
//! thermal engine settle, then react to the new temperature.

mod engine;
mod gas_generator;
mod oxidizer;
mod thruster;

pub use engine::EngineController;
pub use gas_generator::GasGeneratorController;
pub use oxidizer::OxidizerFeed;
pub use thruster::ThrusterController;

use hecs::Entity;

use h2real_logic::enable_state::EnableState;
use h2real_logic::info::{CombustionReport, HeatSources};

use crate::components::Device;
use crate::thermal::ThermalEngine;
use crate::vehicle::{SubscriptionId, Vehicle};

/// Sound cue played when a device takes overheat damage.
pub const OVERHEAT_SOUND: &str = "ArcWepSmallMissileExplShip";

/// Thermal hooks every controller provides.
pub trait HeatBehavior {
    /// The device this controller manages.
    fn device(&self) -> Entity;

    /// Intrinsic temperature change over `delta_time` (°C), ambient loss included.
    fn heat_change(
        &mut self,
        vehicle: &mut Vehicle,
        thermal: &mut dyn ThermalEngine,
        delta_time: f32,
    ) -> f32;

    /// Called with the temperature the thermal engine settled on.
    fn react_on_new_heat(&mut self, vehicle: &mut Vehicle, thermal: &mut dyn ThermalEngine, heat: f32);

    /// Run the thermal engine's diffusion step for this device.
    fn spread_heat(&mut self, thermal: &mut dyn ThermalEngine, delta_time: f32) -> f32 {
        thermal.spread_heat(delta_time, self.device())
    }

    /// Release host subscriptions before the controller is dropped.
    fn cleanup(&mut self, vehicle: &mut Vehicle);

    /// Detail panel text.
    fn custom_info(&self, vehicle: &Vehicle, thermal: &dyn ThermalEngine) -> String;
}

/// Controller for any managed device class.
#[derive(Debug)]
pub enum DeviceController {
    Engine(EngineController),
    Thruster(ThrusterController),
    GasGenerator(GasGeneratorController),
}

impl DeviceController {
    fn behavior(&self) -> &dyn HeatBehavior {
        match self {
            Self::Engine(c) => c,
            Self::Thruster(c) => c,
            Self::GasGenerator(c) => c,
        }
    }

    fn behavior_mut(&mut self) -> &mut dyn HeatBehavior {
        match self {
            Self::Engine(c) => c,
            Self::Thruster(c) => c,
            Self::GasGenerator(c) => c,
        }
    }

    fn feed(&self) -> Option<&OxidizerFeed> {
        match self {
            Self::Engine(c) => Some(c.feed()),
            Self::Thruster(c) => Some(c.feed()),
            Self::GasGenerator(_) => None,
        }
    }

    fn feed_mut(&mut self) -> Option<&mut OxidizerFeed> {
        match self {
            Self::Engine(c) => Some(c.feed_mut()),
            Self::Thruster(c) => Some(c.feed_mut()),
            Self::GasGenerator(_) => None,
        }
    }

    /// Enabled-changed subscription, for combustion devices.
    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.feed().and_then(OxidizerFeed::subscription)
    }

    /// Current oxidizer state, for combustion devices.
    pub fn enable_state(&self) -> Option<EnableState> {
        self.feed().map(OxidizerFeed::state)
    }

    pub fn wants_on(&self) -> Option<bool> {
        self.feed().map(OxidizerFeed::wants_on)
    }

    /// Whether a controller write is still waiting for its echo.
    pub fn internal_write_pending(&self) -> bool {
        self.feed().map_or(false, OxidizerFeed::internal_write_pending)
    }

    /// Deliver an enabled-changed notification. Returns true if it was
    /// taken as an operator action.
    pub fn on_enabled_changed(&mut self, enabled: bool) -> bool {
        match self.feed_mut() {
            Some(feed) => feed.on_enabled_changed(enabled),
            None => false,
        }
    }

    /// Operator intent from the UI binding layer.
    pub fn set_operator_intent(&mut self, wants_on: bool) {
        if let Some(feed) = self.feed_mut() {
            feed.set_operator_intent(wants_on);
        }
    }
}

impl HeatBehavior for DeviceController {
    fn device(&self) -> Entity {
        self.behavior().device()
    }

    fn heat_change(
        &mut self,
        vehicle: &mut Vehicle,
        thermal: &mut dyn ThermalEngine,
        delta_time: f32,
    ) -> f32 {
        self.behavior_mut().heat_change(vehicle, thermal, delta_time)
    }

    fn react_on_new_heat(&mut self, vehicle: &mut Vehicle, thermal: &mut dyn ThermalEngine, heat: f32) {
        self.behavior_mut().react_on_new_heat(vehicle, thermal, heat)
    }

    fn spread_heat(&mut self, thermal: &mut dyn ThermalEngine, delta_time: f32) -> f32 {
        self.behavior_mut().spread_heat(thermal, delta_time)
    }

    fn cleanup(&mut self, vehicle: &mut Vehicle) {
        self.behavior_mut().cleanup(vehicle)
    }

    fn custom_info(&self, vehicle: &Vehicle, thermal: &dyn ThermalEngine) -> String {
        self.behavior().custom_info(vehicle, thermal)
    }
}

/// Apply overheat damage if `heat` reached `critical` on a functional device.
///
/// Returns whether damage was dealt.
pub(crate) fn check_overheat(
    vehicle: &mut Vehicle,
    device: Entity,
    heat: f32,
    critical: f32,
    damage_fraction: f32,
) -> bool {
    if heat < critical || !vehicle.is_functional(device) {
        return false;
    }
    let max_integrity = vehicle
        .world
        .get::<&Device>(device)
        .map(|d| d.max_integrity)
        .unwrap_or(0.0);
    let damage = max_integrity * damage_fraction;
    let left = vehicle.apply_damage(device, damage);
    vehicle.play_effect(device, OVERHEAT_SOUND);
    log::warn!(
        "{:?} overheated at {:.1} °C (critical {:.1}), took {:.1} damage, {:.1} left",
        device,
        heat,
        critical,
        damage,
        left
    );
    true
}

/// Heat-light, info refresh and overheat check shared by combustion devices.
pub(crate) fn react_combustion(
    vehicle: &mut Vehicle,
    thermal: &mut dyn ThermalEngine,
    device: Entity,
    heat: f32,
    critical: f32,
    damage_fraction: f32,
) {
    thermal.update_block_heat_light(vehicle, device, heat);
    vehicle.mark_info_dirty(device);
    vehicle.request_info_refresh(device);
    check_overheat(vehicle, device, heat, critical, damage_fraction);
}

/// Panel numbers shared by engines and thrusters, at one second of burn.
pub(crate) fn combustion_report(
    thermal: &dyn ThermalEngine,
    device: Entity,
    headline: String,
    fuel_rate: f32,
    internal: f32,
) -> CombustionReport {
    let exchange = thermal.neighbor_exchange(device);
    CombustionReport {
        headline,
        hydrogen_consumption: fuel_rate,
        oxygen_consumption: fuel_rate * h2real_logic::constants::OXIDIZER_PER_FUEL,
        temperature: thermal.heat(device),
        thermal_capacity: thermal.thermal_capacity(device),
        heat: HeatSources {
            internal,
            ambient_loss: thermal.ambient_heat_loss(device, 1.0),
            neighbor: exchange.neighbor,
            network: exchange.network,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{DeviceClass, EngineFuel};

    #[test]
    fn test_overheat_damage_is_fraction_of_max() {
        let mut v = Vehicle::new();
        let m = v.add_module("m");
        let engine = v.add_engine(
            Device::new(m, "Engine", "LargeHydrogenEngine", DeviceClass::Engine).with_integrity(500.0),
            EngineFuel::new(10.0),
        );

        assert!(!check_overheat(&mut v, engine, 299.0, 300.0, 0.2));
        assert!(check_overheat(&mut v, engine, 300.0, 300.0, 0.2));
        let integrity = v.world.get::<&Device>(engine).unwrap().integrity;
        assert_eq!(integrity, 400.0);
        assert_eq!(v.effects().len(), 1);
        assert_eq!(v.effects()[0].sound, OVERHEAT_SOUND);
    }

    #[test]
    fn test_broken_device_takes_no_more_damage() {
        let mut v = Vehicle::new();
        let m = v.add_module("m");
        let engine = v.add_engine(
            Device::new(m, "Engine", "LargeHydrogenEngine", DeviceClass::Engine).with_integrity(100.0),
            EngineFuel::new(10.0),
        );
        for _ in 0..5 {
            check_overheat(&mut v, engine, 1000.0, 300.0, 0.2);
        }
        assert!(!v.is_functional(engine));
        assert!(!check_overheat(&mut v, engine, 1000.0, 300.0, 0.2));
        assert_eq!(v.effects().len(), 5);
    }
}
