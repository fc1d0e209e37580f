//! Hydrogen thruster controller.
//!
//! Same oxidizer handling as the engine: reservoirs are searched across
//! attached modules and the switch is driven through the guarded state
//! machine. Fuel flow follows the current thrust.

use std::sync::Arc;

use hecs::Entity;

use h2real_logic::config::H2Config;
use h2real_logic::energy::{combustion_balance, thruster_fuel_rate};
use h2real_logic::info::format_combustion_info;

use super::{combustion_report, react_combustion, HeatBehavior, OxidizerFeed};
use crate::components::ThrusterDrive;
use crate::thermal::ThermalEngine;
use crate::vehicle::Vehicle;

#[derive(Debug)]
pub struct ThrusterController {
    device: Entity,
    config: Arc<H2Config>,
    feed: OxidizerFeed,
}

impl ThrusterController {
    pub fn new(vehicle: &mut Vehicle, device: Entity, config: Arc<H2Config>) -> Self {
        Self {
            device,
            config,
            feed: OxidizerFeed::attach(vehicle, device),
        }
    }

    pub fn feed(&self) -> &OxidizerFeed {
        &self.feed
    }

    pub fn feed_mut(&mut self) -> &mut OxidizerFeed {
        &mut self.feed
    }

    fn drive(&self, vehicle: &Vehicle) -> Option<ThrusterDrive> {
        vehicle.world.get::<&ThrusterDrive>(self.device).ok().map(|d| *d)
    }

    /// Hydrogen flow at the current thrust (L/s).
    pub fn fuel_rate(&self, vehicle: &Vehicle) -> f32 {
        self.drive(vehicle)
            .map(|d| thruster_fuel_rate(d.current_thrust, d.fuel_converter_efficiency))
            .unwrap_or(0.0)
    }

    fn internal_rate(&self, thermal: &dyn ThermalEngine, fuel_rate: f32, delta_time: f32) -> f32 {
        combustion_balance(
            self.config.energy_per_liter,
            self.config.thruster_efficiency,
            fuel_rate,
            delta_time,
            thermal.thermal_capacity(self.device),
        )
        .temperature_delta
    }
}

impl HeatBehavior for ThrusterController {
    fn device(&self) -> Entity {
        self.device
    }

    fn heat_change(
        &mut self,
        vehicle: &mut Vehicle,
        thermal: &mut dyn ThermalEngine,
        delta_time: f32,
    ) -> f32 {
        let fuel_rate = self.fuel_rate(vehicle);
        self.feed.reconcile(vehicle, self.device, fuel_rate, delta_time);
        self.internal_rate(thermal, fuel_rate, delta_time)
            - thermal.ambient_heat_loss(self.device, delta_time)
    }

    fn react_on_new_heat(&mut self, vehicle: &mut Vehicle, thermal: &mut dyn ThermalEngine, heat: f32) {
        react_combustion(
            vehicle,
            thermal,
            self.device,
            heat,
            self.config.critical_temp(true),
            self.config.damage_fraction_on_overheat,
        );
    }

    fn cleanup(&mut self, vehicle: &mut Vehicle) {
        self.feed.detach(vehicle);
    }

    fn custom_info(&self, vehicle: &Vehicle, thermal: &dyn ThermalEngine) -> String {
        let thrust = self.drive(vehicle).map(|d| d.current_thrust).unwrap_or(0.0);
        let fuel_rate = self.fuel_rate(vehicle);
        let report = combustion_report(
            thermal,
            self.device,
            format!("Current Thrust: {:.2} kN", thrust / 1000.0),
            fuel_rate,
            self.internal_rate(thermal, fuel_rate, 1.0),
        );
        format_combustion_info(&report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::*;
    use crate::thermal::LumpedThermalModel;
    use h2real_logic::constants::resources;
    use h2real_logic::enable_state::EnableState;

    fn setup(efficiency: Option<f32>) -> (Vehicle, LumpedThermalModel, Entity, Entity) {
        let mut v = Vehicle::new();
        let hull = v.add_module("hull");
        let arm = v.add_module("arm");
        v.add_rotor(hull, Some(arm));
        // Oxygen lives on the hull, the thruster on the rotor arm.
        let tank = v.add_reservoir(Reservoir::new(hull, resources::OXYGEN, 10.0).with_fill(1.0));
        let mut drive = ThrusterDrive::new(6000.0, efficiency);
        drive.current_thrust = 3000.0;
        let thruster = v.add_thruster(
            Device::new(arm, "Thruster", "LargeBlockLargeHydrogenThrust", DeviceClass::Thruster),
            drive,
        );
        let mut thermal = LumpedThermalModel::new(20.0, 0.0);
        thermal.insert(thruster, 1_000_000.0);
        (v, thermal, thruster, tank)
    }

    #[test]
    fn test_oxygen_on_base_module_does_not_feed_rotor_arm() {
        let (mut v, mut thermal, thruster, _tank) = setup(Some(1.0));
        let mut c = ThrusterController::new(&mut v, thruster, Arc::new(H2Config::default()));
        c.heat_change(&mut v, &mut thermal, 1.0);
        // Rotor edges lead from base to top only.
        assert_eq!(c.feed().state(), EnableState::OperatorOnAndStarved);
        assert!(!v.is_enabled(thruster));
    }

    #[test]
    fn test_thrust_drives_oxygen_draw() {
        let (mut v, mut thermal, thruster, tank) = setup(Some(1.0));
        let arm = v.module_of(thruster).unwrap();
        let arm_tank = v.add_reservoir(Reservoir::new(arm, "", 10.0).with_fill(1.0));
        let mut c = ThrusterController::new(&mut v, thruster, Arc::new(H2Config::default()));

        c.heat_change(&mut v, &mut thermal, 1.0);
        // 3000 N × 1.0 / 1500 = 2 L/s hydrogen, 1 L oxygen.
        assert!((v.fill_ratio(arm_tank).unwrap() - 0.9).abs() < 1e-9);
        assert_eq!(v.fill_ratio(tank), Some(1.0));
        assert!(v.is_enabled(thruster));
    }

    #[test]
    fn test_missing_converter_means_no_fuel() {
        let (mut v, _thermal, thruster, _tank) = setup(None);
        let c = ThrusterController::new(&mut v, thruster, Arc::new(H2Config::default()));
        assert_eq!(c.fuel_rate(&v), 0.0);
    }

    #[test]
    fn test_panel_headline_in_kilonewtons() {
        let (mut v, thermal, thruster, _tank) = setup(Some(1.0));
        let c = ThrusterController::new(&mut v, thruster, Arc::new(H2Config::default()));
        let text = c.custom_info(&v, &thermal);
        assert!(text.starts_with("Current Thrust: 3.00 kN"));
        assert!(text.contains("Hydrogen consumption: 2.00 L/s"));
    }
}
