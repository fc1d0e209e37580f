//! Hydrogen engine controller.

use std::sync::Arc;

use hecs::Entity;

use h2real_logic::config::H2Config;
use h2real_logic::energy::{combustion_balance, oxygen_sink_demand};
use h2real_logic::info::format_combustion_info;

use super::{combustion_report, react_combustion, HeatBehavior, OxidizerFeed};
use crate::components::EngineFuel;
use crate::thermal::ThermalEngine;
use crate::vehicle::Vehicle;

#[derive(Debug)]
pub struct EngineController {
    device: Entity,
    config: Arc<H2Config>,
    feed: OxidizerFeed,
    max_oxygen_input: f32,
}

impl EngineController {
    pub fn new(vehicle: &mut Vehicle, device: Entity, config: Arc<H2Config>) -> Self {
        let max_hydrogen = vehicle
            .world
            .get::<&EngineFuel>(device)
            .map(|f| f.max_hydrogen_input)
            .unwrap_or(0.0);
        Self {
            device,
            config,
            feed: OxidizerFeed::attach(vehicle, device),
            max_oxygen_input: oxygen_sink_demand(max_hydrogen),
        }
    }

    pub fn feed(&self) -> &OxidizerFeed {
        &self.feed
    }

    pub fn feed_mut(&mut self) -> &mut OxidizerFeed {
        &mut self.feed
    }

    /// Oxygen sink size declared for this engine (L/s).
    pub fn max_oxygen_input(&self) -> f32 {
        self.max_oxygen_input
    }

    /// Hydrogen intake (L/s); zero without a fuel sink.
    pub fn fuel_rate(&self, vehicle: &Vehicle) -> f32 {
        vehicle
            .world
            .get::<&EngineFuel>(self.device)
            .ok()
            .and_then(|f| f.hydrogen_input)
            .unwrap_or(0.0)
    }

    fn internal_rate(&self, thermal: &dyn ThermalEngine, fuel_rate: f32, delta_time: f32) -> f32 {
        combustion_balance(
            self.config.energy_per_liter,
            self.config.engine_efficiency,
            fuel_rate,
            delta_time,
            thermal.thermal_capacity(self.device),
        )
        .temperature_delta
    }
}

impl HeatBehavior for EngineController {
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
            self.config.critical_temp(false),
            self.config.damage_fraction_on_overheat,
        );
    }

    fn cleanup(&mut self, vehicle: &mut Vehicle) {
        self.feed.detach(vehicle);
    }

    fn custom_info(&self, vehicle: &Vehicle, thermal: &dyn ThermalEngine) -> String {
        let output = vehicle
            .world
            .get::<&EngineFuel>(self.device)
            .map(|f| f.current_output)
            .unwrap_or(0.0);
        let fuel_rate = self.fuel_rate(vehicle);
        let report = combustion_report(
            thermal,
            self.device,
            format!("Current Power Output: {:.2} MW", output),
            fuel_rate,
            self.internal_rate(thermal, fuel_rate, 1.0),
        );
        format_combustion_info(&report)
    }
}
