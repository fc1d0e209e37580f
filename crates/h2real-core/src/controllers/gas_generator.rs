//! Gas generator controller: ice melting and gas compression.
//!
//! Melting pays from the block's stored heat first and from the power grid
//! for the rest; compressing into fuller reservoirs costs more power. Both
//! extra draws are added to the generator's required electrical input.

use std::sync::Arc;

use hecs::Entity;

use h2real_logic::config::H2Config;
use h2real_logic::energy::{generator_balance, GasOutput, GeneratorBalance, GeneratorInputs};
use h2real_logic::info::{format_generator_info, GeneratorReport, HeatSources};

use super::HeatBehavior;
use crate::components::GasGeneratorUnit;
use crate::thermal::ThermalEngine;
use crate::vehicle::Vehicle;

#[derive(Debug)]
pub struct GasGeneratorController {
    device: Entity,
    config: Arc<H2Config>,
}

impl GasGeneratorController {
    pub fn new(device: Entity, config: Arc<H2Config>) -> Self {
        Self { device, config }
    }

    fn unit(&self, vehicle: &Vehicle) -> Option<GasGeneratorUnit> {
        vehicle
            .world
            .get::<&GasGeneratorUnit>(self.device)
            .ok()
            .map(|u| (*u).clone())
    }

    /// Balance for one step of `delta_time`, or `None` when the generator is
    /// idle, broken, or lacks a definition or power sink.
    pub fn balance(
        &self,
        vehicle: &Vehicle,
        thermal: &dyn ThermalEngine,
        delta_time: f32,
    ) -> Option<(GeneratorBalance, Vec<GasOutput>)> {
        let unit = self.unit(vehicle)?;
        if !unit.working || unit.power_sink.is_none() {
            return None;
        }
        let definition = unit.definition?;
        if !unit.producing {
            return Some((GeneratorBalance::default(), Vec::new()));
        }

        let root = vehicle.module_of(self.device)?;
        let outputs: Vec<GasOutput> = definition
            .produced_gases
            .iter()
            .map(|g| GasOutput {
                gas: g.gas.clone(),
                ice_to_gas_ratio: g.ice_to_gas_ratio,
                destination_fill: vehicle.destination_fill(root, &g.gas),
            })
            .collect();
        let inputs = GeneratorInputs {
            operational_power: definition.operational_power,
            ice_rate: definition.ice_consumption_per_second,
            outputs: &outputs,
            temperature: thermal.heat(self.device),
            thermal_capacity: thermal.thermal_capacity(self.device),
        };
        let balance = generator_balance(
            &inputs,
            delta_time,
            self.config.ice_melting_energy_per_kg,
            self.config.gas_compression_power_full_per_liter,
        );
        Some((balance, outputs))
    }
}

impl HeatBehavior for GasGeneratorController {
    fn device(&self) -> Entity {
        self.device
    }

    fn heat_change(
        &mut self,
        vehicle: &mut Vehicle,
        thermal: &mut dyn ThermalEngine,
        delta_time: f32,
    ) -> f32 {
        let Some((balance, _)) = self.balance(vehicle, &*thermal, delta_time) else {
            return 0.0;
        };

        let previous = vehicle
            .world
            .get::<&GasGeneratorUnit>(self.device)
            .ok()
            .and_then(|u| u.power_sink.map(|s| s.required_input));
        let required = balance.required_input();
        if previous != Some(required) {
            vehicle.set_required_input(self.device, required);
        }

        balance.melting.used_temperature - thermal.ambient_heat_loss(self.device, delta_time)
    }

    fn react_on_new_heat(&mut self, vehicle: &mut Vehicle, _thermal: &mut dyn ThermalEngine, _heat: f32) {
        vehicle.mark_info_dirty(self.device);
        vehicle.request_info_refresh(self.device);
    }

    fn cleanup(&mut self, _vehicle: &mut Vehicle) {}

    fn custom_info(&self, vehicle: &Vehicle, thermal: &dyn ThermalEngine) -> String {
        let (balance, outputs) = self.balance(vehicle, thermal, 1.0).unwrap_or_default();
        let processed = balance.melting.processed_ice_kg;
        let exchange = thermal.neighbor_exchange(self.device);
        let report = GeneratorReport {
            temperature: thermal.heat(self.device),
            thermal_capacity: thermal.thermal_capacity(self.device),
            processed_ice_kg: processed,
            products: outputs
                .iter()
                .map(|o| (o.gas.clone(), o.produced(processed)))
                .collect(),
            electrolysis_power: balance.standard_power,
            melting_power: balance.melting.extra_power,
            compression_power: balance.compression_power,
            heat: HeatSources {
                internal: balance.melting.used_temperature,
                ambient_loss: thermal.ambient_heat_loss(self.device, 1.0),
                neighbor: exchange.neighbor,
                network: exchange.network,
            },
        };
        format_generator_info(&report)
    }
}
