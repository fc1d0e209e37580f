//! Thermal engine the controllers plug into.
//!
//! Temperature storage, conduction between neighbors and heat networks
//! belong to the host. Controllers only ever talk to the [`ThermalEngine`]
//! trait; [`LumpedThermalModel`] is a single-node-per-device stand-in used by
//! the harness and the tests.

use std::collections::HashMap;

use hecs::Entity;

use crate::vehicle::Vehicle;

/// Heat rates from outside the device, in °C/s.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NeighborExchange {
    pub neighbor: f32,
    pub network: f32,
}

/// Host thermal engine.
pub trait ThermalEngine {
    /// Current temperature (°C).
    fn heat(&self, device: Entity) -> f32;

    /// J/°C.
    fn thermal_capacity(&self, device: Entity) -> f32;

    /// Temperature drop to the surrounding air over `delta_time` (°C, ≥ 0 when cooling).
    fn ambient_heat_loss(&self, device: Entity, delta_time: f32) -> f32;

    /// Exchange with adjacent blocks and heat networks.
    fn neighbor_exchange(&self, device: Entity) -> NeighborExchange;

    /// Queue a temperature change computed by a controller.
    fn apply_heat_change(&mut self, device: Entity, delta: f32);

    /// Settle queued changes and conduction for one tick; returns the new temperature.
    fn spread_heat(&mut self, delta_time: f32, device: Entity) -> f32;

    /// Push the glow intensity for `heat` to the host.
    fn update_block_heat_light(&mut self, vehicle: &mut Vehicle, device: Entity, heat: f32);
}

#[derive(Debug, Clone, Copy)]
struct ThermalNode {
    temperature: f32,
    capacity: f32,
    pending: f32,
}

/// One temperature per device, Newtonian cooling toward ambient.
#[derive(Debug, Clone)]
pub struct LumpedThermalModel {
    /// Air temperature (°C).
    pub ambient_temperature: f32,
    /// Heat loss per degree above ambient (W/°C).
    pub loss_coefficient: f32,
    /// Temperature at which the heat light is fully lit (°C).
    pub glow_temperature: f32,
    nodes: HashMap<Entity, ThermalNode>,
}

impl Default for LumpedThermalModel {
    fn default() -> Self {
        Self::new(20.0, 500.0)
    }
}

impl LumpedThermalModel {
    pub fn new(ambient_temperature: f32, loss_coefficient: f32) -> Self {
        Self {
            ambient_temperature,
            loss_coefficient,
            glow_temperature: 500.0,
            nodes: HashMap::new(),
        }
    }

    /// Track a device starting at ambient temperature.
    pub fn insert(&mut self, device: Entity, thermal_capacity: f32) {
        self.insert_at(device, thermal_capacity, self.ambient_temperature);
    }

    pub fn insert_at(&mut self, device: Entity, thermal_capacity: f32, temperature: f32) {
        self.nodes.insert(
            device,
            ThermalNode {
                temperature,
                capacity: thermal_capacity,
                pending: 0.0,
            },
        );
    }

    pub fn remove(&mut self, device: Entity) {
        self.nodes.remove(&device);
    }

    pub fn set_temperature(&mut self, device: Entity, temperature: f32) {
        if let Some(node) = self.nodes.get_mut(&device) {
            node.temperature = temperature;
        }
    }
}

impl ThermalEngine for LumpedThermalModel {
    fn heat(&self, device: Entity) -> f32 {
        self.nodes
            .get(&device)
            .map(|n| n.temperature)
            .unwrap_or(self.ambient_temperature)
    }

    fn thermal_capacity(&self, device: Entity) -> f32 {
        self.nodes.get(&device).map(|n| n.capacity).unwrap_or(0.0)
    }

    fn ambient_heat_loss(&self, device: Entity, delta_time: f32) -> f32 {
        match self.nodes.get(&device) {
            Some(node) if node.capacity > 0.0 => {
                self.loss_coefficient * (node.temperature - self.ambient_temperature) * delta_time
                    / node.capacity
            }
            _ => 0.0,
        }
    }

    fn neighbor_exchange(&self, _device: Entity) -> NeighborExchange {
        NeighborExchange::default()
    }

    fn apply_heat_change(&mut self, device: Entity, delta: f32) {
        if let Some(node) = self.nodes.get_mut(&device) {
            node.pending += delta;
        }
    }

    fn spread_heat(&mut self, _delta_time: f32, device: Entity) -> f32 {
        match self.nodes.get_mut(&device) {
            Some(node) => {
                node.temperature += node.pending;
                node.pending = 0.0;
                node.temperature
            }
            None => self.ambient_temperature,
        }
    }

    fn update_block_heat_light(&mut self, vehicle: &mut Vehicle, device: Entity, heat: f32) {
        let span = self.glow_temperature - self.ambient_temperature;
        let intensity = if span > 0.0 {
            ((heat - self.ambient_temperature) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        vehicle.set_heat_light(device, intensity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_change_lands_on_spread() {
        let mut v = Vehicle::new();
        let device = v.add_module("stand-in");
        let mut model = LumpedThermalModel::default();
        model.insert(device, 1000.0);

        model.apply_heat_change(device, 5.0);
        assert_eq!(model.heat(device), 20.0);
        assert_eq!(model.spread_heat(1.0, device), 25.0);
        assert_eq!(model.spread_heat(1.0, device), 25.0);
    }

    #[test]
    fn test_ambient_loss_is_proportional() {
        let mut v = Vehicle::new();
        let device = v.add_module("stand-in");
        let mut model = LumpedThermalModel::new(20.0, 100.0);
        model.insert_at(device, 1000.0, 30.0);
        // 100 W/°C × 10 °C / 1000 J/°C = 1 °C/s
        assert!((model.ambient_heat_loss(device, 1.0) - 1.0).abs() < 1e-6);
        assert!((model.ambient_heat_loss(device, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_device_is_inert() {
        let mut v = Vehicle::new();
        let device = v.add_module("stand-in");
        let model = LumpedThermalModel::default();
        assert_eq!(model.thermal_capacity(device), 0.0);
        assert_eq!(model.ambient_heat_loss(device, 1.0), 0.0);
    }
}
