//! Generation - procedural creation of test vehicles
//!
//! Builds vehicles with a spanning tree of joints from the root module
//! outward, then sprinkles extra joints (cycles, self-loops) and
//! half-docked connector pairs on top. Every module stays reachable from
//! the root through the tree.

use hecs::Entity;
use rand::Rng;

use h2real_logic::connectivity::ConnectorState;
use h2real_logic::constants::resources;

use crate::components::*;
use crate::vehicle::Vehicle;

/// Configuration for vehicle generation
#[derive(Debug, Clone)]
pub struct VehicleConfig {
    pub name: String,
    pub modules: usize,
    /// Joints added on top of the spanning tree; may close cycles or loop
    /// back onto their own module.
    pub extra_joints: usize,
    /// Connector pairs added on top of the spanning tree.
    pub connector_pairs: usize,
    /// Share of extra connector pairs left half-docked.
    pub half_docked_ratio: f64,
    pub reservoirs_per_module: usize,
    pub engines: usize,
    pub thrusters: usize,
    pub gas_generators: usize,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            name: "Hauler".to_string(),
            modules: 8,
            extra_joints: 4,
            connector_pairs: 2,
            half_docked_ratio: 0.5,
            reservoirs_per_module: 2,
            engines: 2,
            thrusters: 4,
            gas_generators: 1,
        }
    }
}

/// Entities created by [`generate_vehicle`]
#[derive(Debug, Clone)]
pub struct VehicleLayout {
    pub name: String,
    pub root: Entity,
    pub modules: Vec<Entity>,
    pub reservoirs: Vec<Entity>,
    pub engines: Vec<Entity>,
    pub thrusters: Vec<Entity>,
    pub gas_generators: Vec<Entity>,
}

const TANK_SUBTYPES: [&str; 3] = [resources::OXYGEN, resources::DEFAULT, resources::HYDROGEN];

/// Standard large gas generator: 1 kg/s of ice, 1 MW, oxygen and hydrogen.
pub fn standard_generator_definition() -> GeneratorDefinition {
    GeneratorDefinition {
        ice_consumption_per_second: 1.0,
        operational_power: 1.0,
        produced_gases: vec![
            ProducedGas {
                gas: resources::OXYGEN.to_string(),
                ice_to_gas_ratio: 10.0,
            },
            ProducedGas {
                gas: resources::HYDROGEN.to_string(),
                ice_to_gas_ratio: 20.0,
            },
        ],
    }
}

/// Join `parent` to `child` with a random joint that leads parent → child.
fn link<R: Rng>(vehicle: &mut Vehicle, parent: Entity, child: Entity, rng: &mut R) {
    match rng.gen_range(0..3) {
        0 => {
            vehicle.add_rotor(parent, Some(child));
        }
        1 => {
            vehicle.add_piston(parent, Some(child));
        }
        _ => {
            let a = vehicle.add_connector(parent);
            let b = vehicle.add_connector(child);
            vehicle.dock(a, b);
        }
    }
}

pub fn generate_vehicle<R: Rng>(
    vehicle: &mut Vehicle,
    config: &VehicleConfig,
    rng: &mut R,
) -> VehicleLayout {
    let count = config.modules.max(1);
    let modules: Vec<Entity> = (0..count)
        .map(|i| vehicle.add_module(format!("{} module {}", config.name, i)))
        .collect();

    for i in 1..count {
        let parent = modules[rng.gen_range(0..i)];
        link(vehicle, parent, modules[i], rng);
    }

    for _ in 0..config.extra_joints {
        let a = modules[rng.gen_range(0..count)];
        let b = modules[rng.gen_range(0..count)];
        if rng.gen_bool(0.5) {
            vehicle.add_rotor(a, Some(b));
        } else {
            vehicle.add_piston(a, Some(b));
        }
    }

    for _ in 0..config.connector_pairs {
        let a = vehicle.add_connector(modules[rng.gen_range(0..count)]);
        let b = vehicle.add_connector(modules[rng.gen_range(0..count)]);
        vehicle.dock(a, b);
        if rng.gen_bool(config.half_docked_ratio.clamp(0.0, 1.0)) {
            vehicle.set_connector_state(a, ConnectorState::Connectable);
        }
    }

    let mut reservoirs = Vec::new();
    for &module in &modules {
        for _ in 0..config.reservoirs_per_module {
            let subtype = TANK_SUBTYPES[rng.gen_range(0..TANK_SUBTYPES.len())];
            let capacity = if rng.gen_bool(0.5) { 15_000.0 } else { 100_000.0 };
            let reservoir = Reservoir::new(module, subtype, capacity)
                .with_fill(rng.gen_range(0.0..=1.0))
                .with_reserve_only(rng.gen_bool(0.1));
            reservoirs.push(vehicle.add_reservoir(reservoir));
        }
    }

    let engines = (0..config.engines)
        .map(|i| {
            let module = modules[rng.gen_range(0..count)];
            let mut fuel = EngineFuel::new(10.0);
            fuel.hydrogen_input = Some(rng.gen_range(0.0..=10.0));
            vehicle.add_engine(
                Device::new(module, format!("H2 Engine {}", i), "LargeHydrogenEngine", DeviceClass::Engine)
                    .with_integrity(4000.0),
                fuel,
            )
        })
        .collect();

    let thrusters = (0..config.thrusters)
        .map(|i| {
            let module = modules[rng.gen_range(0..count)];
            let mut drive = ThrusterDrive::new(7_200_000.0, Some(1.0));
            drive.current_thrust = rng.gen_range(0.0..=drive.max_thrust);
            vehicle.add_thruster(
                Device::new(
                    module,
                    format!("H2 Thruster {}", i),
                    "LargeBlockLargeHydrogenThrust",
                    DeviceClass::Thruster,
                )
                .with_integrity(6000.0),
                drive,
            )
        })
        .collect();

    let gas_generators = (0..config.gas_generators)
        .map(|i| {
            let module = modules[rng.gen_range(0..count)];
            let mut unit = GasGeneratorUnit::new(standard_generator_definition());
            unit.producing = rng.gen_bool(0.5);
            vehicle.add_gas_generator(
                Device::new(
                    module,
                    format!("O2/H2 Generator {}", i),
                    "LargeOxygenGenerator",
                    DeviceClass::GasGenerator,
                ),
                unit,
            )
        })
        .collect();

    log::debug!(
        "generated '{}': {} modules, {} reservoirs",
        config.name,
        modules.len(),
        reservoirs.len()
    );

    VehicleLayout {
        name: config.name.clone(),
        root: modules[0],
        modules,
        reservoirs,
        engines,
        thrusters,
        gas_generators,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_vehicle() {
        let mut vehicle = Vehicle::new();
        let mut rng = StdRng::seed_from_u64(7);
        let config = VehicleConfig::default();
        let layout = generate_vehicle(&mut vehicle, &config, &mut rng);

        assert_eq!(layout.modules.len(), config.modules);
        assert_eq!(layout.reservoirs.len(), config.modules * config.reservoirs_per_module);
        assert_eq!(layout.engines.len(), config.engines);
        assert_eq!(layout.thrusters.len(), config.thrusters);
        assert_eq!(layout.gas_generators.len(), config.gas_generators);
        for &engine in &layout.engines {
            assert!(vehicle.world.get::<&EngineFuel>(engine).is_ok());
        }
    }

    #[test]
    fn test_every_module_reachable_from_root() {
        for seed in 0..20 {
            let mut vehicle = Vehicle::new();
            let mut rng = StdRng::seed_from_u64(seed);
            let layout = generate_vehicle(&mut vehicle, &VehicleConfig::default(), &mut rng);
            let reach = vehicle.reachable_modules(layout.root);
            assert_eq!(reach.len(), layout.modules.len(), "seed {}", seed);
        }
    }

    #[test]
    fn test_single_module_vehicle() {
        let mut vehicle = Vehicle::new();
        let mut rng = StdRng::seed_from_u64(1);
        let config = VehicleConfig {
            modules: 0,
            extra_joints: 3,
            connector_pairs: 1,
            ..VehicleConfig::default()
        };
        let layout = generate_vehicle(&mut vehicle, &config, &mut rng);
        assert_eq!(layout.modules.len(), 1);
        assert_eq!(vehicle.reachable_modules(layout.root), vec![layout.root]);
    }
}
