//! H2Real Headless Simulation Harness
//!
//! Runs a scripted vehicle scenario plus randomized sweeps against the
//! controllers and the lumped thermal model. No host game, no rendering.
//!
//! Usage:
//!   cargo run -p h2real-simtest
//!   cargo run -p h2real-simtest -- --verbose

use std::collections::HashMap;

use hecs::Entity;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

use h2real_core::generation::{generate_vehicle, standard_generator_definition, VehicleConfig};
use h2real_core::prelude::*;
use h2real_core::vehicle::EffectCue;
use h2real_logic::config::{migrate, validate_config, H2Config, CONFIG_VERSION};
use h2real_logic::constants::resources;
use h2real_logic::energy::{combustion_balance, melting_balance};
use h2real_logic::locator::find_reservoirs;

// ── Scenario (JSON) ─────────────────────────────────────────────────────
const SCENARIO_JSON: &str = include_str!("../data/scenario.json");

#[derive(Debug, Deserialize)]
struct Scenario {
    name: String,
    delta_time: f32,
    ambient_temperature: f32,
    loss_coefficient: f32,
    modules: Vec<String>,
    joints: Vec<JointSpec>,
    #[serde(default)]
    docks: Vec<(String, String)>,
    reservoirs: Vec<ReservoirSpec>,
    devices: Vec<DeviceSpec>,
    steps: Vec<StepSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum JointSpec {
    Rotor { name: String, base: String, top: Option<String> },
    Piston { name: String, base: String, top: Option<String> },
    Connector { name: String, base: String },
}

#[derive(Debug, Deserialize)]
struct ReservoirSpec {
    name: String,
    module: String,
    subtype: String,
    capacity: f64,
    fill: f64,
    #[serde(default)]
    reserve_only: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ClassSpec {
    Engine,
    Thruster,
    GasGenerator,
}

#[derive(Debug, Deserialize)]
struct DeviceSpec {
    name: String,
    module: String,
    class: ClassSpec,
    subtype: String,
    thermal_capacity: f32,
    #[serde(default)]
    hydrogen_input: f32,
    #[serde(default)]
    thrust: f32,
    #[serde(default)]
    converter_efficiency: Option<f32>,
    #[serde(default)]
    producing: bool,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ActionSpec {
    Undock { connector: String },
    Dock { a: String, b: String },
    Refill { reservoir: String, fill: f64 },
    OperatorSet { device: String, enabled: bool },
    SetTemperature { device: String, temperature: f32 },
}

#[derive(Debug, Deserialize)]
struct StepSpec {
    label: String,
    #[serde(default)]
    actions: Vec<ActionSpec>,
    ticks: u32,
    #[serde(default)]
    expect_enabled: HashMap<String, bool>,
    #[serde(default)]
    expect_damaged: Vec<String>,
    /// Devices expected to emit an effect cue during the step.
    #[serde(default)]
    expect_cues: Vec<String>,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== H2Real Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Configuration defaults and migration
    results.extend(validate_config_logic(verbose));

    // 2. Energy balance spot checks
    results.extend(validate_energy_logic(verbose));

    // 3. Scripted scenario
    results.extend(run_scenario(verbose));

    // 4. Random vehicle sweep
    results.extend(validate_random_vehicles(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Configuration ────────────────────────────────────────────────────

fn validate_config_logic(_verbose: bool) -> Vec<TestResult> {
    println!("--- Configuration ---");
    let mut results = Vec::new();

    let issues = validate_config(&H2Config::default());
    results.push(TestResult {
        name: "config_defaults_valid".into(),
        passed: issues.is_empty(),
        detail: format!("{} issues", issues.len()),
    });

    let old = H2Config {
        engine_efficiency: 0.3,
        ..H2Config::default()
    };
    let m = migrate(old, Some("0.0.1"));
    results.push(TestResult {
        name: "config_old_version_resets".into(),
        passed: m.updated && m.config.engine_efficiency == 0.65,
        detail: format!("0.0.1 -> {} updated={}", CONFIG_VERSION, m.updated),
    });

    let text = H2Config::default().to_toml_string().unwrap_or_default();
    let reloaded = H2Config::from_toml_str(&text);
    results.push(TestResult {
        name: "config_toml_round_trip".into(),
        passed: !reloaded.updated && reloaded.config == H2Config::default(),
        detail: format!("{} bytes", text.len()),
    });

    results
}

// ── 2. Energy ───────────────────────────────────────────────────────────

fn validate_energy_logic(verbose: bool) -> Vec<TestResult> {
    println!("--- Energy balance ---");
    let mut results = Vec::new();
    let config = H2Config::default();

    let b = combustion_balance(
        config.energy_per_liter,
        config.engine_efficiency,
        2.0,
        1.0,
        1_000_000.0,
    );
    if verbose {
        println!("  engine @2 L/s: {:.1} W heat, {:.7} °C", b.heat_power, b.temperature_delta);
    }
    results.push(TestResult {
        name: "engine_heat_reference".into(),
        passed: (b.heat_power - 1046.5).abs() < 1e-2,
        detail: format!("{:.2} W", b.heat_power),
    });

    let m = melting_balance(10.0, 33_400.0, 1.0, 1.0, config.ice_melting_energy_per_kg);
    results.push(TestResult {
        name: "melting_exact_balance".into(),
        passed: m.extra_power == 0.0 && (m.used_temperature + 10.0).abs() < 1e-3,
        detail: format!("ΔT {:.3} °C, extra {:.3} MW", m.used_temperature, m.extra_power),
    });

    results
}

// ── 3. Scenario ─────────────────────────────────────────────────────────

struct ScenarioWorld {
    vehicle: Vehicle,
    thermal: LumpedThermalModel,
    session: HeatSession,
    names: HashMap<String, Entity>,
}

impl ScenarioWorld {
    fn entity(&self, name: &str) -> Option<Entity> {
        self.names.get(name).copied()
    }
}

fn build_scenario(scenario: &Scenario) -> Result<ScenarioWorld, String> {
    let mut vehicle = Vehicle::new();
    let mut names: HashMap<String, Entity> = HashMap::new();

    for name in &scenario.modules {
        names.insert(name.clone(), vehicle.add_module(name.clone()));
    }
    let lookup = |names: &HashMap<String, Entity>, name: &str| -> Result<Entity, String> {
        names
            .get(name)
            .copied()
            .ok_or_else(|| format!("unknown name '{}'", name))
    };

    for joint in &scenario.joints {
        let (name, entity) = match joint {
            JointSpec::Rotor { name, base, top } => {
                let top = top.as_deref().map(|t| lookup(&names, t)).transpose()?;
                (name, vehicle.add_rotor(lookup(&names, base)?, top))
            }
            JointSpec::Piston { name, base, top } => {
                let top = top.as_deref().map(|t| lookup(&names, t)).transpose()?;
                (name, vehicle.add_piston(lookup(&names, base)?, top))
            }
            JointSpec::Connector { name, base } => {
                (name, vehicle.add_connector(lookup(&names, base)?))
            }
        };
        names.insert(name.clone(), entity);
    }
    for (a, b) in &scenario.docks {
        vehicle.dock(lookup(&names, a)?, lookup(&names, b)?);
    }

    for spec in &scenario.reservoirs {
        let reservoir = Reservoir::new(lookup(&names, &spec.module)?, spec.subtype.clone(), spec.capacity)
            .with_fill(spec.fill)
            .with_reserve_only(spec.reserve_only);
        names.insert(spec.name.clone(), vehicle.add_reservoir(reservoir));
    }

    let mut thermal = LumpedThermalModel::new(scenario.ambient_temperature, scenario.loss_coefficient);
    for spec in &scenario.devices {
        let module = lookup(&names, &spec.module)?;
        let entity = match spec.class {
            ClassSpec::Engine => {
                let mut fuel = EngineFuel::new(spec.hydrogen_input.max(1.0) * 5.0);
                fuel.hydrogen_input = Some(spec.hydrogen_input);
                vehicle.add_engine(
                    Device::new(module, spec.name.clone(), spec.subtype.clone(), DeviceClass::Engine),
                    fuel,
                )
            }
            ClassSpec::Thruster => {
                let mut drive = ThrusterDrive::new(spec.thrust * 2.0, spec.converter_efficiency);
                drive.current_thrust = spec.thrust;
                vehicle.add_thruster(
                    Device::new(module, spec.name.clone(), spec.subtype.clone(), DeviceClass::Thruster),
                    drive,
                )
            }
            ClassSpec::GasGenerator => {
                let mut unit = GasGeneratorUnit::new(standard_generator_definition());
                unit.producing = spec.producing;
                vehicle.add_gas_generator(
                    Device::new(
                        module,
                        spec.name.clone(),
                        spec.subtype.clone(),
                        DeviceClass::GasGenerator,
                    ),
                    unit,
                )
            }
        };
        thermal.insert(entity, spec.thermal_capacity);
        names.insert(spec.name.clone(), entity);
    }

    let root = lookup(&names, scenario.modules.first().ok_or("scenario has no modules")?)?;
    let mut session = HeatSession::with_default_factories(H2Config::default());
    session.attach(&mut vehicle, root);
    // Modules the root cannot reach (e.g. across a one-way rotor) attach separately.
    for name in &scenario.modules {
        session.attach(&mut vehicle, names[name]);
    }

    Ok(ScenarioWorld {
        vehicle,
        thermal,
        session,
        names,
    })
}

fn apply_action(world: &mut ScenarioWorld, action: &ActionSpec) -> Result<(), String> {
    let find = |name: &str| {
        world
            .entity(name)
            .ok_or_else(|| format!("unknown name '{}'", name))
    };
    match action {
        ActionSpec::Undock { connector } => {
            let c = find(connector)?;
            world.vehicle.undock(c);
        }
        ActionSpec::Dock { a, b } => {
            let (a, b) = (find(a)?, find(b)?);
            world.vehicle.dock(a, b);
        }
        ActionSpec::Refill { reservoir, fill } => {
            let r = find(reservoir)?;
            world.vehicle.refill(r, *fill);
        }
        ActionSpec::OperatorSet { device, enabled } => {
            let d = find(device)?;
            world.session.operator_toggle(&mut world.vehicle, d, *enabled);
        }
        ActionSpec::SetTemperature {
            device,
            temperature,
        } => {
            let d = find(device)?;
            world.thermal.set_temperature(d, *temperature);
        }
    }
    Ok(())
}

fn check_step(world: &ScenarioWorld, step: &StepSpec, cues: &[EffectCue]) -> Result<String, String> {
    let mut checked = Vec::new();
    for (name, expected) in &step.expect_enabled {
        let device = world.entity(name).ok_or_else(|| format!("unknown device '{}'", name))?;
        let actual = world.vehicle.is_enabled(device);
        if actual != *expected {
            return Err(format!("{} enabled={} (expected {})", name, actual, expected));
        }
        checked.push(format!("{}={}", name, actual));
    }
    for name in &step.expect_damaged {
        let device = world.entity(name).ok_or_else(|| format!("unknown device '{}'", name))?;
        let damaged = world
            .vehicle
            .world
            .get::<&Device>(device)
            .map(|d| d.integrity < d.max_integrity)
            .unwrap_or(false);
        if !damaged {
            return Err(format!("{} not damaged", name));
        }
        checked.push(format!("{} damaged", name));
    }
    for name in &step.expect_cues {
        let device = world.entity(name).ok_or_else(|| format!("unknown device '{}'", name))?;
        match cues.iter().find(|cue| cue.device == device) {
            Some(cue) => checked.push(format!("{} cue '{}'", name, cue.sound)),
            None => return Err(format!("{} emitted no effect cue", name)),
        }
    }
    Ok(checked.join(", "))
}

fn run_scenario(verbose: bool) -> Vec<TestResult> {
    println!("--- Scenario ---");
    let mut results = Vec::new();

    let scenario: Scenario = match serde_json::from_str(SCENARIO_JSON) {
        Ok(s) => s,
        Err(e) => {
            results.push(TestResult {
                name: "scenario_parse".into(),
                passed: false,
                detail: format!("JSON parse error: {}", e),
            });
            return results;
        }
    };

    let mut world = match build_scenario(&scenario) {
        Ok(w) => w,
        Err(e) => {
            results.push(TestResult {
                name: "scenario_build".into(),
                passed: false,
                detail: e,
            });
            return results;
        }
    };
    results.push(TestResult {
        name: "scenario_build".into(),
        passed: world.session.controllers().len() == scenario.devices.len(),
        detail: format!(
            "'{}': {} controllers for {} devices",
            scenario.name,
            world.session.controllers().len(),
            scenario.devices.len()
        ),
    });

    for (i, step) in scenario.steps.iter().enumerate() {
        let outcome = step
            .actions
            .iter()
            .try_for_each(|action| apply_action(&mut world, action))
            .and_then(|()| {
                for _ in 0..step.ticks {
                    world
                        .session
                        .tick(&mut world.vehicle, &mut world.thermal, scenario.delta_time);
                }
                let cues = world.vehicle.take_effects();
                check_step(&world, step, &cues)
            });

        if verbose {
            println!("  step {}: {}", i + 1, step.label);
        }
        let (passed, detail) = match outcome {
            Ok(detail) => (true, format!("{}: {}", step.label, detail)),
            Err(e) => (false, format!("{}: {}", step.label, e)),
        };
        results.push(TestResult {
            name: format!("scenario_step_{}", i + 1),
            passed,
            detail,
        });
    }

    if verbose {
        if let Some(engine) = world.entity("engine") {
            if let Some(info) = world.session.custom_info(&world.vehicle, &world.thermal, engine) {
                println!("{}", info);
            }
        }
    }

    results
}

// ── 4. Random vehicles ──────────────────────────────────────────────────

fn validate_random_vehicles(verbose: bool) -> Vec<TestResult> {
    println!("--- Random vehicles ---");
    let mut results = Vec::new();
    let config = VehicleConfig {
        modules: 24,
        extra_joints: 24,
        connector_pairs: 6,
        ..VehicleConfig::default()
    };

    let mut unreachable = 0;
    let mut oxygen_grew = 0;
    let mut leaked_guards = 0;
    let seeds = 50u64;

    for seed in 0..seeds {
        let mut vehicle = Vehicle::new();
        let mut rng = StdRng::seed_from_u64(seed);
        let layout = generate_vehicle(&mut vehicle, &config, &mut rng);

        if vehicle.reachable_modules(layout.root).len() != layout.modules.len() {
            unreachable += 1;
        }

        let mut thermal = LumpedThermalModel::default();
        for &d in layout.engines.iter().chain(&layout.thrusters).chain(&layout.gas_generators) {
            thermal.insert(d, 2_000_000.0);
        }
        let mut session = HeatSession::with_default_factories(H2Config::default());
        session.attach(&mut vehicle, layout.root);

        let oxygen = |v: &Vehicle| -> f64 {
            find_reservoirs(v, layout.root, resources::OXYGEN)
                .into_iter()
                .filter_map(|r| v.world.get::<&Reservoir>(r).ok().map(|t| t.stored()))
                .sum()
        };
        let mut last = oxygen(&vehicle);
        for _ in 0..20 {
            session.tick(&mut vehicle, &mut thermal, 0.5);
            let now = oxygen(&vehicle);
            if now > last + 1e-6 {
                oxygen_grew += 1;
            }
            last = now;
            if session.controllers().iter().any(|c| c.internal_write_pending()) {
                leaked_guards += 1;
            }
        }
        if verbose && seed == 0 {
            println!(
                "  seed 0: {} modules, {} controllers, {:.1} L oxygen left",
                layout.modules.len(),
                session.controllers().len(),
                last
            );
        }
    }

    results.push(TestResult {
        name: "random_reachability".into(),
        passed: unreachable == 0,
        detail: format!("{}/{} vehicles fully reachable", seeds - unreachable, seeds),
    });
    results.push(TestResult {
        name: "random_oxygen_monotonic".into(),
        passed: oxygen_grew == 0,
        detail: format!("{} ticks with oxygen growth", oxygen_grew),
    });
    results.push(TestResult {
        name: "random_guard_never_leaks".into(),
        passed: leaked_guards == 0,
        detail: format!("{} ticks with a pending internal write", leaked_guards),
    });

    results
}
