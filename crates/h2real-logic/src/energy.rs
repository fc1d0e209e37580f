//! Heat and power balance per device class.
//!
//! All functions are tick-local and side-effect free: callers apply the
//! returned temperature changes and power draws themselves. Units follow the
//! host: fuel in L/s, heat in W (J/s), thermal capacity in J/°C,
//! temperatures in °C and electrical power in MW.

use serde::{Deserialize, Serialize};

use crate::constants::{ONE_MILLION, THRUST_TO_FLOW};

/// Heat released by burning fuel in a device of a given efficiency.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CombustionBalance {
    /// Chemical power of the fuel flow (W).
    pub chemical_power: f32,
    /// Share of the chemical power that ends up as heat (W).
    pub heat_power: f32,
    /// Temperature rise over the tick (°C).
    pub temperature_delta: f32,
}

/// Heat balance of a combustion engine burning `fuel_rate` L/s.
pub fn combustion_balance(
    energy_per_liter: f32,
    efficiency: f32,
    fuel_rate: f32,
    delta_time: f32,
    thermal_capacity: f32,
) -> CombustionBalance {
    let fuel_rate = fuel_rate.max(0.0);
    let chemical_power = energy_per_liter * fuel_rate;
    let heat_power = chemical_power * (1.0 - efficiency);
    let temperature_delta = if thermal_capacity > 0.0 {
        heat_power * delta_time / thermal_capacity
    } else {
        0.0
    };
    CombustionBalance {
        chemical_power,
        heat_power,
        temperature_delta,
    }
}

/// Hydrogen flow (L/s) of a thruster producing `current_thrust`.
///
/// A thruster without a fuel-converter definition burns nothing.
pub fn thruster_fuel_rate(current_thrust: f32, converter_efficiency: Option<f32>) -> f32 {
    match converter_efficiency {
        Some(efficiency) => (current_thrust * efficiency / THRUST_TO_FLOW).max(0.0),
        None => 0.0,
    }
}

/// Outcome of melting one tick's worth of ice.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MeltingBalance {
    /// Ice processed over the tick (kg).
    pub processed_ice_kg: f32,
    /// Temperature change caused by drawing stored heat (°C, ≤ 0).
    pub used_temperature: f32,
    /// Electrical power needed to cover what stored heat could not (MW).
    pub extra_power: f32,
}

/// Melt `ice_rate × delta_time` kg of ice, paying first from stored heat.
///
/// Stored heat is `temperature × thermal_capacity`. When it covers the
/// melting energy the block just cools down; otherwise all of it is spent and
/// the shortfall becomes extra electrical draw.
pub fn melting_balance(
    temperature: f32,
    thermal_capacity: f32,
    ice_rate: f32,
    delta_time: f32,
    melting_energy_per_kg: f32,
) -> MeltingBalance {
    let processed_ice_kg = (ice_rate * delta_time).max(0.0);
    let mut needed = processed_ice_kg * melting_energy_per_kg;
    if thermal_capacity <= 0.0 {
        return MeltingBalance {
            processed_ice_kg,
            used_temperature: 0.0,
            extra_power: needed / ONE_MILLION,
        };
    }

    let stored = temperature * thermal_capacity;
    if stored >= needed {
        return MeltingBalance {
            processed_ice_kg,
            used_temperature: -needed / thermal_capacity,
            extra_power: 0.0,
        };
    }

    let drawn = stored.max(0.0);
    needed -= drawn;
    MeltingBalance {
        processed_ice_kg,
        used_temperature: -drawn / thermal_capacity,
        extra_power: needed / ONE_MILLION,
    }
}

/// One gas a generator produces and how full its destination already is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasOutput {
    pub gas: String,
    /// Litres of gas per kg of ice.
    pub ice_to_gas_ratio: f32,
    /// Fill fraction of the reservoirs receiving this gas (0–1).
    pub destination_fill: f32,
}

impl GasOutput {
    /// Litres produced from `processed_ice_kg`.
    pub fn produced(&self, processed_ice_kg: f32) -> f32 {
        self.ice_to_gas_ratio * processed_ice_kg
    }
}

/// Electrical power (MW) to compress the produced gases into their reservoirs.
///
/// Compressing into a fuller reservoir costs more, linearly in the fill.
pub fn compression_power(
    outputs: &[GasOutput],
    processed_ice_kg: f32,
    power_per_liter_full: f32,
) -> f32 {
    outputs
        .iter()
        .map(|output| {
            output.produced(processed_ice_kg) * power_per_liter_full * output.destination_fill
                / ONE_MILLION
        })
        .sum()
}

/// Full electrical and thermal balance of a gas generator for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeneratorBalance {
    /// Base electrolysis draw while producing (MW).
    pub standard_power: f32,
    pub melting: MeltingBalance,
    /// Compression draw (MW).
    pub compression_power: f32,
}

impl GeneratorBalance {
    /// Melting shortfall plus compression (MW).
    pub fn extra_power(&self) -> f32 {
        self.melting.extra_power + self.compression_power
    }

    /// Everything the generator asks the power grid for (MW).
    pub fn required_input(&self) -> f32 {
        self.standard_power + self.extra_power()
    }
}

/// Inputs describing a producing gas generator.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorInputs<'a> {
    pub operational_power: f32,
    pub ice_rate: f32,
    pub outputs: &'a [GasOutput],
    pub temperature: f32,
    pub thermal_capacity: f32,
}

/// Balance of a producing generator; see [`melting_balance`] and
/// [`compression_power`].
pub fn generator_balance(
    inputs: &GeneratorInputs<'_>,
    delta_time: f32,
    melting_energy_per_kg: f32,
    compression_power_per_liter_full: f32,
) -> GeneratorBalance {
    let melting = melting_balance(
        inputs.temperature,
        inputs.thermal_capacity,
        inputs.ice_rate,
        delta_time,
        melting_energy_per_kg,
    );
    GeneratorBalance {
        standard_power: inputs.operational_power,
        melting,
        compression_power: compression_power(
            inputs.outputs,
            melting.processed_ice_kg,
            compression_power_per_liter_full,
        ),
    }
}

/// Maximum oxygen an engine may request, given its maximum hydrogen input.
pub fn oxygen_sink_demand(max_hydrogen_input: f32) -> f32 {
    max_hydrogen_input / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_heat() {
        let b = combustion_balance(1495.0, 0.65, 2.0, 1.0, 1_000_000.0);
        assert!((b.chemical_power - 2990.0).abs() < 1e-3);
        assert!((b.heat_power - 1046.5).abs() < 1e-3);
        assert!((b.temperature_delta - 0.0010465).abs() < 1e-8);
    }

    #[test]
    fn test_engine_idle_makes_no_heat() {
        let b = combustion_balance(1495.0, 0.65, 0.0, 1.0, 1_000_000.0);
        assert_eq!(b, CombustionBalance::default());
    }

    #[test]
    fn test_zero_capacity_yields_no_delta() {
        let b = combustion_balance(1495.0, 0.65, 2.0, 1.0, 0.0);
        assert_eq!(b.temperature_delta, 0.0);
        assert!(b.heat_power > 0.0);
    }

    #[test]
    fn test_thruster_fuel_rate() {
        assert!((thruster_fuel_rate(3000.0, Some(1.0)) - 2.0).abs() < 1e-6);
        assert!((thruster_fuel_rate(3000.0, Some(0.5)) - 1.0).abs() < 1e-6);
        assert_eq!(thruster_fuel_rate(3000.0, None), 0.0);
    }

    #[test]
    fn test_melting_exact_balance() {
        // 10 °C × 33400 J/°C = 334000 J, exactly one kg of ice.
        let m = melting_balance(10.0, 33_400.0, 1.0, 1.0, 334_000.0);
        assert_eq!(m.extra_power, 0.0);
        assert!((m.used_temperature + 10.0).abs() < 1e-4);
        assert_eq!(m.processed_ice_kg, 1.0);
    }

    #[test]
    fn test_melting_from_stored_heat() {
        let m = melting_balance(100.0, 100_000.0, 1.0, 1.0, 334_000.0);
        assert_eq!(m.extra_power, 0.0);
        assert!((m.used_temperature + 3.34).abs() < 1e-4);
    }

    #[test]
    fn test_melting_shortfall_becomes_power() {
        // 1 °C × 100000 J/°C = 100000 J stored; 234000 J short.
        let m = melting_balance(1.0, 100_000.0, 1.0, 1.0, 334_000.0);
        assert!((m.used_temperature + 1.0).abs() < 1e-5);
        assert!((m.extra_power - 0.234).abs() < 1e-5);
    }

    #[test]
    fn test_melting_below_zero_draws_everything_electrically() {
        let m = melting_balance(-5.0, 100_000.0, 1.0, 1.0, 334_000.0);
        assert_eq!(m.used_temperature, 0.0);
        assert!((m.extra_power - 0.334).abs() < 1e-5);
    }

    #[test]
    fn test_compression_scales_with_fill() {
        let outputs = vec![
            GasOutput {
                gas: "Oxygen".into(),
                ice_to_gas_ratio: 10.0,
                destination_fill: 0.5,
            },
            GasOutput {
                gas: "Hydrogen".into(),
                ice_to_gas_ratio: 20.0,
                destination_fill: 0.0,
            },
        ];
        // 10 L × 500 W × 0.5 = 2500 W.
        let p = compression_power(&outputs, 1.0, 500.0);
        assert!((p - 0.0025).abs() < 1e-7);
    }

    #[test]
    fn test_generator_required_input() {
        let outputs = vec![GasOutput {
            gas: "Oxygen".into(),
            ice_to_gas_ratio: 10.0,
            destination_fill: 1.0,
        }];
        let inputs = GeneratorInputs {
            operational_power: 1.0,
            ice_rate: 1.0,
            outputs: &outputs,
            temperature: 0.0,
            thermal_capacity: 100_000.0,
        };
        let b = generator_balance(&inputs, 1.0, 334_000.0, 500.0);
        assert!((b.melting.extra_power - 0.334).abs() < 1e-5);
        assert!((b.compression_power - 0.005).abs() < 1e-6);
        assert!((b.required_input() - 1.339).abs() < 1e-5);
    }

    #[test]
    fn test_oxygen_sink_demand() {
        assert_eq!(oxygen_sink_demand(10.0), 5.0);
    }
}
