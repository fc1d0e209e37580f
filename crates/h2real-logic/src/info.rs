//! Text for the host's per-device detail panel.
//!
//! Pure formatting: controllers compute the numbers and these functions lay
//! them out. Heat rates are in °C/s, power in MW.

use std::fmt::Write;

use crate::constants::ONE_MILLION;

/// Heat flows shown under "Heat sources".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeatSources {
    /// Rate caused by the device itself.
    pub internal: f32,
    /// Rate lost to the surrounding air (positive = cooling).
    pub ambient_loss: f32,
    pub neighbor: f32,
    pub network: f32,
}

impl HeatSources {
    /// Net rate of temperature change.
    pub fn net(&self) -> f32 {
        self.internal - self.ambient_loss + self.neighbor + self.network
    }
}

/// Panel contents for an engine or thruster.
#[derive(Debug, Clone, PartialEq)]
pub struct CombustionReport {
    /// First line, e.g. "Current Thrust: 12.00 kN".
    pub headline: String,
    pub hydrogen_consumption: f32,
    pub oxygen_consumption: f32,
    pub temperature: f32,
    /// J/°C.
    pub thermal_capacity: f32,
    pub heat: HeatSources,
}

/// Panel contents for a gas generator.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorReport {
    pub temperature: f32,
    pub thermal_capacity: f32,
    pub processed_ice_kg: f32,
    /// Gas name and litres per second.
    pub products: Vec<(String, f32)>,
    pub electrolysis_power: f32,
    pub melting_power: f32,
    pub compression_power: f32,
    pub heat: HeatSources,
}

/// "Heating" above zero, "Cooling" below -0.01, otherwise "Stable".
pub fn heat_status(change: f32) -> &'static str {
    if change > 0.0 {
        "Heating"
    } else if change < -0.01 {
        "Cooling"
    } else {
        "Stable"
    }
}

/// Two decimals with an explicit sign, bare "0.00" for zero.
pub fn signed(value: f32) -> String {
    if (value * 100.0).round() == 0.0 {
        "0.00".to_string()
    } else {
        format!("{:+.2}", value)
    }
}

fn push_thermal_block(out: &mut String, temperature: f32, capacity: f32, heat: &HeatSources) {
    let change = heat.net();
    let _ = writeln!(out, "Temperature: {:.2} °C", temperature);
    let _ = writeln!(out, "Thermal Status: {}", heat_status(change));
    let _ = writeln!(out, "Net Heat Change: {} °C/s", signed(change));
    let _ = writeln!(out, "Thermal Capacity: {:.2} MJ/°C", capacity / ONE_MILLION);
}

fn push_heat_sources(out: &mut String, heat: &HeatSources) {
    out.push('\n');
    out.push_str("Heat sources:\n");
    let _ = writeln!(out, "  Internal use: {:.2} °C/s", heat.internal);
    let _ = writeln!(out, "  Air Exchange: {} °C/s", signed(-heat.ambient_loss));
    let _ = writeln!(out, "  Neighbors: {} °C/s", signed(heat.neighbor));
    let _ = writeln!(out, "  Networks: {} °C/s", signed(heat.network));
}

pub fn format_combustion_info(report: &CombustionReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", report.headline);
    out.push_str("--- HMS.H2Real ---\n");
    let _ = writeln!(out, "Hydrogen consumption: {:.2} L/s", report.hydrogen_consumption);
    let _ = writeln!(out, "Oxygen consumption: {:.2} L/s", report.oxygen_consumption);
    out.push('\n');
    push_thermal_block(&mut out, report.temperature, report.thermal_capacity, &report.heat);
    push_heat_sources(&mut out, &report.heat);
    out
}

pub fn format_generator_info(report: &GeneratorReport) -> String {
    let mut out = String::new();
    out.push_str("--- HMS.H2Real ---\n");
    push_thermal_block(&mut out, report.temperature, report.thermal_capacity, &report.heat);
    out.push('\n');
    out.push_str("Production:\n");
    let _ = writeln!(out, "  Ice consumption: {:.2} kg/s", report.processed_ice_kg);
    for (gas, rate) in &report.products {
        let _ = writeln!(out, "  {} production: {:.2} L/s", gas, rate);
    }
    out.push('\n');
    out.push_str("Power consumption:\n");
    let _ = writeln!(out, "  Electrolysis: {:.2} MW", report.electrolysis_power);
    let _ = writeln!(out, "  Melting: {:.2} MW", report.melting_power);
    let _ = writeln!(out, "  Compressing: {:.2} MW", report.compression_power);
    let total = report.electrolysis_power + report.melting_power + report.compression_power;
    let _ = writeln!(out, "Total: {:.2} MW", total);
    push_heat_sources(&mut out, &report.heat);
    out
}
