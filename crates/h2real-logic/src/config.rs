//! Tunable constants and their persisted form.
//!
//! The configuration is an immutable value built once and handed to every
//! controller. On disk it is a TOML document tagged with the version that
//! wrote it; [`migrate`] decides, without touching I/O, whether a loaded
//! document is kept or reset to the current defaults.
//!
//! ```
//! use h2real_logic::config::{H2Config, CONFIG_VERSION};
//!
//! let loaded = H2Config::from_toml_str("system_version = \"0.9.0\"\nauto_update = false\n");
//! assert!(!loaded.updated);
//! assert_eq!(loaded.config.engine_efficiency, 0.65);
//! assert_eq!(CONFIG_VERSION, "1.0.0");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version written by this build.
pub const CONFIG_VERSION: &str = "1.0.0";

/// Runtime tunables for every H2 device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct H2Config {
    /// Reset the file to defaults whenever a different version wrote it.
    pub auto_update: bool,
    /// Energy to melt one kg of ice (J/kg).
    pub ice_melting_energy_per_kg: f32,
    /// Compression power per litre when the destination is full (W).
    pub gas_compression_power_full_per_liter: f32,
    /// Chemical energy of hydrogen (J/L).
    pub energy_per_liter: f32,
    pub thruster_efficiency: f32,
    pub engine_efficiency: f32,
    /// Engine temperature that starts overheat damage (°C).
    pub engine_critical_temp: f32,
    /// Thruster temperature that starts overheat damage (°C).
    pub thruster_critical_temp: f32,
    /// Share of max integrity removed per overheat event.
    pub damage_fraction_on_overheat: f32,
}

impl Default for H2Config {
    fn default() -> Self {
        Self {
            auto_update: true,
            ice_melting_energy_per_kg: 334_000.0,
            gas_compression_power_full_per_liter: 500.0,
            energy_per_liter: 1495.0,
            thruster_efficiency: 0.65,
            engine_efficiency: 0.65,
            engine_critical_temp: 300.0,
            thruster_critical_temp: 500.0,
            damage_fraction_on_overheat: 0.2,
        }
    }
}

/// On-disk layout: the settings plus the version that wrote them.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredConfig {
    system_version: Option<String>,
    #[serde(flatten)]
    config: H2Config,
}

/// Result of reconciling a loaded configuration with this build.
#[derive(Debug, Clone, PartialEq)]
pub struct Migration {
    pub config: H2Config,
    /// Whether the loaded values were replaced by defaults.
    pub updated: bool,
    /// Version found in the document, if any.
    pub from_version: Option<String>,
}

/// Decide whether a loaded configuration survives.
///
/// A document without a version, or one written by another version while
/// auto-update is on, is reset to defaults. The user's auto-update choice is
/// always carried over.
pub fn migrate(loaded: H2Config, loaded_version: Option<&str>) -> Migration {
    let update_needed = match loaded_version {
        None => true,
        Some(version) => loaded.auto_update && version != CONFIG_VERSION,
    };

    if !update_needed {
        return Migration {
            config: loaded,
            updated: false,
            from_version: loaded_version.map(str::to_string),
        };
    }

    log::info!(
        "config version mismatch, resetting {} to {} defaults",
        loaded_version.unwrap_or("unknown"),
        CONFIG_VERSION
    );
    Migration {
        config: H2Config {
            auto_update: loaded.auto_update,
            ..H2Config::default()
        },
        updated: true,
        from_version: loaded_version.map(str::to_string),
    }
}

/// Errors from reading or writing a configuration document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("config IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl H2Config {
    /// Parse and migrate a TOML document, failing on malformed input.
    pub fn try_from_toml_str(contents: &str) -> Result<Migration, ConfigError> {
        let stored: StoredConfig = toml::from_str(contents)?;
        Ok(migrate(stored.config, stored.system_version.as_deref()))
    }

    /// Parse and migrate a TOML document, falling back to defaults.
    ///
    /// On a parse failure the auto-update flag is still salvaged if the
    /// document has a readable boolean for it.
    pub fn from_toml_str(contents: &str) -> Migration {
        match Self::try_from_toml_str(contents) {
            Ok(migration) => migration,
            Err(e) => {
                log::warn!("failed to load config, using defaults: {}", e);
                Migration {
                    config: H2Config {
                        auto_update: salvage_auto_update(contents).unwrap_or(true),
                        ..H2Config::default()
                    },
                    updated: true,
                    from_version: None,
                }
            }
        }
    }

    /// Serialize with the current version tag.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        let stored = StoredConfig {
            system_version: Some(CONFIG_VERSION.to_string()),
            config: self.clone(),
        };
        Ok(toml::to_string_pretty(&stored)?)
    }

    /// Critical temperature for a device class.
    pub fn critical_temp(&self, is_thruster: bool) -> f32 {
        if is_thruster {
            self.thruster_critical_temp
        } else {
            self.engine_critical_temp
        }
    }
}

fn salvage_auto_update(contents: &str) -> Option<bool> {
    contents
        .lines()
        .filter_map(|line| line.split_once('='))
        .find(|(key, _)| key.trim() == "auto_update")
        .and_then(|(_, value)| value.trim().parse().ok())
}

/// A configuration value outside its physical range.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigIssue {
    /// Efficiency outside [0, 1].
    EfficiencyOutOfRange(&'static str, f32),
    /// Energy or power constant that must be positive.
    NonPositive(&'static str, f32),
    /// Damage fraction outside [0, 1].
    DamageFractionOutOfRange(f32),
}

/// Validate a configuration, returning every issue found.
pub fn validate_config(config: &H2Config) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();

    for (name, value) in [
        ("engine_efficiency", config.engine_efficiency),
        ("thruster_efficiency", config.thruster_efficiency),
    ] {
        if !(0.0..=1.0).contains(&value) {
            issues.push(ConfigIssue::EfficiencyOutOfRange(name, value));
        }
    }

    for (name, value) in [
        ("ice_melting_energy_per_kg", config.ice_melting_energy_per_kg),
        (
            "gas_compression_power_full_per_liter",
            config.gas_compression_power_full_per_liter,
        ),
        ("energy_per_liter", config.energy_per_liter),
    ] {
        if value <= 0.0 {
            issues.push(ConfigIssue::NonPositive(name, value));
        }
    }

    if !(0.0..=1.0).contains(&config.damage_fraction_on_overheat) {
        issues.push(ConfigIssue::DamageFractionOutOfRange(
            config.damage_fraction_on_overheat,
        ));
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom() -> H2Config {
        H2Config {
            engine_efficiency: 0.4,
            ..H2Config::default()
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&H2Config::default()).is_empty());
    }

    #[test]
    fn test_current_version_is_kept() {
        let m = migrate(custom(), Some(CONFIG_VERSION));
        assert!(!m.updated);
        assert_eq!(m.config.engine_efficiency, 0.4);
    }

    #[test]
    fn test_missing_version_resets() {
        let m = migrate(custom(), None);
        assert!(m.updated);
        assert_eq!(m.config, H2Config::default());
    }

    #[test]
    fn test_old_version_resets_but_keeps_auto_update() {
        let loaded = H2Config {
            auto_update: true,
            ..custom()
        };
        let m = migrate(loaded, Some("0.9.0"));
        assert!(m.updated);
        assert_eq!(m.config.engine_efficiency, 0.65);
        assert!(m.config.auto_update);
        assert_eq!(m.from_version.as_deref(), Some("0.9.0"));
    }

    #[test]
    fn test_auto_update_off_keeps_old_values() {
        let loaded = H2Config {
            auto_update: false,
            ..custom()
        };
        let m = migrate(loaded, Some("0.9.0"));
        assert!(!m.updated);
        assert_eq!(m.config.engine_efficiency, 0.4);
    }

    #[test]
    fn test_toml_round_trip_keeps_custom_values() {
        let text = custom().to_toml_string().unwrap();
        assert!(text.contains("system_version = \"1.0.0\""));
        let m = H2Config::from_toml_str(&text);
        assert!(!m.updated);
        assert_eq!(m.config, custom());
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let text = "system_version = \"1.0.0\"\nengine_critical_temp = 250.0\n";
        let m = H2Config::from_toml_str(text);
        assert_eq!(m.config.engine_critical_temp, 250.0);
        assert_eq!(m.config.thruster_critical_temp, 500.0);
    }

    #[test]
    fn test_corrupt_document_falls_back_and_salvages_auto_update() {
        let text = "auto_update = false\nengine_efficiency = \"fast\"\n";
        assert!(H2Config::try_from_toml_str(text).is_err());
        let m = H2Config::from_toml_str(text);
        assert!(m.updated);
        assert!(!m.config.auto_update);
        assert_eq!(m.config.engine_efficiency, 0.65);
    }

    #[test]
    fn test_validation_flags_bad_values() {
        let bad = H2Config {
            engine_efficiency: 1.5,
            energy_per_liter: 0.0,
            damage_fraction_on_overheat: -0.1,
            ..H2Config::default()
        };
        let issues = validate_config(&bad);
        assert_eq!(issues.len(), 3);
        assert!(issues.contains(&ConfigIssue::EfficiencyOutOfRange("engine_efficiency", 1.5)));
    }

    #[test]
    fn test_critical_temp_by_class() {
        let c = H2Config::default();
        assert_eq!(c.critical_temp(true), 500.0);
        assert_eq!(c.critical_temp(false), 300.0);
    }
}
