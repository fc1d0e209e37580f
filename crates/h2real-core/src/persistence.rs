//! Save/Load for vehicles and configuration files
//!
//! Vehicles are stored as a bincode snapshot of every entity's components.
//! Entities are respawned at their original handles, so joints, reservoirs
//! and devices keep pointing at the right modules. Controller state and
//! pending notifications are not saved: controllers re-attach and adopt
//! the switch positions they find.

use std::io::{Read, Write};
use std::path::Path;

use hecs::{Entity, World};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use h2real_logic::config::{ConfigError, H2Config, Migration};

use crate::components::*;
use crate::vehicle::Vehicle;

/// Version number for save file format (increment when format changes)
const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of a vehicle
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub entities: Vec<SerializableEntity>,
}

/// All possible components for an entity, serialized as optionals
#[derive(Serialize, Deserialize, Default)]
pub struct SerializableEntity {
    /// Raw entity handle bits.
    pub id: u64,
    pub module: Option<Module>,
    pub joint: Option<Joint>,
    pub reservoir: Option<Reservoir>,
    pub device: Option<Device>,
    pub engine_fuel: Option<EngineFuel>,
    pub thruster_drive: Option<ThrusterDrive>,
    pub gas_generator: Option<GasGeneratorUnit>,
}

/// Errors that can occur during save/load
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error("save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("invalid entity handle {0}")]
    InvalidEntity(u64),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn serialize_entities(world: &World) -> Vec<SerializableEntity> {
    let mut entities = Vec::new();

    for entity_ref in world.iter() {
        let mut se = SerializableEntity {
            id: entity_ref.entity().to_bits().get(),
            ..Default::default()
        };

        if let Some(c) = entity_ref.get::<&Module>() {
            se.module = Some((*c).clone());
        }
        if let Some(c) = entity_ref.get::<&Joint>() {
            se.joint = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Reservoir>() {
            se.reservoir = Some((*c).clone());
        }
        if let Some(c) = entity_ref.get::<&Device>() {
            se.device = Some((*c).clone());
        }
        if let Some(c) = entity_ref.get::<&EngineFuel>() {
            se.engine_fuel = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&ThrusterDrive>() {
            se.thruster_drive = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&GasGeneratorUnit>() {
            se.gas_generator = Some((*c).clone());
        }

        entities.push(se);
    }

    entities.sort_by_key(|se| se.id);
    entities
}

fn spawn_entity(world: &mut World, se: SerializableEntity) -> Result<(), PersistenceError> {
    let entity = Entity::from_bits(se.id).ok_or(PersistenceError::InvalidEntity(se.id))?;
    world.spawn_at(entity, ());

    if let Some(c) = se.module {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.joint {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.reservoir {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.device {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.engine_fuel {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.thruster_drive {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = se.gas_generator {
        let _ = world.insert_one(entity, c);
    }
    Ok(())
}

/// Save a vehicle's world to a writer
pub fn save_vehicle<W: Write>(writer: W, vehicle: &Vehicle) -> Result<(), PersistenceError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        entities: serialize_entities(&vehicle.world),
    };
    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// Load a vehicle from a reader
pub fn load_vehicle<R: Read>(reader: R) -> Result<Vehicle, PersistenceError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(PersistenceError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    let mut world = World::new();
    for se in save_data.entities {
        spawn_entity(&mut world, se)?;
    }
    Ok(Vehicle::from_world(world))
}

/// Read and migrate a configuration file. A missing file yields defaults.
pub fn load_config(path: &Path) -> Result<Migration, PersistenceError> {
    if !path.exists() {
        log::info!("no config at {}, using defaults", path.display());
        return Ok(Migration {
            config: H2Config::default(),
            updated: true,
            from_version: None,
        });
    }
    let contents = std::fs::read_to_string(path).map_err(ConfigError::from)?;
    Ok(H2Config::from_toml_str(&contents))
}

/// Write a configuration file tagged with the current version.
pub fn save_config(path: &Path, config: &H2Config) -> Result<(), PersistenceError> {
    let text = config.to_toml_string()?;
    std::fs::write(path, text).map_err(ConfigError::from)?;
    Ok(())
}

/// Load, migrate, and write back when the migration changed anything.
pub fn load_or_update_config(path: &Path) -> Result<H2Config, PersistenceError> {
    let migration = load_config(path)?;
    if migration.updated {
        save_config(path, &migration.config)?;
    }
    Ok(migration.config)
}
