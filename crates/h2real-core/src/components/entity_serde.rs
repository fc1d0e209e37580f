//! Serialize entity handles as their raw bits.
//!
//! Snapshots respawn every entity at its original handle, so references
//! stay valid without remapping.

use hecs::Entity;
use serde::de::Error;
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S: Serializer>(entity: &Entity, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(entity.to_bits().get())
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Entity, D::Error> {
    let bits = u64::deserialize(deserializer)?;
    Entity::from_bits(bits).ok_or_else(|| D::Error::custom(format!("invalid entity bits {bits}")))
}

pub mod option {
    use super::*;
    use serde::Serialize;

    pub fn serialize<S: Serializer>(
        entity: &Option<Entity>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        entity.map(|e| e.to_bits().get()).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Entity>, D::Error> {
        match Option::<u64>::deserialize(deserializer)? {
            Some(bits) => Entity::from_bits(bits)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid entity bits {bits}"))),
            None => Ok(None),
        }
    }
}
