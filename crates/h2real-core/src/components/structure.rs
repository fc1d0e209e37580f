//! Structure components: Module and Joint.

use hecs::Entity;
use serde::{Deserialize, Serialize};

use h2real_logic::connectivity::ConnectorState;

use super::entity_serde;

/// Module component - one rigid sub-structure of a vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Kind of mechanical joint and where it leads
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum JointKind {
    /// Leads to the module carrying the rotor head, if one is attached.
    Rotor {
        #[serde(with = "entity_serde::option")]
        top: Option<Entity>,
    },
    /// Leads to the module carrying the piston head, if one is attached.
    Piston {
        #[serde(with = "entity_serde::option")]
        top: Option<Entity>,
    },
    /// Docking port. Leads to the module owning `counterpart` (another
    /// connector entity) only while `state` is `Connected`.
    Connector {
        #[serde(with = "entity_serde::option")]
        counterpart: Option<Entity>,
        state: ConnectorState,
    },
}

/// Joint component - a rotor, piston or connector mounted on a module
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    /// Module the joint is mounted on.
    #[serde(with = "entity_serde")]
    pub base: Entity,
    pub kind: JointKind,
}

impl Joint {
    pub fn rotor(base: Entity, top: Option<Entity>) -> Self {
        Self {
            base,
            kind: JointKind::Rotor { top },
        }
    }

    pub fn piston(base: Entity, top: Option<Entity>) -> Self {
        Self {
            base,
            kind: JointKind::Piston { top },
        }
    }

    pub fn connector(base: Entity) -> Self {
        Self {
            base,
            kind: JointKind::Connector {
                counterpart: None,
                state: ConnectorState::Unconnected,
            },
        }
    }

    pub fn is_connector(&self) -> bool {
        matches!(self.kind, JointKind::Connector { .. })
    }
}
