//! Reachability over the mechanical joint graph.
//!
//! A vehicle is a set of modules held together by rotors, pistons and
//! docking connectors. Connectivity changes at runtime (a connector
//! undocks, a rotor head is torn off), so reachability is recomputed on
//! every query instead of being cached.
//!
//! The walk is an explicit worklist over module handles. Each module is
//! expanded at most once, which makes the traversal safe on cyclic graphs,
//! self-loops and connectors docked back onto their own module.

use std::collections::HashSet;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// Host-side view of the joint graph.
pub trait MechanicalLinks {
    /// Stable module handle (an entity id, an arena index, ...).
    type Module: Copy + Eq + Hash;

    /// Targets of every joint mounted on `module`.
    ///
    /// `None` entries stand for joints that currently lead nowhere (detached
    /// rotor head, undocked or half-docked connector) and are skipped.
    fn linked_modules(&self, module: Self::Module) -> Vec<Option<Self::Module>>;
}

/// Docking state of a connector joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectorState {
    Unconnected,
    /// In range of a counterpart but not locked; treated as disconnected.
    Connectable,
    Connected,
}

/// Module a connector leads to, given its state and its counterpart's module.
///
/// Only a fully coupled connector yields an edge.
pub fn connector_target<M>(state: ConnectorState, counterpart_module: Option<M>) -> Option<M> {
    match state {
        ConnectorState::Connected => counterpart_module,
        ConnectorState::Unconnected | ConnectorState::Connectable => None,
    }
}

/// Every module reachable from `root`, `root` included.
///
/// Each module appears exactly once. Visit order is an implementation
/// detail and callers must not rely on it.
pub fn find_reachable_modules<G: MechanicalLinks>(graph: &G, root: G::Module) -> Vec<G::Module> {
    let mut visited: HashSet<G::Module> = HashSet::new();
    let mut order = Vec::new();
    let mut stack = vec![Some(root)];

    while let Some(next) = stack.pop() {
        let Some(module) = next else {
            continue;
        };
        if !visited.insert(module) {
            continue;
        }
        order.push(module);
        stack.extend(graph.linked_modules(module));
    }

    order
}
