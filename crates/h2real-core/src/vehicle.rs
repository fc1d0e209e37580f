//! The vehicle world: modules, joints, reservoirs and devices.
//!
//! `Vehicle` plays the host's part for the controllers. It owns the ECS
//! world and exposes the host surface the controllers consume: the joint
//! graph, reservoir storage, the enabled switch with its change
//! notifications, integrity, and the fire-and-forget UI and effect cues.

use std::collections::{BTreeMap, VecDeque};

use hecs::{Entity, World};

use h2real_logic::connectivity::{
    connector_target, find_reachable_modules, ConnectorState, MechanicalLinks,
};
use h2real_logic::depletion::{ReservoirLevel, ReservoirStore};
use h2real_logic::locator::{aggregate_fill_fraction, ReservoirCatalog, ReservoirTag};

use crate::components::*;

/// Handle returned by [`Vehicle::subscribe_enabled`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// An enabled-changed notification addressed to one subscriber.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnabledChanged {
    pub subscription: SubscriptionId,
    pub device: Entity,
    pub enabled: bool,
}

/// Visual or audio cue requested by a controller.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectCue {
    pub device: Entity,
    pub sound: String,
}

/// Host model of one vehicle.
pub struct Vehicle {
    /// ECS world containing modules, joints, reservoirs and devices
    pub world: World,
    subscriptions: BTreeMap<SubscriptionId, Entity>,
    next_subscription: u64,
    notifications: VecDeque<EnabledChanged>,
    effects: Vec<EffectCue>,
}

impl Default for Vehicle {
    fn default() -> Self {
        Self::new()
    }
}

impl Vehicle {
    pub fn new() -> Self {
        Self::from_world(World::new())
    }

    /// Wrap an existing world, e.g. one rebuilt from a save.
    pub fn from_world(world: World) -> Self {
        Self {
            world,
            subscriptions: BTreeMap::new(),
            next_subscription: 0,
            notifications: VecDeque::new(),
            effects: Vec::new(),
        }
    }

    // ── Structure ──

    pub fn add_module(&mut self, name: impl Into<String>) -> Entity {
        self.world.spawn((Module::new(name),))
    }

    pub fn add_rotor(&mut self, base: Entity, top: Option<Entity>) -> Entity {
        self.world.spawn((Joint::rotor(base, top),))
    }

    pub fn add_piston(&mut self, base: Entity, top: Option<Entity>) -> Entity {
        self.world.spawn((Joint::piston(base, top),))
    }

    pub fn add_connector(&mut self, base: Entity) -> Entity {
        self.world.spawn((Joint::connector(base),))
    }

    /// Lock two connectors together. Returns false if either is not a connector.
    pub fn dock(&mut self, a: Entity, b: Entity) -> bool {
        if !self.is_connector(a) || !self.is_connector(b) {
            return false;
        }
        self.set_connector(a, Some(b), ConnectorState::Connected);
        self.set_connector(b, Some(a), ConnectorState::Connected);
        log::debug!("docked connectors {:?} and {:?}", a, b);
        true
    }

    /// Release a connector and its counterpart.
    pub fn undock(&mut self, connector: Entity) {
        let counterpart = match self.world.get::<&Joint>(connector).map(|j| j.kind) {
            Ok(JointKind::Connector { counterpart, .. }) => counterpart,
            _ => return,
        };
        self.set_connector(connector, None, ConnectorState::Unconnected);
        if let Some(other) = counterpart {
            self.set_connector(other, None, ConnectorState::Unconnected);
        }
    }

    /// Change one side's state only, leaving the counterpart as it was.
    pub fn set_connector_state(&mut self, connector: Entity, state: ConnectorState) {
        let counterpart = match self.world.get::<&Joint>(connector).map(|j| j.kind) {
            Ok(JointKind::Connector { counterpart, .. }) => counterpart,
            _ => return,
        };
        self.set_connector(connector, counterpart, state);
    }

    /// Remove whatever a rotor or piston carries.
    pub fn detach_top(&mut self, joint: Entity) {
        if let Ok(mut j) = self.world.get::<&mut Joint>(joint) {
            match &mut j.kind {
                JointKind::Rotor { top } | JointKind::Piston { top } => *top = None,
                JointKind::Connector { .. } => {}
            }
        }
    }

    fn is_connector(&self, entity: Entity) -> bool {
        self.world
            .get::<&Joint>(entity)
            .map(|j| j.is_connector())
            .unwrap_or(false)
    }

    fn set_connector(&mut self, connector: Entity, other: Option<Entity>, new_state: ConnectorState) {
        if let Ok(mut j) = self.world.get::<&mut Joint>(connector) {
            if let JointKind::Connector { counterpart, state } = &mut j.kind {
                *counterpart = other;
                *state = new_state;
            }
        }
    }

    /// Modules reachable from `root` through joints.
    pub fn reachable_modules(&self, root: Entity) -> Vec<Entity> {
        find_reachable_modules(self, root)
    }

    // ── Reservoirs ──

    pub fn add_reservoir(&mut self, reservoir: Reservoir) -> Entity {
        self.world.spawn((reservoir,))
    }

    pub fn fill_ratio(&self, reservoir: Entity) -> Option<f64> {
        self.world
            .get::<&Reservoir>(reservoir)
            .map(|r| r.fill_ratio)
            .ok()
    }

    /// Host-side refill, e.g. from a generator or a docked station.
    pub fn refill(&mut self, reservoir: Entity, fill_ratio: f64) {
        if let Ok(mut r) = self.world.get::<&mut Reservoir>(reservoir) {
            r.fill_ratio = fill_ratio.clamp(0.0, 1.0);
        }
    }

    /// Combined fill of the working reservoirs reachable from `root` whose
    /// subtype names `gas`. Used to price compression into them.
    pub fn destination_fill(&self, root: Entity, gas: &str) -> f32 {
        let modules = self.reachable_modules(root);
        let levels: Vec<ReservoirLevel> = self
            .world
            .query::<&Reservoir>()
            .iter()
            .filter(|(_, r)| r.working && r.subtype.contains(gas) && modules.contains(&r.module))
            .map(|(_, r)| r.level())
            .collect();
        aggregate_fill_fraction(levels)
    }

    // ── Devices ──

    pub fn add_engine(&mut self, device: Device, fuel: EngineFuel) -> Entity {
        self.world.spawn((device, fuel))
    }

    pub fn add_thruster(&mut self, device: Device, drive: ThrusterDrive) -> Entity {
        self.world.spawn((device, drive))
    }

    pub fn add_gas_generator(&mut self, device: Device, unit: GasGeneratorUnit) -> Entity {
        self.world.spawn((device, unit))
    }

    /// Remove a device along with any subscriptions on it.
    pub fn remove_device(&mut self, device: Entity) -> bool {
        self.subscriptions.retain(|_, d| *d != device);
        self.notifications.retain(|n| n.device != device);
        self.world.despawn(device).is_ok()
    }

    /// Devices mounted on any of `modules`, in entity order.
    pub fn devices_on(&self, modules: &[Entity]) -> Vec<Entity> {
        let mut found: Vec<Entity> = self
            .world
            .query::<&Device>()
            .iter()
            .filter(|(_, d)| modules.contains(&d.module))
            .map(|(e, _)| e)
            .collect();
        found.sort_by_key(|e| e.id());
        found
    }

    pub fn module_of(&self, entity: Entity) -> Option<Entity> {
        let entity_ref = self.world.entity(entity).ok()?;
        if let Some(d) = entity_ref.get::<&Device>() {
            return Some(d.module);
        }
        if let Some(r) = entity_ref.get::<&Reservoir>() {
            return Some(r.module);
        }
        entity_ref.get::<&Joint>().map(|j| j.base)
    }

    pub fn is_enabled(&self, device: Entity) -> bool {
        self.world
            .get::<&Device>(device)
            .map(|d| d.enabled)
            .unwrap_or(false)
    }

    pub fn is_functional(&self, device: Entity) -> bool {
        self.world
            .get::<&Device>(device)
            .map(|d| d.is_functional())
            .unwrap_or(false)
    }

    /// Move the enabled switch. Operator and controllers share this path:
    /// a real change queues one notification per subscriber.
    ///
    /// Returns whether the switch moved.
    pub fn set_enabled(&mut self, device: Entity, enabled: bool) -> bool {
        let changed = match self.world.get::<&mut Device>(device) {
            Ok(mut d) if d.enabled != enabled => {
                d.enabled = enabled;
                true
            }
            _ => false,
        };
        if changed {
            for (&subscription, _) in self.subscriptions.iter().filter(|(_, d)| **d == device) {
                self.notifications.push_back(EnabledChanged {
                    subscription,
                    device,
                    enabled,
                });
            }
        }
        changed
    }

    /// Operator write to the bare switch. Indistinguishable from a controller
    /// write; only the controllers' guard tells them apart. A write that does
    /// not move the switch notifies nobody, so terminal toggles go through
    /// [`HeatSession::operator_toggle`](crate::session::HeatSession::operator_toggle).
    pub fn operator_set_enabled(&mut self, device: Entity, enabled: bool) -> bool {
        log::debug!("operator set {:?} enabled={}", device, enabled);
        self.set_enabled(device, enabled)
    }

    pub fn subscribe_enabled(&mut self, device: Entity) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscriptions.insert(id, device);
        id
    }

    pub fn unsubscribe_enabled(&mut self, subscription: SubscriptionId) -> bool {
        self.notifications.retain(|n| n.subscription != subscription);
        self.subscriptions.remove(&subscription).is_some()
    }

    pub fn subscriber_count(&self, device: Entity) -> usize {
        self.subscriptions.values().filter(|d| **d == device).count()
    }

    pub fn has_pending_notifications(&self) -> bool {
        !self.notifications.is_empty()
    }

    pub fn pop_notification(&mut self) -> Option<EnabledChanged> {
        self.notifications.pop_front()
    }

    /// Subtract integrity. Returns what is left.
    pub fn apply_damage(&mut self, device: Entity, amount: f32) -> f32 {
        match self.world.get::<&mut Device>(device) {
            Ok(mut d) => {
                d.integrity = (d.integrity - amount).max(0.0);
                d.integrity
            }
            Err(_) => 0.0,
        }
    }

    pub fn set_required_input(&mut self, generator: Entity, required_input: f32) {
        if let Ok(mut unit) = self.world.get::<&mut GasGeneratorUnit>(generator) {
            if let Some(sink) = unit.power_sink.as_mut() {
                sink.required_input = required_input;
                sink.updates += 1;
            }
        }
    }

    // ── UI and effects ──

    pub fn mark_info_dirty(&mut self, device: Entity) {
        if let Ok(mut d) = self.world.get::<&mut Device>(device) {
            d.info_dirty = true;
        }
    }

    pub fn request_info_refresh(&mut self, device: Entity) {
        if let Ok(mut d) = self.world.get::<&mut Device>(device) {
            d.info_refreshes += 1;
        }
    }

    pub fn set_heat_light(&mut self, device: Entity, intensity: f32) {
        if let Ok(mut d) = self.world.get::<&mut Device>(device) {
            d.heat_light = intensity;
        }
    }

    pub fn play_effect(&mut self, device: Entity, sound: impl Into<String>) {
        self.effects.push(EffectCue {
            device,
            sound: sound.into(),
        });
    }

    pub fn effects(&self) -> &[EffectCue] {
        &self.effects
    }

    pub fn take_effects(&mut self) -> Vec<EffectCue> {
        std::mem::take(&mut self.effects)
    }
}

impl MechanicalLinks for Vehicle {
    type Module = Entity;

    fn linked_modules(&self, module: Entity) -> Vec<Option<Entity>> {
        self.world
            .query::<&Joint>()
            .iter()
            .filter(|(_, joint)| joint.base == module)
            .map(|(_, joint)| match joint.kind {
                JointKind::Rotor { top } | JointKind::Piston { top } => top,
                JointKind::Connector { counterpart, state } => {
                    let other_base = counterpart
                        .and_then(|c| self.world.get::<&Joint>(c).ok().map(|j| j.base));
                    connector_target(state, other_base)
                }
            })
            .collect()
    }
}

impl ReservoirCatalog for Vehicle {
    type Reservoir = Entity;

    fn reservoirs_on(&self, module: Entity) -> Vec<ReservoirTag<Entity>> {
        let mut tags: Vec<ReservoirTag<Entity>> = self
            .world
            .query::<&Reservoir>()
            .iter()
            .filter(|(_, r)| r.module == module)
            .map(|(id, r)| ReservoirTag {
                id,
                subtype: r.subtype.clone(),
                reserve_only: r.reserve_only,
            })
            .collect();
        tags.sort_by_key(|t| t.id.id());
        tags
    }
}

impl ReservoirStore for Vehicle {
    type Id = Entity;

    fn level(&self, id: Entity) -> Option<ReservoirLevel> {
        self.world.get::<&Reservoir>(id).ok().map(|r| r.level())
    }

    fn set_fill_ratio(&mut self, id: Entity, fill_ratio: f64) {
        self.refill(id, fill_ratio);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use h2real_logic::constants::resources;
    use h2real_logic::locator::find_reservoirs;

    fn engine_on(vehicle: &mut Vehicle, module: Entity) -> Entity {
        vehicle.add_engine(
            Device::new(module, "Engine", "LargeHydrogenEngine", DeviceClass::Engine),
            EngineFuel::new(10.0),
        )
    }

    #[test]
    fn test_rotor_leads_to_top() {
        let mut v = Vehicle::new();
        let base = v.add_module("base");
        let top = v.add_module("top");
        v.add_rotor(base, Some(top));
        let mut reach = v.reachable_modules(base);
        reach.sort_by_key(|e| e.id());
        assert_eq!(reach, vec![base, top]);
        assert_eq!(v.reachable_modules(top), vec![top]);
    }

    #[test]
    fn test_connector_needs_full_lock() {
        let mut v = Vehicle::new();
        let ship = v.add_module("ship");
        let station = v.add_module("station");
        let a = v.add_connector(ship);
        let b = v.add_connector(station);

        assert_eq!(v.reachable_modules(ship).len(), 1);
        assert!(v.dock(a, b));
        assert_eq!(v.reachable_modules(ship).len(), 2);
        assert_eq!(v.reachable_modules(station).len(), 2);

        // Half-docked: only one side still reports the lock.
        v.set_connector_state(a, ConnectorState::Connectable);
        assert_eq!(v.reachable_modules(ship).len(), 1);
        assert_eq!(v.reachable_modules(station).len(), 2);

        v.undock(b);
        assert_eq!(v.reachable_modules(station).len(), 1);
    }

    #[test]
    fn test_detached_rotor_head_cuts_edge() {
        let mut v = Vehicle::new();
        let base = v.add_module("base");
        let top = v.add_module("top");
        let rotor = v.add_rotor(base, Some(top));
        v.detach_top(rotor);
        assert_eq!(v.reachable_modules(base), vec![base]);
    }

    #[test]
    fn test_find_reservoirs_through_vehicle() {
        let mut v = Vehicle::new();
        let base = v.add_module("base");
        let top = v.add_module("top");
        v.add_piston(base, Some(top));
        let a = v.add_reservoir(Reservoir::new(base, resources::OXYGEN, 100.0).with_fill(1.0));
        let b = v.add_reservoir(Reservoir::new(top, resources::DEFAULT, 100.0).with_fill(1.0));
        v.add_reservoir(Reservoir::new(top, resources::HYDROGEN, 100.0).with_fill(1.0));
        v.add_reservoir(
            Reservoir::new(base, resources::OXYGEN, 100.0)
                .with_fill(1.0)
                .with_reserve_only(true),
        );

        let mut found = find_reservoirs(&v, base, resources::OXYGEN);
        found.sort_by_key(|e| e.id());
        assert_eq!(found, vec![a, b]);
    }

    #[test]
    fn test_set_enabled_notifies_each_subscriber_once() {
        let mut v = Vehicle::new();
        let m = v.add_module("m");
        let engine = engine_on(&mut v, m);
        let s1 = v.subscribe_enabled(engine);
        let s2 = v.subscribe_enabled(engine);

        assert!(v.set_enabled(engine, false));
        assert!(!v.set_enabled(engine, false));

        let first = v.pop_notification().unwrap();
        let second = v.pop_notification().unwrap();
        assert_eq!((first.subscription, second.subscription), (s1, s2));
        assert!(!first.enabled);
        assert!(v.pop_notification().is_none());

        v.unsubscribe_enabled(s1);
        v.set_enabled(engine, true);
        assert_eq!(v.pop_notification().map(|n| n.subscription), Some(s2));
        assert!(v.pop_notification().is_none());
    }

    #[test]
    fn test_reservoir_store_clamps_writes() {
        let mut v = Vehicle::new();
        let m = v.add_module("m");
        let tank = v.add_reservoir(Reservoir::new(m, "", 10.0).with_fill(0.5));
        v.set_fill_ratio(tank, 1.5);
        assert_eq!(v.fill_ratio(tank), Some(1.0));
        v.set_fill_ratio(tank, -0.2);
        assert_eq!(v.fill_ratio(tank), Some(0.0));
    }

    #[test]
    fn test_destination_fill_ignores_idle_tanks() {
        let mut v = Vehicle::new();
        let m = v.add_module("m");
        v.add_reservoir(Reservoir::new(m, "OxygenTank", 100.0).with_fill(0.5));
        v.add_reservoir(Reservoir::new(m, "OxygenTank", 100.0).with_fill(1.0).with_working(false));
        v.add_reservoir(Reservoir::new(m, "HydrogenTank", 100.0).with_fill(1.0));
        assert!((v.destination_fill(m, "Oxygen") - 0.5).abs() < 1e-6);
        assert_eq!(v.destination_fill(m, "Nitrogen"), 0.0);
    }

    #[test]
    fn test_damage_floors_at_zero() {
        let mut v = Vehicle::new();
        let m = v.add_module("m");
        let engine = engine_on(&mut v, m);
        assert_eq!(v.apply_damage(engine, 300.0), 700.0);
        assert_eq!(v.apply_damage(engine, 5000.0), 0.0);
        assert!(!v.is_functional(engine));
    }
}
