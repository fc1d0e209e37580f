//! Heat session: builds controllers for a vehicle and ticks them.
//!
//! Factories pair an enumerator (which devices, starting from a root module)
//! with a builder (make a controller, or decline). The session owns the
//! controllers and is the only path enabled-changed notifications take back
//! to them; it drains the vehicle's queue right after every controller step
//! so a controller write is always answered before anything else runs.

use std::sync::Arc;

use hecs::Entity;

use h2real_logic::config::H2Config;
use h2real_logic::constants::subtypes;

use crate::components::{Device, DeviceClass};
use crate::controllers::{
    DeviceController, EngineController, GasGeneratorController, HeatBehavior, ThrusterController,
};
use crate::thermal::ThermalEngine;
use crate::vehicle::Vehicle;

/// Lists candidate devices reachable from a root module.
pub type ModuleEnumerator = Box<dyn Fn(&Vehicle, Entity) -> Vec<Entity>>;

/// Builds a controller for one device, or declines with `None`.
pub type BehaviorBuilder =
    Box<dyn Fn(&mut Vehicle, Entity, &Arc<H2Config>) -> Option<DeviceController>>;

struct BehaviorFactory {
    enumerator: ModuleEnumerator,
    builder: BehaviorBuilder,
}

pub struct HeatSession {
    config: Arc<H2Config>,
    factories: Vec<BehaviorFactory>,
    controllers: Vec<DeviceController>,
}

impl HeatSession {
    /// Empty session; see [`register_default_factories`](Self::register_default_factories).
    pub fn new(config: H2Config) -> Self {
        Self {
            config: Arc::new(config),
            factories: Vec::new(),
            controllers: Vec::new(),
        }
    }

    /// Session with the engine, thruster and gas generator factories installed.
    pub fn with_default_factories(config: H2Config) -> Self {
        let mut session = Self::new(config);
        session.register_default_factories();
        session
    }

    pub fn register_heat_behavior_factory<E, B>(&mut self, enumerator: E, builder: B)
    where
        E: Fn(&Vehicle, Entity) -> Vec<Entity> + 'static,
        B: Fn(&mut Vehicle, Entity, &Arc<H2Config>) -> Option<DeviceController> + 'static,
    {
        self.factories.push(BehaviorFactory {
            enumerator: Box::new(enumerator),
            builder: Box::new(builder),
        });
    }

    pub fn register_default_factories(&mut self) {
        self.register_heat_behavior_factory(
            |vehicle, root| devices_of(vehicle, root, DeviceClass::Engine, Some(subtypes::HYDROGEN_ENGINE)),
            |vehicle, device, config| {
                Some(DeviceController::Engine(EngineController::new(
                    vehicle,
                    device,
                    Arc::clone(config),
                )))
            },
        );
        self.register_heat_behavior_factory(
            |vehicle, root| {
                devices_of(vehicle, root, DeviceClass::Thruster, Some(subtypes::HYDROGEN_THRUSTER))
            },
            |vehicle, device, config| {
                Some(DeviceController::Thruster(ThrusterController::new(
                    vehicle,
                    device,
                    Arc::clone(config),
                )))
            },
        );
        self.register_heat_behavior_factory(
            |vehicle, root| devices_of(vehicle, root, DeviceClass::GasGenerator, None),
            |_vehicle, device, config| {
                Some(DeviceController::GasGenerator(GasGeneratorController::new(
                    device,
                    Arc::clone(config),
                )))
            },
        );
    }

    /// Run every factory from `root`. Devices already managed are skipped.
    ///
    /// Returns the number of controllers created.
    pub fn attach(&mut self, vehicle: &mut Vehicle, root: Entity) -> usize {
        let mut created = 0;
        for factory in &self.factories {
            for device in (factory.enumerator)(vehicle, root) {
                if self.controllers.iter().any(|c| c.device() == device) {
                    continue;
                }
                if let Some(controller) = (factory.builder)(vehicle, device, &self.config) {
                    log::info!("attached heat controller to {:?}", device);
                    self.controllers.push(controller);
                    created += 1;
                }
            }
        }
        created
    }

    /// Clean up and drop the controller for `device`.
    pub fn detach(&mut self, vehicle: &mut Vehicle, device: Entity) -> bool {
        let Some(index) = self.controllers.iter().position(|c| c.device() == device) else {
            return false;
        };
        let mut controller = self.controllers.remove(index);
        controller.cleanup(vehicle);
        log::info!("detached heat controller from {:?}", device);
        true
    }

    pub fn detach_all(&mut self, vehicle: &mut Vehicle) {
        for mut controller in self.controllers.drain(..) {
            controller.cleanup(vehicle);
        }
    }

    pub fn controller(&self, device: Entity) -> Option<&DeviceController> {
        self.controllers.iter().find(|c| c.device() == device)
    }

    pub fn controllers(&self) -> &[DeviceController] {
        &self.controllers
    }

    /// Route queued enabled-changed notifications to their controllers.
    pub fn deliver_notifications(&mut self, vehicle: &mut Vehicle) {
        while let Some(notification) = vehicle.pop_notification() {
            let target = self
                .controllers
                .iter_mut()
                .find(|c| c.subscription() == Some(notification.subscription));
            if let Some(controller) = target {
                if controller.on_enabled_changed(notification.enabled) {
                    log::debug!(
                        "operator set {:?} wants_on={}",
                        notification.device,
                        notification.enabled
                    );
                }
            }
        }
    }

    /// Operator intent from the UI binding, bypassing the switch.
    pub fn set_operator_intent(&mut self, device: Entity, wants_on: bool) -> bool {
        match self.controllers.iter_mut().find(|c| c.device() == device) {
            Some(controller) => {
                controller.set_operator_intent(wants_on);
                true
            }
            None => false,
        }
    }

    /// Operator toggle from the device terminal.
    ///
    /// Records the intent before moving the switch, so the command holds
    /// even when the switch is already in that position (e.g. OFF on a
    /// device the controller has starved off).
    pub fn operator_toggle(&mut self, vehicle: &mut Vehicle, device: Entity, enabled: bool) {
        self.set_operator_intent(device, enabled);
        vehicle.operator_set_enabled(device, enabled);
    }

    /// Clean up controllers whose device no longer exists.
    fn drop_dead_controllers(&mut self, vehicle: &mut Vehicle) {
        let (live, dead): (Vec<_>, Vec<_>) = std::mem::take(&mut self.controllers)
            .into_iter()
            .partition(|c| vehicle.world.contains(c.device()));
        self.controllers = live;
        for mut controller in dead {
            controller.cleanup(vehicle);
            log::info!("dropped heat controller for despawned {:?}", controller.device());
        }
    }

    /// One simulation step for every controller, in attach order.
    pub fn tick(&mut self, vehicle: &mut Vehicle, thermal: &mut dyn ThermalEngine, delta_time: f32) {
        self.drop_dead_controllers(vehicle);
        self.deliver_notifications(vehicle);

        for index in 0..self.controllers.len() {
            let device = self.controllers[index].device();
            let delta = self.controllers[index].heat_change(vehicle, thermal, delta_time);
            self.deliver_notifications(vehicle);

            thermal.apply_heat_change(device, delta);
            let heat = self.controllers[index].spread_heat(thermal, delta_time);
            self.controllers[index].react_on_new_heat(vehicle, thermal, heat);
        }
    }

    pub fn custom_info(
        &self,
        vehicle: &Vehicle,
        thermal: &dyn ThermalEngine,
        device: Entity,
    ) -> Option<String> {
        self.controller(device).map(|c| c.custom_info(vehicle, thermal))
    }
}

/// Devices of `class` on modules reachable from `root`, optionally filtered
/// by a subtype marker.
pub fn devices_of(
    vehicle: &Vehicle,
    root: Entity,
    class: DeviceClass,
    marker: Option<&str>,
) -> Vec<Entity> {
    let modules = vehicle.reachable_modules(root);
    vehicle
        .devices_on(&modules)
        .into_iter()
        .filter(|&e| {
            vehicle
                .world
                .get::<&Device>(e)
                .map(|d| d.class == class && marker.map_or(true, |m| d.subtype.contains(m)))
                .unwrap_or(false)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::*;
    use crate::thermal::LumpedThermalModel;
    use h2real_logic::constants::resources;
    use h2real_logic::enable_state::EnableState;

    struct Rig {
        vehicle: Vehicle,
        thermal: LumpedThermalModel,
        session: HeatSession,
        engine: Entity,
        tank: Entity,
    }

    fn rig(fill: f64) -> Rig {
        let mut vehicle = Vehicle::new();
        let m = vehicle.add_module("m");
        let tank = vehicle.add_reservoir(Reservoir::new(m, resources::OXYGEN, 10.0).with_fill(fill));
        let mut fuel = EngineFuel::new(10.0);
        fuel.hydrogen_input = Some(2.0);
        let engine = vehicle.add_engine(
            Device::new(m, "Engine", "LargeHydrogenEngine", DeviceClass::Engine),
            fuel,
        );
        let mut thermal = LumpedThermalModel::new(20.0, 0.0);
        thermal.insert(engine, 1_000_000.0);
        let mut session = HeatSession::with_default_factories(H2Config::default());
        assert_eq!(session.attach(&mut vehicle, m), 1);
        Rig {
            vehicle,
            thermal,
            session,
            engine,
            tank,
        }
    }

    impl Rig {
        fn tick(&mut self) {
            self.session.tick(&mut self.vehicle, &mut self.thermal, 1.0);
        }

        fn state(&self) -> Option<EnableState> {
            self.session.controller(self.engine).and_then(|c| c.enable_state())
        }
    }

    #[test]
    fn test_hysteresis_without_operator() {
        let mut r = rig(0.0);
        r.tick();
        assert!(!r.vehicle.is_enabled(r.engine));
        assert_eq!(r.state(), Some(EnableState::OperatorOnAndStarved));

        r.vehicle.refill(r.tank, 1.0);
        r.tick();
        assert!(r.vehicle.is_enabled(r.engine));
        assert_eq!(r.state(), Some(EnableState::OperatorOnAndSupplied));
        let c = r.session.controller(r.engine).unwrap();
        assert_eq!(c.wants_on(), Some(true));
    }

    #[test]
    fn test_operator_off_is_respected() {
        let mut r = rig(1.0);
        r.vehicle.operator_set_enabled(r.engine, false);
        for _ in 0..3 {
            r.tick();
            assert!(!r.vehicle.is_enabled(r.engine));
        }
        assert_eq!(r.state(), Some(EnableState::OperatorOff));
        // No oxidizer is drawn while off.
        assert_eq!(r.vehicle.fill_ratio(r.tank), Some(1.0));
    }

    #[test]
    fn test_guard_never_leaks_across_ticks() {
        let mut r = rig(0.0);
        r.tick();
        assert!(!r.vehicle.has_pending_notifications());
        // The next switch change is the operator's.
        r.vehicle.operator_set_enabled(r.engine, true);
        r.session.deliver_notifications(&mut r.vehicle);
        assert_eq!(r.session.controller(r.engine).unwrap().wants_on(), Some(true));
        r.vehicle.operator_set_enabled(r.engine, false);
        r.session.deliver_notifications(&mut r.vehicle);
        assert_eq!(r.session.controller(r.engine).unwrap().wants_on(), Some(false));
    }

    #[test]
    fn test_operator_intent_binding() {
        let mut r = rig(1.0);
        r.vehicle.operator_set_enabled(r.engine, false);
        r.tick();
        assert!(r.session.set_operator_intent(r.engine, true));
        r.tick();
        assert!(r.vehicle.is_enabled(r.engine));
    }

    #[test]
    fn test_attach_is_idempotent() {
        let mut r = rig(1.0);
        let root = r.vehicle.module_of(r.engine).unwrap();
        assert_eq!(r.session.attach(&mut r.vehicle, root), 0);
        assert_eq!(r.vehicle.subscriber_count(r.engine), 1);
    }

    #[test]
    fn test_detach_cleans_up_subscription() {
        let mut r = rig(1.0);
        assert!(r.session.detach(&mut r.vehicle, r.engine));
        assert_eq!(r.vehicle.subscriber_count(r.engine), 0);
        assert!(!r.session.detach(&mut r.vehicle, r.engine));
    }

    #[test]
    fn test_removed_device_is_dropped_on_tick() {
        let mut r = rig(1.0);
        r.vehicle.remove_device(r.engine);
        r.tick();
        assert!(r.session.controllers().is_empty());
    }

    #[test]
    fn test_despawned_device_releases_subscription() {
        let mut r = rig(1.0);
        r.vehicle.world.despawn(r.engine).unwrap();
        r.tick();
        assert!(r.session.controllers().is_empty());
        assert_eq!(r.vehicle.subscriber_count(r.engine), 0);
    }

    #[test]
    fn test_operator_off_on_starved_device_holds_after_refill() {
        let mut r = rig(0.0);
        r.tick();
        assert!(!r.vehicle.is_enabled(r.engine));

        // The switch is already off; only the intent changes.
        r.session.operator_toggle(&mut r.vehicle, r.engine, false);
        assert!(!r.vehicle.has_pending_notifications());
        r.tick();

        r.vehicle.refill(r.tank, 1.0);
        r.tick();
        assert!(!r.vehicle.is_enabled(r.engine));
        assert_eq!(r.state(), Some(EnableState::OperatorOff));
        assert_eq!(r.vehicle.fill_ratio(r.tank), Some(1.0));

        r.session.operator_toggle(&mut r.vehicle, r.engine, true);
        r.tick();
        assert!(r.vehicle.is_enabled(r.engine));
    }

    #[test]
    fn test_device_loaded_off_stays_off() {
        let mut vehicle = Vehicle::new();
        let m = vehicle.add_module("m");
        let tank = vehicle.add_reservoir(Reservoir::new(m, resources::OXYGEN, 10.0).with_fill(1.0));
        let mut fuel = EngineFuel::new(10.0);
        fuel.hydrogen_input = Some(2.0);
        let engine = vehicle.add_engine(
            Device::new(m, "Engine", "LargeHydrogenEngine", DeviceClass::Engine).with_enabled(false),
            fuel,
        );
        let mut thermal = LumpedThermalModel::new(20.0, 0.0);
        thermal.insert(engine, 1_000_000.0);
        let mut session = HeatSession::with_default_factories(H2Config::default());
        session.attach(&mut vehicle, m);
        assert_eq!(session.controller(engine).and_then(|c| c.wants_on()), Some(false));

        for _ in 0..3 {
            session.tick(&mut vehicle, &mut thermal, 1.0);
        }
        assert!(!vehicle.is_enabled(engine));
        assert_eq!(vehicle.fill_ratio(tank), Some(1.0));
    }

    #[test]
    fn test_default_filters_skip_foreign_devices() {
        let mut vehicle = Vehicle::new();
        let m = vehicle.add_module("m");
        vehicle.add_thruster(
            Device::new(m, "Ion", "LargeBlockLargeThrust", DeviceClass::Thruster),
            ThrusterDrive::new(1000.0, None),
        );
        vehicle.add_engine(
            Device::new(m, "Reactor", "LargeBlockSmallGenerator", DeviceClass::Engine),
            EngineFuel::new(0.0),
        );
        let h2 = vehicle.add_thruster(
            Device::new(m, "H2", "LargeBlockLargeHydrogenThrust", DeviceClass::Thruster),
            ThrusterDrive::new(1000.0, Some(1.0)),
        );
        let mut session = HeatSession::with_default_factories(H2Config::default());
        assert_eq!(session.attach(&mut vehicle, m), 1);
        assert!(session.controller(h2).is_some());
    }

    #[test]
    fn test_builder_may_decline() {
        let mut vehicle = Vehicle::new();
        let m = vehicle.add_module("m");
        vehicle.add_engine(
            Device::new(m, "Engine", "LargeHydrogenEngine", DeviceClass::Engine),
            EngineFuel::new(10.0),
        );
        let mut session = HeatSession::new(H2Config::default());
        session.register_heat_behavior_factory(
            |vehicle, root| devices_of(vehicle, root, DeviceClass::Engine, None),
            |_, _, _| None,
        );
        assert_eq!(session.attach(&mut vehicle, m), 0);
    }

    #[test]
    fn test_tick_heats_burning_engine() {
        let mut r = rig(1.0);
        r.tick();
        let heat = r.thermal.heat(r.engine);
        assert!((heat - 20.0010465).abs() < 1e-4);
        let info = r.session.custom_info(&r.vehicle, &r.thermal, r.engine).unwrap();
        assert!(info.contains("Thermal Status: Heating"));
    }
}
