//! Oxygen co-consumption for combustion devices.

use hecs::Entity;

use h2real_logic::constants::resources;
use h2real_logic::depletion::deplete;
use h2real_logic::enable_state::{required_oxidizer, EnableState, EnableStateMachine};
use h2real_logic::locator::find_reservoirs;

use crate::vehicle::{SubscriptionId, Vehicle};

/// Draws oxidizer each tick and keeps the device's switch in line with
/// operator intent and supply.
#[derive(Debug)]
pub struct OxidizerFeed {
    machine: EnableStateMachine,
    subscription: Option<SubscriptionId>,
}

impl OxidizerFeed {
    /// Subscribe to the device's enabled switch and adopt its current position.
    pub fn attach(vehicle: &mut Vehicle, device: Entity) -> Self {
        let machine = EnableStateMachine::new(vehicle.is_enabled(device));
        let subscription = Some(vehicle.subscribe_enabled(device));
        Self {
            machine,
            subscription,
        }
    }

    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.subscription
    }

    pub fn state(&self) -> EnableState {
        self.machine.state()
    }

    pub fn wants_on(&self) -> bool {
        self.machine.wants_on()
    }

    pub fn internal_write_pending(&self) -> bool {
        self.machine.internal_write_pending()
    }

    /// Draw this tick's oxidizer for `fuel_rate` L/s and move the switch if
    /// needed. Reservoirs are searched from the device's module outward.
    pub fn reconcile(
        &mut self,
        vehicle: &mut Vehicle,
        device: Entity,
        fuel_rate: f32,
        delta_time: f32,
    ) -> EnableState {
        let Some(module) = vehicle.module_of(device) else {
            return self.machine.state();
        };
        let required = required_oxidizer(fuel_rate, delta_time);
        let actual = vehicle.is_enabled(device);

        let write = self.machine.reconcile(actual, || {
            let tanks = find_reservoirs(&*vehicle, module, resources::OXYGEN);
            deplete(&mut *vehicle, &tanks, required).satisfied
        });

        if let Some(enabled) = write {
            log::debug!(
                "{:?} -> enabled={} ({:?}, {:.3} L oxidizer)",
                device,
                enabled,
                self.machine.state(),
                required
            );
            if !vehicle.set_enabled(device, enabled) {
                // Nothing will echo back; release the guard here.
                self.machine.on_enabled_changed(enabled);
            }
        }
        self.machine.state()
    }

    pub fn on_enabled_changed(&mut self, enabled: bool) -> bool {
        self.machine.on_enabled_changed(enabled)
    }

    pub fn set_operator_intent(&mut self, wants_on: bool) {
        self.machine.set_operator_intent(wants_on);
    }

    /// Drop the enabled-changed subscription.
    pub fn detach(&mut self, vehicle: &mut Vehicle) {
        if let Some(subscription) = self.subscription.take() {
            vehicle.unsubscribe_enabled(subscription);
        }
    }
}
