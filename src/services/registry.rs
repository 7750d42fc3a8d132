//! Device registry.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::semantics::{device_name, DeviceClass, PowerState, Room};

/// Mutable store of device power states.
pub trait DeviceRegistry: Send + Sync {
    /// Set `name` to `state`. Returns `false` if the device is unknown.
    fn set_state(&self, name: &str, state: PowerState) -> bool;
}

/// One recorded change of a device's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub device: String,
    pub from: PowerState,
    pub to: PowerState,
}

#[derive(Debug, Default)]
struct RegistryState {
    devices: BTreeMap<String, PowerState>,
    transitions: Vec<Transition>,
}

/// Registry held in memory.
///
/// Reading the old state, writing the new one and logging the transition
/// happen under a single lock, so the transition log always chains: each
/// entry's `from` equals the previous entry's `to` for the same device.
#[derive(Debug, Default)]
pub struct InMemoryDeviceRegistry {
    state: Mutex<RegistryState>,
}

impl InMemoryDeviceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the household's devices, all off.
    pub fn with_home_devices() -> Self {
        let registry = Self::new();
        for (room, class) in [
            (Room::LivingRoom, DeviceClass::Light),
            (Room::Kitchen, DeviceClass::Fan),
            (Room::Bedroom, DeviceClass::Heater),
            (Room::Bathroom, DeviceClass::Light),
            (Room::LivingRoom, DeviceClass::AirConditioner),
        ] {
            registry.add_device(device_name(room, class), PowerState::Off);
        }
        registry
    }

    /// Register a device, replacing any existing state.
    pub fn add_device(&self, name: impl AsRef<str>, state: PowerState) {
        self.state
            .lock()
            .devices
            .insert(canonical(name.as_ref()), state);
    }

    /// Current state of a device.
    pub fn state_of(&self, name: &str) -> Option<PowerState> {
        self.state.lock().devices.get(&canonical(name)).copied()
    }

    /// Snapshot of all devices and their states, sorted by name.
    pub fn devices(&self) -> Vec<(String, PowerState)> {
        self.state
            .lock()
            .devices
            .iter()
            .map(|(name, state)| (name.clone(), *state))
            .collect()
    }

    /// Every state change so far, in order.
    pub fn transitions(&self) -> Vec<Transition> {
        self.state.lock().transitions.clone()
    }
}

impl DeviceRegistry for InMemoryDeviceRegistry {
    fn set_state(&self, name: &str, state: PowerState) -> bool {
        let name = canonical(name);
        let mut guard = self.state.lock();
        let RegistryState {
            devices,
            transitions,
        } = &mut *guard;

        let current = match devices.get_mut(&name) {
            Some(current) => current,
            None => return false,
        };
        let previous = *current;
        *current = state;

        if previous != state {
            info!(device = %name, from = %previous, to = %state, "device state changed");
            transitions.push(Transition {
                device: name,
                from: previous,
                to: state,
            });
        }
        true
    }
}

fn canonical(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_home_devices() {
        let registry = InMemoryDeviceRegistry::with_home_devices();
        let names: Vec<String> = registry.devices().into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec![
                "bathroom light",
                "bedroom heater",
                "kitchen fan",
                "living room air conditioner",
                "living room light",
            ]
        );
        assert!(registry.devices().iter().all(|(_, s)| *s == PowerState::Off));
    }

    #[test]
    fn test_set_state() {
        let registry = InMemoryDeviceRegistry::with_home_devices();
        assert!(registry.set_state("kitchen fan", PowerState::On));
        assert_eq!(registry.state_of("Kitchen  Fan"), Some(PowerState::On));
        assert!(!registry.set_state("garage door", PowerState::On));
        assert_eq!(registry.state_of("garage door"), None);
    }

    #[test]
    fn test_noop_is_not_a_transition() {
        let registry = InMemoryDeviceRegistry::with_home_devices();
        assert!(registry.set_state("kitchen fan", PowerState::Off));
        assert!(registry.transitions().is_empty());
    }

    #[test]
    fn test_concurrent_updates_chain() {
        let registry = Arc::new(InMemoryDeviceRegistry::with_home_devices());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let state = if i % 2 == 0 { PowerState::On } else { PowerState::Off };
                    for _ in 0..200 {
                        registry.set_state("kitchen fan", state);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let transitions = registry.transitions();
        let mut expected = PowerState::Off;
        for transition in &transitions {
            assert_eq!(transition.from, expected);
            assert_ne!(transition.from, transition.to);
            expected = transition.to;
        }
        assert_eq!(registry.state_of("kitchen fan"), Some(expected));
    }
}
