//! Collaborators the dispatcher acts through.
//!
//! Each concern is a narrow trait ([`DeviceRegistry`], [`EventStore`],
//! [`ReminderTimer`]) with a small implementation suitable for the command
//! line front end and for tests.

mod registry;
mod store;
mod timer;

pub use registry::{DeviceRegistry, InMemoryDeviceRegistry, Transition};
pub use store::{EventStore, JsonLinesEventStore, MemoryEventStore};
pub use timer::{
    RecordingTimer, Reminder, ReminderCallback, ReminderId, ReminderTimer, ThreadTimer,
};
