//! Device vocabulary and device-name resolution.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HearthError, Result};

/// Requested power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    /// Parse from the literal token `on` or `off`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "on" => Some(Self::On),
            "off" => Some(Self::Off),
            _ => None,
        }
    }

    /// Lowercase name as used in commands.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of device the interpreter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DeviceClass {
    Light,
    Fan,
    Heater,
    AirConditioner,
}

impl DeviceClass {
    /// All device classes.
    pub const ALL: [DeviceClass; 4] = [
        DeviceClass::Light,
        DeviceClass::Fan,
        DeviceClass::Heater,
        DeviceClass::AirConditioner,
    ];

    /// Map a (possibly plural) device noun to its class.
    pub fn from_noun(noun: &str) -> Option<Self> {
        match noun {
            "light" | "lights" | "lamp" | "lamps" => Some(Self::Light),
            "fan" | "fans" => Some(Self::Fan),
            "heater" | "heaters" => Some(Self::Heater),
            "air conditioner" | "air conditioners" | "conditioner" | "ac" => {
                Some(Self::AirConditioner)
            }
            _ => None,
        }
    }

    /// Canonical singular noun, used to build device names.
    pub fn noun(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Fan => "fan",
            Self::Heater => "heater",
            Self::AirConditioner => "air conditioner",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

impl FromStr for DeviceClass {
    type Err = HearthError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_noun(&s.trim().to_lowercase().replace('_', " "))
            .ok_or_else(|| HearthError::invalid_config(format!("unknown device class '{}'", s)))
    }
}

impl TryFrom<String> for DeviceClass {
    type Error = HearthError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DeviceClass> for String {
    fn from(class: DeviceClass) -> Self {
        class.noun().to_string()
    }
}

/// Rooms the interpreter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Room {
    LivingRoom,
    Kitchen,
    Bedroom,
    Bathroom,
}

impl Room {
    /// Map a room phrase to a room.
    pub fn from_phrase(phrase: &str) -> Option<Self> {
        match phrase {
            "living room" | "living" | "lounge" => Some(Self::LivingRoom),
            "kitchen" => Some(Self::Kitchen),
            "bedroom" => Some(Self::Bedroom),
            "bathroom" => Some(Self::Bathroom),
            _ => None,
        }
    }

    /// Canonical room name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LivingRoom => "living room",
            Self::Kitchen => "kitchen",
            Self::Bedroom => "bedroom",
            Self::Bathroom => "bathroom",
        }
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Room {
    type Err = HearthError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_phrase(&s.trim().to_lowercase().replace('_', " "))
            .ok_or_else(|| HearthError::invalid_config(format!("unknown room '{}'", s)))
    }
}

impl TryFrom<String> for Room {
    type Error = HearthError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Room> for String {
    fn from(room: Room) -> Self {
        room.name().to_string()
    }
}

/// Full device name as known to the registry, e.g. `"kitchen fan"`.
pub fn device_name(room: Room, class: DeviceClass) -> String {
    format!("{} {}", room, class)
}

/// Turns a room/device mention into a registry device name.
///
/// Precedence:
/// 1. room and device both mentioned → `"{room} {device}"`
/// 2. device only → the configured default room for that class, otherwise
///    [`HearthError::UnresolvedDevice`]
/// 3. no device → `None`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceResolver {
    default_rooms: BTreeMap<DeviceClass, Room>,
}

impl DeviceResolver {
    /// Create a resolver with no default rooms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver from a default-room table.
    pub fn with_default_rooms(default_rooms: BTreeMap<DeviceClass, Room>) -> Self {
        Self { default_rooms }
    }

    /// Set the room assumed when a device of `class` is named without one.
    pub fn set_default_room(&mut self, class: DeviceClass, room: Room) {
        self.default_rooms.insert(class, room);
    }

    /// Default room for a class, if configured.
    pub fn default_room(&self, class: DeviceClass) -> Option<Room> {
        self.default_rooms.get(&class).copied()
    }

    /// Resolve a mention to a device name.
    pub fn resolve(&self, room: Option<Room>, class: Option<DeviceClass>) -> Result<Option<String>> {
        let class = match class {
            Some(class) => class,
            None => return Ok(None),
        };

        match room.or_else(|| self.default_room(class)) {
            Some(room) => Ok(Some(device_name(room, class))),
            None => Err(HearthError::UnresolvedDevice {
                device: class.to_string(),
            }),
        }
    }
}
