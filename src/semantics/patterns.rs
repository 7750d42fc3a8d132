//! Structural patterns for device and scheduling commands.

use chrono::NaiveDateTime;
use regex::Regex;
use tracing::debug;

use super::device::{DeviceClass, DeviceResolver, PowerState, Room};
use super::time::{TimeParser, TIME_PHRASE};
use super::Intent;
use crate::error::{HearthError, Result};

const ROOMS: &str = r"living room|kitchen|bedroom|bathroom";
const DEVICES: &str = r"lights?|fans?|heaters?|air conditioners?";
const LEAD_IN: &str = r"remind me to|set (?:an )?alarm for|schedule a";

/// First-tier extraction strategy: fixed regular patterns over normalized text.
#[derive(Debug, Clone)]
pub struct PatternStrategy {
    device: Regex,
    schedule: Regex,
    lead_in: Regex,
    times: TimeParser,
    resolver: DeviceResolver,
}

impl PatternStrategy {
    /// Compile the patterns.
    pub fn new(resolver: DeviceResolver) -> Result<Self> {
        // verb + state + [the] [room] device [in [the] room]
        let device = Regex::new(&format!(
            r"\b(turn|switch)\s+(on|off)\s+(?:the\s+)?(?:({rooms})\s+)?({devices})(?:\s+in\s+(?:the\s+)?({rooms}))?\b",
            rooms = ROOMS,
            devices = DEVICES,
        ))?;
        // lead-in + task + time phrase
        let schedule = Regex::new(&format!(
            r"\b({lead})\s+(.+?)\s+({time})\s*$",
            lead = LEAD_IN,
            time = TIME_PHRASE,
        ))?;
        let lead_in = Regex::new(&format!(r"\b({lead})\b\s*(.*)$", lead = LEAD_IN))?;

        Ok(Self {
            device,
            schedule,
            lead_in,
            times: TimeParser::new()?,
            resolver,
        })
    }

    /// Match `text` (already normalized) against the patterns.
    ///
    /// Returns `Ok(None)` when no pattern applies. A pattern that applies but
    /// cannot be completed (device without a resolvable room, reminder with an
    /// unusable time) is an error rather than a guess.
    pub fn extract(&self, text: &str, now: NaiveDateTime) -> Result<Option<Intent>> {
        // Reminder lead-ins win over device phrases inside the task.
        if let Some(caps) = self.schedule.captures(text) {
            let task = caps[2].trim().to_string();
            let at = self.times.resolve(&caps[3], now)?;
            debug!(%task, %at, "schedule pattern matched");
            return Ok(Some(Intent::Schedule { task, at }));
        }

        if let Some(caps) = self.lead_in.captures(text) {
            // A reminder lead-in without a recognizable time: never guess one.
            let rest = caps[2].trim();
            debug!(rest, "reminder lead-in without a time phrase");
            return Err(HearthError::ambiguous_time(rest));
        }

        if let Some(caps) = self.device.captures(text) {
            let state = PowerState::from_token(&caps[2]);
            let class = DeviceClass::from_noun(&caps[4]);
            let room = caps
                .get(3)
                .or_else(|| caps.get(5))
                .and_then(|m| Room::from_phrase(m.as_str()));

            debug!(?state, ?class, ?room, "device pattern matched");
            let device = self.resolver.resolve(room, class)?;
            return Ok(match (device, state) {
                (Some(device), Some(state)) => Some(Intent::Device { device, state }),
                _ => None,
            });
        }

        Ok(None)
    }
}
