//! Fallback intent classification.

use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::device::{DeviceClass, DeviceResolver, PowerState, Room};
use super::time::{TimeParser, TIME_PHRASE};
use super::Intent;
use crate::error::Result;

/// Result of a fallback classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Intent,
    /// Confidence in `0.0..=1.0`
    pub confidence: f32,
    /// Name of the classifier that produced this result
    pub source: String,
}

impl Classification {
    /// An unrecognized result with zero confidence.
    pub fn unrecognized(source: impl Into<String>) -> Self {
        Self {
            intent: Intent::Unrecognized,
            confidence: 0.0,
            source: source.into(),
        }
    }
}

/// Pluggable intent classifier consulted when no structural pattern matches.
///
/// Implementations receive the normalized command and the reference instant
/// used to resolve relative times. Errors are reserved for mentions that
/// cannot be completed, such as a device without a resolvable room.
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, text: &str, now: NaiveDateTime) -> Result<Classification>;
}

const CONFIDENCE_WITH_ROOM: f32 = 0.9;
const CONFIDENCE_WITHOUT_ROOM: f32 = 0.75;
const CONFIDENCE_SCHEDULE: f32 = 0.6;

const FILLER: [&str; 6] = ["me", "to", "for", "a", "an", "the"];

/// Deterministic keyword classifier.
///
/// Recognizes looser phrasings than the pattern strategy:
/// - `[the] [room] device on|off`, e.g. "kitchen fan off"
/// - a reminder keyword anywhere plus a time phrase anywhere, e.g.
///   "medicine reminder at 3 pm"
#[derive(Debug, Clone)]
pub struct RuleBasedClassifier {
    postfix_device: Regex,
    reminder_keyword: Regex,
    time_phrase: Regex,
    times: TimeParser,
    resolver: DeviceResolver,
}

impl RuleBasedClassifier {
    pub const NAME: &'static str = "rule-based";

    pub fn new(resolver: DeviceResolver) -> Result<Self> {
        Ok(Self {
            postfix_device: Regex::new(
                r"^(?:the\s+)?(?:(living room|kitchen|bedroom|bathroom)\s+)?(lights?|lamps?|fans?|heaters?|air conditioners?|ac)\s+(on|off)$",
            )?,
            reminder_keyword: Regex::new(r"\b(remind|reminder|alarm|schedule)\b")?,
            time_phrase: Regex::new(&format!(r"\b(?:{})", TIME_PHRASE))?,
            times: TimeParser::new()?,
            resolver,
        })
    }

    fn classify_device(&self, text: &str) -> Result<Option<Classification>> {
        let caps = match self.postfix_device.captures(text) {
            Some(caps) => caps,
            None => return Ok(None),
        };

        let room = caps.get(1).and_then(|m| Room::from_phrase(m.as_str()));
        let class = DeviceClass::from_noun(&caps[2]);
        let state = PowerState::from_token(&caps[3]);
        let confidence = if room.is_some() {
            CONFIDENCE_WITH_ROOM
        } else {
            CONFIDENCE_WITHOUT_ROOM
        };

        Ok(match (self.resolver.resolve(room, class)?, state) {
            (Some(device), Some(state)) => Some(Classification {
                intent: Intent::Device { device, state },
                confidence,
                source: Self::NAME.to_string(),
            }),
            _ => None,
        })
    }

    fn classify_schedule(&self, text: &str, now: NaiveDateTime) -> Result<Option<Classification>> {
        if !self.reminder_keyword.is_match(text) {
            return Ok(None);
        }
        let time = match self.time_phrase.find(text) {
            Some(time) => time,
            None => return Ok(None),
        };

        let at = self.times.resolve(time.as_str(), now)?;
        let remainder = format!("{} {}", &text[..time.start()], &text[time.end()..]);
        let task = remainder
            .split_whitespace()
            .filter(|word| !self.reminder_keyword.is_match(word) && !FILLER.contains(word))
            .collect::<Vec<_>>()
            .join(" ");
        if task.is_empty() {
            return Ok(None);
        }

        Ok(Some(Classification {
            intent: Intent::Schedule { task, at },
            confidence: CONFIDENCE_SCHEDULE,
            source: Self::NAME.to_string(),
        }))
    }
}

impl IntentClassifier for RuleBasedClassifier {
    fn classify(&self, text: &str, now: NaiveDateTime) -> Result<Classification> {
        if let Some(found) = self.classify_device(text)? {
            return Ok(found);
        }
        if let Some(found) = self.classify_schedule(text, now)? {
            return Ok(found);
        }
        Ok(Classification::unrecognized(Self::NAME))
    }
}
