//! Time expressions and their resolution against a reference instant.

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{HearthError, Result};

/// Regex fragment matching every supported time phrase.
pub const TIME_PHRASE: &str =
    r"(?:tomorrow\s+)?at\s+\d{1,2}(?::\d{2})?\s*(?:am|pm)|(?:after|in)\s+\d+\s+(?:hours?|minutes?)";

const CLOCK: &str = r"^(tomorrow\s+)?at\s+(\d{1,2})(?::(\d{2}))?\s*(am|pm)$";
const DURATION: &str = r"^(?:after|in)\s+(\d+)\s+(hours?|minutes?)$";

/// A parsed time phrase, not yet tied to a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeExpression {
    /// `at H am|pm`: the next occurrence strictly after now
    ClockTime { time: NaiveTime },
    /// `tomorrow at H am|pm`: that time on the following day
    Tomorrow { time: NaiveTime },
    /// `after|in N hours|minutes`: now plus the duration
    After { minutes: i64 },
}

impl TimeExpression {
    /// Resolve to an absolute local timestamp relative to `now`.
    pub fn resolve(&self, now: NaiveDateTime) -> Result<NaiveDateTime> {
        let overflow = || HearthError::ambiguous_time(format!("{:?} from {}", self, now));
        match *self {
            Self::ClockTime { time } => {
                let today = now.date().and_time(time);
                if today > now {
                    Ok(today)
                } else {
                    let tomorrow = now.date().succ_opt().ok_or_else(overflow)?;
                    Ok(tomorrow.and_time(time))
                }
            }
            Self::Tomorrow { time } => {
                let tomorrow = now.date().succ_opt().ok_or_else(overflow)?;
                Ok(tomorrow.and_time(time))
            }
            Self::After { minutes } => {
                let delta = TimeDelta::try_minutes(minutes).ok_or_else(overflow)?;
                now.checked_add_signed(delta).ok_or_else(overflow)
            }
        }
    }
}

/// Parser for normalized time phrases such as `at 3 pm` or `after 2 hours`.
#[derive(Debug, Clone)]
pub struct TimeParser {
    clock: Regex,
    duration: Regex,
}

impl TimeParser {
    /// Compile the time patterns.
    pub fn new() -> Result<Self> {
        Ok(Self {
            clock: Regex::new(CLOCK)?,
            duration: Regex::new(DURATION)?,
        })
    }

    /// Parse a phrase. Anything unrecognized is an ambiguous time expression.
    pub fn parse(&self, phrase: &str) -> Result<TimeExpression> {
        let phrase = phrase.trim();
        let ambiguous = || HearthError::ambiguous_time(phrase);

        if let Some(caps) = self.clock.captures(phrase) {
            let hour: u32 = caps[2].parse().map_err(|_| ambiguous())?;
            let minute: u32 = match caps.get(3) {
                Some(m) => m.as_str().parse().map_err(|_| ambiguous())?,
                None => 0,
            };
            let hour = to_24_hour(hour, &caps[4]).ok_or_else(ambiguous)?;
            let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(ambiguous)?;

            return Ok(if caps.get(1).is_some() {
                TimeExpression::Tomorrow { time }
            } else {
                TimeExpression::ClockTime { time }
            });
        }

        if let Some(caps) = self.duration.captures(phrase) {
            let amount: i64 = caps[1].parse().map_err(|_| ambiguous())?;
            let minutes = if caps[2].starts_with("hour") {
                amount.checked_mul(60).ok_or_else(ambiguous)?
            } else {
                amount
            };
            return Ok(TimeExpression::After { minutes });
        }

        Err(ambiguous())
    }

    /// Parse and resolve a phrase in one step.
    pub fn resolve(&self, phrase: &str, now: NaiveDateTime) -> Result<NaiveDateTime> {
        self.parse(phrase)?.resolve(now)
    }
}

/// Convert a 12-hour clock hour to 24-hour form.
///
/// `12 am` is hour 0 and `12 pm` is hour 12. Hours outside 1..=12 are
/// rejected.
pub fn to_24_hour(hour: u32, meridiem: &str) -> Option<u32> {
    if !(1..=12).contains(&hour) {
        return None;
    }
    match (meridiem, hour) {
        ("am", 12) => Some(0),
        ("am", h) => Some(h),
        ("pm", 12) => Some(12),
        ("pm", h) => Some(h + 12),
        _ => None,
    }
}
