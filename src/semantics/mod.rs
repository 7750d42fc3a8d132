//! Semantic extraction.
//!
//! Maps a command onto a typed [`Intent`] independently of whether the
//! grammar accepted it. Two strategies run in order:
//!
//! 1. [`PatternStrategy`]: fixed regular patterns for device toggles and
//!    reminders. A pattern that applies but cannot be completed is final.
//! 2. A fallback [`IntentClassifier`], consulted only when no pattern
//!    applies, whose answer is kept only at or above the configured
//!    confidence.

mod classifier;
mod device;
mod patterns;
mod time;

pub use classifier::{Classification, IntentClassifier, RuleBasedClassifier};
pub use device::{device_name, DeviceClass, DeviceResolver, PowerState, Room};
pub use patterns::PatternStrategy;
pub use time::{to_24_hour, TimeExpression, TimeParser, TIME_PHRASE};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::parser::normalize;

/// What a command asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    /// Set a registry device to a power state
    Device { device: String, state: PowerState },
    /// Fire a reminder for `task` at `at`
    Schedule { task: String, at: NaiveDateTime },
    Unrecognized,
}

impl Intent {
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized)
    }
}

/// Which strategy produced an intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum IntentSource {
    Pattern,
    Fallback { classifier: String, confidence: f32 },
    None,
}

impl IntentSource {
    /// Short name recorded with actions: `pattern`, the classifier name, or `none`.
    pub fn label(&self) -> &str {
        match self {
            Self::Pattern => "pattern",
            Self::Fallback { classifier, .. } => classifier,
            Self::None => "none",
        }
    }

    pub fn confidence(&self) -> Option<f32> {
        match self {
            Self::Fallback { confidence, .. } => Some(*confidence),
            _ => None,
        }
    }
}

/// Intent together with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub intent: Intent,
    pub source: IntentSource,
}

impl Extraction {
    fn unrecognized() -> Self {
        Self {
            intent: Intent::Unrecognized,
            source: IntentSource::None,
        }
    }
}

/// Runs the pattern strategy and then the optional fallback classifier.
pub struct SemanticExtractor {
    patterns: PatternStrategy,
    fallback: Option<Box<dyn IntentClassifier>>,
    min_confidence: f32,
}

impl SemanticExtractor {
    /// Create an extractor with patterns only.
    pub fn new(resolver: DeviceResolver) -> Result<Self> {
        Ok(Self {
            patterns: PatternStrategy::new(resolver)?,
            fallback: None,
            min_confidence: crate::DEFAULT_MIN_CONFIDENCE,
        })
    }

    /// Install a fallback classifier.
    pub fn with_fallback(mut self, classifier: Box<dyn IntentClassifier>) -> Self {
        self.fallback = Some(classifier);
        self
    }

    /// Set the minimum confidence a fallback answer needs to be used.
    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Extract an intent from raw command text.
    ///
    /// `Err` is returned only for command-level conditions: an unresolved
    /// device or an ambiguous time expression.
    pub fn extract(&self, text: &str, now: NaiveDateTime) -> Result<Extraction> {
        let normalized = normalize(text);

        if let Some(intent) = self.patterns.extract(&normalized, now)? {
            return Ok(Extraction {
                intent,
                source: IntentSource::Pattern,
            });
        }

        let classifier = match &self.fallback {
            Some(classifier) => classifier,
            None => return Ok(Extraction::unrecognized()),
        };

        let classification = classifier.classify(&normalized, now)?;
        debug!(
            intent = ?classification.intent,
            confidence = classification.confidence,
            source = %classification.source,
            "fallback classification"
        );

        if !classification.intent.is_recognized() || classification.confidence < self.min_confidence {
            return Ok(Extraction::unrecognized());
        }

        Ok(Extraction {
            intent: classification.intent,
            source: IntentSource::Fallback {
                classifier: classification.source,
                confidence: classification.confidence,
            },
        })
    }
}

impl std::fmt::Debug for SemanticExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticExtractor")
            .field("patterns", &self.patterns)
            .field("fallback", &self.fallback.is_some())
            .field("min_confidence", &self.min_confidence)
            .finish()
    }
}
