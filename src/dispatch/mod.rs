//! Action dispatch.
//!
//! [`Assistant`] ties the pipeline together: every command is tokenized and
//! checked against the grammar, and independently run through the semantic
//! extractor. The extracted intent decides what happens; the grammar verdict
//! and trace are reported alongside it.
//!
//! Command-level failures never surface as `Err`. They become a
//! [`Outcome::Rejected`] carrying the underlying [`HearthError`].

mod record;

pub use record::{ActionKind, ActionRecord, ActionStatus};

use std::fmt;
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AssistantConfig;
use crate::error::{HearthError, Result};
use crate::grammar::Grammar;
use crate::parser::{parse, tokenize, ParseResult, Trace};
use crate::semantics::{
    Extraction, Intent, IntentSource, PowerState, RuleBasedClassifier, SemanticExtractor,
};
use crate::services::{DeviceRegistry, EventStore, Reminder, ReminderId, ReminderTimer};

/// Result of acting on a command.
#[derive(Debug)]
pub enum Outcome {
    /// A device was set to a state
    Executed { device: String, state: PowerState },
    /// A reminder was handed to the timer
    Scheduled {
        task: String,
        at: NaiveDateTime,
        reminder: ReminderId,
    },
    /// Nothing was done
    Rejected(HearthError),
}

impl Outcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Rejection reason, if rejected.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Self::Rejected(err) => Some(err.rejection_reason()),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Executed { device, state } => write!(f, "Executed: {} → {}", device, state),
            Self::Scheduled { task, at, reminder } => write!(
                f,
                "Scheduled: '{}' at {} ({})",
                task,
                at.format("%Y-%m-%d %H:%M"),
                reminder
            ),
            Self::Rejected(err) => write!(f, "Rejected: {}", err.rejection_reason()),
        }
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Executed { device, state } => {
                let mut s = serializer.serialize_struct("Outcome", 3)?;
                s.serialize_field("status", "executed")?;
                s.serialize_field("device", device)?;
                s.serialize_field("state", state)?;
                s.end()
            }
            Self::Scheduled { task, at, reminder } => {
                let mut s = serializer.serialize_struct("Outcome", 4)?;
                s.serialize_field("status", "scheduled")?;
                s.serialize_field("task", task)?;
                s.serialize_field("at", at)?;
                s.serialize_field("reminder", &reminder.to_string())?;
                s.end()
            }
            Self::Rejected(err) => {
                let mut s = serializer.serialize_struct("Outcome", 3)?;
                s.serialize_field("status", "rejected")?;
                s.serialize_field("reason", err.rejection_reason())?;
                s.serialize_field("detail", &err.to_string())?;
                s.end()
            }
        }
    }
}

/// Everything the assistant knows about one handled command.
#[derive(Debug, Serialize)]
pub struct Response {
    pub command: String,
    /// Grammar verdict
    pub accepted: bool,
    /// Tokens consumed by the start symbol
    pub consumed: usize,
    pub trace: Trace,
    pub intent: Intent,
    pub source: IntentSource,
    pub outcome: Outcome,
    /// Id of the persisted action record, if one was written
    pub record_id: Option<Uuid>,
}

/// Collaborators the assistant acts through.
#[derive(Clone)]
pub struct Services {
    pub registry: Arc<dyn DeviceRegistry>,
    pub store: Arc<dyn EventStore>,
    pub timer: Arc<dyn ReminderTimer>,
}

impl Services {
    pub fn new(
        registry: Arc<dyn DeviceRegistry>,
        store: Arc<dyn EventStore>,
        timer: Arc<dyn ReminderTimer>,
    ) -> Self {
        Self {
            registry,
            store,
            timer,
        }
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Services { .. }")
    }
}

/// The command interpreter.
#[derive(Debug)]
pub struct Assistant {
    grammar: Grammar,
    extractor: SemanticExtractor,
    services: Services,
}

impl Assistant {
    pub fn new(grammar: Grammar, extractor: SemanticExtractor, services: Services) -> Self {
        Self {
            grammar,
            extractor,
            services,
        }
    }

    /// Build an assistant from configuration.
    pub fn from_config(config: &AssistantConfig, services: Services) -> Result<Self> {
        config.validate()?;
        let grammar = config.load_grammar()?;
        let resolver = config.device_resolver();
        let mut extractor =
            SemanticExtractor::new(resolver.clone())?.with_min_confidence(config.min_confidence);
        if config.fallback {
            extractor = extractor.with_fallback(Box::new(RuleBasedClassifier::new(resolver)?));
        }
        Ok(Self::new(grammar, extractor, services))
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Check a command against the grammar only.
    pub fn check(&self, text: &str) -> ParseResult {
        parse(&self.grammar, &tokenize(text))
    }

    /// Handle a command relative to the local clock.
    pub fn handle(&self, text: &str) -> Response {
        self.handle_at(text, Local::now().naive_local())
    }

    /// Handle a command with relative times resolved against `now`.
    pub fn handle_at(&self, text: &str, now: NaiveDateTime) -> Response {
        let tokens = tokenize(text);
        let parsed = parse(&self.grammar, &tokens);

        let (intent, source, outcome, record) = match self.extractor.extract(text, now) {
            Ok(Extraction { intent, source }) => {
                let (outcome, record) = match &intent {
                    Intent::Device { device, state } => {
                        let (outcome, record) = self.set_device(text, now, device, *state);
                        (outcome, Some(record))
                    }
                    Intent::Schedule { task, at } => {
                        let (outcome, record) = self.schedule(text, now, task, *at);
                        (outcome, Some(record))
                    }
                    Intent::Unrecognized => (unrecognized(&parsed, tokens.len()), None),
                };
                (intent, source, outcome, record)
            }
            Err(err) => {
                let record = failed_record(&err, text, now);
                (Intent::Unrecognized, IntentSource::None, Outcome::Rejected(err), record)
            }
        };

        if let Outcome::Rejected(err) = &outcome {
            warn!(command = text, reason = err.rejection_reason(), error = %err, "command rejected");
        }

        let record_id = record.map(|record| {
            let mut record = record
                .with_meta("grammar_accepted", parsed.accepted)
                .with_meta("source", source.label());
            if let Some(confidence) = source.confidence() {
                record = record.with_meta("confidence", confidence);
            }
            if let Err(err) = self.services.store.persist(&record) {
                warn!(record = %record.id, error = %err, "failed to persist action record");
            }
            record.id
        });

        Response {
            command: text.to_string(),
            accepted: parsed.accepted,
            consumed: parsed.consumed,
            trace: parsed.trace,
            intent,
            source,
            outcome,
            record_id,
        }
    }

    fn set_device(
        &self,
        text: &str,
        now: NaiveDateTime,
        device: &str,
        state: PowerState,
    ) -> (Outcome, ActionRecord) {
        let applied = self.services.registry.set_state(device, state);
        let status = if applied {
            ActionStatus::Done
        } else {
            ActionStatus::Failed
        };
        let record = ActionRecord::new(now, text, ActionKind::Device, device, status)
            .with_meta("state", state.as_str());

        let outcome = if applied {
            info!(device, %state, "device command executed");
            Outcome::Executed {
                device: device.to_string(),
                state,
            }
        } else {
            Outcome::Rejected(HearthError::UnknownDevice {
                name: device.to_string(),
            })
        };
        (outcome, record)
    }

    fn schedule(
        &self,
        text: &str,
        now: NaiveDateTime,
        task: &str,
        at: NaiveDateTime,
    ) -> (Outcome, ActionRecord) {
        let record = ActionRecord::new(now, text, ActionKind::Schedule, task, ActionStatus::Scheduled)
            .with_scheduled_time(at);
        let reminder = self.services.timer.schedule(
            at,
            Reminder {
                task: task.to_string(),
                record_id: record.id,
            },
        );
        info!(task, %at, %reminder, "reminder command scheduled");

        let record = record.with_meta("reminder", reminder.to_string());
        let outcome = Outcome::Scheduled {
            task: task.to_string(),
            at,
            reminder,
        };
        (outcome, record)
    }
}

/// Rejection for a command with no actionable intent.
fn unrecognized(parsed: &ParseResult, length: usize) -> Outcome {
    let trace = parsed.trace.clone();
    Outcome::Rejected(if parsed.accepted {
        HearthError::Unrecognized { trace }
    } else {
        HearthError::GrammarMismatch {
            consumed: parsed.consumed,
            length,
            trace,
        }
    })
}

/// Record written for an extraction that applied but could not complete.
fn failed_record(err: &HearthError, text: &str, now: NaiveDateTime) -> Option<ActionRecord> {
    let (kind, target) = match err {
        HearthError::UnresolvedDevice { device } => (ActionKind::Device, device.as_str()),
        HearthError::AmbiguousTimeExpression { phrase } => (ActionKind::Schedule, phrase.as_str()),
        _ => return None,
    };
    Some(
        ActionRecord::new(now, text, kind, target, ActionStatus::Failed)
            .with_meta("reason", err.rejection_reason()),
    )
}

#[cfg(test)]
mod tests {
    use std::thread;

    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    use super::*;
    use crate::semantics::{DeviceClass, Room};
    use crate::services::{InMemoryDeviceRegistry, MemoryEventStore, RecordingTimer};

    struct Fixture {
        assistant: Assistant,
        registry: Arc<InMemoryDeviceRegistry>,
        store: Arc<MemoryEventStore>,
        timer: Arc<RecordingTimer>,
    }

    fn fixture(config: AssistantConfig) -> Fixture {
        let registry = Arc::new(InMemoryDeviceRegistry::with_home_devices());
        let store = Arc::new(MemoryEventStore::new());
        let timer = Arc::new(RecordingTimer::new());
        let services = Services::new(registry.clone(), store.clone(), timer.clone());
        Fixture {
            assistant: Assistant::from_config(&config, services).unwrap(),
            registry,
            store,
            timer,
        }
    }

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 18)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_device_command_executes() {
        let f = fixture(AssistantConfig::default());
        let response = f.assistant.handle_at("Turn on the kitchen fan.", at(10));

        assert!(response.accepted);
        assert!(matches!(
            &response.outcome,
            Outcome::Executed { device, state: PowerState::On } if device == "kitchen fan"
        ));
        assert_eq!(f.registry.state_of("kitchen fan"), Some(PowerState::On));

        let record = f.store.get(response.record_id.unwrap()).unwrap();
        assert_eq!(record.status, ActionStatus::Done);
        assert_eq!(record.kind, ActionKind::Device);
        assert_eq!(record.target, "kitchen fan");
        assert_eq!(record.metadata["grammar_accepted"], serde_json::json!(true));
    }

    #[test]
    fn test_default_room() {
        let config = AssistantConfig::new().with_default_room(DeviceClass::Fan, Room::Kitchen);
        let f = fixture(config);
        let response = f.assistant.handle_at("turn on fan", at(10));
        assert!(matches!(
            &response.outcome,
            Outcome::Executed { device, .. } if device == "kitchen fan"
        ));
    }

    #[test]
    fn test_unresolved_device_is_rejected() {
        let f = fixture(AssistantConfig::default());
        let response = f.assistant.handle_at("turn on fan", at(10));

        assert!(response.accepted);
        match &response.outcome {
            Outcome::Rejected(HearthError::UnresolvedDevice { device }) => assert_eq!(device, "fan"),
            other => panic!("expected unresolved device, got {:?}", other),
        }
        assert_eq!(response.outcome.reason(), Some("unknown device"));
        assert!(f.registry.transitions().is_empty());

        let record = f.store.get(response.record_id.unwrap()).unwrap();
        assert_eq!(record.status, ActionStatus::Failed);
    }

    #[test]
    fn test_unknown_device_is_rejected() {
        // Grammatical, but the registry has no kitchen light
        let f = fixture(AssistantConfig::default());
        let response = f.assistant.handle_at("turn off the kitchen lights", at(10));

        assert!(response.accepted);
        assert!(matches!(
            &response.outcome,
            Outcome::Rejected(HearthError::UnknownDevice { name }) if name == "kitchen light"
        ));
        let record = f.store.get(response.record_id.unwrap()).unwrap();
        assert_eq!(record.status, ActionStatus::Failed);
    }

    #[test]
    fn test_reminder_today_and_tomorrow() {
        let f = fixture(AssistantConfig::default());

        let before = f.assistant.handle_at("remind me to take medicine at 3 pm", at(10));
        assert!(matches!(
            &before.outcome,
            Outcome::Scheduled { task, at: when, .. } if task == "take medicine" && *when == at(15)
        ));

        let after = f.assistant.handle_at("remind me to take medicine at 3 pm", at(16));
        let tomorrow = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap();
        assert!(matches!(&after.outcome, Outcome::Scheduled { at: when, .. } if *when == tomorrow));

        let scheduled = f.timer.scheduled();
        assert_eq!(scheduled.len(), 2);
        assert_eq!(scheduled[0].2.record_id, before.record_id.unwrap());

        let record = f.store.get(before.record_id.unwrap()).unwrap();
        assert_eq!(record.status, ActionStatus::Scheduled);
        assert_eq!(record.scheduled_time, Some(at(15)));
        assert_eq!(record.metadata["reminder"], serde_json::json!("R1"));
    }

    #[test]
    fn test_relative_reminder() {
        let f = fixture(AssistantConfig::default());
        let response = f
            .assistant
            .handle_at("schedule a water the plants after 2 hours", at(10));
        assert!(response.accepted);
        assert!(matches!(
            &response.outcome,
            Outcome::Scheduled { at: when, .. } if *when == at(12)
        ));
    }

    #[test]
    fn test_ambiguous_time_is_rejected() {
        let f = fixture(AssistantConfig::default());
        let response = f.assistant.handle_at("remind me to take medicine", at(10));
        assert!(!response.accepted);
        assert_eq!(response.outcome.reason(), Some("ambiguous time expression"));
        assert!(f.timer.scheduled().is_empty());
    }

    #[test]
    fn test_malformed_command() {
        let f = fixture(AssistantConfig::default());
        let response = f.assistant.handle_at("turn living on lights", at(10));

        assert!(!response.accepted);
        assert!(response.trace.backtracks() >= 1);
        assert_eq!(response.intent, Intent::Unrecognized);
        assert_eq!(response.outcome.reason(), Some("no grammatical or semantic match"));
        match &response.outcome {
            Outcome::Rejected(err) => assert_eq!(err.trace(), Some(&response.trace)),
            other => panic!("expected rejection, got {:?}", other),
        }
        assert_eq!(response.record_id, None);
        assert!(f.store.is_empty());
    }

    #[test]
    fn test_accepted_but_not_actionable() {
        let f = fixture(AssistantConfig::default());
        let response = f.assistant.handle_at("turn off all lights", at(10));
        assert!(response.accepted);
        assert!(matches!(
            response.outcome,
            Outcome::Rejected(HearthError::Unrecognized { .. })
        ));
    }

    #[test]
    fn test_fallback_executes_ungrammatical_command() {
        let f = fixture(AssistantConfig::new().with_fallback(true));
        let response = f.assistant.handle_at("bedroom heater on", at(10));

        assert!(!response.accepted);
        assert!(matches!(response.source, IntentSource::Fallback { .. }));
        assert_eq!(f.registry.state_of("bedroom heater"), Some(PowerState::On));
    }

    #[test]
    fn test_record_carries_intent_source() {
        let f = fixture(AssistantConfig::new().with_fallback(true));

        let response = f.assistant.handle_at("bedroom heater on", at(10));
        let record = f.store.get(response.record_id.unwrap()).unwrap();
        assert_eq!(record.metadata["source"], "rule-based");
        let confidence = record.metadata["confidence"].as_f64().unwrap();
        assert_relative_eq!(confidence, 0.9, epsilon = 1e-6);

        let response = f.assistant.handle_at("turn on the kitchen fan", at(10));
        let record = f.store.get(response.record_id.unwrap()).unwrap();
        assert_eq!(record.metadata["source"], "pattern");
        assert!(!record.metadata.contains_key("confidence"));
    }

    #[test]
    fn test_from_config_rejects_invalid_config() {
        let f = fixture(AssistantConfig::new());
        let services = Services::new(f.registry, f.store, f.timer);
        let config = AssistantConfig::new().with_fallback(true).with_min_confidence(5.0);

        let result = Assistant::from_config(&config, services);
        assert!(matches!(result, Err(HearthError::InvalidConfig { .. })));
    }

    #[test]
    fn test_response_json() {
        let f = fixture(AssistantConfig::default());
        let response = f.assistant.handle_at("switch on the heater in bedroom", at(10));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["accepted"], serde_json::json!(true));
        assert_eq!(value["outcome"]["status"], serde_json::json!("executed"));
        assert_eq!(value["outcome"]["device"], serde_json::json!("bedroom heater"));
        assert_eq!(value["intent"]["type"], serde_json::json!("device"));
        assert!(value["trace"].as_array().is_some_and(|t| !t.is_empty()));
    }

    #[test]
    fn test_concurrent_commands_on_one_device() {
        let f = fixture(AssistantConfig::default());
        let assistant = Arc::new(f.assistant);

        let handles: Vec<_> = ["turn on the kitchen fan", "turn off the kitchen fan"]
            .into_iter()
            .cycle()
            .take(8)
            .map(|command| {
                let assistant = Arc::clone(&assistant);
                thread::spawn(move || {
                    for _ in 0..50 {
                        assistant.handle_at(command, at(10));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let state = f.registry.state_of("kitchen fan").unwrap();
        let last = f.registry.transitions().last().map(|t| t.to).unwrap_or(PowerState::Off);
        assert_eq!(state, last);
        assert_eq!(f.store.len(), 400);
    }
}
