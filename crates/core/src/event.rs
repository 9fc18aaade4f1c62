//! Outbound start-call envelope.
//!
//! Downstream consumers key off either snake_case machine keys or the store's human-readable
//! column labels. Both key sets come from [`LABEL_ALIASES`]: writing a payload value through
//! [`PayloadBuilder::set`] always writes its alias as well, so the two can never disagree.

use crate::constants::{EVENT_SOURCE, START_CALL_EVENT};
use crate::directory::StoreField;
use serde::Serialize;
use serde_json::{Map, Value};

/// Machine key ↔ store column pairs that are mirrored under a label alias.
pub const LABEL_ALIASES: [(&str, StoreField); 8] = [
    ("gender", StoreField::Gender),
    ("dob", StoreField::Dob),
    ("procedure_date", StoreField::ProcedureDate),
    ("care_plan", StoreField::CarePlan),
    ("discharge_instructions", StoreField::Discharge),
    ("medications_json", StoreField::Meds),
    ("next_followup", StoreField::NextFollowup),
    ("must_ask", StoreField::MustAsk),
];

/// Label alias for a machine key.
pub fn label_for(key: &str) -> Option<&'static str> {
    LABEL_ALIASES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, field)| field.column())
}

/// Machine key for a label alias.
pub fn key_for(label: &str) -> Option<&'static str> {
    LABEL_ALIASES
        .iter()
        .find(|(_, field)| field.column() == label)
        .map(|(k, _)| *k)
}

/// `{source, event, payload}` envelope posted to the sink.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CallStartEvent {
    pub source: String,
    pub event: String,
    pub payload: Map<String, Value>,
}

impl CallStartEvent {
    pub fn start_call(payload: Map<String, Value>) -> Self {
        Self {
            source: EVENT_SOURCE.to_string(),
            event: START_CALL_EVENT.to_string(),
            payload,
        }
    }
}

/// Accumulates payload entries; absent values are written as `null`.
#[derive(Debug, Default)]
pub struct PayloadBuilder {
    payload: Map<String, Value>,
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `key` and, if it has one, its label alias.
    pub fn set<V: Into<Value>>(mut self, key: &str, value: Option<V>) -> Self {
        let value = value.map(Into::into).unwrap_or(Value::Null);
        if let Some(label) = label_for(key) {
            self.payload.insert(label.to_string(), value.clone());
        }
        self.payload.insert(key.to_string(), value);
        self
    }

    /// Attach caller extras under `extras`, skipped when empty.
    pub fn extras(mut self, extras: Map<String, Value>) -> Self {
        if !extras.is_empty() {
            self.payload.insert("extras".to_string(), Value::Object(extras));
        }
        self
    }

    pub fn build(self) -> CallStartEvent {
        CallStartEvent::start_call(self.payload)
    }
}
