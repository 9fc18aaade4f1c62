//! Store column mapping and row decoding.
//!
//! The directory store keys cells by human-facing column names. [`StoreField`] is the single
//! table translating between those names and the semantic fields used everywhere else; the
//! outbound event's label aliases are derived from it too.

use super::{PatientRecord, PatientSummary};
use serde::Deserialize;
use serde_json::{Map, Value};

/// A semantic patient field and the store column it lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreField {
    PatientId,
    First,
    Last,
    Dob,
    Gender,
    SurgeryType,
    ProcedureDate,
    CarePlan,
    Discharge,
    Meds,
    NextFollowup,
    MustAsk,
    Phone,
}

impl StoreField {
    pub const ALL: [StoreField; 13] = [
        StoreField::PatientId,
        StoreField::First,
        StoreField::Last,
        StoreField::Dob,
        StoreField::Gender,
        StoreField::SurgeryType,
        StoreField::ProcedureDate,
        StoreField::CarePlan,
        StoreField::Discharge,
        StoreField::Meds,
        StoreField::NextFollowup,
        StoreField::MustAsk,
        StoreField::Phone,
    ];

    /// Column name in the directory store.
    pub fn column(self) -> &'static str {
        match self {
            StoreField::PatientId => "Patient ID",
            StoreField::First => "First name",
            StoreField::Last => "Last name",
            StoreField::Dob => "DoB",
            StoreField::Gender => "Gender",
            StoreField::SurgeryType => "surgery_type",
            StoreField::ProcedureDate => "Procedure Date",
            StoreField::CarePlan => "Care Plan (Immediate Post-Op)",
            StoreField::Discharge => "Discharge Instructions",
            StoreField::Meds => "Medications (JSON)",
            StoreField::NextFollowup => "Next Follow-Up Date",
            StoreField::MustAsk => "Must-Ask Question (next call)",
            StoreField::Phone => "Phone",
        }
    }

    pub fn from_column(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column() == column)
    }
}

/// Formula selecting rows whose `field` equals `value` exactly.
///
/// Airtable string literals use backslash escapes, so quotes in the value cannot end the literal
/// early and widen the match.
pub fn exact_match_formula(field: StoreField, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("{{{}}}='{}'", field.column(), escaped)
}

/// One page of the store's list endpoint.
#[derive(Debug, Deserialize)]
pub struct StorePage {
    #[serde(default)]
    pub records: Vec<StoreRow>,
    /// Continuation token; absent on the last page.
    #[serde(default)]
    pub offset: Option<String>,
}

impl StorePage {
    /// Token for the next page, if the store reported a non-empty one.
    pub fn next_offset(&self) -> Option<&str> {
        self.offset.as_deref().filter(|t| !t.is_empty())
    }
}

/// A raw store row: its internal record handle plus cells keyed by column name.
#[derive(Debug, Deserialize)]
pub struct StoreRow {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl StoreRow {
    /// Text content of a cell, unaltered. Blank strings count as absent; numbers and booleans
    /// are rendered.
    pub fn text(&self, field: StoreField) -> Option<String> {
        match self.fields.get(field.column())? {
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Cell content left untouched, for opaque structured columns.
    pub fn raw(&self, field: StoreField) -> Option<Value> {
        match self.fields.get(field.column())? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            other => Some(other.clone()),
        }
    }

    /// Lightweight view for listings; `None` when the row has no identifier.
    pub fn summary(&self) -> Option<PatientSummary> {
        Some(PatientSummary {
            patient_id: self.text(StoreField::PatientId)?,
            first: self.text(StoreField::First),
            last: self.text(StoreField::Last),
            dob: self.text(StoreField::Dob),
            procedure_date: self.text(StoreField::ProcedureDate),
            surgery_type: self.text(StoreField::SurgeryType),
            phone: self.text(StoreField::Phone),
        })
    }

    /// Fully-detailed record; `None` when the row has no identifier.
    pub fn record(&self) -> Option<PatientRecord> {
        Some(PatientRecord {
            airtable_id: self.id.clone(),
            patient_id: self.text(StoreField::PatientId)?,
            first: self.text(StoreField::First),
            last: self.text(StoreField::Last),
            dob: self.text(StoreField::Dob),
            gender: self.text(StoreField::Gender),
            procedure_date: self.text(StoreField::ProcedureDate),
            surgery_type: self.text(StoreField::SurgeryType),
            care_plan: self.text(StoreField::CarePlan),
            discharge: self.text(StoreField::Discharge),
            meds: self.raw(StoreField::Meds),
            next_followup: self.text(StoreField::NextFollowup),
            must_ask: self.text(StoreField::MustAsk),
            phone: self.text(StoreField::Phone),
        })
    }
}
