//! Patient directory lookup.
//!
//! The directory is the external tabular store holding one row per patient. It is the source of
//! truth for patient details; this crate only reads from it.
//!
//! The orchestrator depends on the [`PatientDirectory`] capability rather than on a concrete
//! store so that deployments without a directory ([`NoDirectory`]) and tests with in-memory
//! fakes use the same code path.

pub mod airtable;
pub mod fields;

pub use airtable::AirtableDirectory;
pub use fields::StoreField;

use crate::error::DirectoryResult;
use async_trait::async_trait;
use medrec_types::PatientId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Listing entry for the patient grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PatientSummary {
    pub patient_id: String,
    pub first: Option<String>,
    pub last: Option<String>,
    pub dob: Option<String>,
    pub procedure_date: Option<String>,
    pub surgery_type: Option<String>,
    pub phone: Option<String>,
}

/// A patient row with every mapped column.
///
/// `airtable_id` is the store's own record handle. It is forwarded so downstream automation can
/// write back to the same row and is never used to identify a patient here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PatientRecord {
    pub airtable_id: String,
    pub patient_id: String,
    pub first: Option<String>,
    pub last: Option<String>,
    pub dob: Option<String>,
    pub gender: Option<String>,
    pub procedure_date: Option<String>,
    pub surgery_type: Option<String>,
    pub care_plan: Option<String>,
    pub discharge: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub meds: Option<Value>,
    pub next_followup: Option<String>,
    pub must_ask: Option<String>,
    pub phone: Option<String>,
}

impl PatientRecord {
    /// A record carrying only its identifiers.
    pub fn new(airtable_id: impl Into<String>, patient_id: impl Into<String>) -> Self {
        Self {
            airtable_id: airtable_id.into(),
            patient_id: patient_id.into(),
            first: None,
            last: None,
            dob: None,
            gender: None,
            procedure_date: None,
            surgery_type: None,
            care_plan: None,
            discharge: None,
            meds: None,
            next_followup: None,
            must_ask: None,
            phone: None,
        }
    }
}

/// Read access to the patient directory.
#[async_trait]
pub trait PatientDirectory: Send + Sync {
    /// Lists at most `limit` patients, skipping rows without an identifier.
    async fn list_patients(&self, limit: usize) -> DirectoryResult<Vec<PatientSummary>>;

    /// Fetches the row whose identifier equals `id` exactly.
    ///
    /// A miss is `Ok(None)`, not an error.
    async fn get_patient_by_id(&self, id: &PatientId) -> DirectoryResult<Option<PatientRecord>>;
}

/// Directory capability for deployments without a store.
///
/// Lists nothing and misses every lookup, so start calls must carry name and phone themselves.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDirectory;

#[async_trait]
impl PatientDirectory for NoDirectory {
    async fn list_patients(&self, _limit: usize) -> DirectoryResult<Vec<PatientSummary>> {
        Ok(Vec::new())
    }

    async fn get_patient_by_id(&self, _id: &PatientId) -> DirectoryResult<Option<PatientRecord>> {
        Ok(None)
    }
}
