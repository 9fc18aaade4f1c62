//! Call-start orchestration.
//!
//! Merges a caller's partial patient descriptor with the directory record, enforces the phone
//! rule, and forwards a single `start_call` event to the webhook sink.
//!
//! Field precedence, per field:
//! 1. the caller's value, when present and non-blank,
//! 2. the directory record's value,
//! 3. `null`.
//!
//! Exceptions: `language` never comes from the directory (it has no such column) and defaults to
//! `"en"`; `name` is always a single given-name token.

use crate::constants::DEFAULT_LANGUAGE;
use crate::directory::{PatientDirectory, PatientRecord};
use crate::error::{StartCallError, StartCallResult};
use crate::event::{CallStartEvent, PayloadBuilder};
use crate::sink::EventSink;
use medrec_types::{NonEmptyText, PatientId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;

/// Caller input for `POST /api/start`.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct CallStartRequest {
    pub patient_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub surgery_type: Option<String>,
    /// Free-form data forwarded under `payload.extras`.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub extras: Option<Map<String, Value>>,
}

/// Relayed result of forwarding a start call.
///
/// `ok` is false when the sink answered with a non-2xx status; that is still a successful call
/// from the caller's point of view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct CallStartOutcome {
    pub ok: bool,
    pub status: u16,
    pub airtable_id: Option<String>,
    /// Sink response body, only when the sink rejected the event.
    pub sink_response: Option<String>,
}

/// Outbound field values after precedence has been applied.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedCall {
    pub patient_id: PatientId,
    pub airtable_id: Option<String>,
    pub name: Option<NonEmptyText>,
    pub first: Option<String>,
    pub last: Option<String>,
    pub phone: String,
    pub language: String,
    pub surgery_type: Option<String>,
    pub gender: Option<String>,
    pub dob: Option<String>,
    pub procedure_date: Option<String>,
    pub care_plan: Option<String>,
    pub discharge: Option<String>,
    pub meds: Option<Value>,
    pub next_followup: Option<String>,
    pub must_ask: Option<String>,
    pub extras: Map<String, Value>,
}

impl ResolvedCall {
    /// Apply field precedence to caller input and an optional directory record.
    ///
    /// Caller values are forwarded exactly as supplied; blankness only decides whether they
    /// count as present.
    ///
    /// # Errors
    ///
    /// Returns [`StartCallError::Validation`] when neither source yields a phone number.
    pub fn resolve(
        patient_id: PatientId,
        request: CallStartRequest,
        record: Option<PatientRecord>,
    ) -> StartCallResult<Self> {
        let caller_name = present(request.name);

        let first = record
            .as_ref()
            .and_then(|r| present(r.first.clone()))
            .or_else(|| caller_name.clone());
        let name = caller_name
            .as_deref()
            .or(first.as_deref())
            .and_then(|n| NonEmptyText::new(n).ok())
            .map(|n| n.first_token());

        let phone = present(request.phone)
            .or_else(|| record.as_ref().and_then(|r| present(r.phone.clone())))
            .ok_or_else(|| {
                StartCallError::Validation(
                    "No phone available (add 'Phone' in the directory or pass one).".into(),
                )
            })?;

        let language =
            present(request.language).unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        let surgery_type = present(request.surgery_type)
            .or_else(|| record.as_ref().and_then(|r| r.surgery_type.clone()));

        let mut resolved = Self {
            patient_id,
            airtable_id: None,
            name,
            first,
            last: None,
            phone,
            language,
            surgery_type,
            gender: None,
            dob: None,
            procedure_date: None,
            care_plan: None,
            discharge: None,
            meds: None,
            next_followup: None,
            must_ask: None,
            extras: request.extras.unwrap_or_default(),
        };

        if let Some(record) = record {
            resolved.airtable_id = Some(record.airtable_id);
            resolved.last = record.last;
            resolved.gender = record.gender;
            resolved.dob = record.dob;
            resolved.procedure_date = record.procedure_date;
            resolved.care_plan = record.care_plan;
            resolved.discharge = record.discharge;
            resolved.meds = record.meds;
            resolved.next_followup = record.next_followup;
            resolved.must_ask = record.must_ask;
        }

        Ok(resolved)
    }

    /// Build the outbound envelope; label aliases are added by the payload builder.
    pub fn to_event(&self) -> CallStartEvent {
        PayloadBuilder::new()
            .set("airtable_id", self.airtable_id.clone())
            .set("patient_id", Some(self.patient_id.as_str()))
            .set("name", self.name.as_ref().map(NonEmptyText::as_str))
            .set("first", self.first.clone())
            .set("last", self.last.clone())
            .set("phone", Some(self.phone.as_str()))
            .set("language", Some(self.language.as_str()))
            .set("surgery_type", self.surgery_type.clone())
            .set("gender", self.gender.clone())
            .set("dob", self.dob.clone())
            .set("procedure_date", self.procedure_date.clone())
            .set("care_plan", self.care_plan.clone())
            .set("discharge_instructions", self.discharge.clone())
            .set("medications_json", self.meds.clone())
            .set("next_followup", self.next_followup.clone())
            .set("must_ask", self.must_ask.clone())
            .extras(self.extras.clone())
            .build()
    }
}

/// Non-blank value, kept exactly as supplied.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Start-call use case.
///
/// `sink` is `None` when no webhook URL is configured; every call then fails before touching
/// the network.
#[derive(Clone)]
pub struct CallStartService {
    directory: Arc<dyn PatientDirectory>,
    sink: Option<Arc<dyn EventSink>>,
}

impl CallStartService {
    pub fn new(directory: Arc<dyn PatientDirectory>, sink: Option<Arc<dyn EventSink>>) -> Self {
        Self { directory, sink }
    }

    pub fn directory(&self) -> &Arc<dyn PatientDirectory> {
        &self.directory
    }

    /// Resolve, validate and forward one start call.
    ///
    /// # Errors
    ///
    /// Returns a [`StartCallError`] if:
    /// - no sink is configured (`Configuration`),
    /// - `patient_id` is blank, or no phone can be resolved (`Validation`),
    /// - the patient is unknown and the caller did not give both name and phone (`NotFound`),
    /// - the directory lookup fails (`Directory`),
    /// - the sink cannot be reached (`Sink`).
    pub async fn start_call(&self, request: CallStartRequest) -> StartCallResult<CallStartOutcome> {
        let sink = self
            .sink
            .as_ref()
            .ok_or_else(|| StartCallError::Configuration("N8N_WEBHOOK_URL not configured".into()))?;

        let patient_id = PatientId::parse(&request.patient_id)
            .map_err(|_| StartCallError::Validation("patient_id is required".into()))?;

        let record = self.directory.get_patient_by_id(&patient_id).await?;
        if record.is_none() {
            let walk_in = NonEmptyText::from_optional(request.name.as_deref()).is_some()
                && NonEmptyText::from_optional(request.phone.as_deref()).is_some();
            if !walk_in {
                return Err(StartCallError::NotFound(format!(
                    "Patient {patient_id} not found in directory"
                )));
            }
            warn!(patient_id = %patient_id, "Patient not in directory; using caller details");
        }

        let resolved = ResolvedCall::resolve(patient_id, request, record)?;
        let event = resolved.to_event();

        info!(patient_id = %resolved.patient_id, language = %resolved.language, "Forwarding start_call");
        let response = sink.forward(&event).await?;

        Ok(CallStartOutcome {
            ok: response.ok,
            status: response.status,
            airtable_id: resolved.airtable_id,
            sink_response: (!response.ok).then_some(response.body),
        })
    }
}
