//! Constants used throughout the MedRec core crate.
//!
//! Defaults for configuration and the fixed parts of the outbound event envelope live here so
//! that the directory client, the sink and the orchestrator agree on them.

use std::time::Duration;

/// Root of the Airtable REST API.
pub const DEFAULT_AIRTABLE_API_URL: &str = "https://api.airtable.com/v0";

/// Table holding post-operative patient rows when `AIRTABLE_TABLE` is unset.
pub const DEFAULT_AIRTABLE_TABLE: &str = "Patients_PostOp";

/// Timeout applied to every outbound HTTP call.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(20);

/// Page budget for `GET /api/patients` when the caller gives no limit.
pub const DEFAULT_LIST_LIMIT: usize = 200;

/// Language forwarded when the caller does not pick one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// `source` field of every outbound event.
pub const EVENT_SOURCE: &str = "medrec-voice-starter";

/// `event` field of the start-call envelope.
pub const START_CALL_EVENT: &str = "start_call";

/// Response bodies from the store or the sink are cut to this many characters before being relayed.
pub const RESPONSE_BODY_LIMIT: usize = 2_000;

/// Listen address when neither `MEDREC_REST_ADDR` nor `PORT` is set.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:8000";
