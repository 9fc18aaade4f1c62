//! # MedRec Core
//!
//! Business logic for the MedRec voice backend:
//! - patient directory lookup against an Airtable-style store ([`directory`])
//! - the start-call envelope and its label aliases ([`event`])
//! - forwarding to the workflow webhook ([`sink`])
//! - merging caller input with the directory record ([`orchestrator`])
//!
//! **No HTTP server concerns**: routing, status codes and CORS belong in `api-rest`.

pub mod config;
pub mod constants;
pub mod directory;
pub mod error;
pub mod event;
pub mod orchestrator;
pub mod sink;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{CoreConfig, CorsOrigins, DirectoryConfig, DirectoryMode};
pub use directory::{
    AirtableDirectory, NoDirectory, PatientDirectory, PatientRecord, PatientSummary,
};
pub use error::{
    ConfigError, ConfigResult, DirectoryError, DirectoryResult, SinkError, StartCallError,
    StartCallResult,
};
pub use event::CallStartEvent;
pub use orchestrator::{CallStartOutcome, CallStartRequest, CallStartService};
pub use sink::{EventSink, SinkResponse, WebhookSink};

// Re-exported so callers can build the HTTP client handed to the directory and sink.
pub use reqwest;

use std::sync::Arc;

/// Directory capability selected by the configuration.
///
/// # Errors
///
/// Returns [`ConfigError::HttpClient`] if the HTTP client cannot be built.
pub fn directory_from_config(cfg: &CoreConfig) -> ConfigResult<Arc<dyn PatientDirectory>> {
    let directory: Arc<dyn PatientDirectory> = match cfg.directory_mode() {
        DirectoryMode::Airtable => Arc::new(AirtableDirectory::new(
            cfg.http_client()?,
            cfg.directory().clone(),
        )),
        DirectoryMode::Disabled => Arc::new(NoDirectory),
    };
    Ok(directory)
}

/// Webhook sink for the configured URL, or `None` when no URL is set.
///
/// # Errors
///
/// Returns [`ConfigError::HttpClient`] if the HTTP client cannot be built.
pub fn sink_from_config(cfg: &CoreConfig) -> ConfigResult<Option<Arc<dyn EventSink>>> {
    let Some(url) = cfg.sink_url() else {
        return Ok(None);
    };
    let sink: Arc<dyn EventSink> = Arc::new(WebhookSink::new(cfg.http_client()?, url));
    Ok(Some(sink))
}

/// Wire the start-call service from configuration.
///
/// # Errors
///
/// Returns [`ConfigError::HttpClient`] if the HTTP client cannot be built.
pub fn call_start_service(cfg: &CoreConfig) -> ConfigResult<CallStartService> {
    Ok(CallStartService::new(
        directory_from_config(cfg)?,
        sink_from_config(cfg)?,
    ))
}
