//! Airtable REST client for the patient directory.
//!
//! Listing walks the store's continuation tokens one page at a time; single lookups use a
//! `filterByFormula` exact-equality query on the identifier column.

use super::fields::{exact_match_formula, StoreField, StorePage};
use super::{PatientDirectory, PatientRecord, PatientSummary};
use crate::config::DirectoryConfig;
use crate::constants::RESPONSE_BODY_LIMIT;
use crate::error::{DirectoryError, DirectoryResult};
use crate::sink::truncate_chars;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use medrec_types::PatientId;
use reqwest::{Client as HttpClient, Url};
use tracing::{debug, info};

const MISSING_CONFIG: &str =
    "missing Airtable settings; set AIRTABLE_API_KEY, AIRTABLE_BASE_ID and AIRTABLE_TABLE";

/// Position in the store's page sequence.
enum Cursor {
    Start,
    Next(String),
    Done,
}

/// Directory backed by an Airtable base.
#[derive(Clone, Debug)]
pub struct AirtableDirectory {
    http: HttpClient,
    config: DirectoryConfig,
}

impl AirtableDirectory {
    /// Create a client sharing `http` (and its timeout) with the rest of the process.
    pub fn new(http: HttpClient, config: DirectoryConfig) -> Self {
        Self { http, config }
    }

    /// Table URL and bearer credential.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotConfigured`] when the API key or base id is missing, before
    /// any request is made.
    fn endpoint(&self) -> DirectoryResult<(Url, &str)> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| DirectoryError::NotConfigured(MISSING_CONFIG.into()))?;
        let base_id = self
            .config
            .base_id
            .as_deref()
            .ok_or_else(|| DirectoryError::NotConfigured(MISSING_CONFIG.into()))?;
        if self.config.table.trim().is_empty() {
            return Err(DirectoryError::NotConfigured(MISSING_CONFIG.into()));
        }

        let mut url = Url::parse(&self.config.api_url)
            .map_err(|e| DirectoryError::InvalidUrl(format!("{}: {e}", self.config.api_url)))?;
        url.path_segments_mut()
            .map_err(|_| DirectoryError::InvalidUrl(self.config.api_url.clone()))?
            .pop_if_empty()
            .push(base_id)
            .push(&self.config.table);

        Ok((url, key))
    }

    /// Issue one list request with the given query parameters (plus the configured view).
    async fn query(&self, params: &[(&str, &str)]) -> DirectoryResult<StorePage> {
        let (url, key) = self.endpoint()?;

        let mut request = self.http.get(url).bearer_auth(key).query(params);
        if let Some(view) = self.config.view.as_deref() {
            request = request.query(&[("view", view)]);
        }

        let response = request.send().await.map_err(DirectoryError::Request)?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            return Err(DirectoryError::Status {
                status: status.as_u16(),
                body: truncate_chars(&body, RESPONSE_BODY_LIMIT),
            });
        }

        response.json::<StorePage>().await.map_err(DirectoryError::Decode)
    }

    /// Lazy sequence of store pages.
    ///
    /// Page N+1 is requested only once page N has been consumed. The sequence ends after the
    /// first page without a continuation token; the first failed request ends it with an error.
    pub fn pages(&self) -> impl Stream<Item = DirectoryResult<StorePage>> + Send + '_ {
        futures::stream::try_unfold(Cursor::Start, move |cursor| self.next_page(cursor))
    }

    async fn next_page(&self, cursor: Cursor) -> DirectoryResult<Option<(StorePage, Cursor)>> {
        let page = match cursor {
            Cursor::Done => return Ok(None),
            Cursor::Start => self.query(&[]).await?,
            Cursor::Next(token) => self.query(&[("offset", token.as_str())]).await?,
        };
        debug!(
            rows = page.records.len(),
            has_next = page.next_offset().is_some(),
            "Fetched directory page"
        );

        let next = match page.next_offset() {
            Some(token) => Cursor::Next(token.to_string()),
            None => Cursor::Done,
        };
        Ok(Some((page, next)))
    }
}

#[async_trait]
impl PatientDirectory for AirtableDirectory {
    async fn list_patients(&self, limit: usize) -> DirectoryResult<Vec<PatientSummary>> {
        let mut out = Vec::new();
        if limit == 0 {
            return Ok(out);
        }

        let mut pages = Box::pin(self.pages());
        while let Some(page) = pages.try_next().await? {
            out.extend(page.records.iter().filter_map(|row| row.summary()));
            if out.len() >= limit {
                break;
            }
        }
        out.truncate(limit);

        info!(count = out.len(), limit, "Listed patients");
        Ok(out)
    }

    async fn get_patient_by_id(&self, id: &PatientId) -> DirectoryResult<Option<PatientRecord>> {
        let formula = exact_match_formula(StoreField::PatientId, id.as_str());
        let page = self
            .query(&[("filterByFormula", formula.as_str()), ("maxRecords", "1")])
            .await?;

        // The formula is exact already; re-check so a lenient store can never hand back P10 for P1.
        let record = page
            .records
            .iter()
            .filter_map(|row| row.record())
            .find(|record| id.matches(&record.patient_id));

        debug!(patient_id = %id, found = record.is_some(), "Directory lookup");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_server;
    use axum::{
        extract::{Path, Query, State},
        http::{HeaderMap, StatusCode},
        routing::get,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Recorded request: path segments, query parameters and authorization header.
    #[derive(Clone, Debug)]
    struct Seen {
        base: String,
        table: String,
        query: HashMap<String, String>,
        auth: Option<String>,
    }

    #[derive(Clone)]
    struct FakeStore {
        rows: Arc<Vec<Value>>,
        page_size: usize,
        honour_formula: bool,
        blank_token: bool,
        fail_with: Option<StatusCode>,
        seen: Arc<Mutex<Vec<Seen>>>,
    }

    impl FakeStore {
        fn new(rows: Vec<Value>) -> Self {
            Self {
                rows: Arc::new(rows),
                page_size: 2,
                honour_formula: true,
                blank_token: false,
                fail_with: None,
                seen: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn requests(&self) -> Vec<Seen> {
            self.seen.lock().expect("lock").clone()
        }
    }

    /// Understands only the `{Patient ID}='...'` formula shape sent by the client.
    fn formula_value(formula: &str) -> Option<String> {
        let rest = formula.strip_prefix("{Patient ID}='")?.strip_suffix('\'')?;
        Some(rest.replace("\\'", "'").replace("\\\\", "\\"))
    }

    async fn list_rows(
        State(store): State<FakeStore>,
        Path((base, table)): Path<(String, String)>,
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> Result<Json<Value>, StatusCode> {
        store.seen.lock().expect("lock").push(Seen {
            base,
            table,
            query: query.clone(),
            auth: headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        });

        if let Some(status) = store.fail_with {
            return Err(status);
        }

        if let Some(formula) = query.get("filterByFormula") {
            let rows: Vec<Value> = match (store.honour_formula, formula_value(formula)) {
                (true, Some(wanted)) => store
                    .rows
                    .iter()
                    .filter(|r| r["fields"]["Patient ID"] == Value::String(wanted.clone()))
                    .cloned()
                    .collect(),
                _ => store.rows.iter().cloned().collect(),
            };
            let max = query
                .get("maxRecords")
                .and_then(|m| m.parse::<usize>().ok())
                .unwrap_or(rows.len());
            let rows: Vec<Value> = rows.into_iter().take(max).collect();
            return Ok(Json(json!({ "records": rows })));
        }

        let start = query
            .get("offset")
            .and_then(|o| o.parse::<usize>().ok())
            .unwrap_or(0);
        let end = (start + store.page_size).min(store.rows.len());
        let page: Vec<Value> = store.rows[start..end].to_vec();
        let mut body = json!({ "records": page });
        if store.blank_token {
            body["offset"] = Value::String(String::new());
        } else if end < store.rows.len() {
            body["offset"] = Value::String(end.to_string());
        }
        Ok(Json(body))
    }

    async fn directory_for(store: FakeStore, view: Option<&str>) -> AirtableDirectory {
        let app = Router::new()
            .route("/v0/:base/:table", get(list_rows))
            .with_state(store);
        let base_url = spawn_server(app).await;

        let config = DirectoryConfig {
            api_url: format!("{base_url}/v0"),
            api_key: Some("secret".into()),
            base_id: Some("appBase".into()),
            table: "Patients PostOp".into(),
            view: view.map(str::to_string),
        };
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("client");
        AirtableDirectory::new(http, config)
    }

    fn patient(record_id: &str, patient_id: &str, phone: &str) -> Value {
        json!({
            "id": record_id,
            "fields": {
                "Patient ID": patient_id,
                "First name": "Ada",
                "Last name": "Lovelace",
                "Phone": phone,
            }
        })
    }

    fn numbered_rows(n: usize) -> Vec<Value> {
        (0..n)
            .map(|i| patient(&format!("rec{i}"), &format!("P{i}"), "+1-555"))
            .collect()
    }

    #[tokio::test]
    async fn lists_all_pages_until_token_runs_out() {
        let store = FakeStore::new(numbered_rows(5));
        let dir = directory_for(store.clone(), None).await;

        let items = dir.list_patients(200).await.expect("list");
        let ids: Vec<&str> = items.iter().map(|p| p.patient_id.as_str()).collect();
        assert_eq!(ids, vec!["P0", "P1", "P2", "P3", "P4"]);

        let requests = store.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].query.get("offset").is_none());
        assert_eq!(requests[1].query.get("offset").map(String::as_str), Some("2"));
        assert_eq!(requests[2].query.get("offset").map(String::as_str), Some("4"));
    }

    #[tokio::test]
    async fn sends_credentials_and_encoded_table() {
        let store = FakeStore::new(numbered_rows(1));
        let dir = directory_for(store.clone(), Some("Grid view")).await;

        dir.list_patients(10).await.expect("list");

        let requests = store.requests();
        assert_eq!(requests[0].auth.as_deref(), Some("Bearer secret"));
        assert_eq!(requests[0].base, "appBase");
        assert_eq!(requests[0].table, "Patients PostOp");
        assert_eq!(
            requests[0].query.get("view").map(String::as_str),
            Some("Grid view")
        );
    }

    #[tokio::test]
    async fn stops_at_limit_and_never_exceeds_it() {
        let store = FakeStore::new(numbered_rows(9));
        let dir = directory_for(store.clone(), None).await;

        let items = dir.list_patients(3).await.expect("list");
        assert_eq!(items.len(), 3);
        // Page one had 2 rows, page two reached the limit; no third request.
        assert_eq!(store.requests().len(), 2);
    }

    #[tokio::test]
    async fn zero_limit_makes_no_request() {
        let store = FakeStore::new(numbered_rows(3));
        let dir = directory_for(store.clone(), None).await;

        assert!(dir.list_patients(0).await.expect("list").is_empty());
        assert!(store.requests().is_empty());
    }

    #[tokio::test]
    async fn drops_rows_without_identifier() {
        let rows = vec![
            patient("rec1", "P1", "+1"),
            json!({ "id": "rec2", "fields": { "First name": "Nobody" } }),
            json!({ "id": "rec3", "fields": { "Patient ID": "" } }),
            patient("rec4", "P4", "+4"),
        ];
        let dir = directory_for(FakeStore::new(rows), None).await;

        let items = dir.list_patients(10).await.expect("list");
        let ids: Vec<&str> = items.iter().map(|p| p.patient_id.as_str()).collect();
        assert_eq!(ids, vec!["P1", "P4"]);
    }

    #[tokio::test]
    async fn non_success_page_is_an_error() {
        let mut store = FakeStore::new(numbered_rows(3));
        store.fail_with = Some(StatusCode::UNAUTHORIZED);
        let dir = directory_for(store, None).await;

        let err = dir.list_patients(10).await.expect_err("should fail");
        assert!(matches!(err, DirectoryError::Status { status: 401, .. }));
    }

    #[tokio::test]
    async fn missing_credentials_fail_without_request() {
        let store = FakeStore::new(numbered_rows(3));
        let mut dir = directory_for(store.clone(), None).await;
        dir.config.api_key = None;

        let err = dir.list_patients(10).await.expect_err("should fail");
        assert!(matches!(err, DirectoryError::NotConfigured(_)));

        let id = PatientId::parse("P1").expect("id");
        let err = dir.get_patient_by_id(&id).await.expect_err("should fail");
        assert!(matches!(err, DirectoryError::NotConfigured(_)));

        assert!(store.requests().is_empty());
    }

    #[tokio::test]
    async fn unreachable_store_is_a_request_error() {
        let config = DirectoryConfig {
            api_url: "http://127.0.0.1:1/v0".into(),
            api_key: Some("secret".into()),
            base_id: Some("appBase".into()),
            ..DirectoryConfig::default()
        };
        let dir = AirtableDirectory::new(HttpClient::new(), config);

        let err = dir.list_patients(10).await.expect_err("should fail");
        assert!(matches!(err, DirectoryError::Request(_)));
    }

    #[tokio::test]
    async fn get_by_id_returns_full_record() {
        let rows = vec![json!({
            "id": "recA",
            "fields": {
                "Patient ID": "P1",
                "First name": "Ada",
                "Last name": "Lovelace",
                "DoB": "1815-12-10",
                "Gender": "F",
                "surgery_type": "knee",
                "Procedure Date": "2025-01-02",
                "Care Plan (Immediate Post-Op)": "rest",
                "Discharge Instructions": "ice",
                "Medications (JSON)": "[]",
                "Next Follow-Up Date": "2025-02-01",
                "Must-Ask Question (next call)": "Any pain?",
                "Phone": "+1-555"
            }
        })];
        let store = FakeStore::new(rows);
        let dir = directory_for(store.clone(), None).await;

        let id = PatientId::parse("P1").expect("id");
        let record = dir.get_patient_by_id(&id).await.expect("get").expect("found");
        assert_eq!(record.airtable_id, "recA");
        assert_eq!(record.patient_id, "P1");
        assert_eq!(record.gender.as_deref(), Some("F"));
        assert_eq!(record.care_plan.as_deref(), Some("rest"));
        assert_eq!(record.discharge.as_deref(), Some("ice"));
        assert_eq!(record.meds, Some(Value::String("[]".into())));
        assert_eq!(record.must_ask.as_deref(), Some("Any pain?"));

        let requests = store.requests();
        assert_eq!(
            requests[0].query.get("filterByFormula").map(String::as_str),
            Some("{Patient ID}='P1'")
        );
        assert_eq!(
            requests[0].query.get("maxRecords").map(String::as_str),
            Some("1")
        );
    }

    #[tokio::test]
    async fn get_by_id_is_exact_not_prefix() {
        let rows = vec![patient("rec10", "P10", "+10"), patient("rec1", "P1", "+1")];
        let dir = directory_for(FakeStore::new(rows), None).await;

        let id = PatientId::parse("P1").expect("id");
        let record = dir.get_patient_by_id(&id).await.expect("get").expect("found");
        assert_eq!(record.patient_id, "P1");
        assert_eq!(record.airtable_id, "rec1");
    }

    #[tokio::test]
    async fn get_by_id_rejects_inexact_rows_from_lenient_store() {
        let mut store = FakeStore::new(vec![patient("rec10", "P10", "+10")]);
        store.honour_formula = false;
        let dir = directory_for(store, None).await;

        let id = PatientId::parse("P1").expect("id");
        assert!(dir.get_patient_by_id(&id).await.expect("get").is_none());
    }

    #[tokio::test]
    async fn get_by_id_ignores_padded_identifiers_from_lenient_store() {
        let mut store = FakeStore::new(vec![patient("rec1", "P1 ", "+1")]);
        store.honour_formula = false;
        let dir = directory_for(store, None).await;

        let id = PatientId::parse("P1").expect("id");
        assert!(dir.get_patient_by_id(&id).await.expect("get").is_none());
    }

    #[tokio::test]
    async fn blank_continuation_token_stops_listing() {
        let mut store = FakeStore::new(numbered_rows(5));
        store.blank_token = true;
        let dir = directory_for(store.clone(), None).await;

        let items = dir.list_patients(200).await.expect("list");
        assert_eq!(items.len(), 2);
        assert_eq!(store.requests().len(), 1);
    }

    #[tokio::test]
    async fn get_by_id_miss_is_none() {
        let dir = directory_for(FakeStore::new(numbered_rows(3)), None).await;

        let id = PatientId::parse("P99").expect("id");
        assert!(dir.get_patient_by_id(&id).await.expect("get").is_none());
    }

    #[tokio::test]
    async fn pages_are_lazy() {
        let store = FakeStore::new(numbered_rows(6));
        let dir = directory_for(store.clone(), None).await;

        let mut pages = Box::pin(dir.pages());
        let first = pages.try_next().await.expect("page").expect("some");
        assert_eq!(first.records.len(), 2);
        assert_eq!(store.requests().len(), 1);
    }
}
