//! PostgREST-style HTTP adapter for the `jobs` table.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracker_core::{Record, RecordFields, RecordId, RecordPatch, Status, UserId};
use tracker_logging::tracker_warn;
use url::Url;

use crate::{FailureKind, RecordStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub base_url: String,
    /// Public API key sent as `apikey`.
    pub api_key: String,
    /// Signed-in user's access token; the API key is used when absent.
    pub access_token: Option<String>,
    pub table: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: String::new(),
            access_token: None,
            table: "jobs".to_string(),
            connect_timeout_ms: 10_000,
            request_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Deserialize)]
struct JobRow {
    id: Value,
    title: String,
    company: String,
    status: String,
    url: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl JobRow {
    fn into_record(self) -> Result<Record, StoreError> {
        let status: Status = self
            .status
            .parse()
            .map_err(|err| StoreError::new(FailureKind::Decode, format!("{err}")))?;
        Ok(Record {
            id: row_id(&self.id)?,
            title: self.title,
            company: self.company,
            status,
            url: self.url,
            notes: self.notes,
            created_at: self.created_at,
        })
    }
}

/// `select=id` representation returned by insert, update and delete.
#[derive(Debug, Deserialize)]
struct IdRow {
    id: Value,
}

fn row_id(value: &Value) -> Result<RecordId, StoreError> {
    match value {
        Value::String(id) => Ok(RecordId::new(id.clone())),
        Value::Number(id) => Ok(RecordId::new(id.to_string())),
        other => Err(StoreError::new(
            FailureKind::Decode,
            format!("unexpected id {other}"),
        )),
    }
}

fn patch_body(patch: &RecordPatch) -> Value {
    let mut body = Map::new();
    if let Some(title) = &patch.title {
        body.insert("title".into(), json!(title));
    }
    if let Some(company) = &patch.company {
        body.insert("company".into(), json!(company));
    }
    if let Some(status) = patch.status {
        body.insert("status".into(), json!(status.wire_value()));
    }
    if let Some(url) = &patch.url {
        body.insert("url".into(), json!(url));
    }
    if let Some(notes) = &patch.notes {
        body.insert("notes".into(), json!(notes));
    }
    Value::Object(body)
}

#[derive(Debug, Clone)]
pub struct RestStore {
    client: reqwest::Client,
    table_url: Url,
    settings: StoreSettings,
}

impl RestStore {
    pub fn new(settings: StoreSettings) -> Result<Self, StoreError> {
        let base = settings.base_url.trim_end_matches('/');
        let table_url = Url::parse(&format!("{base}/rest/v1/{}", settings.table))
            .map_err(|err| StoreError::new(FailureKind::InvalidConfig, err.to_string()))?;

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(settings.connect_timeout_ms))
            .timeout(Duration::from_millis(settings.request_timeout_ms))
            .build()
            .map_err(|err| StoreError::new(FailureKind::InvalidConfig, err.to_string()))?;

        Ok(Self {
            client,
            table_url,
            settings,
        })
    }

    fn url(&self, query: &[(&str, String)]) -> Url {
        let mut url = self.table_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
        prefer: Option<&str>,
    ) -> Result<Vec<u8>, StoreError> {
        let token = self
            .settings
            .access_token
            .as_deref()
            .unwrap_or(&self.settings.api_key);
        let mut request = self
            .client
            .request(method, url)
            .header("apikey", &self.settings.api_key)
            .header(AUTHORIZATION, format!("Bearer {token}"));
        if let Some(prefer) = prefer {
            request = request.header("Prefer", prefer);
        }
        if let Some(body) = body {
            let bytes = serde_json::to_vec(&body)
                .map_err(|err| StoreError::new(FailureKind::Decode, err.to_string()))?;
            request = request.header(CONTENT_TYPE, "application/json").body(bytes);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(status_error(status, &bytes));
        }
        Ok(bytes.to_vec())
    }
}

#[async_trait::async_trait]
impl RecordStore for RestStore {
    async fn list_records(&self, user: &UserId) -> Result<Vec<Record>, StoreError> {
        let url = self.url(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{user}")),
            ("order", "created_at.desc".to_string()),
        ]);
        let bytes = self.send(Method::GET, url, None, None).await?;
        let rows: Vec<JobRow> = decode(&bytes)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            match row.into_record() {
                Ok(record) => records.push(record),
                Err(err) => tracker_warn!("Skipping job row: {}", err),
            }
        }
        Ok(records)
    }

    async fn create_record(
        &self,
        user: &UserId,
        fields: &RecordFields,
    ) -> Result<RecordId, StoreError> {
        let body = json!([{
            "user_id": user.as_str(),
            "title": fields.title,
            "company": fields.company,
            "status": fields.status.wire_value(),
            "url": fields.url,
            "notes": fields.notes,
        }]);
        let url = self.url(&[("select", "id".to_string())]);
        let bytes = self
            .send(Method::POST, url, Some(body), Some("return=representation"))
            .await?;
        let rows: Vec<IdRow> = decode(&bytes)?;
        let row = rows
            .first()
            .ok_or_else(|| StoreError::new(FailureKind::Decode, "insert returned no rows"))?;
        row_id(&row.id)
    }

    async fn update_record(&self, id: &RecordId, patch: &RecordPatch) -> Result<(), StoreError> {
        let url = self.url(&[("id", format!("eq.{id}")), ("select", "id".to_string())]);
        let bytes = self
            .send(
                Method::PATCH,
                url,
                Some(patch_body(patch)),
                Some("return=representation"),
            )
            .await?;
        expect_row(id, &bytes)
    }

    async fn delete_record(&self, id: &RecordId) -> Result<(), StoreError> {
        let url = self.url(&[("id", format!("eq.{id}")), ("select", "id".to_string())]);
        let bytes = self
            .send(Method::DELETE, url, None, Some("return=representation"))
            .await?;
        expect_row(id, &bytes)
    }
}

/// PostgREST answers 2xx when a filter matches nothing, so an empty
/// representation is how a missing (or foreign) row shows up.
fn expect_row(id: &RecordId, bytes: &[u8]) -> Result<(), StoreError> {
    let rows: Vec<IdRow> = decode(bytes)?;
    if rows.is_empty() {
        return Err(StoreError::new(FailureKind::NotFound, format!("no job {id}")));
    }
    Ok(())
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    serde_json::from_slice(bytes)
        .map_err(|err| StoreError::new(FailureKind::Decode, err.to_string()))
}

/// PostgREST reports errors as `{"message": ...}`; fall back to the raw body.
fn status_error(status: StatusCode, body: &[u8]) -> StoreError {
    let message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| value.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            let text = String::from_utf8_lossy(body).trim().to_string();
            if text.is_empty() {
                status.to_string()
            } else {
                text
            }
        });
    StoreError::new(FailureKind::HttpStatus(status.as_u16()), message)
}

fn map_reqwest_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        return StoreError::new(FailureKind::Timeout, err.to_string());
    }
    StoreError::new(FailureKind::Network, err.to_string())
}
