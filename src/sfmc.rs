//! Marketing Cloud REST client: token exchange and Data Extension rowsets.

use std::borrow::Cow;

use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::config::ApiConfig;
use crate::error::ReportError;
use crate::models::Record;

const PAGE_SIZE: u64 = 2500;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct Rowset {
    items: Vec<Value>,
    #[serde(default)]
    count: Option<u64>,
}

pub struct SfmcClient {
    http: Client,
    config: ApiConfig,
}

impl SfmcClient {
    pub fn new(config: ApiConfig) -> reqwest::Result<Self> {
        let http = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { http, config })
    }

    /// Client-credentials exchange against the configured auth endpoint.
    pub async fn get_access_token(&self) -> Result<String, ReportError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = self
            .http
            .post(&self.config.auth_url)
            .form(&form)
            .send()
            .await
            .map_err(|err| ReportError::Auth(err.to_string()))?;

        if !response.status().is_success() {
            return Err(ReportError::Auth(status_message(response).await));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|err| ReportError::Auth(format!("unexpected token response: {err}")))?;

        debug!(auth_url = %self.config.auth_url, "access token acquired");
        Ok(token.access_token)
    }

    /// Every row of the configured Data Extension, page by page.
    pub async fn get_rows(&self, token: &str) -> Result<Vec<Record>, ReportError> {
        let url = self.config.rowset_url();
        let mut items: Vec<Value> = Vec::new();
        let mut page = 1u64;

        loop {
            let response = self
                .http
                .get(&url)
                .bearer_auth(token)
                .query(&[("$page", page), ("$pageSize", PAGE_SIZE)])
                .send()
                .await
                .map_err(|err| ReportError::Fetch(err.to_string()))?;

            if !response.status().is_success() {
                return Err(ReportError::Fetch(status_message(response).await));
            }

            let rowset: Rowset = response
                .json()
                .await
                .map_err(|err| ReportError::Fetch(format!("malformed rowset payload: {err}")))?;

            let received = rowset.items.len();
            items.extend(rowset.items);
            debug!(page, received, total = ?rowset.count, "rowset page fetched");

            let more = matches!(rowset.count, Some(count) if (items.len() as u64) < count);
            if received == 0 || !more {
                break;
            }
            page += 1;
        }

        let records = records_from_items(&items)?;
        info!(
            key = %self.config.data_extension_key,
            rows = records.len(),
            "Data Extension rows loaded"
        );
        Ok(records)
    }
}

/// Converts rowset items to records. Items in the `{keys, values}` shape are
/// flattened first, primary keys before values.
pub fn records_from_items(items: &[Value]) -> Result<Vec<Record>, ReportError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let object = item
                .as_object()
                .ok_or_else(|| ReportError::Fetch(format!("row {index} is not a JSON object")))?;
            Record::from_json(index, &flatten(object))
        })
        .collect()
}

fn flatten(object: &Map<String, Value>) -> Cow<'_, Map<String, Value>> {
    let keys = object.get("keys").and_then(Value::as_object);
    let values = object.get("values").and_then(Value::as_object);

    if keys.is_none() && values.is_none() {
        return Cow::Borrowed(object);
    }

    let mut flat = Map::new();
    for part in [keys, values].into_iter().flatten() {
        for (name, value) in part {
            flat.insert(name.clone(), value.clone());
        }
    }
    Cow::Owned(flat)
}

async fn status_message(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let body = body.trim();

    if body.is_empty() {
        format!("server answered {status}")
    } else {
        format!("server answered {status}: {}", body.chars().take(200).collect::<String>())
    }
}
