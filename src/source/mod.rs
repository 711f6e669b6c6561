//! Data sources feeding the grid: a local JSON export or an OData-style
//! REST endpoint.

pub mod adapter;

use anyhow::{Context, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::Value;
use std::{fs, path::PathBuf};

use crate::{
    core::error::OverlayError,
    grid::CellValue,
    utils::{escape_odata_value, guid_literal, is_guid, sanitize_guid},
};
pub use adapter::rows_from_json;

/// Characters escaped in query option values.
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'>');

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Generic query capability consumed by feature panels.
pub trait DataSource: Send + Sync {
    /// Short human-readable origin, used in titles and logs.
    fn describe(&self) -> String;

    fn fetch(&self) -> Result<Dataset, OverlayError>;
}

/// Rows read from a JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<Dataset> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {:?}", self.path))?;
        let value: Value = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse JSON from {:?}", self.path))?;
        rows_from_json(&value)
    }
}

impl DataSource for JsonFileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<Dataset, OverlayError> {
        log::info!("📂 Loading rows from {:?}", self.path);
        self.load()
            .map_err(|err| OverlayError::request(format!("{err:#}")))
    }
}

/// Entity set of an OData v4 service, queried with GET.
#[derive(Debug, Clone, Default)]
pub struct RestSource {
    pub base_url: String,
    pub entity_set: String,
    pub select: Vec<String>,
    pub filter: Option<String>,
    pub top: Option<u32>,
    pub bearer_token: Option<String>,
}

impl RestSource {
    pub fn new(base_url: impl Into<String>, entity_set: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            entity_set: entity_set.into(),
            ..Self::default()
        }
    }

    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn top(mut self, top: u32) -> Self {
        self.top = Some(top);
        self
    }

    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Add `field eq 'value'` to the filter, escaping the value.
    pub fn where_eq(self, field: &str, value: &str) -> Self {
        let clause = format!("{field} eq '{}'", escape_odata_value(value));
        self.and_filter(clause)
    }

    /// Add `field eq '<guid>'` to the filter with the GUID sanitized.
    pub fn where_id(self, field: &str, id: &str) -> Self {
        let clause = format!("{field} eq {}", guid_literal(id));
        self.and_filter(clause)
    }

    /// `where_id` when `value` holds a GUID, `where_eq` otherwise.
    pub fn where_value(self, field: &str, value: &str) -> Self {
        if is_guid(&sanitize_guid(value)) {
            self.where_id(field, value)
        } else {
            self.where_eq(field, value)
        }
    }

    fn and_filter(mut self, clause: String) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => format!("{existing} and {clause}"),
            None => clause,
        });
        self
    }

    pub fn url(&self) -> String {
        let mut query: Vec<String> = Vec::new();
        if !self.select.is_empty() {
            let columns = self.select.join(",");
            query.push(format!("$select={}", utf8_percent_encode(&columns, QUERY_VALUE)));
        }
        if let Some(filter) = &self.filter {
            query.push(format!("$filter={}", utf8_percent_encode(filter, QUERY_VALUE)));
        }
        if let Some(top) = self.top {
            query.push(format!("$top={top}"));
        }

        let mut url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.entity_set.trim_start_matches('/')
        );
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }

    fn request(&self) -> Result<Dataset> {
        let url = self.url();
        let mut request = ureq::get(&url)
            .header("OData-MaxVersion", "4.0")
            .header("OData-Version", "4.0")
            .header("Accept", "application/json")
            .header("Content-Type", "application/json; charset=utf-8");
        if let Some(token) = &self.bearer_token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        let mut response = request
            .call()
            .with_context(|| format!("GET {url} failed"))?;
        let value: Value = response
            .body_mut()
            .read_json()
            .with_context(|| format!("Invalid JSON from {url}"))?;
        rows_from_json(&value)
    }
}

impl DataSource for RestSource {
    fn describe(&self) -> String {
        self.entity_set.clone()
    }

    fn fetch(&self) -> Result<Dataset, OverlayError> {
        log::info!("🌐 Querying {}", self.url());
        self.request()
            .map_err(|err| OverlayError::request(format!("{err:#}")))
    }
}

/// A fixed dataset, handy for demos and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pub name: String,
    pub dataset: Dataset,
}

impl DataSource for StaticSource {
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn fetch(&self) -> Result<Dataset, OverlayError> {
        Ok(self.dataset.clone())
    }
}
