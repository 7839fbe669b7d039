//! REST client for the hosted backend (PostgREST conventions)

use super::query::SelectQuery;
use super::traits::{RecordStore, Row};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Errors surfaced by the hosted backend
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend returned {status} for table `{table}`: {body}")]
    Status {
        table: String,
        status: StatusCode,
        body: String,
    },
    #[error("backend returned no representation for table `{0}`")]
    EmptyRepresentation(String),
}

/// Client for the hosted relational backend
pub struct RestClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestClient {
    /// Create a new backend client
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create backend HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Turn a non-2xx response into a `BackendError::Status`
    async fn check(table: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BackendError::Status {
            table: table.to_string(),
            status,
            body,
        }
        .into())
    }
}

#[async_trait]
impl RecordStore for RestClient {
    async fn select(&self, table: &str, query: &SelectQuery) -> Result<Vec<Row>> {
        let response = self
            .authorized(self.client.get(self.table_url(table)))
            .query(&query.to_params())
            .send()
            .await
            .with_context(|| format!("Failed to query table {}", table))?;

        let rows: Vec<Row> = Self::check(table, response)
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to decode rows from {}", table))?;

        debug!(table = %table, rows = rows.len(), "select");
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row> {
        let response = self
            .authorized(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await
            .with_context(|| format!("Failed to insert into {}", table))?;

        let mut rows: Vec<Row> = Self::check(table, response).await?.json().await?;
        debug!(table = %table, "insert");
        rows.pop()
            .ok_or_else(|| BackendError::EmptyRepresentation(table.to_string()).into())
    }

    async fn update(&self, table: &str, id: Uuid, patch: Row) -> Result<Option<Row>> {
        let response = self
            .authorized(self.client.patch(self.table_url(table)))
            .header("Prefer", "return=representation")
            .query(&[("id", format!("eq.{}", id))])
            .json(&patch)
            .send()
            .await
            .with_context(|| format!("Failed to update {} in {}", id, table))?;

        let mut rows: Vec<Row> = Self::check(table, response).await?.json().await?;
        debug!(table = %table, id = %id, matched = rows.len(), "update");
        Ok(rows.pop())
    }

    async fn delete(&self, table: &str, id: Uuid) -> Result<bool> {
        let response = self
            .authorized(self.client.delete(self.table_url(table)))
            .header("Prefer", "return=representation")
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await
            .with_context(|| format!("Failed to delete {} from {}", id, table))?;

        let rows: Vec<Row> = Self::check(table, response).await?.json().await?;
        debug!(table = %table, id = %id, removed = rows.len(), "delete");
        Ok(!rows.is_empty())
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .authorized(self.client.get(format!("{}/rest/v1/", self.base_url)))
            .send()
            .await;
        Ok(matches!(response, Ok(r) if r.status().is_success()))
    }
}
