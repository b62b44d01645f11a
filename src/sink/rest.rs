//! REST data-service sink
//!
//! Writes rows to a PostgREST-style endpoint (`{base_url}/rest/v1/{table}`)
//! with `apikey` and bearer headers. No retries here: a failed call is
//! reported and the orchestrator moves on to the next bundle.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::SinkSettings;
use crate::error::{Error, Result};

use super::{RecordSink, Table};

/// Row limit for a single select.
const SELECT_LIMIT: u32 = 10_000;

/// PostgREST-style implementation of `RecordSink`
pub struct RestSink {
    base_url: String,
    api_key: String,
    timeout_secs: u64,
    client: Client,
}

impl RestSink {
    /// Build a sink from the `[sink]` settings.
    pub fn new(settings: &SinkSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::Sink(format!("Failed to create HTTP client: {}", e)))?;

        debug!(base_url = %settings.base_url, "REST sink created");

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            timeout_secs: settings.timeout_secs,
            client,
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.name())
    }

    /// PostgREST filter selecting one respondent's rows.
    fn respondent_filter(table: Table, respondent_id: &str) -> [(&'static str, String); 1] {
        [(table.respondent_column(), format!("eq.{}", respondent_id))]
    }

    /// Build the authorization header value (if API key is set)
    fn auth_header(&self) -> Option<String> {
        if self.api_key.is_empty() {
            None
        } else {
            Some(format!("Bearer {}", self.api_key))
        }
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match self.auth_header() {
            Some(auth) => req.header("apikey", &self.api_key).header("Authorization", auth),
            None => req,
        }
    }

    async fn send(&self, table: Table, req: RequestBuilder) -> Result<Response> {
        let response = self.authorize(req).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::SinkTimeout {
                    table: table.name().to_string(),
                    timeout_secs: self.timeout_secs,
                }
            } else {
                Error::sink_request(table.name(), e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(table = %table, status = %status, "Data service returned an error");
        Err(Error::SinkRejected {
            table: table.name().to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl RecordSink for RestSink {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn insert(&self, table: Table, rows: &[Value]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let req = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=minimal")
            .json(rows);
        self.send(table, req).await?;
        debug!(table = %table, rows = rows.len(), "Inserted rows");
        Ok(())
    }

    async fn select(&self, table: Table) -> Result<Vec<Value>> {
        let req = self
            .client
            .get(self.table_url(table))
            .query(&[("select", "*".to_string()), ("limit", SELECT_LIMIT.to_string())]);
        let response = self.send(table, req).await?;
        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| Error::sink_request(table.name(), format!("unreadable response: {}", e)))
    }

    async fn delete_all(&self, table: Table) -> Result<()> {
        // The service refuses an unfiltered delete; match every row instead.
        let req = self
            .client
            .delete(self.table_url(table))
            .query(&[("id", "not.is.null")])
            .header("Prefer", "return=minimal");
        self.send(table, req).await?;
        Ok(())
    }

    async fn delete_for_respondent(&self, table: Table, respondent_id: &str) -> Result<()> {
        let req = self
            .client
            .delete(self.table_url(table))
            .query(&Self::respondent_filter(table, respondent_id))
            .header("Prefer", "return=minimal");
        self.send(table, req).await?;
        debug!(table = %table, respondent = respondent_id, "Deleted respondent rows");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(base_url: &str, api_key: &str) -> SinkSettings {
        SinkSettings {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_table_url() {
        let sink = RestSink::new(&settings("https://db.example.org/", "")).unwrap();
        assert_eq!(
            sink.table_url(Table::RatingResponses),
            "https://db.example.org/rest/v1/likert_responses"
        );
    }

    #[test]
    fn test_respondent_filter() {
        assert_eq!(
            RestSink::respondent_filter(Table::Respondents, "abc"),
            [("id", "eq.abc".to_string())]
        );
        assert_eq!(
            RestSink::respondent_filter(Table::RatingResponses, "abc"),
            [("respondent_id", "eq.abc".to_string())]
        );
    }

    #[test]
    fn test_auth_header() {
        let sink = RestSink::new(&settings("https://db.example.org", "anon-key")).unwrap();
        assert_eq!(sink.auth_header(), Some("Bearer anon-key".to_string()));

        let no_key = RestSink::new(&settings("https://db.example.org", "")).unwrap();
        assert_eq!(no_key.auth_header(), None);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_retryable() {
        // Port 9 (discard) on localhost is closed in test environments
        let mut s = settings("http://127.0.0.1:9", "");
        s.timeout_secs = 2;
        let sink = RestSink::new(&s).unwrap();
        let err = sink
            .insert(Table::Respondents, &[serde_json::json!({"id": "x"})])
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_empty_insert_is_noop() {
        let sink = RestSink::new(&settings("http://127.0.0.1:9", "")).unwrap();
        assert!(sink.insert(Table::ToolResponses, &[]).await.is_ok());
    }
}
