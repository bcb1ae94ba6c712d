//! HTTP store adapter
//!
//! Speaks the PostgREST dialect used by hosted Postgres backends:
//! - upsert: `POST /{table}?on_conflict={column}` with merge-duplicates
//! - delete: `DELETE /{table}?{column}=eq.{v}&{column}=not.in.({..})`
//! - select: `GET /{table}?select=*&{filters}`

use crate::error::StoreError;
use crate::store::{Clause, Filter, ProfileStore, Row, Table};
use async_trait::async_trait;
use ecard_core::StoreConfig;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

const UPSERT_PREFER: &str = "resolution=merge-duplicates,return=minimal";

/// [`ProfileStore`] over HTTP
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl RestStore {
    /// Build a client for `config`
    ///
    /// # Errors
    /// [`StoreError::Transport`] when the HTTP client cannot be built.
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint(config),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, table: Table) -> String {
        format!("{}/{}", self.endpoint, table.name())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(&self, table: Table, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        tracing::debug!(%table, status = status.as_u16(), %message, "store rejected request");
        Err(StoreError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ProfileStore for RestStore {
    async fn upsert(&self, table: Table, row: Row) -> Result<(), StoreError> {
        let request = self
            .client
            .post(self.url(table))
            .query(&[("on_conflict", table.conflict_column())])
            .header("Prefer", UPSERT_PREFER)
            .json(&row);
        self.send(table, request).await.map(drop)
    }

    async fn delete(&self, table: Table, filter: Filter) -> Result<(), StoreError> {
        let request = self
            .client
            .delete(self.url(table))
            .query(&filter_query(&filter));
        self.send(table, request).await.map(drop)
    }

    async fn select(&self, table: Table, filter: Filter) -> Result<Vec<Row>, StoreError> {
        let mut query = vec![("select".to_string(), "*".to_string())];
        query.extend(filter_query(&filter));
        let request = self.client.get(self.url(table)).query(&query);
        self.send(table, request)
            .await?
            .json::<Vec<Row>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

/// Base URL joined with the REST path, without trailing slash
fn endpoint(config: &StoreConfig) -> String {
    let base = config.base_url.trim_end_matches('/');
    let path = config.rest_path.trim_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    }
}

/// Query pairs for a filter
fn filter_query(filter: &Filter) -> Vec<(String, String)> {
    filter
        .clauses()
        .iter()
        .map(|clause| match clause {
            Clause::Eq { column, value } => (column.clone(), format!("eq.{value}")),
            Clause::NotIn { column, values } => {
                let list = values
                    .iter()
                    .map(|v| format!("\"{}\"", v.replace('"', "\\\"")))
                    .collect::<Vec<_>>()
                    .join(",");
                (column.clone(), format!("not.in.({list})"))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base: &str, path: &str) -> StoreConfig {
        StoreConfig {
            base_url: base.into(),
            api_key: "key".into(),
            rest_path: path.into(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn endpoint_joins_without_double_slashes() {
        assert_eq!(
            endpoint(&config("https://abc.example.co/", "/rest/v1")),
            "https://abc.example.co/rest/v1"
        );
        assert_eq!(endpoint(&config("http://localhost:3000", "")), "http://localhost:3000");
    }

    #[test]
    fn filter_query_for_sweep() {
        let filter = Filter::eq("profile_id", "p1").and_not_in("id", vec!["a".into(), "b".into()]);
        assert_eq!(
            filter_query(&filter),
            vec![
                ("profile_id".to_string(), "eq.p1".to_string()),
                ("id".to_string(), "not.in.(\"a\",\"b\")".to_string()),
            ]
        );
    }

    #[test]
    fn owner_only_filter_has_no_not_in() {
        let query = filter_query(&Filter::eq("profile_id", "p1"));
        assert_eq!(query.len(), 1);
    }

    #[test]
    fn store_builds_table_urls() {
        let store = RestStore::new(&config("https://abc.example.co", "/rest/v1")).unwrap();
        assert_eq!(
            store.url(Table::SocialLinks),
            "https://abc.example.co/rest/v1/social_links"
        );
    }
}
