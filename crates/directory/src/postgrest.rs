//! Directory lookups against a PostgREST endpoint (e.g. a Supabase project).

use std::time::Duration;

use async_trait::async_trait;
use mailroom_core::DirectoryMatch;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::backend::{DirectoryBackend, DirectoryEntry, DirectoryError};
use crate::policy::MatchPolicy;

#[derive(Debug, Clone)]
pub struct PostgrestSettings {
    /// Project URL without the `/rest/v1` suffix.
    pub base_url: String,
    pub table: String,
    pub name_column: String,
    pub email_column: String,
    pub policy: MatchPolicy,
    /// Upper bound on candidate rows fetched per lookup.
    pub candidate_limit: usize,
    pub timeout: Duration,
}

pub struct PostgrestDirectory {
    client: reqwest::Client,
    settings: PostgrestSettings,
    api_key: String,
}

impl PostgrestDirectory {
    pub fn new(settings: PostgrestSettings, api_key: impl Into<String>) -> Result<Self, DirectoryError> {
        let client = reqwest::Client::builder().timeout(settings.timeout).build()?;
        let settings = PostgrestSettings {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            candidate_limit: settings.candidate_limit.max(1),
            ..settings
        };
        Ok(Self { client, settings, api_key: api_key.into() })
    }

    fn query_params(&self, patterns: &[String]) -> Vec<(String, String)> {
        let s = &self.settings;
        let mut params = vec![
            ("select".to_string(), format!("{},{}", s.name_column, s.email_column)),
            ("limit".to_string(), s.candidate_limit.to_string()),
        ];
        match patterns {
            [single] => params.push((s.name_column.clone(), format!("ilike.{single}"))),
            many => {
                let alternatives: Vec<String> =
                    many.iter().map(|p| format!("{}.ilike.{p}", s.name_column)).collect();
                params.push(("or".to_string(), format!("({})", alternatives.join(","))));
            }
        }
        params
    }

    /// Fetch candidate rows matching the policy's search patterns, in the
    /// order the directory returns them.
    pub async fn candidates(&self, name: &str) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        let patterns = self.settings.policy.search_patterns(name);
        if patterns.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/rest/v1/{}", self.settings.base_url, self.settings.table);
        let resp = self
            .client
            .get(&url)
            .query(&self.query_params(&patterns))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DirectoryError::Server { status: status.as_u16(), body });
        }

        let rows: Vec<Map<String, Value>> = serde_json::from_str(&resp.text().await?)?;
        Ok(rows
            .iter()
            .filter_map(|row| {
                let name = row.get(&self.settings.name_column)?.as_str()?;
                let email = row.get(&self.settings.email_column).and_then(Value::as_str);
                Some(DirectoryEntry { name: name.to_string(), email: email.map(str::to_string) })
            })
            .collect())
    }
}

#[async_trait]
impl DirectoryBackend for PostgrestDirectory {
    #[instrument(skip_all, fields(table = %self.settings.table, policy = %self.settings.policy))]
    async fn lookup(&self, name: &str) -> Result<Option<DirectoryMatch>, DirectoryError> {
        let candidates = self.candidates(name).await?;
        debug!(count = candidates.len(), "directory candidates fetched");
        Ok(self
            .settings
            .policy
            .select(name, &candidates)
            .and_then(DirectoryEntry::to_match))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<(HashMap<String, String>, Option<String>)>>>;

    async fn fake_directory(status: StatusCode, rows: Value) -> (String, Seen) {
        let seen: Seen = Arc::default();
        let log = seen.clone();
        let app = Router::new().route(
            "/rest/v1/people",
            get(move |Query(params): Query<HashMap<String, String>>, headers: HeaderMap| {
                let log = log.clone();
                let rows = rows.clone();
                async move {
                    let key = headers.get("apikey").and_then(|v| v.to_str().ok()).map(str::to_string);
                    log.lock().unwrap().push((params, key));
                    (status, Json(rows))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (format!("http://{addr}/"), seen)
    }

    fn settings(base_url: String, policy: MatchPolicy) -> PostgrestSettings {
        PostgrestSettings {
            base_url,
            table: "people".into(),
            name_column: "name".into(),
            email_column: "email".into(),
            policy,
            candidate_limit: 3,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn resolves_first_row_with_email() {
        let (url, seen) = fake_directory(
            StatusCode::OK,
            json!([
                { "name": "Jane Doe", "email": null },
                { "name": "Jane Doe", "email": "jane@example.com" },
                { "name": "Jane Doerr", "email": "other@example.com" }
            ]),
        )
        .await;
        let dir = PostgrestDirectory::new(settings(url, MatchPolicy::Contains), "service-key").unwrap();

        let found = dir.lookup("jane doe").await.unwrap().unwrap();
        assert_eq!(found.email, "jane@example.com");

        let seen = seen.lock().unwrap();
        let (params, key) = &seen[0];
        assert_eq!(params["name"], "ilike.*jane doe*");
        assert_eq!(params["limit"], "3");
        assert_eq!(params["select"], "name,email");
        assert_eq!(key.as_deref(), Some("service-key"));
    }

    #[tokio::test]
    async fn fuzzy_policy_uses_or_filter() {
        let (url, seen) = fake_directory(StatusCode::OK, json!([{ "name": "Jane Doe", "email": "jane@example.com" }])).await;
        let dir = PostgrestDirectory::new(settings(url, MatchPolicy::Fuzzy { threshold: 0.7 }), "k").unwrap();

        let found = dir.lookup("Jane Do").await.unwrap();
        assert_eq!(found.unwrap().name, "Jane Doe");
        assert_eq!(seen.lock().unwrap()[0].0["or"], "(name.ilike.*Jane*,name.ilike.*Do*)");
    }

    #[tokio::test]
    async fn empty_result_is_no_match() {
        let (url, _) = fake_directory(StatusCode::OK, json!([])).await;
        let dir = PostgrestDirectory::new(settings(url, MatchPolicy::Contains), "k").unwrap();
        assert!(dir.lookup("Jane Doe").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let (url, _) = fake_directory(StatusCode::INTERNAL_SERVER_ERROR, json!({ "message": "boom" })).await;
        let dir = PostgrestDirectory::new(settings(url, MatchPolicy::Contains), "k").unwrap();
        match dir.lookup("Jane Doe").await {
            Err(DirectoryError::Server { status, body }) => {
                assert_eq!(status, 500);
                assert!(body.contains("boom"));
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unusable_name_skips_the_request() {
        let (url, seen) = fake_directory(StatusCode::OK, json!([])).await;
        let dir = PostgrestDirectory::new(settings(url, MatchPolicy::Contains), "k").unwrap();
        assert!(dir.lookup("*,()").await.unwrap().is_none());
        assert!(seen.lock().unwrap().is_empty());
    }
}
