//! HTTP executor: the engine's REST query endpoint.
//!
//! POSTs `{"database": ..., "query": ...}` to `http://<endpoint>/query`
//! and expects `{"rows": [...]}` back, or `{"error": ...}` / a non-2xx
//! status on failure.

use crate::executors::QueryExecutor;
use crate::{ExecutionResult, LatencyRecorder};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Instant;
use tracing::debug;

pub struct HttpExecutor {
    client: Client,
    url: String,
    db_name: String,
    iterations: usize,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    rows: Vec<String>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpExecutor {
    pub fn new(endpoint: &str, db_name: &str, iterations: usize) -> Self {
        Self {
            client: Client::new(),
            url: format!("http://{}/query", endpoint),
            db_name: db_name.to_string(),
            iterations: iterations.max(1),
        }
    }

    fn run_once(&self, query: &str) -> Result<Vec<String>, String> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "database": self.db_name, "query": query }))
            .send()
            .map_err(|e| format!("post to {}: {}", self.url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(format!("{} from {}: {}", status, self.url, body.trim()));
        }

        let body: QueryResponse = response
            .json()
            .map_err(|e| format!("decode response from {}: {}", self.url, e))?;
        if let Some(error) = body.error {
            return Err(error);
        }
        Ok(body.rows)
    }
}

impl QueryExecutor for HttpExecutor {
    fn execute(&self, query: &str) -> Result<ExecutionResult, String> {
        let mut rec = LatencyRecorder::new();
        let mut data = Vec::new();
        for iteration in 0..self.iterations {
            debug!(iteration, url = %self.url, "http iteration");
            let start = Instant::now();
            data = self.run_once(query)?;
            rec.record(start);
        }
        Ok(ExecutionResult::from_recorder(&rec, data))
    }
}
