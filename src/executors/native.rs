//! Native line-protocol executor.
//!
//! Speaks the engine's plain-text query protocol over TCP: one request
//! line `<db>\x1f<options>\x1f<query>` (newlines in the query folded to
//! spaces), then result rows back until an empty line. Error responses
//! arrive as a single line prefixed `ERROR:`. Each iteration opens a
//! fresh connection, so every client session is fully independent.

use crate::executors::QueryExecutor;
use crate::{ExecutionResult, LatencyRecorder};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::Instant;
use tracing::debug;

const FIELD_SEP: char = '\x1f';

pub struct NativeExecutor {
    endpoint: String,
    db_name: String,
    iterations: usize,
    exec_options: String,
}

impl NativeExecutor {
    pub fn new(endpoint: &str, db_name: &str, iterations: usize, exec_options: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            db_name: db_name.to_string(),
            iterations: iterations.max(1),
            exec_options: exec_options.to_string(),
        }
    }

    fn run_once(&self, query: &str) -> Result<Vec<String>, String> {
        let mut stream = TcpStream::connect(&self.endpoint)
            .map_err(|e| format!("connect to {}: {}", self.endpoint, e))?;

        let flat = query.replace(['\n', '\r', FIELD_SEP], " ");
        writeln!(
            stream,
            "{}{}{}{}{}",
            self.db_name, FIELD_SEP, self.exec_options, FIELD_SEP, flat
        )
        .map_err(|e| format!("send to {}: {}", self.endpoint, e))?;

        let mut reader = BufReader::new(stream);
        let mut rows = Vec::new();
        loop {
            let mut line = String::new();
            let n = reader
                .read_line(&mut line)
                .map_err(|e| format!("read from {}: {}", self.endpoint, e))?;
            if n == 0 {
                break;
            }
            let line = line.trim_end_matches(['\r', '\n']);
            if line.is_empty() {
                break;
            }
            if let Some(msg) = line.strip_prefix("ERROR:") {
                return Err(msg.trim().to_string());
            }
            rows.push(line.to_string());
        }
        Ok(rows)
    }
}

impl QueryExecutor for NativeExecutor {
    fn execute(&self, query: &str) -> Result<ExecutionResult, String> {
        let mut rec = LatencyRecorder::new();
        let mut data = Vec::new();
        for iteration in 0..self.iterations {
            debug!(iteration, endpoint = %self.endpoint, "native iteration");
            let start = Instant::now();
            data = self.run_once(query)?;
            rec.record(start);
        }
        Ok(ExecutionResult::from_recorder(&rec, data))
    }
}
