//! Shared types, error handling and latency recording for querybench.
//!
//! The crate runs a workload's benchmark queries against a SQL engine
//! cluster across a matrix of table formats (file format × compression
//! codec × compression type), fanning each query out to N concurrent
//! client sessions and reducing the per-client timings to a median.

pub mod corpus;
pub mod endpoints;
pub mod executors;
pub mod matrix;
pub mod report;
pub mod runner;
pub mod stats;
pub mod testfile;
pub mod verify;

use hdrhistogram::Histogram;
use serde::Serialize;
use std::time::Instant;

// ────────────────────────────────────────────────────────────────────────────────
// Error type
// ────────────────────────────────────────────────────────────────────────────────

pub type BenchResult<T> = std::result::Result<T, BenchError>;

#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bad invocation: unknown executor kind, empty endpoint pool,
    /// malformed table format string.
    #[error("config error: {0}")]
    Config(String),

    /// Missing or malformed workload definition on disk.
    #[error("workload error: {0}")]
    Workload(String),

    /// A client failed while the run was configured to abort on error.
    #[error("error executing query - '{0}', aborting")]
    Execution(String),

    /// Query output did not match the expected results.
    #[error("result verification failed: {0}")]
    Verification(String),
}

// ────────────────────────────────────────────────────────────────────────────────
// Execution results
// ────────────────────────────────────────────────────────────────────────────────

/// Timing and row payload from one client's run of one query.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    /// Mean wall-clock time across iterations, in seconds.
    pub avg_time: f64,
    /// Sample standard deviation across iterations; only set when the run
    /// used more than one iteration.
    pub std_dev: Option<f64>,
    /// 95th-percentile iteration latency in milliseconds.
    pub p95_ms: f64,
    /// Result rows from the last iteration.
    pub data: Vec<String>,
}

impl ExecutionResult {
    pub fn from_recorder(rec: &LatencyRecorder, data: Vec<String>) -> Self {
        Self {
            avg_time: stats::mean(rec.samples()),
            std_dev: stats::std_dev(rec.samples()),
            p95_ms: rec.p95_ms(),
            data,
        }
    }
}

impl std::fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "avg time: {:.2}s", self.avg_time)?;
        if let Some(sd) = self.std_dev {
            write!(f, ", stddev: {:.2}s", sd)?;
        }
        write!(f, ", p95: {:.1}ms", self.p95_ms)
    }
}

/// One matrix cell's configuration paired with its outcome. The result is
/// kept even when empty (failed or skipped) so the ledger stays auditable.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionDetail {
    pub executor: String,
    pub workload: String,
    pub scale_factor: String,
    pub file_format: String,
    pub compression_codec: String,
    pub compression_type: String,
    pub result: Option<ExecutionResult>,
}

// ────────────────────────────────────────────────────────────────────────────────
// Latency recorder (HDR histogram)
// ────────────────────────────────────────────────────────────────────────────────

/// Per-iteration latency capture for one client's query run.
pub struct LatencyRecorder {
    hist: Histogram<u64>,
    samples: Vec<f64>,
}

impl LatencyRecorder {
    pub fn new() -> Self {
        Self {
            hist: Histogram::<u64>::new_with_bounds(1, 3_600_000_000_000, 3).unwrap(),
            samples: Vec::new(),
        }
    }

    /// Record the elapsed time since `start` as one iteration.
    pub fn record(&mut self, start: Instant) {
        let elapsed = start.elapsed();
        let nanos = elapsed.as_nanos() as u64;
        let _ = self.hist.record(nanos.max(1));
        self.samples.push(elapsed.as_secs_f64());
    }

    /// Iteration times in seconds, in arrival order.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn p95_ms(&self) -> f64 {
        self.hist.value_at_percentile(95.0) as f64 / 1_000_000.0
    }
}

impl Default for LatencyRecorder {
    fn default() -> Self {
        Self::new()
    }
}
