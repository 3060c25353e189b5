//! Workload runner: fans each query out to N concurrent client sessions,
//! reduces the surviving timings to a median, and drives the format ×
//! compression matrix.

use crate::corpus::{self, QueryCase};
use crate::executors::{ExecutorConfig, ExecutorFactory, ExecutorKind, QueryExecutor};
use crate::matrix::{self, TableFormat};
use crate::{stats, verify, BenchError, BenchResult, ExecutionDetail, ExecutionResult};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::process::Command;
use std::thread;
use tracing::{debug, error, info, warn};

/// Everything fixed for one benchmarking session.
pub struct RunnerConfig {
    pub workload: String,
    pub scale_factor: String,
    /// Strategy used for the system under test.
    pub primary: ExecutorKind,
    /// Skip the system under test and only run the comparison engine.
    pub skip_primary: bool,
    /// Also run every query on the comparison engine.
    pub compare: bool,
    pub iterations: usize,
    /// Concurrent client sessions per query.
    pub clients: usize,
    /// Prime the buffer cache before each measured query.
    pub prime_cache: bool,
    /// Command invoked for priming; receives the query as its last argument.
    pub prime_cache_cmd: String,
    /// The cluster is not local to this machine; priming only works against
    /// a local buffer cache, so remote runs skip it.
    pub remote: bool,
    /// Verify primary results against the expected output in the test files.
    pub verify_results: bool,
    /// Case-insensitive comma-separated query-name allowlist.
    pub query_names: Option<String>,
}

/// Accumulated outcomes keyed by (query name, query text); one
/// (primary, comparison) detail pair per matrix cell processed.
pub type ResultLedger = HashMap<(String, String), Vec<(ExecutionDetail, ExecutionDetail)>>;

pub struct WorkloadRunner {
    config: RunnerConfig,
    factory: ExecutorFactory,
    summary: String,
    ledger: ResultLedger,
}

impl WorkloadRunner {
    pub fn new(config: RunnerConfig, factory: ExecutorFactory) -> Self {
        Self {
            config,
            factory,
            summary: String::new(),
            ledger: ResultLedger::new(),
        }
    }

    /// Human-readable per-query narration accumulated during the run.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn ledger(&self) -> &ResultLedger {
        &self.ledger
    }

    /// Run the whole workload: load the corpus, expand the test-vector
    /// matrix and execute every query under every vector.
    pub fn run_workload(
        &mut self,
        workload_dir: &Path,
        table_formats: Option<&str>,
        exploration_strategy: &str,
        abort_on_error: bool,
    ) -> BenchResult<()> {
        info!(
            "running workload: {} / scale factor: {}",
            self.config.workload, self.config.scale_factor
        );
        let corpus = corpus::load_corpus(workload_dir, &self.config.workload)?;

        let vectors = match table_formats {
            Some(formats) => {
                let dataset = matrix::dataset_for_workload(workload_dir, &self.config.workload);
                matrix::expand_formats(&dataset, formats)?
            }
            None => matrix::load_declared_vectors(
                workload_dir,
                &self.config.workload,
                exploration_strategy,
            )?,
        };

        for vector in &vectors {
            self.execute_queries(&corpus, vector, abort_on_error)?;
        }
        Ok(())
    }

    /// Run every corpus query under one test vector, appending a detail
    /// pair per query to the ledger regardless of outcome.
    pub fn execute_queries(
        &mut self,
        corpus: &BTreeMap<String, Vec<QueryCase>>,
        vector: &TableFormat,
        abort_on_error: bool,
    ) -> BenchResult<()> {
        let table_format = vector.to_string();
        info!(
            "running test vector - file format: {} compression: {} / {}",
            vector.file_format, vector.compression_codec, vector.compression_type
        );

        let name_filter: Option<Vec<String>> = self
            .config
            .query_names
            .as_ref()
            .map(|names| names.split(',').map(|n| n.trim().to_lowercase()).collect());

        for cases in corpus.values() {
            for case in cases {
                if let Some(filter) = &name_filter {
                    if !filter.contains(&case.name.to_lowercase()) {
                        info!("skipping query '{}'", case.name);
                        continue;
                    }
                }

                let db_name = vector.db_name(&self.config.scale_factor);
                let query_string = vector.rewrite_query(&case.query);
                self.summary
                    .push_str(&format!("\nquery ({}): {}\n", table_format, case.name));

                let mut primary_result = None;
                if !self.config.skip_primary {
                    debug!("running:\n{}", query_string);
                    primary_result = self.run_query(
                        self.config.primary,
                        &db_name,
                        &query_string,
                        self.config.prime_cache,
                        abort_on_error,
                        &table_format,
                        &case.name,
                    )?;

                    if let Some(result) = &primary_result {
                        // Mutating statements have no verifiable payload.
                        if self.config.verify_results && !verify::is_mutating(&case.query) {
                            if let Err(mismatch) = verify::verify_results(
                                &case.expected,
                                &result.data,
                                verify::contains_order_by(&case.query),
                            ) {
                                if abort_on_error {
                                    return Err(BenchError::Verification(mismatch));
                                }
                                error!("query '{}': {}", case.name, mismatch);
                            }
                        }
                        self.summary.push_str(&format!(
                            "  {} results: {}\n",
                            self.config.primary, result
                        ));
                    }
                }

                let mut comparison_result = None;
                if self.config.compare || self.config.skip_primary {
                    // The comparison engine always runs the original query
                    // text, best-effort.
                    comparison_result = self.run_query(
                        ExecutorKind::Shell,
                        &db_name,
                        case.query.trim(),
                        self.config.prime_cache,
                        false,
                        &table_format,
                        &case.name,
                    )?;
                    if let Some(result) = &comparison_result {
                        self.summary
                            .push_str(&format!("  shell results: {}\n", result));
                    }
                }

                let primary_detail = self.detail(self.config.primary.label(), vector, primary_result);
                let comparison_detail =
                    self.detail(ExecutorKind::Shell.label(), vector, comparison_result);
                self.record(case, primary_detail, comparison_detail);
            }
        }
        Ok(())
    }

    /// Fan one query out to the configured number of concurrent client
    /// sessions and reduce the survivors to a single median result.
    /// `Ok(None)` means every client failed (and the abort policy was off).
    #[allow(clippy::too_many_arguments)]
    pub fn run_query(
        &self,
        kind: ExecutorKind,
        db_name: &str,
        query: &str,
        prime_cache: bool,
        abort_on_error: bool,
        table_format: &str,
        query_name: &str,
    ) -> BenchResult<Option<ExecutionResult>> {
        if prime_cache {
            self.prime_cache(query);
        }

        // Each client gets its own bound unit; networked strategies land on
        // rotated endpoints.
        let units: Vec<(Box<dyn QueryExecutor>, ExecutorConfig)> = (0..self.config.clients.max(1))
            .map(|_| self.factory.create(kind, db_name, table_format, query_name))
            .collect();

        let results = Self::execute_concurrently(units, query, abort_on_error)?;
        if results.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self::median_result(results, self.config.iterations)))
    }

    /// Launch every bound unit on its own thread and join them all.
    /// Returns the surviving results, or the first client error when
    /// `abort_on_error` is set. Threads are always joined to completion
    /// before an error surfaces; partial failure never means partial join.
    fn execute_concurrently(
        units: Vec<(Box<dyn QueryExecutor>, ExecutorConfig)>,
        query: &str,
        abort_on_error: bool,
    ) -> BenchResult<Vec<ExecutionResult>> {
        let mut handles = Vec::with_capacity(units.len());
        let mut spawn_error: Option<std::io::Error> = None;
        for (client, (runner, config)) in units.into_iter().enumerate() {
            let query = query.to_string();
            let spawned = thread::Builder::new()
                .name(format!("client-{}", client))
                .spawn(move || {
                    debug!(client, endpoint = ?config.endpoint, "client starting");
                    let outcome = runner.execute(&query);
                    debug!(client, ok = outcome.is_ok(), "client finished");
                    outcome
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Clients already launched must still run to completion
                    // and be joined; stop launching and surface the spawn
                    // failure only after the join below.
                    error!("failed to spawn client {}: {}", client, e);
                    spawn_error = Some(e);
                    break;
                }
            }
        }

        let (results, first_error) = Self::join_clients(handles);

        if let Some(e) = spawn_error {
            return Err(BenchError::Io(e));
        }
        if abort_on_error {
            if let Some(err) = first_error {
                return Err(BenchError::Execution(err));
            }
        }
        Ok(results)
    }

    /// Join every launched client unconditionally, collecting the surviving
    /// results and the first per-client error.
    fn join_clients(
        handles: Vec<thread::JoinHandle<Result<ExecutionResult, String>>>,
    ) -> (Vec<ExecutionResult>, Option<String>) {
        let mut results = Vec::new();
        let mut first_error: Option<String> = None;
        for (client, handle) in handles.into_iter().enumerate() {
            match handle.join() {
                Ok(Ok(result)) => results.push(result),
                Ok(Err(err)) => {
                    error!("client {} returned an error: {}", client, err);
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
                Err(_) => {
                    error!("client {} panicked", client);
                    if first_error.is_none() {
                        first_error = Some(format!("client {} panicked", client));
                    }
                }
            }
        }
        (results, first_error)
    }

    /// Median reduction across client results. A single result passes
    /// through untouched; the base record's payload is never aggregated.
    fn median_result(mut results: Vec<ExecutionResult>, iterations: usize) -> ExecutionResult {
        if results.len() == 1 {
            return results.remove(0);
        }
        let avg_times: Vec<f64> = results.iter().map(|r| r.avg_time).collect();
        let std_devs: Vec<f64> = results.iter().filter_map(|r| r.std_dev).collect();

        let mut base = results.remove(0);
        base.avg_time = stats::median(&avg_times);
        if iterations > 1 && !std_devs.is_empty() {
            base.std_dev = Some(stats::median(&std_devs));
        }
        base
    }

    /// Best-effort buffer-cache priming before a measured run. Remote
    /// clusters are skipped (there is no local buffer cache to warm);
    /// failures are logged and never escalate. Returns whether priming was
    /// attempted.
    fn prime_cache(&self, query: &str) -> bool {
        if self.config.remote {
            debug!("skipping cache priming for remote cluster");
            return false;
        }
        let mut parts = self.config.prime_cache_cmd.split_whitespace();
        let Some(program) = parts.next() else {
            warn!("cache priming requested but no command configured");
            return false;
        };
        debug!("priming cache with '{}'", program);
        match Command::new(program).args(parts).arg(query).status() {
            Ok(status) if status.success() => {}
            Ok(status) => warn!("cache priming exited with {}", status),
            Err(e) => warn!("cache priming failed: {}", e),
        }
        true
    }

    fn detail(
        &self,
        executor: &str,
        vector: &TableFormat,
        result: Option<ExecutionResult>,
    ) -> ExecutionDetail {
        ExecutionDetail {
            executor: executor.to_string(),
            workload: self.config.workload.clone(),
            scale_factor: self.config.scale_factor.clone(),
            file_format: vector.file_format.clone(),
            compression_codec: vector.compression_codec.clone(),
            compression_type: vector.compression_type.clone(),
            result,
        }
    }

    fn record(
        &mut self,
        case: &QueryCase,
        primary: ExecutionDetail,
        comparison: ExecutionDetail,
    ) {
        self.ledger
            .entry((case.name.clone(), case.query.clone()))
            .or_default()
            .push((primary, comparison));
    }
}
