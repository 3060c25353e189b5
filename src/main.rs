//! querybench — workload benchmark runner for SQL engine clusters.
//!
//! Usage:
//!   querybench --workload tpch --endpoints host1:21000,host2:21000
//!   querybench --workload tpch --table-formats text/none/none,parquet/snappy/block
//!   querybench --workload tpch --clients 4 --iterations 5 --compare
//!   querybench --workload tpch --verify --export results/

use clap::Parser;
use querybench::endpoints::EndpointPool;
use querybench::executors::{ExecutorFactory, ExecutorKind};
use querybench::runner::{RunnerConfig, WorkloadRunner};
use querybench::{report, BenchResult};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "querybench", about = "Concurrent workload benchmark runner for SQL engine clusters")]
#[command(version)]
struct Cli {
    /// Workload to run (directory name under the workload root).
    #[arg(long)]
    workload: String,

    /// Root directory holding workload definitions.
    #[arg(long, env = "QUERYBENCH_WORKLOAD_DIR")]
    workload_dir: PathBuf,

    /// Scale factor suffix used when deriving database names.
    #[arg(long, default_value = "")]
    scale_factor: String,

    /// Comma-separated engine endpoints (host:port) to spread clients across.
    #[arg(long, default_value = "localhost:21000")]
    endpoints: String,

    /// Explicit table formats `file_format/codec/type[,...]`; overrides the
    /// workload's declared test vectors.
    #[arg(long)]
    table_formats: Option<String>,

    /// Exploration strategy used when no explicit formats are given.
    #[arg(long, default_value = "core")]
    exploration_strategy: String,

    /// Case-insensitive comma-separated query-name allowlist.
    #[arg(long)]
    query_names: Option<String>,

    /// Executor for the system under test (native or http).
    #[arg(long, default_value = "native")]
    executor: String,

    /// Concurrent client sessions per query.
    #[arg(long, default_value = "1")]
    clients: usize,

    /// Iterations per client per query.
    #[arg(long, default_value = "2")]
    iterations: usize,

    /// Engine session options forwarded to each native client.
    #[arg(long, default_value = "")]
    exec_options: String,

    /// Also run each query on the comparison engine.
    #[arg(long)]
    compare: bool,

    /// Skip the system under test and only run the comparison engine.
    #[arg(long)]
    skip_primary: bool,

    /// Command line for the comparison engine's CLI client.
    #[arg(long, default_value = "refcli -e")]
    compare_cmd: String,

    /// Verify primary results against the expected output in the test files.
    #[arg(long)]
    verify: bool,

    /// Prime the buffer cache before each measured query.
    #[arg(long)]
    prime_cache: bool,

    /// Command used for cache priming (receives the query as its last argument).
    #[arg(long, default_value = "prime-cache")]
    prime_cache_cmd: String,

    /// Keep going when a query fails instead of aborting the run.
    #[arg(long)]
    continue_on_error: bool,

    /// Directory for CSV + JSON result export.
    #[arg(long)]
    export: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long)]
    debug: bool,
}

fn main() -> BenchResult<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let primary: ExecutorKind = cli.executor.parse()?;
    // Priming only makes sense when the first endpoint is on this machine.
    let remote = !cli
        .endpoints
        .split(',')
        .next()
        .unwrap_or("")
        .trim()
        .starts_with("localhost");
    let endpoints = Arc::new(EndpointPool::from_csv(&cli.endpoints)?);

    let factory = ExecutorFactory {
        endpoints,
        iterations: cli.iterations,
        shell_cmd: cli.compare_cmd.clone(),
        exec_options: cli.exec_options.clone(),
    };

    let config = RunnerConfig {
        workload: cli.workload.clone(),
        scale_factor: cli.scale_factor.clone(),
        primary,
        skip_primary: cli.skip_primary,
        compare: cli.compare,
        iterations: cli.iterations,
        clients: cli.clients,
        prime_cache: cli.prime_cache,
        prime_cache_cmd: cli.prime_cache_cmd.clone(),
        remote,
        verify_results: cli.verify,
        query_names: cli.query_names.clone(),
    };

    let mut runner = WorkloadRunner::new(config, factory);
    runner.run_workload(
        &cli.workload_dir,
        cli.table_formats.as_deref(),
        &cli.exploration_strategy,
        !cli.continue_on_error,
    )?;

    println!("{}", runner.summary());
    report::print_ledger(runner.ledger());

    if let Some(dir) = &cli.export {
        std::fs::create_dir_all(dir)?;
        report::export_csv(runner.ledger(), &dir.join("benchmark_results.csv"))?;
        report::export_json(runner.ledger(), &dir.join("benchmark_results.json"))?;
    }

    Ok(())
}
