//! Execution strategies: how a bound query actually reaches an engine.
//!
//! The factory binds one executor per client session, so every session
//! gets its own connection and, for networked strategies, its own rotated
//! endpoint.

pub mod http;
pub mod native;
pub mod shell;

use crate::endpoints::EndpointPool;
use crate::{BenchError, ExecutionResult};
use std::str::FromStr;
use std::sync::Arc;

/// Closed set of backend strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorKind {
    /// The engine's native line protocol (the system under test).
    Native,
    /// The engine's REST endpoint, an alternate access path.
    Http,
    /// A comparison engine driven through its command-line client.
    Shell,
}

impl ExecutorKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Http => "http",
            Self::Shell => "shell",
        }
    }
}

impl std::fmt::Display for ExecutorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ExecutorKind {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "native" => Ok(Self::Native),
            "http" => Ok(Self::Http),
            "shell" => Ok(Self::Shell),
            other => Err(BenchError::Config(format!(
                "unknown executor kind '{}' (expected native, http or shell)",
                other
            ))),
        }
    }
}

/// One client session's bound execution unit. Runs its query to completion
/// or failure; the error side carries a human-readable description.
pub trait QueryExecutor: Send {
    fn execute(&self, query: &str) -> Result<ExecutionResult, String>;
}

/// Per-client configuration the factory hands back alongside the runner.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub kind: ExecutorKind,
    pub db_name: String,
    pub endpoint: Option<String>,
    pub iterations: usize,
    pub table_format: String,
    pub query_name: String,
}

/// Session parameters shared by every client of a run.
pub struct ExecutorFactory {
    pub endpoints: Arc<EndpointPool>,
    pub iterations: usize,
    /// Command line (program + leading args) for the comparison engine's CLI.
    pub shell_cmd: String,
    /// Engine session options forwarded verbatim to native clients.
    pub exec_options: String,
}

impl ExecutorFactory {
    /// Bind a ready-to-run unit for one client. Networked strategies take
    /// the next endpoint from the rotating pool.
    pub fn create(
        &self,
        kind: ExecutorKind,
        db_name: &str,
        table_format: &str,
        query_name: &str,
    ) -> (Box<dyn QueryExecutor>, ExecutorConfig) {
        let (runner, endpoint): (Box<dyn QueryExecutor>, Option<String>) = match kind {
            ExecutorKind::Native => {
                let endpoint = self.endpoints.next();
                (
                    Box::new(native::NativeExecutor::new(
                        &endpoint,
                        db_name,
                        self.iterations,
                        &self.exec_options,
                    )),
                    Some(endpoint),
                )
            }
            ExecutorKind::Http => {
                let endpoint = self.endpoints.next();
                (
                    Box::new(http::HttpExecutor::new(&endpoint, db_name, self.iterations)),
                    Some(endpoint),
                )
            }
            ExecutorKind::Shell => (
                Box::new(shell::ShellExecutor::new(
                    &self.shell_cmd,
                    db_name,
                    self.iterations,
                )),
                None,
            ),
        };

        let config = ExecutorConfig {
            kind,
            db_name: db_name.to_string(),
            endpoint,
            iterations: self.iterations,
            table_format: table_format.to_string(),
            query_name: query_name.to_string(),
        };
        (runner, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parsing_is_case_insensitive() {
        assert_eq!("native".parse::<ExecutorKind>().unwrap(), ExecutorKind::Native);
        assert_eq!("HTTP".parse::<ExecutorKind>().unwrap(), ExecutorKind::Http);
        assert_eq!(" shell ".parse::<ExecutorKind>().unwrap(), ExecutorKind::Shell);
    }

    #[test]
    fn unknown_kind_is_a_config_error() {
        assert!(matches!(
            "odbc".parse::<ExecutorKind>(),
            Err(BenchError::Config(_))
        ));
    }

    #[test]
    fn factory_rotates_endpoints_across_clients() {
        let factory = ExecutorFactory {
            endpoints: Arc::new(EndpointPool::from_csv("a:1,b:1").unwrap()),
            iterations: 1,
            shell_cmd: "true".into(),
            exec_options: String::new(),
        };
        let (_, first) = factory.create(ExecutorKind::Native, "db", "text/none/none", "q");
        let (_, second) = factory.create(ExecutorKind::Native, "db", "text/none/none", "q");
        assert_eq!(first.endpoint.as_deref(), Some("a:1"));
        assert_eq!(second.endpoint.as_deref(), Some("b:1"));

        let (_, shell) = factory.create(ExecutorKind::Shell, "db", "text/none/none", "q");
        assert!(shell.endpoint.is_none());
    }
}
