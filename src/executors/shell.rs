//! Shell executor: drives the comparison engine through its command-line
//! client, one process per iteration.
//!
//! The configured command line (e.g. `refcli -e`) is split on whitespace
//! and the statement is appended as the final argument, prefixed with a
//! `use <db>;` so the process starts in the right database.

use crate::executors::QueryExecutor;
use crate::{ExecutionResult, LatencyRecorder};
use std::process::Command;
use std::time::Instant;
use tracing::debug;

pub struct ShellExecutor {
    cmd: String,
    db_name: String,
    iterations: usize,
}

impl ShellExecutor {
    pub fn new(cmd: &str, db_name: &str, iterations: usize) -> Self {
        Self {
            cmd: cmd.to_string(),
            db_name: db_name.to_string(),
            iterations: iterations.max(1),
        }
    }

    fn run_once(&self, query: &str) -> Result<Vec<String>, String> {
        let mut parts = self.cmd.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| "comparison command is empty".to_string())?;

        let statement = format!(
            "use {}; {};",
            self.db_name,
            query.trim().trim_end_matches(';')
        );
        let output = Command::new(program)
            .args(parts)
            .arg(&statement)
            .output()
            .map_err(|e| format!("spawn '{}': {}", program, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            return Err(if stderr.is_empty() {
                format!("'{}' exited with {}", program, output.status)
            } else {
                stderr.to_string()
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }
}

impl QueryExecutor for ShellExecutor {
    fn execute(&self, query: &str) -> Result<ExecutionResult, String> {
        let mut rec = LatencyRecorder::new();
        let mut data = Vec::new();
        for iteration in 0..self.iterations {
            debug!(iteration, cmd = %self.cmd, "shell iteration");
            let start = Instant::now();
            data = self.run_once(query)?;
            rec.record(start);
        }
        Ok(ExecutionResult::from_recorder(&rec, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stdout_lines_become_rows() {
        // `echo` stands in for the engine CLI and prints the statement back.
        let exec = ShellExecutor::new("echo", "tpch", 1);
        let result = exec.execute("select 1").unwrap();
        assert_eq!(result.data, vec!["use tpch; select 1;".to_string()]);
    }

    #[test]
    fn failing_command_becomes_an_error() {
        let exec = ShellExecutor::new("false", "tpch", 1);
        assert!(exec.execute("select 1").is_err());
    }

    #[test]
    fn missing_program_becomes_an_error() {
        let exec = ShellExecutor::new("definitely-not-a-real-binary", "tpch", 1);
        let err = exec.execute("select 1").unwrap_err();
        assert!(err.contains("spawn"));
    }

    #[test]
    fn empty_command_is_rejected() {
        let exec = ShellExecutor::new("  ", "tpch", 1);
        assert!(exec.execute("select 1").is_err());
    }
}
