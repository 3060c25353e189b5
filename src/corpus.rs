//! Query corpus discovery.
//!
//! Walks a workload's `queries` directory for `.test` files and assembles
//! the mapping from test-file identity to its ordered query cases. File
//! syntax itself lives in [`crate::testfile`].

use crate::testfile;
use crate::{BenchError, BenchResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One named query with its expected output.
#[derive(Debug, Clone)]
pub struct QueryCase {
    pub name: String,
    pub query: String,
    pub expected: String,
}

/// Load every query case under `<workload_dir>/<workload>/queries`,
/// grouped by test-file identity. The workload directory and its queries
/// subdirectory must exist.
pub fn load_corpus(
    workload_dir: &Path,
    workload: &str,
) -> BenchResult<BTreeMap<String, Vec<QueryCase>>> {
    let base = workload_dir.join(workload);
    if !base.is_dir() {
        return Err(BenchError::Workload(format!(
            "workload '{}' not found at '{}'",
            workload,
            base.display()
        )));
    }
    let queries = base.join("queries");
    if !queries.is_dir() {
        return Err(BenchError::Workload(format!(
            "workload query directory not found at '{}'",
            queries.display()
        )));
    }

    let mut files = Vec::new();
    collect_test_files(&queries, &mut files)?;
    files.sort();

    let mut corpus: BTreeMap<String, Vec<QueryCase>> = BTreeMap::new();
    for file in files {
        debug!("parsing query test file {}", file.display());
        let sections = testfile::parse_test_file(&file)?;
        let cases = corpus.entry(file_identity(&queries, &file)).or_default();
        for section in sections {
            // A section without a name is identified by its query text.
            let name = section.name.unwrap_or_else(|| section.query.clone());
            cases.push(QueryCase {
                name,
                query: section.query,
                expected: section.results,
            });
        }
    }
    Ok(corpus)
}

fn collect_test_files(dir: &Path, out: &mut Vec<PathBuf>) -> BenchResult<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_test_files(&path, out)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("test") {
            out.push(path);
        }
    }
    Ok(())
}

/// Identity key for a test file: its path relative to the queries root
/// with separators folded to dots and the extension stripped.
fn file_identity(root: &Path, file: &Path) -> String {
    let rel = file.strip_prefix(root).unwrap_or(file);
    rel.with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_workload(tmp: &Path) {
        let queries = tmp.join("tpch").join("queries");
        fs::create_dir_all(queries.join("nested")).unwrap();
        fs::write(
            queries.join("basic.test"),
            "====\n---- QUERY_NAME\nQ1\n---- QUERY\nselect 1\n---- RESULTS\n1\n====\n\
             ---- QUERY\nselect 2\n====\n",
        )
        .unwrap();
        fs::write(
            queries.join("nested").join("deep.test"),
            "====\n---- QUERY_NAME\nQ9\n---- QUERY\nselect 9\n====\n",
        )
        .unwrap();
        // Non-.test files are not part of the corpus.
        fs::write(queries.join("notes.txt"), "ignore me").unwrap();
    }

    #[test]
    fn loads_and_groups_by_file_identity() {
        let tmp = tempfile::TempDir::new().unwrap();
        write_workload(tmp.path());

        let corpus = load_corpus(tmp.path(), "tpch").unwrap();
        assert_eq!(corpus.len(), 2);

        let basic = &corpus["basic"];
        assert_eq!(basic.len(), 2);
        assert_eq!(basic[0].name, "Q1");
        // Unnamed sections fall back to the query text.
        assert_eq!(basic[1].name, "select 2");

        let deep = &corpus["nested.deep"];
        assert_eq!(deep.len(), 1);
        assert_eq!(deep[0].query, "select 9");
    }

    #[test]
    fn missing_workload_dir_is_fatal() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            load_corpus(tmp.path(), "nope"),
            Err(BenchError::Workload(_))
        ));
    }

    #[test]
    fn missing_queries_dir_is_fatal() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("tpch")).unwrap();
        assert!(matches!(
            load_corpus(tmp.path(), "tpch"),
            Err(BenchError::Workload(_))
        ));
    }
}
