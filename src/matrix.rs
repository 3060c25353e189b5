//! Test-vector matrix: file format × compression codec × compression type.

use crate::{BenchError, BenchResult};
use serde::Serialize;
use std::path::Path;

/// One matrix cell: a concrete table layout for a workload's dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableFormat {
    pub file_format: String,
    pub dataset: String,
    pub compression_codec: String,
    pub compression_type: String,
}

impl TableFormat {
    /// Parse a `file_format/codec/compression_type` triple, binding it to
    /// `dataset`.
    pub fn parse(dataset: &str, s: &str) -> BenchResult<Self> {
        let parts: Vec<&str> = s.trim().split('/').collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(BenchError::Config(format!(
                "invalid table format '{}', expected file_format/codec/compression_type",
                s
            )));
        }
        Ok(Self {
            file_format: parts[0].to_string(),
            dataset: dataset.to_string(),
            compression_codec: parts[1].to_string(),
            compression_type: parts[2].to_string(),
        })
    }

    /// Suffix appended to database and table names for this layout. The
    /// uncompressed text format is the base layout and carries no suffix.
    pub fn name_suffix(&self) -> String {
        if self.file_format == "text" && self.compression_codec == "none" {
            String::new()
        } else {
            format!("_{}_{}", self.file_format, self.compression_codec)
        }
    }

    /// Target database for this cell, e.g. `tpch100_parquet_snappy`.
    pub fn db_name(&self, scale_factor: &str) -> String {
        format!("{}{}{}", self.dataset, scale_factor, self.name_suffix())
    }

    /// Rewrite a query for this cell: `$TABLE` placeholders become the
    /// per-layout table suffix.
    pub fn rewrite_query(&self, query: &str) -> String {
        query.trim().replace("$TABLE", &self.name_suffix())
    }
}

impl std::fmt::Display for TableFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.file_format, self.compression_codec, self.compression_type
        )
    }
}

/// Expand explicit format strings into test vectors for `dataset`.
/// Repeats are kept as-is: running the same cell twice is a legitimate way
/// to ask for extra iterations at the matrix level.
pub fn expand_formats(dataset: &str, formats: &str) -> BenchResult<Vec<TableFormat>> {
    formats
        .split(',')
        .map(|f| TableFormat::parse(dataset, f))
        .collect()
}

/// Dataset backing a workload. A workload may declare it in a one-line
/// `dataset` file; otherwise the workload name doubles as the dataset name.
pub fn dataset_for_workload(workload_dir: &Path, workload: &str) -> String {
    let path = workload_dir.join(workload).join("dataset");
    match std::fs::read_to_string(&path) {
        Ok(contents) => {
            let name = contents.trim();
            if name.is_empty() {
                workload.to_string()
            } else {
                name.to_string()
            }
        }
        Err(_) => workload.to_string(),
    }
}

/// Load the test vectors declared for `workload` under an exploration
/// strategy. Reads `<workload>/<workload>_<strategy>.csv`, one
/// `file_format,dataset,codec,compression_type` row per line; `#` starts a
/// comment.
pub fn load_declared_vectors(
    workload_dir: &Path,
    workload: &str,
    strategy: &str,
) -> BenchResult<Vec<TableFormat>> {
    let path = workload_dir
        .join(workload)
        .join(format!("{}_{}.csv", workload, strategy));
    if !path.is_file() {
        return Err(BenchError::Workload(format!(
            "no test vectors declared for strategy '{}' at '{}'",
            strategy,
            path.display()
        )));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_path(&path)?;

    let mut vectors = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() != 4 {
            return Err(BenchError::Workload(format!(
                "bad test vector row in '{}': expected 4 fields, got {}",
                path.display(),
                record.len()
            )));
        }
        vectors.push(TableFormat {
            file_format: record[0].to_string(),
            dataset: record[1].to_string(),
            compression_codec: record[2].to_string(),
            compression_type: record[3].to_string(),
        });
    }
    Ok(vectors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn parse_valid_triple() {
        let tf = TableFormat::parse("tpch", "parquet/snappy/block").unwrap();
        assert_eq!(tf.file_format, "parquet");
        assert_eq!(tf.dataset, "tpch");
        assert_eq!(tf.compression_codec, "snappy");
        assert_eq!(tf.compression_type, "block");
    }

    #[test]
    fn parse_rejects_malformed_strings() {
        assert!(TableFormat::parse("tpch", "parquet/snappy").is_err());
        assert!(TableFormat::parse("tpch", "parquet//block").is_err());
        assert!(TableFormat::parse("tpch", "").is_err());
    }

    #[test]
    fn expand_preserves_order_and_literal_fields() {
        let vectors =
            expand_formats("tpch", "text/none/none,parquet/snappy/block").unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0].to_string(), "text/none/none");
        assert_eq!(vectors[1].to_string(), "parquet/snappy/block");
        assert_eq!(vectors[1].dataset, "tpch");
    }

    #[test]
    fn expand_keeps_repeats() {
        let vectors =
            expand_formats("tpch", "text/none/none,text/none/none").unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0], vectors[1]);
    }

    #[test]
    fn db_name_suffix_rules() {
        let text = TableFormat::parse("tpch", "text/none/none").unwrap();
        assert_eq!(text.db_name("100"), "tpch100");

        let parquet = TableFormat::parse("tpch", "parquet/snappy/block").unwrap();
        assert_eq!(parquet.db_name("100"), "tpch100_parquet_snappy");
        assert_eq!(parquet.db_name(""), "tpch_parquet_snappy");
    }

    #[test]
    fn rewrite_substitutes_table_suffix() {
        let parquet = TableFormat::parse("tpch", "parquet/snappy/block").unwrap();
        assert_eq!(
            parquet.rewrite_query("select count(*) from lineitem$TABLE\n"),
            "select count(*) from lineitem_parquet_snappy"
        );

        let text = TableFormat::parse("tpch", "text/none/none").unwrap();
        assert_eq!(
            text.rewrite_query("select count(*) from lineitem$TABLE"),
            "select count(*) from lineitem"
        );
    }

    #[test]
    fn declared_vectors_load_from_strategy_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let wl = tmp.path().join("tpch");
        fs::create_dir_all(&wl).unwrap();
        fs::write(
            wl.join("tpch_core.csv"),
            "# format,dataset,codec,type\ntext,tpch,none,none\nseq,tpch,gzip,block\n",
        )
        .unwrap();

        let vectors = load_declared_vectors(tmp.path(), "tpch", "core").unwrap();
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0].file_format, "text");
        assert_eq!(vectors[1].compression_codec, "gzip");

        assert!(load_declared_vectors(tmp.path(), "tpch", "exhaustive").is_err());
    }

    #[test]
    fn dataset_falls_back_to_workload_name() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("tpch")).unwrap();
        assert_eq!(dataset_for_workload(tmp.path(), "tpch"), "tpch");

        fs::write(tmp.path().join("tpch").join("dataset"), "tpch-sf\n").unwrap();
        assert_eq!(dataset_for_workload(tmp.path(), "tpch"), "tpch-sf");
    }
}
