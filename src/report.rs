//! Ledger reporting: terminal comparison table, CSV and JSON export.

use crate::runner::ResultLedger;
use crate::ExecutionDetail;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use serde::Serialize;
use std::path::Path;

/// Ledger entries sorted by query name for deterministic output.
fn sorted_entries(
    ledger: &ResultLedger,
) -> Vec<(&(String, String), &Vec<(ExecutionDetail, ExecutionDetail)>)> {
    let mut entries: Vec<_> = ledger.iter().collect();
    entries.sort_by(|a, b| a.0 .0.cmp(&b.0 .0));
    entries
}

fn format_cell(detail: &ExecutionDetail) -> Vec<Cell> {
    let format = format!(
        "{}/{}/{}",
        detail.file_format, detail.compression_codec, detail.compression_type
    );
    match &detail.result {
        Some(result) => vec![
            Cell::new(&detail.executor),
            Cell::new(format),
            Cell::new(format!("{:.3}", result.avg_time)),
            Cell::new(
                result
                    .std_dev
                    .map(|sd| format!("{:.3}", sd))
                    .unwrap_or_else(|| "-".into()),
            ),
            Cell::new(format!("{:.1}", result.p95_ms)),
        ],
        None => vec![
            Cell::new(&detail.executor).fg(Color::Red),
            Cell::new(format),
            Cell::new("-"),
            Cell::new("-"),
            Cell::new("-"),
        ],
    }
}

/// Print a per-query comparison table across all matrix cells.
pub fn print_ledger(ledger: &ResultLedger) {
    if ledger.is_empty() {
        return;
    }

    println!("\n{}", "── Workload Results ──".bold().blue());

    for ((query_name, _query), pairs) in sorted_entries(ledger) {
        println!("\n{}", format!("━━━ {} ━━━", query_name).bold().cyan());

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS);
        table.set_header(vec![
            "Executor",
            "Format",
            "Avg (s)",
            "StdDev (s)",
            "p95 (ms)",
        ]);

        for (primary, comparison) in pairs {
            table.add_row(format_cell(primary));
            if comparison.result.is_some() {
                table.add_row(format_cell(comparison));
            }
        }
        println!("{table}");
    }
}

// ────────────────────────────────────────────────────────────────────────────────
// CSV export
// ────────────────────────────────────────────────────────────────────────────────

pub fn export_csv(ledger: &ResultLedger, path: &Path) -> crate::BenchResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "query_name",
        "executor",
        "workload",
        "scale_factor",
        "file_format",
        "compression_codec",
        "compression_type",
        "avg_time_s",
        "std_dev_s",
        "p95_ms",
    ])?;

    for ((query_name, _query), pairs) in sorted_entries(ledger) {
        for (primary, comparison) in pairs {
            for detail in [primary, comparison] {
                let (avg, sd, p95) = match &detail.result {
                    Some(r) => (
                        format!("{:.6}", r.avg_time),
                        r.std_dev.map(|sd| format!("{:.6}", sd)).unwrap_or_default(),
                        format!("{:.3}", r.p95_ms),
                    ),
                    None => (String::new(), String::new(), String::new()),
                };
                writer.write_record([
                    query_name,
                    &detail.executor,
                    &detail.workload,
                    &detail.scale_factor,
                    &detail.file_format,
                    &detail.compression_codec,
                    &detail.compression_type,
                    &avg,
                    &sd,
                    &p95,
                ])?;
            }
        }
    }
    writer.flush()?;
    println!("  CSV exported to {}", path.display());
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────────
// JSON export
// ────────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct LedgerEntry<'a> {
    query_name: &'a str,
    query: &'a str,
    runs: &'a [(ExecutionDetail, ExecutionDetail)],
}

pub fn export_json(ledger: &ResultLedger, path: &Path) -> crate::BenchResult<()> {
    let entries: Vec<LedgerEntry<'_>> = sorted_entries(ledger)
        .into_iter()
        .map(|((name, query), pairs)| LedgerEntry {
            query_name: name,
            query,
            runs: pairs,
        })
        .collect();
    let json = serde_json::to_string_pretty(&entries)?;
    std::fs::write(path, json)?;
    println!("  JSON exported to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExecutionResult;

    fn detail(executor: &str, with_result: bool) -> ExecutionDetail {
        ExecutionDetail {
            executor: executor.into(),
            workload: "tpch".into(),
            scale_factor: "100".into(),
            file_format: "parquet".into(),
            compression_codec: "snappy".into(),
            compression_type: "block".into(),
            result: with_result.then(|| ExecutionResult {
                avg_time: 1.25,
                std_dev: Some(0.05),
                p95_ms: 1_300.0,
                data: vec!["42".into()],
            }),
        }
    }

    fn sample_ledger() -> ResultLedger {
        let mut ledger = ResultLedger::new();
        ledger
            .entry(("Q1".into(), "select 1".into()))
            .or_default()
            .push((detail("native", true), detail("shell", false)));
        ledger
    }

    #[test]
    fn csv_export_writes_a_row_per_detail() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("results.csv");
        export_csv(&sample_ledger(), &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        // Header plus primary and comparison rows.
        assert_eq!(contents.lines().count(), 3);
        assert!(contents.contains("Q1,native,tpch,100,parquet,snappy,block,1.250000"));
        assert!(contents.contains("Q1,shell,tpch,100,parquet,snappy,block,,,"));
    }

    #[test]
    fn json_export_round_trips() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("results.json");
        export_json(&sample_ledger(), &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed[0]["query_name"], "Q1");
        assert_eq!(parsed[0]["runs"][0][0]["executor"], "native");
    }
}
