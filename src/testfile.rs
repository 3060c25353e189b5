//! Parser for `.test` query definition files.
//!
//! A file holds one or more sections separated by `====` lines. Each
//! section is made of labelled blocks:
//!
//! ```text
//! ====
//! ---- QUERY_NAME
//! TPCH-Q1
//! ---- QUERY
//! select count(*) from lineitem$TABLE
//! ---- RESULTS
//! 6001215
//! ====
//! ```
//!
//! `QUERY_NAME` and `RESULTS` are optional; a section without a `QUERY`
//! block is dropped. Unrecognized block labels are ignored so files can
//! carry extra annotations without breaking older runners.

use crate::BenchResult;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestSection {
    pub name: Option<String>,
    pub query: String,
    pub results: String,
}

/// Parse one test file into its ordered sections.
pub fn parse_test_file(path: &Path) -> BenchResult<Vec<TestSection>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(parse_sections(&contents))
}

pub fn parse_sections(contents: &str) -> Vec<TestSection> {
    fn flush_block(section: &mut TestSection, label: Option<&str>, lines: &[&str]) {
        let text = lines.join("\n").trim().to_string();
        match label {
            Some("QUERY_NAME") => {
                if !text.is_empty() {
                    section.name = Some(text);
                }
            }
            Some("QUERY") => section.query = text,
            Some("RESULTS") => section.results = text,
            _ => {}
        }
    }

    let mut sections = Vec::new();
    let mut current = TestSection::default();
    let mut label: Option<String> = None;
    let mut lines: Vec<&str> = Vec::new();

    for line in contents.lines() {
        let trimmed = line.trim_end();
        if trimmed.starts_with("====") {
            flush_block(&mut current, label.as_deref(), &lines);
            lines.clear();
            label = None;
            if !current.query.is_empty() {
                sections.push(std::mem::take(&mut current));
            } else {
                current = TestSection::default();
            }
        } else if let Some(block) = trimmed.strip_prefix("---- ") {
            flush_block(&mut current, label.as_deref(), &lines);
            lines.clear();
            label = Some(block.trim().to_string());
        } else if label.is_some() {
            lines.push(line);
        }
    }
    flush_block(&mut current, label.as_deref(), &lines);
    if !current.query.is_empty() {
        sections.push(current);
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_and_unnamed_sections() {
        let contents = "\
====
---- QUERY_NAME
Q1
---- QUERY
select 1
---- RESULTS
1
====
---- QUERY
select 2
====
";
        let sections = parse_sections(contents);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].name.as_deref(), Some("Q1"));
        assert_eq!(sections[0].query, "select 1");
        assert_eq!(sections[0].results, "1");
        assert_eq!(sections[1].name, None);
        assert_eq!(sections[1].query, "select 2");
        assert_eq!(sections[1].results, "");
    }

    #[test]
    fn multiline_query_and_results_survive() {
        let contents = "\
====
---- QUERY
select l_returnflag, count(*)
from lineitem$TABLE
group by l_returnflag
---- RESULTS
A\t100
N\t200
====
";
        let sections = parse_sections(contents);
        assert_eq!(sections.len(), 1);
        assert!(sections[0].query.contains('\n'));
        assert_eq!(sections[0].results.lines().count(), 2);
    }

    #[test]
    fn missing_trailing_separator_still_yields_a_section() {
        let sections = parse_sections("====\n---- QUERY\nselect 1");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].query, "select 1");
    }

    #[test]
    fn sections_without_a_query_are_dropped() {
        let sections = parse_sections("====\n---- QUERY_NAME\norphan\n====\n");
        assert!(sections.is_empty());
    }

    #[test]
    fn unknown_block_labels_are_ignored() {
        let sections =
            parse_sections("====\n---- QUERY\nselect 1\n---- SETUP\nreset\n====\n");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].query, "select 1");
    }
}
