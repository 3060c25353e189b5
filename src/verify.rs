//! Expected-result verification for benchmark queries.

/// Compare expected output (the line-oriented `RESULTS` block of a test
/// file) against the rows a query actually produced. Row order only
/// matters when `ordered` is set. Returns a mismatch description instead
/// of panicking so callers can apply their abort policy.
pub fn verify_results(expected: &str, actual: &[String], ordered: bool) -> Result<(), String> {
    let mut expected_rows: Vec<&str> = expected
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let mut actual_rows: Vec<&str> = actual
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    if !ordered {
        expected_rows.sort_unstable();
        actual_rows.sort_unstable();
    }

    if expected_rows.len() != actual_rows.len() {
        return Err(format!(
            "expected {} rows, got {}",
            expected_rows.len(),
            actual_rows.len()
        ));
    }
    for (i, (exp, act)) in expected_rows.iter().zip(actual_rows.iter()).enumerate() {
        if exp != act {
            return Err(format!(
                "row {} mismatch: expected '{}', got '{}'",
                i, exp, act
            ));
        }
    }
    Ok(())
}

/// Queries with an ORDER BY produce rows whose order matters.
pub fn contains_order_by(query: &str) -> bool {
    query.to_lowercase().contains("order by")
}

/// Mutating statements have no verifiable row payload.
pub fn is_mutating(query: &str) -> bool {
    query.to_lowercase().contains("insert")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn matching_rows_pass() {
        assert!(verify_results("1\t2\n3\t4", &rows(&["1\t2", "3\t4"]), true).is_ok());
    }

    #[test]
    fn unordered_comparison_sorts_both_sides() {
        assert!(verify_results("b\na", &rows(&["a", "b"]), false).is_ok());
        assert!(verify_results("b\na", &rows(&["a", "b"]), true).is_err());
    }

    #[test]
    fn row_count_mismatch_is_reported() {
        let err = verify_results("1\n2", &rows(&["1"]), true).unwrap_err();
        assert!(err.contains("expected 2 rows"));
    }

    #[test]
    fn blank_lines_are_not_rows() {
        assert!(verify_results("1\n\n2\n", &rows(&["1", "2", ""]), true).is_ok());
    }

    #[test]
    fn order_by_detection() {
        assert!(contains_order_by("select * from t ORDER BY a"));
        assert!(!contains_order_by("select * from t"));
    }

    #[test]
    fn mutating_detection() {
        assert!(is_mutating("INSERT into t select * from s"));
        assert!(!is_mutating("select count(*) from t"));
    }
}
