//! Search/replace application with a whitespace-tolerant fallback.

use atelier_core::Change;

/// Minimum fraction of window lines that must match for a fuzzy splice.
pub const FUZZY_MATCH_THRESHOLD: f64 = 0.8;

/// Result of applying a sequence of changes to one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    /// Buffer content after all matching changes were applied.
    pub content: String,
    /// Changes that applied cleanly.
    pub applied: usize,
    /// Changes that found no match, in the caller's input order.
    pub failed: Vec<Change>,
}

/// Applies one search/replace change to `original`.
///
/// Returns the new content and whether the change matched. Rules, in order:
/// an empty original becomes `replace` verbatim; an empty search prepends
/// `replace`; otherwise line endings are normalized and the first verbatim
/// occurrence of `search` is replaced; failing that, a whitespace-tolerant
/// line window is tried. A change that matches nothing leaves the content
/// as it was.
#[must_use]
pub fn apply_one(original: &str, search: &str, replace: &str) -> (String, bool) {
    if original.is_empty() {
        return (replace.to_owned(), true);
    }

    if search.is_empty() {
        return (format!("{replace}{original}"), true);
    }

    // Normalize line endings before any comparison
    let original = original.replace("\r\n", "\n");
    let search = search.replace("\r\n", "\n");
    let replace = replace.replace("\r\n", "\n");

    // Exact match first, earliest occurrence only
    if original.contains(&search) {
        return (original.replacen(&search, &replace, 1), true);
    }

    fuzzy_apply(&original, &search, &replace)
}

/// Whitespace-tolerant fallback: slides a window of the search's non-blank
/// lines over the original, comparing trimmed lines, and splices the
/// replacement over the best window when enough lines agree.
fn fuzzy_apply(original: &str, search: &str, replace: &str) -> (String, bool) {
    let original_lines: Vec<&str> = original.split('\n').collect();
    let search_lines: Vec<&str> = search
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if search_lines.is_empty() || search_lines.len() > original_lines.len() {
        return (original.to_owned(), false);
    }

    let mut best_score = 0.0_f64;
    let mut best_start = None;

    for (start, window) in original_lines.windows(search_lines.len()).enumerate() {
        let matching = window
            .iter()
            .zip(&search_lines)
            .filter(|(window_line, search_line)| window_line.trim() == **search_line)
            .count();
        let score = matching as f64 / search_lines.len() as f64;

        // Strictly greater, so the earliest best window wins ties
        if score > best_score {
            best_score = score;
            best_start = Some(start);
        }
    }

    if best_score >= FUZZY_MATCH_THRESHOLD
        && let Some(start) = best_start
    {
        let mut result_lines: Vec<&str> = Vec::with_capacity(original_lines.len());
        result_lines.extend_from_slice(&original_lines[..start]);
        result_lines.extend(replace.split('\n'));
        result_lines.extend_from_slice(&original_lines[start + search_lines.len()..]);
        return (result_lines.join("\n"), true);
    }

    (original.to_owned(), false)
}

/// Applies `changes` in order, threading each successful result into the
/// next change's input. Unmatched changes are collected in input order and
/// do not alter the content.
#[must_use]
pub fn apply_all(original: &str, changes: &[Change]) -> PatchOutcome {
    let mut content = original.to_owned();
    let mut failed = Vec::new();

    for change in changes {
        let (next, matched) = apply_one(&content, &change.search, &change.replace);
        if matched {
            content = next;
        } else {
            failed.push(change.clone());
        }
    }

    PatchOutcome {
        content,
        applied: changes.len() - failed.len(),
        failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_replaces_first_occurrence_only() {
        let original = "const a = 1;\nconst b = 1;\nconst a = 1;";
        let (result, matched) = apply_one(original, "const a = 1;", "const a = 2;");
        assert!(matched);
        assert_eq!(result, "const a = 2;\nconst b = 1;\nconst a = 1;");
    }

    #[test]
    fn test_empty_original_returns_replace() {
        let (result, matched) = apply_one("", "anything", "new file body");
        assert!(matched);
        assert_eq!(result, "new file body");
    }

    #[test]
    fn test_empty_search_prepends() {
        let (result, matched) = apply_one("existing", "", "import React;\n");
        assert!(matched);
        assert_eq!(result, "import React;\nexisting");
    }

    #[test]
    fn test_crlf_normalized_before_match() {
        let original = "line one\r\nline two\r\nline three";
        let (result, matched) = apply_one(original, "line two\n", "middle\n");
        assert!(matched);
        assert_eq!(result, "line one\nmiddle\nline three");
    }

    #[test]
    fn test_fuzzy_matches_whitespace_drift() {
        // Search differs from the file only by indentation on each line
        let original = "function App() {\n    return null;\n}";
        let search = "function App() {\nreturn null;\n}";
        let (result, matched) = apply_one(original, search, "const App = () => null;");
        assert!(matched);
        assert_eq!(result, "const App = () => null;");
    }

    #[test]
    fn test_fuzzy_splice_keeps_surrounding_lines() {
        let original = "import React from 'react';\n\nfunction App() {\n  return <div>Hi</div>;\n}\n\nexport default App;";
        let search = "function App() {\n    return <div>Hi</div>;\n  }";
        let replace = "function App() {\n  return <div>Hello</div>;\n}";
        let (result, matched) = apply_one(original, search, replace);
        assert!(matched);
        assert!(result.starts_with("import React from 'react';\n\n"));
        assert!(result.ends_with("\n\nexport default App;"));
        assert!(result.contains("return <div>Hello</div>;"));
    }

    #[test]
    fn test_fuzzy_threshold_rejects_weak_match() {
        let original = "alpha\nbeta\ngamma\ndelta\nepsilon";
        // Only 2 of 5 lines agree: score 0.4, below threshold
        let search = "alpha\nbeta\nzeta\neta\ntheta";
        let (result, matched) = apply_one(original, search, "replacement");
        assert!(!matched);
        assert_eq!(result, original);
    }

    #[test]
    fn test_fuzzy_threshold_accepts_four_of_five() {
        let original = "alpha\nbeta\ngamma\ndelta\nepsilon";
        let search = "alpha\nbeta\ngamma\ndelta\ntheta";
        let (result, matched) = apply_one(original, search, "spliced");
        assert!(matched);
        assert_eq!(result, "spliced");
    }

    #[test]
    fn test_earliest_best_window_wins_ties() {
        let original = "start();\nwork();\nend();\nstart();\nwork();\nend();";
        // Indentation drift forces the fuzzy path; both halves score 1.0
        let search = " start();\n work();";
        let (result, matched) = apply_one(original, search, "begin();");
        assert!(matched);
        assert_eq!(result, "begin();\nend();\nstart();\nwork();\nend();");
    }

    #[test]
    fn test_whitespace_only_search_never_matches_fuzzily() {
        let original = "some\ncontent";
        let (result, matched) = apply_one(original, "   \n  ", "nope");
        assert!(!matched);
        assert_eq!(result, original);
    }

    #[test]
    fn test_hello_scenario() {
        let original = "function App() {\n  return <div>Hi</div>;\n}";
        let (result, matched) = apply_one(
            original,
            "return <div>Hi</div>;",
            "return <div>Hello</div>;",
        );
        assert!(matched);
        assert!(result.contains("return <div>Hello</div>;"));
    }

    #[test]
    fn test_apply_all_threads_sequentially() {
        let original = "let value = 1;\nlet other = 2;";
        let changes = vec![
            Change::new("let value = 1;", "let value = 10;"),
            // This search only existed in the pristine original; after the
            // first change it must no longer match anything
            Change::new("let value = 1;", "let value = 100;"),
        ];
        let outcome = apply_all(original, &changes);
        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.failed, vec![changes[1].clone()]);
        assert_eq!(outcome.content, "let value = 10;\nlet other = 2;");
    }

    #[test]
    fn test_apply_all_collects_failures_in_order() {
        let original = "one\ntwo\nthree";
        let changes = vec![
            Change::new("missing first", "x"),
            Change::new("two", "TWO"),
            Change::new("missing second", "y"),
        ];
        let outcome = apply_all(original, &changes);
        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.content, "one\nTWO\nthree");
        assert_eq!(
            outcome.failed,
            vec![changes[0].clone(), changes[2].clone()]
        );
    }

    #[test]
    fn test_apply_all_empty_changes() {
        let outcome = apply_all("unchanged", &[]);
        assert_eq!(outcome.applied, 0);
        assert!(outcome.failed.is_empty());
        assert_eq!(outcome.content, "unchanged");
    }

    #[test]
    fn test_changes_parsed_from_model_json_apply() {
        let changes: Vec<Change> = serde_json::from_str(
            r#"[
                {"search": "color: red", "replace": "color: blue"},
                {"search": "", "replace": "/* prepended */\n"}
            ]"#,
        )
        .expect("changes should parse");
        let outcome = apply_all(".box { color: red; }", &changes);
        assert_eq!(outcome.applied, 2);
        assert_eq!(outcome.content, "/* prepended */\n.box { color: blue; }");
    }
}
