use crate::error_fingerprint::ErrorFingerprint;
use crate::report_options::ReportOptions;

const SORT_CLAUSE: &str = "sort:updated-desc";
const OPEN_CLAUSE: &str = "is:open";

/// Build the issue search expression used to find a prior report.
///
/// Clause order is fixed: sort, open filter (omitted when reopening is
/// enabled so closed issues stay discoverable), label filters, fingerprint.
pub fn build_issue_search_query(fingerprint: &ErrorFingerprint, options: &ReportOptions) -> String {
    let mut clauses = vec![SORT_CLAUSE.to_string()];
    if !options.reopen {
        clauses.push(OPEN_CLAUSE.to_string());
    }
    clauses.extend(
        options
            .issue_labels()
            .iter()
            .filter_map(|label| render_label_clause(label)),
    );
    clauses.push(fingerprint.to_string());
    clauses
        .into_iter()
        .filter(|clause| !clause.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_label_clause(label: &str) -> Option<String> {
    let label = label.trim();
    if label.is_empty() {
        return None;
    }
    if label.chars().any(char::is_whitespace) {
        return Some(format!("label:\"{}\"", label.replace('"', "")));
    }
    Some(format!("label:{label}"))
}
