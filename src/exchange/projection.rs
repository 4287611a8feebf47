//! Column-indexed projection of a summary response into display lines.

use super::error::SummaryError;
use super::types::SummaryResponse;

pub const SEPARATOR: &str = "---";

/// Columns read from each entry, paired with the label they are shown under.
const PROJECTED_COLUMNS: [(&str, &str); 3] = [
    ("Date", "Summary date"),
    ("TotalExchangesCount", "Total exchanges count"),
    ("TotalSourceAmount", "Total exchanges source amount"),
];

/// Render `response` as text.
///
/// Output starts with a separator and every entry is followed by one. All
/// column positions are resolved before any entry is read, and any entry
/// with too few values fails the whole projection.
pub fn project(response: &SummaryResponse) -> Result<String, SummaryError> {
    if response.entries.is_empty() {
        return Err(SummaryError::FetchEmpty);
    }

    let mut indices = [0usize; PROJECTED_COLUMNS.len()];
    for (slot, (column, _)) in indices.iter_mut().zip(PROJECTED_COLUMNS) {
        *slot = response
            .column_names
            .iter()
            .position(|name| name == column)
            .ok_or_else(|| SummaryError::MissingColumn(column.to_string()))?;
    }
    let required_len = indices.iter().max().map_or(0, |max| max + 1);

    let mut lines = Vec::with_capacity(1 + response.entries.len() * (PROJECTED_COLUMNS.len() + 1));
    lines.push(SEPARATOR.to_string());

    for entry in &response.entries {
        let values = &entry.column_values;
        if values.len() < required_len {
            return Err(SummaryError::ShortEntry {
                entry: entry.entry_name.clone(),
                found: values.len(),
                expected: required_len,
            });
        }

        for (&index, (_, label)) in indices.iter().zip(PROJECTED_COLUMNS) {
            lines.push(format!("{label}: {}", values[index]));
        }
        lines.push(SEPARATOR.to_string());
    }

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::types::SummaryEntry;

    fn response(columns: &[&str], rows: &[&[&str]]) -> SummaryResponse {
        SummaryResponse {
            response_key: "key".to_string(),
            column_names: columns.iter().map(|c| c.to_string()).collect(),
            entries: rows
                .iter()
                .enumerate()
                .map(|(i, row)| SummaryEntry {
                    entry_name: format!("entry-{i}"),
                    column_values: row.iter().map(|v| v.to_string()).collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn single_entry() {
        let r = response(
            &["Date", "TotalExchangesCount", "TotalSourceAmount"],
            &[&["2024-01-01", "5", "1000.00"]],
        );
        assert_eq!(
            project(&r).unwrap(),
            "---\nSummary date: 2024-01-01\nTotal exchanges count: 5\nTotal exchanges source amount: 1000.00\n---"
        );
    }

    #[test]
    fn column_order_does_not_matter() {
        let r = response(
            &["TotalSourceAmount", "Extra", "Date", "TotalExchangesCount"],
            &[&["10.50", "x", "2024-02-01", "2"], &["99.00", "y", "2024-02-02", "7"]],
        );
        let text = project(&r).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "---",
                "Summary date: 2024-02-01",
                "Total exchanges count: 2",
                "Total exchanges source amount: 10.50",
                "---",
                "Summary date: 2024-02-02",
                "Total exchanges count: 7",
                "Total exchanges source amount: 99.00",
                "---",
            ]
        );
    }

    #[test]
    fn projection_is_repeatable() {
        let r = response(
            &["Date", "TotalExchangesCount", "TotalSourceAmount"],
            &[&["2024-01-01", "1", "1"], &["2024-01-02", "2", "2"]],
        );
        assert_eq!(project(&r).unwrap(), project(&r).unwrap());
    }

    #[test]
    fn no_entries_is_empty() {
        let r = response(&["Date", "TotalExchangesCount", "TotalSourceAmount"], &[]);
        assert!(matches!(project(&r), Err(SummaryError::FetchEmpty)));
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let r = response(&["Date", "TotalExchangesCount"], &[&["2024-01-01", "5"]]);
        assert!(matches!(
            project(&r),
            Err(SummaryError::MissingColumn(name)) if name == "TotalSourceAmount"
        ));
    }

    #[test]
    fn short_entry_fails_without_partial_output() {
        let r = response(
            &["Date", "TotalExchangesCount", "TotalSourceAmount"],
            &[&["2024-01-01", "5", "1000.00"], &["2024-01-02", "6"]],
        );
        match project(&r) {
            Err(SummaryError::ShortEntry { entry, found, expected }) => {
                assert_eq!(entry, "entry-1");
                assert_eq!(found, 2);
                assert_eq!(expected, 3);
            }
            other => panic!("unexpected projection result: {other:?}"),
        }
    }
}
