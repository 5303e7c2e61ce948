//! Column sorting for snapshot views.
//!
//! Sorting is plain lexical string comparison on one column, stable, and
//! direction only flips the comparison: ties keep their input order in both
//! directions. An unknown column name leaves the rows untouched.

use serde::Serialize;

/// Header cell as presented to a viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub is_sort_column: bool,
    /// Whether following this column's sort link should ask for `reverse`.
    pub reverse_link: bool,
}

pub fn column_index(header: &[String], name: &str) -> Option<usize> {
    header.iter().position(|column| column == name)
}

/// Reorder `rows` by the cell under `column`. Returns the rows unchanged when
/// the header has no such column.
pub fn sort_rows(
    header: &[String],
    mut rows: Vec<Vec<String>>,
    column: &str,
    descending: bool,
) -> Vec<Vec<String>> {
    let Some(index) = column_index(header, column) else {
        return rows;
    };

    // slice::sort_by is stable
    rows.sort_by(|a, b| {
        let ordering = cell(a, index).cmp(cell(b, index));
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });

    rows
}

/// Describe each header cell relative to the requested sort. With repeated
/// names only the first match is the sort column, as in [`sort_rows`].
pub fn describe_columns(header: &[String], sort: Option<&str>, descending: bool) -> Vec<Column> {
    let sorted = sort.and_then(|name| column_index(header, name));
    header
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let is_sort_column = sorted == Some(index);
            Column {
                name: name.clone(),
                is_sort_column,
                reverse_link: is_sort_column && !descending,
            }
        })
        .collect()
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}
