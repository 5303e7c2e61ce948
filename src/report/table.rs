//! Terminal table rendering for a single snapshot.
//!
//! - Column widths fit the widest cell, capped at MAX_CELL_WIDTH
//! - The active sort column is marked ^ (ascending) or v (descending)
//! - Embedded newlines are flattened so every row stays on one line

use crate::pages::SnapshotPage;

const MAX_CELL_WIDTH: usize = 30;

pub fn render(page: &SnapshotPage) -> String {
    let mut output = format!("{} / {} at {}\n", page.hostname, page.title, page.timestamp);

    if page.columns.is_empty() {
        output.push_str("(empty snapshot)\n");
        return output;
    }

    let headers: Vec<String> = page
        .columns
        .iter()
        .map(|column| {
            if !column.is_sort_column {
                column.name.clone()
            } else if page.reverse {
                format!("{} v", column.name)
            } else {
                format!("{} ^", column.name)
            }
        })
        .collect();

    let rows: Vec<Vec<String>> = page
        .rows
        .iter()
        .map(|row| row.iter().map(|cell| flatten(cell)).collect())
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            rows.iter()
                .filter_map(|row| row.get(index))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
                .min(MAX_CELL_WIDTH)
        })
        .collect();

    output.push('\n');
    push_row(&mut output, &headers, &widths);
    output.push_str(&"-".repeat(widths.iter().sum::<usize>() + 2 * widths.len()));
    output.push('\n');
    for row in &rows {
        push_row(&mut output, row, &widths);
    }

    output.push_str(&format!("\n{} rows\n", rows.len()));
    output
}

fn push_row(output: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(index, width)| {
            let cell = cells.get(index).map(String::as_str).unwrap_or("");
            format!("{:width$}", truncate(cell, *width), width = *width)
        })
        .collect();
    output.push_str(line.join("  ").trim_end());
    output.push('\n');
}

fn flatten(cell: &str) -> String {
    cell.replace(['\r', '\n'], " ")
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::Column;

    fn page(columns: Vec<Column>, rows: Vec<Vec<&str>>, reverse: bool) -> SnapshotPage {
        SnapshotPage {
            id: 1,
            date: "2013-10-06".into(),
            time: "00:00:00".into(),
            timestamp: "2013-10-06 00:00:00 +00:00".into(),
            hostname: "host1".into(),
            title: "processes".into(),
            sort: None,
            reverse,
            columns,
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(String::from).collect())
                .collect(),
        }
    }

    fn column(name: &str, is_sort_column: bool) -> Column {
        Column {
            name: name.into(),
            is_sort_column,
            reverse_link: false,
        }
    }

    #[test]
    fn renders_aligned_columns() {
        let out = render(&page(
            vec![column("pid", false), column("name", false)],
            vec![vec!["1", "init"], vec!["1234", "kthreadd"]],
            false,
        ));
        assert!(out.contains("pid   name"));
        assert!(out.contains("1     init"));
        assert!(out.contains("1234  kthreadd"));
        assert!(out.contains("2 rows"));
    }

    #[test]
    fn marks_sort_direction() {
        let asc = render(&page(vec![column("pid", true)], vec![vec!["1"]], false));
        assert!(asc.contains("pid ^"));
        let desc = render(&page(vec![column("pid", true)], vec![vec!["1"]], true));
        assert!(desc.contains("pid v"));
    }

    #[test]
    fn empty_snapshot_says_so() {
        let out = render(&page(vec![], vec![], false));
        assert!(out.contains("(empty snapshot)"));
    }

    #[test]
    fn long_and_multiline_cells_are_tamed() {
        let long = "x".repeat(50);
        let out = render(&page(
            vec![column("cmd", false)],
            vec![vec![long.as_str()], vec!["two\nlines"]],
            false,
        ));
        assert!(out.contains(&format!("{}...", "x".repeat(27))));
        assert!(out.contains("two lines"));
    }
}
