use crate::data::{ResultSet, Value};
use crate::format::{check_structure, FormatError, Formatter};

/// Cap on rendered column width. Wider cells are cut with a trailing
/// ellipsis so one huge text field cannot blow out every line.
pub const MAX_CELL_WIDTH: usize = 50;

/// What a null cell shows. Always a visible token, never a blank that
/// would look like a missing column.
pub const NULL_SENTINEL: &str = "NULL";

/// Fixed-width text table: header, separator, one line per row.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format(&self, results: &ResultSet) -> Result<String, FormatError> {
        check_structure(results)?;

        let headers = results.schema.field_names();
        let cells: Vec<Vec<String>> = results
            .rows
            .iter()
            .map(|row| {
                (0..headers.len())
                    .map(|i| row.get(i).map(render_cell).unwrap_or_default())
                    .collect()
            })
            .collect();

        // Width = max over the header and every cell in the column,
        // capped.
        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in &cells {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
        for width in &mut widths {
            *width = (*width).min(MAX_CELL_WIDTH);
        }

        let mut lines = Vec::with_capacity(results.rows.len() + 2);
        lines.push(render_line(
            headers.iter().map(|h| h.to_string()).collect::<Vec<_>>().as_slice(),
            &widths,
        ));
        lines.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        for row in &cells {
            lines.push(render_line(row, &widths));
        }

        let mut output = lines.join("\n");
        output.push('\n');
        Ok(output)
    }
}

fn render_cell(value: &Value) -> String {
    if value.is_null() {
        NULL_SENTINEL.to_string()
    } else {
        value.canonical()
    }
}

fn render_line(cells: &[String], widths: &[usize]) -> String {
    let mut line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| fit(cell, *width))
        .collect::<Vec<_>>()
        .join(" | ");
    line.truncate(line.trim_end().len());
    line
}

/// Pad to `width`, or cut with a trailing ellipsis when over it.
fn fit(cell: &str, width: usize) -> String {
    let count = cell.chars().count();
    if count > width {
        let kept: String = cell.chars().take(width.saturating_sub(1)).collect();
        format!("{kept}…")
    } else {
        format!("{cell}{}", " ".repeat(width - count))
    }
}
