//! Table rendering for Examples blocks and data-table step arguments.
//!
//! Rendering is pure: the same rows always produce the same grid and markup.
//! Rows must form a rectangular grid; a ragged row is reported rather than
//! padded, because it points at broken source or test data.

use crate::error::TableError;
use crate::markup::escape_html;

/// A validated rectangular grid with its display markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTable {
    grid: Vec<Vec<String>>,
    markup: String,
}

impl RenderedTable {
    /// Rows of the grid, header first.
    #[must_use]
    pub fn grid(&self) -> &[Vec<String>] {
        &self.grid
    }

    /// HTML markup for the grid.
    #[must_use]
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Number of columns, or zero for an empty table.
    #[must_use]
    pub fn width(&self) -> usize {
        self.grid.first().map_or(0, Vec::len)
    }

    /// Consume the table, returning its markup.
    #[must_use]
    pub fn into_markup(self) -> String {
        self.markup
    }
}

/// Validate `rows` and render them as a `markup-table`.
///
/// # Errors
///
/// Returns [`TableError::UnevenRow`] when a row's cell count differs from
/// the first row's.
///
/// # Examples
///
/// ```
/// use gherkin_report::table::render;
///
/// let rows = [vec!["a", "b"], vec!["1", "2"]];
/// let table = render(rows.as_slice()).expect("rectangular");
/// assert_eq!(table.width(), 2);
/// assert!(table.markup().starts_with("<table"));
/// ```
pub fn render<R, C>(rows: &[R]) -> Result<RenderedTable, TableError>
where
    R: AsRef<[C]>,
    C: AsRef<str>,
{
    let expected = rows.first().map_or(0, |row| row.as_ref().len());
    let mut grid = Vec::with_capacity(rows.len());
    let mut markup = String::from("<table class=\"markup-table table\">");
    for (index, row) in rows.iter().enumerate() {
        let cells = row.as_ref();
        if cells.len() != expected {
            return Err(TableError::UnevenRow {
                row_number: index + 1,
                expected,
                actual: cells.len(),
            });
        }
        markup.push_str("<tr>");
        let mut owned = Vec::with_capacity(cells.len());
        for cell in cells {
            let value = cell.as_ref();
            markup.push_str("<td>");
            markup.push_str(&escape_html(value));
            markup.push_str("</td>");
            owned.push(value.to_owned());
        }
        markup.push_str("</tr>");
        grid.push(owned);
    }
    markup.push_str("</table>");
    Ok(RenderedTable { grid, markup })
}
