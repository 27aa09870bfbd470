//! Fixed-width table layout
//!
//! Tables have no rich text counterpart on the messaging platform, so they
//! are laid out as a monospaced grid and sent inside a code block. Inline
//! formatting in cells is discarded.

use unicode_width::UnicodeWidthStr;

use super::parser::{Node, NodeKind};

/// Lay out a `Table` node as a grid:
///
/// ```text
/// | Column 1 | Column 2 |
/// |----------|----------|
/// | 5        | 0.99     |
/// ```
///
/// Column widths are display columns, measured over every row. Rows with
/// fewer cells than the widest row are padded with empty cells. The result
/// has no trailing newline.
pub fn render_table(table: &Node) -> String {
    let rows: Vec<(bool, Vec<String>)> = table
        .children
        .iter()
        .filter_map(|row| match row.kind {
            NodeKind::TableRow { header } => Some((
                header,
                row.children
                    .iter()
                    .filter(|cell| cell.kind == NodeKind::TableCell)
                    .map(|cell| cell.plain_text().trim().to_string())
                    .collect(),
            )),
            _ => None,
        })
        .collect();

    let columns = rows.iter().map(|(_, cells)| cells.len()).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for (_, cells) in &rows {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.width());
        }
    }

    let header_rows = rows.iter().take_while(|(header, _)| *header).count();

    let mut lines = Vec::with_capacity(rows.len() + 1);
    for (index, (_, cells)) in rows.iter().enumerate() {
        lines.push(format_row(cells, &widths));
        if index + 1 == header_rows {
            lines.push(format_separator(&widths));
        }
    }

    lines.join("\n")
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(column, &width)| {
            let cell = cells.get(column).map(String::as_str).unwrap_or("");
            let padding = width.saturating_sub(cell.width());
            format!("{}{}", cell, " ".repeat(padding))
        })
        .collect();
    format!("| {} |", padded.join(" | "))
}

fn format_separator(widths: &[usize]) -> String {
    let dashes: Vec<String> = widths.iter().map(|&width| "-".repeat(width + 2)).collect();
    format!("|{}|", dashes.join("|"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::parser::parse_markdown;

    fn first_table(markdown: &str) -> Node {
        let doc = parse_markdown(markdown).unwrap();
        doc.children
            .into_iter()
            .find(|node| node.kind == NodeKind::Table)
            .expect("Expected a table node")
    }

    #[test]
    fn test_render_table_normalizes_separator() {
        let table = first_table("| Column 1 | Column 2 |\n|--|--|\n| 5 | 0.99 |");
        assert_eq!(
            render_table(&table),
            "| Column 1 | Column 2 |\n|----------|----------|\n| 5        | 0.99     |"
        );
    }

    #[test]
    fn test_render_table_widest_cell_sets_width() {
        let table = first_table("| a | b |\n|---|---|\n| longer | x |");
        assert_eq!(
            render_table(&table),
            "| a      | b |\n|--------|---|\n| longer | x |"
        );
    }

    #[test]
    fn test_render_table_discards_inline_formatting() {
        let table = first_table("| **bold** | `code` |\n|---|---|\n| [link](https://x.y) | ~~old~~ |");
        assert_eq!(
            render_table(&table),
            "| bold | code |\n|------|------|\n| link | old  |"
        );
    }

    #[test]
    fn test_render_table_pads_missing_cells() {
        let header = Node {
            kind: NodeKind::TableRow { header: true },
            children: vec![cell("a"), cell("b"), cell("c")],
        };
        let short = Node {
            kind: NodeKind::TableRow { header: false },
            children: vec![cell("1")],
        };
        let table = Node {
            kind: NodeKind::Table,
            children: vec![header, short],
        };
        assert_eq!(
            render_table(&table),
            "| a | b | c |\n|---|---|---|\n| 1 |   |   |"
        );
    }

    #[test]
    fn test_render_table_wide_characters() {
        // CJK characters occupy two display columns each
        let table = first_table("| 名前 | x |\n|---|---|\n| ab | y |");
        assert_eq!(
            render_table(&table),
            "| 名前 | x |\n|------|---|\n| ab   | y |"
        );
    }

    #[test]
    fn test_render_table_all_rows_equal_width() {
        let table = first_table("| h1 | h2 | h3 |\n|---|---|---|\n| 1 | 22 | 333 |\n| 4444 | 5 | 6 |");
        let rendered = render_table(&table);
        let widths: Vec<usize> = rendered.lines().map(|line| line.width()).collect();
        assert!(widths.windows(2).all(|pair| pair[0] == pair[1]));
    }

    fn cell(text: &str) -> Node {
        Node {
            kind: NodeKind::TableCell,
            children: vec![Node {
                kind: NodeKind::Text(text.to_string()),
                children: Vec::new(),
            }],
        }
    }
}
