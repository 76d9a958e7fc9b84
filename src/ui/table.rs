use unicode_width::UnicodeWidthStr;

/// Plain-text table for terminal output. Columns from `numeric_from` on are right-aligned.
#[derive(Debug, Clone)]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    numeric_from: usize,
}

impl TextTable {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            numeric_from: usize::MAX,
        }
    }

    pub fn right_align_from(mut self, column: usize) -> Self {
        self.numeric_from = column;
        self
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self
            .headers
            .iter()
            .map(|header| UnicodeWidthStr::width(header.as_str()))
            .collect();

        for row in &self.rows {
            for (idx, cell) in row.iter().enumerate() {
                let width = UnicodeWidthStr::width(cell.as_str());
                match widths.get_mut(idx) {
                    Some(current) if width > *current => *current = width,
                    Some(_) => {}
                    None => widths.push(width),
                }
            }
        }

        widths
    }

    fn render_line(&self, cells: &[String], widths: &[usize]) -> String {
        let mut line = String::new();
        for (idx, width) in widths.iter().enumerate() {
            let cell = cells.get(idx).map(String::as_str).unwrap_or("");
            let pad = width.saturating_sub(UnicodeWidthStr::width(cell));
            if idx > 0 {
                line.push_str("  ");
            }
            if idx >= self.numeric_from {
                line.push_str(&" ".repeat(pad));
                line.push_str(cell);
            } else {
                line.push_str(cell);
                line.push_str(&" ".repeat(pad));
            }
        }
        line.trim_end().to_string()
    }

    pub fn render(&self) -> String {
        let widths = self.column_widths();
        let mut lines = Vec::with_capacity(self.rows.len() + 2);

        lines.push(self.render_line(&self.headers, &widths));
        let rule_width = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        lines.push("-".repeat(rule_width));
        for row in &self.rows {
            lines.push(self.render_line(row, &widths));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_by_display_width() {
        let mut table = TextTable::new(["Symbol", "Name", "Price"]).right_align_from(2);
        table.push_row(vec!["7203.T".into(), "トヨタ".into(), "3000".into()]);
        table.push_row(vec!["NFLX".into(), "Netflix".into(), "600.5".into()]);

        let rendered = table.render();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines[0], "Symbol  Name     Price");
        assert_eq!(lines[2], "7203.T  トヨタ    3000");
        assert_eq!(lines[3], "NFLX    Netflix  600.5");
    }

    #[test]
    fn header_only_table_renders_rule() {
        let table = TextTable::new(["A", "B"]);

        assert!(table.is_empty());
        assert_eq!(table.render(), "A  B\n----");
    }
}
