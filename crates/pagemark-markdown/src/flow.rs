//! Flowing rendered lines into fixed-height columns.

use ratatui::text::Line;

/// Rendered lines split into columns of equal height, in reading order.
///
/// Blank lines that would open a column are dropped, so no column starts with empty space.
#[derive(Clone, Debug, Default)]
pub struct ColumnFlow {
    columns: Vec<Vec<Line<'static>>>,
    height: u16,
}

impl ColumnFlow {
    pub fn new(lines: Vec<Line<'static>>, height: u16) -> Self {
        let mut columns: Vec<Vec<Line<'static>>> = Vec::new();
        if height == 0 {
            return Self { columns, height };
        }
        let mut current: Vec<Line<'static>> = Vec::with_capacity(height as usize);
        for line in lines {
            if current.is_empty() && is_blank(&line) {
                continue;
            }
            current.push(line);
            if current.len() == height as usize {
                columns.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            columns.push(current);
        }
        Self { columns, height }
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, index: usize) -> Option<&[Line<'static>]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[Line<'static>]> {
        self.columns.iter().map(Vec::as_slice)
    }
}

fn is_blank(line: &Line<'_>) -> bool {
    line.spans.iter().all(|s| s.content.trim().is_empty())
}
