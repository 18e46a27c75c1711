//! Clipped drawing of styled text into a [`Buffer`].

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Span;
use unicode_width::UnicodeWidthChar;

const TAB_WIDTH: usize = 4;

/// Draws `spans` on row `y` starting at `x`, skipping the first `start_col` display columns and
/// writing at most `max_cols`. Wide characters straddling either edge are dropped. Spans with
/// the default style take `fallback_style`.
pub fn render_spans_clipped(
    x: u16,
    y: u16,
    start_col: u32,
    max_cols: u16,
    buf: &mut Buffer,
    spans: &[Span<'_>],
    fallback_style: Style,
) {
    let mut cursor = ClipCursor {
        x,
        y,
        start_col: start_col as usize,
        max_cols: max_cols as usize,
        col: 0,
        out_cols: 0,
    };
    for span in spans {
        let style = if span.style == Style::default() {
            fallback_style
        } else {
            span.style
        };
        for ch in span.content.chars() {
            let done = if ch == '\t' {
                (0..TAB_WIDTH).any(|_| !cursor.put(buf, ' ', 1, style))
            } else {
                let w = UnicodeWidthChar::width(ch).unwrap_or(0);
                w > 0 && !cursor.put(buf, ch, w, style)
            };
            if done {
                return;
            }
        }
    }
}

pub fn render_str_clipped(
    x: u16,
    y: u16,
    start_col: u32,
    max_cols: u16,
    buf: &mut Buffer,
    input: &str,
    style: Style,
) {
    render_spans_clipped(
        x,
        y,
        start_col,
        max_cols,
        buf,
        &[Span::styled(input, style)],
        style,
    );
}

struct ClipCursor {
    x: u16,
    y: u16,
    start_col: usize,
    max_cols: usize,
    col: usize,
    out_cols: usize,
}

impl ClipCursor {
    /// Returns `false` once the row is full.
    fn put(&mut self, buf: &mut Buffer, ch: char, w: usize, style: Style) -> bool {
        if self.col < self.start_col {
            self.col += w;
            return true;
        }
        if self.out_cols + w > self.max_cols {
            return false;
        }
        let mut tmp = [0u8; 4];
        let dx = self.out_cols as u16;
        if let Some(cell) = buf.cell_mut((self.x + dx, self.y)) {
            cell.set_style(style);
            cell.set_symbol(ch.encode_utf8(&mut tmp));
        }
        if w == 2
            && let Some(cell) = buf.cell_mut((self.x + dx + 1, self.y))
        {
            cell.set_style(style);
            cell.set_symbol("");
        }
        self.col += w;
        self.out_cols += w;
        true
    }
}

/// Fills `area` with `style` and blanks.
pub fn clear(area: Rect, buf: &mut Buffer, style: Style) {
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.reset();
                cell.set_style(style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn clips_on_both_sides() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 4, 1));
        render_str_clipped(0, 0, 2, 3, &mut buf, "abcdef", Style::default());
        assert_eq!(row(&buf, 0), "cde ");
    }

    #[test]
    fn tabs_expand_and_wide_chars_do_not_split() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 6, 1));
        render_str_clipped(0, 0, 0, 6, &mut buf, "\tx", Style::default());
        assert_eq!(row(&buf, 0), "    x ");

        let mut buf = Buffer::empty(Rect::new(0, 0, 3, 1));
        render_str_clipped(0, 0, 1, 3, &mut buf, "你好", Style::default());
        assert_eq!(row(&buf, 0), "好 ");
    }
}
