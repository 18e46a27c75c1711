//! Plain-text editor for the Markdown source panel.

use crate::input::InputEvent;
use crate::input::KeyCode;
use crate::input::KeyEvent;
use crate::render;
use crate::viewport::ViewportState;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

#[derive(Clone, Debug, Default)]
pub struct TextAreaOptions {
    pub style: Style,
    pub selection_style: Style,
    pub placeholder: String,
    pub placeholder_style: Style,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    pub row: usize,
    pub col: usize, // char index within line
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAreaAction {
    None,
    Changed,
}

#[derive(Clone, Debug)]
pub struct TextArea {
    lines: Vec<String>,
    cursor: Cursor,
    preferred_x: Option<usize>, // display columns
    /// Whole-buffer selection; the next edit replaces everything.
    all_selected: bool,
    pub state: ViewportState,
    options: TextAreaOptions,
}

impl Default for TextArea {
    fn default() -> Self {
        Self::new()
    }
}

impl TextArea {
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
            cursor: Cursor::default(),
            preferred_x: None,
            all_selected: false,
            state: ViewportState::default(),
            options: TextAreaOptions::default(),
        }
    }

    pub fn with_options(options: TextAreaOptions) -> Self {
        Self {
            options,
            ..Self::new()
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = normalize_newlines(&text.into());
        self.lines = text.split('\n').map(str::to_string).collect();
        self.cursor = Cursor::default();
        self.preferred_x = None;
        self.all_selected = false;
        self.recompute_content_size();
        self.state.clamp();
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn select_all(&mut self) {
        self.all_selected = !self.is_empty();
    }

    pub fn has_selection(&self) -> bool {
        self.all_selected
    }

    pub fn set_viewport(&mut self, area: Rect) {
        self.state.set_viewport(area.width, area.height);
        self.recompute_content_size();
        self.ensure_cursor_visible();
    }

    pub fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        if area.width == 0 || area.height == 0 {
            return None;
        }
        let (cx, cy) = self.cursor_screen_pos();
        let x = cx.checked_sub(self.state.x)?;
        let y = cy.checked_sub(self.state.y)?;
        if x >= area.width as u32 || y >= area.height as u32 {
            return None;
        }
        Some((area.x + x as u16, area.y + y as u16))
    }

    pub fn input(&mut self, event: InputEvent) -> TextAreaAction {
        match event {
            InputEvent::Paste(s) => {
                self.take_selection();
                self.insert_str(&s);
                self.edited()
            }
            InputEvent::Key(key) => self.handle_key(key),
            InputEvent::Mouse(_) | InputEvent::Touch(_) | InputEvent::Visibility(_) => {
                TextAreaAction::None
            }
        }
    }

    pub fn render_ref(&mut self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        self.set_viewport(area);
        render::clear(area, buf, self.options.style);

        if self.is_empty() && !self.options.placeholder.is_empty() {
            render::render_str_clipped(
                area.x,
                area.y,
                0,
                area.width,
                buf,
                &self.options.placeholder,
                self.options.placeholder_style,
            );
            return;
        }

        let style = if self.all_selected {
            self.options.style.patch(self.options.selection_style)
        } else {
            self.options.style
        };
        for row in 0..area.height {
            let idx = (self.state.y as usize).saturating_add(row as usize);
            let Some(line) = self.lines.get(idx) else {
                break;
            };
            render::render_str_clipped(
                area.x,
                area.y + row,
                self.state.x,
                area.width,
                buf,
                line,
                style,
            );
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> TextAreaAction {
        match key.code {
            KeyCode::Char(c) => {
                if key.modifiers.ctrl || key.modifiers.alt {
                    return TextAreaAction::None;
                }
                self.take_selection();
                self.insert_char(c);
                self.edited()
            }
            KeyCode::Enter => {
                self.take_selection();
                self.insert_newline();
                self.edited()
            }
            KeyCode::Tab => {
                self.take_selection();
                self.insert_str("    ");
                self.edited()
            }
            KeyCode::Backspace | KeyCode::Delete if self.all_selected => {
                self.take_selection();
                self.edited()
            }
            KeyCode::Backspace => {
                if self.backspace() {
                    self.edited()
                } else {
                    TextAreaAction::None
                }
            }
            KeyCode::Delete => {
                if self.delete() {
                    self.edited()
                } else {
                    TextAreaAction::None
                }
            }
            KeyCode::Left => self.moved(Self::move_left),
            KeyCode::Right => self.moved(Self::move_right),
            KeyCode::Up => self.moved(Self::move_up),
            KeyCode::Down => self.moved(Self::move_down),
            KeyCode::Home => self.moved(|ta| {
                ta.cursor.col = 0;
                ta.preferred_x = Some(0);
            }),
            KeyCode::End => self.moved(|ta| {
                ta.cursor.col = ta.current_line_char_len();
                ta.preferred_x = Some(ta.cursor_display_x());
            }),
            KeyCode::PageDown => {
                self.all_selected = false;
                self.state.scroll_screens(1);
                TextAreaAction::None
            }
            KeyCode::PageUp => {
                self.all_selected = false;
                self.state.scroll_screens(-1);
                TextAreaAction::None
            }
            KeyCode::Esc => TextAreaAction::None,
        }
    }

    fn edited(&mut self) -> TextAreaAction {
        self.preferred_x = None;
        self.recompute_content_size();
        self.ensure_cursor_visible();
        TextAreaAction::Changed
    }

    fn moved(&mut self, f: impl FnOnce(&mut Self)) -> TextAreaAction {
        self.all_selected = false;
        f(self);
        self.ensure_cursor_visible();
        TextAreaAction::None
    }

    /// Deletes the selection, if any, leaving the cursor at the start of an empty buffer.
    fn take_selection(&mut self) {
        if !self.all_selected {
            return;
        }
        self.lines = vec![String::new()];
        self.cursor = Cursor::default();
        self.all_selected = false;
    }

    fn recompute_content_size(&mut self) {
        let content_h = self.lines.len() as u32;
        let content_w = self
            .lines
            .iter()
            .map(|l| UnicodeWidthStr::width(l.as_str()) as u32)
            .max()
            .unwrap_or(0);
        // one spare column so the cursor can sit after the last character
        self.state.set_content(content_w + 1, content_h);
    }

    fn ensure_cursor_visible(&mut self) {
        let (cx, cy) = self.cursor_screen_pos();
        if cy < self.state.y {
            self.state.y = cy;
        } else if cy >= self.state.y.saturating_add(self.state.viewport_h as u32) {
            self.state.y = cy.saturating_sub(self.state.viewport_h.saturating_sub(1) as u32);
        }

        if cx < self.state.x {
            self.state.x = cx;
        } else if cx >= self.state.x.saturating_add(self.state.viewport_w as u32) {
            self.state.x = cx.saturating_sub(self.state.viewport_w.saturating_sub(1) as u32);
        }

        self.state.clamp();
    }

    fn cursor_screen_pos(&self) -> (u32, u32) {
        let y = self.cursor.row.min(self.lines.len().saturating_sub(1)) as u32;
        (self.cursor_display_x() as u32, y)
    }

    fn cursor_display_x(&self) -> usize {
        self.current_line()
            .chars()
            .take(self.cursor.col)
            .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
            .sum()
    }

    fn current_line(&self) -> &str {
        self.lines
            .get(self.cursor.row)
            .map(String::as_str)
            .unwrap_or("")
    }

    fn current_line_char_len(&self) -> usize {
        self.current_line().chars().count()
    }

    fn move_left(&mut self) {
        if self.cursor.col > 0 {
            self.cursor.col -= 1;
        } else if self.cursor.row > 0 {
            self.cursor.row -= 1;
            self.cursor.col = self.current_line_char_len();
        }
        self.preferred_x = Some(self.cursor_display_x());
    }

    fn move_right(&mut self) {
        if self.cursor.col < self.current_line_char_len() {
            self.cursor.col += 1;
        } else if self.cursor.row + 1 < self.lines.len() {
            self.cursor.row += 1;
            self.cursor.col = 0;
        }
        self.preferred_x = Some(self.cursor_display_x());
    }

    fn move_up(&mut self) {
        if self.cursor.row == 0 {
            return;
        }
        let target_x = self.preferred_x.unwrap_or_else(|| self.cursor_display_x());
        self.cursor.row -= 1;
        self.cursor.col = col_from_display_x(self.current_line(), target_x);
        self.preferred_x = Some(target_x);
    }

    fn move_down(&mut self) {
        if self.cursor.row + 1 >= self.lines.len() {
            return;
        }
        let target_x = self.preferred_x.unwrap_or_else(|| self.cursor_display_x());
        self.cursor.row += 1;
        self.cursor.col = col_from_display_x(self.current_line(), target_x);
        self.preferred_x = Some(target_x);
    }

    fn insert_char(&mut self, ch: char) {
        let row = self.cursor.row.min(self.lines.len() - 1);
        let line = &mut self.lines[row];
        let byte_idx = byte_index_from_char_index(line, self.cursor.col);
        line.insert(byte_idx, ch);
        self.cursor.row = row;
        self.cursor.col += 1;
    }

    fn insert_newline(&mut self) {
        let row = self.cursor.row.min(self.lines.len() - 1);
        let line = &mut self.lines[row];
        let byte_idx = byte_index_from_char_index(line, self.cursor.col);
        let tail = line.split_off(byte_idx);
        self.lines.insert(row + 1, tail);
        self.cursor.row = row + 1;
        self.cursor.col = 0;
    }

    fn insert_str(&mut self, s: &str) {
        let s = normalize_newlines(s);
        let mut parts = s.split('\n');
        let Some(first) = parts.next() else {
            return;
        };
        let rest: Vec<&str> = parts.collect();

        let row = self.cursor.row.min(self.lines.len() - 1);
        let byte_idx = byte_index_from_char_index(&self.lines[row], self.cursor.col);
        if rest.is_empty() {
            self.lines[row].insert_str(byte_idx, first);
            self.cursor.row = row;
            self.cursor.col += first.chars().count();
            return;
        }

        let tail = self.lines[row].split_off(byte_idx);
        self.lines[row].push_str(first);
        let mut insert_at = row + 1;
        for mid in &rest[..rest.len() - 1] {
            self.lines.insert(insert_at, (*mid).to_string());
            insert_at += 1;
        }
        let last = rest[rest.len() - 1];
        self.lines.insert(insert_at, format!("{last}{tail}"));
        self.cursor.row = insert_at;
        self.cursor.col = last.chars().count();
    }

    fn backspace(&mut self) -> bool {
        if self.cursor.col > 0 {
            let row = self.cursor.row.min(self.lines.len() - 1);
            let line = &mut self.lines[row];
            let start = byte_index_from_char_index(line, self.cursor.col - 1);
            let end = byte_index_from_char_index(line, self.cursor.col);
            line.replace_range(start..end, "");
            self.cursor.row = row;
            self.cursor.col -= 1;
            return true;
        }
        if self.cursor.row > 0 && self.cursor.row < self.lines.len() {
            let cur = self.lines.remove(self.cursor.row);
            self.cursor.row -= 1;
            let prev = &mut self.lines[self.cursor.row];
            self.cursor.col = prev.chars().count();
            prev.push_str(&cur);
            return true;
        }
        false
    }

    fn delete(&mut self) -> bool {
        let row = self.cursor.row.min(self.lines.len() - 1);
        let line_len = self.lines[row].chars().count();
        if self.cursor.col < line_len {
            let line = &mut self.lines[row];
            let start = byte_index_from_char_index(line, self.cursor.col);
            let end = byte_index_from_char_index(line, self.cursor.col + 1);
            line.replace_range(start..end, "");
            return true;
        }
        if row + 1 < self.lines.len() {
            let next = self.lines.remove(row + 1);
            self.lines[row].push_str(&next);
            return true;
        }
        false
    }
}

fn col_from_display_x(line: &str, target_x: usize) -> usize {
    let mut cols = 0usize;
    let mut col = 0usize;
    for ch in line.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if cols + w > target_x {
            break;
        }
        cols += w;
        col += 1;
    }
    col
}

fn byte_index_from_char_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

fn normalize_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}
