use crate::input::KeyCode;
use crate::input::KeyEvent;
use crate::input::KeyModifiers;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub keys: Vec<KeyEvent>,
    pub help_key: String,
    pub help_desc: String,
}

impl Binding {
    pub fn new(
        help_key: impl Into<String>,
        help_desc: impl Into<String>,
        keys: Vec<KeyEvent>,
    ) -> Self {
        Self {
            keys,
            help_key: help_key.into(),
            help_desc: help_desc.into(),
        }
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.keys.iter().any(|k| key_event_matches(k, event))
    }
}

/// Character keys ignore `shift`, since hosts disagree on whether `G` carries it.
pub fn key_event_matches(pattern: &KeyEvent, event: &KeyEvent) -> bool {
    if pattern.code != event.code {
        return false;
    }
    let (p, e) = (pattern.modifiers, event.modifiers);
    let shift_ok = matches!(pattern.code, KeyCode::Char(_)) || p.shift == e.shift;
    shift_ok && p.ctrl == e.ctrl && p.alt == e.alt
}

pub fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code)
}

pub fn key_char(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c))
}

pub fn key_ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c)).with_modifiers(KeyModifiers::ctrl())
}

/// Keys the viewer reacts to outside the source editor.
#[derive(Clone, Debug)]
pub struct ViewerBindings {
    pub toggle_source: Binding,
    pub next_page: Binding,
    pub previous_page: Binding,
    pub scroll_up: Binding,
    pub scroll_down: Binding,
    pub page_up: Binding,
    pub page_down: Binding,
    pub focus_source: Binding,
    pub focus_output: Binding,
    pub quit: Binding,
    /// Quits regardless of focus.
    pub force_quit: Binding,
}

impl Default for ViewerBindings {
    fn default() -> Self {
        Self {
            toggle_source: Binding::new("ctrl+b", "source", vec![key_ctrl('b')]),
            next_page: Binding::new(
                "→/l",
                "next",
                vec![key(KeyCode::Right), key_char('l')],
            ),
            previous_page: Binding::new(
                "←/h",
                "prev",
                vec![key(KeyCode::Left), key_char('h')],
            ),
            scroll_up: Binding::new("↑/k", "up", vec![key(KeyCode::Up), key_char('k')]),
            scroll_down: Binding::new("↓/j", "down", vec![key(KeyCode::Down), key_char('j')]),
            page_up: Binding::new("pgup", "page up", vec![key(KeyCode::PageUp)]),
            page_down: Binding::new("pgdn", "page down", vec![key(KeyCode::PageDown)]),
            focus_source: Binding::new("tab", "edit", vec![key(KeyCode::Tab)]),
            focus_output: Binding::new("esc", "read", vec![key(KeyCode::Esc)]),
            quit: Binding::new("q", "quit", vec![key_char('q')]),
            force_quit: Binding::new("ctrl+c", "quit", vec![key_ctrl('c')]),
        }
    }
}

impl ViewerBindings {
    /// Bindings worth listing in a help bar, in display order.
    pub fn help(&self) -> Vec<&Binding> {
        vec![
            &self.previous_page,
            &self.next_page,
            &self.toggle_source,
            &self.focus_source,
            &self.focus_output,
            &self.quit,
        ]
    }
}
