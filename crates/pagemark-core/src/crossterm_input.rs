use crate::input::InputEvent;
use crate::input::KeyCode;
use crate::input::KeyEvent;
use crate::input::KeyModifiers;
use crate::input::MouseButton;
use crate::input::MouseEvent;
use crate::input::MouseEventKind;

/// Maps a crossterm event into the host-independent form.
///
/// Terminal focus changes stand in for page visibility: `FocusGained` becomes
/// `Visibility(true)` and `FocusLost` becomes `Visibility(false)`. Resize events are
/// observed by the host's layout pass and map to `None`.
pub fn input_event_from_crossterm(ev: crossterm::event::Event) -> Option<InputEvent> {
    match ev {
        crossterm::event::Event::Key(key) => {
            if key.kind != crossterm::event::KeyEventKind::Press {
                return None;
            }
            Some(InputEvent::Key(key_event_from_crossterm(key)?))
        }
        crossterm::event::Event::Paste(s) => Some(InputEvent::Paste(s)),
        crossterm::event::Event::Mouse(m) => {
            Some(InputEvent::Mouse(mouse_event_from_crossterm(m)?))
        }
        crossterm::event::Event::FocusGained => Some(InputEvent::Visibility(true)),
        crossterm::event::Event::FocusLost => Some(InputEvent::Visibility(false)),
        _ => None,
    }
}

pub fn key_event_from_crossterm(key: crossterm::event::KeyEvent) -> Option<KeyEvent> {
    let code = match key.code {
        crossterm::event::KeyCode::Char(c) => KeyCode::Char(c),
        crossterm::event::KeyCode::Enter => KeyCode::Enter,
        crossterm::event::KeyCode::Backspace => KeyCode::Backspace,
        crossterm::event::KeyCode::Delete => KeyCode::Delete,
        crossterm::event::KeyCode::Tab => KeyCode::Tab,
        // shift+tab leaves the editor like Esc does
        crossterm::event::KeyCode::BackTab => KeyCode::Esc,
        crossterm::event::KeyCode::Esc => KeyCode::Esc,
        crossterm::event::KeyCode::Left => KeyCode::Left,
        crossterm::event::KeyCode::Right => KeyCode::Right,
        crossterm::event::KeyCode::Up => KeyCode::Up,
        crossterm::event::KeyCode::Down => KeyCode::Down,
        crossterm::event::KeyCode::Home => KeyCode::Home,
        crossterm::event::KeyCode::End => KeyCode::End,
        crossterm::event::KeyCode::PageUp => KeyCode::PageUp,
        crossterm::event::KeyCode::PageDown => KeyCode::PageDown,
        _ => return None,
    };

    Some(KeyEvent {
        code,
        modifiers: modifiers_from_crossterm(key.modifiers),
    })
}

pub fn mouse_event_from_crossterm(m: crossterm::event::MouseEvent) -> Option<MouseEvent> {
    let kind = match m.kind {
        crossterm::event::MouseEventKind::Down(b) => {
            MouseEventKind::Down(mouse_button_from_crossterm(b))
        }
        crossterm::event::MouseEventKind::Drag(b) => {
            MouseEventKind::Drag(mouse_button_from_crossterm(b))
        }
        crossterm::event::MouseEventKind::Up(b) => MouseEventKind::Up(mouse_button_from_crossterm(b)),
        crossterm::event::MouseEventKind::ScrollUp => MouseEventKind::ScrollUp,
        crossterm::event::MouseEventKind::ScrollDown => MouseEventKind::ScrollDown,
        _ => return None,
    };

    Some(MouseEvent {
        x: m.column,
        y: m.row,
        kind,
        modifiers: modifiers_from_crossterm(m.modifiers),
    })
}

fn modifiers_from_crossterm(m: crossterm::event::KeyModifiers) -> KeyModifiers {
    KeyModifiers {
        shift: m.contains(crossterm::event::KeyModifiers::SHIFT),
        ctrl: m.contains(crossterm::event::KeyModifiers::CONTROL),
        alt: m.contains(crossterm::event::KeyModifiers::ALT),
    }
}

fn mouse_button_from_crossterm(b: crossterm::event::MouseButton) -> MouseButton {
    match b {
        crossterm::event::MouseButton::Left => MouseButton::Left,
        crossterm::event::MouseButton::Right => MouseButton::Right,
        crossterm::event::MouseButton::Middle => MouseButton::Middle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::Event;
    use crossterm::event::KeyEventKind;
    use crossterm::event::KeyEventState;

    fn ct_key(code: crossterm::event::KeyCode, kind: KeyEventKind) -> Event {
        Event::Key(crossterm::event::KeyEvent {
            code,
            modifiers: crossterm::event::KeyModifiers::CONTROL,
            kind,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn maps_presses_only() {
        let press = ct_key(crossterm::event::KeyCode::Char('b'), KeyEventKind::Press);
        assert_eq!(
            input_event_from_crossterm(press),
            Some(InputEvent::Key(
                KeyEvent::new(KeyCode::Char('b')).with_modifiers(KeyModifiers::ctrl())
            ))
        );
        let release = ct_key(crossterm::event::KeyCode::Char('b'), KeyEventKind::Release);
        assert_eq!(input_event_from_crossterm(release), None);
    }

    #[test]
    fn focus_maps_to_visibility() {
        assert_eq!(
            input_event_from_crossterm(Event::FocusGained),
            Some(InputEvent::Visibility(true))
        );
        assert_eq!(
            input_event_from_crossterm(Event::FocusLost),
            Some(InputEvent::Visibility(false))
        );
        assert_eq!(input_event_from_crossterm(Event::Resize(80, 24)), None);
    }
}
