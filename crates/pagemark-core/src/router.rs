//! Normalizes keyboard, pointer, and touch input into session commands.
//!
//! A session owns exactly one [`Router`] and feeds it every event once; nothing else listens to
//! raw input. Keyboard commands are suppressed while the source editor has focus, except for the
//! keys that leave the editor.

use crate::classify::DeviceClass;
use crate::input::InputEvent;
use crate::input::KeyEvent;
use crate::input::MouseButton;
use crate::input::MouseEvent;
use crate::input::MouseEventKind;
use crate::input::TouchEvent;
use crate::input::TouchPhase;
use crate::keymap::ViewerBindings;
use crate::nav::NavCommand;
use std::time::Duration;
use std::time::Instant;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Focus {
    Source,
    #[default]
    Output,
}

/// What lies under a pointer or touch position, as resolved by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitTarget {
    Source,
    Divider,
    Toggle,
    Output,
    Outside,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteContext {
    pub focus: Focus,
    pub device: DeviceClass,
    pub source_visible: bool,
    pub target: HitTarget,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    ToggleSource,
    Navigate(NavCommand),
    /// Vertical scroll of a single-column output, in lines.
    ScrollLines(i32),
    /// Vertical scroll of a single-column output, in screens.
    ScrollScreens(i32),
    BeginDrag,
    DragTo(u16),
    EndDrag,
    /// Focus the source editor and select everything in it.
    SelectAllSource,
    Focus(Focus),
    /// Forward to the source editor untouched.
    Edit(InputEvent),
    Visibility(bool),
    Quit,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Routed {
    pub command: Option<Command>,
    /// The host must not apply its own default handling (e.g. scrolling) for this event.
    pub suppress_default: bool,
}

impl Routed {
    fn none() -> Self {
        Self::default()
    }

    fn pass(command: Command) -> Self {
        Self {
            command: Some(command),
            suppress_default: false,
        }
    }

    fn handled(command: Command) -> Self {
        Self {
            command: Some(command),
            suppress_default: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Router {
    bindings: ViewerBindings,
    tap: TwoFingerTap,
}

impl Router {
    pub fn new(bindings: ViewerBindings, tap_window: Duration) -> Self {
        Self {
            bindings,
            tap: TwoFingerTap::new(tap_window),
        }
    }

    pub fn bindings(&self) -> &ViewerBindings {
        &self.bindings
    }

    pub fn route(&mut self, event: &InputEvent, ctx: RouteContext, now: Instant) -> Routed {
        match event {
            InputEvent::Key(key) => self.route_key(key, event, ctx),
            InputEvent::Paste(_) => match ctx.focus {
                Focus::Source => Routed::pass(Command::Edit(event.clone())),
                Focus::Output => Routed::none(),
            },
            InputEvent::Mouse(mouse) => route_mouse(mouse, ctx),
            InputEvent::Touch(touch) => {
                if self.tap.feed(touch, ctx, now) {
                    Routed::handled(Command::ToggleSource)
                } else {
                    Routed::none()
                }
            }
            InputEvent::Visibility(visible) => Routed::pass(Command::Visibility(*visible)),
        }
    }

    fn route_key(&self, key: &KeyEvent, event: &InputEvent, ctx: RouteContext) -> Routed {
        let b = &self.bindings;
        if b.force_quit.matches(key) {
            return Routed::handled(Command::Quit);
        }

        if ctx.focus == Focus::Source {
            if b.focus_output.matches(key) {
                return Routed::handled(Command::Focus(Focus::Output));
            }
            return Routed::pass(Command::Edit(event.clone()));
        }

        if b.toggle_source.matches(key) {
            if ctx.device == DeviceClass::Narrow {
                return Routed::none();
            }
            return Routed::handled(Command::ToggleSource);
        }
        if b.next_page.matches(key) {
            return Routed::handled(Command::Navigate(NavCommand::Next));
        }
        if b.previous_page.matches(key) {
            return Routed::handled(Command::Navigate(NavCommand::Previous));
        }
        if b.scroll_down.matches(key) {
            return Routed::handled(Command::ScrollLines(1));
        }
        if b.scroll_up.matches(key) {
            return Routed::handled(Command::ScrollLines(-1));
        }
        if b.page_down.matches(key) {
            return Routed::handled(Command::ScrollScreens(1));
        }
        if b.page_up.matches(key) {
            return Routed::handled(Command::ScrollScreens(-1));
        }
        if b.focus_source.matches(key) && ctx.source_visible {
            return Routed::handled(Command::Focus(Focus::Source));
        }
        if b.quit.matches(key) {
            return Routed::handled(Command::Quit);
        }
        Routed::none()
    }
}

fn route_mouse(mouse: &MouseEvent, ctx: RouteContext) -> Routed {
    match (mouse.kind, ctx.target) {
        (MouseEventKind::Down(MouseButton::Left), HitTarget::Toggle) => {
            Routed::handled(Command::ToggleSource)
        }
        (MouseEventKind::Down(MouseButton::Left), HitTarget::Source) => {
            Routed::handled(Command::SelectAllSource)
        }
        (MouseEventKind::Down(MouseButton::Left), HitTarget::Divider) => {
            Routed::handled(Command::BeginDrag)
        }
        (MouseEventKind::Down(MouseButton::Left), HitTarget::Output) => {
            Routed::pass(Command::Focus(Focus::Output))
        }
        (MouseEventKind::Drag(MouseButton::Left), _) => Routed::pass(Command::DragTo(mouse.x)),
        (MouseEventKind::Up(MouseButton::Left), _) => Routed::pass(Command::EndDrag),
        (MouseEventKind::ScrollDown, HitTarget::Output) => Routed::handled(Command::ScrollLines(3)),
        (MouseEventKind::ScrollUp, HitTarget::Output) => Routed::handled(Command::ScrollLines(-3)),
        _ => Routed::none(),
    }
}

/// Recognizes a quick tap with exactly two fingers.
///
/// The gesture starts when a second contact lands (outside the editor and toggle control) and
/// fires when the last contact lifts within `window` of that moment. A third contact, a cancel,
/// or a wide device spoils the gesture until every contact is up.
#[derive(Clone, Debug)]
struct TwoFingerTap {
    window: Duration,
    started: Option<Instant>,
    spoiled: bool,
}

impl TwoFingerTap {
    fn new(window: Duration) -> Self {
        Self {
            window,
            started: None,
            spoiled: false,
        }
    }

    fn feed(&mut self, touch: &TouchEvent, ctx: RouteContext, now: Instant) -> bool {
        match touch.phase {
            TouchPhase::Start => {
                let eligible = ctx.device == DeviceClass::Narrow
                    && !matches!(ctx.target, HitTarget::Source | HitTarget::Toggle);
                match touch.active {
                    2 if eligible && !self.spoiled && self.started.is_none() => {
                        self.started = Some(now);
                    }
                    2 if !eligible => self.spoil(),
                    n if n > 2 => self.spoil(),
                    _ => {}
                }
                false
            }
            TouchPhase::Move => false,
            TouchPhase::Cancel => {
                self.spoil();
                self.settle_if_released(touch.active);
                false
            }
            TouchPhase::End => {
                if touch.active > 0 {
                    return false;
                }
                let fired = !self.spoiled
                    && self
                        .started
                        .is_some_and(|t| now.saturating_duration_since(t) <= self.window);
                self.settle_if_released(0);
                fired
            }
        }
    }

    fn spoil(&mut self) {
        self.spoiled = true;
        self.started = None;
    }

    fn settle_if_released(&mut self, active: u8) {
        if active == 0 {
            self.started = None;
            self.spoiled = false;
        }
    }
}
