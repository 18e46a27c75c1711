//! The single owner of all viewer state.
//!
//! A [`Session`] ties the components together: the host reports window and output geometry,
//! feeds input events, and calls [`Session::tick`] whenever [`Session::next_deadline`] passes.
//! Every state change goes through one of these entry points; nothing is global.

use crate::animate::ScrollAnimator;
use crate::animate::ScrollSurface;
use crate::classify;
use crate::classify::ColumnCount;
use crate::classify::DeviceClass;
use crate::config::ViewerConfig;
use crate::error::PagemarkResult;
use crate::input::InputEvent;
use crate::keymap::ViewerBindings;
use crate::nav::NavCommand;
use crate::nav::NavOutcome;
use crate::nav::Navigator;
use crate::panel::PanelLayout;
use crate::router::Command;
use crate::router::Focus;
use crate::router::HitTarget;
use crate::router::RouteContext;
use crate::router::Router;
use crate::schedule;
use crate::snap;
use crate::snap::SurfaceGeometry;
use crate::toast::Toast;
use crate::wake::WakeLock;
use crate::wake::WakeLockManager;
use std::time::Instant;

/// What the host actually laid out: geometry measured after layout, the column count used, and
/// the revision of the content that was flowed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutObservation {
    pub geometry: SurfaceGeometry,
    pub columns: ColumnCount,
    pub content_revision: u64,
}

/// Work the session hands back to the host.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Effect {
    #[default]
    None,
    /// Feed the event to the source editor.
    Edit(InputEvent),
    SelectAllSource,
    ScrollLines(i32),
    ScrollScreens(i32),
    /// Panel geometry changed; lay out again.
    Relayout,
    Quit,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dispatch {
    pub effect: Effect,
    pub suppress_default: bool,
}

#[derive(Debug)]
pub struct Session {
    config: ViewerConfig,
    panel: PanelLayout,
    columns: ColumnCount,
    nav: Navigator,
    animator: ScrollAnimator,
    toast: Toast,
    router: Router,
    focus: Focus,
    last_layout: Option<LayoutObservation>,
    wake: WakeLockManager,
}

impl Session {
    pub fn new(
        config: ViewerConfig,
        window_width: f64,
        wake_lock: Box<dyn WakeLock>,
    ) -> PagemarkResult<Self> {
        config.validate()?;
        let mut wake = WakeLockManager::new(wake_lock);
        wake.acquire();
        Ok(Self {
            panel: PanelLayout::new(window_width, &config),
            columns: ColumnCount::One,
            nav: Navigator::new(),
            animator: ScrollAnimator::new(config.settle_delay),
            toast: Toast::new(config.toast_duration),
            router: Router::new(ViewerBindings::default(), config.tap_window),
            focus: Focus::Output,
            last_layout: None,
            wake,
            config,
        })
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn panel(&self) -> &PanelLayout {
        &self.panel
    }

    pub fn columns(&self) -> ColumnCount {
        self.columns
    }

    pub fn navigator(&self) -> &Navigator {
        &self.nav
    }

    pub fn toast(&self) -> Option<&str> {
        self.toast.message()
    }

    pub fn toasts_shown(&self) -> u64 {
        self.toast.shown()
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn bindings(&self) -> &ViewerBindings {
        self.router.bindings()
    }

    pub fn wake_lock(&self) -> &WakeLockManager {
        &self.wake
    }

    pub fn pending_settle(&self) -> Option<u32> {
        self.animator.pending_target()
    }

    /// Window width changed. Returns the new device class on a class transition.
    pub fn observe_window(&mut self, width: f64) -> Option<DeviceClass> {
        let transition = self.panel.observe_window(width);
        self.ensure_focus_visible();
        transition
    }

    /// Content-box width of the output surface changed; returns the column count to lay out with.
    pub fn observe_output_width(&mut self, content_width: f64) -> ColumnCount {
        let next = classify::column_count(content_width, &self.config);
        if next != self.columns {
            tracing::debug!(from = ?self.columns, to = ?next, content_width, "column count");
            self.columns = next;
        }
        next
    }

    /// Reports post-layout geometry. Snap points are recomputed only when the observation
    /// differs from the previous one; the surface is then returned to the first page.
    pub fn observe_layout<S: ScrollSurface + ?Sized>(
        &mut self,
        observation: LayoutObservation,
        surface: &mut S,
    ) -> bool {
        if let Err(err) = observation.geometry.validate() {
            tracing::debug!(%err, "skipping snap point computation");
            return false;
        }
        if self.last_layout == Some(observation) {
            return false;
        }
        self.last_layout = Some(observation);

        let points = snap::compute(&observation.geometry, observation.columns);
        tracing::debug!(
            pages = points.len(),
            max_scroll = points.last(),
            columns = observation.columns.get(),
            revision = observation.content_revision,
            "snap points recomputed"
        );
        self.animator.cancel();
        let offset = self.nav.reset(points);
        surface.jump_to(offset);
        true
    }

    pub fn handle<S: ScrollSurface + ?Sized>(
        &mut self,
        event: &InputEvent,
        target: HitTarget,
        now: Instant,
        surface: &mut S,
    ) -> Dispatch {
        let ctx = RouteContext {
            focus: self.focus,
            device: self.panel.device(),
            source_visible: self.panel.source_visible(),
            target,
        };
        let routed = self.router.route(event, ctx, now);
        let effect = match routed.command {
            Some(command) => self.apply(command, now, surface),
            None => Effect::None,
        };
        Dispatch {
            effect,
            suppress_default: routed.suppress_default,
        }
    }

    pub fn apply<S: ScrollSurface + ?Sized>(
        &mut self,
        command: Command,
        now: Instant,
        surface: &mut S,
    ) -> Effect {
        match command {
            Command::ToggleSource => {
                let visible = self.panel.toggle_source();
                tracing::debug!(visible, "source panel toggled");
                self.ensure_focus_visible();
                Effect::Relayout
            }
            Command::Navigate(nav) => {
                self.navigate(nav, now, surface);
                Effect::None
            }
            Command::ScrollLines(n) => Effect::ScrollLines(n),
            Command::ScrollScreens(n) => Effect::ScrollScreens(n),
            Command::BeginDrag => {
                self.panel.begin_drag();
                Effect::None
            }
            Command::DragTo(x) => {
                match self.panel.drag_to(self.config.cells_to_px(x)) {
                    Some(_) => Effect::Relayout,
                    None => Effect::None,
                }
            }
            Command::EndDrag => {
                self.panel.end_drag();
                Effect::None
            }
            Command::SelectAllSource => {
                if !self.panel.source_visible() {
                    return Effect::None;
                }
                self.focus = Focus::Source;
                Effect::SelectAllSource
            }
            Command::Focus(focus) => {
                if focus == Focus::Source && !self.panel.source_visible() {
                    return Effect::None;
                }
                self.focus = focus;
                Effect::None
            }
            Command::Edit(event) => Effect::Edit(event),
            Command::Visibility(visible) => {
                self.wake.on_visibility(visible);
                Effect::None
            }
            Command::Quit => Effect::Quit,
        }
    }

    /// Runs due deferred work. Returns `true` if anything visible changed.
    pub fn tick<S: ScrollSurface + ?Sized>(&mut self, now: Instant, surface: &mut S) -> bool {
        let settled = self.animator.poll(now, surface).is_some();
        let expired = self.toast.poll(now);
        settled || expired
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        schedule::earliest([self.animator.deadline(), self.toast.deadline()])
    }

    fn navigate<S: ScrollSurface + ?Sized>(&mut self, nav: NavCommand, now: Instant, surface: &mut S) {
        match self.nav.apply(nav) {
            NavOutcome::Moved { index, offset } => {
                tracing::trace!(index, offset, "page");
                self.animator.request(offset, now, surface);
            }
            NavOutcome::BoundaryHit(boundary) => {
                tracing::debug!(?boundary, "boundary hit");
                self.toast.show(self.config.toast_message.clone(), now);
            }
        }
    }

    fn ensure_focus_visible(&mut self) {
        if self.focus == Focus::Source && !self.panel.source_visible() {
            self.focus = Focus::Output;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyCode;
    use crate::keymap::key;
    use crate::wake::UnsupportedWakeLock;
    use std::time::Duration;

    #[derive(Default)]
    struct Surface {
        offset: u32,
        jumps: u32,
        smooths: Vec<u32>,
    }

    impl ScrollSurface for Surface {
        fn jump_to(&mut self, offset: u32) {
            self.offset = offset;
            self.jumps += 1;
        }

        fn smooth_to(&mut self, offset: u32, _now: Instant) {
            self.offset = offset;
            self.smooths.push(offset);
        }
    }

    fn session(width: f64) -> Session {
        Session::new(ViewerConfig::default(), width, Box::new(UnsupportedWakeLock))
            .expect("default config")
    }

    fn paginated(revision: u64) -> LayoutObservation {
        LayoutObservation {
            geometry: SurfaceGeometry {
                client_width: 1000.0,
                padding_x: 80.0,
                column_gap: 40.0,
                scroll_width: 4000.0,
            },
            columns: ColumnCount::Four,
            content_revision: revision,
        }
    }

    #[test]
    fn identical_observations_do_not_reset_the_page() {
        let mut s = session(1600.0);
        let mut surface = Surface::default();
        let now = Instant::now();
        assert!(s.observe_layout(paginated(1), &mut surface));
        s.apply(Command::Navigate(NavCommand::Next), now, &mut surface);
        assert_eq!(s.navigator().index(), 1);

        assert!(!s.observe_layout(paginated(1), &mut surface));
        assert_eq!(s.navigator().index(), 1);

        assert!(s.observe_layout(paginated(2), &mut surface));
        assert_eq!(s.navigator().index(), 0);
        assert_eq!(surface.offset, 0);
    }

    #[test]
    fn relayout_cancels_a_pending_settle() {
        let mut s = session(1600.0);
        let mut surface = Surface::default();
        let now = Instant::now();
        s.observe_layout(paginated(1), &mut surface);
        s.apply(Command::Navigate(NavCommand::Next), now, &mut surface);
        assert_eq!(s.pending_settle(), Some(240));
        s.observe_layout(paginated(2), &mut surface);
        assert_eq!(s.pending_settle(), None);
        s.tick(now + Duration::from_secs(1), &mut surface);
        assert!(surface.smooths.is_empty());
    }

    #[test]
    fn unmounted_geometry_is_skipped() {
        let mut s = session(1600.0);
        let mut surface = Surface::default();
        let mut obs = paginated(1);
        obs.geometry.client_width = 0.0;
        assert!(!s.observe_layout(obs, &mut surface));
        assert_eq!(surface.jumps, 0);
    }

    #[test]
    fn hiding_the_source_returns_focus_to_output() {
        let mut s = session(1600.0);
        let mut surface = Surface::default();
        let now = Instant::now();
        assert_eq!(
            s.apply(Command::SelectAllSource, now, &mut surface),
            Effect::SelectAllSource
        );
        assert_eq!(s.focus(), Focus::Source);
        s.apply(Command::ToggleSource, now, &mut surface);
        assert_eq!(s.focus(), Focus::Output);
        assert_eq!(
            s.apply(Command::SelectAllSource, now, &mut surface),
            Effect::None
        );
    }

    #[test]
    fn drag_converts_cells_to_pixels() {
        let mut s = session(1600.0);
        let mut surface = Surface::default();
        let now = Instant::now();
        s.apply(Command::BeginDrag, now, &mut surface);
        assert_eq!(
            s.apply(Command::DragTo(40), now, &mut surface),
            Effect::Relayout
        );
        assert_eq!(s.panel().split_width(), 400.0);
    }

    #[test]
    fn navigation_keys_are_inert_while_editing() {
        let mut s = session(1600.0);
        let mut surface = Surface::default();
        let now = Instant::now();
        s.observe_layout(paginated(1), &mut surface);
        s.apply(Command::Focus(Focus::Source), now, &mut surface);
        let right = InputEvent::Key(key(KeyCode::Right));
        let d = s.handle(&right, HitTarget::Outside, now, &mut surface);
        assert_eq!(d.effect, Effect::Edit(right));
        assert_eq!(s.navigator().index(), 0);
    }

    #[test]
    fn next_deadline_tracks_settle_and_toast() {
        let mut s = session(1600.0);
        let mut surface = Surface::default();
        let now = Instant::now();
        assert_eq!(s.next_deadline(), None);
        s.apply(Command::Navigate(NavCommand::Previous), now, &mut surface);
        assert_eq!(
            s.next_deadline(),
            Some(now + Duration::from_millis(2500))
        );
        s.observe_layout(paginated(1), &mut surface);
        s.apply(Command::Navigate(NavCommand::Next), now, &mut surface);
        assert_eq!(s.next_deadline(), Some(now + Duration::from_millis(150)));
    }
}
