use pagemark_core::animate::ScrollSurface;
use pagemark_core::classify::ColumnCount;
use pagemark_core::classify::DeviceClass;
use pagemark_core::config::ViewerConfig;
use pagemark_core::input::InputEvent;
use pagemark_core::input::KeyCode;
use pagemark_core::input::TouchEvent;
use pagemark_core::input::TouchPhase;
use pagemark_core::keymap::key;
use pagemark_core::keymap::key_ctrl;
use pagemark_core::router::HitTarget;
use pagemark_core::session::Effect;
use pagemark_core::session::LayoutObservation;
use pagemark_core::session::Session;
use pagemark_core::snap::SurfaceGeometry;
use pagemark_core::wake::WakeLock;
use pagemark_core::PagemarkResult;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use std::time::Instant;

#[derive(Default)]
struct RecordingSurface {
    offset: u32,
    jumps: Vec<u32>,
    smooths: Vec<u32>,
}

impl ScrollSurface for RecordingSurface {
    fn jump_to(&mut self, offset: u32) {
        self.offset = offset;
        self.jumps.push(offset);
    }

    fn smooth_to(&mut self, offset: u32, _now: Instant) {
        self.offset = offset;
        self.smooths.push(offset);
    }
}

struct CountingWakeLock(Rc<Cell<u32>>);

impl WakeLock for CountingWakeLock {
    fn request(&mut self) -> PagemarkResult<()> {
        self.0.set(self.0.get() + 1);
        Ok(())
    }
}

fn session(width: f64) -> Session {
    Session::new(
        ViewerConfig::default(),
        width,
        Box::new(CountingWakeLock(Rc::default())),
    )
    .expect("default config is valid")
}

fn four_column_layout(revision: u64) -> LayoutObservation {
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

fn press(
    s: &mut Session,
    code: KeyCode,
    now: Instant,
    surface: &mut RecordingSurface,
) -> Effect {
    s.handle(&InputEvent::Key(key(code)), HitTarget::Output, now, surface)
        .effect
}

fn touch(phase: TouchPhase, active: u8) -> InputEvent {
    InputEvent::Touch(TouchEvent {
        phase,
        active,
        x: 10,
        y: 10,
    })
}

#[test]
fn wide_output_gets_four_columns() {
    let mut s = session(3200.0);
    assert_eq!(s.observe_output_width(1600.0), ColumnCount::Four);
    assert_eq!(s.observe_output_width(1500.0), ColumnCount::Three);
    assert_eq!(s.observe_output_width(699.0), ColumnCount::One);
}

#[test]
fn paging_walks_the_snap_points() {
    let mut s = session(1600.0);
    let mut surface = RecordingSurface::default();
    let t0 = Instant::now();
    assert!(s.observe_layout(four_column_layout(1), &mut surface));
    assert_eq!(
        s.navigator().points().as_slice(),
        &[0, 240, 480, 720, 960, 1200, 1440, 1680, 1920, 2160, 2400, 2640, 2880, 3000]
    );

    press(&mut s, KeyCode::Right, t0, &mut surface);
    assert_eq!(s.navigator().index(), 1);
    assert_eq!(surface.offset, 240);

    press(&mut s, KeyCode::Left, t0, &mut surface);
    assert_eq!(s.navigator().index(), 0);
    assert_eq!(surface.offset, 0);
}

#[test]
fn a_burst_of_page_turns_settles_once() {
    let mut s = session(1600.0);
    let mut surface = RecordingSurface::default();
    let t0 = Instant::now();
    s.observe_layout(four_column_layout(1), &mut surface);

    for i in 0..5 {
        let now = t0 + Duration::from_millis(50 * i);
        press(&mut s, KeyCode::Char('l'), now, &mut surface);
        assert!(!s.tick(now, &mut surface));
    }
    assert_eq!(s.navigator().index(), 5);
    assert_eq!(&surface.jumps[1..], &[240, 480, 720, 960, 1200]);

    let last = t0 + Duration::from_millis(200);
    assert_eq!(s.next_deadline(), Some(last + Duration::from_millis(150)));
    assert!(!s.tick(last + Duration::from_millis(149), &mut surface));
    assert!(s.tick(last + Duration::from_millis(150), &mut surface));
    assert_eq!(surface.smooths, vec![1200]);
}

#[test]
fn boundary_shows_one_toast_for_its_duration() {
    let mut s = session(1600.0);
    let mut surface = RecordingSurface::default();
    let t0 = Instant::now();
    s.observe_layout(four_column_layout(1), &mut surface);
    for _ in 0..13 {
        press(&mut s, KeyCode::Right, t0, &mut surface);
    }
    assert_eq!(s.navigator().index(), 13);
    assert_eq!(s.toasts_shown(), 0);

    press(&mut s, KeyCode::Right, t0, &mut surface);
    assert_eq!(s.navigator().index(), 13);
    assert_eq!(s.toasts_shown(), 1);
    assert_eq!(s.toast(), Some("boundary reached"));

    s.tick(t0 + Duration::from_millis(2499), &mut surface);
    assert!(s.toast().is_some());
    s.tick(t0 + Duration::from_millis(2500), &mut surface);
    assert_eq!(s.toast(), None);
}

#[test]
fn previous_on_the_first_page_only_toasts() {
    let mut s = session(1600.0);
    let mut surface = RecordingSurface::default();
    let t0 = Instant::now();
    s.observe_layout(four_column_layout(1), &mut surface);
    let jumps = surface.jumps.len();
    press(&mut s, KeyCode::Char('h'), t0, &mut surface);
    assert_eq!(s.navigator().index(), 0);
    assert_eq!(s.toasts_shown(), 1);
    assert_eq!(surface.jumps.len(), jumps);
    assert_eq!(s.pending_settle(), None);
}

#[test]
fn device_transition_resets_the_panels_once() {
    let mut s = session(1600.0);
    let mut surface = RecordingSurface::default();
    let t0 = Instant::now();
    assert!(s.panel().source_visible());
    let toggled = s.handle(
        &InputEvent::Key(key_ctrl('b')),
        HitTarget::Output,
        t0,
        &mut surface,
    );
    assert_eq!(toggled.effect, Effect::Relayout);
    assert!(!s.panel().source_visible());

    assert_eq!(s.observe_window(500.0), Some(DeviceClass::Narrow));
    assert!(!s.panel().source_visible());
    assert_eq!(s.observe_window(400.0), None);

    assert_eq!(s.observe_window(1200.0), Some(DeviceClass::Wide));
    assert!(s.panel().source_visible());
    assert_eq!(s.observe_window(1300.0), None);
}

#[test]
fn two_finger_tap_toggles_the_source_on_narrow_devices() {
    let mut s = session(400.0);
    let mut surface = RecordingSurface::default();
    let t0 = Instant::now();
    assert!(!s.panel().source_visible());

    s.handle(&touch(TouchPhase::Start, 1), HitTarget::Output, t0, &mut surface);
    s.handle(&touch(TouchPhase::Start, 2), HitTarget::Output, t0, &mut surface);
    let later = t0 + Duration::from_millis(120);
    s.handle(&touch(TouchPhase::End, 1), HitTarget::Output, later, &mut surface);
    let lifted = s.handle(&touch(TouchPhase::End, 0), HitTarget::Output, later, &mut surface);
    assert!(lifted.suppress_default);
    assert_eq!(lifted.effect, Effect::Relayout);
    assert!(s.panel().source_visible());
}

#[test]
fn a_slow_two_finger_touch_is_not_a_tap() {
    let mut s = session(400.0);
    let mut surface = RecordingSurface::default();
    let t0 = Instant::now();
    s.handle(&touch(TouchPhase::Start, 2), HitTarget::Output, t0, &mut surface);
    let late = t0 + Duration::from_millis(800);
    s.handle(&touch(TouchPhase::End, 0), HitTarget::Output, late, &mut surface);
    assert!(!s.panel().source_visible());
}

#[test]
fn regaining_visibility_requests_the_wake_lock_again() {
    let calls = Rc::new(Cell::new(0));
    let mut s = Session::new(
        ViewerConfig::default(),
        1600.0,
        Box::new(CountingWakeLock(calls.clone())),
    )
    .expect("default config is valid");
    let mut surface = RecordingSurface::default();
    let t0 = Instant::now();
    assert_eq!(calls.get(), 1);
    assert!(s.wake_lock().is_held());

    s.handle(&InputEvent::Visibility(false), HitTarget::Outside, t0, &mut surface);
    assert!(!s.wake_lock().is_held());
    s.handle(&InputEvent::Visibility(true), HitTarget::Outside, t0, &mut surface);
    assert_eq!(calls.get(), 2);
    assert!(s.wake_lock().is_held());
}
