//! `pagemark-core` is the layout and navigation engine behind the `pagemark` viewer.
//!
//! It knows nothing about Markdown. It classifies surface widths into column counts, turns
//! measured output geometry into horizontal snap points, pages between them, and schedules the
//! debounced settle that follows a burst of page turns. It also owns the two-panel layout
//! (source editor beside rendered output) and routes keyboard, pointer, and touch input.
//!
//! ## Design goals
//!
//! - Event-loop agnostic: the host feeds events and calls [`session::Session::tick`].
//! - Time is injected. Every time-dependent call takes an [`std::time::Instant`], so the
//!   debounce and toast timers are deterministic under test.
//! - Units are pixels. A terminal host converts cells with [`config::ViewerConfig::cells_to_px`].
//!
//! ## Getting started
//!
//! - [`session::Session`]: owns every component; start here.
//! - [`snap::compute`]: snap points for a measured multi-column surface.
//! - [`animate::ScrollSurface`]: implement this for whatever actually scrolls.
//! - [`textarea::TextArea`]: the source editor.
pub mod error;

pub mod config;
pub mod theme;

#[cfg(feature = "crossterm")]
pub mod crossterm_input;

pub mod input;
pub mod keymap;
pub mod render;
pub mod viewport;

pub mod animate;
pub mod classify;
pub mod nav;
pub mod panel;
pub mod router;
pub mod schedule;
pub mod session;
pub mod snap;
pub mod textarea;
pub mod toast;
pub mod wake;

pub use error::PagemarkError;
pub use error::PagemarkResult;
