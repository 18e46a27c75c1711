use crate::surface::OutputSurface;
use pagemark_core::PagemarkResult;
use pagemark_core::classify::ColumnCount;
use pagemark_core::config::ViewerConfig;
use pagemark_core::crossterm_input::input_event_from_crossterm;
use pagemark_core::input::InputEvent;
use pagemark_core::render;
use pagemark_core::router::Focus;
use pagemark_core::router::HitTarget;
use pagemark_core::session::Effect;
use pagemark_core::session::LayoutObservation;
use pagemark_core::session::Session;
use pagemark_core::snap::ColumnGeometry;
use pagemark_core::snap::SurfaceGeometry;
use pagemark_core::textarea::TextArea;
use pagemark_core::textarea::TextAreaAction;
use pagemark_core::textarea::TextAreaOptions;
use pagemark_core::theme::Theme;
use pagemark_core::viewport::ViewportState;
use pagemark_core::wake::UnsupportedWakeLock;
use pagemark_markdown::ColumnFlow;
use pagemark_markdown::MarkdownDocument;
use pagemark_markdown::RenderOptions;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::Position;
use ratatui::layout::Rect;
use ratatui::text::Line;
use std::time::Duration;
use std::time::Instant;
use unicode_width::UnicodeWidthStr;

const DIVIDER_CELLS: u16 = 1;
const FRAME_INTERVAL: Duration = Duration::from_millis(16);
const IDLE_POLL: Duration = Duration::from_millis(500);

/// Screen regions from the last frame, for hit-testing pointer events.
#[derive(Clone, Copy, Debug, Default)]
struct Regions {
    body: Rect,
    source: Rect,
    divider: Rect,
    output: Rect,
    toggle: Rect,
}

impl Regions {
    fn hit(&self, x: u16, y: u16) -> HitTarget {
        let p = Position::new(x, y);
        if self.toggle.contains(p) {
            HitTarget::Toggle
        } else if self.divider.contains(p) {
            HitTarget::Divider
        } else if self.source.contains(p) {
            HitTarget::Source
        } else if self.output.contains(p) {
            HitTarget::Output
        } else {
            HitTarget::Outside
        }
    }
}

struct RenderedLines {
    width: u16,
    revision: u64,
    lines: Vec<Line<'static>>,
}

struct FlowedColumns {
    width: u16,
    height: u16,
    revision: u64,
    flow: ColumnFlow,
}

pub struct App {
    session: Session,
    editor: TextArea,
    theme: Theme,
    render_options: RenderOptions,
    document: MarkdownDocument,
    /// Bumped each time the document is re-parsed from the editor.
    revision: u64,
    dirty: bool,
    rendered: Option<RenderedLines>,
    flowed: Option<FlowedColumns>,
    surface: OutputSurface,
    /// Vertical scroll of the output while it is a single column.
    vscroll: ViewportState,
    regions: Regions,
    quit: bool,
}

impl App {
    pub fn new(config: ViewerConfig, source: String, window_cols: u16) -> PagemarkResult<Self> {
        let theme = Theme::default();
        let window_px = config.cells_to_px(window_cols);
        let surface = OutputSurface::new(config.settle_duration);
        let session = Session::new(config, window_px, Box::new(UnsupportedWakeLock))?;

        let mut editor = TextArea::with_options(TextAreaOptions {
            style: theme.text_primary,
            selection_style: theme.selection,
            placeholder: "Type Markdown here…".to_string(),
            placeholder_style: theme.text_muted,
        });
        editor.set_text(source);

        Ok(Self {
            session,
            editor,
            theme,
            render_options: RenderOptions::default(),
            document: MarkdownDocument::default(),
            revision: 0,
            dirty: true,
            rendered: None,
            flowed: None,
            surface,
            vscroll: ViewportState::default(),
            regions: Regions::default(),
            quit: false,
        })
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn toasts_shown(&self) -> u64 {
        self.session.toasts_shown()
    }

    /// Runs due timers and advances the settle tween. Returns `true` if a redraw is needed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let fired = self.session.tick(now, &mut self.surface);
        let moving = self.surface.advance(now);
        fired || moving
    }

    /// How long the event loop may block before the next frame is due.
    pub fn poll_timeout(&self, now: Instant) -> Duration {
        if self.surface.is_animating() {
            return FRAME_INTERVAL;
        }
        self.session
            .next_deadline()
            .map(|d| d.saturating_duration_since(now))
            .unwrap_or(IDLE_POLL)
            .min(IDLE_POLL)
    }

    pub fn handle_event(&mut self, ev: crossterm::event::Event, now: Instant) {
        let Some(input) = input_event_from_crossterm(ev) else {
            return;
        };
        let target = match &input {
            InputEvent::Mouse(m) => self.regions.hit(m.x, m.y),
            _ => HitTarget::Outside,
        };
        let dispatch = self.session.handle(&input, target, now, &mut self.surface);
        self.apply_effect(dispatch.effect);
    }

    fn apply_effect(&mut self, effect: Effect) {
        match effect {
            Effect::None | Effect::Relayout => {}
            Effect::Edit(ev) => {
                if self.editor.input(ev) == TextAreaAction::Changed {
                    self.dirty = true;
                }
            }
            Effect::SelectAllSource => self.editor.select_all(),
            Effect::ScrollLines(n) => {
                if self.session.columns() == ColumnCount::One {
                    self.vscroll.scroll_y_by(n);
                }
            }
            Effect::ScrollScreens(n) => {
                if self.session.columns() == ColumnCount::One {
                    self.vscroll.scroll_screens(n);
                }
            }
            Effect::Quit => self.quit = true,
        }
    }

    pub fn draw(&mut self, frame: &mut Frame<'_>) {
        let area = frame.area();
        let window_px = self.session.config().cells_to_px(area.width);
        self.session.observe_window(window_px);

        let body = Rect {
            height: area.height.saturating_sub(1),
            ..area
        };
        let status = Rect {
            y: area.y + body.height,
            height: area.height.min(1),
            ..area
        };
        self.regions = self.split_panels(body);

        let buf = frame.buffer_mut();
        self.draw_source(buf);
        self.draw_divider(buf);
        self.draw_output(buf);
        self.draw_toast(buf);
        self.draw_status(status, buf);

        if self.session.focus() == Focus::Source
            && let Some(pos) = self.editor.cursor_pos(self.regions.source)
        {
            frame.set_cursor_position(pos);
        }
    }

    fn split_panels(&self, body: Rect) -> Regions {
        let config = self.session.config();
        let geometry = self
            .session
            .panel()
            .resolve(config.cells_to_px(DIVIDER_CELLS));
        let source_w = (config.px_to_cells(geometry.source) as u16).min(body.width);
        let divider_w = (config.px_to_cells(geometry.divider) as u16).min(body.width - source_w);
        let output_w = body.width - source_w - divider_w;
        Regions {
            body,
            source: Rect {
                width: source_w,
                ..body
            },
            divider: Rect {
                x: body.x + source_w,
                width: divider_w,
                ..body
            },
            output: Rect {
                x: body.x + source_w + divider_w,
                width: output_w,
                ..body
            },
            toggle: Rect::default(),
        }
    }

    fn draw_source(&mut self, buf: &mut Buffer) {
        let area = self.regions.source;
        if area.is_empty() {
            return;
        }
        self.editor.render_ref(area, buf);
    }

    fn draw_divider(&self, buf: &mut Buffer) {
        let area = self.regions.divider;
        let style = if self.session.panel().is_dragging() {
            self.theme.divider_active
        } else {
            self.theme.divider
        };
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_symbol("│");
                    cell.set_style(style);
                }
            }
        }
    }

    fn refresh_document(&mut self) {
        if !self.dirty {
            return;
        }
        self.document = MarkdownDocument::parse(&self.editor.text(), &self.render_options);
        self.revision += 1;
        self.dirty = false;
        self.rendered = None;
        self.flowed = None;
        tracing::debug!(
            revision = self.revision,
            math_errors = self.document.math_errors(),
            "document parsed"
        );
    }

    fn lines_at(&mut self, width: u16) -> &[Line<'static>] {
        let stale = self
            .rendered
            .as_ref()
            .is_none_or(|r| r.width != width || r.revision != self.revision);
        if stale {
            self.rendered = Some(RenderedLines {
                width,
                revision: self.revision,
                lines: self.document.render(width, &self.theme),
            });
        }
        self.rendered.as_ref().map(|r| r.lines.as_slice()).unwrap_or(&[])
    }

    fn flow_at(&mut self, width: u16, height: u16) -> usize {
        let stale = self.flowed.as_ref().is_none_or(|f| {
            f.width != width || f.height != height || f.revision != self.revision
        });
        if stale {
            let lines = self.lines_at(width).to_vec();
            self.flowed = Some(FlowedColumns {
                width,
                height,
                revision: self.revision,
                flow: ColumnFlow::new(lines, height),
            });
        }
        self.flowed.as_ref().map(|f| f.flow.len()).unwrap_or(0)
    }

    fn draw_output(&mut self, buf: &mut Buffer) {
        let area = self.regions.output;
        render::clear(area, buf, self.theme.text_primary);
        if area.is_empty() {
            // nothing is mounted; snap points wait for the next frame with an output surface
            return;
        }
        self.refresh_document();

        let (cell, pad, gap) = {
            let c = self.session.config();
            (
                c.cell_width_px,
                c.output_padding_cells.min(area.width / 2),
                c.column_gap_cells,
            )
        };
        let client_px = area.width as f64 * cell;
        let padding_px = 2.0 * pad as f64 * cell;
        let gap_px = gap as f64 * cell;

        let columns = self.session.observe_output_width(client_px - padding_px);
        let geometry = ColumnGeometry::new(client_px, padding_px, gap_px, columns);

        if columns == ColumnCount::One {
            let width = area.width - 2 * pad;
            let total = self.lines_at(width).len() as u32;
            self.vscroll.set_viewport(width, area.height);
            self.vscroll.set_content(width as u32, total);
            let observation = LayoutObservation {
                geometry: SurfaceGeometry {
                    client_width: client_px,
                    padding_x: padding_px,
                    column_gap: gap_px,
                    scroll_width: client_px,
                },
                columns,
                content_revision: self.revision,
            };
            self.session.observe_layout(observation, &mut self.surface);

            let top = self.vscroll.y as usize;
            let Some(rendered) = self.rendered.as_ref() else {
                return;
            };
            for (row, line) in rendered.lines.iter().skip(top).take(area.height as usize).enumerate() {
                render::render_spans_clipped(
                    area.x + pad,
                    area.y + row as u16,
                    0,
                    width,
                    buf,
                    &line.spans,
                    self.theme.text_primary,
                );
            }
            return;
        }

        let col_cells = ((geometry.column_width / cell).floor() as u16).max(1);
        let count = self.flow_at(col_cells, area.height);
        let observation = LayoutObservation {
            geometry: SurfaceGeometry {
                client_width: client_px,
                padding_x: padding_px,
                column_gap: gap_px,
                scroll_width: geometry.scroll_width_for(count, padding_px),
            },
            columns,
            content_revision: self.revision,
        };
        self.session.observe_layout(observation, &mut self.surface);

        let Some(flowed) = self.flowed.as_ref() else {
            return;
        };
        let offset = (self.surface.offset_px() / cell).round() as i64;
        for (k, column) in flowed.flow.iter().enumerate() {
            let start = pad as i64 + (k as f64 * geometry.stride / cell).round() as i64 - offset;
            let end = start + col_cells as i64;
            if end <= 0 || start >= area.width as i64 {
                continue;
            }
            let skip = (-start).max(0) as u32;
            let x = area.x + start.max(0) as u16;
            let max_cols = (col_cells as u32 - skip).min((area.right() - x) as u32) as u16;
            for (row, line) in column.iter().enumerate() {
                render::render_spans_clipped(
                    x,
                    area.y + row as u16,
                    skip,
                    max_cols,
                    buf,
                    &line.spans,
                    self.theme.text_primary,
                );
            }
        }
    }

    fn draw_toast(&self, buf: &mut Buffer) {
        let Some(message) = self.session.toast() else {
            return;
        };
        let area = if self.regions.output.is_empty() {
            self.regions.body
        } else {
            self.regions.output
        };
        if area.is_empty() {
            return;
        }
        let text = format!(" {message} ");
        let w = (UnicodeWidthStr::width(text.as_str()) as u16).min(area.width);
        let x = area.x + (area.width - w) / 2;
        let y = area.bottom() - 1;
        render::render_str_clipped(x, y, 0, w, buf, &text, self.theme.toast);
    }

    fn draw_status(&mut self, area: Rect, buf: &mut Buffer) {
        render::clear(area, buf, self.theme.status);
        if area.is_empty() {
            self.regions.toggle = Rect::default();
            return;
        }

        let toggle = if self.session.panel().source_visible() {
            "[—]"
        } else {
            "[+]"
        };
        let toggle_w = UnicodeWidthStr::width(toggle) as u16;
        let toggle_area = Rect {
            x: area.right().saturating_sub(toggle_w),
            width: toggle_w.min(area.width),
            ..area
        };
        self.regions.toggle = toggle_area;
        render::render_str_clipped(
            toggle_area.x,
            area.y,
            0,
            toggle_area.width,
            buf,
            toggle,
            self.theme.accent,
        );

        let nav = self.session.navigator();
        let position = match self.session.columns() {
            ColumnCount::One => match self.vscroll.percent_y() {
                Some(pct) => format!("{pct}%"),
                None => "all".to_string(),
            },
            _ => format!("page {}/{}", nav.index() + 1, nav.page_count()),
        };
        let focus = match self.session.focus() {
            Focus::Source => "editing",
            Focus::Output => "reading",
        };
        let left = format!(
            " {position} · {} col · {focus}",
            self.session.columns().get()
        );
        let left_w = UnicodeWidthStr::width(left.as_str()) as u16;
        let room = area.width.saturating_sub(toggle_w);
        render::render_str_clipped(area.x, area.y, 0, room, buf, &left, self.theme.status);

        let help = self
            .session
            .bindings()
            .help()
            .into_iter()
            .map(|b| format!("{} {}", b.help_key, b.help_desc))
            .collect::<Vec<_>>()
            .join("  ");
        let help = format!("{help}  ");
        let help_w = UnicodeWidthStr::width(help.as_str()) as u16;
        if left_w + 2 + help_w <= room {
            render::render_str_clipped(
                area.x + room - help_w,
                area.y,
                0,
                help_w,
                buf,
                &help,
                self.theme.text_muted,
            );
        }
    }
}
