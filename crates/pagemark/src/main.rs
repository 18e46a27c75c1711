mod app;
mod surface;

use anyhow::Context;
use app::App;
use clap::Parser;
use crossterm::event::DisableBracketedPaste;
use crossterm::event::DisableFocusChange;
use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableBracketedPaste;
use crossterm::event::EnableFocusChange;
use crossterm::event::EnableMouseCapture;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use pagemark_core::config::ViewerConfig;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::fs::File;
use std::io;
use std::io::Stdout;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

const DEFAULT_DOCUMENT: &str = include_str!("sample.md");

#[derive(Parser, Debug)]
#[command(
    name = "pagemark",
    version,
    about = "Live Markdown + math viewer with a paginated multi-column layout"
)]
struct Cli {
    /// Markdown file to open in the editor. Read once; never written back.
    file: Option<PathBuf>,
    /// Width of one terminal cell in pixels; scales every layout threshold.
    #[arg(long, default_value_t = 10.0)]
    cell_width: f64,
    /// Quiet period before a page turn settles, in milliseconds.
    #[arg(long, default_value_t = 150)]
    settle_ms: u64,
    /// How long the boundary notice stays up, in milliseconds.
    #[arg(long, default_value_t = 2500)]
    toast_ms: u64,
    /// Write logs to this file. Nothing is logged without it.
    #[arg(long)]
    log_file: Option<PathBuf>,
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

impl Cli {
    fn config(&self) -> ViewerConfig {
        ViewerConfig {
            cell_width_px: self.cell_width,
            settle_delay: Duration::from_millis(self.settle_ms),
            toast_duration: Duration::from_millis(self.toast_ms),
            ..ViewerConfig::default()
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config = cli.config();
    config.validate().context("invalid options")?;

    let source = match &cli.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?,
        None => DEFAULT_DOCUMENT.to_string(),
    };

    let (cols, _rows) = crossterm::terminal::size().context("query terminal size")?;
    let mut app = App::new(config, source, cols)?;

    let mut terminal = setup_terminal().inspect_err(|_| restore_terminal_best_effort())?;
    let res = run(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;
    tracing::info!(toasts = app.toasts_shown(), "exit");
    res
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let Some(path) = &cli.log_file else {
        return Ok(());
    };
    let file = File::create(path).with_context(|| format!("create log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(cli.log_level)
        .init();
    Ok(())
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange,
        EnableBracketedPaste
    )
    .context("enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("create terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    disable_raw_mode().context("disable raw mode")?;
    crossterm::execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen
    )
    .context("leave alternate screen")?;
    terminal.show_cursor().context("show cursor")?;
    Ok(())
}

fn restore_terminal_best_effort() {
    let _ = disable_raw_mode();
    let mut stdout = io::stdout();
    let _ = crossterm::execute!(
        stdout,
        DisableBracketedPaste,
        DisableFocusChange,
        DisableMouseCapture,
        LeaveAlternateScreen
    );
}

fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> anyhow::Result<()> {
    loop {
        app.tick(Instant::now());
        terminal.draw(|f| app.draw(f)).context("draw frame")?;
        if app.should_quit() {
            return Ok(());
        }

        let timeout = app.poll_timeout(Instant::now());
        if crossterm::event::poll(timeout).context("poll terminal events")? {
            let ev = crossterm::event::read().context("read terminal event")?;
            app.handle_event(ev, Instant::now());
        }
    }
}
