//! Terminal window showing the latest gas resistance reading.
//!
//! Run with: cargo run --bin gas_monitor
//!
//! Connects to `SPR-GAS-SENSOR` on a background thread and keeps receiving
//! until the window is closed. The display shows the most recent value and a
//! red warning whenever it is at or below 90. Logs go to `gas_monitor.log`
//! so they don't tear the screen.
//!
//! ## Keyboard Controls
//!
//! | Key | Action |
//! |-----|--------|
//! | `Q/Esc` | Quit |

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};
use spresense_link::ble::{self, shutdown_channel};
use spresense_link::{
    BleConfig, Decoder, Dispatcher, Error, Grammar, Result, SessionSummary, UiSink, UiState,
    UiUpdate,
};
use std::fs::File;
use std::io::{self, stdout, Stdout};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "gas_monitor.log";

type Terminal = ratatui::Terminal<CrosstermBackend<Stdout>>;

fn setup_terminal() -> io::Result<Terminal> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

fn restore_terminal(terminal: &mut Terminal) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}

fn init_file_logging() -> Result<()> {
    let file = File::create(LOG_FILE)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

/// Run the BLE session on its own thread and runtime so the draw loop never
/// waits on it.
fn spawn_receiver(
    dispatcher: Dispatcher,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<Result<SessionSummary>> {
    thread::spawn(move || {
        let mut dispatcher = dispatcher;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        // Receive until the window is closed.
        let config = BleConfig::gas_sensor().with_receive_window(Duration::MAX);
        let decoder = Decoder::new(Grammar::Ble);

        runtime.block_on(ble::receive(&config, &decoder, &mut dispatcher, shutdown))
    })
}

fn status_line(receiver: &JoinHandle<Result<SessionSummary>>, state: &UiState) -> String {
    if receiver.is_finished() {
        format!("Receiver stopped after {} reading(s), see {}", state.update_count(), LOG_FILE)
    } else if state.update_count() == 0 {
        "Waiting for SPR-GAS-SENSOR...".to_string()
    } else {
        format!("{} reading(s) received", state.update_count())
    }
}

fn draw(frame: &mut Frame, state: &UiState, status: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Min(1),
        ])
        .split(frame.area());

    let value = match state.value() {
        Some(v) => format!("{} {}", v, state.unit()),
        None => "--".to_string(),
    };
    let value_widget = Paragraph::new(Line::from(Span::styled(
        value,
        Style::default().add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Gas Resistance "),
    );
    frame.render_widget(value_widget, chunks[0]);

    let warning_widget = Paragraph::new(Span::styled(
        state.warning(),
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(warning_widget, chunks[1]);

    let status_widget = Paragraph::new(vec![
        Line::from(Span::styled(status, Style::default().fg(Color::DarkGray))),
        Line::from(Span::raw("[Q] Quit")),
    ]);
    frame.render_widget(status_widget, chunks[2]);
}

fn run_ui(
    terminal: &mut Terminal,
    state: &mut UiState,
    updates: &mut UnboundedReceiver<UiUpdate>,
    receiver: &JoinHandle<Result<SessionSummary>>,
) -> Result<()> {
    loop {
        state.drain(updates);
        let status = status_line(receiver, state);
        terminal.draw(|frame| draw(frame, state, &status))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press
                    && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
                {
                    return Ok(());
                }
            }
        }
    }
}

fn main() -> Result<()> {
    init_file_logging()?;

    let (ui_sink, mut updates) = UiSink::channel();
    let (stop_tx, shutdown) = shutdown_channel();
    let receiver = spawn_receiver(Dispatcher::new().with_sink(ui_sink), shutdown);

    let mut terminal = setup_terminal()?;
    let mut state = UiState::new();

    let ui_result = run_ui(&mut terminal, &mut state, &mut updates, &receiver);

    restore_terminal(&mut terminal)?;

    info!("Window closed, stopping receiver");
    let _ = stop_tx.send(true);

    let outcome = receiver
        .join()
        .map_err(|_| Error::Internal("Receiver thread panicked".to_string()))?;
    match outcome {
        Ok(summary) => info!(
            "Received {} notification(s), {} decoded, {} dropped",
            summary.received, summary.decoded, summary.dropped
        ),
        Err(ref e) => error!("BLE Error: {}", e),
    }

    ui_result
}
