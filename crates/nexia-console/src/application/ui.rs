use std::io;
use std::path::PathBuf;

use anyhow::Result;
use crossterm::cursor;
use crossterm::event::DisableBracketedPaste;
use crossterm::event::DisableMouseCapture;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::LeaveAlternateScreen;
use ratatui::backend::Backend;
use ratatui::layout::Constraint;
use ratatui::layout::Layout;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use ratatui::Terminal;
use tokio::fs;
use tui_textarea::TextArea;

use crate::domain::models::ExecutionOutcome;
use crate::domain::models::OutputKind;
use crate::domain::models::OutputLog;
use crate::domain::models::RuntimeStatus;
use crate::domain::models::UiEvent;
use crate::domain::services::events::EventsService;
use crate::domain::services::Console;

#[cfg(test)]
#[path = "ui_test.rs"]
mod tests;

const HOTKEYS: &str = "F5/Ctrl+R run · Enter submit input · Ctrl+L clear · Esc quit";

/// Output pane scroll position. `None` follows the newest output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Scroll {
    top: Option<usize>,
    total: usize,
    height: usize,
}

impl Scroll {
    fn max_top(&self) -> usize {
        self.total.saturating_sub(self.height)
    }

    pub fn set_state(&mut self, total: usize, height: usize) {
        self.total = total;
        self.height = height;
        if let Some(top) = self.top {
            if top >= self.max_top() {
                self.top = None;
            }
        }
    }

    pub fn position(&self) -> usize {
        self.top.unwrap_or_else(|| self.max_top())
    }

    pub fn is_following(&self) -> bool {
        self.top.is_none()
    }

    pub fn up(&mut self, lines: usize) {
        self.top = Some(self.position().saturating_sub(lines));
    }

    pub fn down(&mut self, lines: usize) {
        let top = self.position() + lines;
        if top >= self.max_top() {
            self.top = None;
        } else {
            self.top = Some(top);
        }
    }

    pub fn last(&mut self) {
        self.top = None;
    }
}

/// Interactive state around a [`Console`]: the file being worked on, the input
/// line and the output scroll.
pub struct ConsoleView<'a> {
    source_path: PathBuf,
    textarea: TextArea<'a>,
    pub scroll: Scroll,
    pub notice: Option<String>,
    pub last_outcome: Option<ExecutionOutcome>,
    run_when_ready: bool,
}

impl<'a> ConsoleView<'a> {
    pub fn new(source_path: PathBuf) -> ConsoleView<'a> {
        return ConsoleView {
            source_path,
            textarea: new_textarea(),
            scroll: Scroll::default(),
            notice: None,
            last_outcome: None,
            run_when_ready: true,
        };
    }

    pub fn input_text(&self) -> String {
        self.textarea.lines().join("")
    }

    /// Re-reads the source file and starts a run with it.
    pub async fn run_source(&mut self, console: &mut Console) -> Result<()> {
        let source = match fs::read_to_string(&self.source_path).await {
            Ok(source) => source,
            Err(err) => {
                tracing::error!(path = %self.source_path.display(), error = %err, "failed to read source");
                self.notice = Some(format!(
                    "Could not read {}: {err}",
                    self.source_path.display()
                ));
                return Ok(());
            }
        };

        self.notice = None;
        self.scroll.last();
        if let Err(reason) = console.run(&source) {
            tracing::debug!(reason = %reason, "run from ui rejected");
        }

        return Ok(());
    }

    /// Applies one event. Returns true when the loop should stop.
    pub async fn handle(&mut self, console: &mut Console, event: UiEvent) -> Result<bool> {
        match event {
            UiEvent::Console(event) => {
                if let Some(outcome) = console.handle_event(event) {
                    self.last_outcome = Some(outcome);
                }
                if self.run_when_ready && console.is_ready() {
                    self.run_when_ready = false;
                    self.run_source(console).await?;
                }
            }
            UiEvent::KeyboardCTRLC | UiEvent::KeyboardEsc => {
                return Ok(true);
            }
            UiEvent::KeyboardCTRLL => {
                console.clear();
                self.textarea = new_textarea();
                self.last_outcome = None;
                self.notice = None;
                self.scroll.last();
            }
            UiEvent::KeyboardCTRLR => {
                self.run_source(console).await?;
            }
            UiEvent::KeyboardEnter => {
                if console.is_awaiting_input() {
                    let line = self.input_text();
                    self.textarea = new_textarea();
                    if let Err(err) = console.submit_input_line(&line) {
                        tracing::debug!(error = %err, "input line dropped");
                    }
                    self.scroll.last();
                }
            }
            UiEvent::KeyboardCharInput(input) => {
                if console.is_awaiting_input() {
                    self.textarea.input(input);
                }
            }
            UiEvent::KeyboardPaste(text) => {
                if console.is_awaiting_input() {
                    let first_line = text.lines().next().unwrap_or_default();
                    self.textarea.insert_str(first_line);
                }
            }
            UiEvent::UIScrollUp => self.scroll.up(1),
            UiEvent::UIScrollDown => self.scroll.down(1),
            UiEvent::UIScrollPageUp => self.scroll.up(self.scroll.height.max(1)),
            UiEvent::UIScrollPageDown => self.scroll.down(self.scroll.height.max(1)),
            UiEvent::UITick => {}
        }

        return Ok(false);
    }
}

fn new_textarea<'a>() -> TextArea<'a> {
    let mut textarea = TextArea::default();
    textarea.set_cursor_line_style(Style::default());
    textarea.set_placeholder_text("Type a line and press Enter");
    return textarea;
}

fn kind_style(kind: OutputKind) -> Style {
    match kind {
        OutputKind::Status => Style::default().fg(Color::Cyan),
        OutputKind::Stdout => Style::default(),
        OutputKind::Stderr => Style::default().fg(Color::Red),
        OutputKind::Prompt => Style::default().add_modifier(Modifier::BOLD),
        OutputKind::Echo => Style::default().fg(Color::Green),
        OutputKind::Warning => Style::default().fg(Color::Yellow),
        OutputKind::Error => Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::BOLD),
    }
}

/// Splits the log into styled terminal lines. A fragment without a trailing
/// line break continues on the same line as the next fragment.
pub fn output_lines(log: &OutputLog) -> Vec<Line<'static>> {
    let mut lines = vec![];
    let mut current: Vec<Span<'static>> = vec![];

    for fragment in log.fragments() {
        let style = kind_style(fragment.kind);
        let rendered = fragment.render();
        let mut parts = rendered.split('\n').peekable();
        while let Some(part) = parts.next() {
            if !part.is_empty() {
                current.push(Span::styled(part.to_string(), style));
            }
            if parts.peek().is_some() {
                lines.push(Line::from(std::mem::take(&mut current)));
            }
        }
    }

    if !current.is_empty() {
        lines.push(Line::from(current));
    }

    return lines;
}

fn status_label(console: &Console) -> String {
    match console.runtime_status() {
        RuntimeStatus::Unmounted => "No runtime".to_string(),
        RuntimeStatus::Loading => "Loading runtime…".to_string(),
        RuntimeStatus::Ready => console
            .runtime_description()
            .unwrap_or_else(|| "Ready".to_string()),
        RuntimeStatus::Failed(_) => "Runtime failed to load".to_string(),
    }
}

fn render_header(frame: &mut Frame, area: Rect, console: &Console, view: &ConsoleView) {
    let mut spans = vec![
        Span::styled(
            " Nexia console ",
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("· {} ", status_label(console))),
        Span::styled(
            format!("· {} ", view.source_path.display()),
            Style::default().fg(Color::DarkGray),
        ),
    ];

    if console.is_running() {
        spans.push(Span::styled(
            "· Running…",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_output(frame: &mut Frame, area: Rect, console: &Console, view: &mut ConsoleView) {
    let lines = output_lines(console.log());
    let inner_height = area.height.saturating_sub(2) as usize;
    view.scroll.set_state(lines.len(), inner_height);

    let title = if view.scroll.is_following() {
        " Output "
    } else {
        " Output (scrolled) "
    };

    let scroll = u16::try_from(view.scroll.position()).unwrap_or(u16::MAX);
    let widget = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .scroll((scroll, 0));
    frame.render_widget(widget, area);
}

fn render_input(frame: &mut Frame, area: Rect, console: &Console, view: &mut ConsoleView) {
    let title = match console.pending_prompt() {
        Some(prompt) => format!(" Input: {} ", prompt.trim()),
        None => " Input ".to_string(),
    };
    view.textarea.set_block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green))
            .title(title),
    );
    frame.render_widget(&view.textarea, area);
}

fn render_footer(frame: &mut Frame, area: Rect, view: &ConsoleView) {
    let line = if let Some(notice) = &view.notice {
        Line::from(Span::styled(notice.clone(), Style::default().fg(Color::Red)))
    } else if let Some(outcome) = &view.last_outcome {
        let (label, style) = if outcome.success {
            ("Last run succeeded", Style::default().fg(Color::Green))
        } else {
            ("Last run failed", Style::default().fg(Color::Red))
        };
        Line::from(vec![
            Span::styled(label, style),
            Span::styled(
                format!(" · {HOTKEYS}"),
                Style::default().fg(Color::DarkGray),
            ),
        ])
    } else {
        Line::from(Span::styled(HOTKEYS, Style::default().fg(Color::DarkGray)))
    };

    frame.render_widget(Paragraph::new(line), area);
}

pub fn draw(frame: &mut Frame, console: &Console, view: &mut ConsoleView) {
    let input_height = if console.is_awaiting_input() { 3 } else { 0 };
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(input_height),
        Constraint::Length(1),
    ])
    .split(frame.area());

    render_header(frame, chunks[0], console, view);
    render_output(frame, chunks[1], console, view);
    if console.is_awaiting_input() {
        render_input(frame, chunks[2], console, view);
    }
    render_footer(frame, chunks[3], view);
}

pub async fn start_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    console: &mut Console,
    source_path: PathBuf,
) -> Result<()> {
    let mut view = ConsoleView::new(source_path);
    let mut events = EventsService::new();

    loop {
        terminal.draw(|frame| draw(frame, console, &mut view))?;

        let event = events.next(console).await?;
        if view.handle(console, event).await? {
            break;
        }
    }

    return Ok(());
}

pub fn destruct_terminal_for_panic() {
    let _ = disable_raw_mode();
    let _ = crossterm::execute!(
        io::stdout(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    );
    let _ = crossterm::execute!(io::stdout(), cursor::Show);
}
