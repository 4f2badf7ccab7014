use std::{
    io,
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use tracing::{info, warn};

use docpatch_tui::config::{Cli, init_logging};
use docpatch_tui::editor::TextEditor;
use docpatch_tui::render::{EditorViewport, render_editor, render_preview};
use docpatch_tui::session::Phase;
use docpatch_tui::text_map::{paragraph_changes, summarize_changes};
use docpatch_tui::theme::Theme;
use docpatch_tui::{HttpGateway, Notice, SessionController};

const STATUS_TIMEOUT: Duration = Duration::from_secs(4);
const TICK_RATE: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    run()
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let gateway = HttpGateway::new(cli.api_base.clone()).context("failed to set up HTTP client")?;
    if gateway.base_url().is_none() {
        warn!("no document service configured; uploads will fail until one is set");
    }
    let controller = SessionController::new(gateway, cli.output_dir.clone());
    let mut app = App::new(controller);
    if let Some(path) = &cli.file {
        app.submit_path(path.clone());
    }

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)
        .context("failed to initialize terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().ok();

    let res = run_app(&mut terminal, &mut app).context("application error");

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableBracketedPaste
    )
    .ok();
    terminal.show_cursor().ok();

    res
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let mut last_tick = Instant::now();
    let mut needs_redraw = true;

    while !app.should_quit() {
        if needs_redraw {
            terminal
                .draw(|frame| app.draw(frame))
                .context("failed to draw frame")?;
            needs_redraw = false;
        }

        let timeout = TICK_RATE
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout).context("event poll failed")? {
            let evt = event::read().context("failed to read event")?;
            app.handle_event(evt);
            needs_redraw = true;
        }

        if app.sync_session() {
            needs_redraw = true;
        }

        if last_tick.elapsed() >= TICK_RATE {
            let had_message_before = app.has_status_message();
            app.on_tick();
            last_tick = Instant::now();
            if had_message_before && !app.has_status_message() {
                needs_redraw = true;
            }
        }
    }

    Ok(())
}

/// Path typed or dropped into the upload panel. Terminals quote dropped
/// paths that contain spaces.
fn clean_dropped_path(raw: &str) -> Option<PathBuf> {
    let trimmed = raw.trim();
    let unquoted = ['\'', '"']
        .iter()
        .find_map(|quote| {
            trimmed
                .strip_prefix(*quote)
                .and_then(|rest| rest.strip_suffix(*quote))
        })
        .unwrap_or(trimmed);
    let unprefixed = unquoted.strip_prefix("file://").unwrap_or(unquoted);
    if unprefixed.is_empty() {
        None
    } else {
        Some(PathBuf::from(unprefixed))
    }
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    )
}

/// Popup height for `message` wrapped at `width`: body, blank line, hint
/// and borders. Saturates instead of overflowing on huge messages.
fn alert_height(message: &str, width: u16) -> u16 {
    let text_width = usize::from(width.saturating_sub(4).max(1));
    let body_lines = message.chars().count().div_ceil(text_width).max(1);
    u16::try_from(body_lines)
        .unwrap_or(u16::MAX)
        .saturating_add(4)
}

struct App {
    controller: SessionController<HttpGateway>,
    theme: Theme,
    editor: TextEditor,
    editor_loaded: bool,
    viewport: EditorViewport,
    preview_scroll: u16,
    last_view_height: usize,
    upload_input: String,
    upload_error: Option<String>,
    alert: Option<String>,
    status_message: Option<(String, Instant)>,
    should_quit: bool,
}

impl App {
    fn new(controller: SessionController<HttpGateway>) -> Self {
        Self {
            controller,
            theme: Theme::new(),
            editor: TextEditor::default(),
            editor_loaded: false,
            viewport: EditorViewport::default(),
            preview_scroll: 0,
            last_view_height: 1,
            upload_input: String::new(),
            upload_error: None,
            alert: None,
            status_message: None,
            should_quit: false,
        }
    }

    fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn has_status_message(&self) -> bool {
        self.status_message.is_some()
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    fn submit_path(&mut self, path: PathBuf) {
        match self.controller.open_path(&path) {
            Ok(()) => {
                self.upload_error = None;
                self.upload_input.clear();
            }
            Err(err) => {
                info!(path = %path.display(), error = %err, "upload rejected");
                self.upload_error = Some(err.to_string());
            }
        }
    }

    /// Apply finished requests and pick up notices. Returns whether
    /// anything visible changed.
    fn sync_session(&mut self) -> bool {
        let handled = self.controller.poll();
        let mut changed = handled > 0;

        for notice in self.controller.drain_notices() {
            changed = true;
            match notice {
                Notice::Alert(message) => self.alert = Some(message),
                Notice::Saved { path } => self.set_status(format!("Saved {}", path.display())),
            }
        }

        match self.controller.state().loaded() {
            Some(loaded) if !self.editor_loaded => {
                self.editor = TextEditor::new(loaded.edited_text());
                self.editor_loaded = true;
                self.viewport = EditorViewport::default();
                self.preview_scroll = 0;
                changed = true;
            }
            None if self.editor_loaded => {
                self.editor = TextEditor::default();
                self.editor_loaded = false;
                changed = true;
            }
            _ => {}
        }
        changed
    }

    fn on_tick(&mut self) {
        if let Some((_, instant)) = &self.status_message {
            if instant.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
            }
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) => self.handle_key(code, modifiers),
            Event::Paste(text) => self.handle_paste(&text),
            _ => {}
        }
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if self.alert.is_some() {
            self.alert = None;
            return;
        }

        let ctrl = modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(code, KeyCode::Char('q') | KeyCode::Char('c')) {
            self.should_quit = true;
            return;
        }

        match self.controller.phase() {
            Phase::Idle => self.handle_upload_key(code, modifiers),
            Phase::Loading => {}
            Phase::Editing | Phase::Downloading => self.handle_editor_key(code, modifiers),
        }
    }

    fn handle_paste(&mut self, text: &str) {
        if self.alert.is_some() {
            return;
        }
        match self.controller.phase() {
            Phase::Idle => {
                if let Some(path) = clean_dropped_path(text) {
                    self.upload_input = path.display().to_string();
                    self.submit_path(path);
                }
            }
            Phase::Loading => {}
            Phase::Editing | Phase::Downloading => {
                if self.editor.insert_str(text) {
                    self.push_text();
                }
            }
        }
    }

    fn handle_upload_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        match code {
            KeyCode::Enter => {
                if let Some(path) = clean_dropped_path(&self.upload_input) {
                    self.submit_path(path);
                }
            }
            KeyCode::Backspace => {
                self.upload_input.pop();
            }
            KeyCode::Esc => {
                self.upload_input.clear();
                self.upload_error = None;
            }
            KeyCode::Char(ch)
                if !modifiers.contains(KeyModifiers::CONTROL)
                    && !modifiers.contains(KeyModifiers::ALT) =>
            {
                self.upload_input.push(ch);
            }
            _ => {}
        }
    }

    fn handle_editor_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);
        let alt = modifiers.contains(KeyModifiers::ALT);
        let edited = match (code, modifiers) {
            (KeyCode::Char('s'), m) if m.contains(KeyModifiers::CONTROL) => {
                if self.controller.phase() == Phase::Downloading {
                    self.set_status("Already generating the document...");
                } else {
                    self.controller.request_download();
                }
                false
            }
            (KeyCode::Char('n'), m) if m.contains(KeyModifiers::CONTROL) => {
                self.controller.reset();
                self.set_status("Document closed");
                false
            }
            (KeyCode::Up, _) if alt => {
                self.preview_scroll = self.preview_scroll.saturating_sub(1);
                false
            }
            (KeyCode::Down, _) if alt => {
                self.preview_scroll = self.preview_scroll.saturating_add(1);
                false
            }
            (KeyCode::Left, _) if ctrl => {
                self.editor.move_word_left();
                false
            }
            (KeyCode::Right, _) if ctrl => {
                self.editor.move_word_right();
                false
            }
            (KeyCode::Home, _) if ctrl => {
                self.editor.move_document_start();
                false
            }
            (KeyCode::End, _) if ctrl => {
                self.editor.move_document_end();
                false
            }
            (KeyCode::Left, _) => {
                self.editor.move_left();
                false
            }
            (KeyCode::Right, _) => {
                self.editor.move_right();
                false
            }
            (KeyCode::Up, _) => {
                self.editor.move_up();
                false
            }
            (KeyCode::Down, _) => {
                self.editor.move_down();
                false
            }
            (KeyCode::Home, _) => {
                self.editor.move_line_start();
                false
            }
            (KeyCode::End, _) => {
                self.editor.move_line_end();
                false
            }
            (KeyCode::Char('a'), _) if ctrl => {
                self.editor.move_line_start();
                false
            }
            (KeyCode::Char('e'), _) if ctrl => {
                self.editor.move_line_end();
                false
            }
            (KeyCode::PageUp, _) => {
                self.editor.page_up(self.last_view_height);
                false
            }
            (KeyCode::PageDown, _) => {
                self.editor.page_down(self.last_view_height);
                false
            }
            (KeyCode::Backspace, _) => self.editor.backspace(),
            (KeyCode::Delete, _) => self.editor.delete(),
            (KeyCode::Enter, _) => self.editor.insert_newline(),
            (KeyCode::Tab, _) => self.editor.insert_char('\t'),
            (KeyCode::Char(ch), _) if !ctrl && !alt => self.editor.insert_char(ch),
            _ => false,
        };
        if edited {
            self.push_text();
        }
    }

    fn push_text(&mut self) {
        self.controller.edit_text(self.editor.text());
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        if area.height == 0 || area.width == 0 {
            return;
        }

        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(area);
        let main_area = vertical[0];
        let status_area = vertical[1];

        let show_cursor = self.alert.is_none();
        match self.controller.phase() {
            Phase::Idle | Phase::Loading => self.draw_upload(frame, main_area, show_cursor),
            Phase::Editing | Phase::Downloading => {
                self.draw_editor(frame, main_area, show_cursor)
            }
        }

        let status = Paragraph::new(Line::from(self.status_line()))
            .style(self.theme.status_bar_style());
        frame.render_widget(status, status_area);

        if self.alert.is_some() {
            self.draw_alert(frame, area);
        }
    }

    fn status_line(&self) -> String {
        if let Some((message, _)) = &self.status_message {
            return format!(" {message}");
        }
        match self.controller.state().file_name() {
            Some(name) => format!(" {name} | output: {}", self.controller.output_dir().display()),
            None => " DocPatch | Format-safe Word editor | Ctrl-Q quit".to_string(),
        }
    }

    fn draw_upload(&self, frame: &mut Frame, area: Rect, show_cursor: bool) {
        let loading = self.controller.state().is_loading();
        let panel = centered_rect(area, 72, 9);
        let title = if loading {
            " Processing document... "
        } else {
            " Upload Word Document "
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(self.theme.pane_border_style(!loading));
        let inner = block.inner(panel);
        frame.render_widget(block, panel);

        let mut lines = Vec::new();
        if loading {
            let name = self.controller.state().file_name().unwrap_or_default();
            lines.push(Line::from(Span::styled(
                format!("Extracting text from {name}"),
                self.theme.busy_style(),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Type or drop the path of a .docx file, then press Enter",
                self.theme.hint_style(),
            )));
        }
        lines.push(Line::default());
        lines.push(Line::from(format!("> {}", self.upload_input)));
        lines.push(Line::default());
        if let Some(error) = &self.upload_error {
            lines.push(Line::from(Span::styled(error.clone(), self.theme.error_style())));
        } else {
            lines.push(Line::from(Span::styled(
                "Only .docx files are supported",
                self.theme.hint_style(),
            )));
        }
        frame.render_widget(Paragraph::new(Text::from(lines)), inner);

        if show_cursor && !loading && inner.height > 2 {
            let column = 2 + unicode_width::UnicodeWidthStr::width(self.upload_input.as_str());
            let x = inner.x + (column as u16).min(inner.width.saturating_sub(1));
            frame.set_cursor_position(Position::new(x, inner.y + 2));
        }
    }

    fn draw_editor(&mut self, frame: &mut Frame, area: Rect, show_cursor: bool) {
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(area);
        self.draw_toolbar(frame, vertical[0]);

        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(vertical[1]);

        let editor_block = Block::default()
            .title(" Editor  Text-only (format-safe) ")
            .borders(Borders::ALL)
            .border_style(self.theme.pane_border_style(true));
        let editor_area = editor_block.inner(panes[0]);
        frame.render_widget(editor_block, panes[0]);

        let height = editor_area.height as usize;
        let width = editor_area.width as usize;
        self.last_view_height = height.max(1);
        let cursor = self.editor.cursor();
        let cursor_column = self.editor.cursor_display_column();
        self.viewport
            .follow_cursor(cursor.line, cursor_column, height, width);

        let render = render_editor(&self.editor, &self.viewport, height);
        let editor_widget =
            Paragraph::new(Text::from(render.lines)).scroll((0, render.scroll_left));
        frame.render_widget(editor_widget, editor_area);

        if show_cursor {
            if let Some((x, y)) = self.viewport.cursor_offset(cursor.line, cursor_column) {
                if x < editor_area.width && y < editor_area.height {
                    frame.set_cursor_position(Position::new(editor_area.x + x, editor_area.y + y));
                }
            }
        }

        let preview_block = Block::default()
            .title(" Preview  Text-only (final formatting preserved in Word) ")
            .borders(Borders::ALL)
            .border_style(self.theme.pane_border_style(false));
        let (original, edited) = match self.controller.state().loaded() {
            Some(loaded) => (loaded.original_text(), loaded.edited_text()),
            None => ("", ""),
        };
        let preview = Paragraph::new(Text::from(render_preview(original, edited, &self.theme)))
            .wrap(Wrap { trim: false })
            .scroll((self.preview_scroll, 0))
            .block(preview_block);
        frame.render_widget(preview, panes[1]);
    }

    fn draw_toolbar(&self, frame: &mut Frame, area: Rect) {
        let state = self.controller.state();
        let Some(loaded) = state.loaded() else {
            return;
        };
        let summary = summarize_changes(&paragraph_changes(
            loaded.original_text(),
            loaded.edited_text(),
        ));

        let mut first = vec![
            Span::styled(loaded.file_name().to_string(), self.theme.filename_style()),
            Span::raw("  "),
            Span::styled("Document loaded successfully", self.theme.success_style()),
            Span::raw(format!("  {} changed paragraph(s)", summary.modified)),
        ];
        if summary.superseded > 0 {
            first.push(Span::styled(
                format!(
                    "  {} edit(s) overwritten by a later identical paragraph",
                    summary.superseded
                ),
                self.theme.dropped_style(),
            ));
        }
        if summary.dropped > 0 {
            first.push(Span::styled(
                format!("  {} new trailing paragraph(s) will not be saved", summary.dropped),
                self.theme.dropped_style(),
            ));
        }

        let download = if state.is_downloading() {
            Span::styled("Generating...", self.theme.busy_style())
        } else {
            Span::raw("Ctrl-S Download .docx")
        };
        let second = vec![
            download,
            Span::styled(
                "  Ctrl-N New Document  Alt-Up/Down scroll preview  Ctrl-Q quit",
                self.theme.hint_style(),
            ),
        ];

        let toolbar = Paragraph::new(Text::from(vec![Line::from(first), Line::from(second)]))
            .block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(toolbar, area);
    }

    fn draw_alert(&self, frame: &mut Frame, area: Rect) {
        let Some(message) = &self.alert else {
            return;
        };
        if area.width < 3 || area.height < 3 {
            return;
        }
        let width = 60.min(area.width);
        let popup = centered_rect(area, width, alert_height(message, width));

        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(" Error ")
            .borders(Borders::ALL)
            .style(self.theme.alert_style())
            .border_style(self.theme.alert_border_style());
        let body = Text::from(vec![
            Line::from(message.clone()),
            Line::default(),
            Line::from(Span::styled("Press any key", self.theme.hint_style())),
        ]);
        let widget = Paragraph::new(body)
            .wrap(Wrap { trim: true })
            .style(self.theme.alert_style())
            .block(block);
        frame.render_widget(widget, popup);
    }
}
