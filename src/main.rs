use std::fs;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use tui_logger::TuiLoggerWidget;

use fixtures_site::board::{BoardEvent, FilterToken, FixtureBoard};
use fixtures_site::config::SiteConfig;
use fixtures_site::logging;
use fixtures_site::probe::spawn_data_probe;
use fixtures_site::refresher::TimeRefresher;
use fixtures_site::share::{Osc52Clipboard, ShareOutcome};
use fixtures_site::time_label::TimeState;

const NOTICE_SECS: u64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Normal,
    Search,
}

struct App {
    board: FixtureBoard,
    should_quit: bool,
    selected: usize,
    input_mode: InputMode,
    search_buffer: String,
    date_cursor: Option<usize>,
    league_cursor: Option<usize>,
    clipboard: Osc52Clipboard<Stdout>,
    notice: Option<(String, Instant)>,
    help_overlay: bool,
    log_pane: bool,
}

impl App {
    fn new(board: FixtureBoard) -> Self {
        Self {
            board,
            should_quit: false,
            selected: 0,
            input_mode: InputMode::Normal,
            search_buffer: String::new(),
            date_cursor: None,
            league_cursor: None,
            clipboard: Osc52Clipboard::new(io::stdout()),
            notice: None,
            help_overlay: false,
            log_pane: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.input_mode == InputMode::Search {
            self.on_search_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.filter(FilterToken::All),
            KeyCode::Char('2') => self.filter(FilterToken::Today),
            KeyCode::Char('3') => self.filter(FilterToken::Tomorrow),
            KeyCode::Char('4') => self.filter(FilterToken::Live),
            KeyCode::Char('/') => {
                self.input_mode = InputMode::Search;
            }
            KeyCode::Char('d') => self.step_date(true),
            KeyCode::Char('D') => self.step_date(false),
            KeyCode::Char('g') => self.step_league(true),
            KeyCode::Char('G') => self.step_league(false),
            KeyCode::Char('j') | KeyCode::Down => self.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.select_prev(),
            KeyCode::Char('s') | KeyCode::Enter => self.share_selected(),
            KeyCode::Char('?') => self.help_overlay = !self.help_overlay,
            KeyCode::Char('l') => self.log_pane = !self.log_pane,
            _ => {}
        }
    }

    fn on_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                return;
            }
            KeyCode::Backspace => {
                self.search_buffer.pop();
            }
            KeyCode::Char(c) => self.search_buffer.push(c),
            _ => return,
        }
        self.board.search(&self.search_buffer);
        self.selected = 0;
    }

    fn filter(&mut self, token: FilterToken) {
        self.board.apply_filter(token.as_str());
        self.selected = 0;
    }

    fn step_date(&mut self, forward: bool) {
        let total = self.board.date_items().len();
        let Some(next) = step_cursor(self.date_cursor, total, forward) else {
            return;
        };
        self.date_cursor = Some(next);
        let value = self.board.date_items()[next].value.clone();
        self.board.select_date(&value);
        self.selected = 0;
    }

    fn step_league(&mut self, forward: bool) {
        let total = self.board.league_items().len();
        let Some(next) = step_cursor(self.league_cursor, total, forward) else {
            return;
        };
        self.league_cursor = Some(next);
        let value = self.board.league_items()[next].value.clone();
        self.board.select_league(&value);
        self.selected = 0;
    }

    fn select_next(&mut self) {
        let total = self.board.visible_count();
        if total > 0 {
            self.selected = (self.selected + 1).min(total - 1);
        }
    }

    fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn selected_position(&self) -> Option<usize> {
        self.board
            .visible_entries()
            .nth(self.selected)
            .map(|entry| entry.position)
    }

    fn share_selected(&mut self) {
        let Some(position) = self.selected_position() else {
            return;
        };
        match self.board.share_at(position, &mut self.clipboard) {
            ShareOutcome::Copied | ShareOutcome::Shared => {
                if let Some(msg) = self.board.take_notice() {
                    self.notice = Some((msg, Instant::now()));
                }
            }
            ShareOutcome::NotFound | ShareOutcome::CopyFailed(_) => {}
        }
    }

    fn expire_notice(&mut self) {
        if self
            .notice
            .as_ref()
            .is_some_and(|(_, at)| at.elapsed() >= Duration::from_secs(NOTICE_SECS))
        {
            self.notice = None;
        }
    }
}

fn step_cursor(current: Option<usize>, total: usize, forward: bool) -> Option<usize> {
    if total == 0 {
        return None;
    }
    Some(match (current, forward) {
        (None, true) => 0,
        (None, false) => total - 1,
        (Some(idx), true) => (idx + 1) % total,
        (Some(idx), false) => (idx + total - 1) % total,
    })
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = SiteConfig::from_env();
    let page_path = parse_page_arg().unwrap_or_else(|| config.index_path());
    logging::init_tui(logging::level_from_env())?;

    let html = fs::read_to_string(&page_path)
        .with_context(|| format!("read rendered page {}", page_path.display()))?;
    let page_url = fs::canonicalize(&page_path)
        .map(|p| format!("file://{}", p.display()))
        .unwrap_or_default();
    let mut board = FixtureBoard::from_markup(&html).with_page_url(page_url);
    board.start(Utc::now().timestamp());

    let (tx, rx) = mpsc::channel();
    TimeRefresher::new(tx.clone(), config.refresh_interval).spawn();
    spawn_data_probe(config.probe_source(), tx);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(board);
    let res = run_app(&mut terminal, &mut app, rx);
    app.board.detach();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn parse_page_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--page=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--page"
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(PathBuf::from(next));
        }
    }
    None
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<BoardEvent>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(ev) = rx.try_recv() {
            app.board.handle_event(ev, Utc::now().timestamp());
        }
        app.expire_notice();

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(app)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    if app.log_pane {
        let panes = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(chunks[1]);
        render_fixtures(frame, panes[0], app);
        let logs = TuiLoggerWidget::default()
            .block(Block::default().title("Log").borders(Borders::TOP))
            .style_error(Style::default().fg(Color::Red))
            .style_warn(Style::default().fg(Color::Yellow))
            .style_info(Style::default().fg(Color::Gray));
        frame.render_widget(logs, panes[1]);
    } else {
        render_fixtures(frame, chunks[1], app);
    }

    let footer = Paragraph::new(footer_text(app)).block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    if app.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(app: &App) -> String {
    let board = &app.board;
    let line1 = format!(
        "足球賽事數據中心 | {}/{} shown | Filter: {}",
        board.visible_count(),
        board.fixtures().len(),
        board.active_filter().label()
    );
    let line2 = format!(
        "Date: {} | League: {} | Search: {}{}",
        board.active_date().unwrap_or("-"),
        active_league_label(app),
        board.search_term(),
        if app.input_mode == InputMode::Search { "▏" } else { "" }
    );
    format!("{line1}\n{line2}")
}

fn active_league_label(app: &App) -> String {
    let Some(id) = app.board.active_league() else {
        return "-".to_string();
    };
    app.board
        .league_items()
        .iter()
        .find(|item| item.value == id)
        .map(|item| item.label.clone())
        .unwrap_or_else(|| id.to_string())
}

fn footer_text(app: &App) -> String {
    if let Some((msg, _)) = &app.notice {
        return msg.clone();
    }
    if app.input_mode == InputMode::Search {
        return "Type to search | Enter/Esc Done".to_string();
    }
    match app.board.logs().back() {
        Some(last) => format!("1-4 Filter | / Search | d/D Date | g/G League | s Share | l Log | ? Help | q Quit\n{last}"),
        None => "1-4 Filter | / Search | d/D Date | g/G League | s Share | l Log | ? Help | q Quit".to_string(),
    }
}

fn render_fixtures(frame: &mut Frame, area: Rect, app: &App) {
    let visible = app.board.visible_entries().collect::<Vec<_>>();
    if visible.is_empty() {
        let empty = Paragraph::new("No fixtures match").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    let rows = area.height as usize;
    let (start, end) = visible_range(app.selected, visible.len(), rows);
    let mut lines = Vec::with_capacity(end - start);
    for (idx, entry) in visible.iter().enumerate().take(end).skip(start) {
        let fixture = entry.fixture;
        let (label, label_style) = match entry.label {
            Some(label) => (label.text.clone(), time_style(label.state)),
            None => ("--".to_string(), Style::default().fg(Color::DarkGray)),
        };
        let row_style = if idx == app.selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:<16}", label), label_style),
            Span::styled(format!("{} {}  ", fixture.date, fixture.time), row_style),
            Span::styled(
                format!("[{}] ", fixture.league),
                row_style.add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("{} vs {}", fixture.home_team, fixture.away_team), row_style),
        ]));
    }
    frame.render_widget(Paragraph::new(lines), area);
}

fn time_style(state: TimeState) -> Style {
    match state {
        TimeState::Upcoming => Style::default().fg(Color::Cyan),
        TimeState::Live => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        TimeState::Finished => Style::default().fg(Color::DarkGray),
    }
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Fixture board - Help",
        "",
        "  1 / 2 / 3 / 4   All / Today / Tomorrow / Live",
        "  /               Search teams and leagues",
        "  d / D           Next / previous date",
        "  g / G           Next / previous league",
        "  j/k or ↑/↓      Move",
        "  s / Enter       Share selected fixture",
        "  l               Toggle log pane",
        "  ?               Toggle help",
        "  q               Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
