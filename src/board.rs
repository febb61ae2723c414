//! The fixture board controller.
//!
//! One `FixtureBoard` is built per rendered page. It owns an index from
//! fixture id to record, the per-fixture visibility, the three single-select
//! groups (filter, date, league) and the search term. Every handler runs to
//! completion on the caller's thread; helper threads only ever talk to it
//! through [`BoardEvent`]s.

use std::collections::{HashMap, VecDeque};

use chrono::{Days, Local, NaiveDate};
use log::Level;

use crate::fixture::FixtureRecord;
use crate::markup::{self, ControlItem, RenderedPage};
use crate::probe::ProbeSummary;
use crate::share::{COPIED_NOTICE, SHARE_TITLE, ShareOutcome, SharePayload, SharePlatform};
use crate::time_label::{TimeLabel, time_label};

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterToken {
    #[default]
    All,
    Today,
    Tomorrow,
    Live,
}

impl FilterToken {
    pub const ALL: [FilterToken; 4] = [
        FilterToken::All,
        FilterToken::Today,
        FilterToken::Tomorrow,
        FilterToken::Live,
    ];

    /// Unknown tokens fall back to `All`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "today" => FilterToken::Today,
            "tomorrow" => FilterToken::Tomorrow,
            "live" => FilterToken::Live,
            _ => FilterToken::All,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterToken::All => "all",
            FilterToken::Today => "today",
            FilterToken::Tomorrow => "tomorrow",
            FilterToken::Live => "live",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterToken::All => "全部",
            FilterToken::Today => "今日",
            FilterToken::Tomorrow => "明日",
            FilterToken::Live => "進行中",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    Tick,
    Probe(Result<ProbeSummary, String>),
}

/// One card as the board currently shows it.
#[derive(Debug, Clone, Copy)]
pub struct BoardEntry<'a> {
    pub position: usize,
    pub fixture: &'a FixtureRecord,
    pub visible: bool,
    pub label: Option<&'a TimeLabel>,
}

#[derive(Debug, Clone)]
pub struct FixtureBoard {
    fixtures: Vec<FixtureRecord>,
    index: HashMap<String, usize>,
    visible: Vec<bool>,
    labels: Vec<Option<TimeLabel>>,
    active_filter: FilterToken,
    active_date: Option<String>,
    active_league: Option<String>,
    search_term: String,
    date_items: Vec<ControlItem>,
    league_items: Vec<ControlItem>,
    page_url: String,
    logs: VecDeque<String>,
    notice: Option<String>,
    attached: bool,
}

impl FixtureBoard {
    pub fn new(fixtures: Vec<FixtureRecord>) -> Self {
        let mut board = Self {
            fixtures: Vec::new(),
            index: HashMap::new(),
            visible: Vec::new(),
            labels: Vec::new(),
            active_filter: FilterToken::All,
            active_date: None,
            active_league: None,
            search_term: String::new(),
            date_items: Vec::new(),
            league_items: Vec::new(),
            page_url: String::new(),
            logs: VecDeque::with_capacity(MAX_LOGS),
            notice: None,
            attached: true,
        };
        board.replace_fixtures(fixtures);
        board
    }

    pub fn from_page(page: RenderedPage) -> Self {
        let mut board = Self::new(page.fixtures);
        board.date_items = page.dates;
        board.league_items = page.leagues;
        board
    }

    pub fn from_markup(html: &str) -> Self {
        Self::from_page(markup::parse_page(html))
    }

    pub fn with_page_url(mut self, url: impl Into<String>) -> Self {
        self.page_url = url.into();
        self
    }

    /// Swaps the fixture list and rebuilds the id index. Everything becomes
    /// visible again and time labels wait for the next refresh.
    ///
    /// Visibility and labels are kept per card position. The id index only
    /// serves lookups by id and points at the first card carrying that id.
    pub fn replace_fixtures(&mut self, fixtures: Vec<FixtureRecord>) {
        let mut index = HashMap::with_capacity(fixtures.len());
        for (idx, fixture) in fixtures.iter().enumerate() {
            if !fixture.id.is_empty() {
                index.entry(fixture.id.clone()).or_insert(idx);
            }
        }
        self.index = index;
        self.visible = vec![true; fixtures.len()];
        self.labels = vec![None; fixtures.len()];
        self.fixtures = fixtures;
    }

    /// Startup pass: the first time-label refresh, before any timer tick.
    pub fn start(&mut self, now: i64) {
        self.refresh_time_labels(now);
    }

    pub fn detach(&mut self) {
        self.attached = false;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn fixtures(&self) -> &[FixtureRecord] {
        &self.fixtures
    }

    pub fn get(&self, id: &str) -> Option<&FixtureRecord> {
        self.index.get(id).and_then(|idx| self.fixtures.get(*idx))
    }

    /// True when any card carrying `id` is shown.
    pub fn is_visible(&self, id: &str) -> bool {
        self.entries().any(|e| e.visible && e.fixture.id == id)
    }

    /// Every card in page order, with its own visibility and label.
    pub fn entries(&self) -> impl Iterator<Item = BoardEntry<'_>> {
        self.fixtures
            .iter()
            .zip(&self.visible)
            .zip(&self.labels)
            .enumerate()
            .map(|(position, ((fixture, visible), label))| BoardEntry {
                position,
                fixture,
                visible: *visible,
                label: label.as_ref(),
            })
    }

    pub fn visible_entries(&self) -> impl Iterator<Item = BoardEntry<'_>> {
        self.entries().filter(|e| e.visible)
    }

    pub fn visible_fixtures(&self) -> Vec<&FixtureRecord> {
        self.visible_entries().map(|e| e.fixture).collect()
    }

    pub fn visible_count(&self) -> usize {
        self.visible.iter().filter(|v| **v).count()
    }

    pub fn active_filter(&self) -> FilterToken {
        self.active_filter
    }

    pub fn active_date(&self) -> Option<&str> {
        self.active_date.as_deref()
    }

    pub fn active_league(&self) -> Option<&str> {
        self.active_league.as_deref()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn date_items(&self) -> &[ControlItem] {
        &self.date_items
    }

    pub fn league_items(&self) -> &[ControlItem] {
        &self.league_items
    }

    pub fn apply_filter(&mut self, raw: &str) {
        let today = Local::now().date_naive();
        self.apply_filter_on(FilterToken::parse(raw), today);
    }

    /// `today` is the local calendar day the today/tomorrow tokens compare against.
    pub fn apply_filter_on(&mut self, token: FilterToken, today: NaiveDate) {
        self.active_filter = token;
        let reference = match token {
            FilterToken::Today => Some(today),
            FilterToken::Tomorrow => today.checked_add_days(Days::new(1)),
            FilterToken::All | FilterToken::Live => None,
        }
        .map(|d| d.format("%Y-%m-%d").to_string());

        self.set_visibility(|f| match token {
            FilterToken::All => true,
            FilterToken::Today | FilterToken::Tomorrow => {
                reference.as_deref().is_some_and(|day| f.date == day)
            }
            FilterToken::Live => f.is_live(),
        });
    }

    pub fn search(&mut self, term: &str) {
        let needle = term.trim().to_lowercase();
        self.search_term = term.to_string();
        self.set_visibility(|f| f.matches_search(&needle));
    }

    pub fn select_date(&mut self, date: &str) {
        self.active_date = Some(date.to_string());
        self.set_visibility(|f| f.date == date);
    }

    pub fn select_league(&mut self, league_id: &str) {
        self.active_league = Some(league_id.to_string());
        self.set_visibility(|f| f.league_id == league_id);
    }

    /// Recomputes every label that has a kickoff timestamp; returns how many were set.
    pub fn refresh_time_labels(&mut self, now: i64) -> usize {
        if !self.attached {
            return 0;
        }
        let mut updated = 0usize;
        for (fixture, slot) in self.fixtures.iter().zip(self.labels.iter_mut()) {
            let Some(kickoff) = fixture.kickoff_timestamp else {
                continue;
            };
            *slot = Some(time_label(now, kickoff));
            updated += 1;
        }
        updated
    }

    /// Label of the first card carrying `id`.
    pub fn time_label(&self, id: &str) -> Option<&TimeLabel> {
        self.index.get(id).and_then(|idx| self.label_at(*idx))
    }

    pub fn label_at(&self, position: usize) -> Option<&TimeLabel> {
        self.labels.get(position).and_then(|slot| slot.as_ref())
    }

    pub fn share(&mut self, id: &str, platform: &mut dyn SharePlatform) -> ShareOutcome {
        match self.index.get(id).copied() {
            Some(position) => self.share_at(position, platform),
            None => ShareOutcome::NotFound,
        }
    }

    /// Shares the card at `position` in page order; cards without an id can
    /// still be shared this way.
    pub fn share_at(&mut self, position: usize, platform: &mut dyn SharePlatform) -> ShareOutcome {
        let Some(fixture) = self.fixtures.get(position) else {
            return ShareOutcome::NotFound;
        };
        let text = fixture.share_text();

        if platform.supports_native_share() {
            let payload = SharePayload {
                title: SHARE_TITLE.to_string(),
                text,
                url: self.page_url.clone(),
            };
            if let Err(err) = platform.native_share(&payload) {
                self.push_log(Level::Warn, format!("分享失敗: {err}"));
            }
            return ShareOutcome::Shared;
        }

        match platform.copy_to_clipboard(&text) {
            Ok(()) => {
                self.notice = Some(COPIED_NOTICE.to_string());
                ShareOutcome::Copied
            }
            Err(err) => {
                self.push_log(Level::Error, format!("複製失敗: {err}"));
                ShareOutcome::CopyFailed(err.to_string())
            }
        }
    }

    pub fn handle_event(&mut self, event: BoardEvent, now: i64) {
        if !self.attached {
            return;
        }
        match event {
            BoardEvent::Tick => {
                self.refresh_time_labels(now);
            }
            BoardEvent::Probe(Ok(summary)) => {
                let count = summary
                    .count
                    .map(|c| format!("{c} 場"))
                    .unwrap_or_else(|| "n/a".to_string());
                self.push_log(
                    Level::Info,
                    format!(
                        "成功加載賽事數據: {} ({} bytes, {count})",
                        summary.source, summary.bytes
                    ),
                );
            }
            BoardEvent::Probe(Err(err)) => {
                self.push_log(Level::Info, format!("無法加載API數據: {err}"));
            }
        }
    }

    pub fn push_log(&mut self, level: Level, msg: impl Into<String>) {
        let msg = msg.into();
        log::log!(level, "{msg}");
        let tag = match level {
            Level::Error => "[ERROR]",
            Level::Warn => "[WARN]",
            _ => "[INFO]",
        };
        self.logs.push_back(format!("{tag} {msg}"));
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn logs(&self) -> &VecDeque<String> {
        &self.logs
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    fn set_visibility(&mut self, mut pred: impl FnMut(&FixtureRecord) -> bool) {
        for (fixture, shown) in self.fixtures.iter().zip(self.visible.iter_mut()) {
            *shown = pred(fixture);
        }
    }
}
