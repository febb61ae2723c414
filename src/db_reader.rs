use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Days, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};
use rusqlite::{Connection, OpenFlags, Row, params};
use serde::Serialize;
use serde_json::Value;

use crate::config::SiteConfig;

/// Statuses still worth listing: not started, in play, or interrupted.
pub const ACTIONABLE_STATUSES: &[&str] = &[
    "NS", "1H", "HT", "2H", "ET", "BT", "P", "SUSP", "INT", "ABD", "AWD", "WO",
];

const IN_PLAY_STATUSES: &[&str] = &["1H", "HT", "2H", "ET", "BT", "P", "INT", "LIVE"];

pub const UNKNOWN_LEAGUE: &str = "未知聯賽";
pub const UNKNOWN_HOME: &str = "未知主隊";
pub const UNKNOWN_AWAY: &str = "未知客隊";
pub const UNKNOWN_DATE: &str = "未知日期";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FixtureRow {
    pub id: i64,
    pub api_id: Option<i64>,
    pub league_api_id: Option<i64>,
    pub league_name: String,
    pub league_country: Option<String>,
    pub home_team: String,
    pub home_team_country: Option<String>,
    pub away_team: String,
    pub away_team_country: Option<String>,
    pub event_date: Option<String>,
    pub event_timestamp: Option<i64>,
    pub status_short: Option<String>,
    pub status_long: Option<String>,
    pub goals_home: Option<i64>,
    pub goals_away: Option<i64>,
    pub venue_name: Option<String>,
    pub venue_city: Option<String>,
    pub referee: Option<String>,
    pub round: Option<String>,
    pub season: Option<i64>,
    pub raw_data: Option<Value>,
    pub event_date_formatted: String,
    pub event_time_formatted: String,
    pub event_datetime_local: String,
}

impl FixtureRow {
    /// Value for the card's `data-status`: `live` while in play, `upcoming`
    /// before kickoff, otherwise the lower-cased short code.
    pub fn display_status(&self) -> String {
        match self.status_short.as_deref() {
            Some(s) if IN_PLAY_STATUSES.contains(&s) => "live".to_string(),
            Some("NS") | Some("TBD") | None => "upcoming".to_string(),
            Some(other) => other.to_ascii_lowercase(),
        }
    }

    pub fn league_key(&self) -> String {
        self.league_api_id
            .map(|id| id.to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeagueGroup {
    pub id: Option<i64>,
    pub name: String,
    pub country: String,
    pub fixtures: Vec<FixtureRow>,
}

pub fn find_db_path(candidates: &[PathBuf]) -> Result<PathBuf> {
    for path in candidates {
        if path.exists() {
            log::info!("找到數據庫文件: {}", path.display());
            return Ok(path.clone());
        }
    }
    Err(anyhow!(
        "無法找到fixtures.db文件 (tried {})",
        candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    ))
}

pub fn open_db(path: &Path) -> Result<Connection> {
    Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("open sqlite db {}", path.display()))
}

/// The tables the sync job writes. Only tests and benches create them here.
pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS leagues (
            id INTEGER PRIMARY KEY,
            api_id INTEGER,
            name_tc TEXT,
            name_en TEXT,
            country TEXT
        );
        CREATE TABLE IF NOT EXISTS teams (
            id INTEGER PRIMARY KEY,
            api_id INTEGER,
            name_tc TEXT,
            name_en TEXT,
            country TEXT
        );
        CREATE TABLE IF NOT EXISTS fixtures (
            id INTEGER PRIMARY KEY,
            api_id INTEGER,
            league_id INTEGER,
            home_team_id INTEGER,
            away_team_id INTEGER,
            event_date TEXT,
            event_timestamp INTEGER,
            status_short TEXT,
            status_long TEXT,
            goals_home INTEGER,
            goals_away INTEGER,
            venue_name TEXT,
            venue_city TEXT,
            referee TEXT,
            round TEXT,
            season INTEGER,
            raw_data TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_fixtures_event_date ON fixtures(event_date);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

pub fn load_fixtures(config: &SiteConfig) -> Result<Vec<FixtureRow>> {
    let path = find_db_path(&config.db_candidates)?;
    let conn = open_db(&path)?;
    let targets = config.target_league_ids.iter().copied().collect::<HashSet<_>>();
    let today = Utc::now().date_naive();
    get_fixtures(&conn, today, config.days_ahead, &targets)
}

/// Fixtures from `today` through `today + days_ahead` (both inclusive, by the
/// first ten characters of `event_date`) with an actionable status, restricted
/// to `targets` league api ids.
pub fn get_fixtures(
    conn: &Connection,
    today: NaiveDate,
    days_ahead: u32,
    targets: &HashSet<u32>,
) -> Result<Vec<FixtureRow>> {
    let end = today
        .checked_add_days(Days::new(u64::from(days_ahead)))
        .context("date window overflow")?;
    log::info!("查詢賽事: {today} 至 {end}");

    let placeholders = ACTIONABLE_STATUSES
        .iter()
        .map(|s| format!("'{s}'"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        r#"
        SELECT
            f.id, f.api_id, f.event_date, f.event_timestamp,
            f.status_short, f.status_long, f.goals_home, f.goals_away,
            f.venue_name, f.venue_city, f.referee, f.round, f.season, f.raw_data,
            l.api_id AS league_api_id, l.name_tc AS league_name_tc,
            l.name_en AS league_name_en, l.country AS league_country,
            ht.name_tc AS home_name_tc, ht.name_en AS home_name_en, ht.country AS home_country,
            at.name_tc AS away_name_tc, at.name_en AS away_name_en, at.country AS away_country
        FROM fixtures f
        LEFT JOIN leagues l ON f.league_id = l.id
        LEFT JOIN teams ht ON f.home_team_id = ht.id
        LEFT JOIN teams at ON f.away_team_id = at.id
        -- date part only, so kickoffs on the last day of the window are kept
        WHERE substr(f.event_date, 1, 10) >= ?1
          AND substr(f.event_date, 1, 10) <= ?2
          AND f.status_short IN ({placeholders})
        ORDER BY f.event_date, f.event_timestamp
        "#
    );

    let mut stmt = conn.prepare(&sql).context("prepare fixtures query")?;
    let rows = stmt
        .query_map(
            params![
                today.format("%Y-%m-%d").to_string(),
                end.format("%Y-%m-%d").to_string()
            ],
            read_row,
        )
        .context("query fixtures")?;

    let mut all = Vec::new();
    for row in rows {
        all.push(row.context("read fixture row")?);
    }
    log::info!("查詢到 {} 場賽事", all.len());

    let fixtures = all
        .into_iter()
        .filter(|f| {
            f.league_api_id
                .and_then(|id| u32::try_from(id).ok())
                .is_some_and(|id| targets.contains(&id))
        })
        .collect::<Vec<_>>();
    log::info!("篩選後得到 {} 場賽事", fixtures.len());

    let groups = group_by_league(&fixtures);
    log::info!("賽事分佈: {} 個聯賽", groups.len());
    for group in groups.iter().take(10) {
        log::info!("  - {}: {} 場", group.name, group.fixtures.len());
    }
    Ok(fixtures)
}

pub fn count_actionable(conn: &Connection) -> Result<i64> {
    let placeholders = ACTIONABLE_STATUSES
        .iter()
        .map(|s| format!("'{s}'"))
        .collect::<Vec<_>>()
        .join(", ");
    conn.query_row(
        &format!("SELECT COUNT(*) FROM fixtures WHERE status_short IN ({placeholders})"),
        [],
        |row| row.get::<_, i64>(0),
    )
    .context("count actionable fixtures")
}

/// Groups by league api id, ordered by league name.
pub fn group_by_league(fixtures: &[FixtureRow]) -> Vec<LeagueGroup> {
    let mut order: Vec<Option<i64>> = Vec::new();
    let mut groups: HashMap<Option<i64>, LeagueGroup> = HashMap::new();
    for fixture in fixtures {
        let key = fixture.league_api_id;
        let group = groups.entry(key).or_insert_with(|| {
            order.push(key);
            LeagueGroup {
                id: key,
                name: fixture.league_name.clone(),
                country: fixture.league_country.clone().unwrap_or_default(),
                fixtures: Vec::new(),
            }
        });
        group.fixtures.push(fixture.clone());
    }
    let mut out = order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .collect::<Vec<_>>();
    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

pub fn group_by_date(fixtures: &[FixtureRow]) -> BTreeMap<String, Vec<FixtureRow>> {
    let mut out: BTreeMap<String, Vec<FixtureRow>> = BTreeMap::new();
    for fixture in fixtures {
        let key = if fixture.event_date_formatted.is_empty() {
            UNKNOWN_DATE.to_string()
        } else {
            fixture.event_date_formatted.clone()
        };
        out.entry(key).or_default().push(fixture.clone());
    }
    out
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<FixtureRow> {
    let event_date: Option<String> = row.get("event_date")?;
    let (date, time, local) = format_event_date(event_date.as_deref());
    let raw_data = row
        .get::<_, Option<String>>("raw_data")?
        .map(|raw| serde_json::from_str::<Value>(&raw).unwrap_or(Value::String(raw)));

    Ok(FixtureRow {
        id: row.get("id")?,
        api_id: row.get("api_id")?,
        league_api_id: row.get("league_api_id")?,
        league_name: name_or(
            row.get("league_name_tc")?,
            row.get("league_name_en")?,
            UNKNOWN_LEAGUE,
        ),
        league_country: row.get("league_country")?,
        home_team: name_or(row.get("home_name_tc")?, row.get("home_name_en")?, UNKNOWN_HOME),
        home_team_country: row.get("home_country")?,
        away_team: name_or(row.get("away_name_tc")?, row.get("away_name_en")?, UNKNOWN_AWAY),
        away_team_country: row.get("away_country")?,
        event_date,
        event_timestamp: row.get("event_timestamp")?,
        status_short: row.get("status_short")?,
        status_long: row.get("status_long")?,
        goals_home: row.get("goals_home")?,
        goals_away: row.get("goals_away")?,
        venue_name: row.get("venue_name")?,
        venue_city: row.get("venue_city")?,
        referee: row.get("referee")?,
        round: row.get("round")?,
        season: row.get("season")?,
        raw_data,
        event_date_formatted: date,
        event_time_formatted: time,
        event_datetime_local: local,
    })
}

/// Traditional-Chinese name, else English, else the placeholder.
fn name_or(tc: Option<String>, en: Option<String>, fallback: &str) -> String {
    tc.filter(|s| !s.trim().is_empty())
        .or_else(|| en.filter(|s| !s.trim().is_empty()))
        .unwrap_or_else(|| fallback.to_string())
}

/// `(date, time, local datetime)` for display. Unparseable input keeps the raw
/// string as the date and `00:00` as the time.
pub fn format_event_date(raw: Option<&str>) -> (String, String, String) {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return (String::new(), String::new(), String::new());
    };
    match parse_event_date(raw) {
        Some(dt) => (
            dt.format("%Y-%m-%d").to_string(),
            dt.format("%H:%M").to_string(),
            dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        ),
        None => (raw.to_string(), "00:00".to_string(), raw.to_string()),
    }
}

fn parse_event_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .map(|naive| naive.and_utc().fixed_offset())
}
