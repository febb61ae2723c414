use std::collections::HashSet;
use std::fs;

use chrono::NaiveDate;
use rusqlite::{Connection, params};
use serde_json::Value;

use fixtures_site::board::{FilterToken, FixtureBoard};
use fixtures_site::db_reader::{FixtureRow, create_schema, get_fixtures};
use fixtures_site::share::ShareOutcome;
use fixtures_site::site_builder::{SITE_TITLE, SiteBuilder};

fn sample_rows() -> Vec<FixtureRow> {
    let conn = Connection::open_in_memory().expect("in-memory db");
    create_schema(&conn).expect("schema");
    conn.execute_batch(
        r#"
        INSERT INTO leagues (id, api_id, name_tc, name_en, country) VALUES
            (1, 39, '英超', 'Premier League', 'England'),
            (2, 140, '西甲', 'La Liga', 'Spain');
        INSERT INTO teams (id, api_id, name_tc, name_en, country) VALUES
            (10, 42, '阿仙奴', 'Arsenal', 'England'),
            (11, 49, '車路士', 'Chelsea', 'England'),
            (12, 541, NULL, 'Real Madrid', 'Spain'),
            (13, 529, NULL, 'Barça "B" & Co', 'Spain');
        "#,
    )
    .expect("seed");
    let fixtures: [(i64, i64, i64, i64, &str, i64, &str); 3] = [
        (1, 1, 10, 11, "2026-10-17T19:30:00+00:00", 1_760_729_400, "1H"),
        (2, 1, 11, 10, "2026-10-17T22:00:00+00:00", 1_760_738_400, "NS"),
        (3, 2, 12, 13, "2026-10-18T03:00:00+00:00", 1_760_756_400, "NS"),
    ];
    for (id, league, home, away, date, ts, status) in fixtures {
        conn.execute(
            "INSERT INTO fixtures (id, api_id, league_id, home_team_id, away_team_id, event_date, event_timestamp, status_short, venue_name, venue_city, round)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'Emirates', 'London', 'Regular Season - 8')",
            params![id, 1000 + id, league, home, away, date, ts, status],
        )
        .expect("insert fixture");
    }
    let targets = [39u32, 140].into_iter().collect::<HashSet<_>>();
    let day = NaiveDate::from_ymd_opt(2026, 10, 17).expect("valid date");
    get_fixtures(&conn, day, 7, &targets).expect("query")
}

fn read_json(path: &std::path::Path) -> Value {
    let text = fs::read_to_string(path).expect("json file");
    serde_json::from_str(&text).expect("valid json")
}

#[test]
fn generated_index_drives_the_board() {
    let dir = tempfile::tempdir().expect("tempdir");
    let builder = SiteBuilder::new(dir.path().join("site")).expect("builder");
    let site = builder.generate_all(&sample_rows(), 7).expect("generate");

    let html = fs::read_to_string(&site.index).expect("index");
    assert!(html.contains(SITE_TITLE));

    let mut board = FixtureBoard::from_markup(&html);
    let ids = board.fixtures().iter().map(|f| f.id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["1001", "1002", "1003"]);

    let derby = board.get("1001").expect("card");
    assert_eq!(derby.home_team, "阿仙奴");
    assert_eq!(derby.league_id, "39");
    assert_eq!(derby.status, "live");
    assert_eq!(derby.kickoff_timestamp, Some(1_760_729_400));
    assert_eq!(board.get("1003").map(|f| f.away_team.as_str()), Some("Barça \"B\" & Co"));

    assert_eq!(board.date_items().len(), 2);
    assert_eq!(board.league_items().len(), 2);

    board.apply_filter_on(FilterToken::Live, NaiveDate::from_ymd_opt(2026, 10, 17).expect("date"));
    assert_eq!(board.visible_count(), 1);
    board.select_league("140");
    assert!(board.is_visible("1003"));
    board.search("arsenal");
    assert_eq!(board.visible_count(), 0);

    struct Sink(Vec<String>);
    impl fixtures_site::share::SharePlatform for Sink {
        fn copy_to_clipboard(&mut self, text: &str) -> anyhow::Result<()> {
            self.0.push(text.to_string());
            Ok(())
        }
    }
    let mut sink = Sink(Vec::new());
    assert_eq!(board.share("1001", &mut sink), ShareOutcome::Copied);
    assert_eq!(sink.0, vec!["📅 英超: 阿仙奴 vs 車路士 - 19:30".to_string()]);
}

#[test]
fn league_pages_assets_and_json_api_are_written() {
    let dir = tempfile::tempdir().expect("tempdir");
    let builder = SiteBuilder::new(dir.path()).expect("builder");
    let site = builder.generate_all(&sample_rows(), 7).expect("generate");

    assert_eq!(site.league_pages.len(), 2);
    let epl = &site.league_pages["39"];
    assert!(epl.ends_with("leagues/英超.html"));
    let epl_html = fs::read_to_string(epl).expect("league page");
    assert!(epl_html.contains("../css/style.css"));
    assert_eq!(FixtureBoard::from_markup(&epl_html).fixtures().len(), 2);

    assert!(site.css.is_file());
    assert!(site.js.is_file());

    let fixtures = read_json(&site.json_api.fixtures);
    assert_eq!(fixtures["status"], "success");
    assert_eq!(fixtures["count"], 3);
    assert_eq!(fixtures["data"][0]["home_team"], "阿仙奴");

    let leagues = read_json(&site.json_api.leagues);
    assert_eq!(leagues["count"], 2);
    assert_eq!(leagues["data"][0]["name"], "英超");

    let dates = read_json(&site.json_api.dates);
    assert_eq!(dates["data"]["2026-10-17"].as_array().map(Vec::len), Some(2));

    let stats = read_json(&site.json_api.stats);
    assert_eq!(stats["total_fixtures"], 3);
    assert_eq!(stats["total_leagues"], 2);
    assert_eq!(stats["total_dates"], 2);
}

#[test]
fn empty_input_still_renders_a_page() {
    let dir = tempfile::tempdir().expect("tempdir");
    let builder = SiteBuilder::new(dir.path()).expect("builder");
    let site = builder.generate_all(&[], 7).expect("generate");

    let html = fs::read_to_string(&site.index).expect("index");
    assert!(html.contains("暫無賽事"));
    assert!(FixtureBoard::from_markup(&html).fixtures().is_empty());
    assert!(site.league_pages.is_empty());
    assert_eq!(read_json(&site.json_api.fixtures)["count"], 0);
}
