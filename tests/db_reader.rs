use std::collections::HashSet;

use chrono::NaiveDate;
use rusqlite::{Connection, params};

use fixtures_site::db_reader::{
    UNKNOWN_AWAY, UNKNOWN_LEAGUE, count_actionable, create_schema, find_db_path, get_fixtures,
    group_by_date, group_by_league, open_db,
};

fn seeded() -> Connection {
    let conn = Connection::open_in_memory().expect("in-memory db");
    create_schema(&conn).expect("schema");
    conn.execute_batch(
        r#"
        INSERT INTO leagues (id, api_id, name_tc, name_en, country) VALUES
            (1, 39, '英超', 'Premier League', 'England'),
            (2, 140, NULL, 'La Liga', 'Spain'),
            (3, 2, '歐聯', 'Champions League', 'World');
        INSERT INTO teams (id, api_id, name_tc, name_en, country) VALUES
            (10, 42, '阿仙奴', 'Arsenal', 'England'),
            (11, 49, '車路士', 'Chelsea', 'England'),
            (12, 541, NULL, 'Real Madrid', 'Spain');
        "#,
    )
    .expect("seed leagues and teams");
    conn
}

fn insert_fixture(
    conn: &Connection,
    id: i64,
    league: Option<i64>,
    home: i64,
    away: Option<i64>,
    date: &str,
    status: &str,
) {
    conn.execute(
        "INSERT INTO fixtures (id, api_id, league_id, home_team_id, away_team_id, event_date, event_timestamp, status_short)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![id, id + 5000, league, home, away, date, 1_760_729_400i64, status],
    )
    .expect("insert fixture");
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn targets(ids: &[u32]) -> HashSet<u32> {
    ids.iter().copied().collect()
}

#[test]
fn window_is_inclusive_on_both_ends() {
    let conn = seeded();
    insert_fixture(&conn, 1, Some(1), 10, Some(11), "2026-10-16T23:00:00+00:00", "NS");
    insert_fixture(&conn, 2, Some(1), 10, Some(11), "2026-10-17T00:00:00+00:00", "NS");
    insert_fixture(&conn, 3, Some(1), 10, Some(11), "2026-10-24T21:00:00+00:00", "NS");
    insert_fixture(&conn, 4, Some(1), 10, Some(11), "2026-10-25T12:00:00+00:00", "NS");

    let rows = get_fixtures(&conn, day(2026, 10, 17), 7, &targets(&[39])).expect("query");
    let ids = rows.iter().map(|r| r.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![2, 3]);
}

#[test]
fn finished_statuses_and_untargeted_leagues_are_dropped() {
    let conn = seeded();
    insert_fixture(&conn, 1, Some(1), 10, Some(11), "2026-10-17T19:30:00+00:00", "FT");
    insert_fixture(&conn, 2, Some(1), 10, Some(11), "2026-10-17T19:30:00+00:00", "2H");
    insert_fixture(&conn, 3, Some(3), 10, Some(11), "2026-10-17T19:30:00+00:00", "NS");
    insert_fixture(&conn, 4, Some(2), 12, Some(10), "2026-10-18T03:00:00+00:00", "PST");
    insert_fixture(&conn, 5, Some(2), 12, Some(10), "2026-10-18T03:00:00+00:00", "NS");

    let rows = get_fixtures(&conn, day(2026, 10, 17), 7, &targets(&[39, 140])).expect("query");
    let ids = rows.iter().map(|r| r.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![2, 5]);
    assert_eq!(rows[0].display_status(), "live");
    assert_eq!(rows[1].display_status(), "upcoming");
    assert_eq!(rows[0].api_id, Some(5002));
}

#[test]
fn names_fall_back_from_chinese_to_english_to_placeholder() {
    let conn = seeded();
    insert_fixture(&conn, 1, Some(2), 12, None, "2026-10-18T03:00:00+00:00", "NS");
    insert_fixture(&conn, 2, None, 10, Some(11), "2026-10-18T03:00:00+00:00", "NS");

    let rows = get_fixtures(&conn, day(2026, 10, 17), 7, &targets(&[140])).expect("query");
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.league_name, "La Liga");
    assert_eq!(row.home_team, "Real Madrid");
    assert_eq!(row.away_team, UNKNOWN_AWAY);
    assert_eq!(row.event_date_formatted, "2026-10-18");
    assert_eq!(row.event_time_formatted, "03:00");
    assert_eq!(row.league_key(), "140");
}

#[test]
fn grouping_by_league_and_date() {
    let conn = seeded();
    insert_fixture(&conn, 1, Some(1), 10, Some(11), "2026-10-17T19:30:00+00:00", "NS");
    insert_fixture(&conn, 2, Some(2), 12, Some(10), "2026-10-18T03:00:00+00:00", "NS");
    insert_fixture(&conn, 3, Some(1), 11, Some(10), "2026-10-18T14:00:00+00:00", "NS");
    insert_fixture(&conn, 4, None, 11, Some(10), "2026-10-18T14:00:00+00:00", "NS");

    let all = get_fixtures(&conn, day(2026, 10, 17), 7, &targets(&[39, 140])).expect("query");
    let leagues = group_by_league(&all);
    let names = leagues.iter().map(|g| g.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["La Liga", "英超"]);
    assert_eq!(leagues[1].fixtures.len(), 2);
    assert_eq!(leagues[1].country, "England");

    let dates = group_by_date(&all);
    assert_eq!(dates.keys().cloned().collect::<Vec<_>>(), vec!["2026-10-17", "2026-10-18"]);
    assert_eq!(dates["2026-10-18"].len(), 2);
    assert!(!names.contains(&UNKNOWN_LEAGUE));
}

#[test]
fn counts_actionable_rows_in_a_file_database() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("fixtures.db");
    {
        let conn = Connection::open(&path).expect("create db");
        create_schema(&conn).expect("schema");
        insert_fixture(&conn, 1, Some(1), 10, Some(11), "2026-10-17T19:30:00+00:00", "NS");
        insert_fixture(&conn, 2, Some(1), 10, Some(11), "2026-10-17T19:30:00+00:00", "FT");
        insert_fixture(&conn, 3, Some(1), 10, Some(11), "2026-10-17T19:30:00+00:00", "HT");
    }

    let found = find_db_path(&[dir.path().join("missing.db"), path.clone()]).expect("found");
    assert_eq!(found, path);
    let conn = open_db(&found).expect("open read-only");
    assert_eq!(count_actionable(&conn).expect("count"), 2);
}

#[test]
fn missing_database_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = find_db_path(&[dir.path().join("nope.db")]).unwrap_err();
    assert!(format!("{err}").contains("fixtures.db"));
}
