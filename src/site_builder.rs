//! Static site output: the index page, one page per league, the JSON API
//! files and the stylesheet/script assets.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::board::FilterToken;
use crate::db_reader::{FixtureRow, LeagueGroup, group_by_date, group_by_league};

pub const SITE_TITLE: &str = "足球賽事數據中心";
pub const SITE_SUBTITLE: &str = "實時更新的足球賽事信息（繁體中文）";
const PENDING: &str = "待定";

const STYLE_CSS: &str = include_str!("../assets/style.css");
const MAIN_JS: &str = include_str!("../assets/main.js");

const LEAGUE_ICONS: &[(&str, &str)] = &[
    ("英超", "premier-league"),
    ("西甲", "la-liga"),
    ("德甲", "bundesliga"),
    ("意甲", "serie-a"),
    ("法甲", "ligue-1"),
    ("歐冠", "champions-league"),
    ("歐霸", "europa-league"),
    ("歐協", "europa-conference"),
    ("亞冠", "afc-champions"),
    ("中超", "csl"),
];

#[derive(Debug, Clone)]
pub struct JsonApiPaths {
    pub fixtures: PathBuf,
    pub leagues: PathBuf,
    pub dates: PathBuf,
    pub stats: PathBuf,
}

#[derive(Debug, Clone)]
pub struct GeneratedSite {
    pub index: PathBuf,
    pub league_pages: BTreeMap<String, PathBuf>,
    pub json_api: JsonApiPaths,
    pub css: PathBuf,
    pub js: PathBuf,
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    status: &'a str,
    count: usize,
    generated_at: &'a str,
    data: T,
}

#[derive(Serialize)]
struct LeagueStat<'a> {
    id: Option<i64>,
    name: &'a str,
    count: usize,
}

#[derive(Serialize)]
struct Stats<'a> {
    status: &'a str,
    generated_at: &'a str,
    total_fixtures: usize,
    total_leagues: usize,
    total_dates: usize,
    leagues: Vec<LeagueStat<'a>>,
}

pub struct SiteBuilder {
    output_dir: PathBuf,
}

impl SiteBuilder {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("create output dir {}", output_dir.display()))?;
        log::info!("HTML生成器初始化完成, 輸出目錄: {}", output_dir.display());
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn generate_all(&self, fixtures: &[FixtureRow], days_ahead: u32) -> Result<GeneratedSite> {
        log::info!("開始生成所有靜態文件...");
        let site = GeneratedSite {
            index: self.generate_index(fixtures, days_ahead)?,
            league_pages: self.generate_league_pages(fixtures)?,
            json_api: self.generate_json_api(fixtures)?,
            css: self.generate_css()?,
            js: self.generate_js()?,
        };
        log::info!("所有靜態文件生成完成");
        Ok(site)
    }

    pub fn generate_index(&self, fixtures: &[FixtureRow], days_ahead: u32) -> Result<PathBuf> {
        let by_date = group_by_date(fixtures);
        let by_league = group_by_league(fixtures);
        let generated_at = now_stamp();

        let mut body = String::new();
        body.push_str("<section class=\"stats-container\">\n");
        for (value, label) in [
            (fixtures.len().to_string(), "場賽事"),
            (by_league.len().to_string(), "個聯賽"),
            (days_ahead.to_string(), "天內賽程"),
        ] {
            body.push_str(&format!(
                "<div class=\"stat-card\"><h3>{value}</h3><p>{label}</p></div>\n"
            ));
        }
        body.push_str("</section>\n");

        body.push_str("<section class=\"filter-bar\">\n");
        for token in FilterToken::ALL {
            let active = if token == FilterToken::All { " active" } else { "" };
            body.push_str(&format!(
                "<button class=\"filter-btn{active}\" data-filter=\"{}\">{}</button>\n",
                token.as_str(),
                token.label()
            ));
        }
        body.push_str(
            "<input id=\"search-input\" type=\"search\" placeholder=\"搜索球隊或聯賽\">\n</section>\n",
        );

        body.push_str("<nav class=\"date-nav\"><div class=\"date-list\">\n");
        for (date, rows) in &by_date {
            body.push_str(&format!(
                "<div class=\"date-item\" data-date=\"{}\">{} ({})</div>\n",
                escape_html(date),
                escape_html(&format_date(date)),
                rows.len()
            ));
        }
        body.push_str("</div></nav>\n");

        body.push_str("<nav class=\"league-nav\"><ul class=\"league-list\">\n");
        for group in &by_league {
            body.push_str(&format!(
                "<li class=\"league-item\" data-league-id=\"{}\">{} ({})</li>\n",
                group.id.map(|id| id.to_string()).unwrap_or_default(),
                escape_html(&group.name),
                group.fixtures.len()
            ));
        }
        body.push_str("</ul></nav>\n");

        body.push_str("<section class=\"fixtures-container\">\n");
        for fixture in fixtures {
            body.push_str(&render_card(fixture));
        }
        if fixtures.is_empty() {
            body.push_str("<p class=\"empty\">暫無賽事</p>\n");
        }
        body.push_str("</section>\n");

        let html = page(SITE_TITLE, SITE_SUBTITLE, &body, &generated_at, "");
        let path = self.output_dir.join("index.html");
        write_file(&path, &html)?;
        log::info!("首頁已生成: {}", path.display());
        Ok(path)
    }

    /// One page per league under `leagues/`, keyed by league api id.
    pub fn generate_league_pages(&self, fixtures: &[FixtureRow]) -> Result<BTreeMap<String, PathBuf>> {
        let dir = self.output_dir.join("leagues");
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        let generated_at = now_stamp();

        let mut pages = BTreeMap::new();
        for group in group_by_league(fixtures) {
            let key = group.id.map(|id| id.to_string()).unwrap_or_default();
            let mut body = String::from(
                "<p class=\"back\"><a href=\"../index.html\">← 返回首頁</a></p>\n\
                 <section class=\"fixtures-container\">\n",
            );
            for fixture in &group.fixtures {
                body.push_str(&render_card(fixture));
            }
            body.push_str("</section>\n");

            let title = format!("{} - 賽事列表", group.name);
            let subtitle = format!("{} 場賽事", group.fixtures.len());
            let html = page(&title, &subtitle, &body, &generated_at, "../");
            let path = dir.join(format!("{}.html", safe_file_name(&group.name, &key)));
            write_file(&path, &html)?;
            pages.insert(key, path);
        }
        log::info!("已生成 {} 個聯賽分頁", pages.len());
        Ok(pages)
    }

    pub fn generate_json_api(&self, fixtures: &[FixtureRow]) -> Result<JsonApiPaths> {
        let dir = self.output_dir.join("api");
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        let generated_at = Local::now().to_rfc3339();

        let by_league: Vec<LeagueGroup> = group_by_league(fixtures);
        let by_date = group_by_date(fixtures);

        let fixtures_path = dir.join("fixtures.json");
        write_json(
            &fixtures_path,
            &Envelope {
                status: "success",
                count: fixtures.len(),
                generated_at: &generated_at,
                data: fixtures,
            },
        )?;

        let leagues_path = dir.join("leagues.json");
        write_json(
            &leagues_path,
            &Envelope {
                status: "success",
                count: by_league.len(),
                generated_at: &generated_at,
                data: &by_league,
            },
        )?;

        let dates_path = dir.join("dates.json");
        write_json(
            &dates_path,
            &Envelope {
                status: "success",
                count: by_date.len(),
                generated_at: &generated_at,
                data: &by_date,
            },
        )?;

        let stats_path = dir.join("stats.json");
        write_json(
            &stats_path,
            &Stats {
                status: "success",
                generated_at: &generated_at,
                total_fixtures: fixtures.len(),
                total_leagues: by_league.len(),
                total_dates: by_date.len(),
                leagues: by_league
                    .iter()
                    .map(|g| LeagueStat {
                        id: g.id,
                        name: &g.name,
                        count: g.fixtures.len(),
                    })
                    .collect(),
            },
        )?;

        log::info!("JSON API已生成到 {}", dir.display());
        Ok(JsonApiPaths {
            fixtures: fixtures_path,
            leagues: leagues_path,
            dates: dates_path,
            stats: stats_path,
        })
    }

    pub fn generate_css(&self) -> Result<PathBuf> {
        let path = self.output_dir.join("css").join("style.css");
        write_file(&path, STYLE_CSS)?;
        Ok(path)
    }

    pub fn generate_js(&self) -> Result<PathBuf> {
        let path = self.output_dir.join("js").join("main.js");
        write_file(&path, MAIN_JS)?;
        Ok(path)
    }
}

fn render_card(f: &FixtureRow) -> String {
    let id = f.api_id.unwrap_or(f.id).to_string();
    let league = escape_html(&f.league_name);
    let home = escape_html(&f.home_team);
    let away = escape_html(&f.away_team);
    let date = escape_html(&f.event_date_formatted);
    let time = escape_html(&format_time(&f.event_time_formatted));
    let timestamp = f.event_timestamp.unwrap_or(0);
    let icon = league_icon(&f.league_name);
    let venue = f
        .venue_name
        .as_deref()
        .map(|v| match f.venue_city.as_deref() {
            Some(city) if !city.is_empty() => format!("{v}, {city}"),
            _ => v.to_string(),
        })
        .unwrap_or_else(|| PENDING.to_string());
    let round = f.round.clone().unwrap_or_default();

    format!(
        r#"<article class="fixture-card {icon}" data-fixture-id="{id}" data-home-team="{home}" data-away-team="{away}" data-league="{league}" data-league-id="{league_id}" data-date="{date}" data-time="{time}" data-status="{status}" data-timestamp="{timestamp}">
<div class="fixture-header"><span class="league-badge">{league}</span><span class="fixture-time">{date_label} {time}</span></div>
<div class="fixture-teams"><div class="team"><div class="team-name">{home}</div><div class="team-country">{home_country}</div></div><div class="vs">VS</div><div class="team"><div class="team-name">{away}</div><div class="team-country">{away_country}</div></div></div>
<div class="fixture-details"><div class="detail-item">{venue}</div><div class="detail-item">{round}</div><div class="detail-item"><span class="live-time" data-timestamp="{timestamp}">{time}</span></div><div class="detail-item"><button class="share-btn" data-share-id="{id}">分享</button></div></div>
</article>
"#,
        league_id = f.league_key(),
        status = escape_html(&f.display_status()),
        date_label = escape_html(&format_date(&f.event_date_formatted)),
        home_country = escape_html(f.home_team_country.as_deref().unwrap_or_default()),
        away_country = escape_html(f.away_team_country.as_deref().unwrap_or_default()),
        venue = escape_html(&venue),
        round = escape_html(&round),
    )
}

fn page(title: &str, subtitle: &str, body: &str, generated_at: &str, root: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="zh-Hant">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="{root}css/style.css">
</head>
<body>
<header><div class="container"><h1>{title}</h1><p class="subtitle">{subtitle}</p></div></header>
<main class="container">
{body}</main>
<footer><div class="container"><p>數據更新時間: {generated_at}</p></div></footer>
<script src="{root}js/main.js"></script>
</body>
</html>
"#,
        title = escape_html(title),
        subtitle = escape_html(subtitle),
    )
}

/// `YYYY-MM-DD` → `MM月DD日`; anything else passes through; empty → `待定`.
pub fn format_date(date: &str) -> String {
    if date.is_empty() {
        return PENDING.to_string();
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%m月%d日").to_string())
        .unwrap_or_else(|_| date.to_string())
}

pub fn format_time(time: &str) -> String {
    if time.is_empty() {
        PENDING.to_string()
    } else {
        time.to_string()
    }
}

pub fn league_icon(league_name: &str) -> &'static str {
    LEAGUE_ICONS
        .iter()
        .find(|(key, _)| league_name.contains(key))
        .map(|(_, icon)| *icon)
        .unwrap_or("default-league")
}

/// Keeps alphanumerics, spaces, `-` and `_`, then maps separators to `_`.
pub fn safe_file_name(league_name: &str, league_key: &str) -> String {
    let kept: String = league_name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let name = kept.trim().replace([' ', '-'], "_");
    if name.is_empty() {
        format!("league_{league_key}")
    } else {
        name
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn now_stamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }
    fs::write(path, content).with_context(|| format!("write {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize json api")?;
    write_file(path, &json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_filter() {
        assert_eq!(format_date("2026-10-17"), "10月17日");
        assert_eq!(format_date("未知日期"), "未知日期");
        assert_eq!(format_date(""), "待定");
    }

    #[test]
    fn icon_lookup_by_substring() {
        assert_eq!(league_icon("英超聯賽"), "premier-league");
        assert_eq!(league_icon("日職"), "default-league");
    }

    #[test]
    fn safe_names() {
        assert_eq!(safe_file_name("Premier League", "39"), "Premier_League");
        assert_eq!(safe_file_name("K-League 1", "292"), "K_League_1");
        assert_eq!(safe_file_name("英超", "39"), "英超");
        assert_eq!(safe_file_name("!!!", "7"), "league_7");
    }

    #[test]
    fn escapes_attribute_breakers() {
        assert_eq!(escape_html(r#"A "B" & <C>"#), "A &quot;B&quot; &amp; &lt;C&gt;");
    }
}
