use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::refresher::DEFAULT_REFRESH_SECS;

pub const DEFAULT_DAYS_AHEAD: u32 = 7;
pub const DEFAULT_OUTPUT_DIR: &str = "public";
pub const DEFAULT_DB_CANDIDATES: &[&str] = &[
    "api_football_sync/fixtures.db",
    "fixtures.db",
    "data/fixtures.db",
];

/// League api ids shown on the site when `TARGET_LEAGUE_IDS` is unset.
pub fn default_target_league_ids() -> Vec<u32> {
    (39..=500).collect()
}

#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub db_candidates: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub days_ahead: u32,
    pub target_league_ids: Vec<u32>,
    pub data_probe_url: Option<String>,
    pub refresh_interval: Duration,
}

impl SiteConfig {
    pub fn from_env() -> Self {
        let db_candidates = match opt_env("FIXTURES_DB") {
            Some(path) => vec![PathBuf::from(path)],
            None => DEFAULT_DB_CANDIDATES.iter().map(PathBuf::from).collect(),
        };
        let output_dir = opt_env("SITE_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));
        let days_ahead = env::var("SITE_DAYS_AHEAD")
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_DAYS_AHEAD)
            .clamp(1, 30);
        let target_league_ids = match env::var("TARGET_LEAGUE_IDS") {
            Ok(raw) if !raw.trim().is_empty() => parse_ids(&raw),
            _ => default_target_league_ids(),
        };
        let data_probe_url = opt_env("DATA_PROBE_URL");
        let refresh_secs = env::var("TIME_REFRESH_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_REFRESH_SECS)
            .max(5);

        Self {
            db_candidates,
            output_dir,
            days_ahead,
            target_league_ids,
            data_probe_url,
            refresh_interval: Duration::from_secs(refresh_secs),
        }
    }

    pub fn index_path(&self) -> PathBuf {
        self.output_dir.join("index.html")
    }

    /// Where the board's background probe reads from unless overridden.
    pub fn probe_source(&self) -> String {
        self.data_probe_url.clone().unwrap_or_else(|| {
            self.output_dir
                .join("api")
                .join("fixtures.json")
                .display()
                .to_string()
        })
    }
}

#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub repo_dir: PathBuf,
    pub data_dir: PathBuf,
    pub db_source: PathBuf,
    pub output_dir: PathBuf,
    pub days_ahead: u32,
    pub target_league_ids: Vec<u32>,
    pub ssh_remote: String,
    pub https_remote: String,
    pub branch: String,
    pub generator_cmd: Option<Vec<String>>,
    pub required_tools: Vec<String>,
    pub package_manager: Option<String>,
    pub report_dir: PathBuf,
    pub pages_url: String,
}

impl DeployConfig {
    pub fn from_env() -> Self {
        let site = SiteConfig::from_env();
        let repo_dir = opt_env("DEPLOY_REPO_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let data_dir = opt_env("DEPLOY_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| repo_dir.join("data"));
        let db_source = opt_env("DEPLOY_DB_SOURCE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("../api_football_sync/fixtures.db"));
        let output_dir = if site.output_dir.is_absolute() {
            site.output_dir.clone()
        } else {
            repo_dir.join(&site.output_dir)
        };
        let ssh_remote = env::var("DEPLOY_SSH_REMOTE")
            .unwrap_or_else(|_| "git@github.com:example/fixtures-site.git".to_string());
        let https_remote = env::var("DEPLOY_HTTPS_REMOTE")
            .unwrap_or_else(|_| "https://github.com/example/fixtures-site.git".to_string());
        let branch = env::var("DEPLOY_BRANCH")
            .ok()
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| "gh-pages".to_string());
        let generator_cmd = opt_env("DEPLOY_GENERATOR_CMD").map(|raw| {
            raw.split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        });
        let required_tools = opt_env("DEPLOY_REQUIRED_TOOLS")
            .map(|raw| {
                raw.split([',', ' '])
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_else(|| vec!["git".to_string()]);
        let package_manager = match env::var("DEPLOY_PACKAGE_MANAGER") {
            Ok(raw) if raw.trim().is_empty() || raw.trim() == "none" => None,
            Ok(raw) => Some(raw.trim().to_string()),
            Err(_) => Some("apt-get".to_string()),
        };
        let report_dir = opt_env("DEPLOY_REPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| repo_dir.clone());
        let pages_url = env::var("DEPLOY_PAGES_URL")
            .unwrap_or_else(|_| "https://example.github.io/fixtures-site/".to_string());

        Self {
            repo_dir,
            data_dir,
            db_source,
            output_dir,
            days_ahead: site.days_ahead,
            target_league_ids: site.target_league_ids,
            ssh_remote,
            https_remote,
            branch,
            generator_cmd,
            required_tools,
            package_manager,
            report_dir,
            pages_url,
        }
    }

    pub fn data_db_path(&self) -> PathBuf {
        self.data_dir.join("fixtures.db")
    }
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

pub fn parse_ids(raw: &str) -> Vec<u32> {
    let mut out = Vec::new();
    for part in raw.split([',', ';', ' ']) {
        let Ok(id) = part.trim().parse::<u32>() else {
            continue;
        };
        if id != 0 && !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
