use std::collections::HashMap;

pub const STATUS_LIVE: &str = "live";

/// One fixture card as the board sees it, read from the card's `data-*` attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FixtureRecord {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub league: String,
    pub league_id: String,
    pub date: String,
    pub time: String,
    pub status: String,
    pub kickoff_timestamp: Option<i64>,
}

impl FixtureRecord {
    /// Missing attributes become empty strings; a bad timestamp becomes `None`.
    pub fn from_attrs(attrs: &HashMap<String, String>) -> Self {
        let get = |key: &str| attrs.get(key).cloned().unwrap_or_default();
        Self {
            id: get("data-fixture-id"),
            home_team: get("data-home-team"),
            away_team: get("data-away-team"),
            league: get("data-league"),
            league_id: get("data-league-id"),
            date: get("data-date"),
            time: get("data-time"),
            status: get("data-status"),
            kickoff_timestamp: attrs.get("data-timestamp").and_then(|v| parse_timestamp(v)),
        }
    }

    pub fn is_live(&self) -> bool {
        self.status == STATUS_LIVE
    }

    pub fn matches_search(&self, needle_lower: &str) -> bool {
        if needle_lower.is_empty() {
            return true;
        }
        self.home_team.to_lowercase().contains(needle_lower)
            || self.away_team.to_lowercase().contains(needle_lower)
            || self.league.to_lowercase().contains(needle_lower)
    }

    pub fn share_text(&self) -> String {
        share_text(&self.league, &self.home_team, &self.away_team, &self.time)
    }
}

pub fn share_text(league: &str, home: &str, away: &str, time: &str) -> String {
    format!("📅 {league}: {home} vs {away} - {time}")
}

/// Zero counts as absent, like an unset timestamp on the rendered label.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|ts| *ts != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn missing_attributes_degrade_to_empty() {
        let rec = FixtureRecord::from_attrs(&attrs(&[("data-fixture-id", "9")]));
        assert_eq!(rec.id, "9");
        assert!(rec.home_team.is_empty());
        assert_eq!(rec.kickoff_timestamp, None);
    }

    #[test]
    fn zero_or_garbage_timestamp_is_none() {
        assert_eq!(parse_timestamp("0"), None);
        assert_eq!(parse_timestamp("abc"), None);
        assert_eq!(parse_timestamp(" 1700000000 "), Some(1_700_000_000));
    }

    #[test]
    fn share_text_format() {
        assert_eq!(share_text("英超", "A隊", "B隊", "20:00"), "📅 英超: A隊 vs B隊 - 20:00");
    }
}
