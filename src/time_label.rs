/// Kickoff-relative label shown next to each fixture.
///
/// There is no match clock behind this: anything within two hours of kickoff
/// counts as in progress, so half-time and stoppage time are not modelled.
pub const LIVE_WINDOW_SECS: i64 = 7200;

pub const FINISHED_TEXT: &str = "已結束";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeState {
    Upcoming,
    Live,
    Finished,
}

impl TimeState {
    pub fn class_name(self) -> &'static str {
        match self {
            TimeState::Upcoming => "upcoming",
            TimeState::Live => "live",
            TimeState::Finished => "finished",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeLabel {
    pub text: String,
    pub state: TimeState,
}

pub fn time_label(now: i64, kickoff: i64) -> TimeLabel {
    let diff = now - kickoff;
    if diff < 0 {
        let remaining = -diff;
        let hours = remaining / 3600;
        let minutes = (remaining % 3600) / 60;
        let text = if hours > 0 {
            format!("{hours}小時{minutes}分鐘後開始")
        } else {
            format!("{minutes}分鐘後開始")
        };
        TimeLabel {
            text,
            state: TimeState::Upcoming,
        }
    } else if diff < LIVE_WINDOW_SECS {
        TimeLabel {
            text: format!("{}'", diff / 60),
            state: TimeState::Live,
        }
    } else {
        TimeLabel {
            text: FINISHED_TEXT.to_string(),
            state: TimeState::Finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_760_000_000;

    #[test]
    fn upcoming_with_hours() {
        let label = time_label(NOW, NOW + 5400);
        assert_eq!(label.text, "1小時30分鐘後開始");
        assert_eq!(label.state, TimeState::Upcoming);
    }

    #[test]
    fn upcoming_under_an_hour_drops_hours() {
        let label = time_label(NOW, NOW + 59 * 60 + 30);
        assert_eq!(label.text, "59分鐘後開始");
    }

    #[test]
    fn in_progress_shows_elapsed_minutes() {
        let label = time_label(NOW, NOW - 600);
        assert_eq!(label.text, "10'");
        assert_eq!(label.state, TimeState::Live);
        assert_eq!(time_label(NOW, NOW).text, "0'");
    }

    #[test]
    fn finished_after_two_hours() {
        let label = time_label(NOW, NOW - 10_000);
        assert_eq!(label.text, FINISHED_TEXT);
        assert_eq!(label.state, TimeState::Finished);
        assert_eq!(time_label(NOW, NOW - LIVE_WINDOW_SECS).state, TimeState::Finished);
        assert_eq!(time_label(NOW, NOW - LIVE_WINDOW_SECS + 1).state, TimeState::Live);
    }
}
