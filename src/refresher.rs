use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use crate::board::BoardEvent;

pub const DEFAULT_REFRESH_SECS: u64 = 60;

/// Periodic time-label refresh. The startup refresh is the board's own job;
/// this only sends the recurring ticks and exits once the board hangs up.
pub struct TimeRefresher {
    events: Sender<BoardEvent>,
    interval: Duration,
}

impl TimeRefresher {
    pub fn new(events: Sender<BoardEvent>, interval: Duration) -> Self {
        Self { events, interval }
    }

    pub fn spawn(self) -> thread::JoinHandle<()> {
        thread::spawn(move || self.run())
    }

    fn run(self) {
        loop {
            thread::sleep(self.interval);
            if self.events.send(BoardEvent::Tick).is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn ticks_until_receiver_drops() {
        let (tx, rx) = mpsc::channel();
        let handle = TimeRefresher::new(tx, Duration::from_millis(5)).spawn();
        let first = rx.recv_timeout(Duration::from_secs(2)).expect("tick");
        assert!(matches!(first, BoardEvent::Tick));
        drop(rx);
        handle.join().expect("refresher exits cleanly");
    }
}
