//! Time-based debouncing of a boolean signal.

use std::time::Duration;

/// Which transitions must persist before they are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebounceType {
    /// false → true is delayed; true → false passes through.
    #[default]
    Rising,
    /// true → false is delayed; false → true passes through.
    Falling,
    /// Both transitions are delayed.
    Both,
}

/// Reports a change only after the raw input has held the new value for
/// `debounce` time. Time comes from the caller so the filter follows the
/// scheduler's tick timestamp.
#[derive(Debug, Clone)]
pub struct Debouncer {
    debounce: Duration,
    kind: DebounceType,
    baseline: bool,
    since: Option<Duration>,
}

impl Debouncer {
    pub fn new(debounce: Duration, kind: DebounceType) -> Self {
        Self {
            debounce,
            kind,
            baseline: kind == DebounceType::Falling,
            since: None,
        }
    }

    pub fn calculate(&mut self, input: bool, now: Duration) -> bool {
        let since = self.since.get_or_insert(now);
        if input == self.baseline {
            *since = now;
        }

        if now.saturating_sub(*since) >= self.debounce {
            if self.kind == DebounceType::Both {
                self.baseline = input;
                *since = now;
            }
            input
        } else {
            self.baseline
        }
    }
}
