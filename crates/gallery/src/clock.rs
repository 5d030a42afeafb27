use std::time::Duration;

/// Converts wall-clock time into a whole number of fixed simulation ticks.
#[derive(Debug, Clone)]
pub struct FixedStep {
    interval: Duration,
    accumulated: Duration,
    max_catch_up: u32,
}

impl FixedStep {
    pub const DEFAULT_MAX_CATCH_UP: u32 = 120;

    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_micros(100)),
            accumulated: Duration::ZERO,
            max_catch_up: Self::DEFAULT_MAX_CATCH_UP,
        }
    }

    pub fn with_max_catch_up(mut self, ticks: u32) -> Self {
        self.max_catch_up = ticks.max(1);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Banks `elapsed` and returns how many ticks are due. After a long stall
    /// the backlog beyond `max_catch_up` ticks is dropped.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulated += elapsed;
        let mut ticks = 0;
        while self.accumulated >= self.interval {
            self.accumulated -= self.interval;
            ticks += 1;
            if ticks == self.max_catch_up {
                self.accumulated = Duration::ZERO;
                break;
            }
        }
        ticks
    }

    pub fn until_next_tick(&self) -> Duration {
        self.interval.saturating_sub(self.accumulated)
    }

    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
    }
}
