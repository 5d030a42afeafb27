/// Tunables for scroll momentum, all in pixels per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSettings {
    pub row_height: f32,
    /// Speeds at or below this count as stopped.
    pub stop_threshold: f32,
    /// Velocity multiplier applied every moving tick.
    pub damping: f32,
    /// Multiplier pulling overscroll back past either end.
    pub springback: f32,
    pub wheel_gain: f32,
    /// Existing velocity is scaled by this before a wheel impulse is added.
    pub wheel_acceleration: f32,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            row_height: 300.0,
            stop_threshold: 0.01,
            damping: 0.97,
            springback: 0.9,
            wheel_gain: 5.0,
            wheel_acceleration: 1.1,
        }
    }
}

/// Scroll position as whole rows plus a pixel remainder.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollState {
    pub rows_scrolled: u64,
    pub sub_row_offset: f32,
    pub velocity: f32,
}

impl ScrollState {
    /// Total distance from the top of the gallery in pixels.
    pub fn position(&self, row_height: f32) -> f64 {
        self.rows_scrolled as f64 * f64::from(row_height) + f64::from(self.sub_row_offset)
    }
}

#[derive(Debug, Clone)]
pub struct ScrollAnimator {
    settings: ScrollSettings,
    state: ScrollState,
    max_rows: u64,
}

impl ScrollAnimator {
    pub fn new(settings: ScrollSettings) -> Self {
        Self::with_state(settings, ScrollState::default())
    }

    pub fn with_state(settings: ScrollSettings, state: ScrollState) -> Self {
        Self {
            settings,
            state,
            max_rows: u64::MAX,
        }
    }

    pub fn state(&self) -> &ScrollState {
        &self.state
    }

    pub fn settings(&self) -> &ScrollSettings {
        &self.settings
    }

    /// The deepest reachable top row leaves a full screen of rows below it.
    pub fn set_viewport_rows(&mut self, viewport_rows: usize) {
        self.max_rows = u64::MAX - viewport_rows as u64;
    }

    pub fn max_rows(&self) -> u64 {
        self.max_rows
    }

    /// Wheel input compounds with the current velocity.
    pub fn apply_wheel(&mut self, delta: f32) {
        let boosted = self.state.velocity * self.settings.wheel_acceleration;
        self.state.velocity = boosted - delta * self.settings.wheel_gain;
    }

    /// Whether another tick could still change the state.
    pub fn is_active(&self) -> bool {
        self.state.velocity.abs() > self.settings.stop_threshold
            || self.overscrolled_top()
            || self.overscrolled_bottom()
    }

    /// Advances one fixed tick; returns whether anything visible changed.
    pub fn tick(&mut self) -> bool {
        let settings = self.settings;
        let mut dirty = false;

        if self.state.velocity.abs() > settings.stop_threshold {
            dirty = true;
            self.state.sub_row_offset += self.state.velocity;
            self.state.velocity *= settings.damping;

            // At most one row changes hands per tick.
            if self.state.sub_row_offset > settings.row_height
                && self.state.rows_scrolled < self.max_rows
            {
                self.state.rows_scrolled += 1;
                self.state.sub_row_offset -= settings.row_height;
            } else if self.state.sub_row_offset < 0.0 && self.state.rows_scrolled > 0 {
                self.state.rows_scrolled -= 1;
                self.state.sub_row_offset += settings.row_height;
            }
        }

        if self.overscrolled_top() {
            self.state.velocity *= settings.springback;
            self.state.sub_row_offset *= settings.springback;
            dirty = true;
        } else if self.overscrolled_bottom() {
            self.state.velocity *= settings.springback;
            self.state.sub_row_offset = settings.row_height
                + (self.state.sub_row_offset - settings.row_height) * settings.springback;
            dirty = true;
        }

        dirty
    }

    fn overscrolled_top(&self) -> bool {
        self.state.rows_scrolled == 0 && self.state.sub_row_offset < -self.settings.stop_threshold
    }

    fn overscrolled_bottom(&self) -> bool {
        self.state.rows_scrolled >= self.max_rows
            && self.state.sub_row_offset > self.settings.row_height + self.settings.stop_threshold
    }
}
