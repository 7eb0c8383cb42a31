use std::collections::VecDeque;

/// Sum of damage samples over a trailing window of simulated time.
#[derive(Clone, Debug)]
pub struct RollingWindow {
    length: f64,
    samples: VecDeque<(f64, f32)>,
    sum: f64,
    now: f64,
}

impl RollingWindow {
    /// Creates an empty window spanning `length` seconds.
    ///
    /// Non-positive or non-finite lengths collapse to a one second window.
    #[must_use]
    pub fn new(length: f32) -> Self {
        let length = if length.is_finite() && length > 0.0 {
            f64::from(length)
        } else {
            1.0
        };
        Self {
            length,
            samples: VecDeque::new(),
            sum: 0.0,
            now: 0.0,
        }
    }

    /// Moves the window's trailing edge to `now` and forgets older samples.
    pub fn advance_to(&mut self, now: f64) {
        self.now = self.now.max(now);
        let horizon = self.now - self.length;
        while let Some(&(at, amount)) = self.samples.front() {
            if at > horizon {
                break;
            }
            self.sum -= f64::from(amount);
            let _ = self.samples.pop_front();
        }
        if self.samples.is_empty() {
            self.sum = 0.0;
        }
    }

    /// Records `amount` at the current time.
    pub fn record(&mut self, amount: f32) {
        if amount <= 0.0 {
            return;
        }
        self.samples.push_back((self.now, amount));
        self.sum += f64::from(amount);
    }

    /// Average rate over the window, or over the elapsed time while the
    /// simulation is younger than the window.
    #[must_use]
    pub fn rate(&self) -> f32 {
        let span = self.length.min(self.now);
        if span <= 0.0 {
            return 0.0;
        }
        (self.sum / span) as f32
    }
}

/// Fraction of fired shots that landed, zero before the first shot.
#[must_use]
pub fn accuracy(fired: u64, landed: u64) -> f32 {
    if fired == 0 {
        return 0.0;
    }
    (landed.min(fired) as f64 / fired as f64) as f32
}
