use std::time::{Duration, Instant};

/// Five minutes, the point where the display turns red and the one-shot
/// warning fires.
pub const WARNING_THRESHOLD: Duration = Duration::from_secs(300);

/// Per-stage countdown computed from wall-clock deltas rather than tick
/// counting, so a throttled event loop never drifts the display. Pausing
/// accumulates into `paused_total`; remaining time is duration minus
/// unpaused elapsed time.
#[derive(Clone, Debug)]
pub struct StageTimer {
    duration: Duration,
    started_at: Instant,
    paused_at: Option<Instant>,
    paused_total: Duration,
    warned: bool,
}

impl StageTimer {
    pub fn start(duration: Duration) -> Self {
        Self::start_at(duration, Instant::now())
    }

    pub fn start_at(duration: Duration, now: Instant) -> Self {
        Self {
            duration,
            started_at: now,
            paused_at: None,
            paused_total: Duration::ZERO,
            warned: false,
        }
    }

    fn unpaused_elapsed(&self, now: Instant) -> Duration {
        let frozen = match self.paused_at {
            Some(paused_at) => self.paused_total + now.saturating_duration_since(paused_at),
            None => self.paused_total,
        };
        now.saturating_duration_since(self.started_at)
            .saturating_sub(frozen)
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.duration.saturating_sub(self.unpaused_elapsed(now))
    }

    pub fn expired(&self, now: Instant) -> bool {
        self.remaining(now) == Duration::ZERO
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Stop the countdown. No-op if already paused.
    pub fn pause(&mut self, now: Instant) {
        if self.paused_at.is_none() {
            self.paused_at = Some(now);
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += now.saturating_duration_since(paused_at);
        }
    }

    /// True while the display should render in the warning color.
    pub fn in_warning_zone(&self, now: Instant) -> bool {
        self.remaining(now) <= WARNING_THRESHOLD
    }

    /// Returns true exactly once per stage, the first time remaining time
    /// crosses the five-minute mark.
    pub fn take_warning(&mut self, now: Instant) -> bool {
        if !self.warned && self.in_warning_zone(now) && !self.expired(now) {
            self.warned = true;
            return true;
        }
        false
    }

    /// `MM:SS` for the header clock.
    pub fn display(&self, now: Instant) -> String {
        let remaining = self.remaining(now).as_secs();
        format!("{:02}:{:02}", remaining / 60, remaining % 60)
    }
}
