use std::time::{Duration, Instant};

/// Silence inserted between one clip ending and the next starting.
const CLIP_GAP: Duration = Duration::from_secs(1);

/// What the listening header should show for audio right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioStatus {
    Idle,
    Playing {
        section: usize,
        position: Duration,
        total: Duration,
    },
    /// Between clips, about to start `next`.
    Gap { next: usize },
    Finished,
}

#[derive(Clone, Debug)]
enum SeqState {
    Idle,
    Playing {
        section: usize,
        started_at: Instant,
        total: Duration,
    },
    Gap { next: usize, since: Instant },
    Finished,
}

/// Sequential autoplay bookkeeping for the listening stage.
///
/// Started once when the stage begins and never restarted: section
/// navigation has no effect on which clip is playing, and there are no
/// seek or replay operations. Sections without a clip are skipped
/// immediately; each clip that does exist runs for its authored duration,
/// then a fixed one-second gap precedes the next clip.
#[derive(Clone, Debug)]
pub struct AudioSequencer {
    clips: Vec<Option<Duration>>,
    state: SeqState,
    started: bool,
    paused_at: Option<Instant>,
}

impl AudioSequencer {
    pub fn new(clips: Vec<Option<Duration>>) -> Self {
        Self {
            clips,
            state: SeqState::Idle,
            started: false,
            paused_at: None,
        }
    }

    /// Begin playback at section 0. Subsequent calls are no-ops: audio is
    /// initialized at most once per session.
    pub fn start(&mut self, now: Instant) {
        if self.started {
            return;
        }
        self.started = true;
        self.state = self.enter_section(0, now);
    }

    /// First section at or after `index` that has a clip.
    fn enter_section(&self, index: usize, now: Instant) -> SeqState {
        for (section, clip) in self.clips.iter().enumerate().skip(index) {
            if let Some(total) = clip {
                return SeqState::Playing {
                    section,
                    started_at: now,
                    total: *total,
                };
            }
        }
        SeqState::Finished
    }

    /// Advance the playback clock. Call on every tick while unpaused.
    pub fn tick(&mut self, now: Instant) {
        if self.paused_at.is_some() {
            return;
        }
        match self.state {
            SeqState::Playing {
                section,
                started_at,
                total,
            } => {
                if now.saturating_duration_since(started_at) >= total {
                    self.state = SeqState::Gap {
                        next: section + 1,
                        since: now,
                    };
                }
            }
            SeqState::Gap { next, since } => {
                if now.saturating_duration_since(since) >= CLIP_GAP {
                    self.state = self.enter_section(next, now);
                }
            }
            SeqState::Idle | SeqState::Finished => {}
        }
    }

    /// Freeze the clock, preserving the in-clip position.
    pub fn pause(&mut self, now: Instant) {
        if self.paused_at.is_none() && self.started {
            self.paused_at = Some(now);
        }
    }

    pub fn resume(&mut self, now: Instant) {
        let Some(paused_at) = self.paused_at.take() else {
            return;
        };
        let pause_len = now.saturating_duration_since(paused_at);
        match &mut self.state {
            SeqState::Playing { started_at, .. } => *started_at += pause_len,
            SeqState::Gap { since, .. } => *since += pause_len,
            SeqState::Idle | SeqState::Finished => {}
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn status(&self, now: Instant) -> AudioStatus {
        let effective_now = self.paused_at.unwrap_or(now);
        match self.state {
            SeqState::Idle => AudioStatus::Idle,
            SeqState::Playing {
                section,
                started_at,
                total,
            } => AudioStatus::Playing {
                section,
                position: effective_now.saturating_duration_since(started_at).min(total),
                total,
            },
            SeqState::Gap { next, .. } => AudioStatus::Gap { next },
            SeqState::Finished => AudioStatus::Finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(t0: Instant, secs: u64) -> Instant {
        t0 + Duration::from_secs(secs)
    }

    fn clips(secs: &[Option<u64>]) -> Vec<Option<Duration>> {
        secs.iter().map(|s| s.map(Duration::from_secs)).collect()
    }

    #[test]
    fn test_starts_with_first_clip() {
        let t0 = Instant::now();
        let mut seq = AudioSequencer::new(clips(&[Some(10), Some(20)]));
        assert_eq!(seq.status(t0), AudioStatus::Idle);
        seq.start(t0);
        assert!(matches!(
            seq.status(t0),
            AudioStatus::Playing { section: 0, .. }
        ));
    }

    #[test]
    fn test_advances_after_clip_plus_gap() {
        let t0 = Instant::now();
        let mut seq = AudioSequencer::new(clips(&[Some(10), Some(20)]));
        seq.start(t0);

        seq.tick(at(t0, 10));
        assert_eq!(seq.status(at(t0, 10)), AudioStatus::Gap { next: 1 });

        // Gap lasts a full second.
        seq.tick(at(t0, 10) + Duration::from_millis(500));
        assert_eq!(seq.status(at(t0, 10)), AudioStatus::Gap { next: 1 });

        seq.tick(at(t0, 11));
        assert!(matches!(
            seq.status(at(t0, 11)),
            AudioStatus::Playing { section: 1, .. }
        ));
    }

    #[test]
    fn test_sections_without_audio_are_skipped() {
        let t0 = Instant::now();
        let mut seq = AudioSequencer::new(clips(&[None, None, Some(5)]));
        seq.start(t0);
        assert!(matches!(
            seq.status(t0),
            AudioStatus::Playing { section: 2, .. }
        ));
    }

    #[test]
    fn test_finishes_after_last_clip() {
        let t0 = Instant::now();
        let mut seq = AudioSequencer::new(clips(&[Some(5), None]));
        seq.start(t0);
        seq.tick(at(t0, 5));
        seq.tick(at(t0, 6));
        assert_eq!(seq.status(at(t0, 6)), AudioStatus::Finished);
    }

    #[test]
    fn test_start_is_once_only() {
        let t0 = Instant::now();
        let mut seq = AudioSequencer::new(clips(&[Some(10)]));
        seq.start(t0);
        seq.tick(at(t0, 4));
        // A second start (e.g. re-entering the section) must not rewind.
        seq.start(at(t0, 4));
        match seq.status(at(t0, 4)) {
            AudioStatus::Playing { position, .. } => {
                assert_eq!(position, Duration::from_secs(4));
            }
            other => panic!("unexpected status: {other:?}"),
        }
    }

    #[test]
    fn test_pause_freezes_position() {
        let t0 = Instant::now();
        let mut seq = AudioSequencer::new(clips(&[Some(30)]));
        seq.start(t0);
        seq.pause(at(t0, 12));

        // Ticks while paused change nothing.
        seq.tick(at(t0, 40));
        match seq.status(at(t0, 40)) {
            AudioStatus::Playing { position, .. } => {
                assert_eq!(position, Duration::from_secs(12));
            }
            other => panic!("unexpected status: {other:?}"),
        }

        seq.resume(at(t0, 50));
        seq.tick(at(t0, 55));
        match seq.status(at(t0, 55)) {
            AudioStatus::Playing { position, .. } => {
                assert_eq!(position, Duration::from_secs(17));
            }
            other => panic!("unexpected status: {other:?}"),
        }
    }

    #[test]
    fn test_no_clips_at_all() {
        let t0 = Instant::now();
        let mut seq = AudioSequencer::new(clips(&[None, None]));
        seq.start(t0);
        assert_eq!(seq.status(t0), AudioStatus::Finished);
    }
}
