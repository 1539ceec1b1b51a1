//! Playback clock
//!
//! Drives the "current time" of a step animation from exactly one source:
//! the internal tick (wall-clock deltas, wrapping at the duration) or an
//! external audio clock whose position is read once per frame and taken as
//! truth. Only the active source may write the time.

use std::time::Instant;

/// Default internal tick cadence
pub const DEFAULT_TICK_RATE_HZ: f64 = 60.0;

/// Source of the current time
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClockSource {
    /// Advanced by `tick`/`tick_wall_clock`
    #[default]
    Internal,
    /// Read from an [`AudioClock`] via `sync_audio`
    Audio,
}

/// External audio playback position
pub trait AudioClock {
    /// Current position in seconds, `None` while no audio is loaded
    fn position(&self) -> Option<f64>;
}

/// Controllable clock for step playback
#[derive(Debug)]
pub struct PlaybackClock {
    /// Current time in seconds
    current: f64,
    duration: f64,
    running: bool,
    source: ClockSource,
    /// Wrap to 0 at the end instead of stopping
    loop_playback: bool,
    speed: f64,
    tick_rate_hz: f64,
    /// Real-time instant of the last wall-clock tick
    last_update: Option<Instant>,
}

impl PlaybackClock {
    pub fn new(duration: f64) -> Self {
        Self {
            current: 0.0,
            duration: sanitize_duration(duration),
            running: false,
            source: ClockSource::Internal,
            loop_playback: true,
            speed: 1.0,
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            last_update: None,
        }
    }

    /// Builder: wrap at the end (default) or stop there
    pub fn with_loop(mut self, loop_playback: bool) -> Self {
        self.loop_playback = loop_playback;
        self
    }

    /// Builder: internal tick cadence
    pub fn with_tick_rate(mut self, hz: f64) -> Self {
        if hz.is_finite() && hz > 0.0 {
            self.tick_rate_hz = hz;
        }
        self
    }

    pub fn current_time(&self) -> f64 {
        self.current
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Update the duration after an edit; the current time is kept in range
    pub fn set_duration(&mut self, duration: f64) {
        self.duration = sanitize_duration(duration);
        if self.source == ClockSource::Internal {
            self.current = self.current.min(self.duration);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn source(&self) -> ClockSource {
        self.source
    }

    /// Switch the time source. The internal tick stops writing the moment
    /// the audio source becomes active.
    pub fn set_source(&mut self, source: ClockSource) {
        if self.source != source {
            tracing::debug!("clock source {:?} -> {:?}", self.source, source);
            self.source = source;
            self.last_update = None;
        }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Set the internal playback speed multiplier
    pub fn set_speed(&mut self, speed: f64) {
        if speed.is_finite() {
            self.speed = speed.clamp(0.1, 10.0);
        }
    }

    /// Seconds between internal ticks
    pub fn frame_interval(&self) -> f64 {
        1.0 / self.tick_rate_hz
    }

    pub fn play(&mut self) {
        if !self.running {
            self.running = true;
            self.last_update = Some(Instant::now());
        }
    }

    pub fn pause(&mut self) {
        if self.running {
            self.running = false;
            self.last_update = None;
        }
    }

    pub fn toggle(&mut self) {
        if self.running {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Jump to `time`, clamped to `[0, duration]`
    pub fn seek(&mut self, time: f64) {
        if !time.is_finite() {
            return;
        }
        self.current = time.clamp(0.0, self.duration);
        if self.running {
            self.last_update = Some(Instant::now());
        }
    }

    /// Stop and rewind
    pub fn reset(&mut self) {
        self.current = 0.0;
        self.running = false;
        self.last_update = None;
    }

    /// Advance the internal clock by `dt` seconds.
    ///
    /// Returns whether the time changed. Does nothing while paused or while
    /// the audio source is active.
    pub fn tick(&mut self, dt: f64) -> bool {
        if self.source != ClockSource::Internal || !self.running {
            return false;
        }
        if !dt.is_finite() || dt <= 0.0 {
            return false;
        }

        self.current += dt * self.speed;
        if self.current >= self.duration {
            if self.loop_playback {
                self.current = 0.0;
            } else {
                self.current = self.duration;
                self.running = false;
                self.last_update = None;
            }
        }
        true
    }

    /// Advance by the real time elapsed since the previous call
    pub fn tick_wall_clock(&mut self) -> bool {
        if self.source != ClockSource::Internal || !self.running {
            return false;
        }
        let now = Instant::now();
        let dt = self
            .last_update
            .map(|last| now.duration_since(last).as_secs_f64())
            .unwrap_or(0.0);
        self.last_update = Some(now);
        self.tick(dt)
    }

    /// Take the audio position as the current time.
    ///
    /// Returns whether the time was updated; ignored unless the audio source
    /// is active and reports a finite position.
    pub fn sync_audio(&mut self, audio: &dyn AudioClock) -> bool {
        if self.source != ClockSource::Audio {
            return false;
        }
        match audio.position() {
            Some(position) if position.is_finite() => {
                self.current = position.max(0.0);
                true
            }
            _ => false,
        }
    }

    /// Progress through the step in `[0, 1]`
    pub fn progress(&self) -> f64 {
        (self.current / self.duration).clamp(0.0, 1.0)
    }
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new(crate::document::DEFAULT_DURATION)
    }
}

fn sanitize_duration(duration: f64) -> f64 {
    if duration.is_finite() && duration > 0.0 {
        duration
    } else {
        crate::document::DEFAULT_DURATION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedAudio(Option<f64>);

    impl AudioClock for FixedAudio {
        fn position(&self) -> Option<f64> {
            self.0
        }
    }

    #[test]
    fn test_tick_advances_only_while_playing() {
        let mut clock = PlaybackClock::new(2.0);
        assert!(!clock.tick(0.5));
        assert_eq!(clock.current_time(), 0.0);

        clock.play();
        assert!(clock.tick(0.5));
        assert_eq!(clock.current_time(), 0.5);
    }

    #[test]
    fn test_tick_wraps_to_zero() {
        let mut clock = PlaybackClock::new(1.0);
        clock.play();
        clock.tick(0.75);
        clock.tick(0.5);
        assert_eq!(clock.current_time(), 0.0);
        assert!(clock.is_running());
    }

    #[test]
    fn test_tick_stops_at_end_without_loop() {
        let mut clock = PlaybackClock::new(1.0).with_loop(false);
        clock.play();
        clock.tick(3.0);
        assert_eq!(clock.current_time(), 1.0);
        assert!(!clock.is_running());
        assert_eq!(clock.progress(), 1.0);
    }

    #[test]
    fn test_audio_source_disables_internal_tick() {
        let mut clock = PlaybackClock::new(4.0);
        clock.play();
        clock.set_source(ClockSource::Audio);
        assert!(!clock.tick(1.0));
        assert!(!clock.tick_wall_clock());

        assert!(clock.sync_audio(&FixedAudio(Some(2.5))));
        assert_eq!(clock.current_time(), 2.5);
        assert!(!clock.sync_audio(&FixedAudio(None)));
        assert!(!clock.sync_audio(&FixedAudio(Some(f64::NAN))));
        assert_eq!(clock.current_time(), 2.5);
    }

    #[test]
    fn test_sync_ignored_for_internal_source() {
        let mut clock = PlaybackClock::new(4.0);
        assert!(!clock.sync_audio(&FixedAudio(Some(1.0))));
        assert_eq!(clock.current_time(), 0.0);
    }

    #[test]
    fn test_seek_clamps() {
        let mut clock = PlaybackClock::new(2.0);
        clock.seek(5.0);
        assert_eq!(clock.current_time(), 2.0);
        clock.seek(-1.0);
        assert_eq!(clock.current_time(), 0.0);
        clock.seek(f64::NAN);
        assert_eq!(clock.current_time(), 0.0);
    }

    #[test]
    fn test_invalid_tick_inputs() {
        let mut clock = PlaybackClock::new(2.0);
        clock.play();
        assert!(!clock.tick(-0.1));
        assert!(!clock.tick(f64::INFINITY));
        assert_eq!(clock.current_time(), 0.0);
        assert!((clock.frame_interval() - 1.0 / 60.0).abs() < 1e-12);
    }
}
