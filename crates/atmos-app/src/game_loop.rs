//! Fixed-rate scene ticks decoupled from the display rate.

use std::time::Instant;

use tracing::warn;

/// Scene tick length: 60 Hz.
pub const TICK_DT: f32 = 1.0 / 60.0;

/// Longest frame counted toward ticks. Anything longer (a dragged window, a
/// breakpoint) is dropped rather than replayed.
pub const MAX_FRAME_TIME: f32 = 0.25;

/// Accumulates wall-clock frame time and hands it out as whole ticks.
#[derive(Debug)]
pub struct TickClock {
    last: Option<Instant>,
    accumulator: f32,
    ticks: u64,
    frames: u64,
}

impl TickClock {
    pub fn new() -> Self {
        Self {
            last: None,
            accumulator: 0.0,
            ticks: 0,
            frames: 0,
        }
    }

    /// Measure the time since the previous frame and return how many ticks
    /// to run. The first frame runs none.
    pub fn frame(&mut self) -> u32 {
        let now = Instant::now();
        let elapsed = self
            .last
            .replace(now)
            .map_or(0.0, |last| now.duration_since(last).as_secs_f32());
        self.advance(elapsed)
    }

    /// Feed `frame_time` seconds and return how many ticks are now due.
    pub fn advance(&mut self, frame_time: f32) -> u32 {
        let mut frame_time = frame_time.max(0.0);
        if frame_time > MAX_FRAME_TIME {
            warn!(
                "Frame took {:.0}ms, dropping {:.0}ms",
                frame_time * 1000.0,
                (frame_time - MAX_FRAME_TIME) * 1000.0
            );
            frame_time = MAX_FRAME_TIME;
        }
        self.accumulator += frame_time;
        self.frames += 1;

        let mut due = 0;
        while self.accumulator >= TICK_DT {
            self.accumulator -= TICK_DT;
            due += 1;
        }
        self.ticks += u64::from(due);
        due
    }

    /// Fraction of a tick left in the accumulator, in `[0, 1)`.
    pub fn remainder(&self) -> f32 {
        self.accumulator / TICK_DT
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Simulated seconds so far.
    pub fn sim_time(&self) -> f64 {
        self.ticks as f64 * f64::from(TICK_DT)
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_tick_per_tick_length() {
        let mut clock = TickClock::new();
        assert_eq!(clock.advance(TICK_DT), 1);
        assert!(clock.remainder() < 1e-4, "remainder {}", clock.remainder());
    }

    #[test]
    fn test_partial_frames_accumulate() {
        let mut clock = TickClock::new();
        assert_eq!(clock.advance(TICK_DT * 0.6), 0);
        assert!((clock.remainder() - 0.6).abs() < 1e-4);
        assert_eq!(clock.advance(TICK_DT * 0.6), 1, "two partials make a tick");
        assert!((clock.remainder() - 0.2).abs() < 1e-3);
    }

    #[test]
    fn test_long_frame_is_clamped() {
        let mut clock = TickClock::new();
        let due = clock.advance(3.0);
        let max = (MAX_FRAME_TIME / TICK_DT).ceil() as u32;
        assert!(due > 0 && due <= max, "expected at most {max} ticks, got {due}");
    }

    #[test]
    fn test_negative_frame_time_runs_nothing() {
        let mut clock = TickClock::new();
        assert_eq!(clock.advance(-1.0), 0);
        assert_eq!(clock.remainder(), 0.0);
    }

    #[test]
    fn test_counters_track_ticks_and_frames() {
        let mut clock = TickClock::new();
        for _ in 0..10 {
            clock.advance(TICK_DT * 2.0);
        }
        assert_eq!(clock.frames(), 10);
        assert!(
            (19..=20).contains(&clock.ticks()),
            "float accumulation may lose at most one tick, got {}",
            clock.ticks()
        );
        assert!((clock.sim_time() - clock.ticks() as f64 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_first_measured_frame_runs_nothing() {
        let mut clock = TickClock::default();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.frames(), 1);
    }
}
