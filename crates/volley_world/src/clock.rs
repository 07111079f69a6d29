//! Simulation Clock - monotonic frame time source

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Clock configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Largest frame delta handed to the simulation, in milliseconds
    pub max_delta_ms: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self { max_delta_ms: 100 }
    }
}

impl ClockConfig {
    pub fn max_delta(&self) -> Duration {
        Duration::from_millis(self.max_delta_ms)
    }
}

/// Time of one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTime {
    /// Simulation time at the end of the frame
    pub now: Duration,
    /// Clamped frame delta
    pub dt: Duration,
}

impl FrameTime {
    /// Frame delta in seconds, as the physics step wants it
    pub fn dt_secs(&self) -> f32 {
        self.dt.as_secs_f32()
    }
}

/// Monotonic simulation clock.
///
/// Deltas longer than `max_delta` are clamped, so a stalled host (suspended
/// tab, debugger break) cannot hand the physics step a huge `dt` that lets
/// fast bodies tunnel through thin colliders.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    now: Duration,
    max_delta: Duration,
    frame: u64,
}

impl SimulationClock {
    pub fn new(config: &ClockConfig) -> Self {
        Self {
            now: Duration::ZERO,
            max_delta: config.max_delta(),
            frame: 0,
        }
    }

    /// Advance by a host-measured delta
    pub fn advance(&mut self, raw_dt: Duration) -> FrameTime {
        let dt = raw_dt.min(self.max_delta);
        if dt < raw_dt {
            log::debug!(
                "Clamped frame delta {:?} to {:?} on frame {}",
                raw_dt,
                dt,
                self.frame
            );
        }

        self.now += dt;
        self.frame += 1;
        FrameTime { now: self.now, dt }
    }

    /// Advance by a delta in seconds; negative or non-finite values count as zero
    pub fn advance_secs(&mut self, raw_dt: f32) -> FrameTime {
        let raw = if raw_dt.is_finite() && raw_dt > 0.0 {
            Duration::try_from_secs_f32(raw_dt).unwrap_or(self.max_delta)
        } else {
            Duration::ZERO
        };
        self.advance(raw)
    }

    /// Current simulation time
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Frames advanced so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn max_delta(&self) -> Duration {
        self.max_delta
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(&ClockConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_accumulates() {
        let mut clock = SimulationClock::default();
        clock.advance(Duration::from_millis(16));
        let frame = clock.advance(Duration::from_millis(17));

        assert_eq!(frame.now, Duration::from_millis(33));
        assert_eq!(frame.dt, Duration::from_millis(17));
        assert_eq!(clock.frame(), 2);
    }

    #[test]
    fn test_delta_is_clamped() {
        let mut clock = SimulationClock::new(&ClockConfig { max_delta_ms: 50 });
        let frame = clock.advance(Duration::from_secs(30));

        assert_eq!(frame.dt, Duration::from_millis(50));
        assert_eq!(clock.now(), Duration::from_millis(50));
    }

    #[test]
    fn test_bad_seconds_never_go_backward() {
        let mut clock = SimulationClock::default();
        clock.advance_secs(0.01);
        let before = clock.now();

        clock.advance_secs(-1.0);
        clock.advance_secs(f32::NAN);
        clock.advance_secs(f32::INFINITY);

        assert_eq!(clock.now(), before);
    }
}
