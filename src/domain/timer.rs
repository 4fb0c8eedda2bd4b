//! Work timer state and its command fold.
//!
//! The timer is event-sourced: [`TimerState::apply`] is a pure function of
//! the previous state, a command and the instant it is applied at. Elapsed
//! time while running is computed at read time and never stored.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

/// Commands accepted by the timer fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// Begin (or re-anchor) a running interval.
    Start,
    /// Fold the running interval into the accumulated duration.
    Stop,
    /// Overwrite the accumulated duration.
    SetDuration(Duration),
    /// Stop, then remove time from the accumulated duration (clamped at zero).
    Subtract(Duration),
}

/// Snapshot of the work timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerState {
    /// Anchor of the current running interval. Ignored while stopped.
    pub last_start: Instant,
    /// Time accumulated by completed intervals.
    pub accumulated: Duration,
    pub running: bool,
}

impl TimerState {
    /// A stopped timer with nothing accumulated.
    #[must_use]
    pub const fn stopped(now: Instant) -> Self {
        Self {
            last_start: now,
            accumulated: Duration::ZERO,
            running: false,
        }
    }

    /// Apply one command.
    ///
    /// `Start` on a running timer re-anchors the interval at `now` without
    /// folding the time since the previous anchor.
    #[must_use]
    pub fn apply(self, command: TimerCommand, now: Instant) -> Self {
        match command {
            TimerCommand::Start => Self {
                last_start: now,
                running: true,
                ..self
            },
            TimerCommand::Stop => self.stop(now),
            TimerCommand::SetDuration(value) => Self {
                accumulated: value,
                ..self
            },
            TimerCommand::Subtract(amount) => {
                let stopped = self.stop(now);
                Self {
                    accumulated: stopped.accumulated.saturating_sub(amount),
                    ..stopped
                }
            }
        }
    }

    fn stop(self, now: Instant) -> Self {
        if !self.running {
            return self;
        }
        Self {
            accumulated: self
                .accumulated
                .saturating_add(now.saturating_duration_since(self.last_start)),
            running: false,
            ..self
        }
    }

    /// Total elapsed time as of `now`.
    #[must_use]
    pub fn elapsed(&self, now: Instant) -> Duration {
        if self.running {
            self.accumulated
                .saturating_add(now.saturating_duration_since(self.last_start))
        } else {
            self.accumulated
        }
    }

    /// Total elapsed whole seconds as of `now`.
    #[must_use]
    pub fn elapsed_secs(&self, now: Instant) -> u64 {
        self.elapsed(now).as_secs()
    }
}

/// Whole seconds split into hours, minutes and seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hms {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl Hms {
    #[must_use]
    pub const fn from_secs(total: u64) -> Self {
        Self {
            hours: total / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
        }
    }
}

impl fmt::Display for Hms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// Convert elapsed seconds to the fractional hours Redmine expects.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn secs_to_hours(secs: u64) -> f64 {
    secs as f64 / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_start_stop_accumulates_intervals() {
        let t0 = Instant::now();
        let state = TimerState::stopped(t0)
            .apply(TimerCommand::Start, t0)
            .apply(TimerCommand::Stop, t0 + secs(5))
            .apply(TimerCommand::Start, t0 + secs(20))
            .apply(TimerCommand::Stop, t0 + secs(27));

        assert!(!state.running);
        assert_eq!(state.elapsed(t0 + secs(100)), secs(12));
    }

    #[test]
    fn test_running_elapsed_is_lazy() {
        let t0 = Instant::now();
        let state = TimerState::stopped(t0)
            .apply(TimerCommand::SetDuration(secs(10)), t0)
            .apply(TimerCommand::Start, t0);

        assert_eq!(state.accumulated, secs(10));
        assert_eq!(state.elapsed_secs(t0 + Duration::from_millis(3_900)), 13);
    }

    #[test]
    fn test_stop_when_stopped_is_identity() {
        let t0 = Instant::now();
        let state = TimerState::stopped(t0).apply(TimerCommand::SetDuration(secs(4)), t0);
        assert_eq!(state.apply(TimerCommand::Stop, t0 + secs(60)), state);
    }

    #[test]
    fn test_restart_reanchors() {
        let t0 = Instant::now();
        let state = TimerState::stopped(t0)
            .apply(TimerCommand::Start, t0)
            .apply(TimerCommand::Start, t0 + secs(30))
            .apply(TimerCommand::Stop, t0 + secs(40));

        assert_eq!(state.accumulated, secs(10));
    }

    #[test]
    fn test_subtract_stops_and_clamps() {
        let t0 = Instant::now();
        let running = TimerState::stopped(t0)
            .apply(TimerCommand::SetDuration(secs(100)), t0)
            .apply(TimerCommand::Start, t0);

        let state = running.apply(TimerCommand::Subtract(secs(30)), t0 + secs(20));
        assert!(!state.running);
        assert_eq!(state.accumulated, secs(90));

        let clamped = state.apply(TimerCommand::Subtract(secs(500)), t0 + secs(21));
        assert_eq!(clamped.accumulated, Duration::ZERO);
    }

    #[test]
    fn test_set_then_run_adds() {
        let t0 = Instant::now();
        let state = TimerState::stopped(t0)
            .apply(TimerCommand::SetDuration(secs(60)), t0)
            .apply(TimerCommand::Start, t0 + secs(1))
            .apply(TimerCommand::Stop, t0 + secs(8));

        assert_eq!(state.elapsed_secs(t0 + secs(8)), 67);
    }

    #[test]
    fn test_huge_duration_saturates() {
        let t0 = Instant::now();
        let max = Duration::from_secs(u64::MAX);
        let running = TimerState::stopped(t0)
            .apply(TimerCommand::SetDuration(max), t0)
            .apply(TimerCommand::Start, t0);

        assert_eq!(running.elapsed_secs(t0 + secs(10)), u64::MAX);
        let stopped = running.apply(TimerCommand::Stop, t0 + secs(10));
        assert_eq!(stopped.accumulated.as_secs(), u64::MAX);
        assert_eq!(stopped.elapsed_secs(t0 + secs(20)), u64::MAX);
    }

    #[test]
    fn test_hms_formatting() {
        let hms = Hms::from_secs(3 * 3600 + 7 * 60 + 9);
        assert_eq!(hms, Hms { hours: 3, minutes: 7, seconds: 9 });
        assert_eq!(hms.to_string(), "03:07:09");
        assert_eq!(Hms::from_secs(59).to_string(), "00:00:59");
    }

    #[test]
    fn test_secs_to_hours() {
        assert!((secs_to_hours(5400) - 1.5).abs() < f64::EPSILON);
    }
}
