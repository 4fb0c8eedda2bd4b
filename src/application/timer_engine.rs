//! Live work timer.
//!
//! Commands travel over one ordered channel to a single fold task, which is
//! the only writer of the [`TimerState`]. A second task derives the
//! displayed whole-second duration, ticking only while the timer runs.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::domain::{TimerCommand, TimerState};

struct Envelope {
    command: TimerCommand,
    applied: oneshot::Sender<TimerState>,
}

/// Handle to the timer tasks. Dropping it stops both tasks.
pub struct TimerEngine {
    commands: mpsc::UnboundedSender<Envelope>,
    state: watch::Receiver<TimerState>,
    running_time: watch::Receiver<u64>,
    tasks: Vec<JoinHandle<()>>,
}

impl TimerEngine {
    /// Spawn the fold and display tasks on the current runtime.
    #[must_use]
    pub fn spawn(tick: Duration) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(TimerState::stopped(Instant::now()));
        let (secs_tx, running_time) = watch::channel(0);

        let tasks = vec![
            tokio::spawn(run_fold(command_rx, state_tx)),
            tokio::spawn(run_display(state.clone(), secs_tx, tick)),
        ];

        Self {
            commands,
            state,
            running_time,
            tasks,
        }
    }

    /// Queue a command and wait until the fold has applied it.
    pub async fn dispatch(&self, command: TimerCommand) -> TimerState {
        let (applied, ack) = oneshot::channel();
        if self.commands.send(Envelope { command, applied }).is_err() {
            return self.state();
        }
        ack.await.unwrap_or_else(|_| self.state())
    }

    pub async fn start(&self) -> TimerState {
        self.dispatch(TimerCommand::Start).await
    }

    pub async fn stop(&self) -> TimerState {
        self.dispatch(TimerCommand::Stop).await
    }

    pub async fn set_duration(&self, value: Duration) -> TimerState {
        self.dispatch(TimerCommand::SetDuration(value)).await
    }

    pub async fn subtract(&self, amount: Duration) -> TimerState {
        self.dispatch(TimerCommand::Subtract(amount)).await
    }

    /// Latest applied state.
    #[must_use]
    pub fn state(&self) -> TimerState {
        *self.state.borrow()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.borrow().running
    }

    /// Elapsed whole seconds computed now, independent of the tick.
    #[must_use]
    pub fn elapsed_secs(&self) -> u64 {
        self.state.borrow().elapsed_secs(Instant::now())
    }

    /// Observe state transitions. New receivers see the latest state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.state.clone()
    }

    /// Observe the displayed duration in whole seconds.
    #[must_use]
    pub fn running_time(&self) -> watch::Receiver<u64> {
        self.running_time.clone()
    }
}

impl Drop for TimerEngine {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

async fn run_fold(mut commands: mpsc::UnboundedReceiver<Envelope>, state: watch::Sender<TimerState>) {
    while let Some(Envelope { command, applied }) = commands.recv().await {
        let next = state.borrow().apply(command, Instant::now());
        state.send_replace(next);
        tracing::debug!(?command, running = next.running, "Timer command applied");
        let _ = applied.send(next);
    }
}

async fn run_display(
    mut state: watch::Receiver<TimerState>,
    secs: watch::Sender<u64>,
    tick: Duration,
) {
    loop {
        let snapshot = *state.borrow_and_update();
        secs.send_replace(snapshot.elapsed_secs(Instant::now()));

        if snapshot.running {
            // The interval lives only for this running stretch.
            let mut ticker = time::interval_at(Instant::now() + tick, tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    changed = state.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        break;
                    }
                    _ = ticker.tick() => {
                        secs.send_replace(snapshot.elapsed_secs(Instant::now()));
                    }
                }
            }
        } else if state.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_secs(1);

    #[tokio::test(start_paused = true)]
    async fn test_running_time_ticks_while_running() {
        let engine = TimerEngine::spawn(TICK);
        let display = engine.running_time();

        engine.start().await;
        time::sleep(Duration::from_millis(3_100)).await;

        assert_eq!(*display.borrow(), 3);
        assert_eq!(engine.elapsed_secs(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_stop_with_timer() {
        let engine = TimerEngine::spawn(TICK);
        let mut display = engine.running_time();

        engine.start().await;
        time::sleep(Duration::from_millis(2_500)).await;
        engine.stop().await;
        time::sleep(Duration::from_millis(10)).await;

        assert_eq!(*display.borrow_and_update(), 2);
        time::sleep(Duration::from_secs(5)).await;
        assert!(!display.has_changed().unwrap());
        assert_eq!(engine.elapsed_secs(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_stop_sums_intervals() {
        let engine = TimerEngine::spawn(TICK);

        for run in [4, 7, 2] {
            engine.start().await;
            time::sleep(Duration::from_secs(run)).await;
            engine.stop().await;
            time::sleep(Duration::from_secs(30)).await;
        }

        let state = engine.state();
        assert!(!state.running);
        assert_eq!(state.accumulated, Duration::from_secs(13));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_duration_then_run() {
        let engine = TimerEngine::spawn(TICK);

        engine.set_duration(Duration::from_secs(600)).await;
        engine.start().await;
        time::sleep(Duration::from_secs(45)).await;
        let state = engine.stop().await;

        assert_eq!(state.accumulated, Duration::from_secs(645));
    }

    #[tokio::test(start_paused = true)]
    async fn test_subtract_stops_running_timer() {
        let engine = TimerEngine::spawn(TICK);

        engine.set_duration(Duration::from_secs(100)).await;
        engine.start().await;
        time::sleep(Duration::from_secs(20)).await;
        let state = engine.subtract(Duration::from_secs(50)).await;

        assert!(!state.running);
        assert_eq!(engine.elapsed_secs(), 70);

        engine.subtract(Duration::from_secs(1_000)).await;
        assert_eq!(engine.elapsed_secs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_subscriber_sees_latest_state() {
        let engine = TimerEngine::spawn(TICK);
        engine.start().await;

        let late = engine.subscribe();
        assert!(late.borrow().running);
        assert!(engine.is_running());
    }
}
