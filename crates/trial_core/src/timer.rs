//! Free-running elapsed-time counter for the recording overlay.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval_at, Instant},
};

pub const DEFAULT_TICK: Duration = Duration::from_millis(10);

struct TimerState {
    generation: u64,
    running: bool,
    elapsed_ms: u64,
    task: Option<JoinHandle<()>>,
}

struct Shared {
    state: Mutex<TimerState>,
    elapsed_tx: watch::Sender<u64>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, TimerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds one quantum unless the tick belongs to a cancelled run. Returns
    /// whether the caller's run is still current.
    fn advance(&self, generation: u64, quantum_ms: u64) -> bool {
        let mut state = self.lock();
        if !state.running || state.generation != generation {
            return false;
        }
        state.elapsed_ms = state.elapsed_ms.saturating_add(quantum_ms);
        self.elapsed_tx.send_replace(state.elapsed_ms);
        true
    }
}

/// Millisecond stopwatch advanced by a fixed quantum on a tokio interval.
///
/// Every run is tagged with a generation number and ticks only write while
/// their generation is current, checked under the lock `stop` takes. Once
/// `stop` returns the counter is frozen even if an aborted tick task is still
/// being torn down.
pub struct ElapsedTimer {
    tick: Duration,
    shared: Arc<Shared>,
}

impl ElapsedTimer {
    pub fn new(tick: Duration) -> Self {
        let (elapsed_tx, _) = watch::channel(0);
        Self {
            tick: tick.max(Duration::from_millis(1)),
            shared: Arc::new(Shared {
                state: Mutex::new(TimerState {
                    generation: 0,
                    running: false,
                    elapsed_ms: 0,
                    task: None,
                }),
                elapsed_tx,
            }),
        }
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Resets the counter to zero and starts advancing it. Restarts a running
    /// timer. Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut state = self.shared.lock();
        if let Some(task) = state.task.take() {
            task.abort();
        }
        state.generation = state.generation.wrapping_add(1);
        state.running = true;
        state.elapsed_ms = 0;
        self.shared.elapsed_tx.send_replace(0);

        let generation = state.generation;
        let shared = Arc::clone(&self.shared);
        let tick = self.tick;
        let quantum_ms = u64::try_from(tick.as_millis()).unwrap_or(u64::MAX);
        state.task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + tick, tick);
            loop {
                ticker.tick().await;
                if !shared.advance(generation, quantum_ms) {
                    break;
                }
            }
        }));
    }

    /// Freezes the counter at its current value. No-op when already stopped.
    pub fn stop(&self) {
        let mut state = self.shared.lock();
        if !state.running {
            return;
        }
        state.running = false;
        state.generation = state.generation.wrapping_add(1);
        if let Some(task) = state.task.take() {
            task.abort();
        }
    }

    pub fn current(&self) -> u64 {
        self.shared.lock().elapsed_ms
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().running
    }

    /// Follows the counter; the receiver sees every published value.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.elapsed_tx.subscribe()
    }
}

impl Default for ElapsedTimer {
    fn default() -> Self {
        Self::new(DEFAULT_TICK)
    }
}

impl Drop for ElapsedTimer {
    fn drop(&mut self) {
        if let Some(task) = self.shared.lock().task.take() {
            task.abort();
        }
    }
}

/// Renders milliseconds as `S.cc`: whole seconds, then centiseconds padded to
/// two digits.
pub fn format_elapsed(ms: u64) -> String {
    format!("{}.{:02}", ms / 1000, (ms % 1000) / 10)
}

#[cfg(test)]
#[path = "tests/timer_tests.rs"]
mod tests;
