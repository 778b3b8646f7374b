use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::domain::{Side, UserId};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{error, info, warn};

use crate::{
    config::DeviceSettings,
    device::DeviceClient,
    error::TrialError,
    evaluator::ResultEvaluator,
    session::{TrialSession, TrialState},
    timer::ElapsedTimer,
};

/// Owned copy of the session plus the timer reading, for renderers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrialSnapshot {
    pub session: TrialSession,
    pub elapsed_ms: u64,
}

struct ControllerState {
    session: TrialSession,
    pending_start: Option<JoinHandle<()>>,
    last_failure: Option<TrialError>,
}

/// Drives one trial page: `Idle -> Recording -> AwaitingResult -> Complete`,
/// with `Complete -> Idle` on reset and a fallback to `Idle` when the stop
/// request fails.
///
/// The session lock is never held across an await, so calls arriving while a
/// stop request is outstanding see `AwaitingResult` and are rejected.
pub struct TrialSessionController {
    device: Arc<dyn DeviceClient>,
    evaluator: ResultEvaluator,
    timer: ElapsedTimer,
    inner: Mutex<ControllerState>,
}

impl TrialSessionController {
    pub fn new(
        device: Arc<dyn DeviceClient>,
        timer: ElapsedTimer,
        evaluator: ResultEvaluator,
    ) -> Arc<Self> {
        Arc::new(Self {
            device,
            evaluator,
            timer,
            inner: Mutex::new(ControllerState {
                session: TrialSession::default(),
                pending_start: None,
                last_failure: None,
            }),
        })
    }

    pub fn with_settings(device: Arc<dyn DeviceClient>, settings: &DeviceSettings) -> Arc<Self> {
        Self::new(
            device,
            ElapsedTimer::new(settings.tick()),
            ResultEvaluator::new(),
        )
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts recording `side`. Returns as soon as the timer runs; the start
    /// request goes out on a detached task and its failure is only logged.
    /// Must be called from within a tokio runtime.
    pub fn begin(&self, side: Side, user_id: &UserId) -> Result<(), TrialError> {
        let mut inner = self.lock();
        let from = inner.session.state;
        if from.is_busy() {
            return Err(TrialError::InvalidTransition {
                state: from,
                action: "begin",
            });
        }

        inner.session.state = TrialState::Recording;
        inner.session.active_side = Some(side);
        inner.last_failure = None;
        self.timer.start();

        let device = Arc::clone(&self.device);
        let user_id = user_id.clone();
        inner.pending_start = Some(tokio::spawn(async move {
            if let Err(error) = device.request_start(side, &user_id).await {
                warn!(%side, %error, "start request failed; recording continues");
            }
        }));

        info!(%side, %from, to = %TrialState::Recording, "trial transition");
        Ok(())
    }

    /// Stops recording and waits for the device's result. On failure the
    /// session falls back to `Idle` with its values untouched and the error is
    /// kept for display.
    pub async fn end(&self) -> Result<TrialSnapshot, TrialError> {
        let (side, pending_start) = {
            let mut inner = self.lock();
            let state = inner.session.state;
            let (TrialState::Recording, Some(side)) = (state, inner.session.active_side) else {
                return Err(TrialError::InvalidTransition { state, action: "end" });
            };

            self.timer.stop();
            inner.session.active_side = None;
            inner.session.state = TrialState::AwaitingResult;
            info!(%side, from = %state, to = %TrialState::AwaitingResult, "trial transition");
            (side, inner.pending_start.take())
        };

        let mut guard = AwaitingResultGuard {
            controller: self,
            armed: true,
        };

        // Start and stop must reach the device in order.
        if let Some(start) = pending_start {
            if let Err(error) = start.await {
                warn!(%side, %error, "start request task did not finish; sending stop anyway");
            }
        }
        let outcome = self.device.request_stop().await;
        guard.armed = false;

        let mut inner = self.lock();
        match outcome {
            Ok(payload) => {
                let session = std::mem::take(&mut inner.session);
                inner.session = self.evaluator.evaluate(payload, side, session);
                inner.session.state = TrialState::Complete;
                info!(
                    %side,
                    from = %TrialState::AwaitingResult,
                    to = %TrialState::Complete,
                    "trial transition"
                );
                Ok(TrialSnapshot {
                    session: inner.session.clone(),
                    elapsed_ms: self.timer.current(),
                })
            }
            Err(err) => {
                inner.session.state = TrialState::Idle;
                inner.last_failure = Some(err.clone());
                error!(%side, error = %err, "stop request failed; trial returned to idle");
                Err(err)
            }
        }
    }

    /// Clears every result. A no-op from a fresh `Idle`.
    pub fn reset(&self) -> Result<(), TrialError> {
        let mut inner = self.lock();
        let from = inner.session.state;
        if from.is_busy() {
            return Err(TrialError::InvalidTransition {
                state: from,
                action: "reset",
            });
        }

        inner.session = TrialSession::default();
        inner.last_failure = None;
        if from != TrialState::Idle {
            info!(%from, to = %TrialState::Idle, "trial transition");
        }
        Ok(())
    }

    pub fn state(&self) -> TrialState {
        self.lock().session.state
    }

    pub fn snapshot(&self) -> TrialSnapshot {
        let inner = self.lock();
        TrialSnapshot {
            session: inner.session.clone(),
            elapsed_ms: self.timer.current(),
        }
    }

    pub fn last_failure(&self) -> Option<TrialError> {
        self.lock().last_failure.clone()
    }

    pub fn subscribe_elapsed(&self) -> watch::Receiver<u64> {
        self.timer.subscribe()
    }
}

/// Returns the controller to `Idle` if the future driving `end` is dropped
/// before the device answers.
struct AwaitingResultGuard<'a> {
    controller: &'a TrialSessionController,
    armed: bool,
}

impl Drop for AwaitingResultGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.controller.lock();
        if inner.session.state == TrialState::AwaitingResult {
            inner.session.state = TrialState::Idle;
            inner.last_failure = Some(TrialError::DeviceUnreachable(
                "stop request abandoned before the device answered".to_string(),
            ));
            warn!("stop request abandoned; trial returned to idle");
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
