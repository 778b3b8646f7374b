use shared::{
    domain::{Severity, Side},
    protocol::DeviceResultPayload,
};
use tracing::{info, warn};

use crate::session::TrialSession;

/// Folds one device result into the session. Never fails: missing or
/// unusable numbers just leave the comparison incomplete.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultEvaluator;

impl ResultEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(
        &self,
        payload: DeviceResultPayload,
        target: Side,
        mut session: TrialSession,
    ) -> TrialSession {
        if !payload.has_readings() {
            info!(side = %target, "device returned no readings");
        }

        let assigned = match usable_reading(payload.reading(target), target) {
            Some(value) => {
                session.set_value(target, value);
                true
            }
            None => {
                info!(side = %target, "no usable reading; side stays inconclusive");
                false
            }
        };

        match session.both_sides() {
            // Nothing new landed; the stored comparison stands.
            Some(_) if !assigned => {}
            Some((left, right)) => {
                // The device's own figure wins so device-side calibration is honoured.
                let percentage = usable_percentage(payload.percentage_difference)
                    .unwrap_or_else(|| percentage_difference(left, right));
                session.percentage_difference = Some(percentage);
                session.severity = Some(Severity::from_grade(payload.severity_grade.as_deref()));
            }
            None => {
                session.percentage_difference = None;
                session.severity = None;
            }
        }

        session
    }
}

/// `|left - right| / max(left, right) * 100`, or 0 when both are zero.
pub fn percentage_difference(left: f64, right: f64) -> f64 {
    let max = left.max(right);
    if max == 0.0 {
        return 0.0;
    }
    (left - right).abs() / max * 100.0
}

fn usable_reading(reading: Option<f64>, side: Side) -> Option<f64> {
    let value = reading?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        warn!(%side, value, "discarding invalid bicep reading");
        None
    }
}

fn usable_percentage(reported: Option<f64>) -> Option<f64> {
    let value = reported?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        warn!(value, "ignoring invalid device percentage; computing locally");
        None
    }
}

#[cfg(test)]
#[path = "tests/evaluator_tests.rs"]
mod tests;
