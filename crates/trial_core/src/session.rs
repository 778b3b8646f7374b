use std::fmt;

use shared::domain::{Severity, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrialState {
    #[default]
    Idle,
    Recording,
    AwaitingResult,
    Complete,
}

impl TrialState {
    pub fn as_str(self) -> &'static str {
        match self {
            TrialState::Idle => "idle",
            TrialState::Recording => "recording",
            TrialState::AwaitingResult => "awaiting result",
            TrialState::Complete => "complete",
        }
    }

    /// A device call or timer is outstanding.
    pub fn is_busy(self) -> bool {
        matches!(self, TrialState::Recording | TrialState::AwaitingResult)
    }
}

impl fmt::Display for TrialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accumulated results of one left-vs-right comparison.
///
/// `active_side` is set only while recording; `percentage_difference` and
/// `severity` are set only while both sides hold a value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrialSession {
    pub state: TrialState,
    pub active_side: Option<Side>,
    pub left_value: Option<f64>,
    pub right_value: Option<f64>,
    pub percentage_difference: Option<f64>,
    pub severity: Option<Severity>,
}

impl TrialSession {
    pub fn value(&self, side: Side) -> Option<f64> {
        match side {
            Side::Left => self.left_value,
            Side::Right => self.right_value,
        }
    }

    pub(crate) fn set_value(&mut self, side: Side, value: f64) {
        match side {
            Side::Left => self.left_value = Some(value),
            Side::Right => self.right_value = Some(value),
        }
    }

    pub fn both_sides(&self) -> Option<(f64, f64)> {
        self.left_value.zip(self.right_value)
    }

    pub fn has_any_value(&self) -> bool {
        self.left_value.is_some() || self.right_value.is_some()
    }
}
