//! Projection of controller state into something a UI can draw.

use shared::domain::{Severity, Side};

use crate::{
    controller::TrialSnapshot,
    error::TrialError,
    session::TrialState,
    timer::format_elapsed,
};

pub const WAITING_FOR_RESULTS: &str = "Waiting for results...";
pub const NEUTRAL_COLOR: &str = "#000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverTarget {
    Begin(Side),
    Stop,
    Reset,
}

/// Disposable per-page UI flags. Lives beside the session, never inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub hovered: Option<HoverTarget>,
    pub menu_open: bool,
}

impl ViewState {
    pub fn hover(&mut self, target: Option<HoverTarget>) {
        self.hovered = target;
    }

    pub fn toggle_menu(&mut self) {
        self.menu_open = !self.menu_open;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionAvailability {
    pub begin_left: bool,
    pub begin_right: bool,
    pub end: bool,
    pub reset: bool,
}

impl ActionAvailability {
    pub fn allows(&self, target: HoverTarget) -> bool {
        match target {
            HoverTarget::Begin(Side::Left) => self.begin_left,
            HoverTarget::Begin(Side::Right) => self.begin_right,
            HoverTarget::Stop => self.end,
            HoverTarget::Reset => self.reset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialView {
    pub left_display: String,
    pub right_display: String,
    pub elapsed_display: String,
    pub percentage_display: String,
    pub severity_label: Option<String>,
    pub severity_color: &'static str,
    pub detail_route: Option<String>,
    pub recording_banner: Option<String>,
    pub failure_banner: Option<String>,
    pub actions: ActionAvailability,
    pub content_dimmed: bool,
    pub highlighted: Option<HoverTarget>,
}

pub fn present(
    snapshot: &TrialSnapshot,
    failure: Option<&TrialError>,
    view: &ViewState,
) -> TrialView {
    let session = &snapshot.session;
    let state = session.state;

    let actions = ActionAvailability {
        begin_left: !state.is_busy(),
        begin_right: !state.is_busy(),
        end: state == TrialState::Recording,
        reset: state == TrialState::Complete
            || (state == TrialState::Idle && session.has_any_value()),
    };

    let percentage_display = match session.percentage_difference {
        Some(percentage) => format!("{percentage:.2}%"),
        None => WAITING_FOR_RESULTS.to_string(),
    };

    let recording_banner = match (state, session.active_side) {
        (TrialState::Recording, Some(side)) => Some(format!("Recording {} Bicep", side.label())),
        (TrialState::AwaitingResult, _) => Some("Waiting for device...".to_string()),
        _ => None,
    };

    TrialView {
        left_display: reading_display(session.left_value),
        right_display: reading_display(session.right_value),
        elapsed_display: format_elapsed(snapshot.elapsed_ms),
        percentage_display,
        severity_label: session.severity.map(severity_label),
        severity_color: session.severity.map_or(NEUTRAL_COLOR, severity_color),
        detail_route: session.severity.and_then(detail_route),
        recording_banner,
        failure_banner: failure.map(ToString::to_string),
        actions,
        content_dimmed: view.menu_open || state.is_busy(),
        highlighted: view.hovered.filter(|target| actions.allows(*target)),
    }
}

fn reading_display(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{value:.2}"),
        None => "Start".to_string(),
    }
}

pub fn severity_label(severity: Severity) -> String {
    severity.as_str().to_ascii_uppercase()
}

pub fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Safe => "#00cc44",
        Severity::Moderate => "#f4c542",
        Severity::Severe => "#ff6600",
        Severity::Dangerous => "#ff1a1a",
        Severity::Unknown => NEUTRAL_COLOR,
    }
}

/// Route of the per-grade explanation page.
pub fn detail_route(severity: Severity) -> Option<String> {
    match severity {
        Severity::Unknown => None,
        known => Some(format!("/{known}")),
    }
}

#[cfg(test)]
#[path = "tests/presentation_tests.rs"]
mod tests;
