//! Text rendering and command parsing for the operator console.

use std::{
    fmt::Write as _,
    time::{Duration, Instant},
};

use shared::domain::Side;
use trial_core::{presentation::ActionAvailability, TrialError, TrialView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Begin(Side),
    Stop,
    Reset,
    Status,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Option<Command> {
    let command = match line.trim().to_ascii_lowercase().as_str() {
        "left" | "l" => Command::Begin(Side::Left),
        "right" | "r" => Command::Begin(Side::Right),
        "stop" | "s" => Command::Stop,
        "reset" => Command::Reset,
        "status" | "" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => return None,
    };
    Some(command)
}

/// Whether the current view offers `command`. Commands that do not touch the
/// trial are always available.
pub fn is_available(command: Command, actions: &ActionAvailability) -> bool {
    match command {
        Command::Begin(Side::Left) => actions.begin_left,
        Command::Begin(Side::Right) => actions.begin_right,
        Command::Stop => actions.end,
        Command::Reset => actions.reset,
        Command::Status | Command::Help | Command::Quit => true,
    }
}

pub fn describe_error(err: &TrialError) -> String {
    if err.is_retryable() {
        format!("error: {err} (try again)")
    } else {
        format!("error: {err}")
    }
}

/// Limits in-place redraws of the elapsed display to one per `interval`,
/// whatever the timer's tick.
#[derive(Debug)]
pub struct RedrawThrottle {
    interval: Duration,
    last_draw: Option<Instant>,
}

impl RedrawThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_draw: None,
        }
    }

    pub fn should_draw(&mut self, now: Instant) -> bool {
        if let Some(at) = self.last_draw {
            if now.saturating_duration_since(at) < self.interval {
                return false;
            }
        }
        self.last_draw = Some(now);
        true
    }
}

pub const HELP: &str = "commands: left | right | stop | reset | status | help | quit";

pub fn render_view(view: &TrialView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Left Bicep: {:>8}    Right Bicep: {:>8}",
        view.left_display, view.right_display
    );
    let _ = write!(out, "Percent Difference: {}", view.percentage_display);
    if let Some(label) = &view.severity_label {
        let _ = write!(out, "  Severity Grade: {label} ({})", view.severity_color);
    }
    out.push('\n');
    if let Some(route) = &view.detail_route {
        let _ = writeln!(out, "Details: {route}");
    }
    if let Some(banner) = &view.recording_banner {
        let _ = writeln!(out, "{banner}  {}", view.elapsed_display);
    }
    if let Some(failure) = &view.failure_banner {
        let _ = writeln!(out, "Last attempt failed: {failure} (try again)");
    }

    let mut actions = Vec::new();
    if view.actions.begin_left {
        actions.push("left");
    }
    if view.actions.begin_right {
        actions.push("right");
    }
    if view.actions.end {
        actions.push("stop");
    }
    if view.actions.reset {
        actions.push("reset");
    }
    let _ = write!(out, "Available: {}", actions.join(", "));
    out
}
