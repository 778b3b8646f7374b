//! Session control for a two-sided bicep EMG comparison trial: an elapsed
//! timer, the device client, result evaluation, the trial state machine and
//! its presentation.

pub mod config;
pub mod controller;
pub mod device;
pub mod error;
pub mod evaluator;
pub mod presentation;
pub mod session;
pub mod timer;

pub use config::{load_settings, DeviceSettings};
pub use controller::{TrialSessionController, TrialSnapshot};
pub use device::{DeviceClient, HttpDeviceClient};
pub use error::{ClientBuildError, TrialError};
pub use evaluator::ResultEvaluator;
pub use presentation::{present, TrialView, ViewState};
pub use session::{TrialSession, TrialState};
pub use timer::{format_elapsed, ElapsedTimer};
