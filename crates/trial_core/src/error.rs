use thiserror::Error;

use crate::session::TrialState;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrialError {
    #[error("device unreachable: {0}")]
    DeviceUnreachable(String),
    #[error("device answered with status {status}")]
    DeviceError { status: u16 },
    #[error("malformed device response: {0}")]
    MalformedResponse(String),
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        state: TrialState,
        action: &'static str,
    },
}

impl TrialError {
    /// Device-side failures the operator can clear by simply trying again.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TrialError::InvalidTransition { .. })
    }

    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return TrialError::DeviceError {
                status: status.as_u16(),
            };
        }
        if err.is_timeout() {
            return TrialError::DeviceUnreachable(format!("request timed out: {err}"));
        }
        if err.is_decode() {
            return TrialError::MalformedResponse(err.to_string());
        }
        TrialError::DeviceUnreachable(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("invalid device url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),
}
