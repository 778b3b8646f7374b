//! Acquisition windows and the firmware's strength/grade derivation.

use shared::{domain::Side, protocol::DeviceResultPayload};
use thiserror::Error;

/// Number of strongest readings averaged into a side's strength.
pub const TOP_READINGS: usize = 3;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AcquisitionError {
    #[error("no acquisition window is open")]
    NoOpenWindow,
    #[error("window is open for {open}, not {requested}")]
    WrongSide { open: Side, requested: Side },
    #[error("window for {side} is limited to {limit} samples")]
    WindowFull { side: Side, limit: usize },
    #[error("sample {0} is not a finite non-negative amplitude")]
    InvalidSample(f64),
}

#[derive(Debug)]
pub struct Acquisition {
    open: Option<Side>,
    left: Vec<f64>,
    right: Vec<f64>,
    max_samples: usize,
}

impl Acquisition {
    pub fn new(max_samples: usize) -> Self {
        Self {
            open: None,
            left: Vec::new(),
            right: Vec::new(),
            max_samples,
        }
    }

    fn buffer_mut(&mut self, side: Side) -> &mut Vec<f64> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    /// Opens a window for `side`, discarding what that side buffered before.
    /// Returns the side whose window got replaced, if any.
    pub fn open(&mut self, side: Side) -> Option<Side> {
        let replaced = self.open.replace(side);
        self.buffer_mut(side).clear();
        replaced
    }

    pub fn push(&mut self, side: Side, samples: &[f64]) -> Result<usize, AcquisitionError> {
        match self.open {
            None => return Err(AcquisitionError::NoOpenWindow),
            Some(open) if open != side => {
                return Err(AcquisitionError::WrongSide {
                    open,
                    requested: side,
                })
            }
            Some(_) => {}
        }
        if let Some(bad) = samples.iter().find(|s| !s.is_finite() || **s < 0.0) {
            return Err(AcquisitionError::InvalidSample(*bad));
        }

        let limit = self.max_samples;
        let buffer = self.buffer_mut(side);
        if buffer.len() + samples.len() > limit {
            return Err(AcquisitionError::WindowFull { side, limit });
        }
        buffer.extend_from_slice(samples);
        Ok(buffer.len())
    }

    /// Closes the open window and reports every side that has data. The
    /// comparison is only included once both sides have a strength.
    pub fn close(&mut self) -> Result<DeviceResultPayload, AcquisitionError> {
        if self.open.take().is_none() {
            return Err(AcquisitionError::NoOpenWindow);
        }

        let left = top_average(&self.left);
        let right = top_average(&self.right);
        let mut payload = DeviceResultPayload {
            left_bicep: left,
            right_bicep: right,
            ..DeviceResultPayload::default()
        };
        if let (Some(left), Some(right)) = (left, right) {
            let percentage = percentage_difference(left, right);
            payload.percentage_difference = Some(percentage);
            payload.severity_grade = Some(severity_grade(percentage).to_string());
        }
        Ok(payload)
    }
}

/// Mean of the strongest [`TOP_READINGS`] samples, or fewer when fewer exist.
pub fn top_average(readings: &[f64]) -> Option<f64> {
    if readings.is_empty() {
        return None;
    }
    let mut sorted = readings.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    let top = &sorted[..sorted.len().min(TOP_READINGS)];
    Some(top.iter().sum::<f64>() / top.len() as f64)
}

pub fn percentage_difference(left: f64, right: f64) -> f64 {
    let max = left.max(right);
    if max == 0.0 {
        return 0.0;
    }
    100.0 * (left - right).abs() / max
}

pub fn severity_grade(percentage: f64) -> &'static str {
    if percentage < 10.0 {
        "SAFE"
    } else if percentage < 15.0 {
        "MODERATE"
    } else if percentage < 20.0 {
        "SEVERE"
    } else {
        "DANGEROUS"
    }
}
