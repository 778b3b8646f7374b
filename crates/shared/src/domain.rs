use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ParseSideError;

/// Opaque identity handed over by the identity store; passed through to the
/// device untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Left, Side::Right];

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    /// Capitalized form used in operator-facing labels.
    pub fn label(self) -> &'static str {
        match self {
            Side::Left => "Left",
            Side::Right => "Right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = ParseSideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            _ => Err(ParseSideError(s.to_string())),
        }
    }
}

/// Coarse ordinal classification of left/right asymmetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Safe,
    Moderate,
    Severe,
    Dangerous,
    Unknown,
}

impl Severity {
    /// Total mapping from the grade token reported upstream. Matching is
    /// case-insensitive; anything unrecognised, including no token at all,
    /// is `Unknown`.
    pub fn from_grade(grade: Option<&str>) -> Self {
        let Some(grade) = grade else {
            return Severity::Unknown;
        };
        match grade.trim().to_ascii_lowercase().as_str() {
            "safe" => Severity::Safe,
            "moderate" => Severity::Moderate,
            "severe" => Severity::Severe,
            "dangerous" => Severity::Dangerous,
            _ => Severity::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Safe => "safe",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
            Severity::Dangerous => "dangerous",
            Severity::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_tokens_map_case_insensitively() {
        for token in ["SEVERE", "severe", "Severe", " severe "] {
            assert_eq!(Severity::from_grade(Some(token)), Severity::Severe);
        }
        assert_eq!(Severity::from_grade(Some("safe")), Severity::Safe);
        assert_eq!(Severity::from_grade(Some("MODERATE")), Severity::Moderate);
        assert_eq!(Severity::from_grade(Some("Dangerous")), Severity::Dangerous);
    }

    #[test]
    fn unrecognised_or_missing_grade_is_unknown() {
        assert_eq!(Severity::from_grade(Some("xyz")), Severity::Unknown);
        assert_eq!(Severity::from_grade(Some("")), Severity::Unknown);
        assert_eq!(Severity::from_grade(None), Severity::Unknown);
    }

    #[test]
    fn side_parses_from_query_tokens() {
        assert_eq!("left".parse::<Side>().expect("left"), Side::Left);
        assert_eq!("RIGHT".parse::<Side>().expect("right"), Side::Right);
        let err = "both".parse::<Side>().expect_err("must fail");
        assert_eq!(err.to_string(), "unknown side 'both'");
    }
}
