//! Wire shapes exchanged with the sensing device.

use serde::{Deserialize, Serialize};

use crate::domain::{Side, UserId};

/// Query string of `GET /start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartQuery {
    pub side: Side,
    #[serde(rename = "userId")]
    pub user_id: UserId,
}

/// Query string of `POST /samples`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplesQuery {
    pub side: Side,
}

/// Result body of `GET /stop`. Every field is optional: a device that
/// buffered nothing answers `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceResultPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_bicep: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_bicep: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage_difference: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity_grade: Option<String>,
}

impl DeviceResultPayload {
    pub fn reading(&self, side: Side) -> Option<f64> {
        match side {
            Side::Left => self.left_bicep,
            Side::Right => self.right_bicep,
        }
    }

    pub fn has_readings(&self) -> bool {
        self.left_bicep.is_some() || self.right_bicep.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_a_payload_without_data() {
        let payload: DeviceResultPayload = serde_json::from_str("{}").expect("json");
        assert_eq!(payload, DeviceResultPayload::default());
        assert!(!payload.has_readings());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let payload: DeviceResultPayload =
            serde_json::from_str(r#"{"left_bicep": 12.4, "firmware": "1.2"}"#).expect("json");
        assert_eq!(payload.reading(Side::Left), Some(12.4));
        assert_eq!(payload.reading(Side::Right), None);
    }

    #[test]
    fn start_query_uses_camel_case_user_id() {
        let query = StartQuery {
            side: Side::Right,
            user_id: UserId::new("abc123"),
        };
        let value = serde_json::to_value(&query).expect("json");
        assert_eq!(value["side"], "right");
        assert_eq!(value["userId"], "abc123");
    }
}
