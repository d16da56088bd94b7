use serde::{Deserialize, Serialize};

use crate::sst_api::models::response::device::{DeviceMode, DeviceStatus};

#[derive(Serialize, Deserialize)]
pub struct StatusRequest {
    pub status: DeviceStatus,
}

#[derive(Serialize, Deserialize)]
pub struct TemperatureRequest {
    pub temperature_manual: i64,
}

#[derive(Serialize, Deserialize)]
pub struct ModeRequest {
    pub mode: DeviceMode,
}

#[cfg(test)]
mod tests {
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn serialize_status_request() {
        let body = StatusRequest {
            status: DeviceStatus::On,
        };

        assert_json_eq!(serde_json::to_value(body).unwrap(), json!({"status": "on"}));
    }

    #[test]
    fn serialize_temperature_request() {
        let body = TemperatureRequest {
            temperature_manual: 27,
        };

        assert_json_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"temperature_manual": 27})
        );
    }

    #[test]
    fn serialize_mode_request() {
        let body = ModeRequest {
            mode: DeviceMode::Chart,
        };

        assert_json_eq!(serde_json::to_value(body).unwrap(), json!({"mode": "chart"}));
    }
}
