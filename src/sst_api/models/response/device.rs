use serde::{Deserialize, Deserializer, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    #[serde(rename = "on")]
    On,
    #[serde(rename = "off")]
    Off,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceMode {
    #[serde(rename = "manual")]
    Manual,
    #[serde(rename = "chart")]
    Chart,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayStatus {
    #[serde(rename = "on")]
    On,
    #[serde(rename = "off")]
    Off,
}

/// One floor-heating controller as returned by `/houses/{house}/devices/`.
///
/// The vendor ships `parsed_configuration` as a JSON document embedded in a
/// string; it is decoded during deserialization so the rest of the crate only
/// ever sees the structured form.
#[derive(Deserialize, Debug, Clone)]
pub struct Device {
    pub id: i64,
    pub name: String,
    pub house: i64,
    #[serde(deserialize_with = "embedded_json")]
    pub parsed_configuration: ParsedConfiguration,
    pub power_relay_time: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ParsedConfiguration {
    pub settings: Settings,
    pub current_temperature: CurrentTemperature,
    pub signal_level: i64,
    pub relay_status: RelayStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Settings {
    pub status: DeviceStatus,
    pub mode: DeviceMode,
    pub temperature_manual: i64,
    pub temperature_air: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CurrentTemperature {
    pub temperature_floor: f64,
    pub temperature_air: f64,
}

fn embedded_json<'de, D>(deserializer: D) -> Result<ParsedConfiguration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    serde_json::from_str(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_device_with_embedded_configuration() {
        let configuration = serde_json::json!({
            "settings": {
                "status": "on",
                "mode": "chart",
                "temperature_manual": 28,
                "temperature_air": 24
            },
            "current_temperature": {
                "temperature_floor": 26.5,
                "temperature_air": 22.0
            },
            "signal_level": 3,
            "relay_status": "off"
        });
        let payload = serde_json::json!({
            "id": 4242,
            "name": "Bathroom floor",
            "house": 17,
            "parsed_configuration": configuration.to_string(),
            "power_relay_time": "2020-01-11T23:10:38"
        });

        let device: Device = serde_json::from_value(payload).unwrap();

        assert_eq!(device.id, 4242);
        assert_eq!(device.house, 17);
        assert_eq!(device.parsed_configuration.settings.status, DeviceStatus::On);
        assert_eq!(device.parsed_configuration.settings.mode, DeviceMode::Chart);
        assert_eq!(device.parsed_configuration.settings.temperature_manual, 28);
        assert_eq!(device.parsed_configuration.current_temperature.temperature_floor, 26.5);
        assert_eq!(device.parsed_configuration.relay_status, RelayStatus::Off);
    }

    #[test]
    fn embedded_configuration_must_be_valid_json() {
        let payload = serde_json::json!({
            "id": 1,
            "name": "Hall",
            "house": 1,
            "parsed_configuration": "{not json",
            "power_relay_time": ""
        });

        assert!(serde_json::from_value::<Device>(payload).is_err());
    }
}
