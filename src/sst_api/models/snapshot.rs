use serde::Serialize;

use crate::sst_api::models::response::device::{Device, DeviceMode, DeviceStatus, RelayStatus};

/// Flattened, platform-agnostic view of one device. This is the only shape the
/// climate layer depends on.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DeviceSnapshot {
    pub name: String,
    pub house_id: i64,
    pub device_id: i64,
    pub status: DeviceStatus,
    pub mode: DeviceMode,
    pub temperature_manual: i64,
    pub temperature_air_manual: i64,
    pub temperature_floor: f64,
    pub temperature_air: f64,
    pub signal_level: i64,
    pub relay_status: RelayStatus,
    pub power_relay_time: String,
}

impl From<&Device> for DeviceSnapshot {
    fn from(device: &Device) -> Self {
        let configuration = &device.parsed_configuration;
        Self {
            name: device.name.clone(),
            house_id: device.house,
            device_id: device.id,
            status: configuration.settings.status,
            mode: configuration.settings.mode,
            temperature_manual: configuration.settings.temperature_manual,
            temperature_air_manual: configuration.settings.temperature_air,
            temperature_floor: configuration.current_temperature.temperature_floor,
            temperature_air: configuration.current_temperature.temperature_air,
            signal_level: configuration.signal_level,
            relay_status: configuration.relay_status,
            power_relay_time: device.power_relay_time.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sst_api::models::response::device::{
        CurrentTemperature, ParsedConfiguration, Settings,
    };

    #[test]
    fn snapshot_round_trips_an_encoded_configuration() {
        let configuration = ParsedConfiguration {
            settings: Settings {
                status: DeviceStatus::On,
                mode: DeviceMode::Chart,
                temperature_manual: 33,
                temperature_air: 22,
            },
            current_temperature: CurrentTemperature {
                temperature_floor: 28.5,
                temperature_air: 21.5,
            },
            signal_level: 2,
            relay_status: RelayStatus::On,
        };
        let payload = serde_json::json!({
            "id": 7,
            "name": "Kitchen floor",
            "house": 3,
            "parsed_configuration": serde_json::to_string(&configuration).unwrap(),
            "power_relay_time": "2020-02-02T08:00:00"
        });

        let device: Device = serde_json::from_value(payload).unwrap();
        let snapshot = DeviceSnapshot::from(&device);

        assert_eq!(snapshot.house_id, 3);
        assert_eq!(snapshot.device_id, 7);
        assert_eq!(snapshot.status, DeviceStatus::On);
        assert_eq!(snapshot.mode, DeviceMode::Chart);
        assert_eq!(snapshot.temperature_manual, 33);
        assert_eq!(snapshot.temperature_air_manual, 22);
        assert_eq!(snapshot.temperature_floor, 28.5);
        assert_eq!(snapshot.temperature_air, 21.5);
        assert_eq!(snapshot.signal_level, 2);
        assert_eq!(snapshot.relay_status, RelayStatus::On);
        assert_eq!(snapshot.power_relay_time, "2020-02-02T08:00:00");
    }
}
