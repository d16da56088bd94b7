use std::sync::Mutex;

use reqwest::StatusCode;

use crate::sst_api::error::{CommandOutcome, Result, SstError};
use crate::sst_api::models::response::device::{
    CurrentTemperature, Device, DeviceMode, DeviceStatus, ParsedConfiguration, RelayStatus,
    Settings,
};
use crate::sst_api::models::response::house::House;
use crate::sst_api::sst_client::SstApi;

/// In-memory stand-in for the vendor API. Commands mutate the fake device
/// state, so a follow-up refresh observes what a well-behaved backend would
/// report after applying the write.
pub(crate) struct FakeApi {
    pub state: Mutex<FakeState>,
}

pub(crate) struct FakeState {
    pub houses: Vec<House>,
    pub devices: Vec<Device>,
    pub device_list_failure: Option<StatusCode>,
    pub reject_commands: Option<StatusCode>,
    pub login_calls: usize,
    pub house_list_calls: usize,
    pub device_list_calls: usize,
}

impl FakeApi {
    pub fn single_house(devices: Vec<Device>) -> Self {
        Self::with_houses(1, devices)
    }

    pub fn with_houses(count: i64, devices: Vec<Device>) -> Self {
        let houses = (1..=count)
            .map(|id| House {
                id,
                name: format!("House {}", id),
            })
            .collect();
        Self {
            state: Mutex::new(FakeState {
                houses,
                devices,
                device_list_failure: None,
                reject_commands: None,
                login_calls: 0,
                house_list_calls: 0,
                device_list_calls: 0,
            }),
        }
    }

    fn apply<F>(&self, house_id: i64, device_id: i64, mutate: F) -> Result<CommandOutcome>
    where
        F: FnOnce(&mut Device),
    {
        let mut state = self.state.lock().unwrap();
        if let Some(status) = state.reject_commands {
            return Ok(CommandOutcome::Rejected { status });
        }
        if let Some(device) = state
            .devices
            .iter_mut()
            .find(|device| device.house == house_id && device.id == device_id)
        {
            mutate(device);
        }
        Ok(CommandOutcome::Accepted)
    }
}

impl SstApi for FakeApi {
    async fn authenticate(&self) -> Result<()> {
        self.state.lock().unwrap().login_calls += 1;
        Ok(())
    }

    async fn list_houses(&self) -> Result<Vec<House>> {
        let mut state = self.state.lock().unwrap();
        state.house_list_calls += 1;
        Ok(state.houses.clone())
    }

    async fn list_devices(&self, house_id: i64) -> Result<Vec<Device>> {
        let mut state = self.state.lock().unwrap();
        state.device_list_calls += 1;
        if let Some(status) = state.device_list_failure {
            return Err(SstError::FetchFailure { status });
        }
        Ok(state
            .devices
            .iter()
            .filter(|device| device.house == house_id)
            .cloned()
            .collect())
    }

    async fn set_device_status(
        &self,
        house_id: i64,
        device_id: i64,
        status: DeviceStatus,
    ) -> Result<CommandOutcome> {
        self.apply(house_id, device_id, |device| {
            device.parsed_configuration.settings.status = status;
        })
    }

    async fn set_temperature_manual(
        &self,
        house_id: i64,
        device_id: i64,
        temperature: i64,
    ) -> Result<CommandOutcome> {
        self.apply(house_id, device_id, |device| {
            device.parsed_configuration.settings.temperature_manual = temperature;
        })
    }

    async fn set_device_mode(
        &self,
        house_id: i64,
        device_id: i64,
        mode: DeviceMode,
    ) -> Result<CommandOutcome> {
        self.apply(house_id, device_id, |device| {
            device.parsed_configuration.settings.mode = mode;
        })
    }
}

pub(crate) fn device(house: i64, id: i64, name: &str) -> Device {
    Device {
        id,
        name: name.to_string(),
        house,
        parsed_configuration: ParsedConfiguration {
            settings: Settings {
                status: DeviceStatus::On,
                mode: DeviceMode::Manual,
                temperature_manual: 25,
                temperature_air: 21,
            },
            current_temperature: CurrentTemperature {
                temperature_floor: 24.0,
                temperature_air: 20.0,
            },
            signal_level: 3,
            relay_status: RelayStatus::Off,
        },
        power_relay_time: "2020-01-11T23:10:38".to_string(),
    }
}
