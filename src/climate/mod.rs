pub mod model;

use std::time::Duration;

use tracing::warn;

use crate::climate::model::{ExtraAttributes, HvacAction, HvacMode, Preset, SavedAttributes};
use crate::config::ClimateConfig;
use crate::sst_api::cached_sst_client::CachedSstClient;
use crate::sst_api::error::{CommandOutcome, Result, SstError};
use crate::sst_api::models::response::device::{DeviceMode, DeviceStatus, RelayStatus};
use crate::sst_api::models::snapshot::DeviceSnapshot;
use crate::sst_api::sst_client::SstApi;

#[derive(Debug, Clone, Copy)]
struct DeviceKey {
    house_id: i64,
    device_id: i64,
}

/// Thermostat entity bridging the host platform's climate surface to the
/// vendor client. All vendor state is re-derived from a device snapshot on
/// every refresh; only the preset and the four named setpoints are owned here.
pub struct SstClimate<T>
where
    T: SstApi,
{
    client: CachedSstClient<T>,
    name: String,
    selector: Option<String>,
    selection: Option<DeviceKey>,
    settle: Duration,

    min_temp: f64,
    max_temp: f64,
    away_setpoint: f64,
    manual_setpoint: f64,
    boost_setpoint: f64,
    sleep_setpoint: f64,

    preset: Preset,
    hvac_mode: Option<HvacMode>,
    hvac_action: Option<HvacAction>,
    current_temperature: Option<f64>,
    target_temperature: Option<f64>,
    room_temperature: Option<f64>,
    signal_level: Option<i64>,
    relay_status: Option<RelayStatus>,
    power_relay_time: Option<String>,
}

impl<T> SstClimate<T>
where
    T: SstApi,
{
    pub fn new(config: &ClimateConfig, settle: Duration, client: CachedSstClient<T>) -> Self {
        Self {
            client,
            name: config.name.clone(),
            selector: config.device.clone(),
            selection: None,
            settle,
            min_temp: config.min_temp,
            max_temp: config.max_temp,
            away_setpoint: config.min_temp,
            manual_setpoint: config.min_temp,
            boost_setpoint: config.boost_temp,
            sleep_setpoint: config.sleep_temp,
            preset: Preset::None,
            hvac_mode: None,
            hvac_action: None,
            current_temperature: None,
            target_temperature: None,
            room_temperature: None,
            signal_level: None,
            relay_status: None,
            power_relay_time: None,
        }
    }

    /// Forces a refresh and re-derives the entity state. A failed refresh is
    /// logged and leaves the previous state in place, stale but consistent.
    pub async fn update(&mut self) {
        match self.client.refresh_device_state(true).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("Thermostat {} refresh returned no data; keeping previous state", self.name);
                return;
            }
            Err(e) => {
                warn!("Thermostat {} refresh failed: {}", self.name, e);
                return;
            }
        }

        let key = match self.selection {
            Some(key) => key,
            None => match self.resolve_selection() {
                Ok(key) => {
                    self.selection = Some(key);
                    key
                }
                Err(e) => {
                    warn!("Thermostat {}: unable to resolve device: {}", self.name, e);
                    return;
                }
            },
        };

        let snapshot = self.client.device_snapshot(key.house_id, key.device_id);
        match snapshot {
            Some(snapshot) => self.apply_snapshot(&snapshot),
            None => warn!(
                "Thermostat {}: device {} vanished from house {}",
                self.name, key.device_id, key.house_id
            ),
        }
    }

    /// Sets a new target temperature, truncated to whole degrees. An accepted
    /// write is remembered in the setpoint belonging to the active preset.
    pub async fn set_temperature(&mut self, value: f64) {
        let Some(key) = self.selection else {
            warn!("Thermostat {}: no device resolved yet, ignoring set_temperature", self.name);
            return;
        };

        let target = value as i64;
        match self
            .client
            .set_temperature(key.house_id, key.device_id, target)
            .await
        {
            Ok(CommandOutcome::Accepted) => {
                if self.preset == Preset::Away {
                    self.away_setpoint = target as f64;
                } else {
                    self.manual_setpoint = target as f64;
                }
            }
            Ok(CommandOutcome::Rejected { status }) => {
                warn!("Thermostat {}: target temperature {} rejected: http {}", self.name, target, status);
            }
            Err(e) => warn!("Thermostat {}: target temperature write failed: {}", self.name, e),
        }

        self.settle_and_update().await;
    }

    pub async fn set_hvac_mode(&mut self, mode: HvacMode) {
        let Some(key) = self.selection else {
            warn!("Thermostat {}: no device resolved yet, ignoring set_hvac_mode", self.name);
            return;
        };

        match mode {
            HvacMode::Off => {
                self.log_outcome(
                    "power off",
                    self.client
                        .set_status(key.house_id, key.device_id, DeviceStatus::Off)
                        .await,
                );
            }
            HvacMode::Auto => {
                self.log_outcome(
                    "power on",
                    self.client
                        .set_status(key.house_id, key.device_id, DeviceStatus::On)
                        .await,
                );
                self.log_outcome(
                    "chart mode",
                    self.client
                        .set_mode(key.house_id, key.device_id, DeviceMode::Chart)
                        .await,
                );
            }
            HvacMode::Heat => {
                self.log_outcome(
                    "power on",
                    self.client
                        .set_status(key.house_id, key.device_id, DeviceStatus::On)
                        .await,
                );
                self.log_outcome(
                    "manual mode",
                    self.client
                        .set_mode(key.house_id, key.device_id, DeviceMode::Manual)
                        .await,
                );
            }
        }

        self.settle_and_update().await;
    }

    /// Switches to a preset: forces manual heating and writes the setpoint
    /// bound to that preset as the new target.
    pub async fn set_preset_mode(&mut self, preset: Preset) {
        let Some(key) = self.selection else {
            warn!("Thermostat {}: no device resolved yet, ignoring set_preset_mode", self.name);
            return;
        };

        self.preset = preset;

        self.log_outcome(
            "power on",
            self.client
                .set_status(key.house_id, key.device_id, DeviceStatus::On)
                .await,
        );
        self.log_outcome(
            "manual mode",
            self.client
                .set_mode(key.house_id, key.device_id, DeviceMode::Manual)
                .await,
        );

        let setpoint = match preset {
            Preset::None => self.manual_setpoint,
            Preset::Away => self.away_setpoint,
            Preset::Boost => self.boost_setpoint,
            Preset::Sleep => self.sleep_setpoint,
        };
        self.log_outcome(
            "preset setpoint",
            self.client
                .set_temperature(key.house_id, key.device_id, setpoint as i64)
                .await,
        );

        self.settle_and_update().await;
    }

    pub async fn turn_on(&mut self) {
        self.set_hvac_mode(HvacMode::Heat).await;
    }

    pub async fn turn_off(&mut self) {
        self.set_hvac_mode(HvacMode::Off).await;
    }

    /// Re-applies the setpoints the host platform restored for this entity.
    pub fn restore_saved(&mut self, saved: &SavedAttributes) {
        if let Some(away) = saved.away_setpoint {
            self.away_setpoint = away;
        }
        if let Some(manual) = saved.manual_setpoint {
            self.manual_setpoint = manual;
        }
    }

    pub fn saved_attributes(&self) -> SavedAttributes {
        SavedAttributes {
            away_setpoint: Some(self.away_setpoint),
            manual_setpoint: Some(self.manual_setpoint),
        }
    }

    pub fn extra_attributes(&self) -> ExtraAttributes {
        ExtraAttributes {
            away_setpoint: self.away_setpoint,
            manual_setpoint: self.manual_setpoint,
            room_temp: self.room_temperature,
            relay_status: self.relay_status,
            power_relay_time: self.power_relay_time.clone(),
            signal_level: self.signal_level,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hvac_mode(&self) -> Option<HvacMode> {
        self.hvac_mode
    }

    pub fn hvac_modes(&self) -> [HvacMode; 3] {
        [HvacMode::Auto, HvacMode::Heat, HvacMode::Off]
    }

    pub fn hvac_action(&self) -> Option<HvacAction> {
        self.hvac_action
    }

    pub fn preset_mode(&self) -> Preset {
        self.preset
    }

    pub fn preset_modes(&self) -> [Preset; 4] {
        [Preset::None, Preset::Away, Preset::Boost, Preset::Sleep]
    }

    pub fn current_temperature(&self) -> Option<f64> {
        self.current_temperature
    }

    pub fn target_temperature(&self) -> Option<f64> {
        self.target_temperature
    }

    pub fn min_temp(&self) -> f64 {
        self.min_temp
    }

    pub fn max_temp(&self) -> f64 {
        self.max_temp
    }

    fn resolve_selection(&self) -> Result<DeviceKey> {
        let snapshots = self.client.snapshots();
        match &self.selector {
            Some(selector) => snapshots
                .iter()
                .find(|snapshot| {
                    snapshot.name == *selector || snapshot.device_id.to_string() == *selector
                })
                .map(|snapshot| DeviceKey {
                    house_id: snapshot.house_id,
                    device_id: snapshot.device_id,
                })
                .ok_or_else(|| SstError::UnknownDevice {
                    selector: selector.clone(),
                }),
            None => match snapshots.as_slice() {
                [only] => Ok(DeviceKey {
                    house_id: only.house_id,
                    device_id: only.device_id,
                }),
                other => Err(SstError::SelectorAmbiguous { count: other.len() }),
            },
        }
    }

    fn apply_snapshot(&mut self, snapshot: &DeviceSnapshot) {
        self.room_temperature = Some(snapshot.temperature_air_manual as f64);
        self.current_temperature = Some(snapshot.temperature_floor);
        self.target_temperature = Some(snapshot.temperature_manual as f64);
        self.signal_level = Some(snapshot.signal_level);
        self.relay_status = Some(snapshot.relay_status);
        self.power_relay_time = Some(snapshot.power_relay_time.clone());

        match snapshot.status {
            DeviceStatus::Off => {
                self.preset = Preset::None;
                self.hvac_mode = Some(HvacMode::Off);
            }
            DeviceStatus::On => match snapshot.mode {
                DeviceMode::Manual => self.hvac_mode = Some(HvacMode::Heat),
                DeviceMode::Chart => {
                    self.preset = Preset::None;
                    self.hvac_mode = Some(HvacMode::Auto);
                }
            },
        }

        self.hvac_action = Some(match (snapshot.status, snapshot.relay_status) {
            (DeviceStatus::On, RelayStatus::On) => HvacAction::Heating,
            (DeviceStatus::On, RelayStatus::Off) => HvacAction::Idle,
            (DeviceStatus::Off, _) => HvacAction::Off,
        });
    }

    async fn settle_and_update(&mut self) {
        // the vendor backend takes a while to reflect an applied write
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
        self.update().await;
    }

    fn log_outcome(&self, what: &str, result: Result<CommandOutcome>) {
        match result {
            Ok(CommandOutcome::Accepted) => {}
            Ok(CommandOutcome::Rejected { status }) => {
                warn!("Thermostat {}: {} rejected: http {}", self.name, what, status);
            }
            Err(e) => warn!("Thermostat {}: {} failed: {}", self.name, what, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::sst_api::models::response::device::Device;
    use crate::sst_api::testing::{device, FakeApi};

    fn config() -> ClimateConfig {
        ClimateConfig {
            name: "Floor heating".to_string(),
            min_temp: 5.0,
            max_temp: 45.0,
            boost_temp: 40.0,
            sleep_temp: 18.0,
            device: None,
        }
    }

    fn entity(api: Arc<FakeApi>) -> SstClimate<Arc<FakeApi>> {
        SstClimate::new(&config(), Duration::ZERO, CachedSstClient::new(api))
    }

    fn snapshot_of(dev: &Device) -> DeviceSnapshot {
        DeviceSnapshot::from(dev)
    }

    #[tokio::test]
    async fn powered_off_device_derives_off_mode_and_resets_preset() {
        let api = Arc::new(FakeApi::single_house(vec![device(1, 10, "Floor")]));
        let mut climate = entity(api);
        climate.preset = Preset::Away;

        let mut dev = device(1, 10, "Floor");
        dev.parsed_configuration.settings.status = DeviceStatus::Off;
        dev.parsed_configuration.relay_status = RelayStatus::On;
        climate.apply_snapshot(&snapshot_of(&dev));

        assert_eq!(climate.hvac_mode(), Some(HvacMode::Off));
        assert_eq!(climate.hvac_action(), Some(HvacAction::Off));
        assert_eq!(climate.preset_mode(), Preset::None);
    }

    #[tokio::test]
    async fn manual_mode_derives_heat_and_keeps_preset() {
        let api = Arc::new(FakeApi::single_house(vec![device(1, 10, "Floor")]));
        let mut climate = entity(api);
        climate.preset = Preset::Sleep;

        let mut dev = device(1, 10, "Floor");
        dev.parsed_configuration.settings.mode = DeviceMode::Manual;
        dev.parsed_configuration.relay_status = RelayStatus::On;
        climate.apply_snapshot(&snapshot_of(&dev));

        assert_eq!(climate.hvac_mode(), Some(HvacMode::Heat));
        assert_eq!(climate.hvac_action(), Some(HvacAction::Heating));
        assert_eq!(climate.preset_mode(), Preset::Sleep);
    }

    #[tokio::test]
    async fn chart_mode_derives_auto_and_resets_preset() {
        let api = Arc::new(FakeApi::single_house(vec![device(1, 10, "Floor")]));
        let mut climate = entity(api);
        climate.preset = Preset::Boost;

        let mut dev = device(1, 10, "Floor");
        dev.parsed_configuration.settings.mode = DeviceMode::Chart;
        dev.parsed_configuration.relay_status = RelayStatus::Off;
        climate.apply_snapshot(&snapshot_of(&dev));

        assert_eq!(climate.hvac_mode(), Some(HvacMode::Auto));
        assert_eq!(climate.hvac_action(), Some(HvacAction::Idle));
        assert_eq!(climate.preset_mode(), Preset::None);
    }

    #[tokio::test]
    async fn update_copies_snapshot_fields() {
        let mut dev = device(1, 10, "Floor");
        dev.parsed_configuration.settings.temperature_manual = 29;
        dev.parsed_configuration.current_temperature.temperature_floor = 26.5;
        let api = Arc::new(FakeApi::single_house(vec![dev]));
        let mut climate = entity(api);

        climate.update().await;

        assert_eq!(climate.current_temperature(), Some(26.5));
        assert_eq!(climate.target_temperature(), Some(29.0));
        assert_eq!(climate.hvac_mode(), Some(HvacMode::Heat));
    }

    #[tokio::test]
    async fn boost_preset_converges_to_boost_setpoint() {
        let api = Arc::new(FakeApi::single_house(vec![device(1, 10, "Floor")]));
        let mut climate = entity(api);

        climate.update().await;
        climate.set_preset_mode(Preset::Boost).await;

        assert_eq!(climate.preset_mode(), Preset::Boost);
        assert_eq!(climate.target_temperature(), Some(40.0));
        assert_eq!(climate.hvac_mode(), Some(HvacMode::Heat));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_state() {
        let api = Arc::new(FakeApi::single_house(vec![device(1, 10, "Floor")]));
        let mut climate = entity(api.clone());

        climate.update().await;
        assert_eq!(climate.target_temperature(), Some(25.0));

        {
            let mut state = api.state.lock().unwrap();
            state.device_list_failure = Some(reqwest::StatusCode::INTERNAL_SERVER_ERROR);
            if let Some(dev) = state.devices.first_mut() {
                dev.parsed_configuration.settings.temperature_manual = 99;
            }
        }
        climate.update().await;

        assert_eq!(climate.target_temperature(), Some(25.0));
        assert_eq!(climate.hvac_mode(), Some(HvacMode::Heat));
    }

    #[tokio::test]
    async fn accepted_temperature_write_persists_into_active_setpoint() {
        let api = Arc::new(FakeApi::single_house(vec![device(1, 10, "Floor")]));
        let mut climate = entity(api.clone());

        climate.update().await;
        climate.set_temperature(27.8).await;

        assert_eq!(climate.manual_setpoint, 27.0);
        assert_eq!(climate.target_temperature(), Some(27.0));

        climate.set_preset_mode(Preset::Away).await;
        climate.set_temperature(16.0).await;

        assert_eq!(climate.away_setpoint, 16.0);
        assert_eq!(climate.manual_setpoint, 27.0);
    }

    #[tokio::test]
    async fn rejected_temperature_write_is_not_persisted() {
        let api = Arc::new(FakeApi::single_house(vec![device(1, 10, "Floor")]));
        let mut climate = entity(api.clone());

        climate.update().await;
        api.state.lock().unwrap().reject_commands = Some(reqwest::StatusCode::FORBIDDEN);
        climate.set_temperature(30.0).await;

        assert_eq!(climate.manual_setpoint, 5.0);
    }

    #[tokio::test]
    async fn restore_reapplies_away_and_manual_setpoints() {
        let api = Arc::new(FakeApi::single_house(vec![device(1, 10, "Floor")]));
        let mut climate = entity(api);

        climate.restore_saved(&SavedAttributes {
            away_setpoint: Some(12.0),
            manual_setpoint: Some(23.0),
        });

        assert_eq!(climate.away_setpoint, 12.0);
        assert_eq!(climate.manual_setpoint, 23.0);
        let saved = climate.saved_attributes();
        assert_eq!(saved.away_setpoint, Some(12.0));
        assert_eq!(saved.manual_setpoint, Some(23.0));
    }

    #[tokio::test]
    async fn turn_off_powers_the_device_down() {
        let api = Arc::new(FakeApi::single_house(vec![device(1, 10, "Floor")]));
        let mut climate = entity(api);

        climate.update().await;
        climate.turn_off().await;
        assert_eq!(climate.hvac_mode(), Some(HvacMode::Off));
        assert_eq!(climate.hvac_action(), Some(HvacAction::Off));

        climate.turn_on().await;
        assert_eq!(climate.hvac_mode(), Some(HvacMode::Heat));
    }

    #[test]
    fn capability_surface_reflects_the_configuration() {
        let api = Arc::new(FakeApi::single_house(vec![device(1, 10, "Floor")]));
        let climate = entity(api);

        assert_eq!(climate.name(), "Floor heating");
        assert_eq!(climate.min_temp(), 5.0);
        assert_eq!(climate.max_temp(), 45.0);
        assert_eq!(
            climate.hvac_modes(),
            [HvacMode::Auto, HvacMode::Heat, HvacMode::Off]
        );
        assert_eq!(
            climate.preset_modes(),
            [Preset::None, Preset::Away, Preset::Boost, Preset::Sleep]
        );

        let attributes = climate.extra_attributes();
        assert_eq!(attributes.away_setpoint, 5.0);
        assert!(attributes.room_temp.is_none());
    }

    #[tokio::test]
    async fn selector_picks_the_named_device() {
        let api = Arc::new(FakeApi::single_house(vec![
            device(1, 10, "Hall"),
            device(1, 11, "Bathroom"),
        ]));
        let mut climate_config = config();
        climate_config.device = Some("Bathroom".to_string());
        let mut climate =
            SstClimate::new(&climate_config, Duration::ZERO, CachedSstClient::new(api));

        climate.update().await;

        assert_eq!(climate.selection.unwrap().device_id, 11);
    }

    #[tokio::test]
    async fn two_devices_without_selector_never_bind() {
        let api = Arc::new(FakeApi::single_house(vec![
            device(1, 10, "Hall"),
            device(1, 11, "Bathroom"),
        ]));
        let mut climate = entity(api);

        climate.update().await;

        assert!(climate.selection.is_none());
        assert_eq!(climate.hvac_mode(), None);
    }
}
