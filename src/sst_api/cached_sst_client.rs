use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::sst_api::error::{CommandOutcome, Result, SstError};
use crate::sst_api::models::response::device::{Device, DeviceMode, DeviceStatus};
use crate::sst_api::models::response::house::House;
use crate::sst_api::models::snapshot::DeviceSnapshot;
use crate::sst_api::sst_client::SstApi;

#[derive(Default)]
struct TopologyCache {
    houses: Option<Vec<House>>,
    devices_by_house: Option<HashMap<i64, Vec<Device>>>,
    last_refresh: Option<DateTime<Utc>>,
}

/// Caching layer over the raw vendor client. Houses are discovered once per
/// client lifetime; device data is fetched lazily and only re-fetched on an
/// explicit force. Refresh and control operations are serialized through one
/// write gate, so their ordering per client instance is deterministic.
pub struct CachedSstClient<T>
where
    T: SstApi,
{
    client: T,
    gate: tokio::sync::Mutex<()>,
    cache: Mutex<TopologyCache>,
}

impl<T> CachedSstClient<T>
where
    T: SstApi,
{
    pub fn new(client: T) -> Self {
        Self {
            client,
            gate: tokio::sync::Mutex::new(()),
            cache: Mutex::new(TopologyCache::default()),
        }
    }

    /// Refreshes the device cache. Returns `Ok(true)` when the cache is usable
    /// afterwards (including the no-I/O cache-hit case) and `Ok(false)` when a
    /// device list fetch was rejected; the previous cache survives untouched in
    /// that case. More than one house on the account is a hard error.
    pub async fn refresh_device_state(&self, force_refresh: bool) -> Result<bool> {
        let _gate = self.gate.lock().await;

        if !force_refresh && self.cache.lock().unwrap().devices_by_house.is_some() {
            return Ok(true);
        }

        self.client.authenticate().await?;
        let houses = self.ensure_houses().await?;

        let mut devices_by_house = HashMap::new();
        for house in houses {
            let devices = match self.client.list_devices(house.id).await {
                Ok(devices) => devices,
                Err(SstError::FetchFailure { status }) => {
                    warn!(
                        "Device list for house {} failed: http {}; keeping previous data",
                        house.id, status
                    );
                    return Ok(false);
                }
                Err(e) => return Err(e),
            };
            debug!(
                "Fetched {} device(s) for house {} ({})",
                devices.len(),
                house.id,
                house.name
            );
            devices_by_house.insert(house.id, devices);
        }

        let mut cache = self.cache.lock().unwrap();
        cache.devices_by_house = Some(devices_by_house);
        cache.last_refresh = Some(Utc::now());
        Ok(true)
    }

    /// House discovery happens at most once; a multi-house account is refused
    /// before anything is cached.
    async fn ensure_houses(&self) -> Result<Vec<House>> {
        if let Some(houses) = self.cache.lock().unwrap().houses.clone() {
            return Ok(houses);
        }

        let houses = self.client.list_houses().await?;
        if houses.len() > 1 {
            return Err(SstError::UnsupportedTopology {
                count: houses.len(),
            });
        }

        self.cache.lock().unwrap().houses = Some(houses.clone());
        Ok(houses)
    }

    /// Pure cache lookup; never performs I/O. Callers refresh first.
    pub fn device_snapshot(&self, house_id: i64, device_id: i64) -> Option<DeviceSnapshot> {
        let cache = self.cache.lock().unwrap();
        cache
            .devices_by_house
            .as_ref()?
            .get(&house_id)?
            .iter()
            .find(|device| device.id == device_id)
            .map(DeviceSnapshot::from)
    }

    /// All cached devices, flattened. Empty until the first successful refresh.
    pub fn snapshots(&self) -> Vec<DeviceSnapshot> {
        let cache = self.cache.lock().unwrap();
        match cache.devices_by_house.as_ref() {
            Some(devices_by_house) => devices_by_house
                .values()
                .flat_map(|devices| devices.iter().map(DeviceSnapshot::from))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.cache.lock().unwrap().last_refresh
    }

    pub async fn set_status(
        &self,
        house_id: i64,
        device_id: i64,
        status: DeviceStatus,
    ) -> Result<CommandOutcome> {
        let _gate = self.gate.lock().await;
        self.client
            .set_device_status(house_id, device_id, status)
            .await
    }

    pub async fn set_temperature(
        &self,
        house_id: i64,
        device_id: i64,
        temperature: i64,
    ) -> Result<CommandOutcome> {
        let _gate = self.gate.lock().await;
        self.client
            .set_temperature_manual(house_id, device_id, temperature)
            .await
    }

    pub async fn set_mode(
        &self,
        house_id: i64,
        device_id: i64,
        mode: DeviceMode,
    ) -> Result<CommandOutcome> {
        let _gate = self.gate.lock().await;
        self.client.set_device_mode(house_id, device_id, mode).await
    }
}
