use serde::{Deserialize, Serialize};

use crate::sst_api::models::response::device::RelayStatus;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HvacMode {
    #[serde(rename = "off")]
    Off,
    #[serde(rename = "heat")]
    Heat,
    #[serde(rename = "auto")]
    Auto,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HvacAction {
    #[serde(rename = "off")]
    Off,
    #[serde(rename = "heating")]
    Heating,
    #[serde(rename = "idle")]
    Idle,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "away")]
    Away,
    #[serde(rename = "boost")]
    Boost,
    #[serde(rename = "sleep")]
    Sleep,
}

/// The slice of entity state the host platform persists across restarts.
/// Only the away and manual setpoints are restored; everything else is
/// re-derived from the first refresh.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default)]
pub struct SavedAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub away_setpoint: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_setpoint: Option<f64>,
}

#[derive(Serialize, Debug, Clone)]
pub struct ExtraAttributes {
    pub away_setpoint: f64,
    pub manual_setpoint: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay_status: Option<RelayStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_relay_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_level: Option<i64>,
}
