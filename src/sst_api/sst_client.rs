use std::sync::Arc;

use reqwest::header::{self, HeaderMap};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::SstCloudConfig;
use crate::sst_api::error::{CommandOutcome, Result, SstError};
use crate::sst_api::models::request::control_request::{
    ModeRequest, StatusRequest, TemperatureRequest,
};
use crate::sst_api::models::request::login_request::LoginRequest;
use crate::sst_api::models::response::device::{Device, DeviceMode, DeviceStatus};
use crate::sst_api::models::response::house::House;

const BASE_URL: &str = "https://api.sst-cloud.com";
const CSRF_HEADER: &str = "X-CSRFToken";

/// Session material captured from the login response. Either the whole session
/// exists or none of it does; a login that yields cookies without a `csrftoken`
/// never produces a `Session`.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    cookie_header: String,
    csrf_token: String,
}

impl Session {
    pub(crate) fn from_cookies(cookies: &[(String, String)]) -> Result<Self> {
        let csrf_token = cookies
            .iter()
            .find(|(name, _)| name == "csrftoken")
            .map(|(_, value)| value.clone())
            .ok_or(SstError::MissingCredential)?;

        let cookie_header = cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ");

        Ok(Self {
            cookie_header,
            csrf_token,
        })
    }
}

pub struct SstCloudClient {
    client: reqwest::Client,
    username: String,
    password: String,
    language: String,
    session: Mutex<Option<Session>>,
}

impl SstCloudClient {
    pub fn new(config: &SstCloudConfig) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, "application/json".parse().unwrap());

        Self {
            client: reqwest::Client::builder()
                .default_headers(headers)
                .build()
                .unwrap(),
            username: config.username.clone(),
            password: config.password.clone(),
            language: config.language.clone(),
            session: Mutex::new(None),
        }
    }

    /// Returns the active session, logging in first if none exists yet.
    async fn session(&self) -> Result<Session> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref() {
            return Ok(session.clone());
        }

        let session = self.login().await?;
        *guard = Some(session.clone());
        Ok(session)
    }

    async fn login(&self) -> Result<Session> {
        let body = LoginRequest {
            username: &self.username,
            password: &self.password,
            email: &self.username,
            language: &self.language,
        };
        let response = self
            .client
            .post(format!("{}/auth/login/", BASE_URL))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!("Login for {} rejected: http {}", self.username, status);
            return Err(SstError::AuthFailure { status });
        }

        let cookies: Vec<(String, String)> = response
            .cookies()
            .map(|cookie| (cookie.name().to_string(), cookie.value().to_string()))
            .collect();

        let session = Session::from_cookies(&cookies)?;
        debug!("Logged in to SST Cloud as {}", self.username);
        Ok(session)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T> {
        let session = self.session().await?;
        let response = self
            .client
            .get(url)
            .header(header::COOKIE, &session.cookie_header)
            .header(CSRF_HEADER, &session.csrf_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SstError::FetchFailure { status });
        }

        let contents = response.text().await?;
        serde_json::from_str(&contents).map_err(|e| SstError::InvalidPayload {
            source: e,
            body: contents,
        })
    }

    async fn post_command<B: serde::Serialize>(
        &self,
        url: String,
        body: &B,
    ) -> Result<CommandOutcome> {
        let session = self.session().await?;
        let response = self
            .client
            .post(url)
            .header(header::COOKIE, &session.cookie_header)
            .header(CSRF_HEADER, &session.csrf_token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(CommandOutcome::Accepted)
        } else {
            Ok(CommandOutcome::Rejected { status })
        }
    }
}

impl SstApi for SstCloudClient {
    async fn authenticate(&self) -> Result<()> {
        self.session().await.map(|_| ())
    }

    async fn list_houses(&self) -> Result<Vec<House>> {
        self.get_json(format!("{}/houses/", BASE_URL)).await
    }

    async fn list_devices(&self, house_id: i64) -> Result<Vec<Device>> {
        self.get_json(format!("{}/houses/{}/devices/", BASE_URL, house_id))
            .await
    }

    async fn set_device_status(
        &self,
        house_id: i64,
        device_id: i64,
        status: DeviceStatus,
    ) -> Result<CommandOutcome> {
        let url = format!("{}/houses/{}/devices/{}/status/", BASE_URL, house_id, device_id);
        let outcome = self.post_command(url, &StatusRequest { status }).await?;
        debug!("Set status {:?} on device {}: {:?}", status, device_id, outcome);
        Ok(outcome)
    }

    async fn set_temperature_manual(
        &self,
        house_id: i64,
        device_id: i64,
        temperature: i64,
    ) -> Result<CommandOutcome> {
        let url = format!(
            "{}/houses/{}/devices/{}/temperature/",
            BASE_URL, house_id, device_id
        );
        let outcome = self
            .post_command(url, &TemperatureRequest {
                temperature_manual: temperature,
            })
            .await?;
        debug!(
            "Set manual temperature {} on device {}: {:?}",
            temperature, device_id, outcome
        );
        Ok(outcome)
    }

    async fn set_device_mode(
        &self,
        house_id: i64,
        device_id: i64,
        mode: DeviceMode,
    ) -> Result<CommandOutcome> {
        let url = format!("{}/houses/{}/devices/{}/mode/", BASE_URL, house_id, device_id);
        let outcome = self.post_command(url, &ModeRequest { mode }).await?;
        debug!("Set mode {:?} on device {}: {:?}", mode, device_id, outcome);
        Ok(outcome)
    }
}

pub trait SstApi {
    fn authenticate(&self) -> impl std::future::Future<Output = Result<()>> + Send;
    fn list_houses(&self) -> impl std::future::Future<Output = Result<Vec<House>>> + Send;
    fn list_devices(
        &self,
        house_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<Device>>> + Send;
    fn set_device_status(
        &self,
        house_id: i64,
        device_id: i64,
        status: DeviceStatus,
    ) -> impl std::future::Future<Output = Result<CommandOutcome>> + Send;
    fn set_temperature_manual(
        &self,
        house_id: i64,
        device_id: i64,
        temperature: i64,
    ) -> impl std::future::Future<Output = Result<CommandOutcome>> + Send;
    fn set_device_mode(
        &self,
        house_id: i64,
        device_id: i64,
        mode: DeviceMode,
    ) -> impl std::future::Future<Output = Result<CommandOutcome>> + Send;
}

// Implement SstApi for Arc<T> where T: SstApi
impl<T> SstApi for Arc<T>
where
    T: SstApi + Send + Sync,
{
    async fn authenticate(&self) -> Result<()> {
        self.as_ref().authenticate().await
    }

    async fn list_houses(&self) -> Result<Vec<House>> {
        self.as_ref().list_houses().await
    }

    async fn list_devices(&self, house_id: i64) -> Result<Vec<Device>> {
        self.as_ref().list_devices(house_id).await
    }

    async fn set_device_status(
        &self,
        house_id: i64,
        device_id: i64,
        status: DeviceStatus,
    ) -> Result<CommandOutcome> {
        self.as_ref()
            .set_device_status(house_id, device_id, status)
            .await
    }

    async fn set_temperature_manual(
        &self,
        house_id: i64,
        device_id: i64,
        temperature: i64,
    ) -> Result<CommandOutcome> {
        self.as_ref()
            .set_temperature_manual(house_id, device_id, temperature)
            .await
    }

    async fn set_device_mode(
        &self,
        house_id: i64,
        device_id: i64,
        mode: DeviceMode,
    ) -> Result<CommandOutcome> {
        self.as_ref().set_device_mode(house_id, device_id, mode).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookies(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn session_derives_csrf_header_from_cookie() {
        let session = Session::from_cookies(&cookies(&[
            ("sessionid", "abc123"),
            ("csrftoken", "tok456"),
        ]))
        .unwrap();

        assert_eq!(session.csrf_token, "tok456");
        assert_eq!(session.cookie_header, "sessionid=abc123; csrftoken=tok456");
    }

    #[test]
    fn missing_csrftoken_cookie_fails_loudly() {
        let result = Session::from_cookies(&cookies(&[("sessionid", "abc123")]));

        assert!(matches!(result, Err(SstError::MissingCredential)));
    }
}
