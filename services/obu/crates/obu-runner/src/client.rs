//! HTTP client for the edge-server vehicle and alert APIs.
//!
//! Every call picks a random server from the configured list and retries
//! with linear backoff. Calls never fail: a body that is not JSON comes
//! back as `{"raw": <text>}` and exhausted retries as `{"error": <cause>}`,
//! so a flaky edge server never stops the reporting loop.

use std::time::Duration;

use anyhow::{Result, bail};
use fleet_common::{ClientSettings, VehicleCategory};
use rand::seq::SliceRandom;
use reqwest::{Client, RequestBuilder};
use serde_json::{Value, json};

use crate::sensor::SensorData;

const POST_TIMEOUT: Duration = Duration::from_secs(8);
const GET_TIMEOUT: Duration = Duration::from_secs(6);

/// Alert type used by [`ObuClient::emergency_broadcast`] unless overridden.
pub const EMERGENCY_ALERT_TYPE: u8 = 3;

/// One simulated vehicle talking to the edge servers.
#[derive(Debug, Clone)]
pub struct ObuClient {
    http: Client,
    settings: ClientSettings,
    private_key: String,
    vehicle_id: String,
    category: VehicleCategory,
}

impl ObuClient {
    /// Build a client for one vehicle.
    ///
    /// # Errors
    ///
    /// Returns an error if `settings` has no edge servers or the HTTP client
    /// cannot be built.
    pub fn new(
        settings: ClientSettings,
        private_key: impl Into<String>,
        vehicle_id: impl Into<String>,
        category: VehicleCategory,
    ) -> Result<Self> {
        if settings.edge_servers.is_empty() {
            bail!("No edge servers configured");
        }
        Ok(Self {
            http: Client::builder().build()?,
            settings,
            private_key: private_key.into(),
            vehicle_id: vehicle_id.into(),
            category,
        })
    }

    #[must_use]
    pub fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    /// POST `/api/vehicle/register`.
    pub async fn register(&self) -> Value {
        let payload = json!({
            "vehiclePrivateKey": self.private_key,
            "vehicleId": self.vehicle_id,
            "vehicleCategory": self.category.code(),
        });
        tracing::info!(vehicle = %self.vehicle_id, "registering vehicle");
        self.post("/api/vehicle/register", &payload).await
    }

    /// GET `/api/vehicle/check/<address>`.
    pub async fn check_registration(&self, address: &str) -> Value {
        self.get(&format!("/api/vehicle/check/{address}")).await
    }

    /// POST `/api/alert/send`.
    pub async fn send_alert(&self, message: &str, alert_type: u8, priority: u8) -> Value {
        let payload = json!({
            "vehiclePrivateKey": self.private_key,
            "alertMessage": message,
            "alertType": alert_type,
            "priority": priority,
        });
        self.post("/api/alert/send", &payload).await
    }

    /// POST `/api/alert/emergency-broadcast`.
    pub async fn emergency_broadcast(&self, message: &str, alert_type: u8) -> Value {
        let payload = json!({
            "vehiclePrivateKey": self.private_key,
            "alertMessage": message,
            "alertType": alert_type,
        });
        self.post("/api/alert/emergency-broadcast", &payload).await
    }

    /// POST `/api/alert/process-sensor-data`.
    pub async fn process_sensor_data(&self, data: &SensorData) -> Value {
        let payload = json!({
            "vehiclePrivateKey": self.private_key,
            "sensorData": data,
            "isEmergencyVehicle": self.category.is_emergency(),
        });
        self.post("/api/alert/process-sensor-data", &payload).await
    }

    fn pick_server(&self) -> &str {
        self.settings
            .edge_servers
            .choose(&mut rand::thread_rng())
            .map_or("", String::as_str)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.pick_server().trim_end_matches('/'))
    }

    async fn post(&self, path: &str, payload: &Value) -> Value {
        let url = self.url(path);
        self.with_retries("POST", &url, || {
            self.http.post(&url).json(payload).timeout(POST_TIMEOUT)
        })
        .await
    }

    async fn get(&self, path: &str) -> Value {
        let url = self.url(path);
        self.with_retries("GET", &url, || self.http.get(&url).timeout(GET_TIMEOUT))
            .await
    }

    async fn with_retries(
        &self,
        method: &str,
        url: &str,
        request: impl Fn() -> RequestBuilder,
    ) -> Value {
        let mut attempt = 1;
        loop {
            match send(request()).await {
                Ok(body) => return body,
                Err(e) => {
                    tracing::debug!(%method, %url, attempt, error = %e, "request failed");
                    if attempt >= self.settings.retries {
                        return json!({ "error": e.to_string() });
                    }
                    tokio::time::sleep(self.settings.delay_after(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}

async fn send(request: RequestBuilder) -> reqwest::Result<Value> {
    let text = request.send().await?.error_for_status()?.text().await?;
    Ok(serde_json::from_str(&text).unwrap_or_else(|_| json!({ "raw": text })))
}
