use crate::config::{Credentials, JobConfig};
use crate::error::{JobError, Stage};
use crate::model::{EigyousyoResponse, MovementResponse, Movement, NippoReport, TokenResponse};
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

const TOKEN_PATH: &str = "/oauth2/token";
const EIGYOUSYO_INFO_PATH: &str = "/openapi/v1/eigyousyo/info";
const MOVEMENT_PATH: &str = "/openapi/v1/dailyreport/movement";
const MAINTENANCE_MODEL_PATH: &str = "/openapi/v1/dailyreport/maintenancemodel";

/// Client for the telematics open API. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    report_timeout: Duration,
}

impl ApiClient {
    pub fn new(client: Client, config: &JobConfig) -> Self {
        ApiClient {
            client,
            base_url: config.base_url.to_owned(),
            report_timeout: config.report_timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchanges the password-grant credentials for a bearer token.
    pub async fn get_access_token(&self, credentials: &Credentials) -> Result<SecretString, JobError> {
        let form = [
            ("grant_type", "password"),
            ("username", credentials.username.expose_secret().as_str()),
            ("password", credentials.password.expose_secret().as_str()),
            ("client_id", credentials.client_id.expose_secret().as_str()),
            ("client_secret", credentials.client_secret.expose_secret().as_str()),
        ];
        let res = self.client.post(self.url(TOKEN_PATH))
            .form(&form)
            .send()
            .await
            .map_err(|e| JobError::Auth(e.to_string()))?;
        if !res.status().is_success() {
            return Err(JobError::Auth(format!("received status code {}", res.status().as_u16())));
        }
        let token: TokenResponse = res.json()
            .await
            .map_err(|e| JobError::Auth(e.to_string()))?;
        if token.access_token.is_empty() {
            return Err(JobError::Auth("response did not contain an access token".to_string()));
        }
        Ok(SecretString::new(token.access_token))
    }

    /// Lists every branch code visible to the authenticated account, in upstream order.
    pub async fn get_eigyousyo_codes(&self, token: &SecretString) -> Result<Vec<String>, JobError> {
        let request = self.client.get(self.url(EIGYOUSYO_INFO_PATH));
        let response: EigyousyoResponse = send_json(request, token)
            .await
            .map_err(|reason| JobError::upstream(Stage::Directory, reason))?;
        let codes: Vec<String> = response.results
            .into_iter()
            .map(|r| r.eigyousyo_code)
            .collect();
        info!(count = codes.len(), "retrieved eigyousyo codes {:?}", codes);
        Ok(codes)
    }

    pub async fn get_movements(&self, token: &SecretString, eigyousyo_code: &str) -> Result<Vec<Movement>, JobError> {
        let request = self.client.get(self.url(MOVEMENT_PATH))
            .query(&[("eigyousyoCode", eigyousyo_code)]);
        let response: MovementResponse = send_json(request, token)
            .await
            .map_err(|reason| JobError::upstream(Stage::Movement, reason))?;
        debug!(eigyousyo_code, count = response.results.movement_basic_info.len(), "retrieved movements");
        Ok(response.results.movement_basic_info)
    }

    /// Fetches the daily report for one driver and vehicle, bounded by the report timeout.
    pub async fn get_nippo(&self, token: &SecretString, movement: &Movement) -> Result<NippoReport, JobError> {
        let request = self.client.get(self.url(MAINTENANCE_MODEL_PATH))
            .query(&[
                ("eigyousyoId", "1".to_string()),
                ("dbId", movement.db_id.to_string()),
                ("driverId", movement.driver_id.to_string()),
                ("hasRoutePermission", "false".to_string()),
            ])
            .timeout(self.report_timeout);
        send_json(request, token)
            .await
            .map_err(|reason| JobError::Fetch {
                driver_id: movement.driver_id,
                db_id: movement.db_id,
                reason,
            })
    }
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder, token: &SecretString) -> Result<T, String> {
    let res = request
        .bearer_auth(token.expose_secret())
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if res.status() != StatusCode::OK {
        return Err(format!("received status code {}", res.status().as_u16()));
    }
    let body = res.bytes()
        .await
        .map_err(|e| e.to_string())?;
    serde_json::from_slice(&body).map_err(|e| format!("failed to decode response: {}", e))
}
