use crate::error::JobError;
use secrecy::SecretString;
use std::env;
use std::time::Duration;

const API_USERNAME: &str = "API_USERNAME";
const API_PASSWORD: &str = "API_PASSWORD";
const API_CLIENT_ID: &str = "API_CLIENT_ID";
const API_CLIENT_SECRET: &str = "API_CLIENT_SECRET";
const TABLE_NAME: &str = "TABLE_NAME";
const API_BASE_URL: &str = "API_BASE_URL";
const DYNAMODB_ENDPOINT: &str = "DYNAMODB_ENDPOINT";
const MAX_CONCURRENT_FETCHES: &str = "MAX_CONCURRENT_FETCHES";
const REPORT_TIMEOUT_SECS: &str = "REPORT_TIMEOUT_SECS";

pub const DEFAULT_BASE_URL: &str = "https://itpv3.transtron.fujitsu.com";
pub const DEFAULT_REPORT_TIMEOUT: Duration = Duration::from_secs(900);

/// OAuth2 password-grant credentials. `Debug` output is redacted.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: SecretString,
    pub password: SecretString,
    pub client_id: SecretString,
    pub client_secret: SecretString,
}

impl Credentials {
    pub fn new(username: &str, password: &str, client_id: &str, client_secret: &str) -> Self {
        Credentials {
            username: SecretString::new(username.to_string()),
            password: SecretString::new(password.to_string()),
            client_id: SecretString::new(client_id.to_string()),
            client_secret: SecretString::new(client_secret.to_string()),
        }
    }
}

/// Everything the job needs, loaded once per invocation.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub credentials: Credentials,
    pub table_name: String,
    pub base_url: String,
    pub dynamodb_endpoint: Option<String>,
    /// `None` launches every report fetch at once.
    pub max_concurrent_fetches: Option<usize>,
    pub report_timeout: Duration,
}

impl JobConfig {
    pub fn new(credentials: Credentials, table_name: &str) -> Self {
        JobConfig {
            credentials,
            table_name: table_name.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            dynamodb_endpoint: None,
            max_concurrent_fetches: None,
            report_timeout: DEFAULT_REPORT_TIMEOUT,
        }
    }

    pub fn from_env() -> Result<Self, JobError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, JobError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| JobError::Config(format!("{} is not set", key)))
        };
        let credentials = Credentials {
            username: SecretString::new(required(API_USERNAME)?),
            password: SecretString::new(required(API_PASSWORD)?),
            client_id: SecretString::new(required(API_CLIENT_ID)?),
            client_secret: SecretString::new(required(API_CLIENT_SECRET)?),
        };
        let mut config = JobConfig::new(credentials, &required(TABLE_NAME)?);
        if let Some(base_url) = lookup(API_BASE_URL).filter(|v| !v.is_empty()) {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        config.dynamodb_endpoint = lookup(DYNAMODB_ENDPOINT).filter(|v| !v.is_empty());
        if let Some(max) = lookup(MAX_CONCURRENT_FETCHES) {
            match max.parse::<usize>() {
                Ok(0) => return Err(JobError::Config(format!("{} must be at least 1; unset it for no limit", MAX_CONCURRENT_FETCHES))),
                Ok(n) => config.max_concurrent_fetches = Some(n),
                Err(_) => return Err(JobError::Config(format!("{} must be a number, got {:?}", MAX_CONCURRENT_FETCHES, max))),
            }
        }
        if let Some(secs) = lookup(REPORT_TIMEOUT_SECS) {
            let secs = secs.parse::<u64>()
                .map_err(|_| JobError::Config(format!("{} must be a number of seconds, got {:?}", REPORT_TIMEOUT_SECS, secs)))?;
            config.report_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}
