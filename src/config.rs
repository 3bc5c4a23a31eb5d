use std::env;
use std::time::Duration;

use crate::services::dataset_service::DatasetKey;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_url: String,
    pub data_version: String,
    pub data_sheet: String,
    pub server_host: String,
    pub server_port: u16,
    pub download_timeout_secs: u64,
    pub session_idle_minutes: u64,
    pub credentials: Option<Credentials>,
}

/// Dashboard login secrets. Both variables must be set for login to work.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Config {
            data_url: env::var("DATA_URL")?,
            data_version: env::var("DATA_VERSION").unwrap_or_else(|_| "v1".to_string()),
            data_sheet: env::var("DATA_SHEET").unwrap_or_else(|_| "Sheet1".to_string()),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            download_timeout_secs: env::var("DOWNLOAD_TIMEOUT_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            session_idle_minutes: env::var("SESSION_IDLE_MINUTES")
                .unwrap_or_else(|_| "1440".to_string())
                .parse()
                .unwrap_or(1440),
            credentials: Self::credentials_from_env(),
        })
    }

    fn credentials_from_env() -> Option<Credentials> {
        match (env::var("DASHBOARD_USERNAME"), env::var("DASHBOARD_PASSWORD")) {
            (Ok(username), Ok(password)) => Some(Credentials { username, password }),
            _ => None,
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_minutes * 60)
    }

    pub fn dataset_key(&self) -> DatasetKey {
        DatasetKey::new(self.data_url.clone(), self.data_version.clone())
    }
}
