use serde::Deserialize;
use std::env;

use crate::error::ClientError;

// Главная структура конфигурации клиента
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub api: ApiConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub environment: String,
    pub rust_log: String,
}

// Настройки backend API
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ClientError> {
        let timeout_raw = env::var("API_TIMEOUT_SECONDS").unwrap_or_else(|_| "30".to_string());
        let timeout_seconds = timeout_raw.trim().parse::<u64>().map_err(|_| {
            ClientError::Config(format!(
                "API_TIMEOUT_SECONDS must be a valid number, got '{}'",
                timeout_raw
            ))
        })?;

        Ok(Config {
            app: AppConfig {
                environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
                rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "ticket_client=info".to_string()),
            },
            api: ApiConfig {
                base_url: normalize_base_url(
                    &env::var("API_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string()),
                ),
                timeout_seconds,
            },
        })
    }
}

// Пути эндпоинтов начинаются с "/", поэтому хвостовой слэш убираем
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
