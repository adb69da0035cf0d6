//! api_client.rs
//!
//! HTTP-клиент к backend системы продажи билетов.
//!
//! Каждый метод делает ровно один запрос: без повторов и без circuit breaker.
//! Ответ 2xx декодируется в модель, не-2xx превращается в `ClientError::Api`
//! с текстом из поля `message` или `descripcion` тела ответа.

use reqwest::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    Method, RequestBuilder, Response,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::{
    config::{normalize_base_url, ApiConfig},
    error::{error_message_from_body, ClientError},
    models::{
        AuthResponse, BlockResponse, Credentials, EventDetail, EventSummary, LoginRequest, Purchase,
        RegisterRequest, SaleResult, SeatSelectionRequest, Session, Step,
    },
};

/// Query-параметры `POST /api/sesion/paso`.
#[derive(Debug, Serialize)]
struct StepQuery {
    paso: &'static str,
    #[serde(rename = "eventoId", skip_serializing_if = "Option::is_none")]
    evento_id: Option<i64>,
}

/// Путь обновления шага вместе с query-строкой.
pub fn step_path(step: Step, event_id: Option<i64>) -> String {
    let query = StepQuery {
        paso: step.as_str(),
        evento_id: event_id,
    };
    // Сериализация плоской структуры из строки и числа не падает
    let encoded = serde_urlencoded::to_string(&query).unwrap_or_else(|_| format!("paso={}", step.as_str()));
    format!("/api/sesion/paso?{}", encoded)
}

/// Клиент REST API. Дёшево клонируется, `reqwest::Client` внутри разделяемый.
#[derive(Clone, Debug)]
pub struct ApiClient {
    /// Базовый URL backend без завершающего слэша.
    base_url: String,
    http_client: reqwest::Client,
}

impl ApiClient {
    pub fn from_config(config: &ApiConfig) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            base_url: normalize_base_url(&config.base_url),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, credentials: Option<&Credentials>) -> RequestBuilder {
        debug!("{} {}", method, path);
        let mut builder = self
            .http_client
            .request(method, format!("{}{}", self.base_url, path))
            .header(CONTENT_TYPE, "application/json");
        if let Some(credentials) = credentials {
            builder = builder.header(AUTHORIZATION, credentials.basic_auth_header());
        }
        builder
    }

    /// Отправляет запрос; не-2xx превращается в `ClientError::Api`.
    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await.map_err(|e| {
            error!("Request to backend failed: {}", e);
            ClientError::Transport(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // Тело ошибки может быть пустым или не-JSON
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        let message = error_message_from_body(&body);
        warn!("Backend rejected request: status={}, message={}", status, message);
        Err(ClientError::Api { status, message })
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        self.send(request).await?.json::<T>().await.map_err(|e| {
            error!("Failed to decode backend response: {}", e);
            ClientError::Transport(e)
        })
    }

    /// Для ответов без полезного тела: важен только статус.
    async fn execute_ack(&self, request: RequestBuilder) -> Result<(), ClientError> {
        self.send(request).await.map(|_| ())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.execute(self.request(Method::POST, "/api/auth/login", None).json(&body))
            .await
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        self.execute(self.request(Method::POST, "/api/auth/register", None).json(request))
            .await
    }

    pub async fn logout(&self, credentials: &Credentials) -> Result<(), ClientError> {
        self.execute_ack(self.request(Method::POST, "/api/auth/logout", Some(credentials)))
            .await
    }

    pub async fn get_session(&self, credentials: &Credentials) -> Result<Session, ClientError> {
        self.execute(self.request(Method::GET, "/api/sesion", Some(credentials)))
            .await
    }

    pub async fn update_step(
        &self,
        credentials: &Credentials,
        step: Step,
        event_id: Option<i64>,
    ) -> Result<Session, ClientError> {
        let path = step_path(step, event_id);
        self.execute(self.request(Method::POST, &path, Some(credentials)))
            .await
    }

    pub async fn list_events(&self, credentials: &Credentials) -> Result<Vec<EventSummary>, ClientError> {
        self.execute(self.request(Method::GET, "/api/eventos", Some(credentials)))
            .await
    }

    pub async fn get_event_detail(&self, credentials: &Credentials, event_id: i64) -> Result<EventDetail, ClientError> {
        let path = format!("/api/eventos/{}", event_id);
        self.execute(self.request(Method::GET, &path, Some(credentials)))
            .await
    }

    pub async fn select_seats(
        &self,
        credentials: &Credentials,
        request: &SeatSelectionRequest,
    ) -> Result<Session, ClientError> {
        self.execute(
            self.request(Method::POST, "/api/sesion/seleccionar-asientos", Some(credentials))
                .json(request),
        )
        .await
    }

    pub async fn block_seats(&self, credentials: &Credentials) -> Result<BlockResponse, ClientError> {
        self.execute(self.request(Method::POST, "/api/sesion/bloquear-asientos", Some(credentials)))
            .await
    }

    pub async fn complete_sale(&self, credentials: &Credentials) -> Result<SaleResult, ClientError> {
        self.execute(self.request(Method::POST, "/api/ventas/realizar", Some(credentials)))
            .await
    }

    pub async fn list_purchases(&self, credentials: &Credentials) -> Result<Vec<Purchase>, ClientError> {
        self.execute(self.request(Method::GET, "/api/ventas", Some(credentials)))
            .await
    }

    pub async fn delete_session(&self, credentials: &Credentials) -> Result<(), ClientError> {
        self.execute_ack(self.request(Method::DELETE, "/api/sesion", Some(credentials)))
            .await
    }
}
