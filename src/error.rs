//! Ошибки клиентского ядра.
//!
//! Три категории: сетевые сбои (`Transport`), отказы сервера с не-2xx
//! статусом (`Api`) и локальные проверки (`Selection`, `Validation`),
//! которые срабатывают до любого сетевого вызова.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Сообщение по умолчанию, если сервер не прислал ни `message`, ни `descripcion`.
pub const UNEXPECTED_ERROR: &str = "Error inesperado";

/// Локальные ограничения выбора мест. Это подсказки для пользователя, а не фатальные ошибки.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Solo se permiten hasta 4 asientos")]
    MaxSeatsReached,

    #[error("Selecciona al menos 1 asiento")]
    EmptySelection,

    #[error("Completa el nombre y apellido para cada asiento")]
    UnnamedPassenger,

    #[error("El asiento no está disponible")]
    SeatUnavailable,

    #[error("El asiento está fuera del mapa")]
    OutOfGrid,

    #[error("No existe el pasajero {0}")]
    NoSuchPassenger(usize),
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// Соединение, таймаут или ошибка декодирования ответа.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Сервер ответил не-2xx; `message` уже извлечён из тела ответа.
    #[error("{message}")]
    Api { status: StatusCode, message: String },

    /// Ответ 2xx, но с `success: false`.
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("Datos de registro inválidos: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Debes iniciar sesión")]
    NotAuthenticated,

    #[error("No hay evento seleccionado")]
    NoEventSelected,

    #[error("Configuración inválida: {0}")]
    Config(String),
}

impl ClientError {
    /// Текст, который показывается пользователю на текущем экране.
    pub fn user_message(&self) -> String {
        let text = self.to_string();
        if text.trim().is_empty() {
            UNEXPECTED_ERROR.to_string()
        } else {
            text
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ClientError::Selection(_) | ClientError::Validation(_) | ClientError::NotAuthenticated | ClientError::NoEventSelected
        )
    }
}

/// Извлекает текст ошибки из тела не-2xx ответа.
///
/// Берётся `message`, затем `descripcion`; пустые строки пропускаются.
/// Если тело не JSON-объект или полей нет, возвращается [`UNEXPECTED_ERROR`].
pub fn error_message_from_body(body: &Value) -> String {
    let Some(object) = body.as_object() else {
        return UNEXPECTED_ERROR.to_string();
    };

    ["message", "descripcion"]
        .iter()
        .filter_map(|field| object.get(*field))
        .filter_map(|value| match value {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .find(|text| !text.is_empty())
        .unwrap_or_else(|| UNEXPECTED_ERROR.to_string())
}
