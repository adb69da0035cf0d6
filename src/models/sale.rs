use chrono::NaiveDateTime;
use serde::Deserialize;

use super::seat::{SeatKey, SeatStatus};

/// Место в ответе продажи или блокировки, с итоговым статусом.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SaleSeat {
    pub fila: u32,
    pub columna: u32,
    #[serde(default)]
    pub persona: Option<String>,
    #[serde(default)]
    pub estado: Option<String>,
}

impl SaleSeat {
    pub fn key(&self) -> SeatKey {
        SeatKey::new(self.fila, self.columna)
    }

    pub fn status(&self) -> SeatStatus {
        SeatStatus::classify(self.estado.as_deref().unwrap_or_default())
    }
}

/// Ответ `POST /api/sesion/bloquear-asientos`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BlockResponse {
    pub success: Option<bool>,
    pub descripcion: Option<String>,
    pub asientos: Vec<SaleSeat>,
    pub message: Option<String>,
}

impl BlockResponse {
    pub fn is_success(&self) -> bool {
        self.success == Some(true)
    }

    pub fn reason(&self) -> Option<String> {
        first_text(&[&self.descripcion, &self.message])
    }
}

/// Итог попытки покупки. Показывается на экране результата.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SaleResult {
    pub success: Option<bool>,
    pub venta_id: Option<i64>,
    pub venta_id_catedra: Option<i64>,
    pub descripcion: Option<String>,
    pub precio_venta: Option<f64>,
    pub asientos: Vec<SaleSeat>,
    pub message: Option<String>,
}

impl SaleResult {
    /// Отказ, собранный локально из ошибки сервера или сети.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            success: Some(false),
            descripcion: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.success == Some(true)
    }

    /// `descripcion`, затем `message`.
    pub fn display_message(&self) -> Option<String> {
        first_text(&[&self.descripcion, &self.message])
    }
}

/// Запись из истории покупок (`GET /api/ventas`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: i64,
    pub evento_id: i64,
    #[serde(default)]
    pub venta_id_catedra: Option<i64>,
    #[serde(default)]
    pub fecha_venta: Option<String>,
    #[serde(default)]
    pub precio_venta: Option<f64>,
    #[serde(default)]
    pub resultado: Option<bool>,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub asientos: Vec<SaleSeat>,
    #[serde(default)]
    pub estado_sincronizacion: Option<String>,
}

impl Purchase {
    pub fn is_approved(&self) -> bool {
        self.resultado == Some(true)
    }

    /// Дата продажи. Backend отдаёт ISO-8601 с дробными секундами или без, иногда со смещением.
    pub fn sold_at(&self) -> Option<NaiveDateTime> {
        let raw = self.fecha_venta.as_deref()?.trim();
        chrono::DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.naive_utc())
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
            .ok()
    }
}

fn first_text(candidates: &[&Option<String>]) -> Option<String> {
    candidates
        .iter()
        .filter_map(|value| value.as_deref())
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_string)
}
