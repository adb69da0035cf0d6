use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EventType {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Performer {
    pub nombre: Option<String>,
    pub apellido: Option<String>,
    pub identificacion: Option<String>,
}

/// Снимок события с сервера. Локально не изменяется.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventSummary {
    pub id: i64,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(default, rename = "resumen")]
    pub summary: Option<String>,
    #[serde(default, rename = "descripcion")]
    pub description: Option<String>,
    #[serde(default, rename = "fecha")]
    pub date: Option<String>,
    #[serde(default, rename = "direccion")]
    pub address: Option<String>,
    #[serde(default, rename = "imagen")]
    pub image: Option<String>,
    #[serde(default, rename = "filaAsientos")]
    pub rows: Option<u32>,
    // старые версии backend присылают "columnAsientos"
    #[serde(default, rename = "columnaAsientos", alias = "columnAsientos")]
    pub columns: Option<u32>,
    #[serde(default, rename = "precioEntrada")]
    pub ticket_price: Option<f64>,
    #[serde(default, rename = "eventoTipo")]
    pub event_type: Option<EventType>,
    #[serde(default, rename = "integrantes")]
    pub performers: Vec<Performer>,
    #[serde(default, rename = "activo")]
    pub active: Option<bool>,
}

impl EventSummary {
    /// Размер сетки (rows, columns); отсутствующее измерение считается нулём.
    pub fn grid(&self) -> (u32, u32) {
        (self.rows.unwrap_or(0), self.columns.unwrap_or(0))
    }

    pub fn seat_count(&self) -> u32 {
        let (rows, columns) = self.grid();
        rows.saturating_mul(columns)
    }
}

/// Ответ `GET /api/eventos/{id}`: событие и сырой payload мест в любом из трёх форматов.
#[derive(Debug, Clone, Deserialize)]
pub struct EventDetail {
    #[serde(rename = "evento")]
    pub event: EventSummary,
    #[serde(default, rename = "asientos")]
    pub seats: Option<Value>,
}
