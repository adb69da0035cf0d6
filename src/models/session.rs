use serde::{Deserialize, Serialize};

use super::seat::{SeatKey, SeatSelection};

/// Шаг покупки, который сервер хранит в сессии (`paso`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    EventList,
    EventDetail,
    SeatSelection,
    PassengerData,
    Sale,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::EventList,
        Step::EventDetail,
        Step::SeatSelection,
        Step::PassengerData,
        Step::Sale,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Step::EventList => "LISTADO_EVENTOS",
            Step::EventDetail => "DETALLE_EVENTO",
            Step::SeatSelection => "SELECCION_ASIENTOS",
            Step::PassengerData => "CARGA_DATOS",
            Step::Sale => "VENTA",
        }
    }

    /// Разбор с учётом регистра; отсутствующий или неизвестный шаг → `EventList`.
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(|value| Step::ALL.into_iter().find(|step| step.as_str() == value))
            .unwrap_or(Step::EventList)
    }

    /// Шаги, на которые нельзя вернуться без выбранного события.
    pub fn needs_event(self) -> bool {
        !matches!(self, Step::EventList)
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Место, которое сервер помнит в сессии пользователя.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSeat {
    // backend хранит координаты как nullable Integer
    #[serde(default)]
    pub fila: Option<i64>,
    #[serde(default)]
    pub columna: Option<i64>,
    #[serde(default)]
    pub persona: Option<String>,
    #[serde(default)]
    pub bloqueado_en_catedra: Option<bool>,
}

/// Состояние сессии на сервере. Используется один раз, при входе, чтобы вернуть пользователя на его шаг.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Session {
    pub session_id: Option<String>,
    pub username: Option<String>,
    pub evento_id: Option<i64>,
    pub paso: Option<String>,
    pub asientos_seleccionados: Vec<SessionSeat>,
}

impl Session {
    pub fn step(&self) -> Step {
        Step::parse(self.paso.as_deref())
    }

    /// Выбор мест из сессии; отсутствующее имя пассажира становится пустой строкой.
    /// Места без координат или с неположительными координатами отбрасываются.
    pub fn selections(&self) -> Vec<SeatSelection> {
        self.asientos_seleccionados
            .iter()
            .filter_map(|seat| {
                let key = SeatKey::new(positive(seat.fila)?, positive(seat.columna)?);
                Some(SeatSelection::with_passenger(key, seat.persona.clone().unwrap_or_default()))
            })
            .collect()
    }
}

fn positive(value: Option<i64>) -> Option<u32> {
    value.and_then(|n| u32::try_from(n).ok()).filter(|n| *n > 0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeatChoice {
    pub fila: u32,
    pub columna: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
}

/// Тело `POST /api/sesion/seleccionar-asientos`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatSelectionRequest {
    pub evento_id: i64,
    pub asientos: Vec<SeatChoice>,
}

impl SeatSelectionRequest {
    /// Пустые имена пассажиров не отправляются.
    pub fn from_selections(event_id: i64, selections: &[SeatSelection]) -> Self {
        Self {
            evento_id: event_id,
            asientos: selections
                .iter()
                .map(|selection| SeatChoice {
                    fila: selection.seat.row,
                    columna: selection.seat.column,
                    persona: selection
                        .is_named()
                        .then(|| selection.passenger_name.trim().to_string()),
                })
                .collect(),
        }
    }
}
