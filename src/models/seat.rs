use serde::{Deserialize, Serialize};

/// Координата места в сетке события. Нумерация с единицы.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeatKey {
    pub row: u32,
    pub column: u32,
}

impl SeatKey {
    pub fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    pub fn in_grid(&self, rows: u32, columns: u32) -> bool {
        (1..=rows).contains(&self.row) && (1..=columns).contains(&self.column)
    }
}

impl std::fmt::Display for SeatKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "F{} C{}", self.row, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeatStatus {
    Free,
    Sold,
    Blocked,
    Selected,
    Unknown,
}

impl SeatStatus {
    /// Классифицирует текст статуса с сервера.
    ///
    /// Регистр не важен, проверка по подстрокам в порядке приоритета:
    /// "vend"/"ocup" → Sold, "bloq"/"reserv" → Blocked, "libre" → Free.
    /// Пустой статус означает свободное место; всё остальное → Unknown.
    pub fn classify(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return SeatStatus::Free;
        }
        if normalized.contains("vend") || normalized.contains("ocup") {
            SeatStatus::Sold
        } else if normalized.contains("bloq") || normalized.contains("reserv") {
            SeatStatus::Blocked
        } else if normalized.contains("libre") {
            SeatStatus::Free
        } else {
            SeatStatus::Unknown
        }
    }

    /// Можно ли нажать на место: свободное или уже выбранное.
    pub fn is_selectable(self) -> bool {
        matches!(self, SeatStatus::Free | SeatStatus::Selected)
    }

    pub fn label(self) -> &'static str {
        match self {
            SeatStatus::Free => "Libre",
            SeatStatus::Sold => "Vendido",
            SeatStatus::Blocked => "Bloqueado",
            SeatStatus::Selected => "Seleccionado",
            SeatStatus::Unknown => "Desconocido",
        }
    }
}

/// Локальный выбор места с именем пассажира (по умолчанию пустым).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatSelection {
    pub seat: SeatKey,
    pub passenger_name: String,
}

impl SeatSelection {
    pub fn new(seat: SeatKey) -> Self {
        Self {
            seat,
            passenger_name: String::new(),
        }
    }

    pub fn with_passenger(seat: SeatKey, passenger_name: impl Into<String>) -> Self {
        Self {
            seat,
            passenger_name: passenger_name.into(),
        }
    }

    pub fn is_named(&self) -> bool {
        !self.passenger_name.trim().is_empty()
    }
}
