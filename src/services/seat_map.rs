//! Нормализация статусов мест.
//!
//! Backend отдаёт места в одном из трёх форматов, без поля-дискриминатора:
//! 1.  Массив записей `{fila, columna, estado}`; `estado` бывает строкой или
//!     вложенным объектом со своим полем `estado`.
//! 2.  Объект с ключами `"fila:R:columna:C"` и статусом в значении.
//! 3.  Объект-обёртка, где под ключом `asientos` лежит массив из формата 1.
//!
//! Результат всегда один: `SeatKey → SeatStatus` только для мест внутри сетки.
//! Некорректные и выходящие за сетку координаты молча отбрасываются.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::models::{EventDetail, SeatKey, SeatSelection, SeatStatus};

pub type SeatStatusMap = BTreeMap<SeatKey, SeatStatus>;

const WRAPPER_KEYS: [&str; 2] = ["asientos", "seats"];
const ROW_FIELDS: [&str; 2] = ["fila", "row"];
const COLUMN_FIELDS: [&str; 2] = ["columna", "column"];
const STATUS_FIELDS: [&str; 2] = ["estado", "status"];

const KEY_ROW_PREFIX: &str = "fila:";
const KEY_COLUMN_SEPARATOR: &str = ":columna:";

/// Распознанная форма payload.
enum SeatPayload<'a> {
    Records(&'a [Value]),
    Keyed(&'a Map<String, Value>),
    Empty,
}

impl<'a> SeatPayload<'a> {
    fn detect(payload: &'a Value) -> Self {
        match payload {
            Value::Array(records) => SeatPayload::Records(records.as_slice()),
            Value::Object(map) => WRAPPER_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_array))
                .map(|records| SeatPayload::Records(records.as_slice()))
                .unwrap_or(SeatPayload::Keyed(map)),
            _ => SeatPayload::Empty,
        }
    }
}

/// Строит карту статусов для сетки `rows × columns` из сырого payload.
pub fn normalize_seat_statuses(payload: Option<&Value>, rows: u32, columns: u32) -> SeatStatusMap {
    let mut statuses = SeatStatusMap::new();
    let Some(payload) = payload else {
        return statuses;
    };

    match SeatPayload::detect(payload) {
        SeatPayload::Records(records) => {
            for record in records {
                let Some(fields) = record.as_object() else {
                    continue;
                };
                let row = first_field(fields, &ROW_FIELDS).and_then(parse_positive);
                let column = first_field(fields, &COLUMN_FIELDS).and_then(parse_positive);
                let (Some(row), Some(column)) = (row, column) else {
                    continue;
                };
                let seat = SeatKey::new(row, column);
                if seat.in_grid(rows, columns) {
                    statuses.insert(seat, SeatStatus::classify(&status_text(first_field(fields, &STATUS_FIELDS))));
                }
            }
        }
        SeatPayload::Keyed(map) => {
            for (key, value) in map {
                let Some(seat) = parse_seat_key(key) else {
                    continue;
                };
                if seat.in_grid(rows, columns) {
                    statuses.insert(seat, SeatStatus::classify(&status_text(Some(value))));
                }
            }
        }
        SeatPayload::Empty => {}
    }

    statuses
}

fn first_field<'a>(fields: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| fields.get(*name))
}

/// Положительное целое из числа или строки с числом.
fn parse_positive(value: &Value) -> Option<u32> {
    let parsed = match value {
        Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text.trim().parse::<u32>().ok(),
        _ => None,
    };
    parsed.filter(|n| *n > 0)
}

/// Разбирает ключ вида `fila:R:columna:C`. Префикс перед `fila:` допускается.
fn parse_seat_key(key: &str) -> Option<SeatKey> {
    let start = key.find(KEY_ROW_PREFIX)? + KEY_ROW_PREFIX.len();
    let (row, column) = key[start..].split_once(KEY_COLUMN_SEPARATOR)?;
    if row.is_empty() || !row.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if column.is_empty() || !column.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let row = row.parse::<u32>().ok().filter(|n| *n > 0)?;
    let column = column.parse::<u32>().ok().filter(|n| *n > 0)?;
    Some(SeatKey::new(row, column))
}

/// Текст статуса. Пустая строка означает "статус не указан".
fn status_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Object(fields)) => status_text(first_field(fields, &STATUS_FIELDS)),
        Some(other) => other.to_string(),
    }
}

/// Клетка сетки с итоговым статусом для отрисовки.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatCell {
    pub seat: SeatKey,
    pub status: SeatStatus,
}

/// Карта мест события: размер сетки плюс последние статусы с сервера.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeatMap {
    rows: u32,
    columns: u32,
    statuses: SeatStatusMap,
}

impl SeatMap {
    pub fn new(rows: u32, columns: u32, statuses: SeatStatusMap) -> Self {
        Self { rows, columns, statuses }
    }

    pub fn from_detail(detail: &EventDetail) -> Self {
        let (rows, columns) = detail.event.grid();
        Self::new(rows, columns, normalize_seat_statuses(detail.seats.as_ref(), rows, columns))
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.columns == 0
    }

    pub fn contains(&self, seat: SeatKey) -> bool {
        seat.in_grid(self.rows, self.columns)
    }

    pub fn statuses(&self) -> &SeatStatusMap {
        &self.statuses
    }

    /// Статус по данным сервера; места без записи свободны.
    pub fn server_status(&self, seat: SeatKey) -> SeatStatus {
        self.statuses.get(&seat).copied().unwrap_or(SeatStatus::Free)
    }

    /// Локальный выбор всегда перекрывает статус сервера.
    pub fn effective_status(&self, seat: SeatKey, selected: &[SeatSelection]) -> SeatStatus {
        if selected.iter().any(|selection| selection.seat == seat) {
            SeatStatus::Selected
        } else {
            self.server_status(seat)
        }
    }

    /// Все клетки сетки по строкам: 1..=rows × 1..=columns.
    pub fn cells(&self, selected: &[SeatSelection]) -> Vec<SeatCell> {
        (1..=self.rows)
            .flat_map(|row| (1..=self.columns).map(move |column| SeatKey::new(row, column)))
            .map(|seat| SeatCell {
                seat,
                status: self.effective_status(seat, selected),
            })
            .collect()
    }
}
