use crate::error::SelectionError;
use crate::models::{SeatKey, SeatSelection};

/// Больше четырёх мест за одну покупку выбрать нельзя.
pub const MAX_SEATS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
}

/// Текущий выбор мест пользователя. Не больше `MAX_SEATS`, без повторов.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeatSelectionSet {
    seats: Vec<SeatSelection>,
}

impl SeatSelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Восстанавливает выбор из сессии сервера.
    /// Повторы и места сверх лимита отбрасываются, чтобы инварианты держались и для чужих данных.
    pub fn restore(selections: impl IntoIterator<Item = SeatSelection>) -> Self {
        let mut restored = Self::new();
        for selection in selections {
            if restored.seats.len() == MAX_SEATS {
                break;
            }
            if !restored.contains(selection.seat) {
                restored.seats.push(selection);
            }
        }
        restored
    }

    pub fn toggle(&mut self, seat: SeatKey) -> Result<Toggle, SelectionError> {
        if let Some(index) = self.position(seat) {
            self.seats.remove(index);
            return Ok(Toggle::Removed);
        }
        if self.seats.len() >= MAX_SEATS {
            return Err(SelectionError::MaxSeatsReached);
        }
        self.seats.push(SeatSelection::new(seat));
        Ok(Toggle::Added)
    }

    /// Пустое имя допустимо, проверка будет перед отправкой.
    pub fn update_passenger_name(&mut self, index: usize, name: &str) -> Result<(), SelectionError> {
        let selection = self
            .seats
            .get_mut(index)
            .ok_or(SelectionError::NoSuchPassenger(index))?;
        selection.passenger_name = name.to_string();
        Ok(())
    }

    /// Проверка перед отправкой выбранных мест: нужен хотя бы один.
    pub fn validate_seat_choice(&self) -> Result<(), SelectionError> {
        if self.seats.is_empty() {
            return Err(SelectionError::EmptySelection);
        }
        Ok(())
    }

    /// Полная проверка перед подтверждением: места выбраны и у всех пассажиров есть имя.
    pub fn validate_for_submission(&self) -> Result<(), SelectionError> {
        self.validate_seat_choice()?;
        if self.seats.iter().any(|selection| !selection.is_named()) {
            return Err(SelectionError::UnnamedPassenger);
        }
        Ok(())
    }

    pub fn contains(&self, seat: SeatKey) -> bool {
        self.position(seat).is_some()
    }

    fn position(&self, seat: SeatKey) -> Option<usize> {
        self.seats.iter().position(|selection| selection.seat == seat)
    }

    pub fn as_slice(&self) -> &[SeatSelection] {
        &self.seats
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn clear(&mut self) {
        self.seats.clear();
    }
}
