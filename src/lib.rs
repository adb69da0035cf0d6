//! Клиентское ядро покупки билетов на события.
//!
//! Ядро держит состояние экранного потока (вход, список событий, карта мест,
//! данные пассажиров, подтверждение, результат) и разговаривает с backend
//! через REST API с Basic-аутентификацией. Отрисовка остаётся снаружи.

pub mod api_client;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use api_client::ApiClient;
pub use config::Config;
pub use error::{ClientError, SelectionError};
pub use services::flow::{FlowController, Screen};
pub use services::seat_map::{normalize_seat_statuses, SeatCell, SeatMap};
pub use services::selection::{SeatSelectionSet, MAX_SEATS};
