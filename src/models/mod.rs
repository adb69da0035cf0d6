pub mod user;
pub mod event;
pub mod seat;
pub mod session;
pub mod sale;

pub use user::{AuthResponse, Credentials, LoginRequest, RegisterRequest};
pub use event::{EventDetail, EventSummary};
pub use seat::{SeatKey, SeatSelection, SeatStatus};
pub use session::{SeatChoice, SeatSelectionRequest, Session, SessionSeat, Step};
pub use sale::{BlockResponse, Purchase, SaleResult, SaleSeat};
