pub mod flow;
pub mod seat_map;
pub mod selection;
