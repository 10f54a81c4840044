pub mod hourly;
pub mod input;

pub use hourly::{format_degrees, HourlyCell};
pub use input::SearchInput;
