pub mod forecast;
pub mod location;

pub use forecast::*;
pub use location::*;
