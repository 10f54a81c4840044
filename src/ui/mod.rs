pub mod components;
pub mod icons;
pub mod screens;
pub mod theme;

pub use theme::Theme;
