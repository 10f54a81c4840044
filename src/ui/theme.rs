use crate::config::Units;
use ratatui::style::{Color, Modifier, Style};

pub struct Theme;

impl Theme {
    // Base colors
    pub const FG: Color = Color::White;
    pub const DIM: Color = Color::DarkGray;
    pub const ACCENT: Color = Color::Cyan;

    // Status colors
    pub const SUCCESS: Color = Color::Green;
    pub const WARNING: Color = Color::Yellow;
    pub const ERROR: Color = Color::Red;

    // Temperature colors
    pub const TEMP_COLD: Color = Color::LightBlue;
    pub const TEMP_COOL: Color = Color::Cyan;
    pub const TEMP_WARM: Color = Color::Yellow;
    pub const TEMP_HOT: Color = Color::Red;

    pub const RAIN: Color = Color::Blue;

    // Styles
    pub fn title() -> Style {
        Style::default()
            .fg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn header() -> Style {
        Style::default().fg(Self::FG).add_modifier(Modifier::BOLD)
    }

    pub fn normal() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn dim() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn selected() -> Style {
        Style::default()
            .bg(Color::DarkGray)
            .fg(Self::FG)
            .add_modifier(Modifier::BOLD)
    }

    pub fn warning() -> Style {
        Style::default().fg(Self::WARNING)
    }

    pub fn error() -> Style {
        Style::default().fg(Self::ERROR)
    }

    pub fn success() -> Style {
        Style::default().fg(Self::SUCCESS)
    }

    /// Color bands in Celsius; Fahrenheit readings are converted first.
    pub fn temp_color(temp: f64, units: Units) -> Color {
        let celsius = match units {
            Units::Metric => temp,
            Units::Imperial => (temp - 32.0) * 5.0 / 9.0,
        };
        if celsius < 5.0 {
            Self::TEMP_COLD
        } else if celsius < 15.0 {
            Self::TEMP_COOL
        } else if celsius < 27.0 {
            Self::TEMP_WARM
        } else {
            Self::TEMP_HOT
        }
    }

    pub fn temp_style(temp: Option<f64>, units: Units) -> Style {
        match temp {
            Some(t) => Style::default().fg(Self::temp_color(t, units)),
            None => Self::dim(),
        }
    }

    pub fn rain_style(percent: u8) -> Style {
        if percent >= 50 {
            Style::default().fg(Self::RAIN).add_modifier(Modifier::BOLD)
        } else {
            Self::normal()
        }
    }

    pub fn nav_key() -> Style {
        Style::default()
            .fg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn nav_label() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn border() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn border_focused() -> Style {
        Style::default().fg(Self::ACCENT)
    }
}
