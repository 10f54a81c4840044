use crate::config::Units;
use crate::models::HourlyPoint;
use crate::ui::{icons, Theme};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// One column of the hourly strip: time, glyph, temperature.
pub struct HourlyCell<'a> {
    point: Option<&'a HourlyPoint>,
    units: Units,
}

impl<'a> HourlyCell<'a> {
    pub fn new(point: Option<&'a HourlyPoint>, units: Units) -> Self {
        Self { point, units }
    }
}

impl Widget for HourlyCell<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let lines = match self.point {
            Some(point) => vec![
                Line::from(Span::styled(point.label.clone(), Theme::dim())),
                Line::from(icons::glyph(point.icon_code.as_deref())),
                Line::from(Span::styled(
                    format_degrees(point.temperature),
                    Theme::temp_style(point.temperature, self.units),
                )),
            ],
            None => vec![
                Line::from(Span::styled("--", Theme::dim())),
                Line::from(""),
                Line::from(Span::styled("--°", Theme::dim())),
            ],
        };

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}

/// "21°" for a reading, "--°" without one
pub fn format_degrees(temperature: Option<f64>) -> String {
    match temperature {
        Some(t) => format!("{:.0}°", t),
        None => "--°".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degrees_are_rounded() {
        assert_eq!(format_degrees(Some(21.4)), "21°");
        assert_eq!(format_degrees(Some(-0.6)), "-1°");
        assert_eq!(format_degrees(None), "--°");
    }

    #[test]
    fn cell_renders_label_and_temperature() {
        let point = HourlyPoint {
            label: "03 PM".into(),
            temperature: Some(18.2),
            icon_code: Some("01d".into()),
        };
        let area = Rect::new(0, 0, 8, 3);
        let mut buf = Buffer::empty(area);
        HourlyCell::new(Some(&point), Units::Metric).render(area, &mut buf);

        let row = |y: u16| -> String {
            (0..area.width)
                .map(|x| buf[(x, y)].symbol().to_string())
                .collect()
        };
        assert!(row(0).contains("03 PM"));
        assert!(row(2).contains("18°"));
    }
}
