use crate::app::{StatusKind, StatusMessage};
use crate::config::Units;
use crate::logic::normalize::MAX_HOURLY_POINTS;
use crate::models::{DailySummary, WeatherSnapshot};
use crate::ui::components::{format_degrees, HourlyCell, SearchInput};
use crate::ui::{icons, Theme};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Widget},
};

pub struct DashboardScreen<'a> {
    pub snapshot: Option<&'a WeatherSnapshot>,
    pub units: Units,
    pub search_value: &'a str,
    pub search_focused: bool,
    pub loading: bool,
    pub status_message: Option<&'a StatusMessage>,
}

impl<'a> DashboardScreen<'a> {
    pub fn new(snapshot: Option<&'a WeatherSnapshot>, units: Units) -> Self {
        Self {
            snapshot,
            units,
            search_value: "",
            search_focused: false,
            loading: false,
            status_message: None,
        }
    }

    pub fn with_search(mut self, value: &'a str, focused: bool, loading: bool) -> Self {
        self.search_value = value;
        self.search_focused = focused;
        self.loading = loading;
        self
    }

    pub fn with_status(mut self, status: Option<&'a StatusMessage>) -> Self {
        self.status_message = status;
        self
    }
}

impl Widget for DashboardScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Search
                Constraint::Length(6), // Current conditions
                Constraint::Length(5), // Hourly strip
                Constraint::Min(9),    // Daily list
                Constraint::Length(1), // Status message
                Constraint::Length(1), // Nav bar
            ])
            .split(area);

        self.render_search(chunks[0], buf);
        self.render_current(chunks[1], buf);
        self.render_hourly(chunks[2], buf);
        self.render_daily(chunks[3], buf);
        self.render_status_message(chunks[4], buf);
        self.render_nav(chunks[5], buf);
    }
}

impl DashboardScreen<'_> {
    fn render_search(&self, area: Rect, buf: &mut Buffer) {
        let placeholder = if self.loading {
            "Fetching..."
        } else {
            "Search for cities"
        };

        SearchInput::new(self.search_value)
            .placeholder(placeholder)
            .focused(self.search_focused)
            .enabled(!self.loading)
            .render(area, buf);
    }

    fn render_current(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" NOW ")
            .title_style(Theme::title())
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let inner = block.inner(area);
        block.render(area, buf);

        let Some(snapshot) = self.snapshot else {
            Paragraph::new(Line::from(Span::styled(
                "No weather loaded yet",
                Theme::dim(),
            )))
            .render(inner, buf);
            return;
        };

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(20), Constraint::Length(12)])
            .split(inner);

        let temperature = format!(
            "{}{}",
            format_degrees(snapshot.current_temperature).trim_end_matches('°'),
            self.units.temperature_suffix()
        );

        let high_low = match snapshot.today() {
            Some(day) if day.has_temperature() => Span::styled(
                format!(
                    "  H {}  L {}",
                    format_degrees(Some(day.temperature_max)),
                    format_degrees(Some(day.temperature_min))
                ),
                Theme::dim(),
            ),
            _ => Span::raw(""),
        };

        let lines = vec![
            Line::from(Span::styled(snapshot.city_name.clone(), Theme::header())),
            Line::from(Span::styled(
                format!("Chance of rain: {}%", snapshot.rain_chance_percent),
                Theme::rain_style(snapshot.rain_chance_percent),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled(
                    temperature,
                    Theme::temp_style(snapshot.current_temperature, self.units)
                        .add_modifier(Modifier::BOLD),
                ),
                high_low,
            ]),
        ];
        Paragraph::new(lines).render(cols[0], buf);

        Paragraph::new(vec![
            Line::from(""),
            Line::from(icons::glyph(snapshot.current_icon_code.as_deref())),
        ])
        .alignment(Alignment::Center)
        .render(cols[1], buf);
    }

    fn render_hourly(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" TODAY ")
            .title_style(Theme::title())
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let inner = block.inner(area);
        block.render(area, buf);

        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![
                Constraint::Ratio(1, MAX_HOURLY_POINTS as u32);
                MAX_HOURLY_POINTS
            ])
            .split(inner);

        let hourly = self.snapshot.map(|s| s.hourly.as_slice()).unwrap_or(&[]);
        for (i, cell) in cells.iter().enumerate() {
            HourlyCell::new(hourly.get(i), self.units).render(*cell, buf);
        }
    }

    fn render_daily(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" 7-DAY FORECAST ")
            .title_style(Theme::title())
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let daily = self.snapshot.map(|s| s.daily.as_slice()).unwrap_or(&[]);

        let items: Vec<ListItem> = if daily.is_empty() {
            vec![ListItem::new(Line::from(Span::styled(
                "No forecast",
                Theme::dim(),
            )))]
        } else {
            daily.iter().map(|day| self.day_row(day)).collect()
        };

        List::new(items).block(block).render(area, buf);
    }

    fn day_row(&self, day: &DailySummary) -> ListItem<'static> {
        let temps = if day.has_temperature() {
            Span::styled(
                format!("{:.0}/{:.0}°", day.temperature_max, day.temperature_min),
                Theme::temp_style(Some(day.temperature_max), self.units),
            )
        } else {
            Span::styled("--/--°", Theme::dim())
        };

        ListItem::new(Line::from(vec![
            Span::styled(format!("{:<7}", day.label), Theme::normal()),
            temps,
            Span::raw("    "),
            Span::raw(icons::glyph(day.icon_code.as_deref())),
        ]))
    }

    fn render_status_message(&self, area: Rect, buf: &mut Buffer) {
        if let Some(msg) = self.status_message {
            let style = match msg.kind {
                StatusKind::Info => Theme::dim(),
                StatusKind::Success => Theme::success(),
                StatusKind::Warning => Theme::warning(),
                StatusKind::Error => Theme::error(),
            };
            Paragraph::new(Line::from(Span::styled(format!(" {}", msg.text), style)))
                .render(area, buf);
        }
    }

    fn render_nav(&self, area: Rect, buf: &mut Buffer) {
        let nav = Line::from(vec![
            Span::styled(" [/]", Theme::nav_key()),
            Span::styled("Search ", Theme::nav_label()),
            Span::styled("[Enter]", Theme::nav_key()),
            Span::styled("Go ", Theme::nav_label()),
            Span::styled("[Esc]", Theme::nav_key()),
            Span::styled("Cancel ", Theme::nav_label()),
            Span::styled("[r]", Theme::nav_key()),
            Span::styled("Refresh ", Theme::nav_label()),
            Span::styled("[q]", Theme::nav_key()),
            Span::styled("Quit", Theme::nav_label()),
        ]);

        Paragraph::new(nav).render(area, buf);
    }
}
