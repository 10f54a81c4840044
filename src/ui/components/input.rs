use crate::ui::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// City search box. Shows a placeholder while empty and a block cursor
/// while focused.
pub struct SearchInput<'a> {
    value: &'a str,
    placeholder: &'a str,
    focused: bool,
    enabled: bool,
}

impl<'a> SearchInput<'a> {
    pub fn new(value: &'a str) -> Self {
        Self {
            value,
            placeholder: "Search for cities",
            focused: false,
            enabled: true,
        }
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

impl Widget for SearchInput<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused && self.enabled {
            Theme::border_focused()
        } else {
            Theme::border()
        };

        let block = Block::default()
            .title(" Search ")
            .borders(Borders::ALL)
            .border_style(border_style);

        let inner = block.inner(area);
        block.render(area, buf);

        let line = if !self.enabled || (self.value.is_empty() && !self.focused) {
            Line::from(Span::styled(self.placeholder, Theme::dim()))
        } else if self.focused {
            Line::from(vec![
                Span::styled(self.value, Theme::normal()),
                Span::styled(" ", Theme::selected()),
            ])
        } else {
            Line::from(Span::styled(self.value, Theme::normal()))
        };

        Paragraph::new(line).render(inner, buf);
    }
}
