use crate::config::Units;
use crate::error::WeatherlyError;
use crate::logic::{FetchMessage, FetchRequest};
use crate::models::WeatherSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
}

#[derive(Debug, Default)]
pub struct SearchState {
    pub editing: bool,
    pub buffer: String,
}

impl SearchState {
    pub fn start_editing(&mut self) {
        self.editing = true;
    }

    pub fn cancel_editing(&mut self) {
        self.editing = false;
    }

    /// Trimmed query, or `None` when the box holds only whitespace.
    pub fn submit(&mut self) -> Option<String> {
        let query = self.buffer.trim().to_string();
        if query.is_empty() {
            return None;
        }
        self.editing = false;
        Some(query)
    }
}

pub struct App {
    pub should_quit: bool,
    pub units: Units,
    pub search: SearchState,

    // Data
    pub snapshot: Option<WeatherSnapshot>,
    pub last_query: Option<String>,

    // UI state
    pub loading: bool,
    pub status_message: Option<StatusMessage>,
    pub pending_query: Option<String>,
}

impl App {
    pub fn new(units: Units) -> Self {
        Self {
            should_quit: false,
            units,
            search: SearchState::default(),
            snapshot: None,
            last_query: None,
            loading: false,
            status_message: None,
            pending_query: None,
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn set_status(&mut self, text: &str, kind: StatusKind) {
        self.status_message = Some(StatusMessage {
            text: text.to_string(),
            kind,
        });
    }

    pub fn request_fetch(&mut self, query: String) {
        self.pending_query = Some(query);
    }

    pub fn request_refresh(&mut self) {
        if let Some(query) = self.last_query.clone() {
            self.request_fetch(query);
        }
    }

    pub fn submit_search(&mut self) {
        if let Some(query) = self.search.submit() {
            self.request_fetch(query);
        }
    }

    /// Record how the orchestrator answered a request. A busy answer is
    /// dropped without telling the user.
    pub fn on_request(&mut self, query: &str, outcome: FetchRequest) {
        match outcome {
            FetchRequest::Started => {
                self.loading = true;
                self.set_status(&format!("Loading weather for {}...", query), StatusKind::Info);
            }
            FetchRequest::Busy => {
                tracing::debug!("Ignoring '{}': fetch already in progress", query);
            }
        }
    }

    /// Apply a finished fetch. Failures keep whatever snapshot is shown.
    pub fn apply(&mut self, message: FetchMessage) {
        let FetchMessage::Completed { query, result } = message;
        self.loading = false;
        match result {
            Ok(snapshot) => {
                self.set_status(&format!("Updated {}", snapshot.city_name), StatusKind::Success);
                self.snapshot = Some(snapshot);
                self.last_query = Some(query);
            }
            Err(e) => self.show_error(&e),
        }
    }

    pub fn show_error(&mut self, error: &WeatherlyError) {
        let kind = if error.is_recoverable() {
            StatusKind::Warning
        } else {
            StatusKind::Error
        };
        self.set_status(&format!("Weather error: {}", error), kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(city: &str) -> WeatherSnapshot {
        WeatherSnapshot {
            city_name: city.to_string(),
            current_date: chrono::NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            current_temperature: Some(20.0),
            rain_chance_percent: 10,
            current_icon_code: Some("01d".into()),
            hourly: Vec::new(),
            daily: Vec::new(),
        }
    }

    fn completed(query: &str, result: crate::error::Result<WeatherSnapshot>) -> FetchMessage {
        FetchMessage::Completed {
            query: query.to_string(),
            result,
        }
    }

    #[test]
    fn blank_search_is_ignored() {
        let mut app = App::new(Units::Metric);
        app.search.start_editing();
        app.search.buffer = "   ".into();
        app.submit_search();
        assert!(app.pending_query.is_none());
        assert!(app.search.editing);
    }

    #[test]
    fn search_submits_trimmed_query() {
        let mut app = App::new(Units::Metric);
        app.search.start_editing();
        app.search.buffer = "  New York ".into();
        app.submit_search();
        assert_eq!(app.pending_query.as_deref(), Some("New York"));
        assert!(!app.search.editing);
    }

    #[test]
    fn started_request_sets_loading() {
        let mut app = App::new(Units::Metric);
        app.on_request("Oslo", FetchRequest::Started);
        assert!(app.loading);
        assert_eq!(app.status_message.unwrap().kind, StatusKind::Info);
    }

    #[test]
    fn busy_request_changes_nothing() {
        let mut app = App::new(Units::Metric);
        app.on_request("Oslo", FetchRequest::Started);
        let before = app.status_message.clone();
        app.on_request("Paris", FetchRequest::Busy);
        assert!(app.loading);
        assert_eq!(app.status_message, before);
    }

    #[test]
    fn success_replaces_snapshot() {
        let mut app = App::new(Units::Metric);
        app.on_request("oslo", FetchRequest::Started);
        app.apply(completed("oslo", Ok(snapshot("Oslo"))));

        assert!(!app.loading);
        assert_eq!(app.snapshot.as_ref().unwrap().city_name, "Oslo");
        assert_eq!(app.last_query.as_deref(), Some("oslo"));
        assert_eq!(app.status_message.unwrap().kind, StatusKind::Success);
    }

    #[test]
    fn failure_keeps_previous_snapshot() {
        let mut app = App::new(Units::Metric);
        app.apply(completed("Oslo", Ok(snapshot("Oslo"))));
        app.apply(completed(
            "Atlantis",
            Err(WeatherlyError::CityNotFound("Atlantis".into())),
        ));

        assert_eq!(app.snapshot.as_ref().unwrap().city_name, "Oslo");
        assert_eq!(app.last_query.as_deref(), Some("Oslo"));
        let status = app.status_message.unwrap();
        assert_eq!(status.kind, StatusKind::Warning);
        assert!(status.text.contains("Atlantis"));
    }

    #[test]
    fn refresh_reuses_last_query() {
        let mut app = App::new(Units::Metric);
        app.request_refresh();
        assert!(app.pending_query.is_none());

        app.apply(completed("Oslo", Ok(snapshot("Oslo"))));
        app.request_refresh();
        assert_eq!(app.pending_query.as_deref(), Some("Oslo"));
    }

    #[test]
    fn unrecoverable_errors_use_error_status() {
        let mut app = App::new(Units::Metric);
        app.show_error(&WeatherlyError::Config("bad endpoint".into()));
        assert_eq!(app.status_message.unwrap().kind, StatusKind::Error);
    }
}
