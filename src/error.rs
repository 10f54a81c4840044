use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherlyError {
    #[error("Missing API key: set WEATHERLY_API_KEY (or API_KEY) or run `weatherly init`")]
    MissingCredential,

    #[error("City not found: {0}")]
    CityNotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Forecast contained no samples")]
    EmptyForecast,

    #[error("A fetch is already in progress")]
    Busy,

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Fetch task failed: {0}")]
    TaskFailed(String),
}

impl WeatherlyError {
    /// Errors the user can recover from by issuing a new request.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            WeatherlyError::MissingCredential | WeatherlyError::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, WeatherlyError>;
