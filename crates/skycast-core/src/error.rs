//! Error hierarchy shared by the SkyCast crates.
//!
//! Each layer keeps its own detailed error; these are the coarse categories
//! a front end shows to the user. `user_message()` never leaks upstream text.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherApiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Storage(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Weather(e) => e.user_message(),
            AppError::Io(_) => "Could not access local files.",
        }
    }
}

/// Transport-level failures talking to the weather service.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Could not reach the weather service: {0}")]
    Unreachable(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::Unreachable(_) => "Weather service unreachable. Are you offline?",
            NetworkError::Timeout => "The weather service took too long to answer.",
            NetworkError::Http { status, .. } if *status >= 500 => {
                "Weather service temporarily unavailable."
            }
            NetworkError::Http { .. } => "The weather service rejected the request.",
            NetworkError::Malformed(_) => "The weather service sent data we could not read.",
        }
    }
}

/// Local persisted-state errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Stored data is malformed: {0}")]
    Corrupt(String),
}

impl StorageError {
    pub fn user_message(&self) -> &'static str {
        match self {
            StorageError::Unavailable(_) => "Local storage is unavailable. Changes won't be kept.",
            StorageError::WriteFailed(_) => "Failed to save your changes locally.",
            StorageError::Corrupt(_) => "Saved data was unreadable. Defaults were restored.",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more settings failed validation; the message lists them
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// A request built from settings or user input was rejected before sending
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Settings are invalid. Check your config file.",
            ConfigError::BadRequest(_) => "Enter a location to look up.",
        }
    }
}

/// Failures reported by the weather service itself.
#[derive(Debug, Error)]
pub enum WeatherApiError {
    #[error("Unknown location: {0}")]
    UnknownLocation(String),

    #[error("API key rejected")]
    BadCredential,

    #[error("API quota exhausted")]
    QuotaExhausted,

    #[error("Service unavailable")]
    Unavailable,

    #[error("Request rejected: {0}")]
    Rejected(String),
}

impl WeatherApiError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherApiError::UnknownLocation(_) => "Location not found. Check the name.",
            WeatherApiError::BadCredential => "Weather API key is invalid. Check settings.",
            WeatherApiError::QuotaExhausted => "Request limit exceeded. Try again later.",
            WeatherApiError::Unavailable => "Weather service temporarily unavailable.",
            WeatherApiError::Rejected(_) => "The weather service rejected the request.",
        }
    }
}

/// Coarse classification of `reqwest` transport errors.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            return NetworkError::Timeout;
        }
        if self.is_decode() {
            return NetworkError::Malformed(self.to_string());
        }
        match self.status() {
            Some(status) => NetworkError::Http {
                status: status.as_u16(),
                message: self.to_string(),
            },
            None => NetworkError::Unreachable(self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_error_lifts_into_app_error() {
        let app: AppError = WeatherApiError::BadCredential.into();
        assert!(matches!(app, AppError::Weather(WeatherApiError::BadCredential)));
        assert_eq!(app.user_message(), "Weather API key is invalid. Check settings.");
    }

    #[test]
    fn test_http_message_depends_on_status() {
        let outage = NetworkError::Http { status: 503, message: "down".into() };
        let rejected = NetworkError::Http { status: 400, message: "bad".into() };
        assert_eq!(outage.user_message(), WeatherApiError::Unavailable.user_message());
        assert_ne!(outage.user_message(), rejected.user_message());
    }

    #[test]
    fn test_user_messages_hide_details() {
        let err = AppError::Weather(WeatherApiError::UnknownLocation("Atlantis".into()));
        assert!(err.to_string().contains("Atlantis"));
        assert!(!err.user_message().contains("Atlantis"));
    }

    #[test]
    fn test_storage_messages_are_non_empty() {
        for err in [
            StorageError::Unavailable("x".into()),
            StorageError::WriteFailed("x".into()),
            StorageError::Corrupt("x".into()),
        ] {
            assert!(!err.user_message().is_empty());
        }
    }
}
