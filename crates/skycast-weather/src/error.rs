//! Weather client errors.

use serde::Deserialize;
use skycast_core::{AppError, ConfigError, NetworkError, ReqwestErrorExt, WeatherApiError};

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("API quota exceeded")]
    QuotaExceeded,

    #[error("API error {status}: {message}")]
    Api {
        status: u16,
        code: Option<i32>,
        message: String,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Error envelope sent by WeatherAPI on non-2xx responses
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    code: i32,
    message: String,
}

impl WeatherError {
    /// Split transport failures into timeouts and everything else.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err)
        }
    }

    /// Classify a non-success response from its status and body.
    pub fn from_api_response(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<ApiErrorBody>(body).ok().map(|b| b.error);
        let code = detail.as_ref().map(|d| d.code);
        let message = detail
            .map(|d| d.message)
            .unwrap_or_else(|| format!("HTTP {}", status));

        match code {
            Some(1006) => Self::LocationNotFound(message),
            Some(1002) | Some(2006) | Some(2008) => Self::InvalidApiKey,
            Some(2007) => Self::QuotaExceeded,
            _ if status == 401 || status == 403 => Self::InvalidApiKey,
            _ => Self::Api {
                status,
                code,
                message,
            },
        }
    }

    /// Short message suitable for display
    pub fn user_message(&self) -> &'static str {
        self.category().user_message()
    }

    /// Application-level category without the upstream details
    fn category(&self) -> AppError {
        match self {
            Self::Network(e) if e.is_timeout() => NetworkError::Timeout.into(),
            Self::Network(_) => NetworkError::Unreachable(String::new()).into(),
            Self::Timeout => NetworkError::Timeout.into(),
            Self::Parse(_) => NetworkError::Malformed(String::new()).into(),
            Self::InvalidRequest(_) => ConfigError::BadRequest(String::new()).into(),
            Self::LocationNotFound(_) => WeatherApiError::UnknownLocation(String::new()).into(),
            Self::InvalidApiKey => WeatherApiError::BadCredential.into(),
            Self::QuotaExceeded => WeatherApiError::QuotaExhausted.into(),
            Self::Api { status, .. } if *status >= 500 => WeatherApiError::Unavailable.into(),
            Self::Api { .. } => WeatherApiError::Rejected(String::new()).into(),
        }
    }
}

impl From<WeatherError> for AppError {
    fn from(err: WeatherError) -> Self {
        match err {
            WeatherError::Network(e) => AppError::Network(e.into_network_error()),
            WeatherError::Timeout => NetworkError::Timeout.into(),
            WeatherError::LocationNotFound(m) => WeatherApiError::UnknownLocation(m).into(),
            WeatherError::InvalidApiKey => WeatherApiError::BadCredential.into(),
            WeatherError::QuotaExceeded => WeatherApiError::QuotaExhausted.into(),
            WeatherError::Api { status, .. } if status >= 500 => WeatherApiError::Unavailable.into(),
            WeatherError::Api { message, .. } => WeatherApiError::Rejected(message).into(),
            WeatherError::Parse(m) => NetworkError::Malformed(m).into(),
            WeatherError::InvalidRequest(m) => ConfigError::BadRequest(m).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_location_not_found_code() {
        let body = r#"{"error":{"code":1006,"message":"No matching location found."}}"#;
        let err = WeatherError::from_api_response(400, body);
        assert!(matches!(err, WeatherError::LocationNotFound(ref m) if m.contains("No matching")));
    }

    #[test]
    fn test_invalid_key_codes() {
        let body = r#"{"error":{"code":2006,"message":"API key provided is invalid"}}"#;
        assert!(matches!(WeatherError::from_api_response(401, body), WeatherError::InvalidApiKey));
        assert!(matches!(WeatherError::from_api_response(403, ""), WeatherError::InvalidApiKey));
    }

    #[test]
    fn test_quota_code() {
        let body = r#"{"error":{"code":2007,"message":"API key has exceeded calls per month quota."}}"#;
        assert!(matches!(WeatherError::from_api_response(403, body), WeatherError::QuotaExceeded));
    }

    #[test]
    fn test_unstructured_body_falls_back_to_status() {
        let err = WeatherError::from_api_response(502, "<html>Bad Gateway</html>");
        match &err {
            WeatherError::Api { status, code, message } => {
                assert_eq!(*status, 502);
                assert_eq!(*code, None);
                assert_eq!(message, "HTTP 502");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.user_message(), "Weather service temporarily unavailable.");
    }

    #[test]
    fn test_app_error_mapping() {
        let app: AppError = WeatherError::InvalidApiKey.into();
        assert!(matches!(app, AppError::Weather(WeatherApiError::BadCredential)));
        assert_eq!(app.user_message(), WeatherError::InvalidApiKey.user_message());
    }
}
