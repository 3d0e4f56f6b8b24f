use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Rate limited: {message}")]
    RateLimitedError { message: String },

    #[error("No timetable returned: credentials are invalid or the service is unavailable")]
    EmptyTimetableError,

    #[error("Unsupported timetable input: expected {expected}, found {found}")]
    InputTypeError { expected: String, found: String },

    #[error("Malformed class session: {field} = '{value}' ({reason})")]
    MalformedRecordError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Calendar generation error: {message}")]
    CalendarError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Service,
    Input,
    Storage,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) => ErrorCategory::Network,
            EtlError::RateLimitedError { .. } | EtlError::EmptyTimetableError => {
                ErrorCategory::Service
            }
            EtlError::SerializationError(_)
            | EtlError::InputTypeError { .. }
            | EtlError::MalformedRecordError { .. }
            | EtlError::CalendarError { .. } => ErrorCategory::Input,
            EtlError::IoError(_) => ErrorCategory::Storage,
            EtlError::UrlError(_)
            | EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // Both are worth retrying later without changing anything.
            EtlError::RateLimitedError { .. } | EtlError::ApiError(_) => ErrorSeverity::Medium,
            EtlError::EmptyTimetableError
            | EtlError::SerializationError(_)
            | EtlError::MalformedRecordError { .. }
            | EtlError::CalendarError { .. }
            | EtlError::UrlError(_)
            | EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorSeverity::High,
            EtlError::InputTypeError { .. } | EtlError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::ApiError(_) => "Check your network connection and try again",
            EtlError::RateLimitedError { .. } => {
                "The timetable service is rate limiting requests. Try again later"
            }
            EtlError::EmptyTimetableError => {
                "Check your student ID and password, then try again"
            }
            EtlError::SerializationError(_) | EtlError::MalformedRecordError { .. } => {
                "The timetable data is not in the expected format; save it with --dump-json and inspect it"
            }
            EtlError::InputTypeError { .. } => {
                "Pass the timetable as a list of day groups, JSON text or a JSON file"
            }
            EtlError::CalendarError { .. } => "Report this problem together with the timetable JSON",
            EtlError::IoError(_) => "Check that the output directory exists and is writable",
            EtlError::UrlError(_)
            | EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => {
                "Review the command line arguments and the settings file"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::RateLimitedError { .. } => "Rate limited. Try again later.".to_string(),
            EtlError::EmptyTimetableError => {
                "Credentials are invalid, or something wrong happened. Try again.".to_string()
            }
            EtlError::ApiError(e) => format!("Could not reach the timetable service: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
