use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Not found: {message}")]
    NotFoundError { message: String },

    #[error("Transport error: {0}")]
    TransportError(#[from] reqwest::Error),

    #[error("Store returned {status} for {url}")]
    StoreStatusError { status: u16, url: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Lookup,
    Transport,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LookupError {
    pub fn invalid_identifier() -> Self {
        Self::ValidationError {
            message: "invalid identifier".to_string(),
        }
    }

    pub fn record_not_found() -> Self {
        Self::NotFoundError {
            message: "no record for identifier".to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ValidationError { .. } => ErrorCategory::Input,
            Self::NotFoundError { .. } => ErrorCategory::Lookup,
            Self::TransportError(_) | Self::StoreStatusError { .. } => ErrorCategory::Transport,
            Self::SerializationError(_) | Self::CsvError(_) => ErrorCategory::Data,
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Lookup => ErrorSeverity::Low,
            ErrorCategory::Transport => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// True for the kinds that abort a query and are shown to the user.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Input | ErrorCategory::Lookup | ErrorCategory::Transport
        )
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ValidationError { message } | Self::NotFoundError { message } => message.clone(),
            Self::TransportError(_) | Self::StoreStatusError { .. } => {
                "could not reach the record store".to_string()
            }
            Self::SerializationError(_) | Self::CsvError(_) => {
                "the record store returned data that could not be read".to_string()
            }
            Self::ConfigError { message } => format!("configuration problem: {}", message),
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("configuration value for {} is invalid: {}", field, reason)
            }
            Self::MissingConfigError { field } => format!("missing configuration: {}", field),
            Self::IoError(e) => format!("file access failed: {}", e),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Enter a service number made of digits only",
            ErrorCategory::Lookup => "Check the service number and try again",
            ErrorCategory::Transport => "Check the store URL and network connectivity, then retry",
            ErrorCategory::Data => "Verify the documents in the store match the expected layout",
            ErrorCategory::Configuration => "Review the configuration file and command-line flags",
            ErrorCategory::System => "Check file paths and permissions",
        }
    }
}

pub type Result<T> = std::result::Result<T, LookupError>;
