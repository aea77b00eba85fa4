use thiserror::Error;

#[derive(Error, Debug)]
pub enum FarmError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

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

    #[error("Invalid {kind} record {id}: {reason}")]
    RecordValidationError {
        kind: String,
        id: String,
        reason: String,
    },

    #[error("Unsupported record file format: {path}")]
    UnsupportedFormatError { path: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Data,
    Configuration,
    Validation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FarmError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FarmError::ZipError(_) | FarmError::IoError(_) => ErrorCategory::Io,
            FarmError::CsvError(_)
            | FarmError::SerializationError(_)
            | FarmError::UnsupportedFormatError { .. } => ErrorCategory::Data,
            FarmError::ConfigError { .. }
            | FarmError::ConfigValidationError { .. }
            | FarmError::InvalidConfigValueError { .. }
            | FarmError::MissingConfigError { .. } => ErrorCategory::Configuration,
            FarmError::RecordValidationError { .. } => ErrorCategory::Validation,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    /// 給使用者的修復建議
    pub fn recovery_suggestion(&self) -> String {
        match self {
            FarmError::IoError(_) => {
                "Check that the input files exist and the output directory is writable".to_string()
            }
            FarmError::ZipError(_) => "Retry without --zip or free up disk space".to_string(),
            FarmError::CsvError(_) => {
                "Make sure the CSV header uses camelCase field names (e.g. workType, durationMinutes)"
                    .to_string()
            }
            FarmError::SerializationError(_) => {
                "Make sure the JSON file contains an array of records".to_string()
            }
            FarmError::UnsupportedFormatError { .. } => {
                "Use a .json or .csv record file".to_string()
            }
            FarmError::ConfigError { .. } | FarmError::ConfigValidationError { .. } => {
                "Check the configuration file syntax".to_string()
            }
            FarmError::InvalidConfigValueError { field, .. } => {
                format!("Fix the value of '{}'", field)
            }
            FarmError::MissingConfigError { field } => format!("Provide a value for '{}'", field),
            FarmError::RecordValidationError { .. } => {
                "Fix the record or run without --strict to skip invalid records".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Io => format!("File access failed: {}", self),
            ErrorCategory::Data => format!("Could not read record data: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Validation => format!("Invalid input: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, FarmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let err = FarmError::MissingConfigError {
            field: "output_path".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.recovery_suggestion().contains("output_path"));

        let err = FarmError::RecordValidationError {
            kind: "sales".to_string(),
            id: "7".to_string(),
            reason: "crop is empty".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert!(err.user_friendly_message().starts_with("Invalid input"));
    }

    #[test]
    fn test_io_error_is_critical() {
        let err: FarmError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }
}
