use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for '{field}': '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid {entity}: {field}: {reason}")]
    EntityValidationError {
        entity: String,
        field: String,
        reason: String,
    },

    #[error("Store operation failed: {message}")]
    StoreError { message: String },
}

/// 錯誤分類，用於日誌與報表聚合
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    Validation,
    Store,
    Io,
}

/// 錯誤嚴重程度，決定 CLI 的退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MarketError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MarketError::ConfigValidationError { .. }
            | MarketError::InvalidConfigValueError { .. }
            | MarketError::MissingConfigError { .. } => ErrorCategory::Config,
            MarketError::EntityValidationError { .. } => ErrorCategory::Validation,
            MarketError::StoreError { .. } => ErrorCategory::Store,
            MarketError::IoError(_) | MarketError::SerializationError(_) => ErrorCategory::Io,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            MarketError::EntityValidationError { .. } => ErrorSeverity::Low,
            MarketError::IoError(_) | MarketError::SerializationError(_) => ErrorSeverity::Medium,
            MarketError::StoreError { .. } => ErrorSeverity::High,
            MarketError::ConfigValidationError { .. }
            | MarketError::InvalidConfigValueError { .. }
            | MarketError::MissingConfigError { .. } => ErrorSeverity::Critical,
        }
    }

    /// 配置錯誤無法透過重試解決，必須修正輸入
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MarketError::IoError(_) | MarketError::StoreError { .. }
        )
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            MarketError::IoError(_) => {
                "Check that the file exists and the process has permission to read it".to_string()
            }
            MarketError::SerializationError(_) => {
                "Check that the snapshot or candidate file is valid JSON".to_string()
            }
            MarketError::ConfigValidationError { field, .. } => {
                format!("Review the '{}' section of the threshold file", field)
            }
            MarketError::InvalidConfigValueError { field, .. } => {
                format!("Correct the value of '{}' and run again", field)
            }
            MarketError::MissingConfigError { field } => {
                format!("Provide '{}' via a flag or the threshold file", field)
            }
            MarketError::EntityValidationError { entity, field, .. } => {
                format!("Fix the '{}' field of the {} and resubmit", field, entity)
            }
            MarketError::StoreError { .. } => {
                "Retry the operation; if it persists, inspect the market store".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MarketError::IoError(e) => format!("Could not read or write a file: {}", e),
            MarketError::SerializationError(_) => {
                "A data file could not be parsed as JSON".to_string()
            }
            MarketError::ConfigValidationError { field, message } => {
                format!("The threshold configuration is invalid ({}: {})", field, message)
            }
            MarketError::InvalidConfigValueError { field, value, .. } => {
                format!("'{}' is not a valid setting for {}", value, field)
            }
            MarketError::MissingConfigError { field } => {
                format!("The required setting '{}' was not provided", field)
            }
            MarketError::EntityValidationError { entity, reason, .. } => {
                format!("The submitted {} is invalid: {}", entity, reason)
            }
            MarketError::StoreError { message } => {
                format!("The market store rejected the operation: {}", message)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, MarketError>;
