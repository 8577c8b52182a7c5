use thiserror::Error;

#[derive(Error, Debug)]
pub enum StowageError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API returned status {status}: {body}")]
    ApiStatusError { status: u16, body: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("{kind} not found: {id}")]
    NotFoundError { kind: &'static str, id: String },

    #[error("Conflict: {message}")]
    ConflictError { message: String },

    #[error("No feasible placement for '{item}': {}", .reasons.join("; "))]
    NoFeasiblePlacement { item: String, reasons: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Input,
    Placement,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// 根據錯誤嚴重程度決定退出碼
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Low => 0,      // 警告，但成功
            Self::Medium => 2,   // 可重試錯誤
            Self::High => 1,     // 處理錯誤
            Self::Critical => 3, // 系統錯誤
        }
    }
}

impl StowageError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFoundError { kind, id: id.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::ConflictError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) | Self::ApiStatusError { .. } => ErrorCategory::Network,
            Self::ConfigError { .. } => ErrorCategory::Configuration,
            Self::CsvError(_)
            | Self::InvalidValueError { .. }
            | Self::SerializationError(_)
            | Self::ValidationError { .. }
            | Self::NotFoundError { .. }
            | Self::ConflictError { .. } => ErrorCategory::Input,
            Self::NoFeasiblePlacement { .. } => ErrorCategory::Placement,
            Self::IoError(_) | Self::ZipError(_) => ErrorCategory::Io,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotFoundError { .. } | Self::ConflictError { .. } => ErrorSeverity::Low,
            Self::ApiError(_) | Self::ApiStatusError { .. } => ErrorSeverity::Medium,
            Self::NoFeasiblePlacement { .. }
            | Self::ValidationError { .. }
            | Self::InvalidValueError { .. }
            | Self::CsvError(_)
            | Self::SerializationError(_) => ErrorSeverity::High,
            Self::ConfigError { .. } | Self::IoError(_)
            | Self::ZipError(_) => ErrorSeverity::Critical,
        }
    }

    /// 依錯誤類型提供處理建議
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ApiError(_) => "Check that the stowage server is running and API_BASE_URL is correct",
            Self::ApiStatusError { status, .. } if *status >= 500 => {
                "The server failed internally; retry later or inspect the server logs"
            }
            Self::ApiStatusError { .. } => "Check the request payload against the API contract",
            Self::ConfigError { .. } => "Fix the configuration file or command-line flags",
            Self::InvalidValueError { .. } => "Correct the value so it falls in the allowed range",
            Self::CsvError(_) => "Make sure the CSV has a header row and well-formed rows",
            Self::SerializationError(_) => "Make sure the payload is valid JSON",
            Self::ValidationError { .. } => "Correct the highlighted field and try again",
            Self::NotFoundError { .. } => "List the cargo to find valid item ids",
            Self::ConflictError { .. } => "Use a different item id or omit it to auto-generate one",
            Self::NoFeasiblePlacement { .. } => {
                "Free space in a compatible zone (return plan, retrieve, delete) or relax the zone choice"
            }
            Self::IoError(_) | Self::ZipError(_) => "Check file paths and permissions",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ApiError(e) if e.is_timeout() => "The API did not respond in time".to_string(),
            Self::ApiError(e) if e.is_connect() => "Could not connect to the API".to_string(),
            Self::NoFeasiblePlacement { item, .. } => {
                format!("There is no safe place to store '{}' right now", item)
            }
            other => other.to_string(),
        }
    }

    /// 連線失敗一律可重試；逾時與 5xx 只有冪等請求 (GET/DELETE) 才重試，
    /// 伺服器可能已經處理過該 POST
    pub fn is_retryable(&self, idempotent: bool) -> bool {
        match self {
            Self::ApiError(e) if e.is_connect() => true,
            Self::ApiError(e) => idempotent && (e.is_timeout() || e.is_request()),
            Self::ApiStatusError { status, .. } => idempotent && *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, StowageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_error_lists_reasons() {
        let err = StowageError::NoFeasiblePlacement {
            item: "Oxygen Canister".to_string(),
            reasons: vec![
                "Zone A: hazardous cargo requires a hazard-rated zone".to_string(),
                "Zone C: no free slot fits 1.00 x 1.00 x 1.00 m".to_string(),
            ],
        };

        let message = err.to_string();
        assert!(message.contains("Oxygen Canister"));
        assert!(message.contains("Zone A: hazardous"));
        assert!(message.contains("; Zone C"));
        assert_eq!(err.category(), ErrorCategory::Placement);
    }

    #[test]
    fn test_retryable_statuses() {
        let server_error = StowageError::ApiStatusError {
            status: 503,
            body: String::new(),
        };
        let client_error = StowageError::ApiStatusError {
            status: 404,
            body: String::new(),
        };

        assert!(server_error.is_retryable(true));
        assert!(!server_error.is_retryable(false));
        assert!(!client_error.is_retryable(true));
        assert!(!StowageError::validation("bad").is_retryable(true));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(StowageError::config("x").severity() > StowageError::not_found("Item", "1").severity());
        assert_eq!(
            StowageError::conflict("dup").severity(),
            ErrorSeverity::Low
        );
    }
}
