use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    /// No top-level window matched the configured title pattern.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A dialog never reached the visible + enabled state inside its budget.
    #[error("Dialog '{title}' not ready after {waited_ms}ms")]
    DialogTimeout { title: String, waited_ms: u64 },

    /// Tab state could not be confirmed after a move. Callers normally only log this.
    #[error("Navigation desync: expected {expected}, detected {detected}")]
    NavigationDesync { expected: String, detected: String },

    #[error("OCR extraction failed: {0}")]
    OcrExtractionFailure(String),

    #[error("Balance not clear, destructive action withheld: {0}")]
    NonZeroBalanceAbort(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Platform-specific error: {0}")]
    PlatformError(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid payload: {0}")]
    Payload(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AutomationError {
    /// Balance aborts are shown to the user by the operation that raised them, so callers
    /// should not notify again.
    pub fn already_notified(&self) -> bool {
        matches!(self, AutomationError::NonZeroBalanceAbort(_))
    }
}
