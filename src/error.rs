use thiserror::Error;

/// Top-level error carried back to `main`, which turns it into a process exit code.
///
/// Exit codes:
/// - `2`: usage, configuration, or local I/O problems
/// - `3`: data that could not be parsed
/// - `4`: fetch/runtime failures
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Date and CSV parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unsupported date format '{input}' (expected YYYY-MM-DD or MMM-YYYY)")]
    UnsupportedDateFormat { input: String },

    #[error("Unknown month abbreviation '{token}' in '{input}'")]
    UnknownMonth { input: String, token: String },

    #[error("Invalid calendar date '{input}'")]
    InvalidDate { input: String },

    #[error("CSV input is empty (no header line)")]
    EmptyInput,

    #[error("Missing required column: `{0}`")]
    MissingColumn(String),

    #[error("Line {line}: expected {expected} columns, found {found}")]
    MalformedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: {source}")]
    InvalidRowDate {
        line: usize,
        #[source]
        source: Box<ParseError>,
    },

    #[error("CSV read error: {0}")]
    Csv(String),
}

impl From<ParseError> for AppError {
    fn from(err: ParseError) -> Self {
        AppError::new(3, err.to_string())
    }
}
