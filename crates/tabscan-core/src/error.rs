use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The source argument is neither a path nor a non-empty list of paths.
    #[error("invalid source kind: {0}")]
    InvalidSourceKind(String),

    #[error("column index {index} out of range for schema of length {len}")]
    ColumnIndexOutOfRange { index: usize, len: usize },

    #[error("unknown column '{column}'. Available columns: {available:?}")]
    UnknownColumnReference {
        column: String,
        available: Vec<String>,
    },

    #[error("malformed placeholder at byte {position}: {reason}")]
    MalformedPlaceholder { position: usize, reason: String },

    #[error("unsupported expression token '{token}' at byte {position}")]
    UnsupportedExpressionToken { token: String, position: usize },

    #[error("expression syntax error at byte {position}: {message}")]
    ExpressionSyntax { position: usize, message: String },

    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// The engine rejected the source/options combination without touching the source.
    #[error("unsupported scan options: {0}")]
    UnsupportedScanOptions(String),

    /// Failure reported by the execution engine; the message is the engine's own.
    #[error("engine execution error: {0}")]
    EngineExecution(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Error with context chain for better debugging
    #[error("Error in {context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    /// Add context to an error, creating an error chain.
    ///
    /// # Example
    /// ```rust,no_run
    /// use tabscan_core::error::Error;
    /// let err = Error::EngineExecution("no such file".into());
    /// let err = err.with_context("while reading scan source");
    /// ```
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::Context {
            context: context.into(),
            source: Box::new(self) as Box<dyn std::error::Error + Send + Sync>,
        }
    }

    /// Re-tag an error surfaced by `ScanEngine::execute` as `EngineExecution`.
    ///
    /// Engine errors pass through untouched; anything else keeps its message.
    pub fn into_engine_error(self) -> Self {
        match self {
            Error::EngineExecution(_) => self,
            other => Error::EngineExecution(other.to_string()),
        }
    }

    pub fn is_engine_error(&self) -> bool {
        matches!(self, Error::EngineExecution(_))
    }

    /// Get suggestions for common errors (e.g., column name suggestions).
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Error::UnknownColumnReference { column, available } => {
                let mut out = vec!["Check that the column name is spelled correctly".into()];
                if let Some(close) = available
                    .iter()
                    .find(|a| a.eq_ignore_ascii_case(column))
                {
                    out.push(format!("Did you mean '{close}'?"));
                }
                out
            }
            Error::ColumnIndexOutOfRange { len, .. } => {
                vec![format!("Column positions are zero-based; valid range is 0..{len}")]
            }
            Error::MalformedPlaceholder { .. } => {
                vec!["Placeholders look like {column_name} using letters, digits and '_'".into()]
            }
            Error::UnsupportedExpressionToken { .. } => {
                vec![
                    "Reference columns only through {placeholders}".into(),
                    "Use operators or one of the supported functions".into(),
                ]
            }
            Error::UnsupportedScanOptions(msg) => {
                if msg.contains("format") {
                    vec!["Pass an explicit format hint (csv, jsonl, parquet)".into()]
                } else {
                    vec![]
                }
            }
            _ => vec![],
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}
