pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The CSP was constructed with an invalid shape, e.g. duplicate
    /// variable names. Fatal to the call.
    #[error("invalid CSP configuration: {0}")]
    Config(String),

    /// A record could not be understood as puzzle input. Fatal to the call;
    /// unrecognized clue sentences are NOT input errors (they become
    /// non-binding constraints).
    #[error("invalid puzzle input: {0}")]
    Input(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Error::Input(msg.into())
    }
}
