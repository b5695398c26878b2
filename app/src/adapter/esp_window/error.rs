use derive_more::derive::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum EspWindowError {
    #[display("Error sending request to window: {_0}")]
    Transport(reqwest_middleware::Error),

    #[display("Response status code: {status}")]
    Remote { status: u16 },

    #[display("Error parsing window response: {_0}")]
    Parse(serde_json::Error),

    #[display("Position reported by window out of range: {_0}")]
    InvalidPosition(#[error(not(source))] i64),

    #[display("Invalid window identifier: {_0:?}")]
    InvalidWindowId(#[error(not(source))] String),
}

impl EspWindowError {
    /// Short label used for logging and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            EspWindowError::Transport(_) => "transport",
            EspWindowError::Remote { .. } => "remote",
            EspWindowError::Parse(_) => "parse",
            EspWindowError::InvalidPosition(_) => "invalid_position",
            EspWindowError::InvalidWindowId(_) => "invalid_window_id",
        }
    }
}

impl From<reqwest::Error> for EspWindowError {
    fn from(e: reqwest::Error) -> Self {
        EspWindowError::Transport(e.into())
    }
}
