//! Domain error types.

/// Top-level error type for tradeflow.
#[derive(Debug, thiserror::Error)]
pub enum TradeflowError {
    #[error("invalid panel ({axis}): {reason}")]
    InvalidPanel { axis: String, reason: String },

    #[error("invalid trade: {reason}")]
    InvalidTrade { reason: String },

    #[error("invalid signal: {reason}")]
    InvalidSignal { reason: String },

    #[error("trade has not been executed")]
    NotExecuted,

    #[error("strategy yielded no trades")]
    NoTrades,

    #[error("unknown bar: {0}")]
    UnknownBar(String),

    #[error("unknown asset: {0}")]
    UnknownAsset(String),

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TradeflowError> for std::process::ExitCode {
    fn from(err: &TradeflowError) -> Self {
        let code: u8 = match err {
            TradeflowError::Io(_) => 1,
            TradeflowError::ConfigParse { .. }
            | TradeflowError::ConfigMissing { .. }
            | TradeflowError::ConfigInvalid { .. } => 2,
            TradeflowError::Data { .. } | TradeflowError::InvalidPanel { .. } => 3,
            TradeflowError::InvalidTrade { .. }
            | TradeflowError::UnknownBar(_)
            | TradeflowError::UnknownAsset(_) => 4,
            TradeflowError::NoTrades => 5,
            TradeflowError::NotExecuted | TradeflowError::InvalidSignal { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
