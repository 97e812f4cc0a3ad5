use thiserror::Error;

/// Typed failures raised by the chart library.
///
/// Pipeline code wraps these in `anyhow::Error` with context; callers that
/// need to branch on the kind can downcast.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("invalid timestamp '{value}' (expected YYYY-MM-DD HH:MM:SS±ZZZZ)")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("unknown resolution '{0}' (expected hour, day or month)")]
    UnknownResolution(String),

    #[error("unknown layout '{0}' (expected stacked or grouped)")]
    UnknownLayout(String),

    #[error("unknown palette '{0}' (expected viridis or category10)")]
    UnknownPalette(String),

    #[error("invalid UTC offset '{0}' (expected ±HHMM)")]
    InvalidOffset(String),

    #[error("calendar arithmetic overflowed at {0}")]
    CalendarOverflow(String),

    #[error("gesture script is empty")]
    EmptyScript,
}
