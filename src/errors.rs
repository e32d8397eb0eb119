use axum::http::StatusCode;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("cellSize must be greater than zero")]
    CellSize,

    #[error("threshold must be a finite number greater than zero, got {0}")]
    Threshold(f64),

    #[error("intensity must be between 10 and 100, got {0}")]
    Intensity(u32),

    #[error("canvas sides must be between 1 and 16384, got {width}x{height}")]
    Canvas { width: u32, height: u32 },

    #[error("grid of {rows}x{cols} cells is too large, raise cellSize or shrink the canvas")]
    Grid { rows: u64, cols: u64 },

    #[error("move sample rate must be within [0, 1], got {0}")]
    SampleRate(f64),

    #[error("heartbeat interval must be at least one second")]
    Heartbeat,

    #[error("invalid value {value:?} for {key}")]
    Env { key: &'static str, value: String },
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(err)
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
