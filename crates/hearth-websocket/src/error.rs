use thiserror::Error;

/// errors raised while reading or writing websocket frames, or by the
/// `json` feature's serialization helpers.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("client frame was not masked")]
    UnmaskedClientFrame,

    #[error("unsupported frame opcode {0:#x}")]
    UnsupportedOpcode(u8),

    #[error("text frame was not valid utf-8")]
    InvalidUtf8,

    #[error("missing or invalid Sec-WebSocket-Key header")]
    MissingKey,

    #[cfg(feature = "json")]
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// this crate's result type
pub type Result<T> = std::result::Result<T, Error>;
