use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unknown container signature: {0:02X?}")]
    UnknownSignature([u8; 4]),

    #[error("Unknown genre code: {0}")]
    UnknownGenre(u32),

    #[error("Read of {len} bytes at offset {offset} exceeds buffer length {size}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        size: usize,
    },

    #[error("Invalid chart header: {0}")]
    InvalidHeader(String),

    #[error("Unknown text encoding: {0}")]
    UnknownEncoding(String),

    #[error("Config parse error: {0}")]
    ConfigParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::ConfigParse(e.message().to_string())
    }
}
