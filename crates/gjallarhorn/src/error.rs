use thiserror::Error;

/// Error kinds that can occur while encoding or decoding wire structs.
#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error while encoding or decoding")]
    Io(#[from] std::io::Error),
    #[error("invalid discriminant {value} for `{type_name}`")]
    InvalidDiscriminant { type_name: &'static str, value: u8 },
    #[error("bad magic header {found:?}, expected {expected:?}")]
    BadMagic { expected: [u8; 4], found: [u8; 4] },
    #[error("unsupported protocol version {found}, expected {expected}")]
    BadVersion { expected: u8, found: u8 },
    #[error("payload of {len} bytes exceeds the maximum of {max}")]
    PayloadTooLarge { len: usize, max: usize },
}

/// Result type that returns a gjallarhorn [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
