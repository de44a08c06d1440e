use thiserror::Error;

/// Error type for adaptive steganography operations
#[derive(Debug, Error)]
pub enum SteganographyError {
    /// Unusable input image or text (zero dimension, non-RGB, oversized payload)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Framed payload does not fit the image's bit-depth plan
    #[error("Insufficient capacity: need {required} bits, only {available} available")]
    CapacityExceeded { required: usize, available: usize },

    /// Declared length inconsistent with the available bits, or payload is not UTF-8
    #[error("Corrupted payload header: {0}")]
    CorruptedPayloadHeader(String),

    /// Trailing frame marker absent
    #[error("Payload delimiter mismatch: expected 0xff, found {found:#04x}")]
    DelimiterMismatch { found: u8 },

    /// The image most likely never carried a payload
    #[error("No payload found: {0}")]
    NoPayloadFound(String),

    /// Configuration values out of range
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for steganography operations
pub type Result<T> = std::result::Result<T, SteganographyError>;
