use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Failed to read {length} bytes at {address:#x} in layer '{layer}': {message}")]
    Read {
        layer: String,
        address: u64,
        length: usize,
        message: String,
    },

    #[error("Invalid element width: {0} (expected 1, 2, 4 or 8)")]
    InvalidWidth(usize),

    #[error("Type not found: {0}")]
    TypeNotFound(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown architecture: {0}")]
    UnknownArchitecture(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn read(
        layer: impl Into<String>,
        address: u64,
        length: usize,
        message: impl Into<String>,
    ) -> Self {
        Error::Read {
            layer: layer.into(),
            address,
            length,
            message: message.into(),
        }
    }

    /// Layer and read errors are reported to the operator; the session keeps going.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::InvalidWidth(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_message() {
        let err = Error::read("primary", 0x1000, 16, "address not mapped");
        let msg = err.to_string();
        assert!(msg.contains("primary"));
        assert!(msg.contains("0x1000"));
        assert!(msg.contains("16 bytes"));
    }

    #[test]
    fn test_invalid_width_is_not_recoverable() {
        assert!(!Error::InvalidWidth(3).is_recoverable());
        assert!(Error::LayerNotFound("memory".into()).is_recoverable());
        assert!(Error::read("memory", 0, 1, "out of range").is_recoverable());
    }
}
