use std::time::Duration;

pub mod codec;
pub mod command;
pub mod resource;
pub mod response;

#[cfg(test)]
pub mod fake;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtoError {
    #[error("I/O error: {:?}", _0)]
    Io(#[from] std::io::Error),

    #[error("Serial I/O error: {:?}", _0)]
    Serial(#[from] tokio_serial::Error),

    #[error("No response within {:?}", _0)]
    Timeout(Duration),
    #[error("Malformed response: {:?}", _0)]
    Malformed(String),
    #[error("Invalid command: {:?}", _0)]
    InvalidCommand(String),
    #[error("Invalid resource: {}", _0)]
    InvalidResource(String),
    #[error("Connection was closed")]
    Abort,
}

impl ProtoError {
    /// Errors after which the connection is still usable for the next exchange.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Malformed(_))
    }
}

pub type Result<T> = std::result::Result<T, ProtoError>;
