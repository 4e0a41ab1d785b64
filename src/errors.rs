use std::net::Ipv4Addr;
use std::string::FromUtf8Error;

/// All error types that can occur when discovering or controlling Wiz lights.
///
/// Per-attempt timeouts are deliberately not represented here: the fan-out
/// controller models them as a distinct attempt outcome so that only
/// timeouts are ever retried. Every `Error` value is terminal for the
/// target (or run) that produced it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to serialize data to JSON.
    #[error("failed to dump json: {0:?}")]
    JsonDump(serde_json::Error),

    /// Failed to deserialize JSON data.
    #[error("failed to load json: {0:?}")]
    JsonLoad(serde_json::Error),

    /// A network socket operation failed while communicating with a bulb.
    #[error("socket {action} error: {err:?}")]
    Socket { action: String, err: std::io::Error },

    /// The UDP response from a bulb contained invalid UTF-8.
    #[error("utf8 decoding error: {0:?}")]
    Utf8Decode(FromUtf8Error),

    /// The bulb answered but reported the command was not applied.
    #[error("bulb at {ip} rejected the command")]
    Rejected { ip: Ipv4Addr },

    /// The network scan for bulbs could not complete.
    #[error("discovery {action} error: {err:?}")]
    Discovery { action: String, err: std::io::Error },

    /// Attempted to send a [`crate::Payload`] with no attributes set.
    #[error("invalid payload; no attributes set")]
    NoAttribute,

    /// Failed to parse a [`crate::Color`] from a string.
    #[error("invalid color string: {0}")]
    InvalidColorString(String),

    /// Malformed operation parameters supplied by the caller.
    #[error("invalid request: {0}")]
    Input(String),
}

impl Error {
    /// Create a new socket error
    pub fn socket(action: &str, err: std::io::Error) -> Self {
        Error::Socket {
            action: action.to_string(),
            err,
        }
    }

    /// Create a new discovery error
    pub fn discovery(action: &str, err: std::io::Error) -> Self {
        Error::Discovery {
            action: action.to_string(),
            err,
        }
    }

    /// Create a new input error
    pub fn input(reason: impl Into<String>) -> Self {
        Error::Input(reason.into())
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
