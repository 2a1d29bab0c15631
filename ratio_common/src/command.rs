//! Control datagrams sent from the graph to the feed.
//!
//! Every command is a small JSON object sent over UDP from the socket the
//! subscriber receives batches on, so the feed uses the datagram source
//! address as the stream target and as the keep-alive key.
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::RatioError;

/// Transport kind (currently UDP).
pub const CONNECTION: &str = "udp";

/// Command kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, EnumString, Eq, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Header {
    /// Start streaming quote batches to the sender.
    Subscribe,
    /// Keep an existing subscription alive.
    Ping,
    /// Stop streaming to the sender.
    Unsubscribe,
}

/// Command payload sent from a subscriber to the feed.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Command {
    /// Command kind.
    pub header: Header,
    /// Transport protocol name (e.g., `udp`).
    pub connection: String,
}

impl Command {
    fn with_header(header: Header) -> Self {
        Command {
            header,
            connection: String::from(CONNECTION),
        }
    }

    /// Creates a new subscription command.
    pub fn subscribe() -> Self {
        Self::with_header(Header::Subscribe)
    }

    /// Creates a new keep-alive command.
    pub fn ping() -> Self {
        Self::with_header(Header::Ping)
    }

    /// Creates a command that ends the subscription.
    pub fn unsubscribe() -> Self {
        Self::with_header(Header::Unsubscribe)
    }

    /// Encode the command to JSON bytes.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, RatioError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a command from a received datagram.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, RatioError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
