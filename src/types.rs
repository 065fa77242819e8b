//! Core types for staged messages

use serde::{Deserialize, Serialize};
use std::fmt;

/// Header data of a single message, as supplied by the caller
///
/// Every text field holds raw header text and may contain line breaks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageRecord {
    /// Unique message id, used as the file name
    pub id: i64,

    /// From header
    pub from_addr: String,

    /// Subject header
    pub subject: String,

    /// Message-ID header
    pub message_id: String,

    /// Received header
    pub received: String,

    /// Date header
    pub date: String,

    /// MIME-Version header
    pub mime_version: String,

    /// Content-Type header
    pub content_type: String,

    /// Content-Transfer-Encoding header
    pub content_transfer_encoding: String,
}

/// A record together with the recipient text and body that travel with it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub record: MessageRecord,
    pub to: String,
    pub body: String,
}

/// Best-effort From/To values produced by the normalizer
///
/// Each field holds one of: a bare address, a comma-joined list of bare
/// addresses, the caller's text untouched, or an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedAddresses {
    pub from: String,
    pub to: String,
}

/// A mailbox accepted by the strict address grammar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    /// Display name (e.g., "John Doe"), if one was given
    pub name: Option<String>,

    /// Bare address (e.g., "john@example.com")
    pub address: String,
}

impl Mailbox {
    /// Local part (before the last @)
    #[must_use]
    pub fn local_part(&self) -> &str {
        self.address
            .rsplit_once('@')
            .map_or(self.address.as_str(), |(local, _)| local)
    }

    /// Domain (after the last @)
    #[must_use]
    pub fn domain(&self) -> &str {
        self.address
            .rsplit_once('@')
            .map_or("", |(_, domain)| domain)
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <{}>", name, self.address),
            None => write!(f, "{}", self.address),
        }
    }
}
