//! Raw message ingestion

use crate::error::{Result, StageError};
use crate::types::{MessageRecord, RawMessage};
use mailparse::MailHeader;
use tracing::debug;

/// Split raw RFC 5322 bytes into a record, its To text and its body.
///
/// Header values are kept raw (encoded words are not decoded here) and
/// flattened onto a single line. Missing headers become empty strings.
pub fn parse_message(id: i64, raw: &[u8]) -> Result<RawMessage> {
    let (headers, body_start) =
        mailparse::parse_headers(raw).map_err(|e| StageError::Structure(e.to_string()))?;

    let record = MessageRecord {
        id,
        from_addr: header_value(&headers, "from"),
        subject: header_value(&headers, "subject"),
        message_id: header_value(&headers, "message-id"),
        received: header_value(&headers, "received"),
        date: header_value(&headers, "date"),
        mime_version: header_value(&headers, "mime-version"),
        content_type: header_value(&headers, "content-type"),
        content_transfer_encoding: header_value(&headers, "content-transfer-encoding"),
    };
    let to = header_value(&headers, "to");
    let body = String::from_utf8_lossy(raw.get(body_start..).unwrap_or_default()).into_owned();

    debug!("Parsed message {id} from {}", record.from_addr);

    Ok(RawMessage { record, to, body })
}

fn header_value(headers: &[MailHeader], name: &str) -> String {
    headers
        .iter()
        .find(|h| h.get_key().eq_ignore_ascii_case(name))
        .map(|h| unfold(&String::from_utf8_lossy(h.get_value_raw())))
        .unwrap_or_default()
}

/// Join folded continuation lines.
fn unfold(value: &str) -> String {
    value.replace("\r\n", "").replace('\n', "").trim().to_string()
}
