//! RFC 2047 encoded-word decoding for header values
//!
//! Decoding is all-or-nothing: if any encoded word in the value cannot be
//! decoded, [`decode`] hands the value back exactly as it came in.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use encoding_rs::Encoding;
use thiserror::Error;
use tracing::debug;

/// Some agents drop the trailing `=` padding, so accept either form.
const B_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Why a header value could not be decoded
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown charset {0:?}")]
    UnknownCharset(String),

    #[error("truncated encoded-word")]
    Truncated,

    #[error("unknown transfer encoding {0:?}")]
    UnknownEncoding(char),

    #[error("invalid base64 payload")]
    InvalidBase64,

    #[error("invalid Q-encoded payload")]
    InvalidQ,

    #[error("payload is not valid {0}")]
    Malformed(&'static str),
}

/// Decode every encoded word in `text`, or return `text` unchanged if that
/// fails.
#[must_use]
pub fn decode(text: &str) -> String {
    match try_decode(text) {
        Ok(decoded) => decoded,
        Err(e) => {
            debug!("Leaving header undecoded ({e}): {text:?}");
            text.to_string()
        }
    }
}

/// Decode every encoded word in `text`, reporting the first failure.
pub fn try_decode(text: &str) -> Result<String, DecodeError> {
    let Some(first) = text.find("=?") else {
        return Ok(text.to_string());
    };

    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..first]);
    let mut rest = &text[first..];
    let mut after_word = false;

    while let Some(start) = rest.find("=?") {
        let word = EncodedWord::parse(&rest[start + 2..])?;

        // whitespace between two adjacent encoded words is dropped
        let gap = &rest[..start];
        if !after_word || !gap.trim().is_empty() {
            out.push_str(gap);
        }
        out.push_str(&word.decode()?);

        rest = &rest[start + 2 + word.len..];
        after_word = true;
    }

    out.push_str(rest);
    Ok(out)
}

/// Resolve a charset label. `windows-NNNN` is looked up as `cpNNNN` first.
fn lookup_charset(label: &str) -> Option<&'static Encoding> {
    let label = label.trim().to_ascii_lowercase();
    // RFC 2231 language suffix: utf-8*en
    let label = label.split('*').next().unwrap_or_default();

    let remapped = label
        .strip_prefix("windows-")
        .map(|page| format!("cp{page}"));
    remapped
        .and_then(|cp| Encoding::for_label_no_replacement(cp.as_bytes()))
        .or_else(|| Encoding::for_label_no_replacement(label.as_bytes()))
}

struct EncodedWord<'a> {
    charset: &'a str,
    encoding: char,
    payload: &'a str,
    /// Bytes consumed after the opening `=?`, closing `?=` included
    len: usize,
}

impl<'a> EncodedWord<'a> {
    /// Parse `charset?enc?payload?=`, the opening `=?` already stripped.
    fn parse(s: &'a str) -> Result<Self, DecodeError> {
        let (charset, rest) = s.split_once('?').ok_or(DecodeError::Truncated)?;

        let mut chars = rest.chars();
        let encoding = chars.next().ok_or(DecodeError::Truncated)?;
        if chars.next() != Some('?') {
            return Err(DecodeError::Truncated);
        }

        let payload_start = charset.len() + 1 + encoding.len_utf8() + 1;
        let tail = &s[payload_start..];
        let end = tail.find("?=").ok_or(DecodeError::Truncated)?;

        Ok(Self {
            charset,
            encoding,
            payload: &tail[..end],
            len: payload_start + end + 2,
        })
    }

    fn decode(&self) -> Result<String, DecodeError> {
        let bytes = match self.encoding {
            'B' | 'b' => B_ENGINE
                .decode(self.payload)
                .map_err(|_| DecodeError::InvalidBase64)?,
            'Q' | 'q' => decode_q(self.payload)?,
            other => return Err(DecodeError::UnknownEncoding(other)),
        };

        let encoding = lookup_charset(self.charset)
            .ok_or_else(|| DecodeError::UnknownCharset(self.charset.to_string()))?;
        encoding
            .decode_without_bom_handling_and_without_replacement(&bytes)
            .map(std::borrow::Cow::into_owned)
            .ok_or(DecodeError::Malformed(encoding.name()))
    }
}

/// Q encoding: `_` is a space, `=XX` is a hex-encoded byte. Other bytes must
/// be printable ASCII or CR, LF, tab.
fn decode_q(payload: &str) -> Result<Vec<u8>, DecodeError> {
    let bytes = payload.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'_' => {
                out.push(b' ');
                i += 1;
            }
            b'=' => {
                let hi = bytes.get(i + 1).copied().and_then(hex_value);
                let lo = bytes.get(i + 2).copied().and_then(hex_value);
                let (Some(hi), Some(lo)) = (hi, lo) else {
                    return Err(DecodeError::InvalidQ);
                };
                out.push((hi << 4) | lo);
                i += 3;
            }
            b @ (b' '..=b'~' | b'\r' | b'\n' | b'\t') => {
                out.push(b);
                i += 1;
            }
            _ => return Err(DecodeError::InvalidQ),
        }
    }

    Ok(out)
}

fn hex_value(b: u8) -> Option<u8> {
    char::from(b)
        .to_digit(16)
        .and_then(|v| u8::try_from(v).ok())
}
