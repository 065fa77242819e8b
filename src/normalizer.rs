//! Best-effort recovery of bare addresses from malformed From/To headers
//!
//! Every path ends in one of: the extracted address(es), the caller's text
//! untouched, or an empty string. Parse failures are logged where they are
//! absorbed and never reach the caller.

use crate::grammar::{AddrError, parse_address, parse_address_list};
use crate::types::{Mailbox, NormalizedAddresses};
use tracing::{error, warn};

/// Normalize a From/To header pair.
///
/// To is only resolved once From has been; if From cannot be recovered both
/// values come back exactly as passed in.
#[must_use]
pub fn normalize_addresses(from: &str, to: &str) -> NormalizedAddresses {
    match resolve_single(&prepare_from(from), Header::From) {
        Some(from) => NormalizedAddresses {
            from,
            to: normalize_to(to),
        },
        None => NormalizedAddresses {
            from: from.to_string(),
            to: to.to_string(),
        },
    }
}

/// Resolve a From header to a single bare address.
#[must_use]
pub fn normalize_from(raw: &str) -> String {
    let from = prepare_from(raw);
    resolve_single(&from, Header::From).unwrap_or_else(|| raw.to_string())
}

/// Resolve a To header to a bare address or a comma-joined list of them.
#[must_use]
pub fn normalize_to(raw: &str) -> String {
    let to = prepare_to(raw);
    if to.contains(',') {
        resolve_list(&to).unwrap_or_else(|| raw.to_string())
    } else {
        resolve_single(&to, Header::To).unwrap_or_else(|| raw.to_string())
    }
}

/// Strip angle brackets from a single address: `Name <a@b>` becomes `a@b`.
#[must_use]
pub fn clean_address(addr: &str) -> String {
    let mut parts = addr.split('<');
    match (parts.next(), parts.next()) {
        (_, Some(inner)) => inner.trim_end_matches('>').to_string(),
        _ => addr.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Header {
    From,
    To,
}

impl Header {
    const fn name(self) -> &'static str {
        match self {
            Self::From => "From",
            Self::To => "To",
        }
    }

    /// Failures worth a retry with only the last whitespace-separated token
    const fn retries_last_token(self, err: &AddrError) -> bool {
        match self {
            Self::From => matches!(
                err,
                AddrError::ExpectedSingleAddress(_)
                    | AddrError::MissingAtSign
                    | AddrError::ExpectedComma
                    | AddrError::MissingAngleOrAt
                    | AddrError::NoAngleAddr
            ),
            Self::To => matches!(
                err,
                AddrError::ExpectedSingleAddress(_) | AddrError::MissingAtSign
            ),
        }
    }
}

/// Quotes are display-name artifacts; parentheses are often used where
/// angle brackets were meant.
fn prepare_from(raw: &str) -> String {
    parens_to_angles(&raw.trim().replace('"', ""))
}

fn prepare_to(raw: &str) -> String {
    parens_to_angles(raw.trim()).replace(';', ",")
}

fn parens_to_angles(s: &str) -> String {
    s.replace('(', "<").replace(')', ">")
}

/// Single-address resolution. `None` means "keep the caller's text",
/// `Some("")` means the value is discarded.
fn resolve_single(value: &str, header: Header) -> Option<String> {
    let err = match parse_address(value) {
        Ok(mailbox) => return Some(mailbox.address),
        Err(err) => err,
    };

    let retry = if header.retries_last_token(&err) {
        error!("Could not parse {} address: {err}", header.name());
        last_token(value)
    } else {
        match err {
            AddrError::UnclosedAngleAddr => {
                warn!("Unclosed angle address in {}: {value:?}", header.name());
                trim_to_angle(value)
            }
            AddrError::NoAddress if header == Header::To => {
                error!("Could not parse To address: {err}");
                return Some(String::new());
            }
            _ => {
                error!("Could not parse {} address: {err}", header.name());
                return None;
            }
        }
    };

    match parse_address(&retry) {
        Ok(mailbox) => Some(mailbox.address),
        Err(err) => {
            error!("Could not parse {} address after retry: {err}", header.name());
            None
        }
    }
}

/// List resolution for To headers that contain a comma.
fn resolve_list(value: &str) -> Option<String> {
    let err = match parse_address_list(value) {
        Ok(list) => return Some(join_addresses(&list)),
        Err(err) => err,
    };

    error!("Could not parse To address list: {err}");
    let retry = match err {
        AddrError::ExpectedComma | AddrError::MissingAtSign => rebuild_list(value),
        AddrError::UnclosedAngleAddr => value.replace(" >", ">"),
        AddrError::InvalidString => return Some(String::new()),
        _ => return None,
    };

    match parse_address_list(&retry) {
        Ok(list) => Some(join_addresses(&list)),
        Err(err) => {
            error!("Could not parse To address list after retry: {err}");
            None
        }
    }
}

fn join_addresses(list: &[Mailbox]) -> String {
    list.iter()
        .map(|m| m.address.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn last_token(value: &str) -> String {
    value.split_whitespace().next_back().unwrap_or_default().to_string()
}

/// Drop spaces and keep everything from one character before the first `<`.
fn trim_to_angle(value: &str) -> String {
    let compact: String = value.chars().filter(|c| *c != ' ').collect();
    match compact.find('<') {
        Some(idx) if idx > 0 => {
            let start = compact[..idx]
                .char_indices()
                .next_back()
                .map_or(0, |(i, _)| i);
            compact[start..].to_string()
        }
        _ => compact,
    }
}

/// Keep only tokens that look like bracketed addresses, deduplicated in
/// first-seen order.
fn rebuild_list(value: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    for token in value.split_whitespace() {
        if token.contains('@') && (token.contains('<') || token.contains('>')) {
            let token = token.strip_suffix(',').unwrap_or(token);
            if !kept.contains(&token) {
                kept.push(token);
            }
        }
    }
    kept.join(",")
}
