//! Strict address grammar (RFC 5322 subset)
//!
//! The parser accepts `addr-spec`, `name-addr` and group syntax and reports
//! failures as [`AddrError`] kinds, which the normalizer matches on to pick
//! its recovery strategy.

use crate::types::Mailbox;
use thiserror::Error;

/// Reasons the strict grammar rejected an address
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddrError {
    #[error("no address")]
    NoAddress,

    #[error("no addr-spec")]
    NoAddrSpec,

    #[error("empty quoted-string in addr-spec")]
    EmptyQuotedString,

    #[error("missing @ in addr-spec")]
    MissingAtSign,

    #[error("no domain in addr-spec")]
    NoDomain,

    /// An atom was expected but the input starts with a special character
    #[error("invalid string")]
    InvalidString,

    #[error("leading dot in atom")]
    LeadingDot,

    #[error("double dot in atom")]
    DoubleDot,

    #[error("trailing dot in atom")]
    TrailingDot,

    #[error("unclosed quoted-string")]
    UnclosedQuotedString,

    #[error("bad character in quoted-string: {0:?}")]
    BadQuotedChar(char),

    #[error("misformatted parenthetical comment")]
    MisformattedComment,

    /// A display name made of several words with no `<...>` after it
    #[error("no angle-addr")]
    NoAngleAddr,

    /// A single atom with neither `@` nor `<...>` after it
    #[error("missing '@' or angle-addr")]
    MissingAngleOrAt,

    #[error("unclosed angle-addr")]
    UnclosedAngleAddr,

    #[error("expected comma")]
    ExpectedComma,

    #[error("expected single address, got {0:?}")]
    ExpectedSingleAddress(String),

    #[error("empty group")]
    EmptyGroup,

    #[error("group with multiple addresses")]
    GroupWithMultipleAddresses,
}

/// Parse exactly one address.
pub fn parse_address(input: &str) -> Result<Mailbox, AddrError> {
    let mut p = AddrParser { s: input };
    let mut addrs = p.parse_address(true)?;
    if !p.skip_cfws() {
        return Err(AddrError::MisformattedComment);
    }
    if !p.is_empty() {
        return Err(AddrError::ExpectedSingleAddress(p.s.to_string()));
    }
    match addrs.len() {
        0 => Err(AddrError::EmptyGroup),
        1 => Ok(addrs.remove(0)),
        _ => Err(AddrError::GroupWithMultipleAddresses),
    }
}

/// Parse a comma-separated address list. Empty entries are skipped.
pub fn parse_address_list(input: &str) -> Result<Vec<Mailbox>, AddrError> {
    let mut p = AddrParser { s: input };
    let mut list = Vec::new();
    loop {
        p.skip_space();
        if p.consume(',') {
            continue;
        }

        list.extend(p.parse_address(true)?);

        if !p.skip_cfws() {
            return Err(AddrError::MisformattedComment);
        }
        if p.is_empty() {
            break;
        }
        if p.peek() != Some(',') {
            return Err(AddrError::ExpectedComma);
        }
        while p.consume(',') {
            p.skip_space();
        }
        if p.is_empty() {
            break;
        }
    }
    Ok(list)
}

#[derive(Clone, Copy)]
struct AddrParser<'a> {
    s: &'a str,
}

impl<'a> AddrParser<'a> {
    const fn is_empty(&self) -> bool {
        self.s.is_empty()
    }

    fn peek(&self) -> Option<char> {
        self.s.chars().next()
    }

    fn consume(&mut self, c: char) -> bool {
        match self.s.strip_prefix(c) {
            Some(rest) => {
                self.s = rest;
                true
            }
            None => false,
        }
    }

    fn skip_space(&mut self) {
        self.s = self.s.trim_start_matches([' ', '\t']);
    }

    /// Skip whitespace and comments. Returns false on an unterminated comment.
    fn skip_cfws(&mut self) -> bool {
        self.skip_space();
        while self.consume('(') {
            if self.consume_comment().is_none() {
                return false;
            }
            self.skip_space();
        }
        true
    }

    fn parse_address(&mut self, handle_group: bool) -> Result<Vec<Mailbox>, AddrError> {
        self.skip_space();
        if self.is_empty() {
            return Err(AddrError::NoAddress);
        }

        // addr-spec is the narrower form, so it gets the first try
        if let Ok(address) = self.consume_addr_spec() {
            let mut name = None;
            self.skip_space();
            if self.peek() == Some('(') {
                name = Some(self.consume_display_name_comment()?);
            }
            return Ok(vec![Mailbox {
                name: name.filter(|n| !n.is_empty()),
                address,
            }]);
        }

        let mut display_name = String::new();
        if self.peek() != Some('<') {
            display_name = self.consume_phrase()?;
        }

        self.skip_space();
        if handle_group && self.consume(':') {
            return self.consume_group_list();
        }

        if !self.consume('<') {
            return Err(if display_name.chars().all(|c| is_atext(c, true)) {
                AddrError::MissingAngleOrAt
            } else {
                AddrError::NoAngleAddr
            });
        }
        let address = self.consume_addr_spec()?;
        if !self.consume('>') {
            return Err(AddrError::UnclosedAngleAddr);
        }

        Ok(vec![Mailbox {
            name: (!display_name.is_empty()).then_some(display_name),
            address,
        }])
    }

    fn consume_group_list(&mut self) -> Result<Vec<Mailbox>, AddrError> {
        let mut group = Vec::new();
        self.skip_space();
        if self.consume(';') {
            self.skip_cfws();
            return Ok(group);
        }

        loop {
            self.skip_space();
            // no nested groups
            group.extend(self.parse_address(false)?);
            if !self.skip_cfws() {
                return Err(AddrError::MisformattedComment);
            }
            if self.consume(';') {
                self.skip_cfws();
                break;
            }
            if !self.consume(',') {
                return Err(AddrError::ExpectedComma);
            }
        }
        Ok(group)
    }

    /// Consume an addr-spec, leaving the parser untouched on failure.
    fn consume_addr_spec(&mut self) -> Result<String, AddrError> {
        let orig = *self;
        let spec = self.addr_spec();
        if spec.is_err() {
            *self = orig;
        }
        spec
    }

    fn addr_spec(&mut self) -> Result<String, AddrError> {
        self.skip_space();
        if self.is_empty() {
            return Err(AddrError::NoAddrSpec);
        }

        let local_part = if self.peek() == Some('"') {
            let quoted = self.consume_quoted_string()?;
            if quoted.is_empty() {
                return Err(AddrError::EmptyQuotedString);
            }
            quoted
        } else {
            self.consume_atom(true, false)?.to_string()
        };

        if !self.consume('@') {
            return Err(AddrError::MissingAtSign);
        }

        self.skip_space();
        if self.is_empty() {
            return Err(AddrError::NoDomain);
        }
        let domain = self.consume_atom(true, false)?;

        Ok(format!("{local_part}@{domain}"))
    }

    /// phrase = 1*word. Stops at the first token that is not a word.
    fn consume_phrase(&mut self) -> Result<String, AddrError> {
        let mut words: Vec<String> = Vec::new();
        let mut first_err = None;

        loop {
            if !words.is_empty() && !self.skip_cfws() {
                return Err(AddrError::MisformattedComment);
            }
            self.skip_space();
            if self.is_empty() {
                break;
            }

            let word = if self.peek() == Some('"') {
                self.consume_quoted_string()
            } else {
                // dot-atom, more permissive than RFC 5322 asks for
                self.consume_atom(true, true).map(str::to_string)
            };
            match word {
                Ok(word) => words.push(word),
                Err(e) => {
                    first_err = Some(e);
                    break;
                }
            }
        }

        if words.is_empty()
            && let Some(e) = first_err
        {
            return Err(e);
        }
        Ok(words.join(" "))
    }

    fn consume_atom(&mut self, dot: bool, permissive: bool) -> Result<&'a str, AddrError> {
        let end = self
            .s
            .find(|c: char| !is_atext(c, dot))
            .unwrap_or(self.s.len());
        if end == 0 {
            return Err(AddrError::InvalidString);
        }

        let (atom, rest) = self.s.split_at(end);
        self.s = rest;

        if !permissive {
            if atom.starts_with('.') {
                return Err(AddrError::LeadingDot);
            }
            if atom.contains("..") {
                return Err(AddrError::DoubleDot);
            }
            if atom.ends_with('.') {
                return Err(AddrError::TrailingDot);
            }
        }
        Ok(atom)
    }

    /// Consume a quoted-string, opening quote included. Returns the unescaped text.
    fn consume_quoted_string(&mut self) -> Result<String, AddrError> {
        let mut text = String::new();
        let mut escaped = false;

        for (i, c) in self.s.char_indices().skip(1) {
            if escaped {
                if !is_vchar(c) && !is_wsp(c) {
                    return Err(AddrError::BadQuotedChar(c));
                }
                text.push(c);
                escaped = false;
                continue;
            }
            match c {
                '"' => {
                    self.s = &self.s[i + 1..];
                    return Ok(text);
                }
                '\\' => escaped = true,
                c if is_qtext(c) || is_wsp(c) => text.push(c),
                c => return Err(AddrError::BadQuotedChar(c)),
            }
        }

        Err(AddrError::UnclosedQuotedString)
    }

    /// Consume a comment body; the opening `(` must already be consumed.
    fn consume_comment(&mut self) -> Option<String> {
        let mut depth = 1usize;
        let mut comment = String::new();
        let mut escaped = false;

        for (i, c) in self.s.char_indices() {
            if escaped {
                comment.push(c);
                escaped = false;
                continue;
            }
            match c {
                '\\' => escaped = true,
                '(' => {
                    depth += 1;
                    comment.push(c);
                }
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        self.s = &self.s[i + 1..];
                        return Some(comment);
                    }
                    comment.push(c);
                }
                _ => comment.push(c),
            }
        }

        self.s = "";
        None
    }

    fn consume_display_name_comment(&mut self) -> Result<String, AddrError> {
        if !self.consume('(') {
            return Err(AddrError::MisformattedComment);
        }
        let comment = self
            .consume_comment()
            .ok_or(AddrError::MisformattedComment)?;

        Ok(comment
            .split([' ', '\t'])
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join(" "))
    }
}

fn is_atext(c: char, dot: bool) -> bool {
    match c {
        '.' => dot,
        '(' | ')' | '<' | '>' | '[' | ']' | ':' | ';' | '@' | '\\' | ',' | '"' => false,
        _ => is_vchar(c),
    }
}

/// Printable ASCII, or any non-ASCII character (RFC 6532)
const fn is_vchar(c: char) -> bool {
    ('!' <= c && c <= '~') || !c.is_ascii()
}

const fn is_qtext(c: char) -> bool {
    !matches!(c, '\\' | '"') && is_vchar(c)
}

const fn is_wsp(c: char) -> bool {
    matches!(c, ' ' | '\t')
}
