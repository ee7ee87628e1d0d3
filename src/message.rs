// dkimsign – DKIM signing of outgoing email messages
// Copyright © 2022–2023 David Bürgin <dbuergin@gluet.ch>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.

//! Email message: header fields plus body.

use crate::{
    body::Body,
    header::{self, HeaderFieldError, Headers},
    parse::CRLF,
};
use std::str::FromStr;

/// An email message, owned by the caller and updated in place by signing.
#[derive(Debug, Default)]
pub struct Message {
    pub headers: Headers,
    pub body: Body,
}

impl Message {
    pub fn new(headers: Headers, body: impl Into<Body>) -> Self {
        Self {
            headers,
            body: body.into(),
        }
    }

    /// Renders the message as it is written on the wire: header lines, an
    /// empty line, and the body.
    pub fn to_wire(&self) -> Result<String, HeaderFieldError> {
        let mut result = String::new();
        for header in &self.headers {
            result.push_str(&header.to_line()?);
            result.push_str(CRLF);
        }
        result.push_str(CRLF);
        result.push_str(&self.body.to_text());
        Ok(result)
    }
}

impl FromStr for Message {
    type Err = HeaderFieldError;

    /// Parses raw message text, splitting at the first empty line. Lines may
    /// end in CRLF or LF; the body is taken as is.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (header, body) = split_message(s);
        let headers = header::parse_header(header)?;
        Ok(Self::new(headers, body))
    }
}

fn split_message(s: &str) -> (&str, &str) {
    let crlf = s.find("\r\n\r\n").map(|i| (i, 4));
    let lf = s.find("\n\n").map(|i| (i, 2));

    // whichever empty line comes first
    let split = match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    };

    match split {
        Some((i, len)) => (&s[..i], &s[(i + len)..]),
        None => (s, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_from_str_ok() {
        let msg: Message = "From: me@example.com\r\nTo: you@example.com\r\n\r\nHi!\r\n"
            .parse()
            .unwrap();

        assert_eq!(msg.headers.len(), 2);
        assert_eq!(msg.body.as_text(), Some("Hi!\r\n"));
    }

    #[test]
    fn message_from_str_lf() {
        let msg: Message = "From: me@example.com\nSubject: a\n b\n\nHi!\n\nBye\n".parse().unwrap();

        assert_eq!(msg.headers.get("subject").unwrap().value(), "a\r\n b");
        assert_eq!(msg.body.as_text(), Some("Hi!\n\nBye\n"));
    }

    #[test]
    fn message_to_wire() {
        let msg: Message = "From: me@example.com\n\nHi!".parse().unwrap();

        assert_eq!(msg.to_wire().unwrap(), "From: me@example.com\r\n\r\nHi!");
    }
}
