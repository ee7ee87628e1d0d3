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

//! Representation of email header data.
//!
//! A [`Header`] stores its value in *raw* form, as set by the user. What is
//! written on the wire, and what gets canonicalised for signing, is the
//! *encoded* form returned by [`Header::encoded_value`]: long ASCII values
//! are folded, non-ASCII values are turned into RFC 2047 encoded words.

use crate::{
    encoded_word,
    parse::{self, is_wsp, CRLF},
};
use std::{
    error::Error,
    fmt::{self, Debug, Display, Formatter},
    hash::{Hash, Hasher},
    slice,
};

/// Maximum line width used when folding header values.
pub const LINE_WIDTH: usize = 78;

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct HeaderFieldError;

impl Display for HeaderFieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "invalid header field")
    }
}

impl Error for HeaderFieldError {}

/// A header field name. Comparison is case-insensitive.
#[derive(Clone, Eq)]
pub struct FieldName(Box<str>);

impl FieldName {
    pub fn new(value: impl Into<Box<str>>) -> Result<Self, HeaderFieldError> {
        let value = value.into();
        if value.is_empty() {
            return Err(HeaderFieldError);
        }
        if !value.chars().all(parse::is_ftext) {
            return Err(HeaderFieldError);
        }
        Ok(Self(value))
    }
}

impl AsRef<str> for FieldName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Debug for FieldName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for FieldName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq for FieldName {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl PartialEq<&str> for FieldName {
    fn eq(&self, other: &&str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl Hash for FieldName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_ascii_lowercase().hash(state);
    }
}

/// The character encoding used when rendering a header value.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum HeaderEncoding {
    /// Only US-ASCII values are allowed.
    #[default]
    Ascii,
    /// Non-ASCII values are rendered as RFC 2047 encoded words.
    Utf8,
}

/// A header field: name, raw value, and encoding.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Header {
    name: FieldName,
    value: String,
    encoding: HeaderEncoding,
}

impl Header {
    pub fn new(name: FieldName, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
            encoding: Default::default(),
        }
    }

    /// Convenience constructor validating the field name.
    pub fn from_parts(
        name: impl Into<Box<str>>,
        value: impl Into<String>,
    ) -> Result<Self, HeaderFieldError> {
        let name = FieldName::new(name)?;
        Ok(Self::new(name, value))
    }

    pub fn with_encoding(mut self, encoding: HeaderEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn name(&self) -> &FieldName {
        &self.name
    }

    /// The value as set, without encoding or folding applied.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn encoding(&self) -> HeaderEncoding {
        self.encoding
    }

    /// Returns the value in the form written on the wire.
    ///
    /// A value that already carries folding whitespace is returned as is. A
    /// value containing line breaks that are not valid folds is an error, as
    /// is a non-ASCII value in a header with ASCII encoding.
    pub fn encoded_value(&self) -> Result<String, HeaderFieldError> {
        let value = &self.value[..];

        if !parse::is_folded_properly(value) {
            return Err(HeaderFieldError);
        }

        if !value.is_ascii() {
            return match self.encoding {
                HeaderEncoding::Ascii => Err(HeaderFieldError),
                HeaderEncoding::Utf8 => {
                    let unfolded = unfold(value);
                    let words = encoded_word::encode_q(&unfolded);
                    Ok(words.join("\r\n "))
                }
            };
        }

        if value.contains(CRLF) {
            Ok(value.into())
        } else {
            // the first line also holds the name, colon, and space
            Ok(fold(value, LINE_WIDTH, self.name.as_ref().len() + 2))
        }
    }

    /// Formats the header as `Name: value` with encoded value, without
    /// trailing line break.
    pub fn to_line(&self) -> Result<String, HeaderFieldError> {
        let value = self.encoded_value()?;
        Ok(format!("{}: {value}", self.name))
    }
}

fn unfold(value: &str) -> String {
    value.replace(CRLF, "")
}

// Breaks lines at single spaces so that lines do not exceed `width` where
// possible, the first line starting at column `offset`. Words longer than the
// width are left intact, and a line break is never placed in front of an
// empty word, so no continuation line is blank.
fn fold(value: &str, width: usize, offset: usize) -> String {
    if offset + value.len() <= width {
        return value.into();
    }

    let mut result = String::with_capacity(value.len() + 8);
    let mut line_len = 0;

    for (i, word) in value.split(' ').enumerate() {
        if i == 0 {
            result.push_str(word);
            line_len = offset + word.len();
        } else if !word.is_empty() && line_len > 0 && line_len + 1 + word.len() > width {
            result.push_str("\r\n ");
            result.push_str(word);
            line_len = word.len() + 1;
        } else {
            result.push(' ');
            result.push_str(word);
            line_len += word.len() + 1;
        }
    }

    result
}

/// An ordered collection of header fields with case-insensitive lookup.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Headers(Vec<Header>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the first header with the given name.
    pub fn get(&self, name: &str) -> Option<&Header> {
        self.0.iter().find(|h| h.name == name)
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Header> + 'a {
        self.0.iter().filter(move |h| h.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn add(&mut self, header: Header) -> &mut Self {
        self.0.push(header);
        self
    }

    pub fn add_all<I>(&mut self, headers: I) -> &mut Self
    where
        I: IntoIterator<Item = Header>,
    {
        self.0.extend(headers);
        self
    }

    /// Removes all headers with the given name, returning how many were
    /// removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let len = self.0.len();
        self.0.retain(|h| h.name != name);
        len - self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> slice::Iter<'_, Header> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[Header]> for Headers {
    fn as_ref(&self) -> &[Header] {
        &self.0
    }
}

impl From<Vec<Header>> for Headers {
    fn from(headers: Vec<Header>) -> Self {
        Self(headers)
    }
}

impl From<Headers> for Vec<Header> {
    fn from(headers: Headers) -> Self {
        headers.0
    }
}

impl FromIterator<Header> for Headers {
    fn from_iter<I: IntoIterator<Item = Header>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Headers {
    type Item = Header;
    type IntoIter = std::vec::IntoIter<Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a Header;
    type IntoIter = slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Parses a header block into header fields.
///
/// Lines may be separated by CRLF or by LF alone; continuation lines are
/// kept as folds (CRLF followed by the original whitespace). Values
/// containing non-ASCII characters get UTF-8 encoding.
pub fn parse_header(s: &str) -> Result<Headers, HeaderFieldError> {
    let mut headers = vec![];
    let mut current: Option<(&str, String)> = None;

    for line in s.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.starts_with(is_wsp) {
            match &mut current {
                Some((_, value)) => {
                    value.push_str(CRLF);
                    value.push_str(line);
                }
                None => return Err(HeaderFieldError),
            }
            continue;
        }

        if let Some((name, value)) = current.take() {
            headers.push(make_header(name, value)?);
        }

        if line.is_empty() {
            continue;
        }

        let (name, value) = parse::split_header_line(line).ok_or(HeaderFieldError)?;
        current = Some((name, value.into()));
    }

    if let Some((name, value)) = current {
        headers.push(make_header(name, value)?);
    }

    Ok(Headers(headers))
}

fn make_header(name: &str, value: String) -> Result<Header, HeaderFieldError> {
    let encoding = if value.is_ascii() {
        HeaderEncoding::Ascii
    } else {
        HeaderEncoding::Utf8
    };
    Ok(Header::from_parts(name, value)?.with_encoding(encoding))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_name_debug_and_display() {
        let name = FieldName::new("Subject").unwrap();

        assert_eq!(format!("{name:?}"), "\"Subject\"");
        assert_eq!(name.to_string(), "Subject");
    }

    #[test]
    fn field_name_ok() {
        assert!(FieldName::new("abc").is_ok());
        assert!(FieldName::new("DKIM-Signature").is_ok());

        assert!(FieldName::new("").is_err());
        assert!(FieldName::new("abc ").is_err());
        assert!(FieldName::new("a:c").is_err());
    }

    #[test]
    fn field_name_case_insensitive() {
        let name = FieldName::new("Subject").unwrap();
        assert_eq!(name, "subject");
        assert_eq!(name, FieldName::new("SUBJECT").unwrap());
    }

    #[test]
    fn encoded_value_short_ascii() {
        let header = Header::from_parts("Subject", "Subject Subject").unwrap();
        assert_eq!(header.encoded_value().unwrap(), "Subject Subject");
    }

    #[test]
    fn encoded_value_folds_long_ascii() {
        let header = Header::from_parts("Subject", "Subject ".repeat(10)).unwrap();

        let value = header.encoded_value().unwrap();

        assert!(value.contains("\r\n "));
        assert!(value.split("\r\n").all(|line| line.len() <= LINE_WIDTH));
        assert_eq!(value.replace("\r\n", ""), "Subject ".repeat(10));

        let line = header.to_line().unwrap();
        assert!(line.split("\r\n").all(|line| line.len() <= LINE_WIDTH));
    }

    #[test]
    fn fold_at_offset() {
        assert_eq!(fold("aa bb cc", 7, 0), "aa bb\r\n cc");
        assert_eq!(fold("aa bb cc", 7, 3), "aa\r\n bb cc");
        assert_eq!(fold("aaaaaaaaaa bb", 8, 0), "aaaaaaaaaa\r\n bb");
    }

    #[test]
    fn encoded_value_keeps_existing_folds() {
        let header = Header::from_parts("Subject", "Subject\r\n\tSubject").unwrap();
        assert_eq!(header.encoded_value().unwrap(), "Subject\r\n\tSubject");
    }

    #[test]
    fn encoded_value_rejects_injection() {
        let header = Header::from_parts("Subject", "hi\r\nBcc: x@example.com").unwrap();
        assert_eq!(header.encoded_value(), Err(HeaderFieldError));

        let header = Header::from_parts("Subject", "hi\nthere").unwrap();
        assert_eq!(header.encoded_value(), Err(HeaderFieldError));
    }

    #[test]
    fn encoded_value_non_ascii() {
        let header = Header::from_parts("Subject", "Grüße").unwrap();
        assert_eq!(header.encoded_value(), Err(HeaderFieldError));

        let header = header.with_encoding(HeaderEncoding::Utf8);
        assert_eq!(header.encoded_value().unwrap(), "=?UTF-8?Q?Gr=C3=BC=C3=9Fe?=");
    }

    #[test]
    fn headers_lookup_and_removal() {
        let mut headers = Headers::new();
        headers
            .add(Header::from_parts("From", "me@example.com").unwrap())
            .add(Header::from_parts("To", "a@example.com").unwrap())
            .add(Header::from_parts("to", "b@example.com").unwrap());

        assert_eq!(headers.get("TO").unwrap().value(), "a@example.com");
        assert_eq!(headers.get_all("to").count(), 2);
        assert!(!headers.contains("Cc"));

        assert_eq!(headers.remove("To"), 2);
        assert_eq!(headers.len(), 1);

        headers.clear();
        assert!(headers.is_empty());
    }

    #[test]
    fn parse_header_ok() {
        let headers = parse_header(
            "From: me@example.com\nSubject: one\n two\r\nTo:you@example.com\nX-Umlaut: Grüße\n",
        )
        .unwrap();

        let names: Vec<_> = headers.iter().map(|h| h.name().as_ref()).collect();
        assert_eq!(names, ["From", "Subject", "To", "X-Umlaut"]);
        assert_eq!(headers.get("subject").unwrap().value(), "one\r\n two");
        assert_eq!(headers.get("to").unwrap().value(), "you@example.com");
        assert_eq!(headers.get("x-umlaut").unwrap().encoding(), HeaderEncoding::Utf8);
    }

    #[test]
    fn parse_header_invalid() {
        assert_eq!(parse_header(" leading continuation"), Err(HeaderFieldError));
        assert_eq!(parse_header("no colon here"), Err(HeaderFieldError));
    }
}
