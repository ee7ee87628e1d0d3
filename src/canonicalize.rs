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

//! Canonicalization utilities.
//!
//! Only the *relaxed* algorithm is implemented, for both header and body.

use crate::{
    header::{FieldName, Headers},
    parse::CRLF,
};
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};
use tracing::debug;

const SP: char = ' ';

// Whitespace collapsed in header values: SP, HTAB, LF, VT, FF, CR.
fn is_header_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0b' | '\x0c' | '\r')
}

// Whitespace stripped from both ends of the body and of the header block.
fn is_trim_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\0' | '\x0b')
}

/// Normalizes a flat body for signing.
///
/// Every line ending is turned into CRLF; besides CRLF, CR and LF this also
/// covers VT, FF, NEL and the Unicode line and paragraph separators. Then
/// whitespace is stripped from both ends, and a single CRLF is appended. The
/// empty body thus becomes a lone CRLF.
pub fn normalize_body(body: &str) -> String {
    let normalized = normalize_line_endings(body);
    let mut result = String::with_capacity(normalized.len() + 2);
    result.push_str(normalized.trim_matches(is_trim_space));
    result.push_str(CRLF);
    result
}

fn normalize_line_endings(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                chars.next_if_eq(&'\n');
                result.push_str(CRLF);
            }
            '\n' | '\x0b' | '\x0c' | '\u{85}' | '\u{2028}' | '\u{2029}' => {
                result.push_str(CRLF);
            }
            c => result.push(c),
        }
    }

    result
}

/// A header value that could not be encoded for canonicalization.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InvalidHeaderValue {
    pub name: FieldName,
}

impl Display for InvalidHeaderValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "invalid value in header {}", self.name)
    }
}

impl Error for InvalidHeaderValue {}

/// The result of header canonicalization.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CanonicalizedHeaders {
    /// The signature base: canonicalized header lines, trailing whitespace
    /// removed.
    pub data: String,
    /// Names that were selected for signing but found no header.
    pub skipped: Vec<String>,
}

/// Produces the relaxed canonicalization of the selected headers.
///
/// For each selected name, in order, the header with that name is
/// canonicalized. A name without matching header, or with more than one, is
/// skipped and recorded in [`CanonicalizedHeaders::skipped`]; this is not an
/// error.
pub fn canonicalize_headers<S: AsRef<str>>(
    headers: &Headers,
    selected_headers: &[S],
) -> Result<CanonicalizedHeaders, InvalidHeaderValue> {
    let mut data = String::new();
    let mut skipped = vec![];

    for name in selected_headers {
        let name = name.as_ref();

        let mut matches = headers.get_all(name);

        match (matches.next(), matches.next()) {
            (Some(header), None) => {
                let value = header.encoded_value().map_err(|_| InvalidHeaderValue {
                    name: header.name().clone(),
                })?;

                canonicalize_header(&mut data, name, &value);
            }
            (None, _) => {
                debug!("header {name} selected for signing but not present, skipping");
                skipped.push(name.into());
            }
            (Some(_), Some(_)) => {
                debug!("header {name} selected for signing but repeated, skipping");
                skipped.push(name.into());
            }
        }
    }

    let len = data.trim_end_matches(is_trim_space).len();
    data.truncate(len);

    Ok(CanonicalizedHeaders { data, skipped })
}

/// Canonicalizes a header field into some result string, including the
/// terminating CRLF.
pub fn canonicalize_header(result: &mut String, name: &str, value: &str) {
    result.push_str(&name.to_ascii_lowercase());
    result.push(':');
    canonicalize_header_value(result, value);
    result.push_str(CRLF);
}

fn canonicalize_header_value(result: &mut String, value: &str) {
    let value = value.trim_matches(is_header_space);

    let mut compressing = false;
    for c in value.chars() {
        if is_header_space(c) {
            if !compressing {
                result.push(SP);
                compressing = true;
            }
        } else {
            result.push(c);
            compressing = false;
        }
    }
}
