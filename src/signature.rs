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

//! DKIM signature header.

use crate::{
    crypto::HashAlgorithm,
    header::{FieldName, Header, HeaderEncoding},
    parse,
    tag_list::{TagList, TagListParseError},
    util::CanonicalStr,
};
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    str::FromStr,
};

/// The canonical name of the *DKIM-Signature* header.
pub const DKIM_SIGNATURE_NAME: &str = "DKIM-Signature";

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum SignatureAlgorithm {
    #[default]
    RsaSha256,
}

impl SignatureAlgorithm {
    pub fn hash_algorithm(self) -> HashAlgorithm {
        match self {
            Self::RsaSha256 => HashAlgorithm::Sha256,
        }
    }
}

impl CanonicalStr for SignatureAlgorithm {
    fn canonical_str(&self) -> &'static str {
        match self {
            Self::RsaSha256 => "rsa-sha256",
        }
    }
}

/// Canonicalization algorithm. Only *relaxed* is supported, and is used for
/// both header and body.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum CanonicalizationAlgorithm {
    #[default]
    Relaxed,
}

impl CanonicalStr for CanonicalizationAlgorithm {
    fn canonical_str(&self) -> &'static str {
        match self {
            Self::Relaxed => "relaxed",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ParseDkimHeaderError {
    /// The line is not of the form `name: value`.
    Syntax,
    /// The header name is not *DKIM-Signature*.
    WrongName,
}

impl Display for ParseDkimHeaderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "ill-formed header line"),
            Self::WrongName => write!(f, "invalid header line for DKIM-Signature string"),
        }
    }
}

impl Error for ParseDkimHeaderError {}

/// A *DKIM-Signature* header.
///
/// The field name is always the canonical `DKIM-Signature`, and the value is
/// always US-ASCII.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct DkimHeader {
    value: String,
}

impl DkimHeader {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }

    pub fn field_name(&self) -> &'static str {
        DKIM_SIGNATURE_NAME
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn encoding(&self) -> HeaderEncoding {
        HeaderEncoding::Ascii
    }

    /// Parses the value as a tag list.
    pub fn tags(&self) -> Result<TagList<'_>, TagListParseError> {
        TagList::parse(&self.value)
    }

    /// Returns the *b=* tag value with all whitespace removed.
    pub fn signature_data_base64(&self) -> Option<String> {
        let tags = self.tags().ok()?;
        let b = tags.get("b")?;
        Some(b.chars().filter(|c| !c.is_ascii_whitespace()).collect())
    }
}

impl FromStr for DkimHeader {
    type Err = ParseDkimHeaderError;

    /// Parses a header line `DKIM-Signature: value`; the name is matched
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = parse::split_header_line(s).ok_or(ParseDkimHeaderError::Syntax)?;

        if !name.eq_ignore_ascii_case(DKIM_SIGNATURE_NAME) {
            return Err(ParseDkimHeaderError::WrongName);
        }

        Ok(Self::new(value))
    }
}

impl Display for DkimHeader {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{DKIM_SIGNATURE_NAME}: {}", self.value)
    }
}

impl From<DkimHeader> for Header {
    fn from(header: DkimHeader) -> Self {
        let name = FieldName::new(DKIM_SIGNATURE_NAME).expect("valid header name");
        Header::new(name, header.value).with_encoding(HeaderEncoding::Ascii)
    }
}

impl TryFrom<&Header> for DkimHeader {
    type Error = ParseDkimHeaderError;

    fn try_from(header: &Header) -> Result<Self, Self::Error> {
        if *header.name() != DKIM_SIGNATURE_NAME {
            return Err(ParseDkimHeaderError::WrongName);
        }
        Ok(Self::new(header.value()))
    }
}
