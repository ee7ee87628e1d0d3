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

//! Tag lists, see RFC 6376, section 3.2.

use crate::parse::{strip_fws, strip_suffix};
use std::{
    collections::HashSet,
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Separator between formatted tag specs.
pub const TAG_SEPARATOR: &str = "; ";

/// Formats tag name/value pairs as a tag list, in the given order.
///
/// The result has no trailing separator, so that a final tag with empty
/// value leaves the list ending in `name=`.
pub fn format_tag_list<'a, I>(tags: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    tags.into_iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join(TAG_SEPARATOR)
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TagListParseError {
    DuplicateTag,
    Syntax,
}

impl Display for TagListParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateTag => write!(f, "duplicate tag in tag list"),
            Self::Syntax => write!(f, "ill-formed tag list"),
        }
    }
}

impl Error for TagListParseError {}

#[derive(Debug, PartialEq, Eq)]
pub struct TagSpec<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

#[derive(Debug, PartialEq, Eq)]
pub struct TagList<'a>(Vec<TagSpec<'a>>);

impl<'a> AsRef<[TagSpec<'a>]> for TagList<'a> {
    fn as_ref(&self) -> &[TagSpec<'a>] {
        &self.0
    }
}

impl<'a> TagList<'a> {
    pub fn parse(val: &'a str) -> Result<Self, TagListParseError> {
        match parse_tag_list_internal(val) {
            Some((rest, tag_list)) if rest.is_empty() => {
                let mut names_seen = HashSet::new();
                if tag_list.iter().any(|tag| !names_seen.insert(tag.name)) {
                    return Err(TagListParseError::DuplicateTag);
                }
                Ok(TagList(tag_list))
            }
            _ => Err(TagListParseError::Syntax),
        }
    }

    /// Returns the value of the tag with the given name.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.0.iter().find(|t| t.name == name).map(|t| t.value)
    }
}

fn parse_tag_list_internal(val: &str) -> Option<(&str, Vec<TagSpec<'_>>)> {
    let (mut s, t) = parse_tag_spec(val)?;

    let mut tags = vec![t];

    while let Some((snext, t)) = s.strip_prefix(';').and_then(parse_tag_spec) {
        s = snext;
        tags.push(t);
    }

    let s = s.strip_prefix(';').unwrap_or(s);
    let s = strip_fws(s).unwrap_or(s);

    Some((s, tags))
}

fn parse_tag_spec(val: &str) -> Option<(&str, TagSpec<'_>)> {
    let s = strip_fws(val).unwrap_or(val);

    let (s, name) = parse_tag_name(s)?;

    let s = strip_fws(s).unwrap_or(s);

    let s = s.strip_prefix('=')?;

    let s = strip_fws(s).unwrap_or(s);

    let (s, value) = match parse_tag_value(s) {
        Some((s, value)) => {
            let s = strip_fws(s).unwrap_or(s);
            (s, value)
        }
        None => (s, Default::default()),
    };

    Some((s, TagSpec { name, value }))
}

fn parse_tag_name(value: &str) -> Option<(&str, &str)> {
    let s = value
        .strip_prefix(is_alpha)?
        .trim_start_matches(is_alphanum);
    Some((s, strip_suffix(value, s)))
}

fn parse_tag_value(value: &str) -> Option<(&str, &str)> {
    fn strip_tval(s: &str) -> Option<&str> {
        s.strip_prefix(is_tval_char)
            .map(|s| s.trim_start_matches(is_tval_char))
    }

    let mut s = strip_tval(value)?;

    while let Some(snext) = strip_fws(s).and_then(strip_tval) {
        s = snext;
    }

    Some((s, strip_suffix(value, s)))
}

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_alphanum(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_tval_char(c: char) -> bool {
    // printable ASCII w/o ; or non-ASCII UTF-8
    matches!(c, '!'..=':' | '<'..='~') || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_tag_list_ok() {
        assert_eq!(
            format_tag_list([("v", "1"), ("c", "relaxed"), ("b", "")]),
            "v=1; c=relaxed; b="
        );
        assert_eq!(format_tag_list([]), "");
    }

    #[test]
    fn tag_list_parse_ok() {
        let example = " v = 1 ; a=rsa-sha256;d=example.net; s=brisbane;\r\n  \
                       h=from:to:subject;\r\n  b=dzdVyOfAKCdLXdJOc9G2q8LoXSlEniSbav\r\n   +yuU4zG ==;";

        let tags = TagList::parse(example).unwrap();

        assert_eq!(tags.as_ref().len(), 6);
        assert_eq!(tags.get("v"), Some("1"));
        assert_eq!(tags.get("h"), Some("from:to:subject"));
        assert_eq!(tags.get("b"), Some("dzdVyOfAKCdLXdJOc9G2q8LoXSlEniSbav\r\n   +yuU4zG =="));
        assert_eq!(tags.get("x"), None);
    }

    #[test]
    fn tag_list_empty_value() {
        let tags = TagList::parse("v=1; b=").unwrap();
        assert_eq!(tags.get("b"), Some(""));
    }

    #[test]
    fn tag_list_parse_errors() {
        assert_eq!(TagList::parse("v=1; v=2"), Err(TagListParseError::DuplicateTag));
        assert_eq!(TagList::parse("v=1; =2"), Err(TagListParseError::Syntax));
        assert_eq!(TagList::parse(""), Err(TagListParseError::Syntax));
    }
}
