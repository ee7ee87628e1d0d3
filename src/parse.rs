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

//! Common parsing utilities.

pub const CRLF: &str = "\r\n";

pub fn strip_suffix<'a>(s: &'a str, suffix: &str) -> &'a str {
    debug_assert!(s.ends_with(suffix));
    &s[..(s.len() - suffix.len())]
}

// FWS = ([*WSP CRLF] 1*WSP)

/// Strips one occurrence of folding whitespace.
pub fn strip_fws(input: &str) -> Option<&str> {
    if let Some(s) = strip_wsp(input) {
        s.strip_prefix(CRLF).and_then(strip_wsp).or(Some(s))
    } else {
        input.strip_prefix(CRLF).and_then(strip_wsp)
    }
}

fn strip_wsp(input: &str) -> Option<&str> {
    input
        .strip_prefix(is_wsp)
        .map(|s| s.trim_start_matches(is_wsp))
}

pub fn is_wsp(c: char) -> bool {
    matches!(c, ' ' | '\t')
}

/// Returns whether every line break in the value is a CRLF followed by WSP.
pub fn is_folded_properly(value: &str) -> bool {
    let mut lines = value.split(CRLF);

    // the first line may be anything except a stray CR or LF
    let first_ok = lines
        .next()
        .map_or(true, |line| !line.contains(['\r', '\n']));

    first_ok
        && lines.all(|line| {
            line.starts_with(is_wsp)
                && !line.trim_matches(is_wsp).is_empty()
                && !line.contains(['\r', '\n'])
        })
}

/// Splits a header line of the form `name: value` at the first colon.
///
/// Whitespace between the colon and the value is dropped; the value is
/// returned otherwise untouched, including any folding.
pub fn split_header_line(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(':')?;

    if name.is_empty() || !name.chars().all(is_ftext) {
        return None;
    }

    let value = strip_fws(value).unwrap_or(value);

    Some((name, value))
}

// RFC 5322, section 3.6.8
pub fn is_ftext(c: char) -> bool {
    c.is_ascii_graphic() && c != ':'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_fws_ok() {
        assert_eq!(strip_fws(""), None);
        assert_eq!(strip_fws("x"), None);
        assert_eq!(strip_fws(" x"), Some("x"));
        assert_eq!(strip_fws("\r\n"), None);
        assert_eq!(strip_fws(" \r\n"), Some("\r\n"));
        assert_eq!(strip_fws(" \r\n x"), Some("x"));
        assert_eq!(strip_fws("\r\n x"), Some("x"));
    }

    #[test]
    fn is_folded_properly_ok() {
        assert!(is_folded_properly(""));
        assert!(is_folded_properly("Subject"));
        assert!(is_folded_properly("Subject\r\n Subject"));
        assert!(is_folded_properly("Subject\r\n\t Subject"));

        assert!(!is_folded_properly("Subject\r\nSubject"));
        assert!(!is_folded_properly("Subject\nBcc: x@example.com"));
        assert!(!is_folded_properly("Subject\r\n \r\n x"));
        assert!(!is_folded_properly("Subject\r\n"));
        assert!(!is_folded_properly("Sub\rject"));
    }

    #[test]
    fn split_header_line_ok() {
        assert_eq!(split_header_line("To: you"), Some(("To", "you")));
        assert_eq!(split_header_line("To:you"), Some(("To", "you")));
        assert_eq!(split_header_line("To:\r\n you"), Some(("To", "you")));
        assert_eq!(
            split_header_line("Subject: a:b\r\n c"),
            Some(("Subject", "a:b\r\n c"))
        );

        assert_eq!(split_header_line(": you"), None);
        assert_eq!(split_header_line("T o: you"), None);
        assert_eq!(split_header_line("To you"), None);
    }
}
