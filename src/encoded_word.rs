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

//! RFC 2047 encoded words in *Q* encoding.

use std::fmt::Write;

const PREFIX: &str = "=?UTF-8?Q?";
const SUFFIX: &str = "?=";

/// Maximum length of one encoded word, including prefix and suffix.
pub const MAX_WORD_LEN: usize = 75;

/// Encodes a string as a sequence of *Q*-encoded words.
///
/// Each returned word is at most [`MAX_WORD_LEN`] characters long. The UTF-8
/// bytes of a character are never split across words.
pub fn encode_q(s: &str) -> Vec<String> {
    let capacity = MAX_WORD_LEN - PREFIX.len() - SUFFIX.len();

    let mut words = vec![];
    let mut text = String::with_capacity(capacity);

    for c in s.chars() {
        let encoded = encode_char(c);

        if text.len() + encoded.len() > capacity {
            words.push(make_word(&text));
            text.clear();
        }

        text.push_str(&encoded);
    }

    if !text.is_empty() || words.is_empty() {
        words.push(make_word(&text));
    }

    words
}

fn make_word(text: &str) -> String {
    format!("{PREFIX}{text}{SUFFIX}")
}

fn encode_char(c: char) -> String {
    // In a *Q*-encoded word in a header, space may be written as underscore;
    // only a restricted set of ASCII characters may appear as is, see RFC
    // 2047, section 5 (3).
    if c == ' ' {
        return "_".into();
    }

    if is_q_safe_char(c) {
        return c.into();
    }

    let mut buf = [0; 4];
    let mut result = String::with_capacity(12);
    for b in c.encode_utf8(&mut buf).bytes() {
        write!(result, "={b:02X}").unwrap();
    }
    result
}

fn is_q_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '!' | '*' | '+' | '-' | '/')
}
