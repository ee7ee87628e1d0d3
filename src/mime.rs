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

//! Minimal MIME body renderer.

use crate::{body::RenderBody, util::CanonicalStr};
use base64ct::{Base64, Encoding};

const EOL: &str = "\r\n";

/// Length of lines in Base64 transfer encoding, see RFC 2045, section 6.8.
const BASE64_LINE_LEN: usize = 76;

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum TransferEncoding {
    SevenBit,
    #[default]
    EightBit,
    Base64,
}

impl CanonicalStr for TransferEncoding {
    fn canonical_str(&self) -> &'static str {
        match self {
            Self::SevenBit => "7bit",
            Self::EightBit => "8bit",
            Self::Base64 => "base64",
        }
    }
}

/// One part of a MIME message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MimePart {
    pub content: String,
    pub content_type: String,
    pub charset: Option<String>,
    pub encoding: TransferEncoding,
}

impl MimePart {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            content_type: "text/plain".into(),
            charset: None,
            encoding: Default::default(),
        }
    }

    /// Returns the content with transfer encoding applied.
    pub fn encoded_content(&self) -> String {
        match self.encoding {
            TransferEncoding::SevenBit | TransferEncoding::EightBit => self.content.clone(),
            TransferEncoding::Base64 => {
                let encoded = Base64::encode_string(self.content.as_bytes());
                // Base64 output is ASCII, so splitting into byte chunks is safe
                encoded
                    .as_bytes()
                    .chunks(BASE64_LINE_LEN)
                    .map(|c| String::from_utf8_lossy(c))
                    .collect::<Vec<_>>()
                    .join(EOL)
            }
        }
    }

    fn format_headers(&self) -> String {
        let mut s = format!("Content-Type: {}", self.content_type);
        if let Some(charset) = &self.charset {
            s.push_str("; charset=");
            s.push_str(charset);
        }
        s.push_str(EOL);
        s.push_str("Content-Transfer-Encoding: ");
        s.push_str(self.encoding.canonical_str());
        s.push_str(EOL);
        s
    }
}

/// A MIME message made of zero or more parts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MimeMessage {
    boundary: String,
    parts: Vec<MimePart>,
}

impl MimeMessage {
    pub fn new(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: vec![],
        }
    }

    pub fn add_part(&mut self, part: MimePart) -> &mut Self {
        self.parts.push(part);
        self
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn parts(&self) -> &[MimePart] {
        &self.parts
    }

    pub fn is_multipart(&self) -> bool {
        self.parts.len() > 1
    }
}

impl RenderBody for MimeMessage {
    /// Renders the message. A single part renders as its encoded content
    /// alone, without part headers or boundary lines.
    fn render(&self) -> String {
        match &self.parts[..] {
            [] => String::new(),
            [part] => part.encoded_content(),
            parts => {
                let mut result = String::new();
                for part in parts {
                    result.push_str("--");
                    result.push_str(&self.boundary);
                    result.push_str(EOL);
                    result.push_str(&part.format_headers());
                    result.push_str(EOL);
                    result.push_str(&part.encoded_content());
                    result.push_str(EOL);
                }
                result.push_str("--");
                result.push_str(&self.boundary);
                result.push_str("--");
                result.push_str(EOL);
                result
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_empty_and_single_part() {
        let mut mime = MimeMessage::new("b1");
        assert_eq!(mime.render(), "");

        mime.add_part(MimePart::new("Hello world"));
        assert!(!mime.is_multipart());
        assert_eq!(mime.render(), "Hello world");
    }

    #[test]
    fn render_multipart() {
        let mut html = MimePart::new("<p>Hi</p>");
        html.content_type = "text/html".into();
        html.charset = Some("utf-8".into());

        let mut mime = MimeMessage::new("b1");
        mime.add_part(MimePart::new("Hi")).add_part(html);

        assert_eq!(
            mime.render(),
            "--b1\r\n\
            Content-Type: text/plain\r\n\
            Content-Transfer-Encoding: 8bit\r\n\
            \r\n\
            Hi\r\n\
            --b1\r\n\
            Content-Type: text/html; charset=utf-8\r\n\
            Content-Transfer-Encoding: 8bit\r\n\
            \r\n\
            <p>Hi</p>\r\n\
            --b1--\r\n"
        );
    }

    #[test]
    fn base64_part_wraps_lines() {
        let mut part = MimePart::new("x".repeat(100));
        part.encoding = TransferEncoding::Base64;

        let encoded = part.encoded_content();
        let lines: Vec<_> = encoded.split("\r\n").collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), 76);
    }
}
