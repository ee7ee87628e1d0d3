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

use crate::{
    signature::{CanonicalizationAlgorithm, DkimHeader},
    signer::SignerConfig,
    tag_list,
    util::{self, CanonicalStr},
};

/// Width of the chunks that the Base64 signature is cut into.
pub const SIGNATURE_CHUNK_WIDTH: usize = 73;

/// The tags of the *DKIM-Signature* header, in output order.
pub const TAG_ORDER: [&str; 8] = ["v", "a", "bh", "c", "d", "h", "s", "b"];

/// DKIM signature data that does not yet have a cryptographic signature.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnsignedDkimSignature {
    pub version: String,
    pub algorithm: String,
    pub body_hash: String,
    pub canonicalization: CanonicalizationAlgorithm,
    pub domain: String,
    pub signed_headers: String,
    pub selector: String,
}

impl UnsignedDkimSignature {
    pub fn new(config: &SignerConfig, body_hash: String) -> Self {
        Self {
            version: config.version().into(),
            algorithm: config.algorithm().into(),
            body_hash,
            canonicalization: CanonicalizationAlgorithm::Relaxed,
            domain: config.domain().into(),
            signed_headers: config.signed_headers().into(),
            selector: config.selector().into(),
        }
    }

    /// Formats the signature with an empty *b=* tag, the last tag.
    pub fn format_without_signature(&self) -> String {
        let tags = TAG_ORDER.iter().map(|&name| {
            let value = match name {
                "v" => self.version.as_str(),
                "a" => self.algorithm.as_str(),
                "bh" => self.body_hash.as_str(),
                "c" => self.canonicalization.canonical_str(),
                "d" => self.domain.as_str(),
                "h" => self.signed_headers.as_str(),
                "s" => self.selector.as_str(),
                "b" => "",
                _ => unreachable!(),
            };
            (name, value)
        });

        tag_list::format_tag_list(tags)
    }

    /// Produces the final header by appending the folded signature to the
    /// formatted value, right after `b=`.
    pub fn into_header(self, signature_data: &[u8]) -> DkimHeader {
        let mut value = self.format_without_signature();
        value.push_str(&format_signature_data(signature_data));
        DkimHeader::new(value)
    }
}

/// Encodes signature data as Base64 and cuts it into chunks of
/// [`SIGNATURE_CHUNK_WIDTH`] characters joined by a single space.
pub fn format_signature_data(signature_data: &[u8]) -> String {
    fold_chunks(&util::encode_base64(signature_data), SIGNATURE_CHUNK_WIDTH)
}

fn fold_chunks(s: &str, width: usize) -> String {
    // Base64 is ASCII, but work on chars anyway
    let chars: Vec<_> = s.chars().collect();
    chars
        .chunks(width)
        .map(|c| c.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .into()
}
