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

//! Body hash, the value of the *bh=* tag.

use crate::{
    crypto::{self, HashAlgorithm},
    util,
};

/// Computes the Base64-encoded body hash of an already normalized body.
pub fn compute_body_hash(hash_alg: HashAlgorithm, normalized_body: &str) -> String {
    let hash = crypto::digest(hash_alg, normalized_body.as_bytes());
    util::encode_base64(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonicalize::normalize_body;

    const BODY_HASH: &str = "36+kqoyJsuwP2NJR3Fl95HuripBg2zfO++jH/8Df2LM=";

    #[test]
    fn body_hash_ok() {
        let bh = compute_body_hash(HashAlgorithm::Sha256, "Hello world!\r\nHello Again!\r\n");
        assert_eq!(bh, BODY_HASH);
    }

    #[test]
    fn body_hash_of_normalized_variants() {
        for body in [
            "Hello world!\r\nHello Again!\r\n",
            "Hello world!\nHello Again!\n",
            "Hello world!\r\nHello Again!\r\n\r\n",
            "Hello world!\rHello Again!",
        ] {
            let bh = compute_body_hash(HashAlgorithm::Sha256, &normalize_body(body));
            assert_eq!(bh, BODY_HASH, "body {body:?}");
        }
    }

    #[test]
    fn body_hash_empty_body() {
        let bh = compute_body_hash(HashAlgorithm::Sha256, &normalize_body(""));
        assert_eq!(bh, "frcCV1k9oG9oKj3dpUqdJg1PxRT2RSN/XKdLCPjaYaY=");
    }
}
