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

//! A library for signing outgoing email messages with *DomainKeys Identified
//! Mail* (DKIM) signatures, as described in [RFC 6376].
//!
//! Signatures always use the *rsa-sha256* algorithm with *relaxed*
//! canonicalization. The signature parameters and the RSA private key are held
//! by a [`Signer`], which signs a [`Message`] in place: the body is normalized,
//! and a new *DKIM-Signature* header is placed first in the header section.
//!
//! Besides the high-level signer, the building blocks are available in
//! separate modules: body normalization and header canonicalization (module
//! `canonicalize`), body hash (module `body_hash`), key handling and RSA
//! signing (module `crypto`), and the signature header (module `signature`).
//!
//! # Usage
//!
//! ```
//! use dkimsign::{Config, Message, Signer};
//!
//! let config = Config {
//!     private_key: None,
//!     params: [("d", "example.com"), ("h", "from:to:subject"), ("s", "202209")]
//!         .into_iter()
//!         .map(|(k, v)| (k.into(), v.into()))
//!         .collect(),
//! };
//!
//! let signer = Signer::new(config).unwrap();
//!
//! assert_eq!(signer.config().domain(), "example.com");
//! assert!(!signer.has_private_key());
//!
//! let mut message: Message = "From: me@example.com\r\n\r\nHello!\r\n".parse().unwrap();
//! assert!(signer.sign_message(&mut message).is_err());
//! ```
//!
//! # Cargo features
//!
//! The feature **`serde`** makes [`Config`] deserializable, so that signer
//! configuration can be read from a configuration file.
//!
//! [RFC 6376]: https://www.rfc-editor.org/rfc/rfc6376

pub mod body;
pub mod body_hash;
pub mod canonicalize;
pub mod crypto;
pub mod encoded_word;
pub mod header;
pub mod message;
pub mod mime;
mod parse;
pub mod signature;
pub mod signer;
pub mod tag_list;
mod util;

pub use crate::{
    body::{Body, RenderBody},
    crypto::SigningKey,
    header::{FieldName, Header, HeaderEncoding, Headers},
    message::Message,
    mime::{MimeMessage, MimePart},
    signature::{DkimHeader, SignatureAlgorithm},
    signer::{Config, Param, Signer, SignerConfig, SignerError, SigningResult},
    util::{decode_base64, encode_base64, Base64Error, CanonicalStr},
};
