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
    body_hash,
    canonicalize::{self, InvalidHeaderValue},
    crypto::{self, HashAlgorithm, SigningKey},
    header::Headers,
    message::Message,
    signature::{DkimHeader, SignatureAlgorithm, DKIM_SIGNATURE_NAME},
    signer::{format::UnsignedDkimSignature, SignerConfig, SignerError, SigningResult},
};
use tracing::{debug, trace};

/// A signed message not yet written back to the caller's message.
pub struct SignedParts {
    pub headers: Headers,
    pub body: String,
    pub result: SigningResult,
}

/// Runs the signing pipeline on a copy of the message's parts.
///
/// The message itself is not touched; on success the caller replaces its
/// headers and body with the returned parts.
pub fn perform_signing(
    config: &SignerConfig,
    signing_key: Option<&SigningKey>,
    message: &Message,
) -> Result<SignedParts, SignerError> {
    let hash_alg = SignatureAlgorithm::default().hash_algorithm();

    // normalize and hash body

    let body = canonicalize::normalize_body(&message.body.to_text());
    let body_hash = body_hash::compute_body_hash(hash_alg, &body);

    trace!("computed body hash {body_hash}");

    // prepare signature header with empty b= tag

    config.validate_for_signing()?;

    let sig = UnsignedDkimSignature::new(config, body_hash);
    let empty_header = DkimHeader::new(sig.format_without_signature());

    let mut headers = message.headers.clone();
    let n = headers.remove(DKIM_SIGNATURE_NAME);
    if n > 0 {
        debug!("removed {n} existing {DKIM_SIGNATURE_NAME} header(s)");
    }
    headers.add(empty_header.into());

    // canonicalize selected headers

    let selected_headers = select_signed_headers(config.signed_headers());

    let canonicalized = canonicalize::canonicalize_headers(&headers, &selected_headers)
        .map_err(|InvalidHeaderValue { name }| SignerError::InvalidHeaderValue(name))?;

    // sign

    let signing_key = signing_key.ok_or(SignerError::NoPrivateKey)?;

    debug!(
        "signing message for domain {} with selector {}",
        config.domain(),
        config.selector()
    );

    let data_hash = crypto::digest(hash_alg, canonicalized.data.as_bytes());
    let signature_data = sign_hash(signing_key, hash_alg, &data_hash)?;

    let header = sig.into_header(&signature_data);

    // assemble, signature header goes first

    headers.remove(DKIM_SIGNATURE_NAME);

    let mut signed_headers = Headers::new();
    signed_headers.add(header.clone().into()).add_all(headers);

    Ok(SignedParts {
        headers: signed_headers,
        body,
        result: SigningResult {
            header,
            skipped_headers: canonicalized.skipped,
        },
    })
}

/// Splits the colon-separated *h=* value into names, and adds
/// *DKIM-Signature* unless already present.
fn select_signed_headers(signed_headers: &str) -> Vec<&str> {
    let mut names: Vec<_> = signed_headers
        .split(':')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect();

    if !names.iter().any(|name| name.eq_ignore_ascii_case(DKIM_SIGNATURE_NAME)) {
        names.push(DKIM_SIGNATURE_NAME);
    }

    names
}

fn sign_hash(
    signing_key: &SigningKey,
    hash_alg: HashAlgorithm,
    data_hash: &[u8],
) -> Result<Vec<u8>, SignerError> {
    match crypto::sign_rsa(hash_alg, signing_key.as_ref(), data_hash) {
        Ok(s) => {
            trace!("RSA signing successful");
            Ok(s)
        }
        Err(e) => {
            trace!("RSA signing failed: {e}");
            Err(SignerError::SigningFailure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_signed_headers_appends_dkim_signature() {
        assert_eq!(
            select_signed_headers("from:to:subject"),
            ["from", "to", "subject", "DKIM-Signature"]
        );
        assert_eq!(
            select_signed_headers(" from : : to:"),
            ["from", "to", "DKIM-Signature"]
        );
    }

    #[test]
    fn select_signed_headers_keeps_explicit_dkim_signature() {
        assert_eq!(
            select_signed_headers("dkim-signature:from"),
            ["dkim-signature", "from"]
        );
    }

    #[test]
    fn missing_parameter_before_missing_key() {
        let config = SignerConfig::default();
        let message = Message::default();

        let result = perform_signing(&config, None, &message);

        assert!(matches!(result, Err(SignerError::MissingParameter)));
    }

    #[test]
    fn no_private_key() {
        let config = SignerConfig::default()
            .with_params([("d", "example.com"), ("h", "from"), ("s", "sel")])
            .unwrap();
        let message = Message::default();

        let result = perform_signing(&config, None, &message);

        assert!(matches!(result, Err(SignerError::NoPrivateKey)));
    }
}
