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

//! Signer and supporting types.

mod config;
mod format;
mod sign;

pub use crate::signer::{
    config::{Config, Param, SignerConfig},
    format::{format_signature_data, SIGNATURE_CHUNK_WIDTH},
};

use crate::{
    crypto::SigningKey,
    header::FieldName,
    message::Message,
    signature::DkimHeader,
};
use std::{
    error::Error,
    fmt::{self, Debug, Display, Formatter},
};
use tracing::debug;

/// An error that occurs when using a [`Signer`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SignerError {
    /// A parameter key other than `v`, `a`, `d`, `h`, or `s` was given.
    InvalidParameter(String),
    /// One of `d`, `h`, or `s` is unset or empty at signing time.
    MissingParameter,
    /// The private key could not be read.
    InvalidPrivateKey,
    /// Signing was attempted without a private key.
    NoPrivateKey,
    /// A signed header value cannot be rendered in its encoding.
    InvalidHeaderValue(FieldName),
    /// The cryptographic signing operation failed.
    SigningFailure,
}

impl Display for SignerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter(key) => write!(f, "Invalid param '{key}' given."),
            Self::MissingParameter => write!(f, "Unable to sign message: missing params"),
            Self::InvalidPrivateKey => write!(f, "Invalid private key given."),
            Self::NoPrivateKey => write!(f, "No private key given."),
            Self::InvalidHeaderValue(name) => write!(f, "invalid value in header {name}"),
            Self::SigningFailure => write!(f, "signing failed"),
        }
    }
}

impl Error for SignerError {}

/// The outcome of a successful signing operation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SigningResult {
    /// The *DKIM-Signature* header now placed first in the message.
    pub header: DkimHeader,
    /// Names in *h=* for which the message had no header, or several.
    pub skipped_headers: Vec<String>,
}

/// A DKIM signer, holding the signature parameters and the private key.
///
/// Signing does not change the signer, so one signer can sign any number of
/// messages.
#[derive(Clone)]
pub struct Signer {
    config: SignerConfig,
    signing_key: Option<SigningKey>,
}

impl Debug for Signer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("config", &self.config)
            .field("has_private_key", &self.has_private_key())
            .finish()
    }
}

impl Signer {
    /// Creates a signer from a configuration.
    ///
    /// A non-empty private key is read with [`SigningKey::from_pem_body`]; an
    /// empty one is treated as absent. The parameters are then applied on top
    /// of the defaults `v=1` and `a=rsa-sha256`.
    pub fn new(config: Config) -> Result<Self, SignerError> {
        let mut signer = Self {
            config: SignerConfig::default(),
            signing_key: None,
        };

        if let Some(private_key) = config.private_key.filter(|k| !k.is_empty()) {
            signer.set_private_key(&private_key)?;
        }

        signer.set_params(config.params)?;

        Ok(signer)
    }

    /// Sets a single parameter.
    pub fn set_param(&mut self, key: &str, value: impl Into<String>) -> Result<(), SignerError> {
        self.config = self.config.with_param(key, value)?;
        Ok(())
    }

    /// Sets all given parameters. If any key is invalid, no parameter is
    /// changed.
    pub fn set_params<I, K, V>(&mut self, params: I) -> Result<(), SignerError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        self.config = self.config.with_params(params)?;
        Ok(())
    }

    /// Sets the private key from the Base64 body of a PEM document.
    pub fn set_private_key(&mut self, pem_body: &str) -> Result<(), SignerError> {
        match SigningKey::from_pem_body(pem_body) {
            Ok(k) => {
                self.signing_key = Some(k);
                Ok(())
            }
            Err(e) => {
                debug!("could not read private key: {e}");
                Err(SignerError::InvalidPrivateKey)
            }
        }
    }

    /// Sets an already decoded private key.
    pub fn set_signing_key(&mut self, signing_key: SigningKey) {
        self.signing_key = Some(signing_key);
    }

    pub fn config(&self) -> &SignerConfig {
        &self.config
    }

    pub fn has_private_key(&self) -> bool {
        self.signing_key.is_some()
    }

    /// Signs a message in place.
    ///
    /// On success the body is replaced with its normalized form, and the
    /// headers are replaced with the new *DKIM-Signature* header followed by
    /// the original headers minus any earlier *DKIM-Signature* headers. On
    /// error the message is left unchanged.
    pub fn sign_message(&self, message: &mut Message) -> Result<SigningResult, SignerError> {
        let signed = sign::perform_signing(&self.config, self.signing_key.as_ref(), message)?;

        message.headers = signed.headers;
        message.body = signed.body.into();

        Ok(signed.result)
    }
}
