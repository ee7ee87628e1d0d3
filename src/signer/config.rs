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
    signature::SignatureAlgorithm,
    signer::SignerError,
    util::CanonicalStr,
};
use std::{collections::BTreeMap, str::FromStr};

/// Configuration as supplied by the caller.
///
/// `private_key` holds the Base64 body of a PKCS#1 PEM document, without the
/// BEGIN and END lines. `params` may contain the keys `v`, `a`, `d`, `h`,
/// and `s`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    pub private_key: Option<String>,
    pub params: BTreeMap<String, String>,
}

/// A configurable signature parameter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Param {
    /// Version, *v=*.
    Version,
    /// Algorithm, *a=*.
    Algorithm,
    /// Signing domain, *d=*.
    Domain,
    /// Colon-separated names of the headers to sign, *h=*.
    SignedHeaders,
    /// Selector, *s=*.
    Selector,
}

impl FromStr for Param {
    type Err = SignerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v" => Ok(Self::Version),
            "a" => Ok(Self::Algorithm),
            "d" => Ok(Self::Domain),
            "h" => Ok(Self::SignedHeaders),
            "s" => Ok(Self::Selector),
            _ => Err(SignerError::InvalidParameter(s.into())),
        }
    }
}

impl CanonicalStr for Param {
    fn canonical_str(&self) -> &'static str {
        match self {
            Self::Version => "v",
            Self::Algorithm => "a",
            Self::Domain => "d",
            Self::SignedHeaders => "h",
            Self::Selector => "s",
        }
    }
}

/// The validated signature parameters.
///
/// Values are immutable; updates produce a new value.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SignerConfig {
    version: String,
    algorithm: String,
    domain: String,
    signed_headers: String,
    selector: String,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            version: "1".into(),
            algorithm: SignatureAlgorithm::default().canonical_str().into(),
            domain: Default::default(),
            signed_headers: Default::default(),
            selector: Default::default(),
        }
    }
}

impl SignerConfig {
    /// Returns a copy with one parameter replaced.
    pub fn with(&self, param: Param, value: impl Into<String>) -> Self {
        let mut config = self.clone();
        let value = value.into();
        match param {
            Param::Version => config.version = value,
            Param::Algorithm => config.algorithm = value,
            Param::Domain => config.domain = value,
            Param::SignedHeaders => config.signed_headers = value,
            Param::Selector => config.selector = value,
        }
        config
    }

    /// Returns a copy with the parameter named `key` replaced.
    pub fn with_param(&self, key: &str, value: impl Into<String>) -> Result<Self, SignerError> {
        let param = key.parse()?;
        Ok(self.with(param, value))
    }

    /// Returns a copy with all given parameters replaced. Fails without
    /// partial update if any key is invalid.
    pub fn with_params<I, K, V>(&self, params: I) -> Result<Self, SignerError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        params
            .into_iter()
            .try_fold(self.clone(), |config, (k, v)| config.with_param(k.as_ref(), v))
    }

    pub fn get(&self, param: Param) -> &str {
        match param {
            Param::Version => &self.version,
            Param::Algorithm => &self.algorithm,
            Param::Domain => &self.domain,
            Param::SignedHeaders => &self.signed_headers,
            Param::Selector => &self.selector,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn signed_headers(&self) -> &str {
        &self.signed_headers
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// Checks that domain, signed headers, and selector are all set.
    pub fn validate_for_signing(&self) -> Result<(), SignerError> {
        if self.domain.is_empty() || self.signed_headers.is_empty() || self.selector.is_empty() {
            return Err(SignerError::MissingParameter);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SignerConfig::default();

        assert_eq!(config.version(), "1");
        assert_eq!(config.algorithm(), "rsa-sha256");
        assert_eq!(config.domain(), "");
        assert_eq!(config.validate_for_signing(), Err(SignerError::MissingParameter));
    }

    #[test]
    fn with_params_ok() {
        let config = SignerConfig::default()
            .with_params([("d", "example.com"), ("h", "from:to:subject"), ("s", "202209")])
            .unwrap();

        assert_eq!(config.get(Param::Domain), "example.com");
        assert_eq!(config.signed_headers(), "from:to:subject");
        assert_eq!(config.selector(), "202209");
        assert!(config.validate_for_signing().is_ok());
    }

    #[test]
    fn with_param_invalid_key() {
        let config = SignerConfig::default();

        assert_eq!(
            config.with_param("z", "foo"),
            Err(SignerError::InvalidParameter("z".into()))
        );
        // keys are case-sensitive
        assert_eq!(
            config.with_param("D", "example.com"),
            Err(SignerError::InvalidParameter("D".into()))
        );
    }

    #[test]
    fn with_params_all_or_nothing() {
        let config = SignerConfig::default().with_param("d", "example.com").unwrap();

        let result = config.with_params([("s", "sel"), ("x", "1")]);

        assert_eq!(result, Err(SignerError::InvalidParameter("x".into())));
        assert_eq!(config.selector(), "");
    }

    #[test]
    fn empty_value_fails_validation() {
        let config = SignerConfig::default()
            .with_params([("d", "example.com"), ("h", "from"), ("s", "sel")])
            .unwrap();

        for key in ["d", "h", "s"] {
            let config = config.with_param(key, "").unwrap();
            assert_eq!(config.validate_for_signing(), Err(SignerError::MissingParameter));
        }
    }
}
