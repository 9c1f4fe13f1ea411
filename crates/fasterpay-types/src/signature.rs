//! Request signing for FasterPay.
//!
//! Two incompatible schemes exist and are selected explicitly per call:
//!
//! - **`v1`** ([`SigningScheme::Legacy`]): `SHA-256(canonical_legacy(params) ++ private_key)`.
//! - **`v2`** ([`SigningScheme::Keyed`]): `HMAC-SHA-256(private_key, canonical_keyed(params))`.
//!
//! Digests are rendered as lowercase hex. The checkout form embeds the digest under
//! [`FORM_HASH_FIELD`] and declares the scheme under [`SIGN_VERSION_FIELD`]; the
//! gateway recomputes it with the declared scheme only.
//!
//! Inbound pingbacks signed with `v2` carry `HMAC-SHA-256(private_key, raw_body)`,
//! computed here by [`Signer::pingback_digest`].

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use crate::canonical::{ParameterSet, canonicalize_keyed, canonicalize_legacy};
use crate::config::Credential;

type HmacSha256 = Hmac<Sha256>;

/// Reserved form field carrying the request digest.
pub const FORM_HASH_FIELD: &str = "hash";

/// Form field declaring which [`SigningScheme`] produced [`FORM_HASH_FIELD`].
pub const SIGN_VERSION_FIELD: &str = "sign_version";

/// Versioned signing scheme.
///
/// Serialized as the wire identifiers `"v1"` and `"v2"`. A missing indicator means
/// [`SigningScheme::Legacy`]; an unknown one is an [`UnsupportedScheme`] error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SigningScheme {
    /// `v1`: salted SHA-256 over the URL-encoded parameters.
    #[default]
    #[serde(rename = "v1")]
    Legacy,
    /// `v2`: HMAC-SHA-256 over the `key=value;` concatenation.
    #[serde(rename = "v2")]
    Keyed,
}

impl SigningScheme {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SigningScheme::Legacy => "v1",
            SigningScheme::Keyed => "v2",
        }
    }

    /// Parses an optional indicator, defaulting to [`SigningScheme::Legacy`] when absent.
    pub fn from_indicator(indicator: Option<&str>) -> Result<Self, UnsupportedScheme> {
        match indicator {
            None => Ok(SigningScheme::default()),
            Some(s) => s.parse(),
        }
    }
}

impl Display for SigningScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signing-scheme indicator that is present but not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported signature version {0:?}, expected \"v1\" or \"v2\"")]
pub struct UnsupportedScheme(pub String);

impl FromStr for SigningScheme {
    type Err = UnsupportedScheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v1" => Ok(SigningScheme::Legacy),
            "v2" => Ok(SigningScheme::Keyed),
            other => Err(UnsupportedScheme(other.to_string())),
        }
    }
}

/// Computes request and pingback digests with the configured private key.
///
/// Cheap to clone; the [`Credential`] is shared and never mutated.
#[derive(Clone, Debug)]
pub struct Signer {
    credential: Arc<Credential>,
}

impl Signer {
    pub fn new(credential: Arc<Credential>) -> Self {
        Self { credential }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Signs `params` with `scheme`, returning a lowercase hex digest.
    ///
    /// Deterministic and independent of the order in which `params` were built.
    pub fn sign(&self, params: &ParameterSet, scheme: SigningScheme) -> String {
        let private_key = self.credential.private_key().as_bytes();
        match scheme {
            SigningScheme::Legacy => {
                let mut hasher = Sha256::new();
                hasher.update(canonicalize_legacy(params).as_bytes());
                hasher.update(private_key);
                hex::encode(hasher.finalize())
            }
            SigningScheme::Keyed => {
                hmac_sha256_hex(private_key, canonicalize_keyed(params).as_bytes())
            }
        }
    }

    /// HMAC-SHA-256 of a raw pingback body, keyed with the private key.
    ///
    /// The body is digested exactly as received; it is never parsed or canonicalized.
    pub fn pingback_digest(&self, body: &[u8]) -> String {
        hmac_sha256_hex(self.credential.private_key().as_bytes(), body)
    }
}

fn hmac_sha256_hex(key: &[u8], message: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(key).expect("HMAC-SHA-256 accepts keys of any length");
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer(private_key: &str) -> Signer {
        Signer::new(Arc::new(Credential::new(private_key, "pub")))
    }

    fn checkout_params() -> ParameterSet {
        ParameterSet::from([
            ("amount", "10.00"),
            ("currency", "USD"),
            ("description", "Golden Sword"),
            ("api_key", "pub"),
            ("merchant_order_id", "42"),
        ])
    }

    #[test]
    fn test_keyed_empty_set_is_hmac_of_empty_string() {
        let digest = signer("secret").sign(&ParameterSet::new(), SigningScheme::Keyed);
        assert_eq!(
            digest,
            "f9e66e179b6747ae54108f82f8ade8b3c25d76fd30afde6c395822c530196169"
        );
    }

    #[test]
    fn test_legacy_fixture() {
        let digest = signer("priv").sign(&checkout_params(), SigningScheme::Legacy);
        assert_eq!(
            digest,
            "a34606c993c9f93413aec650eeed4301903179ef9aaffd9d9e547f5243e76ba6"
        );
    }

    #[test]
    fn test_legacy_empty_set_hashes_key_alone() {
        let digest = signer("priv").sign(&ParameterSet::new(), SigningScheme::Legacy);
        assert_eq!(
            digest,
            "3b9aa142fefa44aab83ab1c0909f6929fd53656b895ec2fc0e47d412ea62ba54"
        );
    }

    #[test]
    fn test_keyed_fixture() {
        let digest = signer("priv").sign(&checkout_params(), SigningScheme::Keyed);
        assert_eq!(
            digest,
            "8fad21eec21cbfc7d5e7ed255d4a96bfd5848f9fb8dc647a9db88a5b479c7461"
        );
    }

    #[test]
    fn test_schemes_are_not_interchangeable() {
        let signer = signer("priv");
        let params = checkout_params();
        assert_ne!(
            signer.sign(&params, SigningScheme::Legacy),
            signer.sign(&params, SigningScheme::Keyed)
        );
    }

    #[test]
    fn test_sign_is_deterministic_and_order_independent() {
        let signer = signer("priv");
        let forward = checkout_params();
        let reversed: ParameterSet = forward
            .iter()
            .rev()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for scheme in [SigningScheme::Legacy, SigningScheme::Keyed] {
            let first = signer.sign(&forward, scheme);
            assert_eq!(first, signer.sign(&forward, scheme));
            assert_eq!(first, signer.sign(&reversed, scheme));
        }
    }

    #[test]
    fn test_changing_a_value_changes_digest() {
        let signer = signer("priv");
        let original = checkout_params();
        let tampered = original.clone().with("amount", "10.01");
        for scheme in [SigningScheme::Legacy, SigningScheme::Keyed] {
            assert_ne!(signer.sign(&original, scheme), signer.sign(&tampered, scheme));
        }
    }

    #[test]
    fn test_digest_is_lowercase_hex() {
        let digest = signer("priv").sign(&checkout_params(), SigningScheme::Keyed);
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_pingback_digest_fixture() {
        let digest =
            signer("priv").pingback_digest(br#"{"event":"payment","payment_order":{"id":1}}"#);
        assert_eq!(
            digest,
            "f7e032e9c8524ddefd06c7881900135c5d689cc2b0509b5ed63d17b2c424a40a"
        );
    }

    #[test]
    fn test_scheme_parsing() {
        assert_eq!("v1".parse::<SigningScheme>(), Ok(SigningScheme::Legacy));
        assert_eq!("v2".parse::<SigningScheme>(), Ok(SigningScheme::Keyed));
        assert_eq!(
            "v3".parse::<SigningScheme>(),
            Err(UnsupportedScheme("v3".to_string()))
        );
        assert_eq!(
            SigningScheme::from_indicator(None),
            Ok(SigningScheme::Legacy)
        );
        assert!(SigningScheme::from_indicator(Some("V2")).is_err());
    }

    #[test]
    fn test_scheme_serde_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&SigningScheme::Keyed).unwrap(),
            "\"v2\""
        );
        let scheme: SigningScheme = serde_json::from_str("\"v1\"").unwrap();
        assert_eq!(scheme, SigningScheme::Legacy);
        assert_eq!(SigningScheme::Keyed.to_string(), "v2");
    }
}
