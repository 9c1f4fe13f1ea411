//! Authentication of inbound pingbacks (asynchronous gateway notifications).
//!
//! The scheme is announced in [`SIGNATURE_VERSION_HEADER`]:
//!
//! - **`v2`**: [`SIGNATURE_HEADER`] carries `HMAC-SHA-256(private_key, raw_body)` in hex.
//! - **`v1`** or header absent: [`API_KEY_HEADER`] carries the merchant's private key
//!   itself. This legacy mode proves nothing about the body and is kept only for
//!   merchants that have not switched to `v2`.
//!
//! Verification fails closed: a missing body, missing headers or a missing signature
//! yield `Ok(false)`. Only an announced but unknown version is an error.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use subtle::ConstantTimeEq;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::config::Credential;
use crate::signature::{Signer, SigningScheme, UnsupportedScheme};

/// Header announcing the signature version of a pingback (`v1` or `v2`).
pub const SIGNATURE_VERSION_HEADER: &str = "X-Fasterpay-Signature-Version";

/// Header carrying the hex HMAC of the body for `v2` pingbacks.
pub const SIGNATURE_HEADER: &str = "X-Fasterpay-Signature";

/// Header carrying the shared private key for legacy `v1` pingbacks.
pub const API_KEY_HEADER: &str = "X-ApiKey";

/// Read access to the headers of an inbound notification.
///
/// Names are matched case-insensitively, as HTTP requires.
pub trait PingbackHeaders {
    fn is_empty(&self) -> bool;

    fn header(&self, name: &str) -> Option<Cow<'_, str>>;
}

impl PingbackHeaders for http::HeaderMap {
    fn is_empty(&self) -> bool {
        http::HeaderMap::is_empty(self)
    }

    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name)
            .map(|value| String::from_utf8_lossy(value.as_bytes()))
    }
}

impl<S: std::hash::BuildHasher> PingbackHeaders for HashMap<String, String, S> {
    fn is_empty(&self) -> bool {
        HashMap::is_empty(self)
    }

    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        find_ignore_case(self.iter(), name)
    }
}

impl PingbackHeaders for BTreeMap<String, String> {
    fn is_empty(&self) -> bool {
        BTreeMap::is_empty(self)
    }

    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        find_ignore_case(self.iter(), name)
    }
}

impl PingbackHeaders for [(&str, &str)] {
    fn is_empty(&self) -> bool {
        <[_]>::is_empty(self)
    }

    fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        self.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| Cow::Borrowed(*v))
    }
}

fn find_ignore_case<'a>(
    mut entries: impl Iterator<Item = (&'a String, &'a String)>,
    name: &str,
) -> Option<Cow<'a, str>> {
    entries
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| Cow::Borrowed(v.as_str()))
}

/// Verifies pingbacks against the configured [`Credential`].
#[derive(Clone, Debug)]
pub struct Pingback {
    signer: Signer,
}

impl Pingback {
    pub fn new(credential: Arc<Credential>) -> Self {
        Self {
            signer: Signer::new(credential),
        }
    }

    pub fn from_signer(signer: Signer) -> Self {
        Self { signer }
    }

    /// Determines the signing scheme announced by `headers`.
    ///
    /// Absent header means [`SigningScheme::Legacy`].
    pub fn scheme<H>(headers: &H) -> Result<SigningScheme, UnsupportedScheme>
    where
        H: PingbackHeaders + ?Sized,
    {
        let indicator = headers.header(SIGNATURE_VERSION_HEADER);
        SigningScheme::from_indicator(indicator.as_deref())
    }

    /// Checks that `body` was sent by the gateway.
    ///
    /// Returns `Ok(false)` for any input that cannot be authenticated, and
    /// [`UnsupportedScheme`] if the version header names an unknown scheme.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "fasterpay.pingback.verify", skip_all, err)
    )]
    pub fn verify<H>(&self, body: impl AsRef<[u8]>, headers: &H) -> Result<bool, UnsupportedScheme>
    where
        H: PingbackHeaders + ?Sized,
    {
        let body = body.as_ref();
        if body.is_empty() || headers.is_empty() {
            #[cfg(feature = "telemetry")]
            tracing::debug!("Pingback rejected: empty body or headers");
            return Ok(false);
        }

        let scheme = Self::scheme(headers)?;
        let valid = match scheme {
            SigningScheme::Keyed => match headers.header(SIGNATURE_HEADER) {
                Some(received) => {
                    let expected = self.signer.pingback_digest(body);
                    expected.as_bytes().ct_eq(received.as_bytes()).into()
                }
                None => false,
            },
            // Legacy: the sender proves knowledge of the private key by sending it.
            SigningScheme::Legacy => match headers.header(API_KEY_HEADER) {
                Some(api_key) => self.signer.credential().secret().matches(&api_key),
                None => false,
            },
        };

        #[cfg(feature = "telemetry")]
        tracing::debug!(scheme = %scheme, valid, "Pingback verified");

        Ok(valid)
    }
}
