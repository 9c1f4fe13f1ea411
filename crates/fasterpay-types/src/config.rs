//! Gateway credentials and endpoints.
//!
//! A [`GatewayConfig`] is resolved once and then shared read-only: the
//! [`Credential`] sits behind an [`Arc`] and is never mutated after construction.
//!
//! # Environment Variable Resolution
//!
//! When deserialized, string fields may reference environment variables through
//! [`LiteralOrEnv`], which keeps private keys out of configuration files:
//!
//! ```json
//! {
//!   "private_key": "$FASTERPAY_PRIVATE_KEY",
//!   "public_key": "${FASTERPAY_PUBLIC_KEY}",
//!   "environment": "sandbox"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};
use subtle::ConstantTimeEq;
use url::Url;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Default API version sent to the gateway.
pub const DEFAULT_API_VERSION: &str = "1.0.0";

mod endpoints {
    use super::*;

    pub static PRODUCTION_API: LazyLock<Url> =
        LazyLock::new(|| Url::parse("https://pay.fasterpay.com").expect("valid URL"));
    pub static SANDBOX_API: LazyLock<Url> =
        LazyLock::new(|| Url::parse("https://pay.sandbox.fasterpay.com").expect("valid URL"));
    pub static PRODUCTION_BUSINESS_API: LazyLock<Url> =
        LazyLock::new(|| Url::parse("https://business.fasterpay.com").expect("valid URL"));
    pub static SANDBOX_BUSINESS_API: LazyLock<Url> = LazyLock::new(|| {
        Url::parse("https://business.sandbox.fasterpay.com").expect("valid URL")
    });
}

/// The merchant's private key.
///
/// Zeroized on drop. `Debug`, `Display` and `Serialize` never reveal the value.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey(String);

impl SecretKey {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Returns the raw key. Only the signer and verifier should need this.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Constant-time comparison against a candidate value.
    pub fn matches(&self, candidate: &str) -> bool {
        self.0.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey([REDACTED])")
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Serialize for SecretKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str("[REDACTED]")
    }
}

impl FromStr for SecretKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SecretKey::new(s))
    }
}

/// The private/public key pair issued to a merchant.
#[derive(Clone, Debug, Serialize)]
pub struct Credential {
    private_key: SecretKey,
    public_key: String,
}

impl Credential {
    pub fn new(private_key: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            private_key: SecretKey::new(private_key),
            public_key: public_key.into(),
        }
    }

    /// Raw private key, used as HMAC key or hash salt.
    pub fn private_key(&self) -> &str {
        self.private_key.expose_secret()
    }

    pub fn secret(&self) -> &SecretKey {
        &self.private_key
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }
}

/// Which gateway deployment to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Sandbox,
}

impl Environment {
    /// Checkout and payments API (`pay.*`).
    pub fn api_url(&self) -> &'static Url {
        match self {
            Environment::Production => &endpoints::PRODUCTION_API,
            Environment::Sandbox => &endpoints::SANDBOX_API,
        }
    }

    /// Business API hosting contacts, payouts and e-invoices (`business.*`).
    pub fn business_api_url(&self) -> &'static Url {
        match self {
            Environment::Production => &endpoints::PRODUCTION_BUSINESS_API,
            Environment::Sandbox => &endpoints::SANDBOX_BUSINESS_API,
        }
    }
}

/// Immutable gateway configuration.
///
/// ```
/// use fasterpay_types::config::{Environment, GatewayConfig};
///
/// let config = GatewayConfig::new("private", "public").with_environment(Environment::Sandbox);
/// assert_eq!(config.api_url().as_str(), "https://pay.sandbox.fasterpay.com/");
/// assert_eq!(config.credential().public_key(), "public");
/// ```
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    credential: Arc<Credential>,
    environment: Environment,
    api_version: String,
    api_url: Option<Url>,
    business_api_url: Option<Url>,
}

impl GatewayConfig {
    /// Production configuration for the given key pair.
    pub fn new(private_key: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self::from_credential(Credential::new(private_key, public_key))
    }

    pub fn from_credential(credential: Credential) -> Self {
        Self {
            credential: Arc::new(credential),
            environment: Environment::default(),
            api_version: DEFAULT_API_VERSION.to_string(),
            api_url: None,
            business_api_url: None,
        }
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Shorthand for switching between [`Environment::Sandbox`] and [`Environment::Production`].
    pub fn with_test_mode(self, is_test: bool) -> Self {
        let environment = if is_test {
            Environment::Sandbox
        } else {
            Environment::Production
        };
        self.with_environment(environment)
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Overrides the checkout API base URL, e.g. to point at a mock server.
    pub fn with_api_url(mut self, url: Url) -> Self {
        self.api_url = Some(url);
        self
    }

    /// Overrides the business API base URL.
    pub fn with_business_api_url(mut self, url: Url) -> Self {
        self.business_api_url = Some(url);
        self
    }

    pub fn credential(&self) -> &Arc<Credential> {
        &self.credential
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn is_test(&self) -> bool {
        self.environment == Environment::Sandbox
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    pub fn api_url(&self) -> &Url {
        self.api_url
            .as_ref()
            .unwrap_or_else(|| self.environment.api_url())
    }

    pub fn business_api_url(&self) -> &Url {
        self.business_api_url
            .as_ref()
            .unwrap_or_else(|| self.environment.business_api_url())
    }
}

impl<'de> Deserialize<'de> for GatewayConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct GatewayConfigWire {
            private_key: LiteralOrEnv<String>,
            public_key: LiteralOrEnv<String>,
            #[serde(default)]
            environment: Environment,
            #[serde(default)]
            api_version: Option<String>,
            #[serde(default)]
            api_url: Option<LiteralOrEnv<Url>>,
            #[serde(default)]
            business_api_url: Option<LiteralOrEnv<Url>>,
        }

        let wire = GatewayConfigWire::deserialize(deserializer)?;
        if wire.private_key.is_empty() {
            return Err(serde::de::Error::custom("private_key must not be empty"));
        }
        let mut config = GatewayConfig::new(wire.private_key.into_inner(), wire.public_key.into_inner())
            .with_environment(wire.environment);
        if let Some(api_version) = wire.api_version {
            config = config.with_api_version(api_version);
        }
        if let Some(url) = wire.api_url {
            config = config.with_api_url(url.into_inner());
        }
        if let Some(url) = wire.business_api_url {
            config = config.with_business_api_url(url.into_inner());
        }
        Ok(config)
    }
}

/// A value given either literally or as an environment variable reference.
///
/// - Literal: `"pk_live_123"`
/// - Simple reference: `"$FASTERPAY_PRIVATE_KEY"`
/// - Braced reference: `"${FASTERPAY_PRIVATE_KEY}"`
///
/// The reference is resolved while deserializing and the result parsed as `T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralOrEnv<T>(T);

impl<T> LiteralOrEnv<T> {
    pub fn from_literal(value: T) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> T {
        self.0
    }

    /// Returns the variable name if `s` is `$VAR` or `${VAR}`.
    fn env_var_name(s: &str) -> Option<&str> {
        if let Some(braced) = s.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
            return Some(braced);
        }
        let name = s.strip_prefix('$')?;
        let is_name = !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_');
        is_name.then_some(name)
    }
}

impl<T> Deref for LiteralOrEnv<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de, T> Deserialize<'de> for LiteralOrEnv<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let value = match Self::env_var_name(&raw) {
            Some(var_name) => std::env::var(var_name).map_err(|_| {
                serde::de::Error::custom(format!(
                    "Environment variable '{var_name}' not found (referenced as '{raw}')"
                ))
            })?,
            None => raw,
        };
        value
            .parse::<T>()
            .map(LiteralOrEnv)
            .map_err(|e| serde::de::Error::custom(format!("Failed to parse value: {e}")))
    }
}

impl<T: Serialize> Serialize for LiteralOrEnv<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}
